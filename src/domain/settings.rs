use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::domain::commands::GrinderCharacteristic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "granite_grinder_panel".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Per-register characteristic UUID overrides. Defaults match the firmware's
/// fixed 16-bit aliases; only worth touching against a modified firmware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUuids {
    #[serde(default = "default_speed_uuid")]
    pub speed: String,
    #[serde(default = "default_step_uuid")]
    pub step: String,
    #[serde(default = "default_cage_uuid")]
    pub cage: String,
    #[serde(default = "default_drill_uuid")]
    pub drill: String,
    #[serde(default = "default_led_uuid")]
    pub led: String,
    #[serde(default = "default_slide_l_uuid")]
    pub slide_left: String,
    #[serde(default = "default_slide_r_uuid")]
    pub slide_right: String,
    #[serde(default = "default_reset_uuid")]
    pub reset: String,
}

impl Default for RegisterUuids {
    fn default() -> Self {
        Self {
            speed: default_speed_uuid(),
            step: default_step_uuid(),
            cage: default_cage_uuid(),
            drill: default_drill_uuid(),
            led: default_led_uuid(),
            slide_left: default_slide_l_uuid(),
            slide_right: default_slide_r_uuid(),
            reset: default_reset_uuid(),
        }
    }
}

impl RegisterUuids {
    pub fn get(&self, role: GrinderCharacteristic) -> &str {
        match role {
            GrinderCharacteristic::Speed => &self.speed,
            GrinderCharacteristic::Step => &self.step,
            GrinderCharacteristic::Cage => &self.cage,
            GrinderCharacteristic::Drill => &self.drill,
            GrinderCharacteristic::Led => &self.led,
            GrinderCharacteristic::SlideLeft => &self.slide_left,
            GrinderCharacteristic::SlideRight => &self.slide_right,
            GrinderCharacteristic::Reset => &self.reset,
        }
    }

    pub fn get_mut(&mut self, role: GrinderCharacteristic) -> &mut String {
        match role {
            GrinderCharacteristic::Speed => &mut self.speed,
            GrinderCharacteristic::Step => &mut self.step,
            GrinderCharacteristic::Cage => &mut self.cage,
            GrinderCharacteristic::Drill => &mut self.drill,
            GrinderCharacteristic::Led => &mut self.led,
            GrinderCharacteristic::SlideLeft => &mut self.slide_left,
            GrinderCharacteristic::SlideRight => &mut self.slide_right,
            GrinderCharacteristic::Reset => &mut self.reset,
        }
    }
}

fn default_speed_uuid() -> String {
    GrinderCharacteristic::Speed.default_uuid()
}
fn default_step_uuid() -> String {
    GrinderCharacteristic::Step.default_uuid()
}
fn default_cage_uuid() -> String {
    GrinderCharacteristic::Cage.default_uuid()
}
fn default_drill_uuid() -> String {
    GrinderCharacteristic::Drill.default_uuid()
}
fn default_led_uuid() -> String {
    GrinderCharacteristic::Led.default_uuid()
}
fn default_slide_l_uuid() -> String {
    GrinderCharacteristic::SlideLeft.default_uuid()
}
fn default_slide_r_uuid() -> String {
    GrinderCharacteristic::SlideRight.default_uuid()
}
fn default_reset_uuid() -> String {
    GrinderCharacteristic::Reset.default_uuid()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Advertised local name the scanner matches on.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_false")]
    pub debug_show_all_devices: bool,

    pub last_connected_address: Option<u64>,

    // Joystick polling
    #[serde(default = "default_poll_interval_ms")]
    pub joystick_poll_interval_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub input_debounce_ms: u64,

    // Advanced BLE Settings
    #[serde(default)]
    pub register_uuids: RegisterUuids,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            debug_show_all_devices: false,
            last_connected_address: None,
            joystick_poll_interval_ms: default_poll_interval_ms(),
            input_debounce_ms: default_debounce_ms(),
            register_uuids: RegisterUuids::default(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_device_name() -> String {
    "Granite Grinder".to_string()
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_debounce_ms() -> u64 {
    50
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("GraniteGrinderPanel");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn remember_address(&mut self, address: u64) -> anyhow::Result<()> {
        if self.settings.last_connected_address != Some(address) {
            self.settings.last_connected_address = Some(address);
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_from_empty_json_object() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.device_name, "Granite Grinder");
        assert_eq!(settings.joystick_poll_interval_ms, 50);
        assert_eq!(settings.log_settings.level, "info");
        assert_eq!(
            settings.register_uuids.speed,
            "00001111-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn register_uuid_override_survives_round_trip_and_partial_json() {
        let mut settings = Settings::default();
        *settings
            .register_uuids
            .get_mut(GrinderCharacteristic::Drill) =
            "0000aaaa-0000-1000-8000-00805f9b34fb".to_string();

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.register_uuids.get(GrinderCharacteristic::Drill),
            "0000aaaa-0000-1000-8000-00805f9b34fb"
        );
        // Untouched registers keep their firmware aliases
        assert_eq!(
            back.register_uuids.get(GrinderCharacteristic::Led),
            "00001115-0000-1000-8000-00805f9b34fb"
        );

        // A settings file that only overrides one register still loads
        let partial: Settings = serde_json::from_str(
            r#"{"register_uuids": {"cage": "0000bbbb-0000-1000-8000-00805f9b34fb"}}"#,
        )
        .unwrap();
        assert_eq!(
            partial.register_uuids.get(GrinderCharacteristic::Cage),
            "0000bbbb-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            partial.register_uuids.get(GrinderCharacteristic::Speed),
            "00001111-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn settings_json_round_trip() {
        let mut settings = Settings::default();
        settings.device_name = "Bench Rig".to_string();
        settings.last_connected_address = Some(0x1234_5678_9ABC);

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.device_name, "Bench Rig");
        assert_eq!(back.last_connected_address, Some(0x1234_5678_9ABC));
    }
}
