//! Persisted grinder parameters.
//!
//! The motion parameters live in `config.ini` next to the executable: five
//! sections of flat key-value pairs, one per direction plus the cage bounds.
//! The file is read once at startup and rewritten only by the explicit
//! "Save Config" action. Malformed fields are logged and fall back to their
//! defaults; nothing is corrected on disk until the next save.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::models::Direction;

pub const CONFIG_FILE: &str = "config.ini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionParams {
    pub speed: u16,
    pub step: u16,
    pub r_travel: u16,
    pub l_travel: u16,
}

impl Default for DirectionParams {
    fn default() -> Self {
        Self {
            speed: 25,
            step: 25,
            r_travel: 60,
            l_travel: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CageParams {
    pub top: u16,
    pub bottom: u16,
}

impl Default for CageParams {
    fn default() -> Self {
        Self {
            top: 150,
            bottom: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrinderConfig {
    pub front: DirectionParams,
    pub back: DirectionParams,
    pub left: DirectionParams,
    pub right: DirectionParams,
    pub cage: CageParams,
}

impl GrinderConfig {
    pub fn direction(&self, direction: Direction) -> &DirectionParams {
        match direction {
            Direction::Forward => &self.front,
            Direction::Backward => &self.back,
            Direction::Right => &self.right,
            Direction::Left => &self.left,
        }
    }

    pub fn direction_mut(&mut self, direction: Direction) -> &mut DirectionParams {
        match direction {
            Direction::Forward => &mut self.front,
            Direction::Backward => &mut self.back,
            Direction::Right => &mut self.right,
            Direction::Left => &mut self.left,
        }
    }

    /// Render the sectioned key-value text form.
    pub fn to_ini(&self) -> String {
        let mut out = String::new();
        for (name, p) in [
            ("Params_Front", &self.front),
            ("Params_Back", &self.back),
            ("Params_Left", &self.left),
            ("Params_Right", &self.right),
        ] {
            out.push_str(&format!(
                "[{}]\nSpeed = {}\nStep = {}\nR-Travel = {}\nL-Travel = {}\n\n",
                name, p.speed, p.step, p.r_travel, p.l_travel
            ));
        }
        out.push_str(&format!(
            "[Params_Cage]\nCage_Top = {}\nCage_Bottom = {}\n",
            self.cage.top, self.cage.bottom
        ));
        out
    }

    /// Parse the sectioned key-value text form. Section and key lookup is
    /// case-insensitive; unknown keys are ignored; malformed values are
    /// logged and left at their defaults.
    pub fn from_ini(text: &str) -> Self {
        let mut config = GrinderConfig::default();
        let mut section = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.to_ascii_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("Ignoring malformed config line: {}", line);
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            let parsed: u16 = match value.parse() {
                Ok(v) => v,
                Err(_) => {
                    warn!(
                        "Config field [{}] {} = {:?} is not an integer, keeping default",
                        section, key, value
                    );
                    continue;
                }
            };

            match section.as_str() {
                "params_front" => apply_direction_key(&mut config.front, &key, parsed),
                "params_back" => apply_direction_key(&mut config.back, &key, parsed),
                "params_left" => apply_direction_key(&mut config.left, &key, parsed),
                "params_right" => apply_direction_key(&mut config.right, &key, parsed),
                "params_cage" => match key.as_str() {
                    "cage_top" => config.cage.top = parsed,
                    "cage_bottom" => config.cage.bottom = parsed,
                    _ => {}
                },
                _ => {}
            }
        }

        config
    }
}

fn apply_direction_key(params: &mut DirectionParams, key: &str, value: u16) {
    match key {
        "speed" => params.speed = value,
        "step" => params.step = value,
        "r-travel" => params.r_travel = value,
        "l-travel" => params.l_travel = value,
        _ => {}
    }
}

/// Owns the on-disk config file.
pub struct ConfigStore {
    config: GrinderConfig,
    path: PathBuf,
}

impl ConfigStore {
    /// Load the config file, or write one with default parameters if it does
    /// not exist yet.
    pub fn load_or_create(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let config = if path.exists() {
            let text = fs::read_to_string(&path)?;
            info!("Loaded {:?}", path);
            GrinderConfig::from_ini(&text)
        } else {
            warn!("Could not find {:?}, writing default parameters", path);
            let config = GrinderConfig::default();
            fs::write(&path, config.to_ini())?;
            config
        };
        Ok(Self { config, path })
    }

    /// Defaults bound to a path that could not be read. A later save still
    /// targets the same file.
    pub fn defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            config: GrinderConfig::default(),
            path: path.into(),
        }
    }

    pub fn get(&self) -> &GrinderConfig {
        &self.config
    }

    pub fn save(&mut self, config: GrinderConfig) -> anyhow::Result<()> {
        fs::write(&self.path, config.to_ini())?;
        info!("Saved config to {:?}", self.path);
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reproduces_identical_integers() {
        let mut config = GrinderConfig::default();
        config.front.speed = 42;
        config.back.step = 7;
        config.left.r_travel = 200;
        config.right.l_travel = 0;
        config.cage.top = 255;
        config.cage.bottom = 3;

        let reloaded = GrinderConfig::from_ini(&config.to_ini());
        assert_eq!(reloaded, config);
    }

    #[test]
    fn keys_and_sections_are_case_insensitive() {
        let text = "[params_front]\nspeed = 99\nSTEP = 11\n";
        let config = GrinderConfig::from_ini(text);
        assert_eq!(config.front.speed, 99);
        assert_eq!(config.front.step, 11);
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let text = "[Params_Front]\nSpeed = fast\nStep = 12\n";
        let config = GrinderConfig::from_ini(text);
        assert_eq!(config.front.speed, DirectionParams::default().speed);
        assert_eq!(config.front.step, 12);
    }

    #[test]
    fn unknown_sections_and_keys_are_ignored() {
        let text = "[Params_Warp]\nSpeed = 1\n[Params_Cage]\nCage_Top = 140\nFlux = 9\n";
        let config = GrinderConfig::from_ini(text);
        assert_eq!(config.cage.top, 140);
        assert_eq!(config.front, DirectionParams::default());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let text = "; grinder settings\n\n[Params_Back]\n# step\nStep = 5\n";
        let config = GrinderConfig::from_ini(text);
        assert_eq!(config.back.step, 5);
    }

    #[test]
    fn missing_file_creates_defaults_on_disk() {
        let dir = std::env::temp_dir().join("granite_grinder_panel_test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("config_roundtrip.ini");
        let _ = fs::remove_file(&path);

        let store = ConfigStore::load_or_create(&path).unwrap();
        assert_eq!(store.get(), &GrinderConfig::default());
        assert!(path.exists());

        let reloaded = ConfigStore::load_or_create(&path).unwrap();
        assert_eq!(reloaded.get(), &GrinderConfig::default());

        let _ = fs::remove_file(&path);
    }
}
