use crate::domain::commands::{self, CageBound, CageState, DirectionFields};
use crate::domain::models::{
    AppEvent, BluetoothCommand, ConnectionStatus, Direction, JoystickAction, MessageSeverity,
    ScannedDevice, StatusMessage,
};
use crate::domain::params::{self, ConfigStore, GrinderConfig};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::BluetoothService;
use crate::infrastructure::joystick::JoystickWorker;
use eframe::egui;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// How long window close waits for the Bluetooth worker to finish the final
/// reset pulse and disconnect.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Control,
    Settings,
}

pub struct GrinderApp {
    // Services
    pub(crate) settings: Arc<Mutex<SettingsService>>,
    pub(crate) config: ConfigStore,

    // Bluetooth
    pub(crate) bluetooth_tx: tokio::sync::mpsc::UnboundedSender<BluetoothCommand>,
    pub(crate) event_rx: tokio::sync::mpsc::UnboundedReceiver<AppEvent>,
    pub(crate) event_tx: tokio::sync::mpsc::UnboundedSender<AppEvent>,

    // State
    pub(crate) connection_status: ConnectionStatus,
    pub(crate) status_message: Option<StatusMessage>,

    // Panel fields, indexed by Direction::index()
    pub(crate) direction_fields: [DirectionFields; 4],
    pub(crate) cage_min: String,
    pub(crate) cage_max: String,
    pub(crate) selected_direction: Direction,
    pub(crate) led_on: bool,
    pub(crate) drill_on: bool,
    pub(crate) cage_state: CageState,

    // UI State
    pub(crate) selected_tab: Tab,
    pub(crate) bluetooth_address_input: String,

    // Scanning
    pub(crate) is_scanning: bool,
    pub(crate) scanned_devices: Vec<ScannedDevice>,
    pub(crate) last_connected_address: Option<u64>,

    // Joystick
    pub(crate) joystick: JoystickWorker,

    // UI Options
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl GrinderApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Apply Neubrutalism Style (default Light)
        crate::presentation::theme::configure_neubrutalism(&cc.egui_ctx, false);

        let settings_service = SettingsService::new().expect("Failed to load settings");

        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings_service.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        info!("Starting Granite Grinder Panel");

        let config = ConfigStore::load_or_create(params::CONFIG_FILE).unwrap_or_else(|e| {
            warn!("Could not read {}: {}. Using defaults.", params::CONFIG_FILE, e);
            ConfigStore::defaults(params::CONFIG_FILE)
        });

        let settings = Arc::new(Mutex::new(settings_service));
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let (bt_cmd_tx, mut bt_cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let bt_settings = settings.clone();
        let bt_event_tx = event_tx.clone();

        // The Bluetooth worker owns the device handle exclusively. Every
        // write, from the UI or the joystick, goes through this queue.
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime for Bluetooth");

            rt.block_on(async move {
                let tx_clone = bt_event_tx.clone();
                let mut bt_service = BluetoothService::new(bt_event_tx, bt_settings);

                while let Some(cmd) = bt_cmd_rx.recv().await {
                    match cmd {
                        BluetoothCommand::Connect(address) => {
                            if let Err(e) = bt_service.connect(address).await {
                                error!("Connection failed: {}", e);
                                let _ = tx_clone.send(AppEvent::LogMessage(StatusMessage {
                                    message: format!("Connection failed: {}", e),
                                    severity: MessageSeverity::Error,
                                }));
                                let _ = tx_clone.send(AppEvent::ConnectionStatus(
                                    ConnectionStatus::Disconnected,
                                ));
                            }
                        }
                        BluetoothCommand::Disconnect => {
                            bt_service.disconnect();
                        }
                        BluetoothCommand::StartScan => {
                            if let Err(e) = bt_service.start_scan() {
                                error!("Failed to start scan: {}", e);
                            }
                        }
                        BluetoothCommand::StopScan => {
                            if let Err(e) = bt_service.stop_scan() {
                                error!("Failed to stop scan: {}", e);
                            }
                        }
                        BluetoothCommand::Execute(plan) => {
                            bt_service.execute(plan).await;
                        }
                        BluetoothCommand::Shutdown(ack) => {
                            let _ = ack.send(());
                            break;
                        }
                    }
                }
            });
        });

        let loaded = config.get().clone();
        let direction_fields: [DirectionFields; 4] = std::array::from_fn(|i| {
            let p = loaded.direction(Direction::ALL[i]);
            DirectionFields {
                speed: p.speed.to_string(),
                step: p.step.to_string(),
                r_travel: p.r_travel.to_string(),
                l_travel: p.l_travel.to_string(),
            }
        });
        let cage_min = loaded.cage.bottom.to_string();
        let cage_max = loaded.cage.top.to_string();
        let last_connected_address = settings
            .lock()
            .ok()
            .and_then(|s| s.get().last_connected_address);

        Self {
            settings,
            config,
            bluetooth_tx: bt_cmd_tx,
            event_rx,
            event_tx,
            connection_status: ConnectionStatus::Disconnected,
            status_message: None,
            direction_fields,
            cage_min,
            cage_max,
            selected_direction: Direction::Forward,
            led_on: false,
            drill_on: false,
            cage_state: CageState::Open,
            selected_tab: Tab::Home,
            bluetooth_address_input: String::new(),
            is_scanning: false,
            scanned_devices: Vec::new(),
            last_connected_address,
            joystick: JoystickWorker::new(),
            is_dark_mode: false,
            _logging_guard: logging_guard,
        }
    }

    fn set_status(&mut self, message: impl Into<String>, severity: MessageSeverity) {
        self.status_message = Some(StatusMessage {
            message: message.into(),
            severity,
        });
    }

    /// Directional send: four writes in fixed order, sourced from the
    /// selected direction's fields. Skipped entirely if any field fails to
    /// parse as a byte.
    pub(crate) fn send_direction(&mut self, direction: Direction) {
        let fields = &self.direction_fields[direction.index()];
        match commands::direction_plan(fields) {
            Ok(plan) => {
                info!("Sending {} parameters", direction.label());
                let _ = self.bluetooth_tx.send(BluetoothCommand::Execute(plan));
            }
            Err(e) => {
                warn!("{} send skipped: {}", direction.label(), e);
                self.set_status(
                    format!("{} send skipped: {}", direction.label(), e),
                    MessageSeverity::Error,
                );
            }
        }
    }

    pub(crate) fn send_led(&mut self) {
        info!("Sending LED value: {}", self.led_on);
        let _ = self
            .bluetooth_tx
            .send(BluetoothCommand::Execute(commands::led_plan(self.led_on)));
    }

    pub(crate) fn send_drill(&mut self) {
        info!("Sending drill value: {}", self.drill_on);
        let _ = self
            .bluetooth_tx
            .send(BluetoothCommand::Execute(commands::drill_plan(
                self.drill_on,
            )));
    }

    /// Cage toggle: alternates between the configured bounds on every
    /// invocation, regardless of whether a panel button or the joystick
    /// triggered it.
    pub(crate) fn toggle_cage(&mut self) {
        let bound = self.cage_state.toggle();
        let raw = match bound {
            CageBound::Top => self.cage_max.clone(),
            CageBound::Bottom => self.cage_min.clone(),
        };
        match commands::cage_plan(&raw) {
            Ok(plan) => {
                info!("Switching cage to {:?} ({})", bound, raw.trim());
                let _ = self.bluetooth_tx.send(BluetoothCommand::Execute(plan));
            }
            Err(e) => {
                warn!("Cage switch skipped: {}", e);
                self.set_status(format!("Cage switch skipped: {}", e), MessageSeverity::Error);
            }
        }
    }

    pub(crate) fn send_reset(&mut self) {
        info!("Resetting...");
        let _ = self
            .bluetooth_tx
            .send(BluetoothCommand::Execute(commands::reset_plan()));
    }

    /// Collect the panel fields back into a config and write it out. Fields
    /// that do not parse keep their previously saved value.
    pub(crate) fn save_config(&mut self) {
        let mut config: GrinderConfig = self.config.get().clone();

        for direction in Direction::ALL {
            let fields = &self.direction_fields[direction.index()];
            let params = config.direction_mut(direction);
            apply_field("Speed", &fields.speed, &mut params.speed);
            apply_field("Step", &fields.step, &mut params.step);
            apply_field("R-Travel", &fields.r_travel, &mut params.r_travel);
            apply_field("L-Travel", &fields.l_travel, &mut params.l_travel);
        }
        apply_field("Cage_Top", &self.cage_max, &mut config.cage.top);
        apply_field("Cage_Bottom", &self.cage_min, &mut config.cage.bottom);

        match self.config.save(config) {
            Ok(()) => self.set_status("Config saved", MessageSeverity::Success),
            Err(e) => {
                error!("Failed to save config: {}", e);
                self.set_status(format!("Failed to save config: {}", e), MessageSeverity::Error);
            }
        }
    }

    pub(crate) fn toggle_joystick(&mut self) {
        if self.joystick.is_running() {
            self.joystick.stop();
            self.set_status("Joystick polling stopped", MessageSeverity::Info);
        } else {
            let (poll_ms, debounce_ms) = match self.settings.lock() {
                Ok(settings) => {
                    let s = settings.get();
                    (s.joystick_poll_interval_ms, s.input_debounce_ms)
                }
                Err(_) => (50, 50),
            };
            self.joystick.start(
                self.event_tx.clone(),
                Duration::from_millis(poll_ms),
                Duration::from_millis(debounce_ms),
            );
        }
    }

    /// Joystick actions run through the same handlers as the panel buttons,
    /// so toggles cannot drift between input sources.
    fn handle_joystick(&mut self, action: JoystickAction) {
        match action {
            JoystickAction::Drill(on) => {
                self.drill_on = on;
                self.send_drill();
            }
            JoystickAction::ToggleLed => {
                self.led_on = !self.led_on;
                self.send_led();
            }
            JoystickAction::ToggleCage => self.toggle_cage(),
            JoystickAction::Send(direction) => self.send_direction(direction),
            JoystickAction::Reset => self.send_reset(),
        }
    }
}

fn apply_field(label: &str, raw: &str, slot: &mut u16) {
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!("{} value {:?} is not an integer, keeping {}", label, raw, slot),
    }
}

impl eframe::App for GrinderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Joystick(action) => self.handle_joystick(action),
                AppEvent::ConnectionStatus(status) => {
                    self.connection_status = status;
                    if let ConnectionStatus::Connected = status {
                        self.set_status("Connected to Granite Grinder", MessageSeverity::Success);
                        if let Some(addr) = self.last_connected_address {
                            if let Ok(mut settings) = self.settings.lock() {
                                let _ = settings.remember_address(addr);
                            }
                        }
                    } else if let ConnectionStatus::Disconnected = status {
                        let keep_error = self
                            .status_message
                            .as_ref()
                            .map_or(false, |m| m.severity == MessageSeverity::Error);
                        if !keep_error {
                            self.set_status("Disconnected", MessageSeverity::Warning);
                        }
                    }
                }
                AppEvent::LogMessage(msg) => self.status_message = Some(msg),
                AppEvent::DeviceFound(device) => {
                    if let Some(existing) = self
                        .scanned_devices
                        .iter_mut()
                        .find(|d| d.address == device.address)
                    {
                        existing.signal_strength = device.signal_strength;
                    } else {
                        self.scanned_devices.push(device);
                    }
                }
            }
        }

        ctx.request_repaint();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Home, "Home");
                ui.selectable_value(&mut self.selected_tab, Tab::Control, "Control");
                ui.selectable_value(&mut self.selected_tab, Tab::Settings, "Settings");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_neubrutalism(ctx, self.is_dark_mode);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(860.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.selected_tab {
                        Tab::Home => tabs::home::render(self, ui),
                        Tab::Control => tabs::control::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Disconnecting from Granite Grinder...");
        let _ = self
            .bluetooth_tx
            .send(BluetoothCommand::Execute(commands::reset_plan()));
        let _ = self.bluetooth_tx.send(BluetoothCommand::Disconnect);

        // The reset pulse has a deliberate pause in the middle, so the
        // process must not exit until the worker has drained the queue.
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        if self
            .bluetooth_tx
            .send(BluetoothCommand::Shutdown(ack_tx))
            .is_ok()
            && ack_rx.recv_timeout(SHUTDOWN_TIMEOUT).is_err()
        {
            warn!("Bluetooth worker did not confirm shutdown in time");
        }

        self.joystick.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::WriteOp;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Drains the command channel the way the worker thread does: strictly in
    // order, honoring plan pauses, acknowledging Shutdown last.
    fn spawn_draining_worker(
        mut rx: tokio::sync::mpsc::UnboundedReceiver<BluetoothCommand>,
        executed: Arc<AtomicBool>,
    ) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    BluetoothCommand::Execute(plan) => {
                        for op in plan {
                            if let WriteOp::Pause(d) = op {
                                std::thread::sleep(d);
                            }
                        }
                        executed.store(true, Ordering::SeqCst);
                    }
                    BluetoothCommand::Shutdown(ack) => {
                        let _ = ack.send(());
                        break;
                    }
                    _ => {}
                }
            }
        })
    }

    #[test]
    fn shutdown_ack_arrives_after_queued_plans_finish() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let executed = Arc::new(AtomicBool::new(false));
        let worker = spawn_draining_worker(rx, executed.clone());

        tx.send(BluetoothCommand::Execute(commands::reset_plan()))
            .unwrap();

        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        tx.send(BluetoothCommand::Shutdown(ack_tx)).unwrap();

        ack_rx
            .recv_timeout(SHUTDOWN_TIMEOUT)
            .expect("worker must acknowledge shutdown");
        // The reset pulse, pause included, ran to completion before the ack
        assert!(executed.load(Ordering::SeqCst));

        worker.join().unwrap();
    }

    #[test]
    fn shutdown_ack_is_not_sent_before_the_queue_is_drained() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let executed = Arc::new(AtomicBool::new(false));
        let worker = spawn_draining_worker(rx, executed.clone());

        // A plan with a pause well past the polling instant below
        tx.send(BluetoothCommand::Execute(vec![WriteOp::Pause(
            Duration::from_millis(150),
        )]))
        .unwrap();
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        tx.send(BluetoothCommand::Shutdown(ack_tx)).unwrap();

        assert!(ack_rx.recv_timeout(Duration::from_millis(20)).is_err());
        ack_rx
            .recv_timeout(SHUTDOWN_TIMEOUT)
            .expect("worker must acknowledge shutdown");

        worker.join().unwrap();
    }
}
