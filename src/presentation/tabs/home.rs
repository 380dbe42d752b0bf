use crate::domain::models::{BluetoothCommand, ConnectionStatus, MessageSeverity, StatusMessage};
use crate::presentation::app::GrinderApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut GrinderApp, ui: &mut egui::Ui) {
    Components::heading(ui, "GRANITE GRINDER");
    ui.add_space(10.0);

    render_status_banner(app, ui);
    ui.add_space(10.0);

    Components::brutalist_card(ui, "Connection", |ui| {
        ui.horizontal(|ui| {
            ui.label("Device address:");
            ui.add(
                egui::TextEdit::singleline(&mut app.bluetooth_address_input)
                    .hint_text("AA:BB:CC:DD:EE:FF")
                    .desired_width(180.0),
            );
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let connected = app.connection_status == ConnectionStatus::Connected;

            if !connected && ui.button("🔌 Connect").clicked() {
                connect_to_input(app);
            }
            if connected && ui.button("✂ Disconnect").clicked() {
                let _ = app.bluetooth_tx.send(BluetoothCommand::Disconnect);
            }

            if let Some(addr) = app.last_connected_address {
                if !connected && ui.button("↻ Reconnect last").clicked() {
                    app.bluetooth_address_input = format_address(addr);
                    start_connect(app, addr);
                }
            }
        });
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Scan", |ui| {
        ui.horizontal(|ui| {
            if !app.is_scanning {
                if ui.button("🔍 Scan for grinder").clicked() {
                    app.scanned_devices.clear();
                    app.is_scanning = true;
                    let _ = app.bluetooth_tx.send(BluetoothCommand::StartScan);
                }
            } else {
                ui.spinner();
                if ui.button("⏹ Stop scan").clicked() {
                    app.is_scanning = false;
                    let _ = app.bluetooth_tx.send(BluetoothCommand::StopScan);
                }
            }
        });

        if !app.scanned_devices.is_empty() {
            ui.add_space(8.0);
            ui.separator();

            let mut picked: Option<u64> = None;
            for device in &app.scanned_devices {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&device.name).strong());
                    ui.label(format_address(device.address));
                    ui.label(format!("{} dBm", device.signal_strength));
                    if ui.button("Connect").clicked() {
                        picked = Some(device.address);
                    }
                });
            }
            if let Some(address) = picked {
                app.bluetooth_address_input = format_address(address);
                if app.is_scanning {
                    app.is_scanning = false;
                    let _ = app.bluetooth_tx.send(BluetoothCommand::StopScan);
                }
                start_connect(app, address);
            }
        } else if app.is_scanning {
            ui.add_space(5.0);
            ui.label("Listening for advertisements...");
        }
    });

    if let Some(StatusMessage { message, severity }) = app.status_message.clone() {
        ui.add_space(10.0);
        Components::brutalist_card(ui, "Last message", |ui| {
            let color = severity_color(severity);
            ui.label(egui::RichText::new(message).color(color));
        });
    }
}

fn render_status_banner(app: &mut GrinderApp, ui: &mut egui::Ui) {
    let (text, bg, fg) = match app.connection_status {
        ConnectionStatus::Connected => (
            "● CONNECTED",
            egui::Color32::from_rgb(0, 255, 100),
            egui::Color32::BLACK,
        ),
        ConnectionStatus::Connecting => (
            "● CONNECTING...",
            egui::Color32::from_rgb(255, 220, 0),
            egui::Color32::BLACK,
        ),
        ConnectionStatus::Error => (
            "● ERROR",
            egui::Color32::from_rgb(255, 80, 80),
            egui::Color32::WHITE,
        ),
        ConnectionStatus::Disconnected => (
            "● DISCONNECTED",
            egui::Color32::from_rgb(120, 120, 120),
            egui::Color32::WHITE,
        ),
    };
    Components::status_banner(ui, text, bg, fg);
}

fn connect_to_input(app: &mut GrinderApp) {
    let raw = app.bluetooth_address_input.trim().replace([':', '-'], "");
    match u64::from_str_radix(&raw, 16) {
        Ok(address) => start_connect(app, address),
        Err(_) => {
            app.status_message = Some(StatusMessage {
                message: format!(
                    "\"{}\" is not a Bluetooth address",
                    app.bluetooth_address_input.trim()
                ),
                severity: MessageSeverity::Error,
            });
        }
    }
}

fn start_connect(app: &mut GrinderApp, address: u64) {
    app.last_connected_address = Some(address);
    app.connection_status = ConnectionStatus::Connecting;
    let _ = app.bluetooth_tx.send(BluetoothCommand::Connect(address));
}

fn format_address(address: u64) -> String {
    let bytes = address.to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn severity_color(severity: MessageSeverity) -> egui::Color32 {
    match severity {
        MessageSeverity::Info => egui::Color32::from_rgb(0, 150, 255),
        MessageSeverity::Success => egui::Color32::from_rgb(0, 180, 80),
        MessageSeverity::Warning => egui::Color32::from_rgb(220, 150, 0),
        MessageSeverity::Error => egui::Color32::from_rgb(230, 60, 60),
    }
}
