use crate::domain::commands::GrinderCharacteristic;
use crate::domain::models::MessageSeverity;
use crate::presentation::app::GrinderApp;
use crate::presentation::components::Components;
use eframe::egui;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const ROTATIONS: [&str; 4] = ["daily", "hourly", "minutely", "never"];

pub fn render(app: &mut GrinderApp, ui: &mut egui::Ui) {
    Components::heading(ui, "SETTINGS");
    ui.add_space(10.0);

    let settings = app.settings.clone();
    let Ok(mut service) = settings.lock() else {
        ui.label("Settings unavailable");
        return;
    };

    let mut save_requested = false;

    {
        let s = service.get_mut();

        Components::brutalist_card(ui, "Device", |ui| {
            ui.horizontal(|ui| {
                ui.label("Advertised name:");
                ui.add(egui::TextEdit::singleline(&mut s.device_name).desired_width(200.0));
            });
            ui.checkbox(
                &mut s.debug_show_all_devices,
                "Show every advertising device while scanning",
            );
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Advanced BLE", |ui| {
            ui.label("Characteristic UUID per register. Only change these against a rebuilt firmware.");
            egui::Grid::new("register_uuids")
                .num_columns(2)
                .spacing([14.0, 6.0])
                .show(ui, |ui| {
                    for role in GrinderCharacteristic::ALL {
                        ui.label(format!("{:?}", role));
                        ui.add(
                            egui::TextEdit::singleline(s.register_uuids.get_mut(role))
                                .desired_width(320.0),
                        );
                        ui.end_row();
                    }
                });
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Joystick", |ui| {
            ui.horizontal(|ui| {
                ui.label("Poll interval:");
                ui.add(
                    egui::Slider::new(&mut s.joystick_poll_interval_ms, 10..=200).suffix(" ms"),
                );
            });
            ui.horizontal(|ui| {
                ui.label("Debounce window:");
                ui.add(egui::Slider::new(&mut s.input_debounce_ms, 0..=200).suffix(" ms"));
            });
            ui.label("Takes effect the next time the joystick is started.");
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Logging", |ui| {
            ui.horizontal(|ui| {
                ui.label("Level:");
                egui::ComboBox::from_id_salt("log_level")
                    .selected_text(&s.log_settings.level)
                    .show_ui(ui, |ui| {
                        for level in LOG_LEVELS {
                            ui.selectable_value(
                                &mut s.log_settings.level,
                                level.to_string(),
                                level,
                            );
                        }
                    });
            });

            ui.checkbox(&mut s.log_settings.console_logging_enabled, "Log to console");
            ui.checkbox(&mut s.log_settings.file_logging_enabled, "Log to file");

            if s.log_settings.file_logging_enabled {
                ui.horizontal(|ui| {
                    ui.label("Directory:");
                    ui.add(
                        egui::TextEdit::singleline(&mut s.log_settings.log_dir)
                            .desired_width(160.0),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Rotation:");
                    egui::ComboBox::from_id_salt("log_rotation")
                        .selected_text(&s.log_settings.rotation)
                        .show_ui(ui, |ui| {
                            for rotation in ROTATIONS {
                                ui.selectable_value(
                                    &mut s.log_settings.rotation,
                                    rotation.to_string(),
                                    rotation,
                                );
                            }
                        });
                });
            }

            ui.label("Logging changes apply after a restart.");
        });

        ui.add_space(15.0);

        if ui.button("💾 Save settings").clicked() {
            save_requested = true;
        }
    }

    if save_requested {
        match service.save() {
            Ok(()) => {
                app.status_message = Some(crate::domain::models::StatusMessage {
                    message: "Settings saved".to_string(),
                    severity: MessageSeverity::Success,
                });
            }
            Err(e) => {
                tracing::error!("Failed to save settings: {}", e);
                app.status_message = Some(crate::domain::models::StatusMessage {
                    message: format!("Failed to save settings: {}", e),
                    severity: MessageSeverity::Error,
                });
            }
        }
    }
}
