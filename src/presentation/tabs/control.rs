use crate::domain::commands::CageState;
use crate::domain::models::Direction;
use crate::presentation::app::GrinderApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut GrinderApp, ui: &mut egui::Ui) {
    Components::heading(ui, "CONTROL");
    ui.add_space(10.0);

    Components::brutalist_card(ui, "Motion parameters", |ui| {
        egui::Grid::new("motion_params")
            .num_columns(5)
            .spacing([14.0, 8.0])
            .show(ui, |ui| {
                ui.label("");
                ui.label(egui::RichText::new("Speed").strong());
                ui.label(egui::RichText::new("Step").strong());
                ui.label(egui::RichText::new("R-Travel").strong());
                ui.label(egui::RichText::new("L-Travel").strong());
                ui.end_row();

                for direction in Direction::ALL {
                    let fields = &mut app.direction_fields[direction.index()];
                    ui.label(egui::RichText::new(direction.label()).strong());
                    ui.add(egui::TextEdit::singleline(&mut fields.speed).desired_width(60.0));
                    ui.add(egui::TextEdit::singleline(&mut fields.step).desired_width(60.0));
                    ui.add(egui::TextEdit::singleline(&mut fields.r_travel).desired_width(60.0));
                    ui.add(egui::TextEdit::singleline(&mut fields.l_travel).desired_width(60.0));
                    ui.end_row();
                }
            });

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("direction_select")
                .selected_text(app.selected_direction.label())
                .show_ui(ui, |ui| {
                    for direction in Direction::ALL {
                        ui.selectable_value(
                            &mut app.selected_direction,
                            direction,
                            direction.label(),
                        );
                    }
                });

            if ui.button("▶ Send").clicked() {
                app.send_direction(app.selected_direction);
            }
            if ui.button("⟲ Reset").clicked() {
                app.send_reset();
            }
            if ui.button("💾 Save config").clicked() {
                app.save_config();
            }
        });
    });

    ui.add_space(10.0);

    ui.columns(2, |columns| {
        Components::brutalist_card(&mut columns[0], "Tools", |ui| {
            ui.horizontal(|ui| {
                ui.checkbox(&mut app.led_on, "LED");
                if ui.button("Send LED").clicked() {
                    app.send_led();
                }
            });
            ui.horizontal(|ui| {
                ui.checkbox(&mut app.drill_on, "Drill");
                if ui.button("Send drill").clicked() {
                    app.send_drill();
                }
            });
        });

        Components::brutalist_card(&mut columns[1], "Cage", |ui| {
            ui.horizontal(|ui| {
                ui.label("Bottom:");
                ui.add(egui::TextEdit::singleline(&mut app.cage_min).desired_width(60.0));
                ui.label("Top:");
                ui.add(egui::TextEdit::singleline(&mut app.cage_max).desired_width(60.0));
            });
            let label = match app.cage_state {
                CageState::Open => "⬇ Close cage",
                CageState::Closed => "⬆ Open cage",
            };
            if ui.button(label).clicked() {
                app.toggle_cage();
            }
        });
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Joystick", |ui| {
        ui.horizontal(|ui| {
            if app.joystick.is_running() {
                ui.label(egui::RichText::new("● ACTIVE").strong());
                if ui.button("⏹ Stop joystick").clicked() {
                    app.toggle_joystick();
                }
            } else {
                ui.label("Inactive");
                if ui.button("🕹 Start joystick").clicked() {
                    app.toggle_joystick();
                }
            }
        });
        ui.add_space(5.0);
        ui.label("A drill, B LED, X cage, Y reset, d-pad sends the matching direction.");
    });
}
