#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod domain;
mod infrastructure;
mod presentation;

use presentation::app::GrinderApp;

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("Granite Grinder"),
        ..Default::default()
    };

    eframe::run_native(
        "Granite Grinder",
        options,
        Box::new(|cc| Ok(Box::new(GrinderApp::new(cc)))),
    )
}
