mod domain;
mod error;
mod infrastructure;
mod presentation;

use eframe::egui;
use presentation::app::ShellyApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_title("Shelly Toolkit"),
        ..Default::default()
    };

    eframe::run_native(
        "Shelly Toolkit",
        options,
        Box::new(|cc| Ok(Box::new(ShellyApp::new(cc)))),
    )
}
