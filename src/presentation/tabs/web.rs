use crate::domain::web::{ABOUT_BODY, ABOUT_TITLE};
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    if Components::top_bar(ui, "Web content", true) {
        app.go_home();
        return;
    }
    ui.add_space(10.0);

    Components::brutalist_card(ui, ABOUT_TITLE, |ui| {
        ui.label(ABOUT_BODY);
        ui.add_space(10.0);
        if ui.button("Say hello").clicked() {
            app.web.press_hello();
        }
        if let Some(message) = app.web.message() {
            ui.label(egui::RichText::new(message).strong());
        }
    });
}
