use crate::domain::models::Tab;
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Shelly Toolkit");
    ui.add_space(20.0);

    ui_session_panel(app, ui);
    ui.add_space(15.0);
    ui_navigation_panel(app, ui);
}

fn ui_session_panel(app: &mut ShellyApp, ui: &mut egui::Ui) {
    let username = app
        .settings
        .lock()
        .map(|s| {
            let session = &s.get().session;
            session.is_logged_in().then(|| session.username().to_string())
        })
        .unwrap_or(None);

    Components::brutalist_card(ui, "Session", |ui| match username {
        Some(name) => {
            ui.label(format!("Signed in as {}", name));
        }
        None => {
            ui.label("Signed out");
            if ui.button("Continue as guest").clicked() {
                app.sign_in_as_guest();
            }
        }
    });
}

fn ui_navigation_panel(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Pages", |ui| {
        let width = ui.available_width();
        for (tab, label) in [
            (Tab::Gallery, "Gallery"),
            (Tab::Web, "Web content"),
            (Tab::Bluetooth, "Bluetooth"),
            (Tab::Network, "Network"),
        ] {
            if ui.add_sized([width, 40.0], egui::Button::new(label)).clicked() {
                app.selected_tab = tab;
            }
        }
    });
}
