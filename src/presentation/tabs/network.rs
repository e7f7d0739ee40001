use crate::infrastructure::text_fetch::DEMO_URL;
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;

pub const HINT: &str = "Press Fetch to download a small text file.";
pub const LOADING: &str = "Loading…";

#[derive(Debug)]
pub struct NetworkScreen {
    pub url: String,
    pub text: String,
    pub loading: bool,
}

impl Default for NetworkScreen {
    fn default() -> Self {
        Self {
            url: DEMO_URL.to_string(),
            text: HINT.to_string(),
            loading: false,
        }
    }
}

impl NetworkScreen {
    /// Returns the URL to fetch, or `None` while a fetch is already running.
    pub fn start(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        self.loading = true;
        self.text = LOADING.to_string();
        Some(self.url.clone())
    }

    pub fn apply(&mut self, result: Result<String, String>) {
        self.loading = false;
        self.text = match result {
            Ok(text) => text,
            Err(message) => format!("Error: {}", message),
        };
    }
}

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    if Components::top_bar(ui, "Network", true) {
        app.go_home();
        return;
    }
    ui.add_space(10.0);

    Components::brutalist_card(ui, "Plain text fetch", |ui| {
        ui.horizontal(|ui| {
            ui.label("URL:");
            ui.add_enabled(
                !app.network.loading,
                egui::TextEdit::singleline(&mut app.network.url).desired_width(420.0),
            );
        });
        ui.horizontal(|ui| {
            let fetch = ui.add_enabled(!app.network.loading, egui::Button::new("Fetch"));
            if fetch.clicked() {
                if let Some(url) = app.network.start() {
                    app.send_fetch(url);
                }
            }
            if app.network.loading {
                ui.spinner();
            }
        });
        ui.add_space(10.0);
        ui.label(egui::RichText::new(&app.network.text).monospace());
    });
}
