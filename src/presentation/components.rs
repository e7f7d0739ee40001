use crate::domain::models::{MessageSeverity, StatusMessage};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn heading(ui: &mut egui::Ui, text: &str) {
        ui.label(egui::RichText::new(text).heading().strong());
    }

    pub fn sub_heading(ui: &mut egui::Ui, text: &str) {
        ui.label(egui::RichText::new(text).size(18.0).strong());
    }

    /// Page title with an optional back button. Returns true when back was clicked.
    pub fn top_bar(ui: &mut egui::Ui, title: &str, show_back: bool) -> bool {
        let mut back = false;
        ui.horizontal(|ui| {
            if show_back && ui.button("← Back").clicked() {
                back = true;
            }
            Self::heading(ui, title);
        });
        ui.separator();
        back
    }

    pub fn brutalist_card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(15.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    Self::sub_heading(ui, title);
                    ui.add_space(8.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn status_banner(
        ui: &mut egui::Ui,
        text: &str,
        bg_color: egui::Color32,
        text_color: egui::Color32,
    ) {
        ui.add_sized(
            [ui.available_width(), 35.0],
            egui::Label::new(
                egui::RichText::new(text)
                    .color(text_color)
                    .background_color(bg_color)
                    .size(16.0)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Truncate),
        );
    }

    pub fn status_line(ui: &mut egui::Ui, status: &StatusMessage) {
        let (bg, fg) = match status.severity {
            MessageSeverity::Info => (egui::Color32::from_gray(100), egui::Color32::WHITE),
            MessageSeverity::Success => (egui::Color32::from_rgb(0, 200, 0), egui::Color32::BLACK),
            MessageSeverity::Warning => {
                (egui::Color32::from_rgb(255, 200, 0), egui::Color32::BLACK)
            }
            MessageSeverity::Error => (egui::Color32::from_rgb(255, 50, 50), egui::Color32::WHITE),
        };
        Self::status_banner(ui, &status.message, bg, fg);
    }

    /// Error banner with a dismiss button. Returns true when dismissed.
    pub fn dismissible_error(ui: &mut egui::Ui, message: &str) -> bool {
        let mut dismissed = false;
        egui::Frame::none()
            .inner_margin(egui::Margin::same(10.0))
            .fill(egui::Color32::from_rgb(255, 50, 50))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.button("Dismiss").clicked();
                    });
                });
            });
        dismissed
    }
}
