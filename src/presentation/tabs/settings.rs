use crate::domain::models::{BluetoothCommand, StatusMessage};
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;
use tracing::{error, info};

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Settings");
    ui.add_space(20.0);

    let mut connections_changed = false;
    let mut status = None;

    if let Ok(mut settings) = app.settings.lock() {
        let settings_mut = settings.get_mut();

        Components::brutalist_card(ui, "Bluetooth", |ui| {
            ui.horizontal(|ui| {
                ui.label("Scan timeout (ms):");
                ui.add(egui::Slider::new(
                    &mut settings_mut.ble.scan_timeout_ms,
                    1_000..=60_000,
                ));
            });
            connections_changed = ui
                .checkbox(
                    &mut settings_mut.ble.allow_connections,
                    "Allow GATT connections",
                )
                .changed();
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Gallery", |ui| {
            egui::Grid::new("gallery_settings")
                .spacing([10.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Access key:");
                    ui.add(
                        egui::TextEdit::singleline(&mut settings_mut.gallery.access_key)
                            .password(true),
                    );
                    ui.end_row();
                    ui.label("Base URL:");
                    ui.text_edit_singleline(&mut settings_mut.gallery.base_url);
                    ui.end_row();
                    ui.label("Page size:");
                    ui.add(egui::Slider::new(&mut settings_mut.gallery.page_size, 1..=30));
                    ui.end_row();
                });
            ui.label(
                egui::RichText::new("UNSPLASH_ACCESS_KEY overrides the stored key. Restart required.")
                    .italics()
                    .size(12.0),
            );
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Logging", |ui| {
            ui.horizontal(|ui| {
                ui.label("Verbosity Level:");
                egui::ComboBox::from_id_salt("log_level")
                    .selected_text(&settings_mut.log_settings.level)
                    .show_ui(ui, |ui| {
                        for level in ["trace", "debug", "info", "warn", "error"] {
                            ui.selectable_value(
                                &mut settings_mut.log_settings.level,
                                level.to_string(),
                                level,
                            );
                        }
                    });
            });
            ui.checkbox(
                &mut settings_mut.log_settings.console_logging_enabled,
                "Console logs",
            );
            ui.checkbox(
                &mut settings_mut.log_settings.file_logging_enabled,
                "File logs",
            );
            if settings_mut.log_settings.file_logging_enabled {
                ui.indent("file_logs", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Directory:");
                        ui.text_edit_singleline(&mut settings_mut.log_settings.log_dir);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Rotation:");
                        egui::ComboBox::from_id_salt("log_rotation")
                            .selected_text(&settings_mut.log_settings.rotation)
                            .show_ui(ui, |ui| {
                                for rotation in ["daily", "hourly", "minutely", "never"] {
                                    ui.selectable_value(
                                        &mut settings_mut.log_settings.rotation,
                                        rotation.to_string(),
                                        rotation,
                                    );
                                }
                            });
                    });
                });
            }
        });

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                status = Some(match settings.save() {
                    Ok(()) => {
                        info!("Settings saved");
                        StatusMessage::success("Settings saved")
                    }
                    Err(e) => {
                        error!("Failed to save settings: {}", e);
                        StatusMessage::error(format!("Save failed: {}", e))
                    }
                });
            }
            if settings.get().session.is_logged_in() && ui.button("Log out").clicked() {
                status = Some(match settings.logout() {
                    Ok(()) => StatusMessage::info("Logged out"),
                    Err(e) => {
                        error!("Failed to save settings: {}", e);
                        StatusMessage::error(format!("Save failed: {}", e))
                    }
                });
            }
        });
    }

    if connections_changed {
        app.send_bluetooth(BluetoothCommand::RefreshPermissions);
    }
    if let Some(status) = status {
        app.settings_status = Some(status);
    }
    if let Some(status) = &app.settings_status {
        ui.add_space(10.0);
        Components::status_line(ui, status);
    }
}
