use crate::domain::gallery::{GalleryUiState, PhotoItem};
use crate::domain::models::GalleryCommand;
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;

const MIN_CELL: f32 = 128.0;
const SPACING: f32 = 8.0;

#[derive(Debug)]
pub struct GalleryScreen {
    pub state: GalleryUiState,
    pub selected: Option<PhotoItem>,
    opened: bool,
    error_dismissed: bool,
    /// Photo count the footer last asked to extend, so one page is requested per size.
    requested_at: Option<usize>,
}

impl Default for GalleryScreen {
    fn default() -> Self {
        Self {
            state: GalleryUiState::Loading,
            selected: None,
            opened: false,
            error_dismissed: false,
            requested_at: None,
        }
    }
}

impl GalleryScreen {
    /// First visit triggers the initial load.
    pub fn on_open(&mut self) -> Option<GalleryCommand> {
        if self.opened {
            return None;
        }
        self.opened = true;
        Some(GalleryCommand::Refresh)
    }

    pub fn apply(&mut self, state: GalleryUiState) {
        if matches!(state, GalleryUiState::Error { .. }) {
            self.error_dismissed = false;
        }
        if !matches!(state, GalleryUiState::Success { .. }) {
            self.requested_at = None;
        }
        self.state = state;
    }

    pub fn refresh(&mut self) -> GalleryCommand {
        self.requested_at = None;
        GalleryCommand::Refresh
    }

    /// The "Loading…" footer scrolled into view.
    pub fn footer_visible(&mut self) -> Option<GalleryCommand> {
        let GalleryUiState::Success {
            photos,
            can_load_more: true,
            ..
        } = &self.state
        else {
            return None;
        };
        if self.requested_at == Some(photos.len()) {
            return None;
        }
        self.requested_at = Some(photos.len());
        Some(GalleryCommand::LoadNextPage)
    }

    pub fn dismiss_error(&mut self) {
        self.error_dismissed = true;
    }

    pub fn visible_error(&self) -> Option<&str> {
        match &self.state {
            GalleryUiState::Error { message } if !self.error_dismissed => Some(message),
            _ => None,
        }
    }
}

/// Columns that fit at least `MIN_CELL` wide, and the resulting square size.
pub fn grid_layout(available_width: f32) -> (usize, f32) {
    let columns = (((available_width + SPACING) / (MIN_CELL + SPACING)).floor() as usize).max(1);
    let cell = ((available_width - SPACING * (columns as f32 - 1.0)) / columns as f32).max(1.0);
    (columns, cell)
}

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    if let Some(command) = app.gallery.on_open() {
        app.send_gallery(command);
    }

    if app.gallery.selected.is_some() {
        render_detail(app, ui);
        return;
    }

    let mut back = false;
    ui.horizontal(|ui| {
        back = ui.button("← Back").clicked();
        Components::heading(ui, "Gallery");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Refresh").clicked() {
                let command = app.gallery.refresh();
                app.send_gallery(command);
            }
        });
    });
    ui.separator();
    if back {
        app.go_home();
        return;
    }

    let mut dismissed = false;
    let mut opened = None;
    let mut footer_seen = false;
    match &app.gallery.state {
        GalleryUiState::Loading => {
            ui.add_space(40.0);
            ui.spinner();
        }
        GalleryUiState::Error { .. } => {
            if let Some(message) = app.gallery.visible_error() {
                dismissed = Components::dismissible_error(ui, message);
            }
            ui.add_space(40.0);
            ui.spinner();
        }
        GalleryUiState::Success {
            photos,
            can_load_more,
            ..
        } => (opened, footer_seen) = render_grid(ui, photos, *can_load_more),
    }

    if dismissed {
        app.gallery.dismiss_error();
    }
    if let Some(photo) = opened {
        app.gallery.selected = Some(photo);
    }
    if footer_seen {
        if let Some(command) = app.gallery.footer_visible() {
            app.send_gallery(command);
        }
    }
}

/// Draws the thumbnails. Returns the clicked photo and whether the
/// "Loading…" footer is on screen.
fn render_grid(
    ui: &mut egui::Ui,
    photos: &[PhotoItem],
    can_load_more: bool,
) -> (Option<PhotoItem>, bool) {
    let (columns, cell) = grid_layout(ui.available_width());
    let size = egui::vec2(cell, cell);

    let mut clicked = None;
    ui.spacing_mut().item_spacing = egui::vec2(SPACING, SPACING);
    for row in photos.chunks(columns) {
        ui.horizontal(|ui| {
            for photo in row {
                let image = egui::Image::new(photo.thumb_url.as_str())
                    .fit_to_exact_size(size)
                    .maintain_aspect_ratio(false)
                    .show_loading_spinner(true)
                    .sense(egui::Sense::click());
                let response = ui.add_sized(size, image).on_hover_text(&photo.description);
                if response.clicked() {
                    clicked = Some(photo.clone());
                }
            }
        });
    }

    let mut footer_seen = false;
    if can_load_more {
        let footer = ui.add_sized([ui.available_width(), cell.min(48.0)], egui::Label::new("Loading…"));
        footer_seen = ui.is_rect_visible(footer.rect);
    }
    (clicked, footer_seen)
}

fn render_detail(app: &mut ShellyApp, ui: &mut egui::Ui) {
    if Components::top_bar(ui, "Image details", true) {
        app.gallery.selected = None;
        return;
    }
    let Some(photo) = app.gallery.selected.as_ref() else {
        return;
    };

    ui.add(
        egui::Image::new(photo.full_url.as_str())
            .max_width(ui.available_width())
            .show_loading_spinner(true),
    );
    ui.add_space(10.0);
    Components::sub_heading(ui, &photo.photographer);
    if !photo.description.trim().is_empty() {
        ui.label(&photo.description);
    }
}
