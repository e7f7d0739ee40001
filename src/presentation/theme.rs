use eframe::egui::{self, Color32, Rounding, Stroke};

/// Flat, high-contrast colour set.
pub struct Palette {
    pub background: Color32,
    pub surface: Color32,
    pub text: Color32,
    pub outline: Color32,
    pub hover: Color32,
    pub pressed: Color32,
    pub selection: Color32,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            surface: Color32::WHITE,
            text: Color32::BLACK,
            outline: Color32::BLACK,
            hover: Color32::from_rgb(255, 220, 0),
            pressed: Color32::from_rgb(0, 255, 100),
            selection: Color32::from_rgb(0, 200, 255),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(25, 25, 25),
            surface: Color32::from_gray(30),
            text: Color32::WHITE,
            outline: Color32::WHITE,
            hover: Color32::from_rgb(255, 200, 0),
            pressed: Color32::from_rgb(0, 255, 127),
            selection: Color32::from_rgb(0, 160, 200),
        }
    }

    pub fn for_mode(is_dark: bool) -> Self {
        if is_dark {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, is_dark: bool) {
    let palette = Palette::for_mode(is_dark);
    let mut style = (*ctx.style()).clone();

    for (text_style, font) in style.text_styles.iter_mut() {
        match text_style {
            egui::TextStyle::Heading => font.size = 26.0,
            egui::TextStyle::Body | egui::TextStyle::Button => font.size = 15.0,
            _ => {}
        }
    }
    style.spacing.item_spacing = egui::vec2(10.0, 10.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    let visuals = &mut style.visuals;
    let widgets = &mut visuals.widgets;
    for (widget, width) in [
        (&mut widgets.noninteractive, 2.0),
        (&mut widgets.inactive, 2.0),
        (&mut widgets.hovered, 2.5),
        (&mut widgets.active, 3.0),
    ] {
        widget.rounding = Rounding::ZERO;
        widget.bg_stroke = Stroke::new(width, palette.outline);
        widget.fg_stroke = Stroke::new(1.0, palette.text);
    }
    widgets.noninteractive.bg_fill = palette.background;
    widgets.inactive.bg_fill = palette.surface;
    widgets.hovered.bg_fill = palette.hover;
    widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::BLACK);
    widgets.hovered.expansion = 2.0;
    widgets.active.bg_fill = palette.pressed;
    widgets.active.fg_stroke = Stroke::new(1.0, Color32::BLACK);

    visuals.selection.bg_fill = palette.selection;
    visuals.selection.stroke = Stroke::new(1.0, palette.outline);
    visuals.window_rounding = Rounding::ZERO;
    visuals.window_stroke = Stroke::new(2.0, palette.outline);
    visuals.window_shadow = egui::Shadow {
        offset: egui::vec2(6.0, 6.0),
        blur: 0.0,
        spread: 0.0,
        color: palette.outline,
    };
    visuals.window_fill = palette.background;
    visuals.panel_fill = palette.background;
    visuals.override_text_color = Some(palette.text);

    ctx.set_style(style);
}
