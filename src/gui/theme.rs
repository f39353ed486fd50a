/// Theme system: light and dark palettes for panels and the spectrum plot
///
/// The boundary and fit colours stay the same in both themes so that
/// "green is left, red is right, orange is the fit" holds everywhere.

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

/// All colors a theme needs to provide
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Panels & backgrounds
    pub panel_fill: egui::Color32,
    pub window_fill: egui::Color32,
    pub faint_bg: egui::Color32,

    // Widgets
    pub widget_inactive_bg: egui::Color32,
    pub widget_hovered_stroke: egui::Color32,
    pub widget_active_bg: egui::Color32,

    // Text
    pub text_primary: egui::Color32,
    pub text_muted: egui::Color32,

    // Status colours
    pub warning: egui::Color32,
    pub error: egui::Color32,

    // Spectrum plot
    pub spectrum_line: egui::Color32,
    pub peak_marker: egui::Color32,
    pub current_peak_marker: egui::Color32,
    pub left_boundary: egui::Color32,
    pub right_boundary: egui::Color32,
    pub fit_preview: egui::Color32,

    // Status bar
    pub status_bar_bg: egui::Color32,
    pub status_text: egui::Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0xF7, 0xF7, 0xF8),
            window_fill: egui::Color32::from_rgb(0xFF, 0xFF, 0xFF),
            faint_bg: egui::Color32::from_rgb(0xF0, 0xF1, 0xF3),

            widget_inactive_bg: egui::Color32::from_rgb(0xE3, 0xE5, 0xE8),
            widget_hovered_stroke: egui::Color32::from_rgb(0x5B, 0x9B, 0xD5),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            text_primary: egui::Color32::from_rgb(0x2A, 0x2E, 0x36),
            text_muted: egui::Color32::from_rgb(0x88, 0x8C, 0x94),

            warning: egui::Color32::from_rgb(0xB8, 0x8B, 0x00),
            error: egui::Color32::from_rgb(0xD0, 0x30, 0x30),

            spectrum_line: egui::Color32::from_rgb(0x1A, 0x47, 0x80),
            peak_marker: egui::Color32::from_rgb(0x88, 0x8C, 0x94),
            current_peak_marker: egui::Color32::from_rgb(0x8B, 0x00, 0x8B),
            left_boundary: egui::Color32::from_rgb(0x2E, 0x9E, 0x3E),
            right_boundary: egui::Color32::from_rgb(0xD0, 0x30, 0x30),
            fit_preview: egui::Color32::from_rgb(0xFF, 0x8C, 0x00),

            status_bar_bg: egui::Color32::from_rgb(0xF0, 0xF1, 0xF3),
            status_text: egui::Color32::from_rgb(0x44, 0x48, 0x52),

            is_dark: false,
        }
    }

    fn dark() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0x1B, 0x1D, 0x22),
            window_fill: egui::Color32::from_rgb(0x22, 0x25, 0x2B),
            faint_bg: egui::Color32::from_rgb(0x26, 0x29, 0x30),

            widget_inactive_bg: egui::Color32::from_rgb(0x2E, 0x32, 0x3A),
            widget_hovered_stroke: egui::Color32::from_rgb(0x6F, 0xB1, 0xFF),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            text_primary: egui::Color32::from_rgb(0xE0, 0xE2, 0xE8),
            text_muted: egui::Color32::from_rgb(0x80, 0x84, 0x8E),

            warning: egui::Color32::from_rgb(0xFF, 0xD0, 0x40),
            error: egui::Color32::from_rgb(0xFF, 0x55, 0x55),

            spectrum_line: egui::Color32::from_rgb(0x6F, 0xB1, 0xFF),
            peak_marker: egui::Color32::from_rgb(0x80, 0x84, 0x8E),
            current_peak_marker: egui::Color32::from_rgb(0xE0, 0x70, 0xE0),
            left_boundary: egui::Color32::from_rgb(0x4C, 0xD0, 0x7A),
            right_boundary: egui::Color32::from_rgb(0xFF, 0x55, 0x55),
            fit_preview: egui::Color32::from_rgb(0xFF, 0xA5, 0x00),

            status_bar_bg: egui::Color32::from_rgb(0x16, 0x18, 0x1C),
            status_text: egui::Color32::from_rgb(0xB0, 0xB4, 0xBE),

            is_dark: true,
        }
    }
}

/// Apply a theme to the egui context
pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;
    visuals.faint_bg_color = c.faint_bg;

    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, c.text_primary);
    visuals.widgets.inactive.bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.widget_hovered_stroke);
    visuals.widgets.active.bg_fill = c.widget_active_bg;

    ctx.set_visuals(visuals);
}

/// Hint shown in the status bar for the current review state
pub fn pick_hint(
    has_peaks: bool,
    reviewing: bool,
    colors: &ThemeColors,
) -> (&'static str, &'static str, egui::Color32) {
    if !has_peaks {
        return ("NO PEAKS", "Nothing above the detection threshold", colors.warning);
    }
    if !reviewing {
        return ("START", "Press → or Next to review the first peak", colors.text_muted);
    }
    (
        "PICK",
        "Left click: left boundary · Right click: right boundary",
        colors.current_peak_marker,
    )
}
