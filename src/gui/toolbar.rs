/// Toolbar: top menu bar with file operations and peak navigation

use std::path::PathBuf;

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenSpectrum,
    SaveResults,
    SaveResultsAs,
    ExportJournal,
    ShowJournal,
    PreviousPeak,
    NextPeak,
    ZoomReset,
    ThemeToggle,
    ShowAbout,
}

/// What the toolbar shows about the session
pub struct ToolbarInfo<'a> {
    pub theme_label: &'a str,
    pub has_session: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub fitted: usize,
    pub peak_count: usize,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, info: &ToolbarInfo<'_>) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File menu
            ui.menu_button("📁 File", |ui| {
                if ui.button("📂 Open Spectrum…").clicked() {
                    action = ToolbarAction::OpenSpectrum;
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(info.has_session, egui::Button::new("💾 Save Results"))
                    .clicked()
                {
                    action = ToolbarAction::SaveResults;
                    ui.close_menu();
                }
                if ui
                    .add_enabled(info.has_session, egui::Button::new("💾 Save Results As…"))
                    .clicked()
                {
                    action = ToolbarAction::SaveResultsAs;
                    ui.close_menu();
                }
                if ui.button("📋 Export Journal…").clicked() {
                    action = ToolbarAction::ExportJournal;
                    ui.close_menu();
                }
            });

            // View menu
            ui.menu_button("🔍 View", |ui| {
                if ui.button("🔄 Whole Spectrum").clicked() {
                    action = ToolbarAction::ZoomReset;
                    ui.close_menu();
                }
                if ui.button("📋 Journal").clicked() {
                    action = ToolbarAction::ShowJournal;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(format!("🎨 Theme: {}", info.theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            // Help menu
            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.separator();
            if ui
                .add_enabled(info.can_go_back, egui::Button::new("◀ Previous"))
                .on_hover_text("Previous peak (←)")
                .clicked()
            {
                action = ToolbarAction::PreviousPeak;
            }
            if ui
                .add_enabled(info.can_go_forward, egui::Button::new("Next ▶"))
                .on_hover_text("Next peak (→)")
                .clicked()
            {
                action = ToolbarAction::NextPeak;
            }
            if info.has_session {
                ui.label(format!("{} of {} fitted", info.fitted, info.peak_count));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new(info.theme_label).size(12.0)).corner_radius(12.0))
                    .clicked()
                {
                    action = ToolbarAction::ThemeToggle;
                }
                ui.separator();
                ui.label(
                    egui::RichText::new("Spectral Peak Fitter")
                        .color(egui::Color32::from_rgb(0x70, 0x75, 0x80))
                        .size(12.0),
                );
            });
        });
    });

    action
}

/// Show file-open dialog for spectra
pub fn open_spectrum_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Spectrum")
        .add_filter("SpectraSuite export", &["txt"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Show save dialog for the fitted-parameter table
pub fn save_results_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Fitted Parameters")
        .add_filter("Text File", &["txt"])
        .save_file()
}

/// Show save dialog for journal export
pub fn save_journal_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Session Journal")
        .add_filter("Text File", &["txt"])
        .add_filter("JSON", &["json"])
        .save_file()
}
