/// Main application state and eframe::App implementation
///
/// Owns the fit session and turns toolbar actions, arrow keys and plot clicks
/// into session transitions. Results are saved when the window closes.

use std::path::{Path, PathBuf};

use eframe::egui;

use crate::config::SessionConfig;
use crate::data::spectrasuite::read_spectrasuite_file;
use crate::gui::results_panel;
use crate::gui::spectrum_view::{self, BoundaryPick, SpectrumViewState};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction, ToolbarInfo};
use crate::session::FitSession;

/// Everything `main` prepares before the window opens
pub struct AppSetup {
    pub session: FitSession,
    pub config: SessionConfig,
    pub output_path: PathBuf,
    pub journal_path: Option<PathBuf>,
}

/// The main application
pub struct PeakFitApp {
    session: Option<FitSession>,
    config: SessionConfig,

    /// Where the fitted-parameter table is written at session end
    output_path: PathBuf,
    journal_path: Option<PathBuf>,
    /// Set once the session-end save has run
    session_closed: bool,

    view_state: SpectrumViewState,

    status_message: String,
    show_journal_window: bool,
    show_about: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,

    /// Dropped files buffer
    dropped_files: Vec<PathBuf>,
}

impl PeakFitApp {
    pub fn new(cc: &eframe::CreationContext<'_>, setup: AppSetup) -> Self {
        let default_theme = AppTheme::Light;
        theme::apply_theme(&cc.egui_ctx, default_theme);

        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        cc.egui_ctx.set_style(style);

        let status_message = format!(
            "{} peaks detected in {}. Press → to start.",
            setup.session.peaks().len(),
            setup.session.spectrum().display_name()
        );

        Self {
            session: Some(setup.session),
            config: setup.config,
            output_path: setup.output_path,
            journal_path: setup.journal_path,
            session_closed: false,
            view_state: SpectrumViewState::default(),
            status_message,
            show_journal_window: false,
            show_about: false,
            current_theme: default_theme,
            theme_colors: ThemeColors::from_theme(default_theme),
            dropped_files: Vec::new(),
        }
    }

    /// Replace the current session with one for the spectrum at `path`.
    /// The outgoing session is saved first.
    fn open_spectrum(&mut self, path: PathBuf) {
        match read_spectrasuite_file(&path, &self.config.loader) {
            Ok(spectrum) => {
                self.end_session();
                let session = FitSession::start(spectrum, &self.config);
                self.output_path = unused_output_path(&path);
                log::info!("Results for {} go to {}", path.display(), self.output_path.display());
                self.status_message = format!(
                    "{} peaks detected in {}; results will be saved to {}",
                    session.peaks().len(),
                    session.spectrum().display_name(),
                    self.output_path.display()
                );
                self.session = Some(session);
                self.session_closed = false;
                self.view_state = SpectrumViewState::default();
            }
            Err(e) => {
                log::warn!("Could not open {}: {}", path.display(), e);
                self.status_message = format!("Error loading {}: {}", path.display(), e);
            }
        }
    }

    fn navigate(&mut self, delta: isize) {
        let Some(session) = &mut self.session else {
            return;
        };
        let window = session.advance(delta);
        self.view_state.zoom_to(window);
        if let Some(w) = window {
            self.status_message = format!("{} (pixel {})", w.title(), w.center);
        }
    }

    fn handle_pick(&mut self, pick: BoundaryPick) {
        let Some(session) = &mut self.session else {
            return;
        };
        let was_reviewing = session.current_peak().is_some();
        match session.set_boundary(pick.side, pick.pixel) {
            Ok(Some(outcome)) => {
                self.status_message = outcome.summary();
                if !was_reviewing {
                    self.view_state.zoom_to(session.display_window());
                }
            }
            Ok(None) => {
                let selection = session.selection();
                self.status_message = match (selection.left, selection.right) {
                    (Some(l), Some(r)) => format!(
                        "Selection [{}, {}) not fitted: need 0 < right − left < {}",
                        l,
                        r,
                        session.max_width()
                    ),
                    _ => format!("{} boundary at pixel {}", pick.side, pick.pixel),
                };
            }
            Err(e) => {
                log::warn!("Ignoring pick: {}", e);
                self.status_message = e.to_string();
            }
        }
    }

    fn save_results(&mut self, path: &Path) {
        let Some(session) = &mut self.session else {
            self.status_message = "No spectrum loaded".to_string();
            return;
        };
        match session.save_results(path) {
            Ok(rows) => {
                self.status_message = format!("Saved {} rows to {}", rows, path.display());
            }
            Err(e) => {
                log::error!("{}", e);
                self.status_message = format!("❌ {}", e);
            }
        }
    }

    fn save_journal(&mut self, path: &Path) {
        let Some(session) = &self.session else {
            return;
        };
        match session.journal().save(path) {
            Ok(()) => self.status_message = format!("Journal saved: {}", path.display()),
            Err(e) => {
                log::error!("Error saving journal to {}: {}", path.display(), e);
                self.status_message = format!("Error saving journal: {}", e);
            }
        }
    }

    /// Session end: write the results table and, when requested, the journal
    fn end_session(&mut self) {
        if self.session_closed || self.session.is_none() {
            return;
        }
        let output = self.output_path.clone();
        self.save_results(&output);
        if let Some(journal) = self.journal_path.clone() {
            self.save_journal(&journal);
        }
        self.session_closed = true;
    }

    fn handle_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenSpectrum => {
                if let Some(path) = toolbar::open_spectrum_dialog() {
                    self.open_spectrum(path);
                }
            }
            ToolbarAction::SaveResults => {
                let output = self.output_path.clone();
                self.save_results(&output);
            }
            ToolbarAction::SaveResultsAs => {
                if let Some(path) = toolbar::save_results_dialog() {
                    self.save_results(&path);
                }
            }
            ToolbarAction::ExportJournal => {
                if let Some(path) = toolbar::save_journal_dialog() {
                    self.save_journal(&path);
                }
            }
            ToolbarAction::ShowJournal => {
                self.show_journal_window = !self.show_journal_window;
            }
            ToolbarAction::PreviousPeak => self.navigate(-1),
            ToolbarAction::NextPeak => self.navigate(1),
            ToolbarAction::ZoomReset => {
                self.view_state.reset_zoom();
                self.status_message = "Showing whole spectrum".to_string();
            }
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
            }
            ToolbarAction::ShowAbout => {
                self.show_about = true;
            }
            ToolbarAction::None => {}
        }
    }
}

impl eframe::App for PeakFitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Re-apply theme each frame (ensures toggle takes effect) ──
        theme::apply_theme(ctx, self.current_theme);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.end_session();
        }

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        if let Some(path) = self.dropped_files.pop() {
            self.open_spectrum(path);
        }

        // ── Toolbar ──
        let info = ToolbarInfo {
            theme_label: self.current_theme.label(),
            has_session: self.session.is_some(),
            can_go_back: self
                .session
                .as_ref()
                .is_some_and(|s| s.current_peak().is_some_and(|c| c > 0)),
            can_go_forward: self.session.as_ref().is_some_and(|s| {
                !s.peaks().is_empty() && s.current_peak().map_or(true, |c| c + 1 < s.peaks().len())
            }),
            fitted: self
                .session
                .as_ref()
                .map_or(0, |s| s.results().fitted_count()),
            peak_count: self.session.as_ref().map_or(0, |s| s.peaks().len()),
        };
        let toolbar_action = toolbar::show_toolbar(ctx, &info);
        if toolbar_action != ToolbarAction::None {
            self.handle_toolbar_action(toolbar_action);
        }

        // ── Status Bar ──
        let tc = self.theme_colors.clone();
        let hint = self.session.as_ref().map(|s| {
            theme::pick_hint(!s.peaks().is_empty(), s.current_peak().is_some(), &tc)
        });
        let journal_len = self.session.as_ref().map_or(0, |s| s.journal().len());
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::new()
                    .fill(tc.status_bar_bg)
                    .inner_margin(egui::Margin::symmetric(12, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some((mode_name, mode_hint, mode_color)) = hint {
                        let badge = egui::Button::new(
                            egui::RichText::new(mode_name)
                                .size(11.5)
                                .strong()
                                .color(mode_color),
                        )
                        .fill(mode_color.linear_multiply(0.2))
                        .stroke(egui::Stroke::new(1.0, mode_color))
                        .corner_radius(10.0);
                        ui.add(badge);
                        ui.label(
                            egui::RichText::new(mode_hint)
                                .size(11.0)
                                .italics()
                                .color(mode_color.linear_multiply(0.7)),
                        );
                        ui.separator();
                    }
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.5)
                            .color(tc.status_text),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("📋 Journal").clicked() {
                            self.show_journal_window = !self.show_journal_window;
                        }
                        ui.label(
                            egui::RichText::new(format!("{} entries", journal_len))
                                .size(11.0)
                                .color(tc.text_muted),
                        );
                        ui.separator();
                        ui.label(
                            egui::RichText::new(format!("→ {}", self.output_path.display()))
                                .size(11.0)
                                .color(tc.text_muted),
                        );
                    });
                });
            });

        // ── Right Panel: results ──
        if let Some(session) = &self.session {
            egui::SidePanel::right("results_panel")
                .resizable(true)
                .default_width(560.0)
                .min_width(380.0)
                .show(ctx, |ui| {
                    results_panel::show_results_panel(
                        ui,
                        session.peaks(),
                        session.results(),
                        session.current_peak(),
                        session.last_outcome(),
                        &tc,
                    );
                });
        }

        // ── Central Panel: spectrum ──
        let mut pick = None;
        egui::CentralPanel::default().show(ctx, |ui| match &self.session {
            Some(session) => {
                pick = spectrum_view::show_spectrum(ui, session, &mut self.view_state, &tc);
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a spectrum to begin");
                });
            }
        });
        if let Some(pick) = pick {
            self.handle_pick(pick);
        }

        // ── Journal Window ──
        if self.show_journal_window {
            let journal_text = self
                .session
                .as_ref()
                .map(|s| s.journal().to_text())
                .unwrap_or_default();
            let mut save_to = None;
            egui::Window::new("📋 Session Journal")
                .open(&mut self.show_journal_window)
                .default_size([600.0, 400.0])
                .resizable(true)
                .show(ctx, |ui| {
                    if ui.button("💾 Save…").clicked() {
                        save_to = toolbar::save_journal_dialog();
                    }
                    ui.separator();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.style_mut().override_font_id = Some(egui::FontId::monospace(12.0));
                        ui.label(journal_text);
                    });
                });
            if let Some(path) = save_to {
                self.save_journal(&path);
            }
        }

        // ── About Dialog ──
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("Spectral Peak Fitter");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("← / → : previous / next peak");
                    ui.label("Left click : left boundary");
                    ui.label("Right click : right boundary");
                });
        }

        // Keyboard navigation, unless a text field has focus
        let (back, forward) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if ctx.memory(|m| m.focused().is_none()) {
            if back {
                self.navigate(-1);
            }
            if forward {
                self.navigate(1);
            }
        }
        let open = ctx.input(|i| (i.modifiers.ctrl || i.modifiers.command) && i.key_pressed(egui::Key::O));
        if open {
            if let Some(path) = toolbar::open_spectrum_dialog() {
                self.open_spectrum(path);
            }
        }
    }
}

/// `<stem>_fitted.txt` next to the spectrum
pub fn default_output_path(spectrum_path: &Path) -> PathBuf {
    let stem = spectrum_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "spectrum".to_string());
    spectrum_path.with_file_name(format!("{}_fitted.txt", stem))
}

/// `default_output_path`, or `<stem>_fitted_N.txt` with the first `N` that
/// does not name an existing file
pub fn unused_output_path(spectrum_path: &Path) -> PathBuf {
    let default = default_output_path(spectrum_path);
    if !default.exists() {
        return default;
    }
    let stem = default
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = default.with_file_name(format!("{}_{}.txt", stem, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
