/// Results panel: one table row per detected peak plus the latest fit report

use egui_extras::{Column, TableBuilder};

use crate::session::results::ResultTable;
use crate::session::FitOutcome;

use super::theme::ThemeColors;

/// `value ± stderr` with the uncertainty dropped when it is unknown
pub fn format_estimate(value: f64, stderr: f64) -> String {
    if stderr.is_finite() {
        format!("{:.3} ± {:.3}", value, stderr)
    } else {
        format!("{:.3}", value)
    }
}

pub fn format_wavelength(nm: f64) -> String {
    if nm.is_finite() {
        format!("{:.3}", nm)
    } else {
        "—".to_string()
    }
}

pub fn show_results_panel(
    ui: &mut egui::Ui,
    peaks: &[usize],
    results: &ResultTable,
    current: Option<usize>,
    last_outcome: Option<&FitOutcome>,
    colors: &ThemeColors,
) {
    ui.heading("Fitted peaks");
    ui.label(
        egui::RichText::new(format!("{} of {} fitted", results.fitted_count(), results.len()))
            .color(colors.text_muted),
    );
    ui.separator();

    let row_height = 18.0;
    TableBuilder::new(ui)
        .id_salt("fitted_peaks")
        .striped(true)
        .max_scroll_height(320.0)
        .column(Column::exact(36.0))
        .column(Column::exact(48.0))
        .columns(Column::auto().at_least(90.0), 4)
        .column(Column::remainder().at_least(70.0))
        .header(20.0, |mut header| {
            for title in ["#", "pixel", "center", "amplitude", "sigma", "c", "λ (nm)"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(row_height, peaks.len(), |mut row| {
                let i = row.index();
                let is_current = Some(i) == current;
                let marker = |text: String| {
                    if is_current {
                        egui::RichText::new(text).strong().color(colors.current_peak_marker)
                    } else {
                        egui::RichText::new(text)
                    }
                };
                row.col(|ui| {
                    ui.label(marker(format!("{}", i + 1)));
                });
                row.col(|ui| {
                    ui.label(marker(peaks[i].to_string()));
                });
                match results.get(i) {
                    Some(fit) => {
                        for est in [fit.center, fit.amplitude, fit.sigma, fit.background] {
                            row.col(|ui| {
                                ui.label(format_estimate(est.value, est.stderr));
                            });
                        }
                        row.col(|ui| {
                            ui.label(format_wavelength(fit.wavelength_nm));
                        });
                    }
                    None => {
                        for _ in 0..5 {
                            row.col(|ui| {
                                ui.label(egui::RichText::new("·").color(colors.text_muted));
                            });
                        }
                    }
                }
            });
        });

    ui.separator();
    ui.heading("Last fit");
    match last_outcome {
        Some(FitOutcome::Fitted {
            report,
            calibration_error,
            ..
        }) => {
            if let Some(e) = calibration_error {
                ui.colored_label(colors.warning, format!("⚠ {}", e));
            }
            egui::ScrollArea::vertical()
                .id_salt("fit_report")
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::monospace(12.0));
                    ui.label(report.as_str());
                });
        }
        Some(outcome) => {
            ui.colored_label(colors.error, format!("❌ {}", outcome.summary()));
        }
        None => {
            ui.label(
                egui::RichText::new("Pick a left and a right boundary to fit the current peak")
                    .italics()
                    .color(colors.text_muted),
            );
        }
    }
}
