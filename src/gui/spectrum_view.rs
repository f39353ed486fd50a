/// Spectrum viewer: the full trace with detected peaks, the two boundary
/// lines and the latest fitted curve. Clicks on the plot become boundary
/// picks; everything drawn is read from the session each frame.

use egui_plot::{Corner, Legend, Line, MarkerShape, Plot, PlotBounds, PlotPoints, PlotUi, Points, VLine};

use crate::session::navigator::DisplayWindow;
use crate::session::selection::Side;
use crate::session::FitSession;

use super::theme::ThemeColors;

/// State for the spectrum viewer
#[derive(Debug, Clone)]
pub struct SpectrumViewState {
    /// Review window to zoom to on the next frame
    pub pending_window: Option<DisplayWindow>,
    pub show_peaks: bool,
    /// Incremented to give the plot a fresh ID (resets to the whole spectrum)
    pub plot_generation: u32,
}

impl Default for SpectrumViewState {
    fn default() -> Self {
        Self {
            pending_window: None,
            show_peaks: true,
            plot_generation: 0,
        }
    }
}

impl SpectrumViewState {
    pub fn zoom_to(&mut self, window: Option<DisplayWindow>) {
        if window.is_some() {
            self.pending_window = window;
        }
    }

    pub fn reset_zoom(&mut self) {
        self.pending_window = None;
        self.plot_generation = self.plot_generation.wrapping_add(1);
    }
}

/// A pointer pick on the plot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPick {
    pub side: Side,
    pub pixel: usize,
}

/// Primary button picks the left boundary, secondary the right one
pub fn side_for_click(primary: bool, secondary: bool) -> Option<Side> {
    match (primary, secondary) {
        (true, _) => Some(Side::Left),
        (false, true) => Some(Side::Right),
        _ => None,
    }
}

/// Show the spectrum plot and return the boundary picked this frame, if any
pub fn show_spectrum(
    ui: &mut egui::Ui,
    session: &FitSession,
    state: &mut SpectrumViewState,
    colors: &ThemeColors,
) -> Option<BoundaryPick> {
    let spectrum = session.spectrum();
    let window = session.display_window();

    // Controls above the plot
    ui.horizontal(|ui| {
        match &window {
            Some(w) => {
                ui.heading(w.title());
                ui.label(format!("pixel {}", w.center));
            }
            None => {
                ui.heading(spectrum.display_name());
            }
        }
        ui.separator();
        ui.checkbox(
            &mut state.show_peaks,
            format!("📍 {} peaks", session.peaks().len()),
        );
        ui.separator();
        if ui.button("⊞ Whole spectrum").clicked() {
            state.reset_zoom();
        }
        if window.is_some() && ui.button("🔍 Peak window").clicked() {
            state.zoom_to(window);
        }
        ui.separator();
        let selection = session.selection();
        let fmt = |p: Option<usize>| p.map_or("—".to_string(), |p| p.to_string());
        ui.colored_label(colors.left_boundary, format!("L {}", fmt(selection.left)));
        ui.colored_label(colors.right_boundary, format!("R {}", fmt(selection.right)));
    });

    let spectrum_points: PlotPoints = spectrum
        .intensity
        .iter()
        .enumerate()
        .map(|(i, &y)| [i as f64, y])
        .collect();
    let spectrum_line = Line::new(spectrum_points)
        .name(spectrum.display_name())
        .color(colors.spectrum_line)
        .width(1.2);

    let current = session.current_peak();
    let (current_peaks, other_peaks): (Vec<_>, Vec<_>) = session
        .peaks()
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, [p as f64, spectrum.at(p).unwrap_or(0.0)]))
        .partition(|(i, _)| Some(*i) == current);

    let selection = *session.selection();
    let preview = session.preview().map(|p| p.points.clone());
    let pending = state.pending_window.take();
    let show_peaks = state.show_peaks;

    let plot = Plot::new(format!("spectrum_{}", state.plot_generation))
        .height(ui.available_height() - 4.0)
        .x_axis_label("Pixel")
        .y_axis_label("Intensity")
        .allow_boxed_zoom(false)
        .allow_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .legend(Legend::default().position(Corner::RightTop).background_alpha(0.6));

    let plot_resp = plot.show(ui, |plot_ui: &mut PlotUi| {
        if let Some(w) = pending {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [w.pixel_min, w.intensity_min],
                [w.pixel_max, w.intensity_max],
            ));
        }

        plot_ui.line(spectrum_line);

        if show_peaks {
            let others: PlotPoints = other_peaks.iter().map(|(_, pt)| *pt).collect();
            plot_ui.points(
                Points::new(others)
                    .name("Detected peaks")
                    .color(colors.peak_marker)
                    .radius(2.5)
                    .shape(MarkerShape::Down),
            );
        }
        if !current_peaks.is_empty() {
            let pts: PlotPoints = current_peaks.iter().map(|(_, pt)| *pt).collect();
            plot_ui.points(
                Points::new(pts)
                    .name("Current peak")
                    .color(colors.current_peak_marker)
                    .radius(4.0)
                    .shape(MarkerShape::Down),
            );
        }

        if let Some(left) = selection.left {
            plot_ui.vline(
                VLine::new(left as f64)
                    .name("Left boundary")
                    .color(colors.left_boundary)
                    .width(1.5),
            );
        }
        if let Some(right) = selection.right {
            plot_ui.vline(
                VLine::new(right as f64)
                    .name("Right boundary")
                    .color(colors.right_boundary)
                    .width(1.5),
            );
        }

        if let Some(points) = preview {
            plot_ui.line(
                Line::new(PlotPoints::from(points))
                    .name("Fit")
                    .color(colors.fit_preview)
                    .width(2.0),
            );
        }
    });

    // ── Boundary picks ──
    let response = &plot_resp.response;
    let side = side_for_click(response.clicked(), response.secondary_clicked())?;
    let pos = response.hover_pos()?;
    let coord = plot_resp.transform.value_from_position(pos);
    let pixel = spectrum.nearest_pixel(coord.x)?;
    Some(BoundaryPick { side, pixel })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_buttons_map_to_sides() {
        assert_eq!(side_for_click(true, false), Some(Side::Left));
        assert_eq!(side_for_click(false, true), Some(Side::Right));
        assert_eq!(side_for_click(false, false), None);
    }

    #[test]
    fn test_reset_zoom_bumps_generation() {
        let mut state = SpectrumViewState::default();
        state.reset_zoom();
        assert_eq!(state.plot_generation, 1);
        assert!(state.pending_window.is_none());
        state.zoom_to(None);
        assert!(state.pending_window.is_none());
    }
}
