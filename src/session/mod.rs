/// Fit session: the peak-review state machine
///
/// A session owns the loaded spectrum, the detected peaks, the current
/// boundary picks and the per-peak result table. Every transition takes
/// `&mut self`, so boundary updates and fits are strictly serialized and at
/// most one fit is ever running.

pub mod navigator;
pub mod results;
pub mod selection;

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::config::{DisplayConfig, SessionConfig};
use crate::data::calibration::{Calibration, CalibrationError, PolynomialCalibration};
use crate::data::spectrum::Spectrum;
use crate::fitting::report::fit_report;
use crate::fitting::{CurveFitter, FitError, LmPeakFitter, PeakFit, PeakGuess};
use crate::log::journal::SessionJournal;
use crate::pipeline::peaks::detect_peaks;
use navigator::{display_window, DisplayWindow, PeakNavigator};
use results::{ExportTable, FittedPeakRow, ResultTable};
use selection::{BoundarySelection, Side};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("pixel {pixel} is outside the spectrum (0..{len})")]
    PixelOutOfRange { pixel: usize, len: usize },
    #[error("failed to write {path}: {source}")]
    Io { path: String, source: io::Error },
}

/// Fitted curve sampled for display
#[derive(Debug, Clone, PartialEq)]
pub struct FitPreview {
    pub peak: usize,
    pub points: Vec<[f64; 2]>,
}

/// What happened to the most recent fit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted {
        peak: usize,
        row: FittedPeakRow,
        report: String,
        /// Set when the row was stored with a NaN wavelength
        calibration_error: Option<CalibrationError>,
    },
    Failed {
        peak: usize,
        error: FitError,
    },
}

impl FitOutcome {
    pub fn peak(&self) -> usize {
        match self {
            FitOutcome::Fitted { peak, .. } | FitOutcome::Failed { peak, .. } => *peak,
        }
    }

    /// One-line status text
    pub fn summary(&self) -> String {
        match self {
            FitOutcome::Fitted {
                peak,
                row,
                calibration_error: None,
                ..
            } => format!(
                "Peak {}: center {:.3} px, λ = {:.3} nm",
                peak + 1,
                row.center.value,
                row.wavelength_nm
            ),
            FitOutcome::Fitted {
                peak,
                row,
                calibration_error: Some(e),
                ..
            } => format!(
                "Peak {}: center {:.3} px, wavelength unavailable ({})",
                peak + 1,
                row.center.value,
                e
            ),
            FitOutcome::Failed { peak, error } => format!("Peak {}: fit failed ({})", peak + 1, error),
        }
    }
}

pub struct FitSession<F = LmPeakFitter, C = PolynomialCalibration> {
    spectrum: Spectrum,
    navigator: PeakNavigator,
    selection: BoundarySelection,
    results: ResultTable,
    fitter: F,
    calibration: C,
    max_width: usize,
    display: DisplayConfig,
    initial_sigma: f64,
    preview_samples: usize,
    preview: Option<FitPreview>,
    last_outcome: Option<FitOutcome>,
    journal: SessionJournal,
}

impl FitSession {
    /// Detect peaks in `spectrum` and set up the default fitter and
    /// calibration from `config`
    pub fn start(spectrum: Spectrum, config: &SessionConfig) -> Self {
        let peaks = detect_peaks(&spectrum.intensity, config.detection.min_height);
        log::info!(
            "Detected {} peaks above {} in {}",
            peaks.len(),
            config.detection.min_height,
            spectrum.display_name()
        );
        Self::new(
            spectrum,
            peaks,
            LmPeakFitter::from_config(&config.fit),
            config.calibration.clone(),
            config,
        )
    }
}

impl<F: CurveFitter, C: Calibration> FitSession<F, C> {
    pub fn new(
        spectrum: Spectrum,
        peaks: Vec<usize>,
        fitter: F,
        calibration: C,
        config: &SessionConfig,
    ) -> Self {
        let mut journal = SessionJournal::new();
        journal.set_source(&spectrum.source_path.display().to_string());
        journal.add_entry(
            "Load",
            &format!(
                "{} samples, {} peaks detected",
                spectrum.len(),
                peaks.len()
            ),
        );

        Self {
            results: ResultTable::new(peaks.len()),
            navigator: PeakNavigator::new(peaks),
            spectrum,
            selection: BoundarySelection::default(),
            fitter,
            calibration,
            max_width: config.selection.max_width,
            display: config.display.clone(),
            initial_sigma: config.fit.initial_sigma,
            preview_samples: config.fit.preview_samples,
            preview: None,
            last_outcome: None,
            journal,
        }
    }

    // ---------------------------------------------------------------------
    //  Navigation
    // ---------------------------------------------------------------------

    /// Step through the peak list, clamped at both ends. Returns the window
    /// to display, or `None` when nothing was detected.
    pub fn advance(&mut self, delta: isize) -> Option<DisplayWindow> {
        let before = self.navigator.current();
        let index = self.navigator.advance(delta)?;
        let center = self.navigator.peaks()[index];
        log::debug!(
            "Peak {} of {} at pixel {}",
            index + 1,
            self.navigator.len(),
            center
        );
        if before != Some(index) {
            self.journal.add_entry(
                "Navigate",
                &format!("peak {} of {} (pixel {})", index + 1, self.navigator.len(), center),
            );
        }
        self.display_window()
    }

    /// Window around the peak under review
    pub fn display_window(&self) -> Option<DisplayWindow> {
        let index = self.navigator.current()?;
        let center = self.navigator.current_pixel()?;
        Some(display_window(
            &self.spectrum,
            index,
            self.navigator.len(),
            center,
            &self.display,
        ))
    }

    // ---------------------------------------------------------------------
    //  Boundary picks and fitting
    // ---------------------------------------------------------------------

    /// Record a boundary pick. When the selection becomes fit-eligible the
    /// current peak is fitted straight away and the outcome returned.
    pub fn set_boundary(&mut self, side: Side, pixel: usize) -> Result<Option<FitOutcome>, SessionError> {
        if pixel >= self.spectrum.len() {
            return Err(SessionError::PixelOutOfRange {
                pixel,
                len: self.spectrum.len(),
            });
        }
        self.selection.set(side, pixel);
        log::debug!("{} boundary at pixel {}", side, pixel);

        let Some((left, right)) = self.selection.fit_range(self.max_width) else {
            return Ok(None);
        };
        if self.navigator.is_empty() {
            log::debug!("No detected peaks, selection [{}, {}) not fitted", left, right);
            return Ok(None);
        }
        let peak = match self.navigator.current() {
            Some(peak) => peak,
            None => {
                self.advance(1);
                match self.navigator.current() {
                    Some(peak) => peak,
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(self.fit_peak(peak, left, right)))
    }

    fn fit_peak(&mut self, peak: usize, left: usize, right: usize) -> FitOutcome {
        let center = self.navigator.peaks()[peak];
        let y = self.spectrum.slice(left, right);
        let x: Vec<f64> = (left..left + y.len()).map(|p| p as f64).collect();
        let guess = PeakGuess {
            center: center as f64,
            amplitude: self.spectrum.at(center).unwrap_or(0.0),
            sigma: self.initial_sigma,
            background: self.spectrum.min_in(left, right).unwrap_or(0.0),
        };

        let outcome = match self.fitter.fit(&x, y, &guess) {
            Ok(fit) => self.accept_fit(peak, left, right, &fit),
            Err(error) => {
                log::warn!("Fit of peak {} over [{}, {}) failed: {}", peak + 1, left, right, error);
                self.preview = None;
                self.journal.add_entry(
                    "Fit failed",
                    &format!("peak {} over [{}, {}): {}", peak + 1, left, right, error),
                );
                FitOutcome::Failed { peak, error }
            }
        };
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    fn accept_fit(&mut self, peak: usize, left: usize, right: usize, fit: &PeakFit) -> FitOutcome {
        let (wavelength_nm, calibration_error) = match self.calibration.wavelength_nm(fit.center.value) {
            Ok(w) => (w, None),
            Err(e) => {
                log::warn!("Peak {}: no wavelength for center {:.3}: {}", peak + 1, fit.center.value, e);
                (f64::NAN, Some(e))
            }
        };

        let row = FittedPeakRow::from_fit(fit, wavelength_nm);
        self.results.store(peak, row);
        self.preview = Some(FitPreview {
            peak,
            points: sample_fit(fit, left, right, self.preview_samples),
        });

        let report = fit_report(fit);
        log::info!(
            "Fitted peak {}: center {:.4} ± {:.4} px, wavelength {:.4} nm",
            peak + 1,
            row.center.value,
            row.center.stderr,
            wavelength_nm
        );
        log::debug!("\n{}", report);
        self.journal.add_entry(
            "Fit",
            &format!(
                "peak {} over [{}, {}): center {:.4}, amplitude {:.4}, sigma {:.4}, c {:.4}, λ {:.4} nm",
                peak + 1,
                left,
                right,
                row.center.value,
                row.amplitude.value,
                row.sigma.value,
                row.background.value,
                wavelength_nm
            ),
        );

        FitOutcome::Fitted {
            peak,
            row,
            report,
            calibration_error,
        }
    }

    // ---------------------------------------------------------------------
    //  Export
    // ---------------------------------------------------------------------

    /// Fitted rows in peak order; unfitted peaks are left out
    pub fn export(&self) -> ExportTable {
        self.results.export()
    }

    /// Write the export table to `path`, returning the number of rows
    pub fn save_results(&mut self, path: &Path) -> Result<usize, SessionError> {
        let table = self.export();
        table.save(path).map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Saved fitted parameters to {}", path.display());
        self.journal.add_entry(
            "Export",
            &format!("{} rows to {}", table.len(), path.display()),
        );
        Ok(table.len())
    }

    // ---------------------------------------------------------------------
    //  Observations
    // ---------------------------------------------------------------------

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn peaks(&self) -> &[usize] {
        self.navigator.peaks()
    }

    pub fn current_peak(&self) -> Option<usize> {
        self.navigator.current()
    }

    pub fn selection(&self) -> &BoundarySelection {
        &self.selection
    }

    pub fn results(&self) -> &ResultTable {
        &self.results
    }

    /// Preview of the latest successful fit, cleared by a failed one
    pub fn preview(&self) -> Option<&FitPreview> {
        self.preview.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&FitOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn journal(&self) -> &SessionJournal {
        &self.journal
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }
}

/// `samples` evenly spaced points over `[left, right]` inclusive
fn sample_fit(fit: &PeakFit, left: usize, right: usize, samples: usize) -> Vec<[f64; 2]> {
    let (lo, hi) = (left as f64, right as f64);
    match samples {
        0 => Vec::new(),
        1 => vec![[lo, fit.eval(lo)]],
        n => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    let x = if i == n - 1 { hi } else { lo + step * i as f64 };
                    [x, fit.eval(x)]
                })
                .collect()
        }
    }
}
