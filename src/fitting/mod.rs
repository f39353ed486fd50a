/// Peak fitting: line shapes, the least-squares solver, and the
/// `CurveFitter` seam the fit session calls through.

pub mod levenberg;
pub mod model;
pub mod report;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FitConfig;
use levenberg::{levenberg_marquardt, LmOptions};
use model::{PeakProfile, AMPLITUDE, BACKGROUND, CENTER, NUM_PARAMS, SIGMA};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("{samples} samples cannot determine {parameters} parameters")]
    Degenerate { samples: usize, parameters: usize },
    #[error("x has {x} values but y has {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("model produced non-finite values")]
    NonFinite,
    #[error("no convergence after {iterations} iterations (chi-square {chisqr:.4e})")]
    NoConvergence { iterations: usize, chisqr: f64 },
}

/// A fitted value with its one-sigma standard error (NaN when unknown)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub value: f64,
    pub stderr: f64,
}

impl Estimate {
    pub fn new(value: f64, stderr: f64) -> Self {
        Self { value, stderr }
    }
}

/// Starting point for a fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakGuess {
    pub center: f64,
    pub amplitude: f64,
    pub sigma: f64,
    pub background: f64,
}

impl PeakGuess {
    fn to_params(self) -> [f64; NUM_PARAMS] {
        let mut p = [0.0; NUM_PARAMS];
        p[CENTER] = self.center;
        p[AMPLITUDE] = self.amplitude;
        p[SIGMA] = self.sigma;
        p[BACKGROUND] = self.background;
        p
    }
}

/// Result of fitting `background + profile` to one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakFit {
    pub profile: PeakProfile,
    pub center: Estimate,
    pub amplitude: Estimate,
    pub sigma: Estimate,
    pub background: Estimate,
    pub guess: PeakGuess,
    pub chisqr: f64,
    pub ndata: usize,
    pub iterations: usize,
    pub nfev: usize,
}

impl PeakFit {
    /// Evaluate the fitted model
    pub fn eval(&self, x: f64) -> f64 {
        self.background.value
            + self
                .profile
                .eval(x, self.center.value, self.amplitude.value, self.sigma.value)
    }

    pub fn reduced_chisqr(&self) -> f64 {
        self.chisqr / (self.ndata as f64 - NUM_PARAMS as f64)
    }

    pub fn fwhm(&self) -> f64 {
        self.profile.fwhm(self.sigma.value)
    }
}

/// The fitting capability the session depends on
pub trait CurveFitter {
    fn fit(&self, x: &[f64], y: &[f64], guess: &PeakGuess) -> Result<PeakFit, FitError>;
}

/// Levenberg–Marquardt fit of a constant plus one peak profile
#[derive(Debug, Clone)]
pub struct LmPeakFitter {
    pub profile: PeakProfile,
    pub options: LmOptions,
}

impl LmPeakFitter {
    pub fn new(profile: PeakProfile) -> Self {
        Self {
            profile,
            options: LmOptions::default(),
        }
    }

    pub fn from_config(config: &FitConfig) -> Self {
        Self {
            profile: config.profile,
            options: LmOptions {
                max_iterations: config.max_iterations,
                ftol: config.ftol,
                xtol: config.xtol,
            },
        }
    }
}

impl CurveFitter for LmPeakFitter {
    fn fit(&self, x: &[f64], y: &[f64], guess: &PeakGuess) -> Result<PeakFit, FitError> {
        let profile = self.profile;
        let solution = levenberg_marquardt(
            |p: &[f64], xi: f64| profile.eval_model(p, xi),
            x,
            y,
            &guess.to_params(),
            &self.options,
        )?;
        let err = solution.stderr();
        let p = &solution.params;

        Ok(PeakFit {
            profile,
            center: Estimate::new(p[CENTER], err[CENTER]),
            amplitude: Estimate::new(p[AMPLITUDE], err[AMPLITUDE]),
            // The model only sees |sigma|
            sigma: Estimate::new(p[SIGMA].abs(), err[SIGMA]),
            background: Estimate::new(p[BACKGROUND], err[BACKGROUND]),
            guess: *guess,
            chisqr: solution.chisqr,
            ndata: x.len(),
            iterations: solution.iterations,
            nfev: solution.nfev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthetic(profile: PeakProfile, truth: &PeakGuess, lo: usize, hi: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (lo..hi).map(|p| p as f64).collect();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                // small deterministic ripple so the covariance is well defined
                let ripple = if i % 2 == 0 { 0.3 } else { -0.3 };
                truth.background + profile.eval(xi, truth.center, truth.amplitude, truth.sigma) + ripple
            })
            .collect();
        (x, y)
    }

    fn truth() -> PeakGuess {
        PeakGuess {
            center: 100.3,
            amplitude: 1800.0,
            sigma: 1.7,
            background: 52.0,
        }
    }

    fn start() -> PeakGuess {
        PeakGuess {
            center: 100.0,
            amplitude: 500.0,
            sigma: 1.0,
            background: 50.0,
        }
    }

    #[test]
    fn test_recovers_each_profile() {
        for profile in [PeakProfile::Gaussian, PeakProfile::Lorentzian, PeakProfile::Voigt] {
            let t = truth();
            let (x, y) = synthetic(profile, &t, 90, 112);
            let fit = LmPeakFitter::new(profile).fit(&x, &y, &start()).unwrap();
            assert_relative_eq!(fit.center.value, t.center, epsilon = 0.01);
            assert_relative_eq!(fit.amplitude.value, t.amplitude, max_relative = 0.01);
            assert_relative_eq!(fit.sigma.value, t.sigma, max_relative = 0.01);
            assert_relative_eq!(fit.background.value, t.background, epsilon = 1.0);
            for e in [fit.center, fit.amplitude, fit.sigma, fit.background] {
                assert!(e.stderr.is_finite() && e.stderr > 0.0, "{profile}: {e:?}");
            }
            assert_eq!(fit.ndata, 22);
            assert_eq!(fit.guess, start());
        }
    }

    #[test]
    fn test_eval_reproduces_model() {
        let t = truth();
        let (x, y) = synthetic(PeakProfile::Gaussian, &t, 90, 112);
        let fit = LmPeakFitter::new(PeakProfile::Gaussian).fit(&x, &y, &start()).unwrap();
        let at_center = fit.eval(fit.center.value);
        let expected = t.background + PeakProfile::Gaussian.eval(t.center, t.center, t.amplitude, t.sigma);
        assert_relative_eq!(at_center, expected, max_relative = 0.01);
        assert!(fit.reduced_chisqr() < 1.0);
    }

    #[test]
    fn test_single_sample_is_degenerate() {
        let fit = LmPeakFitter::new(PeakProfile::Voigt).fit(&[100.0], &[500.0], &start());
        assert_eq!(
            fit.unwrap_err(),
            FitError::Degenerate {
                samples: 1,
                parameters: 4
            }
        );
    }

    #[test]
    fn test_from_config() {
        let config = FitConfig {
            profile: PeakProfile::Lorentzian,
            max_iterations: 17,
            ..Default::default()
        };
        let fitter = LmPeakFitter::from_config(&config);
        assert_eq!(fitter.profile, PeakProfile::Lorentzian);
        assert_eq!(fitter.options.max_iterations, 17);
    }
}
