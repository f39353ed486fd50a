/// Pixel → wavelength calibration
///
/// The calibration is a polynomial in pixel number, fitted elsewhere against
/// reference lamp lines. Coefficients are stored in ascending order:
/// `λ(p) = c0 + c1·p + c2·p² + …` (nm).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("no calibration coefficients configured")]
    NotConfigured,
    #[error("pixel {pixel:.3} outside calibrated range [{lo}, {hi}]")]
    OutOfDomain { pixel: f64, lo: f64, hi: f64 },
}

/// Anything that can turn a (fractional) pixel position into a wavelength
pub trait Calibration {
    fn wavelength_nm(&self, pixel: f64) -> Result<f64, CalibrationError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialCalibration {
    pub coefficients: Vec<f64>,
    /// Pixel range the polynomial was fitted over; unrestricted when absent
    pub domain: Option<(f64, f64)>,
}

impl PolynomialCalibration {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self {
            coefficients,
            domain: None,
        }
    }

    pub fn with_domain(mut self, lo: f64, hi: f64) -> Self {
        self.domain = Some((lo.min(hi), lo.max(hi)));
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.coefficients.is_empty()
    }

    /// Horner evaluation without domain checks
    pub fn eval(&self, pixel: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * pixel + c)
    }
}

impl Calibration for PolynomialCalibration {
    fn wavelength_nm(&self, pixel: f64) -> Result<f64, CalibrationError> {
        if self.coefficients.is_empty() {
            return Err(CalibrationError::NotConfigured);
        }
        if let Some((lo, hi)) = self.domain {
            if !(pixel >= lo && pixel <= hi) {
                return Err(CalibrationError::OutOfDomain { pixel, lo, hi });
            }
        }
        Ok(self.eval(pixel))
    }
}
