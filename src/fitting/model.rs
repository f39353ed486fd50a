/// Peak line shapes
///
/// Every shape is area-normalised: `amplitude` is the integrated area under
/// the peak, `center` its position and `sigma` its width parameter. The full
/// model is `background + profile(x)`.

use std::f64::consts::{PI, SQRT_2};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

const SQRT_2PI: f64 = 2.506_628_274_631_000_2;
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;

/// Indices into the parameter vector handed to the solver
pub const CENTER: usize = 0;
pub const AMPLITUDE: usize = 1;
pub const SIGMA: usize = 2;
pub const BACKGROUND: usize = 3;
pub const NUM_PARAMS: usize = 4;

/// Symmetric peak profiles available for fitting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PeakProfile {
    /// Gaussian ⊗ Lorentzian with the Lorentzian half-width tied to sigma
    #[default]
    Voigt,
    Gaussian,
    Lorentzian,
}

impl std::fmt::Display for PeakProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeakProfile::Voigt => write!(f, "voigt"),
            PeakProfile::Gaussian => write!(f, "gaussian"),
            PeakProfile::Lorentzian => write!(f, "lorentzian"),
        }
    }
}

impl PeakProfile {
    /// Peak value at `x` without background. A negative sigma is treated as
    /// its magnitude so the solver can step through zero.
    pub fn eval(&self, x: f64, center: f64, amplitude: f64, sigma: f64) -> f64 {
        let sigma = sigma.abs();
        let dx = x - center;
        match self {
            PeakProfile::Gaussian => {
                amplitude / (sigma * SQRT_2PI) * (-dx * dx / (2.0 * sigma * sigma)).exp()
            }
            PeakProfile::Lorentzian => amplitude / PI * sigma / (dx * dx + sigma * sigma),
            PeakProfile::Voigt => {
                let gamma = sigma;
                let z = Complex64::new(dx, gamma) / (sigma * SQRT_2);
                amplitude * faddeeva(z).re / (sigma * SQRT_2PI)
            }
        }
    }

    /// Full model: background plus peak, parameters ordered as the
    /// `CENTER`/`AMPLITUDE`/`SIGMA`/`BACKGROUND` constants
    pub fn eval_model(&self, params: &[f64], x: f64) -> f64 {
        params[BACKGROUND] + self.eval(x, params[CENTER], params[AMPLITUDE], params[SIGMA])
    }

    /// Full width at half maximum for a given sigma
    pub fn fwhm(&self, sigma: f64) -> f64 {
        let sigma = sigma.abs();
        match self {
            PeakProfile::Gaussian => FWHM_PER_SIGMA * sigma,
            PeakProfile::Lorentzian => 2.0 * sigma,
            PeakProfile::Voigt => {
                // Olivero & Longbothum approximation
                let fl = 2.0 * sigma;
                let fg = FWHM_PER_SIGMA * sigma;
                0.5346 * fl + (0.2166 * fl * fl + fg * fg).sqrt()
            }
        }
    }

    /// Description used in fit reports
    pub fn model_name(&self) -> String {
        format!("(Model(constant) + Model({}))", self)
    }
}

/// Faddeeva function w(z) = exp(-z²)·erfc(-iz) for Im(z) ≥ 0.
///
/// Humlíček's W4 rational approximation, relative accuracy about 1e-4.
pub fn faddeeva(z: Complex64) -> Complex64 {
    let x = z.re;
    let y = z.im;
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        t * 0.564_189_6 / (t * t + 0.5)
    } else if s >= 5.5 {
        let u = t * t;
        t * (u * 0.564_189_6 + 1.410_474) / (u * (u + 3.0) + 0.75)
    } else if y >= 0.195 * x.abs() - 0.176 {
        let num = t * (t * (t * (t * 0.564_223_6 + 3.778_987) + 11.964_82) + 20.209_33) + 16.4955;
        let den = t * (t * (t * (t * (t + 6.699_398) + 21.692_74) + 39.271_21) + 38.823_63)
            + 16.4955;
        num / den
    } else {
        let u = t * t;
        let mut num = Complex64::new(0.564_19, 0.0);
        for c in [1.320_522, 35.766_83, 219.031_3, 1540.787, 3321.9905, 36183.31] {
            num = -(u * num) + c;
        }
        let mut den = Complex64::new(1.0, 0.0);
        for c in [1.841_439, 61.570_37, 364.219_1, 2186.181, 9022.228, 24322.84, 32066.6] {
            den = -(u * den) + c;
        }
        u.exp() - t * num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn integrate(profile: PeakProfile, sigma: f64) -> f64 {
        // Trapezoid over ±400 sigma-ish, fine grid
        let step = 0.01;
        let half = 400.0;
        let n = (2.0 * half / step) as usize;
        (0..=n)
            .map(|i| {
                let x = -half + i as f64 * step;
                let w = if i == 0 || i == n { 0.5 } else { 1.0 };
                w * profile.eval(x, 0.0, 3.0, sigma)
            })
            .sum::<f64>()
            * step
    }

    #[test]
    fn test_faddeeva_on_imaginary_axis() {
        // w(iy) = erfcx(y)
        let w = faddeeva(Complex64::new(0.0, 1.0 / SQRT_2));
        assert_relative_eq!(w.re, 0.523_156, max_relative = 1e-3);
        assert!(w.im.abs() < 1e-9);
        let far = faddeeva(Complex64::new(0.0, 20.0));
        assert_relative_eq!(far.re, 0.028_174_7, max_relative = 1e-3);
    }

    #[test]
    fn test_faddeeva_symmetry_in_real_part() {
        for &x in &[0.3, 2.0, 4.6, 5.0, 9.0, 20.0] {
            let a = faddeeva(Complex64::new(x, 0.7));
            let b = faddeeva(Complex64::new(-x, 0.7));
            assert_relative_eq!(a.re, b.re, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_profiles_are_area_normalised() {
        assert_relative_eq!(integrate(PeakProfile::Gaussian, 1.5), 3.0, max_relative = 1e-6);
        // Lorentzian and Voigt tails are heavy; ±400 keeps ~99.8 % of the area
        assert_relative_eq!(integrate(PeakProfile::Lorentzian, 1.5), 3.0, max_relative = 5e-3);
        assert_relative_eq!(integrate(PeakProfile::Voigt, 1.5), 3.0, max_relative = 5e-3);
    }

    #[test]
    fn test_profiles_peak_at_center_and_are_symmetric() {
        for profile in [PeakProfile::Voigt, PeakProfile::Gaussian, PeakProfile::Lorentzian] {
            let top = profile.eval(10.0, 10.0, 1.0, 2.0);
            assert!(top > profile.eval(10.5, 10.0, 1.0, 2.0));
            assert_relative_eq!(
                profile.eval(7.0, 10.0, 1.0, 2.0),
                profile.eval(13.0, 10.0, 1.0, 2.0),
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_negative_sigma_is_mirrored() {
        let p = PeakProfile::Gaussian;
        assert_eq!(p.eval(1.0, 0.0, 2.0, -1.0), p.eval(1.0, 0.0, 2.0, 1.0));
    }

    #[test]
    fn test_model_adds_background() {
        let params = [5.0, 2.0, 1.0, 40.0];
        let peak = PeakProfile::Lorentzian.eval(5.0, 5.0, 2.0, 1.0);
        assert_relative_eq!(PeakProfile::Lorentzian.eval_model(&params, 5.0), 40.0 + peak);
    }

    #[test]
    fn test_fwhm() {
        assert_relative_eq!(PeakProfile::Gaussian.fwhm(1.0), 2.354_82, max_relative = 1e-5);
        assert_relative_eq!(PeakProfile::Lorentzian.fwhm(1.0), 2.0);
        let v = PeakProfile::Voigt.fwhm(1.0);
        assert!(v > 2.354_82 && v < 4.4);
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(PeakProfile::Voigt.to_string(), "voigt");
        assert_eq!(PeakProfile::Gaussian.model_name(), "(Model(constant) + Model(gaussian))");
        let parsed: PeakProfile = serde_json::from_str("\"lorentzian\"").unwrap();
        assert_eq!(parsed, PeakProfile::Lorentzian);
    }
}
