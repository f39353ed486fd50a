/// Levenberg–Marquardt least squares
///
/// Minimises Σ (model(p, xᵢ) − yᵢ)² with a forward-difference Jacobian and
/// Marquardt's diagonal damping. Parameter uncertainties come from the
/// covariance `(JᵀJ)⁻¹ · χ²/(n − m)` at the solution.

use nalgebra::{DMatrix, DVector};

use super::FitError;

/// Solver tolerances
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub ftol: f64,
    pub xtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
        }
    }
}

/// Converged solver state
#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: Vec<f64>,
    /// `None` when JᵀJ is singular at the solution
    pub covariance: Option<DMatrix<f64>>,
    pub chisqr: f64,
    pub iterations: usize,
    pub nfev: usize,
}

impl LmSolution {
    /// One-sigma uncertainty per parameter, NaN when unavailable
    pub fn stderr(&self) -> Vec<f64> {
        match &self.covariance {
            Some(cov) => (0..self.params.len())
                .map(|i| {
                    let var = cov[(i, i)];
                    if var >= 0.0 {
                        var.sqrt()
                    } else {
                        f64::NAN
                    }
                })
                .collect(),
            None => vec![f64::NAN; self.params.len()],
        }
    }
}

const MIN_LAMBDA: f64 = 1e-12;
const MAX_LAMBDA: f64 = 1e16;
const DIFF_STEP: f64 = 1.490_116_119_384_765_6e-8; // sqrt(f64::EPSILON)

struct Problem<'a, F> {
    model: F,
    x: &'a [f64],
    y: &'a [f64],
    nfev: usize,
}

impl<'a, F: Fn(&[f64], f64) -> f64> Problem<'a, F> {
    fn residuals(&mut self, p: &[f64]) -> DVector<f64> {
        self.nfev += 1;
        DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y.iter())
                .map(|(&xi, &yi)| (self.model)(p, xi) - yi),
        )
    }

    fn jacobian(&mut self, p: &[f64], r: &DVector<f64>) -> DMatrix<f64> {
        let n = self.x.len();
        let m = p.len();
        let mut jac = DMatrix::zeros(n, m);
        let mut shifted = p.to_vec();
        for j in 0..m {
            let h = if p[j] == 0.0 {
                DIFF_STEP
            } else {
                DIFF_STEP * p[j].abs()
            };
            shifted[j] = p[j] + h;
            let r_h = self.residuals(&shifted);
            for i in 0..n {
                jac[(i, j)] = (r_h[i] - r[i]) / h;
            }
            shifted[j] = p[j];
        }
        jac
    }
}

fn is_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Fit `model(params, x)` to `(x, y)` starting from `initial`
pub fn levenberg_marquardt<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    options: &LmOptions,
) -> Result<LmSolution, FitError>
where
    F: Fn(&[f64], f64) -> f64,
{
    let n = x.len();
    let m = initial.len();
    if n != y.len() {
        return Err(FitError::LengthMismatch { x: n, y: y.len() });
    }
    if n <= m {
        return Err(FitError::Degenerate {
            samples: n,
            parameters: m,
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let mut problem = Problem {
        model,
        x,
        y,
        nfev: 0,
    };

    let mut params = initial.to_vec();
    let mut r = problem.residuals(&params);
    if !is_finite(&r) {
        return Err(FitError::NonFinite);
    }
    let mut chisqr = r.norm_squared();
    let mut lambda = 1e-3;
    let mut converged = chisqr == 0.0;
    let mut iterations = 0;

    while !converged && iterations < options.max_iterations {
        iterations += 1;

        let jac = problem.jacobian(&params, &r);
        if !jac.iter().all(|v| v.is_finite()) {
            return Err(FitError::NonFinite);
        }
        let jtj = jac.transpose() * &jac;
        let descent = -(jac.transpose() * &r);

        loop {
            let mut damped = jtj.clone();
            for k in 0..m {
                damped[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
            }
            let step = match damped.clone().cholesky() {
                Some(chol) => Some(chol.solve(&descent)),
                None => damped.lu().solve(&descent),
            };

            let accepted = step.and_then(|step| {
                let trial: Vec<f64> = params.iter().zip(step.iter()).map(|(p, d)| p + d).collect();
                let r_trial = problem.residuals(&trial);
                let chisqr_trial = r_trial.norm_squared();
                (is_finite(&r_trial) && chisqr_trial <= chisqr)
                    .then_some((trial, r_trial, chisqr_trial, step))
            });

            match accepted {
                Some((trial, r_trial, chisqr_trial, step)) => {
                    let f_change = if chisqr > 0.0 {
                        (chisqr - chisqr_trial) / chisqr
                    } else {
                        0.0
                    };
                    let x_change = step
                        .iter()
                        .zip(params.iter())
                        .map(|(d, p)| d.abs() / (p.abs() + options.xtol))
                        .fold(0.0, f64::max);

                    params = trial;
                    r = r_trial;
                    chisqr = chisqr_trial;
                    lambda = (lambda / 10.0).max(MIN_LAMBDA);

                    if f_change <= options.ftol || x_change <= options.xtol || chisqr == 0.0 {
                        converged = true;
                    }
                    break;
                }
                None => {
                    lambda *= 10.0;
                    if lambda > MAX_LAMBDA {
                        // No downhill step left at any damping: local minimum
                        converged = true;
                        break;
                    }
                }
            }
        }
    }

    if !converged {
        return Err(FitError::NoConvergence {
            iterations,
            chisqr,
        });
    }

    let jac = problem.jacobian(&params, &r);
    let dof = (n - m) as f64;
    let covariance = (jac.transpose() * &jac)
        .try_inverse()
        .filter(|cov| cov.iter().all(|v| v.is_finite()))
        .map(|cov| cov * (chisqr / dof));

    log::debug!(
        "LM finished after {} iterations ({} evaluations), chi-square {:.4e}",
        iterations,
        problem.nfev,
        chisqr
    );

    Ok(LmSolution {
        params,
        covariance,
        chisqr,
        iterations,
        nfev: problem.nfev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(p: &[f64], x: f64) -> f64 {
        p[0] + p[1] * x
    }

    #[test]
    fn test_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 3.0 - 0.5 * xi).collect();
        let sol = levenberg_marquardt(line, &x, &y, &[0.0, 1.0], &LmOptions::default()).unwrap();
        assert_relative_eq!(sol.params[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(sol.params[1], -0.5, epsilon = 1e-6);
        assert!(sol.chisqr < 1e-12);
    }

    #[test]
    fn test_stderr_matches_linear_regression() {
        // y = 1 + 2x with alternating ±0.1 noise
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| 1.0 + 2.0 * xi + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let sol = levenberg_marquardt(line, &x, &y, &[0.0, 0.0], &LmOptions::default()).unwrap();

        // Closed form ordinary least squares
        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
        let s2 = sol.chisqr / (n - 2.0);
        let se_slope = (s2 / sxx).sqrt();
        let se_intercept = (s2 * (1.0 / n + mean_x * mean_x / sxx)).sqrt();

        let err = sol.stderr();
        assert_relative_eq!(err[1], se_slope, max_relative = 1e-4);
        assert_relative_eq!(err[0], se_intercept, max_relative = 1e-4);
    }

    #[test]
    fn test_exponential_decay() {
        let model = |p: &[f64], x: f64| p[0] * (-x / p[1]).exp();
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 12.0 * (-xi / 3.5).exp()).collect();
        let sol = levenberg_marquardt(model, &x, &y, &[5.0, 1.0], &LmOptions::default()).unwrap();
        assert_relative_eq!(sol.params[0], 12.0, max_relative = 1e-6);
        assert_relative_eq!(sol.params[1], 3.5, max_relative = 1e-6);
    }

    #[test]
    fn test_too_few_points() {
        let err = levenberg_marquardt(line, &[1.0], &[2.0], &[0.0, 0.0], &LmOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FitError::Degenerate {
                samples: 1,
                parameters: 2
            }
        ));
    }

    #[test]
    fn test_non_finite_start() {
        let model = |p: &[f64], x: f64| p[0] / (x - p[1]);
        let err = levenberg_marquardt(model, &[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], &[1.0, 1.0], &LmOptions::default())
            .unwrap_err();
        assert!(matches!(err, FitError::NonFinite));
    }

    #[test]
    fn test_length_mismatch() {
        let err = levenberg_marquardt(line, &[1.0, 2.0, 3.0], &[2.0], &[0.0, 0.0], &LmOptions::default())
            .unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { x: 3, y: 1 }));
    }

    #[test]
    fn test_iteration_cap() {
        let options = LmOptions {
            max_iterations: 1,
            ftol: 0.0,
            xtol: 0.0,
        };
        let model = |p: &[f64], x: f64| p[0] * (-x / p[1]).exp();
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 12.0 * (-xi / 3.5).exp() + 0.01 * (xi * 7.0).sin()).collect();
        let err = levenberg_marquardt(model, &x, &y, &[5.0, 1.0], &options).unwrap_err();
        assert!(matches!(err, FitError::NoConvergence { iterations: 1, .. }));
    }
}
