use super::model::NUM_PARAMS;
use super::{Estimate, PeakFit};

/// Human-readable fit summary in the familiar `[[Section]]` layout
pub fn fit_report(fit: &PeakFit) -> String {
    let mut out = String::new();
    out.push_str("[[Model]]\n");
    out.push_str(&format!("    {}\n", fit.profile.model_name()));
    out.push_str("[[Fit Statistics]]\n");
    out.push_str("    # fitting method   = leastsq\n");
    out.push_str(&format!("    # function evals   = {}\n", fit.nfev));
    out.push_str(&format!("    # data points      = {}\n", fit.ndata));
    out.push_str(&format!("    # variables        = {}\n", NUM_PARAMS));
    out.push_str(&format!("    chi-square         = {:.8}\n", fit.chisqr));
    out.push_str(&format!("    reduced chi-square = {:.8}\n", fit.reduced_chisqr()));
    out.push_str("[[Variables]]\n");
    out.push_str(&variable_line("c", &fit.background, fit.guess.background));
    out.push_str(&variable_line("amplitude", &fit.amplitude, fit.guess.amplitude));
    out.push_str(&variable_line("center", &fit.center, fit.guess.center));
    out.push_str(&variable_line("sigma", &fit.sigma, fit.guess.sigma));
    out.push_str(&format!("    fwhm:       {:.8} (derived)\n", fit.fwhm()));
    out
}

fn variable_line(name: &str, estimate: &Estimate, init: f64) -> String {
    let label = format!("{}:", name);
    if estimate.stderr.is_finite() {
        let percent = if estimate.value != 0.0 {
            (estimate.stderr / estimate.value * 100.0).abs()
        } else {
            f64::INFINITY
        };
        format!(
            "    {:<11} {:.8} +/- {:.8} ({:.2}%) (init = {})\n",
            label, estimate.value, estimate.stderr, percent, init
        )
    } else {
        format!(
            "    {:<11} {:.8} +/- (not estimated) (init = {})\n",
            label, estimate.value, init
        )
    }
}
