#![allow(dead_code)]

mod app;
mod config;
mod data;
mod fitting;
mod gui;
mod log;
mod pipeline;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use app::{AppSetup, PeakFitApp};
use config::SessionConfig;
use data::calibration::PolynomialCalibration;
use data::spectrasuite::read_spectrasuite_file;
use fitting::model::PeakProfile;
use session::FitSession;

/// Review detected peaks one at a time, bound each with two clicks and fit it
#[derive(Parser, Debug)]
#[command(name = "spectral-peak-fitter", version, about)]
struct Cli {
    /// SpectraSuite spectrum to review
    spectrum: PathBuf,

    /// Where the fitted parameters are written when the window closes
    output: PathBuf,

    /// JSON session configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum peak height for detection
    #[arg(long, value_name = "H")]
    min_height: Option<f64>,

    /// JSON pixel→wavelength calibration
    #[arg(long, value_name = "FILE")]
    calibration: Option<PathBuf>,

    /// Peak shape fitted on top of the constant background
    #[arg(long, value_enum)]
    profile: Option<PeakProfile>,

    /// Also write the session journal here (.json for JSON, text otherwise)
    #[arg(long, value_name = "FILE")]
    journal: Option<PathBuf>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    fn session_config(&self) -> Result<SessionConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(path) = &self.calibration {
            config.calibration = config::read_json::<PolynomialCalibration>(path)?;
        }
        if let Some(h) = self.min_height {
            config.detection.min_height = h;
        }
        if let Some(profile) = self.profile {
            config.fit.profile = profile;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    ::log::info!(
        "Starting Spectral Peak Fitter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match cli.session_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if !config.calibration.is_configured() {
        ::log::warn!("No calibration configured; wavelengths will be NaN");
    }

    let spectrum = match read_spectrasuite_file(&cli.spectrum, &config.loader) {
        Ok(spectrum) => spectrum,
        Err(e) => {
            ::log::error!("Cannot load {}: {}", cli.spectrum.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let setup = AppSetup {
        session: FitSession::start(spectrum, &config),
        config,
        output_path: cli.output,
        journal_path: cli.journal,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Spectral Peak Fitter")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    match eframe::run_native(
        "Spectral Peak Fitter",
        options,
        Box::new(|cc| Ok(Box::new(PeakFitApp::new(cc, setup)))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("Window error: {}", e);
            ExitCode::FAILURE
        }
    }
}
