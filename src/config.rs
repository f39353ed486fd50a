/// Session configuration
///
/// Loaded from an optional JSON file. Every field has a default so a config
/// file only needs the values it changes, e.g.
///
/// ```json
/// { "detection": { "min_height": 1500.0 }, "fit": { "profile": "gaussian" } }
/// ```

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::calibration::PolynomialCalibration;
use crate::fitting::model::PeakProfile;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Lines skipped before the data section
    pub header_lines: usize,
    /// Whitespace-separated column holding intensity (0-based)
    pub intensity_column: usize,
    /// Data ends at the first line starting with this marker
    pub footer_marker: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            header_lines: 17,
            intensity_column: 1,
            footer_marker: ">>>>>".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum intensity for a local maximum to count as a peak
    pub min_height: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { min_height: 1090.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Selections this wide or wider are never fitted
    pub max_width: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { max_width: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Pixels shown either side of the peak under review
    pub half_window: usize,
    /// Intensity padding above and below the review window
    pub intensity_padding: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            half_window: 20,
            intensity_padding: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub profile: PeakProfile,
    /// Starting width for every fit
    pub initial_sigma: f64,
    pub max_iterations: usize,
    /// Relative change in chi-square below which the fit has converged
    pub ftol: f64,
    /// Relative parameter step below which the fit has converged
    pub xtol: f64,
    /// Points in the fitted-curve preview
    pub preview_samples: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            profile: PeakProfile::Voigt,
            initial_sigma: 1.0,
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            preview_samples: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub loader: LoaderConfig,
    pub detection: DetectionConfig,
    pub selection: SelectionConfig,
    pub display: DisplayConfig,
    pub fit: FitConfig,
    pub calibration: PolynomialCalibration,
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}

/// Read any JSON-backed settings file
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}
