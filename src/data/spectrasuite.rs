/// SpectraSuite tab-separated spectrum reader
///
/// SpectraSuite exports look like:
///
/// ```text
/// SpectraSuite Data File
/// ++++++++++++++++++++++++++++++++++++
/// Date: ...
/// ...                                  (17 header lines in total)
/// >>>>>Begin Processed Spectral Data<<<<<
/// 339.232\t1043.11
/// 339.615\t1051.87
/// ...
/// >>>>>End Processed Spectral Data<<<<<
/// ```
///
/// Only the intensity column is kept. The pixel number of a sample is its row
/// index in the data section; the instrument's own wavelength column is
/// ignored because the calibration is applied separately.

use std::io;
use std::path::Path;

use thiserror::Error;

use super::spectrum::Spectrum;
use crate::config::LoaderConfig;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: no column {column}")]
    MissingColumn { line: usize, column: usize },
    #[error("line {line}: cannot parse intensity {value:?}")]
    InvalidValue { line: usize, value: String },
    #[error("no spectral data found after {header_lines} header lines")]
    Empty { header_lines: usize },
}

/// Read a SpectraSuite file from disk
pub fn read_spectrasuite_file(path: &Path, config: &LoaderConfig) -> Result<Spectrum, LoadError> {
    let content = std::fs::read_to_string(path)?;
    let spectrum = parse_spectrasuite(&content, path, config)?;
    log::info!(
        "Loaded {} samples from {}",
        spectrum.len(),
        path.display()
    );
    Ok(spectrum)
}

/// Parse SpectraSuite content
pub fn parse_spectrasuite(
    content: &str,
    source_path: &Path,
    config: &LoaderConfig,
) -> Result<Spectrum, LoadError> {
    let mut intensity = Vec::new();

    for (idx, line) in content.lines().enumerate().skip(config.header_lines) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if !config.footer_marker.is_empty() && trimmed.starts_with(&config.footer_marker) {
            break;
        }

        let field = trimmed
            .split_whitespace()
            .nth(config.intensity_column)
            .ok_or(LoadError::MissingColumn {
                line: line_no,
                column: config.intensity_column,
            })?;
        let value: f64 = field.parse().map_err(|_| LoadError::InvalidValue {
            line: line_no,
            value: field.to_string(),
        })?;
        intensity.push(value);
    }

    if intensity.is_empty() {
        return Err(LoadError::Empty {
            header_lines: config.header_lines,
        });
    }

    Ok(Spectrum::new(source_path.to_path_buf(), intensity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn spectrasuite_text(rows: &[(f64, f64)]) -> String {
        let mut out = String::from("SpectraSuite Data File\n");
        out.push_str("++++++++++++++++++++++++++++++++++++\n");
        // pad to 16 lines so the begin marker is line 17
        for i in 2..16 {
            out.push_str(&format!("Header field {}: value\n", i));
        }
        out.push_str(">>>>>Begin Processed Spectral Data<<<<<\n");
        for (wl, i) in rows {
            out.push_str(&format!("{}\t{}\n", wl, i));
        }
        out.push_str(">>>>>End Processed Spectral Data<<<<<\n");
        out
    }

    #[test]
    fn test_parse_default_layout() {
        let text = spectrasuite_text(&[(339.2, 1043.1), (339.6, 1051.9), (340.0, 1200.0)]);
        let s = parse_spectrasuite(&text, Path::new("a.txt"), &LoaderConfig::default()).unwrap();
        assert_eq!(s.intensity, vec![1043.1, 1051.9, 1200.0]);
        assert_eq!(s.source_path, Path::new("a.txt"));
    }

    #[test]
    fn test_headerless_two_column_file() {
        let config = LoaderConfig {
            header_lines: 0,
            ..Default::default()
        };
        let s = parse_spectrasuite("0 1.5\n1 2.5\n2 3.5\n", Path::new("b.txt"), &config).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.at(2), Some(3.5));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let config = LoaderConfig {
            header_lines: 1,
            ..Default::default()
        };
        let err = parse_spectrasuite("header\n1 2\n2 abc\n", Path::new("c.txt"), &config).unwrap_err();
        match err {
            LoadError::InvalidValue { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let config = LoaderConfig {
            header_lines: 0,
            ..Default::default()
        };
        let err = parse_spectrasuite("1 2\n3\n", Path::new("d.txt"), &config).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { line: 2, column: 1 }));
    }

    #[test]
    fn test_empty_data_section() {
        let text = spectrasuite_text(&[]);
        let err = parse_spectrasuite(&text, Path::new("e.txt"), &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Empty { header_lines: 17 }));
    }

    #[test]
    fn test_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(spectrasuite_text(&[(1.0, 10.0), (2.0, 20.0)]).as_bytes())
            .unwrap();
        let s = read_spectrasuite_file(file.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(s.intensity, vec![10.0, 20.0]);
    }
}
