/// Per-peak fit results and their export table
///
/// One slot per detected peak. A slot is empty until that peak is fitted
/// successfully and is replaced wholesale by every later fit of the same
/// peak.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fitting::{Estimate, PeakFit};

/// Column names of the exported table, in column order
pub const EXPORT_HEADER: &str =
    "center center_stderr amplitude amplitude_stderr sigma sigma_stderr c c_stderr wavelength_nm";
pub const EXPORT_COLUMNS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPeakRow {
    pub center: Estimate,
    pub amplitude: Estimate,
    pub sigma: Estimate,
    pub background: Estimate,
    /// NaN when the calibration could not be evaluated at `center`
    pub wavelength_nm: f64,
}

impl FittedPeakRow {
    pub fn from_fit(fit: &PeakFit, wavelength_nm: f64) -> Self {
        Self {
            center: fit.center,
            amplitude: fit.amplitude,
            sigma: fit.sigma,
            background: fit.background,
            wavelength_nm,
        }
    }

    /// Values in `EXPORT_HEADER` order
    pub fn to_columns(&self) -> [f64; EXPORT_COLUMNS] {
        [
            self.center.value,
            self.center.stderr,
            self.amplitude.value,
            self.amplitude.stderr,
            self.sigma.value,
            self.sigma.stderr,
            self.background.value,
            self.background.stderr,
            self.wavelength_nm,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<Option<FittedPeakRow>>,
}

impl ResultTable {
    /// Empty table with one slot per detected peak
    pub fn new(peak_count: usize) -> Self {
        Self {
            rows: vec![None; peak_count],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, peak: usize) -> Option<&FittedPeakRow> {
        self.rows.get(peak).and_then(|r| r.as_ref())
    }

    /// Replace the row for `peak`, returning what was there before
    pub fn store(&mut self, peak: usize, row: FittedPeakRow) -> Option<FittedPeakRow> {
        self.rows[peak].replace(row)
    }

    pub fn fitted_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    /// `(peak index, row)` for every fitted peak, in peak order
    pub fn fitted(&self) -> impl Iterator<Item = (usize, &FittedPeakRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|row| (i, row)))
    }

    /// Fitted rows only, in peak order
    pub fn export(&self) -> ExportTable {
        let (peak_indices, rows) = self.fitted().map(|(i, row)| (i, row.to_columns())).unzip();
        ExportTable { peak_indices, rows }
    }
}

/// Flat table written at the end of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    /// Detected-peak index each row came from
    pub peak_indices: Vec<usize>,
    pub rows: Vec<[f64; EXPORT_COLUMNS]>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header comment line followed by one space-separated line per row
    pub fn to_text(&self) -> String {
        let mut out = format!("# {}\n", EXPORT_HEADER);
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|&v| format_scientific(v)).collect();
            out.push_str(&fields.join(" "));
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }
}

/// `%.18e` formatting: 18 fractional digits, signed exponent of at least two
/// digits, `nan`/`inf` for non-finite values
fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{:.18e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(center: f64) -> FittedPeakRow {
        FittedPeakRow {
            center: Estimate::new(center, 0.01),
            amplitude: Estimate::new(1800.0, 12.0),
            sigma: Estimate::new(1.5, 0.02),
            background: Estimate::new(50.0, 0.5),
            wavelength_nm: 404.656,
        }
    }

    #[test]
    fn test_new_table_is_unfitted() {
        let table = ResultTable::new(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.fitted_count(), 0);
        assert!(table.export().is_empty());
    }

    #[test]
    fn test_store_overwrites_single_row() {
        let mut table = ResultTable::new(3);
        assert_eq!(table.store(1, row(100.0)), None);
        assert_eq!(table.store(1, row(101.0)), Some(row(100.0)));
        assert_eq!(table.get(1), Some(&row(101.0)));
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(2), None);
        assert_eq!(table.get(7), None);
        assert_eq!(table.fitted_count(), 1);
    }

    #[test]
    fn test_all_zero_fit_is_still_exported() {
        let mut table = ResultTable::new(2);
        let zero = FittedPeakRow {
            center: Estimate::new(0.0, 0.0),
            amplitude: Estimate::new(0.0, 0.0),
            sigma: Estimate::new(0.0, 0.0),
            background: Estimate::new(0.0, 0.0),
            wavelength_nm: 0.0,
        };
        table.store(0, zero);
        assert_eq!(table.export().rows, vec![[0.0; EXPORT_COLUMNS]]);
    }

    #[test]
    fn test_export_keeps_peak_order() {
        let mut table = ResultTable::new(4);
        table.store(3, row(300.0));
        table.store(0, row(10.0));
        let export = table.export();
        assert_eq!(export.peak_indices, vec![0, 3]);
        assert_eq!(export.rows[0][0], 10.0);
        assert_eq!(export.rows[1][0], 300.0);
        assert_eq!(export.rows[1][8], 404.656);
    }

    #[test]
    fn test_export_is_repeatable() {
        let mut table = ResultTable::new(2);
        table.store(1, row(55.5));
        assert_eq!(table.export(), table.export());
        assert_eq!(table.export().to_text(), table.export().to_text());
    }

    #[test]
    fn test_scientific_format() {
        assert_eq!(format_scientific(100.0), "1.000000000000000000e+02");
        assert_eq!(format_scientific(-0.015625), "-1.562500000000000000e-02");
        assert_eq!(format_scientific(-0.015), "-1.499999999999999944e-02");
        assert_eq!(format_scientific(0.0), "0.000000000000000000e+00");
        assert_eq!(format_scientific(1.5e123), "1.500000000000000000e+123");
        assert_eq!(format_scientific(f64::NAN), "nan");
        assert_eq!(format_scientific(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_text_layout() {
        let mut table = ResultTable::new(1);
        let mut r = row(100.0);
        r.wavelength_nm = f64::NAN;
        table.store(0, r);
        let text = table.export().to_text();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("# center center_stderr amplitude amplitude_stderr sigma sigma_stderr c c_stderr wavelength_nm")
        );
        let fields: Vec<&str> = lines.next().unwrap().split(' ').collect();
        assert_eq!(fields.len(), EXPORT_COLUMNS);
        assert_eq!(fields[0], "1.000000000000000000e+02");
        assert_eq!(fields[8], "nan");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitted.txt");
        let mut table = ResultTable::new(1);
        table.store(0, row(100.0));
        table.export().save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# center"));
        assert_eq!(written.lines().count(), 2);
    }
}
