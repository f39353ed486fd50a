use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A recorded spectrum: intensity per detector pixel.
///
/// Pixel indices are implicit: sample `i` belongs to pixel `i`, so the pixel
/// axis is always the dense range `0..len()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    pub source_path: PathBuf,
    pub intensity: Vec<f64>,
}

impl Spectrum {
    pub fn new(source_path: PathBuf, intensity: Vec<f64>) -> Self {
        Self {
            source_path,
            intensity,
        }
    }

    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// Intensity at a pixel, if the pixel exists
    pub fn at(&self, pixel: usize) -> Option<f64> {
        self.intensity.get(pixel).copied()
    }

    /// Half-open pixel range `[start, end)` clipped to the spectrum
    pub fn slice(&self, start: usize, end: usize) -> &[f64] {
        let end = end.min(self.intensity.len());
        let start = start.min(end);
        &self.intensity[start..end]
    }

    /// Minimum intensity over `[start, end)`, `None` for an empty range
    pub fn min_in(&self, start: usize, end: usize) -> Option<f64> {
        self.slice(start, end)
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
    }

    /// Nearest pixel to a (possibly fractional) x coordinate, `None` if the
    /// coordinate falls outside the spectrum by more than half a pixel
    pub fn nearest_pixel(&self, x: f64) -> Option<usize> {
        if self.intensity.is_empty() || !x.is_finite() {
            return None;
        }
        let rounded = x.round();
        if rounded < 0.0 || rounded >= self.intensity.len() as f64 {
            return None;
        }
        Some(rounded as usize)
    }

    /// File name used in titles and logs
    pub fn display_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "spectrum".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Spectrum {
        Spectrum::new(PathBuf::from("/data/run1.txt"), vec![5.0, 3.0, 9.0, 1.0, 4.0])
    }

    #[test]
    fn test_slice_is_clipped() {
        let s = sample();
        assert_eq!(s.slice(1, 3), &[3.0, 9.0]);
        assert_eq!(s.slice(3, 50), &[1.0, 4.0]);
        assert!(s.slice(7, 9).is_empty());
    }

    #[test]
    fn test_min_in_range() {
        let s = sample();
        assert_eq!(s.min_in(0, 3), Some(3.0));
        assert_eq!(s.min_in(0, 5), Some(1.0));
        assert_eq!(s.min_in(4, 4), None);
    }

    #[test]
    fn test_nearest_pixel_bounds() {
        let s = sample();
        assert_eq!(s.nearest_pixel(2.4), Some(2));
        assert_eq!(s.nearest_pixel(2.6), Some(3));
        assert_eq!(s.nearest_pixel(-0.4), Some(0));
        assert_eq!(s.nearest_pixel(-0.6), None);
        assert_eq!(s.nearest_pixel(4.49), Some(4));
        assert_eq!(s.nearest_pixel(4.6), None);
        assert_eq!(s.nearest_pixel(f64::NAN), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(sample().display_name(), "run1.txt");
        assert_eq!(Spectrum::default().display_name(), "spectrum");
    }
}
