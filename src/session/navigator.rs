/// Peak navigator: which detected peak is under review
///
/// The review position starts "before the first peak" so that the first
/// step in either direction lands on peak 0. After that it is clamped to the
/// peak list and never wraps.

use serde::{Deserialize, Serialize};

use crate::config::DisplayConfig;
use crate::data::spectrum::Spectrum;

#[derive(Debug, Clone, Default)]
pub struct PeakNavigator {
    peaks: Vec<usize>,
    current: Option<usize>,
}

impl PeakNavigator {
    /// `peaks` are detected peak pixels in ascending order
    pub fn new(peaks: Vec<usize>) -> Self {
        Self {
            peaks,
            current: None,
        }
    }

    pub fn peaks(&self) -> &[usize] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Index into the peak list, `None` before the first step
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Detected pixel of the peak under review
    pub fn current_pixel(&self) -> Option<usize> {
        self.current.map(|i| self.peaks[i])
    }

    /// Move by `delta` peaks, clamped to the list. Returns the new index, or
    /// `None` when there are no peaks.
    pub fn advance(&mut self, delta: isize) -> Option<usize> {
        if self.peaks.is_empty() {
            return None;
        }
        let from = self.current.map_or(-1, |c| c as isize);
        let last = self.peaks.len() as isize - 1;
        let target = from.saturating_add(delta).clamp(0, last) as usize;
        self.current = Some(target);
        Some(target)
    }
}

/// Plot region around the peak under review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayWindow {
    /// Index into the peak list
    pub peak_index: usize,
    pub peak_count: usize,
    /// Detected pixel of the peak
    pub center: usize,
    pub pixel_min: f64,
    pub pixel_max: f64,
    pub intensity_min: f64,
    pub intensity_max: f64,
}

impl DisplayWindow {
    /// Plot title, 1-based
    pub fn title(&self) -> String {
        format!("Peak {} of {}", self.peak_index + 1, self.peak_count)
    }
}

/// Window of ±`half_window` pixels around `center`, spanning from the lowest
/// intensity in that range to the peak intensity, padded on both sides
pub fn display_window(
    spectrum: &Spectrum,
    peak_index: usize,
    peak_count: usize,
    center: usize,
    config: &DisplayConfig,
) -> DisplayWindow {
    let half = config.half_window;
    let peak_value = spectrum.at(center).unwrap_or(0.0);
    let floor = spectrum
        .min_in(center.saturating_sub(half), center + half)
        .unwrap_or(peak_value);

    DisplayWindow {
        peak_index,
        peak_count,
        center,
        pixel_min: center as f64 - half as f64,
        pixel_max: center as f64 + half as f64,
        intensity_min: floor - config.intensity_padding,
        intensity_max: peak_value + config.intensity_padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn five_peaks() -> PeakNavigator {
        PeakNavigator::new(vec![10, 30, 50, 70, 90])
    }

    #[test]
    fn test_first_next_lands_on_first_peak() {
        let mut nav = five_peaks();
        assert_eq!(nav.current(), None);
        assert_eq!(nav.advance(1), Some(0));
        assert_eq!(nav.current_pixel(), Some(10));
    }

    #[test]
    fn test_first_previous_is_clamped_to_first_peak() {
        let mut nav = five_peaks();
        assert_eq!(nav.advance(-1), Some(0));
        assert_eq!(nav.current(), Some(0));
    }

    #[test]
    fn test_clamps_at_both_ends() {
        let mut nav = five_peaks();
        for _ in 0..10 {
            nav.advance(1);
        }
        assert_eq!(nav.current(), Some(4));
        assert_eq!(nav.advance(-1), Some(3));
        assert_eq!(nav.advance(-100), Some(0));
        assert_eq!(nav.advance(isize::MAX), Some(4));
    }

    #[test]
    fn test_any_walk_stays_in_range() {
        let mut nav = five_peaks();
        let steps = [1, 1, -1, 3, 1, 1, -2, -7, 2, 9, -1, 0, 4, -4];
        for step in steps {
            let prev = nav.current().map_or(-1, |c| c as isize);
            let now = nav.advance(step).unwrap() as isize;
            assert!((0..5).contains(&now));
            // never moves further than asked
            assert!((now - prev).abs() <= step.abs().max(1));
        }
    }

    #[test]
    fn test_empty_peak_list() {
        let mut nav = PeakNavigator::new(vec![]);
        assert_eq!(nav.advance(1), None);
        assert_eq!(nav.current(), None);
        assert!(nav.is_empty());
    }

    #[test]
    fn test_display_window() {
        let mut intensity = vec![100.0; 200];
        intensity[90] = 40.0;
        intensity[100] = 500.0;
        intensity[130] = 1.0; // outside the window
        let spectrum = Spectrum::new(PathBuf::from("s.txt"), intensity);
        let w = display_window(&spectrum, 0, 1, 100, &DisplayConfig::default());
        assert_eq!(w.pixel_min, 80.0);
        assert_eq!(w.pixel_max, 120.0);
        assert_eq!(w.intensity_min, 30.0);
        assert_eq!(w.intensity_max, 510.0);
        assert_eq!(w.title(), "Peak 1 of 1");
    }

    #[test]
    fn test_display_window_near_edge() {
        let spectrum = Spectrum::new(PathBuf::from("s.txt"), vec![5.0, 9.0, 7.0, 6.0]);
        let w = display_window(&spectrum, 2, 3, 1, &DisplayConfig::default());
        assert_eq!(w.pixel_min, -19.0);
        assert_eq!(w.intensity_min, -5.0);
        assert_eq!(w.intensity_max, 19.0);
        assert_eq!(w.title(), "Peak 3 of 3");
    }
}
