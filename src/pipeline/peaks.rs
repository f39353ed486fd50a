// =========================================================================
//  Peak Detection
// =========================================================================

/// Find local maxima whose intensity is at least `min_height`.
///
/// A sample is a local maximum when it is strictly higher than its left
/// neighbour and the run of equal samples it starts is followed by a strictly
/// lower one. Flat tops report the middle pixel of the plateau (rounded
/// down). The first and last samples are never peaks.
///
/// Returns pixel indices in ascending order.
pub fn detect_peaks(intensity: &[f64], min_height: f64) -> Vec<usize> {
    let n = intensity.len();
    if n < 3 {
        return vec![];
    }

    let mut peaks = Vec::new();
    let mut i = 1;
    let i_max = n - 1;
    while i < i_max {
        if intensity[i - 1] < intensity[i] {
            // Walk over a plateau
            let mut ahead = i + 1;
            while ahead < i_max && intensity[ahead] == intensity[i] {
                ahead += 1;
            }
            if intensity[ahead] < intensity[i] {
                let center = (i + ahead - 1) / 2;
                if intensity[center] >= min_height {
                    peaks.push(center);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    log::debug!(
        "Peak detection: {} peaks at or above {:.1}",
        peaks.len(),
        min_height
    );
    peaks
}
