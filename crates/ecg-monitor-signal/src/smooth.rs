//! Windowed smoothing and order statistics.
//!
//! The moving average and sliding median both keep output length equal
//! to input length and zero-pad past the edges, so a window near the
//! boundary is attenuated rather than shortened. Edge behavior matters
//! little here: the detector only looks at the central 80 % of the
//! window and the baseline window (0.2 s) is short against it.

/// Uniform moving average, same-length output, zero-padded edges.
///
/// The window is centered with the extra tap on the earlier side when
/// `window` is even.
#[must_use]
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || window == 0 {
        return signal.to_vec();
    }
    let w = window.min(n);

    // Prefix sums make each output O(1).
    let mut prefix = vec![0.0; n + 1];
    for i in 0..n {
        prefix[i + 1] = prefix[i] + signal[i];
    }

    let offset = (w - 1) / 2;
    (0..n)
        .map(|i| {
            let hi = (i + offset + 1).min(n);
            let lo = (i + offset + 1).saturating_sub(w).min(hi);
            (prefix[hi] - prefix[lo]) / w as f64
        })
        .collect()
}

/// Sliding median with an odd window, same-length output, zero-padded
/// edges. Even windows are widened by one.
#[must_use]
pub fn sliding_median(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || window <= 1 {
        return signal.to_vec();
    }
    let w = if window % 2 == 0 { window + 1 } else { window };
    let half = w / 2;

    let mut out = Vec::with_capacity(n);
    let mut scratch = Vec::with_capacity(w);
    for i in 0..n {
        scratch.clear();
        for j in 0..w {
            let idx = i as isize - half as isize + j as isize;
            if idx >= 0 && (idx as usize) < n {
                scratch.push(signal[idx as usize]);
            } else {
                scratch.push(0.0);
            }
        }
        scratch.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out.push(scratch[half]);
    }
    out
}

/// Median of a slice (sorts a copy). Returns 0.0 for an empty slice.
#[must_use]
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile with linear interpolation between ranks.
/// `p` in [0, 100]. Returns 0.0 for an empty slice.
#[must_use]
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moving_average_flattens_constant() {
        let out = moving_average(&[2.0; 20], 5);
        assert_eq!(out.len(), 20);
        // interior untouched, edges attenuated by the zero padding
        assert_relative_eq!(out[10], 2.0, epsilon = 1e-12);
        assert!(out[0] < 2.0);
    }

    #[test]
    fn moving_average_window_one_is_identity() {
        let signal = vec![1.0, -3.0, 2.0];
        assert_eq!(moving_average(&signal, 1), signal);
    }

    #[test]
    fn moving_average_centered_window() {
        let signal = vec![0.0, 0.0, 9.0, 0.0, 0.0];
        let out = moving_average(&signal, 3);
        assert_relative_eq!(out[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(out[2], 3.0, epsilon = 1e-12);
        assert_relative_eq!(out[3], 3.0, epsilon = 1e-12);
        assert_relative_eq!(out[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn sliding_median_removes_spike() {
        let mut signal = vec![1.0; 21];
        signal[10] = 50.0;
        let out = sliding_median(&signal, 5);
        assert_relative_eq!(out[10], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sliding_median_tracks_step() {
        let signal: Vec<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 4.0 }).collect();
        let out = sliding_median(&signal, 5);
        assert_relative_eq!(out[10], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out[30], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn sliding_median_even_window_widened() {
        let signal = vec![3.0; 11];
        let even = sliding_median(&signal, 4);
        let odd = sliding_median(&signal, 5);
        assert_eq!(even, odd);
    }

    #[test]
    fn median_values() {
        assert_relative_eq!(median(&[1.0, 3.0, 2.0]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5, epsilon = 1e-12);
        assert_relative_eq!(median(&[]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn percentile_interpolates() {
        let data = vec![0.0, 10.0];
        assert_relative_eq!(percentile(&data, 60.0), 6.0, epsilon = 1e-12);
        assert_relative_eq!(percentile(&data, 0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(percentile(&data, 100.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn percentile_single_element() {
        assert_relative_eq!(percentile(&[7.0], 60.0), 7.0, epsilon = 1e-12);
    }
}
