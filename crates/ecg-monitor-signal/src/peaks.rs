//! QRS peak detection.
//!
//! Two detectors live here. The streaming detector runs every tick on
//! the filtered display window: it smooths lightly, derives an adaptive
//! percentile threshold from the central 80 % of the window (edges are
//! filter-transient territory), and scans left to right with a minimum
//! peak distance. The offline detector is the batch-analysis variant:
//! simple local maxima against a global amplitude threshold.

use crate::smooth::{moving_average, percentile};

/// Result of one streaming detection pass.
#[derive(Debug, Clone)]
pub struct PeakDetection {
    /// Detected peak positions, strictly increasing, spaced at least
    /// `min_distance` apart.
    pub positions: Vec<usize>,
    /// Threshold the pass used.
    pub threshold: f64,
}

impl PeakDetection {
    fn empty() -> Self {
        Self {
            positions: Vec::new(),
            threshold: 0.0,
        }
    }
}

/// Streaming detector over a filtered window.
///
/// `min_distance` is the minimum peak separation in samples and
/// `smooth_window` the moving-average width (clamped to at least 3).
/// Windows too short to hold even one admissible peak return an empty
/// detection.
#[must_use]
pub fn detect_peaks(signal: &[f64], min_distance: usize, smooth_window: usize) -> PeakDetection {
    let n = signal.len();
    if n == 0 || min_distance == 0 || n <= 2 * min_distance {
        return PeakDetection::empty();
    }

    let smoothed = moving_average(signal, smooth_window.max(3));

    // Threshold from the central 80 %: prefer the 60th percentile of
    // strictly positive values, falling back to the 70th of the whole
    // region when nothing is positive.
    let margin = n / 10;
    let central = &smoothed[margin..n - margin];
    let positives: Vec<f64> = central.iter().copied().filter(|v| *v > 0.0).collect();
    let threshold = if positives.is_empty() {
        percentile(central, 70.0)
    } else {
        percentile(&positives, 60.0)
    };

    let refine = min_distance / 4;
    let mut positions: Vec<usize> = Vec::new();
    let mut i = min_distance;
    let end = n - min_distance;
    while i < end {
        if smoothed[i] > 0.0 && smoothed[i] > threshold {
            // Candidate crossed the threshold; snap to the local
            // maximum of its neighborhood before accepting.
            let lo = i.saturating_sub(refine);
            let hi = (i + refine + 1).min(n);
            let mut best = i;
            for j in lo..hi {
                if smoothed[j] > smoothed[best] {
                    best = j;
                }
            }
            let spaced = positions
                .last()
                .map_or(true, |&prev| best > prev && best - prev >= min_distance);
            if smoothed[best] > 0.0 && smoothed[best] > threshold && spaced {
                positions.push(best);
                i = best + min_distance;
                continue;
            }
        }
        i += 1;
    }

    PeakDetection {
        positions,
        threshold,
    }
}

/// Offline detector: local maxima at or above `min_height`, thinned to
/// a minimum separation of `min_distance` samples, taller peaks win.
#[must_use]
pub fn find_peaks_global(signal: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..signal.len() - 1)
        .filter(|&i| {
            signal[i] > signal[i - 1] && signal[i] >= signal[i + 1] && signal[i] >= min_height
        })
        .collect();

    // Enforce the distance constraint tallest-first.
    candidates.sort_by(|a, b| {
        signal[*b]
            .partial_cmp(&signal[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept: Vec<usize> = Vec::new();
    for &c in &candidates {
        if kept.iter().all(|&k| c.abs_diff(k) >= min_distance.max(1)) {
            kept.push(c);
        }
    }
    kept.sort_unstable();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pulse train resembling filtered QRS complexes: narrow triangular
    /// spikes on a flat baseline.
    fn pulse_train(n: usize, period: usize, width: usize) -> Vec<f64> {
        let mut signal: Vec<f64> = vec![0.0; n];
        let mut center = period / 2;
        while center + width < n {
            for d in 0..=width {
                let v = 1.0 - d as f64 / (width + 1) as f64;
                signal[center + d] = signal[center + d].max(v);
                signal[center - d] = signal[center - d].max(v);
            }
            center += period;
        }
        signal
    }

    #[test]
    fn detects_regular_pulse_train() {
        // 10 s at 200 Hz, one beat every 167 samples (~72 BPM)
        let signal = pulse_train(2000, 167, 4);
        let result = detect_peaks(&signal, 130, 10);
        assert!(
            result.positions.len() >= 9,
            "found {} peaks",
            result.positions.len()
        );
        for pair in result.positions.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= 130);
        }
    }

    #[test]
    fn refines_to_local_maximum() {
        let signal = pulse_train(2000, 400, 6);
        let result = detect_peaks(&signal, 130, 3);
        // Each reported position must sit on a pulse apex: the
        // smoothed signal there should dominate its neighborhood.
        for &p in &result.positions {
            let apex_offset = (p as isize - 200).rem_euclid(400);
            assert!(
                apex_offset <= 3 || apex_offset >= 397,
                "peak at {p} is off-apex by {apex_offset}"
            );
        }
    }

    #[test]
    fn flat_zero_signal_has_no_peaks() {
        let result = detect_peaks(&vec![0.0; 2000], 130, 10);
        assert!(result.positions.is_empty());
    }

    #[test]
    fn short_window_is_empty() {
        let result = detect_peaks(&[1.0, 2.0, 1.0], 130, 3);
        assert!(result.positions.is_empty());
    }

    #[test]
    fn threshold_uses_positive_percentile() {
        let signal = pulse_train(2000, 167, 4);
        let result = detect_peaks(&signal, 130, 3);
        assert!(result.threshold > 0.0);
    }

    #[test]
    fn global_detector_finds_spaced_maxima() {
        let mut signal = vec![0.0; 100];
        signal[20] = 1.0;
        signal[50] = 0.8;
        signal[52] = 0.9;
        signal[80] = 1.0;
        let peaks = find_peaks_global(&signal, 0.6, 10);
        assert_eq!(peaks, vec![20, 52, 80]);
    }

    #[test]
    fn global_detector_height_cutoff() {
        let mut signal = vec![0.0; 50];
        signal[10] = 0.5;
        signal[30] = 1.0;
        let peaks = find_peaks_global(&signal, 0.6, 5);
        assert_eq!(peaks, vec![30]);
    }

    #[test]
    fn global_detector_keeps_taller_of_close_pair() {
        let mut signal = vec![0.0; 60];
        signal[20] = 0.7;
        signal[24] = 1.0;
        let peaks = find_peaks_global(&signal, 0.5, 10);
        assert_eq!(peaks, vec![24]);
    }

    #[test]
    fn global_detector_empty_input() {
        assert!(find_peaks_global(&[], 0.5, 10).is_empty());
    }
}
