//! Median-of-RR heart-rate estimation with display smoothing.
//!
//! The estimator is deliberately conservative: it wants several beats,
//! several plausible RR intervals, and a physiologically sensible
//! instantaneous rate before it will move the displayed number. A
//! failed attempt changes nothing; the previous smoothed value stands
//! until a better one is earned.

use std::collections::VecDeque;

use ecg_monitor_core::MonitorConfig;
use tracing::debug;

/// Outcome of one update attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BpmUpdate {
    /// Not enough samples elapsed since the last accepted update.
    TooSoon,
    /// Fewer beats in history than required.
    TooFewPeaks,
    /// Fewer plausible RR intervals than required.
    TooFewIntervals,
    /// Median RR mapped to a rate outside the acceptance band.
    OutOfBand(f64),
    /// Instantaneous rate accepted into the BPM history.
    Accepted(f64),
}

/// Heart-rate estimator over the accepted-beat history.
#[derive(Debug, Clone)]
pub struct BpmEstimator {
    accepted: VecDeque<f64>,
    smoothed: Option<f64>,
    last_update_sample: u64,
    update_interval_samples: u64,
    min_peaks: usize,
    min_intervals: usize,
    rr_band: (f64, f64),
    bpm_band: (f64, f64),
    history_cap: usize,
    min_history: usize,
    old_weight: f64,
}

impl BpmEstimator {
    /// Creates an estimator from a validated configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            accepted: VecDeque::with_capacity(config.bpm_history_cap),
            smoothed: None,
            last_update_sample: 0,
            update_interval_samples: config.update_interval_samples(),
            min_peaks: config.min_peaks_for_bpm,
            min_intervals: config.min_rr_intervals,
            rr_band: config.rr_band_secs,
            bpm_band: config.bpm_band,
            history_cap: config.bpm_history_cap,
            min_history: config.min_bpm_history,
            old_weight: config.smoothing_old_weight,
        }
    }

    /// Attempts one update from the beat history.
    ///
    /// `peak_times` must be chronological; `total_samples` is the
    /// stream position used for the rate-limit gate. The gate only
    /// advances on acceptance, so a rejected attempt is retried on the
    /// very next tick.
    pub fn update(&mut self, peak_times: &[f64], total_samples: u64) -> BpmUpdate {
        if total_samples - self.last_update_sample < self.update_interval_samples {
            return BpmUpdate::TooSoon;
        }
        if peak_times.len() < self.min_peaks {
            return BpmUpdate::TooFewPeaks;
        }

        let (rr_min, rr_max) = self.rr_band;
        let plausible: Vec<f64> = peak_times
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|rr| (rr_min..=rr_max).contains(rr))
            .collect();
        if plausible.len() < self.min_intervals {
            return BpmUpdate::TooFewIntervals;
        }

        let median_rr = ecg_monitor_signal::median(&plausible);
        let instant = 60.0 / median_rr;
        let (lo, hi) = self.bpm_band;
        if !(instant > lo && instant < hi) {
            debug!(bpm = instant, "instantaneous rate outside acceptance band");
            return BpmUpdate::OutOfBand(instant);
        }

        self.accepted.push_back(instant);
        while self.accepted.len() > self.history_cap {
            self.accepted.pop_front();
        }
        self.last_update_sample = total_samples;

        if self.accepted.len() >= self.min_history {
            let values: Vec<f64> = self.accepted.iter().copied().collect();
            let median_bpm = ecg_monitor_signal::median(&values);
            self.smoothed = Some(match self.smoothed {
                Some(old) => self.old_weight * old + (1.0 - self.old_weight) * median_bpm,
                None => median_bpm,
            });
        }
        BpmUpdate::Accepted(instant)
    }

    /// Current smoothed heart rate, if one has been established.
    #[must_use]
    pub fn smoothed_bpm(&self) -> Option<f64> {
        self.smoothed
    }

    /// Entries currently in the accepted-BPM history.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.accepted.len()
    }

    /// Restores the freshly-created state.
    pub fn reset(&mut self) {
        self.accepted.clear();
        self.smoothed = None;
        self.last_update_sample = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> MonitorConfig {
        MonitorConfig {
            fs_hz: 200.0,
            ..MonitorConfig::default()
        }
    }

    /// `count` beats spaced `rr` seconds apart.
    fn beats(count: usize, rr: f64) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * rr).collect()
    }

    #[test]
    fn accepts_steady_72_bpm() {
        let mut est = BpmEstimator::new(&config());
        let times = beats(8, 60.0 / 72.0);
        assert!(matches!(est.update(&times, 10_000), BpmUpdate::Accepted(_)));
        assert_eq!(est.history_len(), 1);
        // smoothing needs five accepted entries first
        assert!(est.smoothed_bpm().is_none());
    }

    #[test]
    fn smoothing_engages_after_five_updates() {
        let mut est = BpmEstimator::new(&config());
        let times = beats(8, 60.0 / 72.0);
        let mut total = 10_000;
        for _ in 0..5 {
            assert!(matches!(est.update(&times, total), BpmUpdate::Accepted(_)));
            total += 200;
        }
        let bpm = est.smoothed_bpm().unwrap();
        assert_relative_eq!(bpm, 72.0, epsilon = 0.5);
    }

    #[test]
    fn rate_limit_gate_blocks_early_retry() {
        let mut est = BpmEstimator::new(&config());
        let times = beats(8, 60.0 / 72.0);
        assert!(matches!(est.update(&times, 10_000), BpmUpdate::Accepted(_)));
        assert_eq!(est.update(&times, 10_050), BpmUpdate::TooSoon);
        assert!(matches!(est.update(&times, 10_200), BpmUpdate::Accepted(_)));
    }

    #[test]
    fn rejected_attempt_leaves_gate_open() {
        let mut est = BpmEstimator::new(&config());
        assert_eq!(est.update(&beats(2, 0.8), 10_000), BpmUpdate::TooFewPeaks);
        // gate did not advance: the next tick may retry immediately
        assert_eq!(est.update(&beats(2, 0.8), 10_001), BpmUpdate::TooFewPeaks);
    }

    #[test]
    fn needs_three_plausible_intervals() {
        let mut est = BpmEstimator::new(&config());
        // 6 beats but every interval is 2.0 s, outside [0.63, 1.2]
        let times = beats(6, 2.0);
        assert_eq!(est.update(&times, 10_000), BpmUpdate::TooFewIntervals);
        assert!(est.smoothed_bpm().is_none());
    }

    #[test]
    fn rejects_rate_outside_band() {
        let mut est = BpmEstimator::new(&config());
        // RR 0.631 s is inside the plausible band but maps to
        // 95.09 BPM, above the open acceptance interval (50, 95)
        let times = beats(8, 0.631);
        assert!(matches!(est.update(&times, 10_000), BpmUpdate::OutOfBand(_)));
        assert_eq!(est.history_len(), 0);
    }

    #[test]
    fn failure_preserves_previous_smoothed_value() {
        let mut est = BpmEstimator::new(&config());
        let good = beats(8, 60.0 / 72.0);
        let mut total = 10_000;
        for _ in 0..5 {
            est.update(&good, total);
            total += 200;
        }
        let before = est.smoothed_bpm().unwrap();
        est.update(&beats(2, 0.8), total);
        assert_relative_eq!(est.smoothed_bpm().unwrap(), before, epsilon = 1e-12);
    }

    #[test]
    fn blend_moves_slowly_toward_new_rate() {
        let mut est = BpmEstimator::new(&config());
        let mut total = 10_000;
        for _ in 0..5 {
            est.update(&beats(8, 60.0 / 72.0), total);
            total += 200;
        }
        let before = est.smoothed_bpm().unwrap();
        // heart speeds up to ~88 BPM; the history median shifts once
        // the new rate dominates, then the blend creeps toward it
        for _ in 0..8 {
            est.update(&beats(8, 60.0 / 88.0), total);
            total += 200;
        }
        let after = est.smoothed_bpm().unwrap();
        assert!(after > before);
        assert!(after < 88.0, "blend overshot: {after}");
    }

    #[test]
    fn history_is_bounded() {
        let mut est = BpmEstimator::new(&config());
        let times = beats(8, 60.0 / 72.0);
        let mut total = 10_000;
        for _ in 0..40 {
            est.update(&times, total);
            total += 200;
        }
        assert!(est.history_len() <= 20);
    }

    #[test]
    fn reset_clears_state() {
        let mut est = BpmEstimator::new(&config());
        let mut total = 10_000;
        for _ in 0..5 {
            est.update(&beats(8, 60.0 / 72.0), total);
            total += 200;
        }
        est.reset();
        assert!(est.smoothed_bpm().is_none());
        assert_eq!(est.history_len(), 0);
    }
}
