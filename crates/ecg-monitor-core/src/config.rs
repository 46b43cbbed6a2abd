//! Monitor configuration.
//!
//! [`MonitorConfig`] is built once, validated, and then treated as
//! immutable for the life of a session. Defaults match the deployed
//! bedside configuration: 2 kHz sampling over a 10 s display window.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full configuration for the streaming pipeline and estimator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Sampling rate in Hz.
    pub fs_hz: f64,
    /// Display / analysis window length in seconds.
    pub window_secs: f64,
    /// Filter cascade parameters.
    pub filter: FilterConfig,
    /// Minimum separation between detected peaks, in seconds.
    pub min_rr_secs: f64,
    /// Moving-average smoothing width for peak detection, in seconds.
    pub smooth_window_secs: f64,
    /// Only peaks inside the newest this-many seconds of the window
    /// are offered to the history.
    pub recency_secs: f64,
    /// Peak history retention behind the newest entry, in seconds.
    pub retention_secs: f64,
    /// Minimum gap between consecutive history entries, in seconds.
    pub dedup_secs: f64,
    /// Maximum entries held in the peak history.
    pub peak_history_cap: usize,
    /// Minimum samples between BPM update attempts, in seconds.
    pub update_interval_secs: f64,
    /// Minimum peaks in history before a BPM update is attempted.
    pub min_peaks_for_bpm: usize,
    /// Minimum plausible RR intervals required for a BPM update.
    pub min_rr_intervals: usize,
    /// Plausible RR interval band in seconds (inclusive).
    pub rr_band_secs: (f64, f64),
    /// Acceptable instantaneous BPM band (exclusive bounds).
    pub bpm_band: (f64, f64),
    /// Maximum entries held in the accepted-BPM history.
    pub bpm_history_cap: usize,
    /// Entries required in the BPM history before smoothing engages.
    pub min_bpm_history: usize,
    /// Weight of the previous smoothed value in the blend.
    pub smoothing_old_weight: f64,
}

/// Filter cascade parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterConfig {
    /// Power-line notch center frequency in Hz.
    pub notch_freq_hz: f64,
    /// Notch quality factor.
    pub notch_q: f64,
    /// Band-pass lower cutoff in Hz.
    pub band_low_hz: f64,
    /// Band-pass upper cutoff in Hz.
    pub band_high_hz: f64,
    /// Butterworth band-pass order.
    pub band_order: usize,
    /// Sliding-median baseline window in seconds.
    pub baseline_window_secs: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            notch_freq_hz: 60.0,
            notch_q: 35.0,
            band_low_hz: 0.5,
            band_high_hz: 40.0,
            band_order: 2,
            baseline_window_secs: 0.2,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fs_hz: 2000.0,
            window_secs: 10.0,
            filter: FilterConfig::default(),
            min_rr_secs: 0.65,
            smooth_window_secs: 0.05,
            recency_secs: 2.0,
            retention_secs: 10.0,
            dedup_secs: 0.5,
            peak_history_cap: 30,
            update_interval_secs: 1.0,
            min_peaks_for_bpm: 6,
            min_rr_intervals: 3,
            rr_band_secs: (0.63, 1.2),
            bpm_band: (50.0, 95.0),
            bpm_history_cap: 20,
            min_bpm_history: 5,
            smoothing_old_weight: 0.90,
        }
    }
}

impl MonitorConfig {
    /// Window length in samples (`fs * window_secs`).
    #[must_use]
    pub fn window_len(&self) -> usize {
        (self.fs_hz * self.window_secs) as usize
    }

    /// Minimum peak separation in samples.
    #[must_use]
    pub fn min_distance_samples(&self) -> usize {
        (self.min_rr_secs * self.fs_hz) as usize
    }

    /// Moving-average smoothing width in samples, at least 3.
    #[must_use]
    pub fn smooth_window_samples(&self) -> usize {
        ((self.smooth_window_secs * self.fs_hz) as usize).max(3)
    }

    /// Sliding-median baseline window in samples, forced odd.
    #[must_use]
    pub fn baseline_window_samples(&self) -> usize {
        let w = (self.filter.baseline_window_secs * self.fs_hz) as usize;
        if w % 2 == 0 {
            w + 1
        } else {
            w
        }
    }

    /// Samples required between BPM update attempts.
    #[must_use]
    pub fn update_interval_samples(&self) -> u64 {
        (self.update_interval_secs * self.fs_hz) as u64
    }

    /// Width of the recency region in samples.
    #[must_use]
    pub fn recency_samples(&self) -> usize {
        (self.recency_secs * self.fs_hz) as usize
    }

    /// Samples that must arrive before the first filtered display
    /// (a quarter of the window).
    #[must_use]
    pub fn warmup_samples(&self) -> u64 {
        self.window_len() as u64 / 4
    }

    /// Samples that must arrive before peak detection engages
    /// (half of the window).
    #[must_use]
    pub fn detection_samples(&self) -> u64 {
        self.window_len() as u64 / 2
    }

    /// Checks internal consistency. Must be called before a config
    /// is handed to a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fs_hz.is_finite() || self.fs_hz <= 0.0 {
            return Err(ConfigError::new(format!(
                "sampling rate must be positive, got {}",
                self.fs_hz
            )));
        }
        if self.window_secs <= 0.0 {
            return Err(ConfigError::new("window length must be positive"));
        }
        let nyquist = self.fs_hz / 2.0;
        let f = &self.filter;
        if f.band_low_hz <= 0.0 || f.band_low_hz >= f.band_high_hz {
            return Err(ConfigError::new(format!(
                "band-pass cutoffs must satisfy 0 < low < high, got {}..{}",
                f.band_low_hz, f.band_high_hz
            )));
        }
        if f.band_high_hz >= nyquist || f.notch_freq_hz >= nyquist {
            return Err(ConfigError::new(format!(
                "filter frequencies must stay below Nyquist ({nyquist} Hz)"
            )));
        }
        if f.notch_q <= 0.0 {
            return Err(ConfigError::new("notch Q must be positive"));
        }
        if f.band_order == 0 || f.band_order % 2 != 0 {
            return Err(ConfigError::new(format!(
                "band-pass order must be a positive even number, got {}",
                f.band_order
            )));
        }
        if self.min_rr_secs <= 0.0 || self.min_rr_secs >= self.window_secs {
            return Err(ConfigError::new("min RR must be within the window"));
        }
        if self.rr_band_secs.0 <= 0.0 || self.rr_band_secs.0 >= self.rr_band_secs.1 {
            return Err(ConfigError::new("RR band must satisfy 0 < min < max"));
        }
        if self.bpm_band.0 <= 0.0 || self.bpm_band.0 >= self.bpm_band.1 {
            return Err(ConfigError::new("BPM band must satisfy 0 < low < high"));
        }
        if !(0.0..1.0).contains(&self.smoothing_old_weight) {
            return Err(ConfigError::new(
                "smoothing weight must be in [0, 1)",
            ));
        }
        if self.peak_history_cap == 0 || self.bpm_history_cap == 0 {
            return Err(ConfigError::new("history capacities must be positive"));
        }
        Ok(())
    }
}
