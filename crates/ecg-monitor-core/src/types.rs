//! ECG monitor domain types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of a heart-rate reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BpmStatus {
    /// Smoothed BPM is defined and within the physiological band.
    Valid,
    /// Buffer is still filling; no estimate attempted yet.
    WarmingUp,
    /// Estimation ran but no acceptable value has been produced.
    Unavailable,
}

/// A heart-rate reading produced by one tick of the session.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BpmReading {
    /// Smoothed heart rate in beats per minute. Meaningful only when
    /// `status` is [`BpmStatus::Valid`]; `0.0` otherwise.
    pub smoothed_bpm: f64,
    /// Raw peaks-per-window rate, `peaks / window_secs * 60`. Always
    /// populated once detection runs, regardless of acceptance.
    pub instant_bpm: f64,
    /// Reading status.
    pub status: BpmStatus,
}

impl BpmReading {
    /// Reading for a session that has not warmed up yet.
    #[must_use]
    pub const fn warming_up() -> Self {
        Self {
            smoothed_bpm: 0.0,
            instant_bpm: 0.0,
            status: BpmStatus::WarmingUp,
        }
    }

    /// Reading when estimation produced nothing acceptable.
    #[must_use]
    pub const fn unavailable(instant_bpm: f64) -> Self {
        Self {
            smoothed_bpm: 0.0,
            instant_bpm,
            status: BpmStatus::Unavailable,
        }
    }
}

/// One stage of the streaming filter cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterStage {
    /// DC / mean removal.
    MeanRemoval,
    /// Power-line notch filter.
    Notch,
    /// Butterworth band-pass filter.
    BandPass,
    /// Sliding-median baseline subtraction.
    BaselineMedian,
}

impl FilterStage {
    /// Human-readable stage name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MeanRemoval => "mean_removal",
            Self::Notch => "notch",
            Self::BandPass => "band_pass",
            Self::BaselineMedian => "baseline_median",
        }
    }
}

/// Per-tick diagnostic counters.
///
/// Everything here is observational: consumers must not feed it back
/// into the pipeline.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    /// Total samples ingested since session start (monotonic).
    pub total_samples: u64,
    /// Filter stages skipped this tick due to numerical failure.
    pub skipped_stages: Vec<FilterStage>,
    /// Detection threshold used this tick, if detection ran.
    pub peak_threshold: Option<f64>,
    /// Peaks detected in the current window.
    pub peaks_in_window: usize,
    /// Peak candidates offered to the history this tick.
    pub candidates_seen: usize,
    /// Peak candidates the history actually accepted this tick.
    pub candidates_accepted: usize,
    /// Entries currently held in the peak history.
    pub history_len: usize,
}

/// Snapshot emitted by one session tick.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickSnapshot {
    /// Display waveform, oldest sample first. Raw during warm-up,
    /// filtered afterwards. Always the full window length.
    pub waveform: Vec<f64>,
    /// Width of the display window in seconds. The time axis runs
    /// from `-window_secs` to `0.0`; see [`TickSnapshot::time_axis`].
    pub window_secs: f64,
    /// Sample positions of detected peaks within `waveform`.
    pub peak_positions: Vec<usize>,
    /// Heart-rate reading.
    pub bpm: BpmReading,
    /// Diagnostic counters for this tick.
    pub diagnostics: Diagnostics,
}

impl TickSnapshot {
    /// Time axis for `waveform`: `window_secs` in the past up to now,
    /// one entry per sample, newest at `0.0`.
    #[must_use]
    pub fn time_axis(&self) -> Vec<f64> {
        let n = self.waveform.len();
        if n == 0 {
            return Vec::new();
        }
        let step = self.window_secs / n as f64;
        (0..n).map(|i| (i as f64 - n as f64) * step).collect()
    }
}
