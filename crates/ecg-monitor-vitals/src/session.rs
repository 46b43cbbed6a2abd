//! The streaming session: one owner for all mutable estimation state.
//!
//! Tick model: the caller drains whatever samples arrived since the
//! last tick and hands them over in one batch. A tick with no new
//! samples produces no snapshot. Everything downstream of the buffer
//! is recomputed from the current window, so a snapshot is a pure
//! function of the sample sequence so far.

use ecg_monitor_core::{
    BpmReading, BpmStatus, ConfigError, Diagnostics, MonitorConfig, TickSnapshot,
};
use ecg_monitor_signal::{detect_peaks, FilterPipeline};
use tracing::{debug, info};

use crate::buffer::SampleBuffer;
use crate::estimator::{BpmEstimator, BpmUpdate};
use crate::history::PeakHistory;

/// A live heart-rate estimation session.
#[derive(Debug)]
pub struct EcgSession {
    config: MonitorConfig,
    buffer: SampleBuffer,
    pipeline: FilterPipeline,
    history: PeakHistory,
    estimator: BpmEstimator,
}

impl EcgSession {
    /// Builds a session, validating the configuration first.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffer = SampleBuffer::new(config.window_len());
        let pipeline = FilterPipeline::new(&config);
        let history = PeakHistory::new(
            config.retention_secs,
            config.dedup_secs,
            config.peak_history_cap,
        );
        let estimator = BpmEstimator::new(&config);
        info!(
            fs_hz = config.fs_hz,
            window_len = config.window_len(),
            "session initialized"
        );
        Ok(Self {
            config,
            buffer,
            pipeline,
            history,
            estimator,
        })
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Runs one tick over freshly arrived samples.
    ///
    /// Non-finite samples are dropped. Returns `None` when nothing was
    /// ingested, so an idle stream leaves the display untouched.
    pub fn tick(&mut self, new_samples: &[f64]) -> Option<TickSnapshot> {
        let mut pushed = 0usize;
        for &sample in new_samples {
            if sample.is_finite() {
                self.buffer.push(sample);
                pushed += 1;
            }
        }
        if pushed == 0 {
            return None;
        }

        let total = self.buffer.total_pushed();
        let mut diagnostics = Diagnostics {
            total_samples: total,
            ..Diagnostics::default()
        };

        // Warm-up: not enough signal to filter meaningfully, show the
        // raw trace sweeping in.
        if total < self.config.warmup_samples() {
            return Some(TickSnapshot {
                waveform: self.buffer.snapshot(),
                window_secs: self.config.window_secs,
                peak_positions: Vec::new(),
                bpm: BpmReading::warming_up(),
                diagnostics,
            });
        }

        let window = self.buffer.snapshot();
        let outcome = self.pipeline.apply(&window);
        diagnostics.skipped_stages = outcome.skipped;

        let mut peak_positions = Vec::new();
        let mut bpm = BpmReading::warming_up();
        if total >= self.config.detection_samples() {
            let detection = detect_peaks(
                &outcome.filtered,
                self.config.min_distance_samples(),
                self.config.smooth_window_samples(),
            );
            diagnostics.peak_threshold = Some(detection.threshold);
            diagnostics.peaks_in_window = detection.positions.len();
            let instant = detection.positions.len() as f64 / self.config.window_secs * 60.0;

            if detection.positions.len() >= 2 {
                let now = total as f64 / self.config.fs_hz;
                let stats = self.history.ingest(
                    &detection.positions,
                    window.len(),
                    now,
                    self.config.fs_hz,
                    self.config.recency_samples(),
                );
                diagnostics.candidates_seen = stats.seen;
                diagnostics.candidates_accepted = stats.accepted;

                match self.estimator.update(&self.history.times(), total) {
                    BpmUpdate::Accepted(rate) => {
                        debug!(instant_bpm = rate, "heart-rate update accepted");
                    }
                    BpmUpdate::TooSoon => {}
                    other => debug!(outcome = ?other, "heart-rate update rejected"),
                }
            }
            diagnostics.history_len = self.history.len();

            bpm = match self.estimator.smoothed_bpm() {
                Some(value) => BpmReading {
                    smoothed_bpm: value,
                    instant_bpm: instant,
                    status: BpmStatus::Valid,
                },
                None => BpmReading::unavailable(instant),
            };
            peak_positions = detection.positions;
        }

        Some(TickSnapshot {
            waveform: outcome.filtered,
            window_secs: self.config.window_secs,
            peak_positions,
            bpm,
            diagnostics,
        })
    }

    /// Restores the freshly-initialized state; the configuration and
    /// designed filters are kept.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.history.reset();
        self.estimator.reset();
        info!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MonitorConfig {
        MonitorConfig {
            fs_hz: 200.0,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MonitorConfig {
            fs_hz: -1.0,
            ..MonitorConfig::default()
        };
        assert!(EcgSession::new(config).is_err());
    }

    #[test]
    fn empty_tick_yields_nothing() {
        let mut session = EcgSession::new(small_config()).unwrap();
        assert!(session.tick(&[]).is_none());
    }

    #[test]
    fn nonfinite_only_tick_yields_nothing() {
        let mut session = EcgSession::new(small_config()).unwrap();
        assert!(session.tick(&[f64::NAN, f64::INFINITY]).is_none());
    }

    #[test]
    fn warmup_snapshot_is_raw_window() {
        let mut session = EcgSession::new(small_config()).unwrap();
        let samples = vec![0.25; 100];
        let snap = session.tick(&samples).unwrap();
        assert_eq!(snap.bpm.status, BpmStatus::WarmingUp);
        assert_eq!(snap.waveform.len(), 2000);
        // raw trace: the DC offset is still present at the tail
        assert!((snap.waveform[1999] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn filtered_after_warmup_before_detection() {
        let mut session = EcgSession::new(small_config()).unwrap();
        // past warm-up (500) but short of detection (1000)
        let snap = session.tick(&vec![0.25; 700]).unwrap();
        assert_eq!(snap.bpm.status, BpmStatus::WarmingUp);
        assert!(snap.peak_positions.is_empty());
        // filtered trace: DC removed
        assert!(snap.waveform[1900].abs() < 1e-3);
    }

    #[test]
    fn snapshot_counts_total_samples() {
        let mut session = EcgSession::new(small_config()).unwrap();
        session.tick(&vec![0.0; 300]);
        let snap = session.tick(&vec![0.0; 300]).unwrap();
        assert_eq!(snap.diagnostics.total_samples, 600);
    }

    #[test]
    fn reset_restores_warmup() {
        let mut session = EcgSession::new(small_config()).unwrap();
        session.tick(&vec![0.1; 1500]);
        session.reset();
        let snap = session.tick(&vec![0.1; 10]).unwrap();
        assert_eq!(snap.bpm.status, BpmStatus::WarmingUp);
        assert_eq!(snap.diagnostics.total_samples, 10);
    }
}
