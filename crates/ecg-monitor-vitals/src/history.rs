//! Accepted-peak history.
//!
//! Peak positions from the detector are window-relative and the window
//! slides every tick, so the same physical beat reappears at shifting
//! positions. The history converts positions to absolute stream time
//! and deduplicates: only candidates from the newest part of the
//! window are considered (older ones were already seen on previous
//! ticks), and a candidate closer than the dedup gap to the last
//! accepted beat is the same beat re-detected.

use std::collections::VecDeque;

/// Acceptance counters for one ingest pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStats {
    /// Candidates inside the recency region.
    pub seen: usize,
    /// Candidates actually appended.
    pub accepted: usize,
}

/// Bounded history of accepted beat times, in seconds of stream time.
#[derive(Debug, Clone)]
pub struct PeakHistory {
    times: VecDeque<f64>,
    retention_secs: f64,
    dedup_secs: f64,
    capacity: usize,
}

impl PeakHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new(retention_secs: f64, dedup_secs: f64, capacity: usize) -> Self {
        Self {
            times: VecDeque::with_capacity(capacity),
            retention_secs,
            dedup_secs,
            capacity,
        }
    }

    /// Folds one detection pass into the history.
    ///
    /// `positions` are window-relative sample indices (window length
    /// `window_len`), `now_secs` the stream time of the newest sample,
    /// and `recency_samples` the width of the region at the window's
    /// tail from which candidates are taken.
    pub fn ingest(
        &mut self,
        positions: &[usize],
        window_len: usize,
        now_secs: f64,
        fs_hz: f64,
        recency_samples: usize,
    ) -> IngestStats {
        // Age out entries the estimator must no longer see.
        let cutoff = now_secs - self.retention_secs;
        while self.times.front().is_some_and(|&t| t < cutoff) {
            self.times.pop_front();
        }

        let recency_start = window_len.saturating_sub(recency_samples);
        let mut stats = IngestStats::default();
        for &pos in positions {
            if pos < recency_start {
                continue;
            }
            stats.seen += 1;
            let time = now_secs - (window_len - pos) as f64 / fs_hz;
            let is_new = self
                .times
                .back()
                .map_or(true, |&last| time > last + self.dedup_secs);
            if is_new {
                self.times.push_back(time);
                stats.accepted += 1;
            }
        }

        while self.times.len() > self.capacity {
            self.times.pop_front();
        }
        stats
    }

    /// Number of beats currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// `true` if no beats are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Beat times in chronological order.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.times.iter().copied().collect()
    }

    /// Intervals between consecutive beats, in seconds.
    #[must_use]
    pub fn rr_intervals(&self) -> Vec<f64> {
        self.times
            .iter()
            .zip(self.times.iter().skip(1))
            .map(|(a, b)| b - a)
            .collect()
    }

    /// Drops all beats.
    pub fn reset(&mut self) {
        self.times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FS: f64 = 200.0;
    const WINDOW: usize = 2000;
    const RECENCY: usize = 400;

    fn history() -> PeakHistory {
        PeakHistory::new(10.0, 0.5, 30)
    }

    #[test]
    fn converts_position_to_stream_time() {
        let mut h = history();
        // newest sample is at stream time 20 s; a peak one second back
        let stats = h.ingest(&[WINDOW - 200], WINDOW, 20.0, FS, RECENCY);
        assert_eq!(stats.accepted, 1);
        assert_relative_eq!(h.times()[0], 19.0, epsilon = 1e-9);
    }

    #[test]
    fn ignores_candidates_outside_recency_region() {
        let mut h = history();
        let stats = h.ingest(&[100, WINDOW - 100], WINDOW, 20.0, FS, RECENCY);
        assert_eq!(stats.seen, 1);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn deduplicates_redetected_beat() {
        let mut h = history();
        h.ingest(&[WINDOW - 300], WINDOW, 20.0, FS, RECENCY);
        // same beat, next tick: window slid 0.1 s, position shifted by 20
        let stats = h.ingest(&[WINDOW - 320], WINDOW, 20.1, FS, RECENCY);
        assert_eq!(stats.seen, 1);
        assert_eq!(stats.accepted, 0);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn accepts_beat_past_dedup_gap() {
        let mut h = history();
        h.ingest(&[WINDOW - 300], WINDOW, 20.0, FS, RECENCY);
        h.ingest(&[WINDOW - 180], WINDOW, 20.0, FS, RECENCY);
        assert_eq!(h.len(), 2);
        let rr = h.rr_intervals();
        assert_relative_eq!(rr[0], 0.6, epsilon = 1e-9);
    }

    #[test]
    fn gaps_always_exceed_dedup() {
        let mut h = history();
        for i in 0..8 {
            let now = 20.0 + i as f64 * 0.8;
            h.ingest(&[WINDOW - 50], WINDOW, now, FS, RECENCY);
        }
        for rr in h.rr_intervals() {
            assert!(rr > 0.5);
        }
    }

    #[test]
    fn retention_evicts_old_beats() {
        let mut h = history();
        h.ingest(&[WINDOW - 50], WINDOW, 20.0, FS, RECENCY);
        h.ingest(&[WINDOW - 50], WINDOW, 31.0, FS, RECENCY);
        // the 20 s beat is now 11 s old
        assert_eq!(h.len(), 1);
        assert!(h.times()[0] > 30.0);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut h = PeakHistory::new(1000.0, 0.5, 5);
        for i in 0..12 {
            h.ingest(&[WINDOW - 50], WINDOW, 20.0 + i as f64, FS, RECENCY);
        }
        assert_eq!(h.len(), 5);
    }

    #[test]
    fn reset_clears_everything() {
        let mut h = history();
        h.ingest(&[WINDOW - 50], WINDOW, 20.0, FS, RECENCY);
        h.reset();
        assert!(h.is_empty());
    }
}
