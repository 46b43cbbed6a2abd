//! Fixed-capacity sample ring.
//!
//! The window starts pre-seeded with zeros so a snapshot is always
//! exactly one window long; the display sweeps in from a flat trace
//! instead of growing. Warm-up policy is enforced by the session via
//! [`SampleBuffer::total_pushed`], not by the buffer itself.

/// Ring buffer over the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Vec<f64>,
    head: usize,
    total: u64,
}

impl SampleBuffer {
    /// Creates a zero-filled buffer holding `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            head: 0,
            total: 0,
        }
    }

    /// Appends one sample, evicting the oldest.
    pub fn push(&mut self, value: f64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.data.len();
        self.total += 1;
    }

    /// Number of samples pushed since creation or the last reset.
    /// Monotonic; never wraps in practice (584 million years at 1 kHz).
    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.total
    }

    /// Buffer capacity in samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The window in arrival order, oldest sample first. Always
    /// `capacity` long; leading zeros stand in for samples not yet
    /// received.
    #[must_use]
    pub fn snapshot(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        out.extend_from_slice(&self.data[self.head..]);
        out.extend_from_slice(&self.data[..self.head]);
        out
    }

    /// Restores the freshly-created state.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
        self.head = 0;
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_zero_seeded() {
        let buffer = SampleBuffer::new(8);
        assert_eq!(buffer.snapshot(), vec![0.0; 8]);
        assert_eq!(buffer.total_pushed(), 0);
    }

    #[test]
    fn snapshot_preserves_arrival_order() {
        let mut buffer = SampleBuffer::new(4);
        for v in [1.0, 2.0, 3.0] {
            buffer.push(v);
        }
        assert_eq!(buffer.snapshot(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn push_evicts_oldest_at_capacity() {
        let mut buffer = SampleBuffer::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(v);
        }
        assert_eq!(buffer.snapshot(), vec![3.0, 4.0, 5.0]);
        assert_eq!(buffer.total_pushed(), 5);
    }

    #[test]
    fn snapshot_has_no_side_effects() {
        let mut buffer = SampleBuffer::new(4);
        buffer.push(7.0);
        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first, second);
        assert_eq!(buffer.total_pushed(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut buffer = SampleBuffer::new(4);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(v);
        }
        buffer.reset();
        assert_eq!(buffer.snapshot(), vec![0.0; 4]);
        assert_eq!(buffer.total_pushed(), 0);
    }

    #[test]
    fn wraps_many_times() {
        let mut buffer = SampleBuffer::new(5);
        for i in 0..103 {
            buffer.push(f64::from(i));
        }
        assert_eq!(
            buffer.snapshot(),
            vec![98.0, 99.0, 100.0, 101.0, 102.0]
        );
    }
}
