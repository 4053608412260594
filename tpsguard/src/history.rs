//! Rolling TPS history.
//!
//! A fixed-capacity FIFO window over the most recent samples. Policies read
//! it through [`HistoryBuffer::average`] and [`HistoryBuffer::min`] with their
//! own window size: the emergency policy uses a short window for
//! responsiveness, the view-distance policy a longer one for smoothing.
//!
//! Unavailable readings never reach the buffer (the sampler drops them), so a
//! skipped tick leaves the rolling average untouched instead of pulling it
//! towards zero.

use std::collections::VecDeque;
use std::time::Instant;

/// Default number of samples kept (one minute at 1 Hz).
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// A single validated TPS reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    /// When the reading was taken.
    pub timestamp: Instant,
    /// Ticks per second, always finite and `>= 0`.
    pub tps: f64,
}

impl MetricSample {
    /// Create a sample.
    pub fn new(timestamp: Instant, tps: f64) -> Self {
        Self { timestamp, tps }
    }
}

/// Fixed-capacity rolling window of [`MetricSample`]s.
///
/// Pushing onto a full buffer evicts the oldest sample first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// A capacity of zero is bumped to one so the buffer can always report
    /// the latest reading.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: MetricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Average TPS over the most recent `k` samples.
    ///
    /// Uses fewer samples when fewer are held. Returns `None` when the buffer
    /// is empty or `k == 0`.
    pub fn average(&self, k: usize) -> Option<f64> {
        let n = k.min(self.samples.len());
        if n == 0 {
            return None;
        }
        let sum: f64 = self.recent(n).map(|s| s.tps).sum();
        Some(sum / n as f64)
    }

    /// Minimum TPS over the most recent `k` samples.
    pub fn min(&self, k: usize) -> Option<f64> {
        let n = k.min(self.samples.len());
        if n == 0 {
            return None;
        }
        self.recent(n).map(|s| s.tps).reduce(f64::min)
    }

    /// The most recently pushed sample.
    pub fn latest(&self) -> Option<MetricSample> {
        self.samples.back().copied()
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Change the capacity, evicting the oldest samples if it shrinks.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    fn recent(&self, n: usize) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter().skip(self.samples.len() - n)
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer_with(capacity: usize, values: &[f64]) -> HistoryBuffer {
        let now = Instant::now();
        let mut buffer = HistoryBuffer::new(capacity);
        for v in values {
            buffer.push(MetricSample::new(now, *v));
        }
        buffer
    }

    #[test]
    fn test_empty_buffer_is_unknown() {
        let buffer = HistoryBuffer::new(10);
        assert_eq!(buffer.average(5), None);
        assert_eq!(buffer.min(5), None);
        assert!(buffer.latest().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_window_is_unknown() {
        let buffer = buffer_with(10, &[20.0, 19.0]);
        assert_eq!(buffer.average(0), None);
        assert_eq!(buffer.min(0), None);
    }

    #[test]
    fn test_average_over_recent_window() {
        let buffer = buffer_with(10, &[10.0, 20.0, 18.0, 16.0]);
        assert_eq!(buffer.average(2), Some(17.0));
        assert_eq!(buffer.average(4), Some(16.0));
        // Window larger than the buffer uses what is there
        assert_eq!(buffer.average(100), Some(16.0));
    }

    #[test]
    fn test_min_over_recent_window() {
        let buffer = buffer_with(10, &[10.0, 20.0, 18.0, 16.0]);
        assert_eq!(buffer.min(3), Some(16.0));
        assert_eq!(buffer.min(4), Some(10.0));
    }

    #[test]
    fn test_oldest_sample_evicted_after_capacity_plus_one() {
        let buffer = buffer_with(3, &[1.0, 20.0, 20.0, 20.0]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.average(3), Some(20.0));
        assert_eq!(buffer.min(3), Some(20.0));
    }

    #[test]
    fn test_latest_tracks_last_push() {
        let buffer = buffer_with(3, &[12.0, 19.5]);
        assert_eq!(buffer.latest().map(|s| s.tps), Some(19.5));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let buffer = buffer_with(0, &[12.0, 13.0]);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.average(10), Some(13.0));
    }

    #[test]
    fn test_resize_evicts_oldest() {
        let mut buffer = buffer_with(5, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        buffer.resize(2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.min(2), Some(4.0));
    }

    #[test]
    fn test_clear() {
        let mut buffer = buffer_with(5, &[1.0, 2.0]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    proptest! {
        #[test]
        fn prop_length_never_exceeds_capacity(
            capacity in 1usize..100,
            values in prop::collection::vec(0.0f64..25.0, 0..300),
        ) {
            let buffer = buffer_with(capacity, &values);
            prop_assert!(buffer.len() <= capacity);
            prop_assert_eq!(buffer.len(), values.len().min(capacity));
        }

        #[test]
        fn prop_average_covers_only_retained_samples(
            capacity in 1usize..50,
            values in prop::collection::vec(0.0f64..25.0, 1..200),
        ) {
            let buffer = buffer_with(capacity, &values);
            let retained = &values[values.len().saturating_sub(capacity)..];
            let expected = retained.iter().sum::<f64>() / retained.len() as f64;
            let actual = buffer.average(capacity).unwrap();
            prop_assert!((actual - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_min_not_above_average(
            values in prop::collection::vec(0.0f64..25.0, 1..100),
            k in 1usize..100,
        ) {
            let buffer = buffer_with(100, &values);
            prop_assert!(buffer.min(k).unwrap() <= buffer.average(k).unwrap() + 1e-9);
        }
    }
}
