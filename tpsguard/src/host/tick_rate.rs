//! TPS derived from observed tick durations.
//!
//! For hosts that expose a per-tick callback but no TPS figure. Record how
//! long each tick took and read the rate back through [`MetricSource`].

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use super::MetricSource;
use crate::config::defaults::NOMINAL_TPS;
use crate::error::EffectorError;

/// Tick durations kept for the average.
pub const TICK_WINDOW: usize = 200;

/// Minimum recorded ticks before a rate is computed.
pub const MIN_TICKS: usize = 20;

/// Rolling average of tick durations exposed as a TPS reading.
///
/// Reports [`NOMINAL_TPS`] until [`MIN_TICKS`] durations are recorded and
/// never reports more than [`NOMINAL_TPS`].
#[derive(Debug, Default)]
pub struct TickRateMeter {
    durations: Mutex<VecDeque<Duration>>,
}

impl TickRateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the duration of one completed tick.
    pub fn record_tick(&self, duration: Duration) {
        let mut durations = self.durations.lock();
        if durations.len() == TICK_WINDOW {
            durations.pop_front();
        }
        durations.push_back(duration);
    }

    /// Current ticks per second.
    pub fn tps(&self) -> f64 {
        let durations = self.durations.lock();
        if durations.len() < MIN_TICKS {
            return NOMINAL_TPS;
        }

        let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
        let avg = total / durations.len() as f64;
        if avg <= 0.0 {
            return NOMINAL_TPS;
        }
        (1.0 / avg).min(NOMINAL_TPS)
    }

    /// Number of durations currently held.
    pub fn len(&self) -> usize {
        self.durations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.lock().is_empty()
    }
}

impl MetricSource for TickRateMeter {
    fn current_tps(&self) -> Result<f64, EffectorError> {
        Ok(self.tps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter_with(count: usize, millis: u64) -> TickRateMeter {
        let meter = TickRateMeter::new();
        for _ in 0..count {
            meter.record_tick(Duration::from_millis(millis));
        }
        meter
    }

    #[test]
    fn test_reports_nominal_until_warmed_up() {
        let meter = meter_with(MIN_TICKS - 1, 100);
        assert_eq!(meter.tps(), NOMINAL_TPS);
    }

    #[test]
    fn test_slow_ticks_lower_rate() {
        let meter = meter_with(MIN_TICKS, 100);
        assert!((meter.tps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_capped_at_nominal() {
        let meter = meter_with(MIN_TICKS, 10);
        assert_eq!(meter.tps(), NOMINAL_TPS);
    }

    #[test]
    fn test_zero_durations_report_nominal() {
        let meter = meter_with(MIN_TICKS, 0);
        assert_eq!(meter.tps(), NOMINAL_TPS);
    }

    #[test]
    fn test_window_is_bounded() {
        let meter = meter_with(TICK_WINDOW + 50, 50);
        assert_eq!(meter.len(), TICK_WINDOW);
    }

    #[test]
    fn test_metric_source_reads_rate() {
        let meter = meter_with(MIN_TICKS, 80);
        let tps = meter.current_tps().unwrap();
        assert!((tps - 12.5).abs() < 1e-9);
    }
}
