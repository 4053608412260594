//! Metric sampling.
//!
//! Pulls one reading per tick from the host and rejects anything that would
//! poison the rolling history.

use std::time::Instant;

use crate::error::{ControlError, ControlResult};
use crate::history::MetricSample;
use crate::host::MetricSource;

/// Reads and validates the host TPS.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricSampler;

impl MetricSampler {
    pub fn new() -> Self {
        Self
    }

    /// Take one sample.
    ///
    /// NaN, infinite and negative values, and failed reads, return
    /// [`ControlError::MetricUnavailable`]. Nothing is recorded either way;
    /// pushing into history is the caller's job.
    pub fn sample(&self, now: Instant, source: &dyn MetricSource) -> ControlResult<MetricSample> {
        let tps = match source.current_tps() {
            Ok(tps) => tps,
            Err(e) => {
                tracing::warn!(error = %e, "TPS read failed");
                return Err(ControlError::MetricUnavailable(e.to_string()));
            }
        };

        if !tps.is_finite() || tps < 0.0 {
            tracing::warn!(value = %tps, "Discarding invalid TPS reading");
            return Err(ControlError::MetricUnavailable(format!(
                "invalid reading {}",
                tps
            )));
        }

        tracing::trace!(tps = format!("{:.2}", tps), "TPS sampled");
        Ok(MetricSample::new(now, tps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;

    fn sample_value(value: f64) -> ControlResult<MetricSample> {
        let host = FakeHost::new();
        host.set_tps(value);
        MetricSampler::new().sample(Instant::now(), &host)
    }

    #[test]
    fn test_valid_reading() {
        let sample = sample_value(19.25).unwrap();
        assert_eq!(sample.tps, 19.25);
    }

    #[test]
    fn test_zero_is_valid() {
        assert!(sample_value(0.0).is_ok());
    }

    #[test]
    fn test_invalid_readings_are_unavailable() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            let err = sample_value(value).unwrap_err();
            assert!(matches!(err, ControlError::MetricUnavailable(_)), "{}", value);
        }
    }

    #[test]
    fn test_read_failure_is_unavailable() {
        let host = FakeHost::new();
        host.fail_next_reading();
        let err = MetricSampler::new()
            .sample(Instant::now(), &host)
            .unwrap_err();
        assert!(matches!(err, ControlError::MetricUnavailable(_)));
    }
}
