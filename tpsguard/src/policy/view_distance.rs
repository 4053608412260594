//! Dynamic view distance.
//!
//! Maps smoothed TPS to a target view distance:
//!
//! ```text
//! tps <= critical          -> min
//! tps >= target            -> max
//! critical < tps < target  -> linear between min and max (floored)
//! ```
//!
//! A hysteresis band keeps the current value whenever it is reachable from
//! anywhere within `tps ± band`, so readings hovering around a breakpoint
//! do not flap the setting. An optional step limit bounds each change.

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::error::{ControlError, ControlResult};

/// View distance bounds and the value currently applied.
///
/// `min <= current <= max` and `min <= base <= max` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewDistanceState {
    pub current: i32,
    pub min: i32,
    pub max: i32,
    pub base: i32,
    pub auto_enabled: bool,
}

impl ViewDistanceState {
    /// Initial state from config. Starts at `base`.
    pub fn from_config(config: &OptimizerConfig) -> Self {
        let vd = &config.view_distance;
        Self {
            current: vd.base,
            min: vd.min,
            max: vd.max,
            base: vd.base,
            auto_enabled: vd.auto,
        }
    }

    /// Check a manually requested value against the bounds.
    pub fn validate(&self, chunks: i32) -> ControlResult<()> {
        if chunks < self.min || chunks > self.max {
            return Err(ControlError::Validation(format!(
                "View distance must be between {} and {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Adopt new bounds after a reload, clamping `current` into them.
    ///
    /// Returns `true` when `current` had to move.
    pub fn rebound(&mut self, min: i32, max: i32, base: i32) -> bool {
        self.min = min;
        self.max = max;
        self.base = base.clamp(min, max);
        let clamped = self.current.clamp(min, max);
        let moved = clamped != self.current;
        self.current = clamped;
        moved
    }
}

/// Pure view distance decision function.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDistancePolicy {
    tps_critical: f64,
    tps_target: f64,
    hysteresis: f64,
    max_step: i32,
}

impl ViewDistancePolicy {
    pub fn new(tps_critical: f64, tps_target: f64, hysteresis: f64, max_step: i32) -> Self {
        Self {
            tps_critical,
            tps_target,
            hysteresis: hysteresis.max(0.0),
            max_step: max_step.max(0),
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(
            config.thresholds.tps_critical,
            config.thresholds.tps_target,
            config.view_distance.hysteresis,
            config.view_distance.max_step,
        )
    }

    /// Target view distance for `smoothed` TPS given the current state.
    ///
    /// Always within `[state.min, state.max]` and non-decreasing in
    /// `smoothed` for a fixed `state.current`.
    pub fn decide(&self, smoothed: f64, state: &ViewDistanceState) -> i32 {
        let low = self.target_for(smoothed - self.hysteresis, state.min, state.max);
        let high = self.target_for(smoothed + self.hysteresis, state.min, state.max);
        let mut next = state.current.clamp(low, high);

        if self.max_step > 0 {
            next = next.clamp(
                state.current.saturating_sub(self.max_step),
                state.current.saturating_add(self.max_step),
            );
        }
        next.clamp(state.min, state.max)
    }

    /// The un-smoothed mapping from TPS to view distance.
    pub fn target_for(&self, tps: f64, min: i32, max: i32) -> i32 {
        if tps.is_nan() || tps <= self.tps_critical {
            return min;
        }
        if tps >= self.tps_target {
            return max;
        }

        let span = self.tps_target - self.tps_critical;
        if span <= 0.0 {
            return max;
        }
        let fraction = (tps - self.tps_critical) / span;
        let offset = (fraction * f64::from(max - min)).floor() as i32;
        (min + offset).clamp(min, max)
    }
}
