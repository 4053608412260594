//! Emergency load-shedding state machine.
//!
//! # State Machine
//!
//! ```text
//! Normal  --[instant < critical]--> Critical   (fires emergency)
//! Warning --[instant < critical]--> Critical   (fires emergency)
//! Normal  --[smoothed < warning]--> Warning    (schedules optimization)
//! Warning --[smoothed >= warning]--> Normal
//! Critical --[next evaluation]-->   Recovering
//! Recovering --[smoothed >= warning]--> Normal (restores view distance)
//! ```
//!
//! The critical check runs first and only from Normal or Warning, so one
//! episode fires the emergency sequence exactly once. Recovering absorbs
//! any further dips until the smoothed rate is back above warning.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

/// Emergency state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EmergencyState {
    #[default]
    Normal,
    Warning,
    Critical,
    Recovering,
}

impl EmergencyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyState::Normal => "Normal",
            EmergencyState::Warning => "Warning",
            EmergencyState::Critical => "Critical",
            EmergencyState::Recovering => "Recovering",
        }
    }

    /// Whether an emergency episode is in progress.
    ///
    /// While active the view distance is pinned to its minimum and cleanup
    /// runs in aggressive mode.
    pub fn is_episode(&self) -> bool {
        matches!(self, EmergencyState::Critical | EmergencyState::Recovering)
    }
}

impl fmt::Display for EmergencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tick input to the emergency policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricReading {
    /// The latest sample.
    pub instant: f64,
    /// Average over the emergency window.
    pub smoothed: f64,
}

/// Action the orchestrator must take after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyDecision {
    /// Nothing to do.
    Hold,
    /// Entered Critical: run the emergency sequence.
    FireEmergency,
    /// Entered Warning: run a scheduled optimization pass.
    ScheduleOptimization,
    /// Left Warning without an episode.
    WarningCleared,
    /// Episode over: restore view distance and standard cleanup.
    Recovered,
}

/// Emergency policy with its thresholds and current state.
#[derive(Debug, Clone)]
pub struct EmergencyPolicy {
    state: EmergencyState,
    tps_critical: f64,
    tps_warning: f64,
    entered_at: Option<Instant>,
}

impl EmergencyPolicy {
    pub fn new(tps_critical: f64, tps_warning: f64) -> Self {
        Self {
            state: EmergencyState::Normal,
            tps_critical,
            tps_warning,
            entered_at: None,
        }
    }

    pub fn state(&self) -> EmergencyState {
        self.state
    }

    /// When the current state was entered, if it ever changed.
    pub fn entered_at(&self) -> Option<Instant> {
        self.entered_at
    }

    /// Replace thresholds after a config reload. State is kept.
    pub fn set_thresholds(&mut self, tps_critical: f64, tps_warning: f64) {
        self.tps_critical = tps_critical;
        self.tps_warning = tps_warning;
    }

    /// Advance the state machine by one reading.
    pub fn evaluate(&mut self, now: Instant, reading: MetricReading) -> EmergencyDecision {
        let (next, decision) = self.next_state(reading);
        if next != self.state {
            tracing::info!(
                from = %self.state,
                to = %next,
                instant_tps = format!("{:.2}", reading.instant),
                smoothed_tps = format!("{:.2}", reading.smoothed),
                "Emergency state transition"
            );
            self.state = next;
            self.entered_at = Some(now);
        }
        decision
    }

    fn next_state(&self, reading: MetricReading) -> (EmergencyState, EmergencyDecision) {
        use EmergencyDecision::*;
        use EmergencyState::*;

        match self.state {
            Normal | Warning if reading.instant < self.tps_critical => (Critical, FireEmergency),
            Normal if reading.smoothed < self.tps_warning => (Warning, ScheduleOptimization),
            Normal => (Normal, Hold),
            Warning if reading.smoothed >= self.tps_warning => (Normal, WarningCleared),
            Warning => (Warning, Hold),
            Critical => (Recovering, Hold),
            Recovering if reading.smoothed >= self.tps_warning => (Normal, Recovered),
            Recovering => (Recovering, Hold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryBuffer, MetricSample};

    fn policy() -> EmergencyPolicy {
        EmergencyPolicy::new(15.0, 18.0)
    }

    fn reading(instant: f64, smoothed: f64) -> MetricReading {
        MetricReading { instant, smoothed }
    }

    /// Feed raw samples through a history buffer the way the control loop does.
    fn run_sequence(samples: &[f64], window: usize) -> (EmergencyPolicy, Vec<EmergencyDecision>) {
        let now = Instant::now();
        let mut history = HistoryBuffer::new(60);
        let mut policy = policy();
        let mut decisions = Vec::new();
        for tps in samples {
            history.push(MetricSample::new(now, *tps));
            let smoothed = history.average(window).unwrap();
            decisions.push(policy.evaluate(now, reading(*tps, smoothed)));
        }
        (policy, decisions)
    }

    #[test]
    fn test_emergency_fires_once_per_episode() {
        let (policy, decisions) = run_sequence(&[20.0, 20.0, 14.0, 14.0, 20.0], 5);
        let fired = decisions
            .iter()
            .filter(|d| **d == EmergencyDecision::FireEmergency)
            .count();
        assert_eq!(fired, 1);
        assert_eq!(decisions[2], EmergencyDecision::FireEmergency);
        // Average of the five samples is 17.6, still below warning
        assert_eq!(policy.state(), EmergencyState::Recovering);
    }

    #[test]
    fn test_short_dip_returns_to_normal() {
        let now = Instant::now();
        let mut p = policy();
        let mut states = Vec::new();
        let mut decisions = Vec::new();
        for tps in [20.0, 20.0, 14.0, 14.0, 20.0] {
            decisions.push(p.evaluate(now, reading(tps, tps)));
            states.push(p.state());
        }

        use EmergencyState::*;
        assert_eq!(states, vec![Normal, Normal, Critical, Recovering, Normal]);
        let fired = decisions
            .iter()
            .filter(|d| **d == EmergencyDecision::FireEmergency)
            .count();
        assert_eq!(fired, 1);
        assert_eq!(decisions[4], EmergencyDecision::Recovered);
    }

    #[test]
    fn test_critical_moves_to_recovering_next_tick() {
        let now = Instant::now();
        let mut p = policy();
        assert_eq!(p.evaluate(now, reading(10.0, 10.0)), EmergencyDecision::FireEmergency);
        assert_eq!(p.state(), EmergencyState::Critical);
        assert_eq!(p.evaluate(now, reading(10.0, 10.0)), EmergencyDecision::Hold);
        assert_eq!(p.state(), EmergencyState::Recovering);
    }

    #[test]
    fn test_no_refire_while_recovering() {
        let now = Instant::now();
        let mut p = policy();
        p.evaluate(now, reading(10.0, 10.0));
        p.evaluate(now, reading(10.0, 10.0));
        for _ in 0..5 {
            assert_eq!(p.evaluate(now, reading(5.0, 8.0)), EmergencyDecision::Hold);
        }
        assert_eq!(p.state(), EmergencyState::Recovering);
    }

    #[test]
    fn test_recovery_requires_smoothed_above_warning() {
        let now = Instant::now();
        let mut p = policy();
        p.evaluate(now, reading(10.0, 10.0));
        p.evaluate(now, reading(20.0, 16.0));
        assert_eq!(p.evaluate(now, reading(20.0, 17.9)), EmergencyDecision::Hold);
        assert_eq!(p.evaluate(now, reading(20.0, 18.0)), EmergencyDecision::Recovered);
        assert_eq!(p.state(), EmergencyState::Normal);
    }

    #[test]
    fn test_warning_entry_schedules_optimization() {
        let now = Instant::now();
        let mut p = policy();
        assert_eq!(
            p.evaluate(now, reading(17.0, 17.5)),
            EmergencyDecision::ScheduleOptimization
        );
        assert_eq!(p.state(), EmergencyState::Warning);
        // Staying in warning does not reschedule
        assert_eq!(p.evaluate(now, reading(17.0, 17.5)), EmergencyDecision::Hold);
        assert_eq!(p.evaluate(now, reading(19.0, 18.5)), EmergencyDecision::WarningCleared);
        assert_eq!(p.state(), EmergencyState::Normal);
    }

    #[test]
    fn test_critical_checked_before_warning() {
        let now = Instant::now();
        let mut p = policy();
        // Smoothed still healthy, but the instantaneous dip is critical
        assert_eq!(p.evaluate(now, reading(12.0, 19.0)), EmergencyDecision::FireEmergency);
    }

    #[test]
    fn test_warning_to_critical() {
        let now = Instant::now();
        let mut p = policy();
        p.evaluate(now, reading(17.0, 17.0));
        assert_eq!(p.evaluate(now, reading(14.0, 16.0)), EmergencyDecision::FireEmergency);
    }

    #[test]
    fn test_entered_at_tracks_transitions() {
        let now = Instant::now();
        let mut p = policy();
        assert!(p.entered_at().is_none());
        p.evaluate(now, reading(20.0, 20.0));
        assert!(p.entered_at().is_none());
        p.evaluate(now, reading(10.0, 10.0));
        assert_eq!(p.entered_at(), Some(now));
    }

    #[test]
    fn test_episode_states() {
        assert!(!EmergencyState::Normal.is_episode());
        assert!(!EmergencyState::Warning.is_episode());
        assert!(EmergencyState::Critical.is_episode());
        assert!(EmergencyState::Recovering.is_episode());
    }
}
