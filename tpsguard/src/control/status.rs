//! Point-in-time status of the control loop.

use std::time::Instant;

use serde::Serialize;

use super::state::ControlState;
use crate::cleanup::CleanupSchedule;
use crate::policy::{health_score, EmergencyState, TpsGrade, ViewDistanceState};
use crate::stats::OptimizationStats;

/// Serializable status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub uptime_secs: u64,
    pub ticks: u64,
    pub tps_instant: Option<f64>,
    pub tps_smoothed: Option<f64>,
    pub grade: Option<TpsGrade>,
    pub health: Option<u8>,
    pub average_health: Option<f64>,
    pub state: EmergencyState,
    /// Seconds since the last state change, if there has been one.
    pub state_secs: Option<u64>,
    pub aggressive_mode: bool,
    pub view_distance: ViewDistanceState,
    pub cleanup: CleanupSchedule,
    pub viewers: usize,
    pub history_len: usize,
    pub stats: OptimizationStats,
}

impl StatusSnapshot {
    pub(super) fn capture(state: &ControlState, started_at: Instant, now: Instant) -> Self {
        let smoothed = state.smoothed_tps();
        Self {
            uptime_secs: now.saturating_duration_since(started_at).as_secs(),
            ticks: state.ticks,
            tps_instant: state.instant_tps(),
            tps_smoothed: smoothed,
            grade: smoothed.map(TpsGrade::from_tps),
            health: smoothed.map(health_score),
            average_health: state.health.average(),
            state: state.emergency_state(),
            state_secs: state
                .emergency
                .entered_at()
                .map(|at| now.saturating_duration_since(at).as_secs()),
            aggressive_mode: state.aggressive,
            view_distance: state.view_distance,
            cleanup: state.cleanup.schedule(now),
            viewers: state.display.len(),
            history_len: state.history.len(),
            stats: state.stats,
        }
    }

    /// Multi-line report for `/optimize status`.
    pub fn render(&self) -> String {
        let mut lines = vec!["=== TPSGuard Status ===".to_string()];
        match (self.tps_instant, self.tps_smoothed, self.grade) {
            (Some(instant), Some(smoothed), Some(grade)) => lines.push(format!(
                "TPS: {:.2} (avg {:.2}, {})",
                instant, smoothed, grade
            )),
            _ => lines.push("TPS: no data yet".to_string()),
        }
        if let Some(health) = self.health {
            let average = self.average_health.unwrap_or(f64::from(health));
            lines.push(format!("Health: {}/100 (avg {:.0})", health, average));
        }
        let since = match self.state_secs {
            Some(secs) => format!(" for {}s", secs),
            None => String::new(),
        };
        lines.push(format!(
            "State: {}{}{}",
            self.state,
            since,
            if self.aggressive_mode {
                " (aggressive cleanup)"
            } else {
                ""
            }
        ));
        lines.push(format!(
            "View distance: {} (range {}-{}, base {}, auto {})",
            self.view_distance.current,
            self.view_distance.min,
            self.view_distance.max,
            self.view_distance.base,
            on_off(self.view_distance.auto_enabled)
        ));
        let last_run = match self.cleanup.last_run_secs_ago {
            Some(secs) => format!("{}s ago", secs),
            None => "never".to_string(),
        };
        lines.push(format!(
            "Cleanup: every {}s, auto {}, last run {}",
            self.cleanup.interval_secs,
            on_off(self.cleanup.auto_enabled),
            last_run
        ));
        lines.push(format!(
            "Optimizations: {} | Entities removed: {} | Chunks cleared: {}",
            self.stats.optimizations, self.stats.entities_removed, self.stats.chunks_cleared
        ));
        lines.push(format!(
            "Emergencies: {} | Skipped ticks: {} | Viewers: {}",
            self.stats.emergencies, self.stats.ticks_skipped, self.viewers
        ));
        lines.push(format!("Uptime: {}s", self.uptime_secs));
        lines.join("\n")
    }
}

/// One-line status pushed to display subscribers.
pub(super) fn display_line(state: &ControlState) -> String {
    match state.smoothed_tps() {
        Some(tps) => format!(
            "TPS: {:.1} ({}) | Health: {} | VD: {} | {}",
            tps,
            TpsGrade::from_tps(tps),
            health_score(tps),
            state.view_distance.current,
            state.emergency_state()
        ),
        None => format!(
            "TPS: -- | VD: {} | {}",
            state.view_distance.current,
            state.emergency_state()
        ),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::history::MetricSample;
    use crate::policy::MetricReading;
    use std::time::Duration;

    fn state_with(tps: &[f64]) -> (ControlState, Instant) {
        let now = Instant::now();
        let mut state = ControlState::new(OptimizerConfig::default());
        for &value in tps {
            state.history.push(MetricSample {
                timestamp: now,
                tps: value,
            });
            state.health.record(value);
        }
        (state, now)
    }

    #[test]
    fn test_render_without_data() {
        let (state, now) = state_with(&[]);
        let text = StatusSnapshot::capture(&state, now, now).render();
        assert!(text.starts_with("=== TPSGuard Status ==="));
        assert!(text.contains("TPS: no data yet"));
        assert!(text.contains("last run never"));
    }

    #[test]
    fn test_render_with_readings() {
        let (state, now) = state_with(&[19.0, 19.0]);
        let snapshot = StatusSnapshot::capture(&state, now, now);
        assert_eq!(snapshot.tps_smoothed, Some(19.0));
        let text = snapshot.render();
        assert!(text.contains("TPS: 19.00 (avg 19.00"));
        assert!(text.contains("View distance: 8 (range 4-12, base 8"));
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let (state, now) = state_with(&[18.5]);
        let value = serde_json::to_value(StatusSnapshot::capture(&state, now, now)).unwrap();
        assert_eq!(value["state"], "Normal");
        assert_eq!(value["view_distance"]["current"], 8);
        assert_eq!(value["history_len"], 1);
    }

    #[test]
    fn test_state_age_follows_last_transition() {
        let (mut state, now) = state_with(&[]);
        assert_eq!(StatusSnapshot::capture(&state, now, now).state_secs, None);

        state.emergency.evaluate(
            now,
            MetricReading {
                instant: 10.0,
                smoothed: 10.0,
            },
        );
        let later = now + Duration::from_secs(42);
        let snapshot = StatusSnapshot::capture(&state, now, later);
        assert_eq!(snapshot.state_secs, Some(42));
        assert!(snapshot.render().contains("State: Critical for 42s"));
    }

    #[test]
    fn test_display_line_without_data() {
        let (state, _) = state_with(&[]);
        assert_eq!(display_line(&state), "TPS: -- | VD: 8 | Normal");
    }
}
