//! Mutable state owned by the control loop.

use std::time::Instant;

use crate::alert::LagAlerter;
use crate::cleanup::{CleanupReport, CleanupScheduler};
use crate::config::OptimizerConfig;
use crate::display::DisplayBroadcaster;
use crate::history::HistoryBuffer;
use crate::host::CleanupMode;
use crate::policy::{
    EmergencyDecision, EmergencyPolicy, EmergencyState, HealthHistory, ViewDistancePolicy,
    ViewDistanceState,
};
use crate::sampler::MetricSampler;
use crate::stats::OptimizationStats;

/// Everything the control loop mutates, guarded by one lock.
#[derive(Debug)]
pub struct ControlState {
    pub config: OptimizerConfig,
    pub sampler: MetricSampler,
    pub history: HistoryBuffer,
    pub health: HealthHistory,
    pub emergency: EmergencyPolicy,
    pub view_distance_policy: ViewDistancePolicy,
    pub view_distance: ViewDistanceState,
    /// Last automatic view distance evaluation.
    pub last_view_distance_adjust: Option<Instant>,
    /// The emergency pin to `min` has not been applied yet.
    pub pin_pending: bool,
    /// A manual view distance was set during the current episode.
    pub manual_override: bool,
    pub cleanup: CleanupScheduler,
    pub display: DisplayBroadcaster,
    pub alerter: LagAlerter,
    pub stats: OptimizationStats,
    /// Aggressive cleanup while an emergency episode is being mitigated.
    pub aggressive: bool,
    pub ticks: u64,
}

impl ControlState {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            sampler: MetricSampler::new(),
            history: HistoryBuffer::new(config.history.capacity),
            health: HealthHistory::new(),
            emergency: EmergencyPolicy::new(
                config.thresholds.tps_critical,
                config.thresholds.tps_warning,
            ),
            view_distance_policy: ViewDistancePolicy::from_config(&config),
            view_distance: ViewDistanceState::from_config(&config),
            last_view_distance_adjust: None,
            pin_pending: false,
            manual_override: false,
            cleanup: CleanupScheduler::new(
                config.optimization_interval(),
                config.optimizer.auto_optimize,
            ),
            display: DisplayBroadcaster::new(config.display_interval()),
            alerter: LagAlerter::new(config.thresholds.tps_critical, config.lag_alert_cooldown()),
            stats: OptimizationStats::default(),
            aggressive: false,
            ticks: 0,
            config,
        }
    }

    pub fn cleanup_mode(&self) -> CleanupMode {
        if self.aggressive {
            CleanupMode::Aggressive
        } else {
            CleanupMode::Standard
        }
    }

    /// Latest sample.
    pub fn instant_tps(&self) -> Option<f64> {
        self.history.latest().map(|s| s.tps)
    }

    /// Average over the emergency window.
    pub fn smoothed_tps(&self) -> Option<f64> {
        self.history.average(self.config.history.emergency_window)
    }

    pub fn emergency_state(&self) -> EmergencyState {
        self.emergency.state()
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The validated reading, if one was available.
    pub sample: Option<f64>,
    /// Why the reading was unavailable.
    pub metric_error: Option<String>,
    pub smoothed: Option<f64>,
    pub decision: Option<EmergencyDecision>,
    /// Emergency state after the tick.
    pub state: EmergencyState,
    /// View distance after the tick.
    pub view_distance: i32,
    pub view_distance_changed: bool,
    pub cleanup: Option<CleanupReport>,
    pub alert_sent: bool,
    pub display_pushes: usize,
    /// Host calls that failed during the tick.
    pub effector_errors: Vec<String>,
}

impl TickReport {
    pub(super) fn new(state: EmergencyState, view_distance: i32) -> Self {
        Self {
            sample: None,
            metric_error: None,
            smoothed: None,
            decision: None,
            state,
            view_distance,
            view_distance_changed: false,
            cleanup: None,
            alert_sent: false,
            display_pushes: 0,
            effector_errors: Vec::new(),
        }
    }

    /// Whether the reading was unavailable and policies were skipped.
    pub fn skipped(&self) -> bool {
        self.sample.is_none()
    }
}
