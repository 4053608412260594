//! The control loop.
//!
//! `ControlLoop` owns every piece of mutable state in a single
//! [`ControlState`] behind one mutex. Ticks and commands both take that lock,
//! so a command always observes a state between two ticks, never one in the
//! middle of a decision.
//!
//! # Tick Order
//!
//! ```text
//! sample -> history push -> emergency policy -> view distance policy
//!        -> scheduled cleanup -> lag alert -> display push
//! ```
//!
//! An unavailable reading skips the two policy steps. Cleanup and display
//! still run so scheduled work is not starved by a flaky metric source.

mod state;
mod status;

use std::path::PathBuf;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::cleanup::CleanupReport;
use crate::command;
use crate::config::{config_file_path, OptimizerConfig};
use crate::error::{ControlError, ControlResult};
use crate::host::{ActorId, CleanupMode, Host, SubscriberId};
use crate::policy::{
    EmergencyDecision, EmergencyState, MetricReading, ViewDistancePolicy, ViewDistanceState,
};
use crate::stats::OptimizationStats;

pub use state::{ControlState, TickReport};
pub use status::StatusSnapshot;

/// State-owning orchestrator for sampling, policies and effectors.
pub struct ControlLoop {
    host: Host,
    state: Mutex<ControlState>,
    config_path: Option<PathBuf>,
    started_at: Instant,
}

impl std::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("config_path", &self.config_path)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ControlLoop {
    /// Create a control loop over `host`.
    ///
    /// The config is validated first. The view distance starts at `base`;
    /// it is not pushed to the host until a policy or command changes it.
    pub fn new(config: OptimizerConfig, host: Host) -> ControlResult<Self> {
        config.validate()?;
        info!(
            auto_optimize = config.optimizer.auto_optimize,
            base_view_distance = config.view_distance.base,
            tps_critical = config.thresholds.tps_critical,
            tps_warning = config.thresholds.tps_warning,
            "Control loop created"
        );
        Ok(Self {
            host,
            state: Mutex::new(ControlState::new(config)),
            config_path: None,
            started_at: Instant::now(),
        })
    }

    /// Path `/optimize reload` reads from. Defaults to ~/.tpsguard/config.ini.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config_file_path)
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Run one control step.
    pub fn tick(&self, now: Instant) -> TickReport {
        let mut state = self.state.lock();
        state.ticks += 1;

        let mut report = TickReport::new(state.emergency_state(), state.view_distance.current);

        let sampled = state.sampler.sample(now, self.host.metrics.as_ref());
        match sampled {
            Ok(sample) => {
                state.history.push(sample);
                state.health.record(sample.tps);
                report.sample = Some(sample.tps);
                self.run_policies(&mut state, now, sample.tps, &mut report);
            }
            Err(e) => {
                state.stats.ticks_skipped += 1;
                report.metric_error = Some(e.to_string());
            }
        }

        if report.cleanup.is_none() {
            let mode = state.cleanup_mode();
            let scheduled = state
                .cleanup
                .maybe_run(now, mode, self.host.cleanup.as_ref());
            if let Some(cleanup) = scheduled {
                self.record_cleanup(&mut state, &cleanup, &mut report);
                report.cleanup = Some(cleanup);
            }
        }

        if let Some(tps) = report.sample {
            report.alert_sent = state
                .alerter
                .check(now, tps, self.host.subscribers.as_ref());
        }

        let text = status::display_line(&state);
        report.display_pushes = state
            .display
            .tick(now, &text, self.host.subscribers.as_ref());

        report.state = state.emergency_state();
        report.view_distance = state.view_distance.current;
        report
    }

    fn run_policies(
        &self,
        state: &mut ControlState,
        now: Instant,
        instant: f64,
        report: &mut TickReport,
    ) {
        let Some(smoothed) = state.smoothed_tps() else {
            return;
        };
        report.smoothed = Some(smoothed);

        let decision = state
            .emergency
            .evaluate(now, MetricReading { instant, smoothed });
        report.decision = Some(decision);
        self.apply_emergency(state, now, decision, instant, report);

        if state.emergency_state().is_episode() {
            if state.pin_pending {
                self.pin_view_distance(state, report);
            }
        } else {
            self.adjust_view_distance(state, now, report);
        }
    }

    fn apply_emergency(
        &self,
        state: &mut ControlState,
        now: Instant,
        decision: EmergencyDecision,
        instant: f64,
        report: &mut TickReport,
    ) {
        match decision {
            EmergencyDecision::Hold | EmergencyDecision::WarningCleared => {}
            EmergencyDecision::FireEmergency => {
                state.stats.emergencies += 1;
                if !state.config.optimizer.auto_optimize {
                    warn!(
                        tps = format!("{:.2}", instant),
                        "Critical TPS, automatic mitigation disabled"
                    );
                    self.host.subscribers.notify_admins(&format!(
                        "[TPSGuard] Critical TPS {:.1}. Auto-optimize is off; no action taken.",
                        instant
                    ));
                    return;
                }

                warn!(
                    tps = format!("{:.2}", instant),
                    min_view_distance = state.view_distance.min,
                    "Emergency mitigation started"
                );
                state.aggressive = true;
                state.pin_pending = true;
                state.manual_override = false;
                self.pin_view_distance(state, report);

                let cleanup =
                    state
                        .cleanup
                        .run_now(now, CleanupMode::Aggressive, self.host.cleanup.as_ref());
                self.record_cleanup(state, &cleanup, report);
                report.cleanup = Some(cleanup);

                self.host.subscribers.notify_admins(&format!(
                    "[TPSGuard] Emergency: TPS dropped to {:.1}. View distance reduced to {}, aggressive cleanup running.",
                    instant, state.view_distance.min
                ));
            }
            EmergencyDecision::ScheduleOptimization => {
                if !state.config.optimizer.auto_optimize {
                    return;
                }
                info!("TPS below warning threshold, running optimization pass");
                let mode = state.cleanup_mode();
                let cleanup = state
                    .cleanup
                    .run_now(now, mode, self.host.cleanup.as_ref());
                self.record_cleanup(state, &cleanup, report);
                report.cleanup = Some(cleanup);
            }
            EmergencyDecision::Recovered => {
                state.aggressive = false;
                state.pin_pending = false;
                // Hold the restored base for one adjust interval
                state.last_view_distance_adjust = Some(now);
                let base = state.view_distance.base;
                if std::mem::take(&mut state.manual_override) {
                    info!(
                        view_distance = state.view_distance.current,
                        "Keeping view distance set during emergency"
                    );
                } else if state.view_distance.current != base {
                    match self.host.view_distance.set_view_distance(base) {
                        Ok(()) => {
                            state.view_distance.current = base;
                            report.view_distance_changed = true;
                        }
                        Err(e) => {
                            warn!(error = %e, view_distance = base, "Failed to restore view distance");
                            state.stats.effector_failures += 1;
                            report
                                .effector_errors
                                .push(ControlError::effector("set_view_distance", e).to_string());
                        }
                    }
                }
                info!(view_distance = state.view_distance.current, "Recovered from emergency");
            }
        }
    }

    /// Apply the emergency floor. Retried on later ticks until it succeeds.
    fn pin_view_distance(&self, state: &mut ControlState, report: &mut TickReport) {
        let min = state.view_distance.min;
        if state.view_distance.current == min {
            state.pin_pending = false;
            return;
        }
        match self.host.view_distance.set_view_distance(min) {
            Ok(()) => {
                state.view_distance.current = min;
                state.pin_pending = false;
                report.view_distance_changed = true;
            }
            Err(e) => {
                warn!(error = %e, view_distance = min, "Failed to apply emergency view distance");
                state.stats.effector_failures += 1;
                report
                    .effector_errors
                    .push(ControlError::effector("set_view_distance", e).to_string());
            }
        }
    }

    fn adjust_view_distance(&self, state: &mut ControlState, now: Instant, report: &mut TickReport) {
        if !state.view_distance.auto_enabled {
            return;
        }
        if let Some(last) = state.last_view_distance_adjust {
            if now.saturating_duration_since(last) < state.config.view_distance_adjust_interval() {
                return;
            }
        }
        let Some(smoothed) = state
            .history
            .average(state.config.history.view_distance_window)
        else {
            return;
        };

        let current = state.view_distance.current;
        let target = state.view_distance_policy.decide(smoothed, &state.view_distance);
        if target == current {
            state.last_view_distance_adjust = Some(now);
            return;
        }

        match self.host.view_distance.set_view_distance(target) {
            Ok(()) => {
                info!(
                    from = current,
                    to = target,
                    smoothed_tps = format!("{:.2}", smoothed),
                    "View distance adjusted"
                );
                state.view_distance.current = target;
                state.last_view_distance_adjust = Some(now);
                state.stats.view_distance_changes += 1;
                report.view_distance_changed = true;
            }
            Err(e) => {
                warn!(error = %e, target, "View distance adjustment failed");
                state.stats.effector_failures += 1;
                report
                    .effector_errors
                    .push(ControlError::effector("set_view_distance", e).to_string());
            }
        }
    }

    fn record_cleanup(
        &self,
        state: &mut ControlState,
        cleanup: &CleanupReport,
        report: &mut TickReport,
    ) {
        state.stats.record_cleanup(cleanup);
        for (operation, e) in &cleanup.failures {
            report
                .effector_errors
                .push(ControlError::effector(*operation, e.clone()).to_string());
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Parse and run a command line on behalf of `actor`.
    pub fn execute(&self, now: Instant, actor: &ActorId, line: &str) -> ControlResult<String> {
        command::execute(self, now, actor, line)
    }

    /// Snapshot of the current state.
    pub fn status(&self, now: Instant) -> StatusSnapshot {
        let state = self.state.lock();
        StatusSnapshot::capture(&state, self.started_at, now)
    }

    pub fn emergency_state(&self) -> EmergencyState {
        self.state.lock().emergency_state()
    }

    pub fn view_distance(&self) -> ViewDistanceState {
        self.state.lock().view_distance
    }

    pub fn stats(&self) -> OptimizationStats {
        self.state.lock().stats
    }

    pub fn config(&self) -> OptimizerConfig {
        self.state.lock().config.clone()
    }

    /// Latest sample and the emergency-window average.
    pub fn tps(&self) -> (Option<f64>, Option<f64>) {
        let state = self.state.lock();
        (state.instant_tps(), state.smoothed_tps())
    }

    pub fn last_cleanup(&self) -> Option<Instant> {
        self.state.lock().cleanup.last_run()
    }

    /// Run a cleanup pass now, in the current mode.
    pub fn optimize_now(&self, now: Instant) -> CleanupReport {
        let mut state = self.state.lock();
        let mode = state.cleanup_mode();
        let report = state
            .cleanup
            .run_now(now, mode, self.host.cleanup.as_ref());
        state.stats.record_cleanup(&report);
        report
    }

    /// Manually set the view distance and disable automatic adjustment.
    ///
    /// Out-of-range values and host failures leave the state unchanged.
    pub fn set_view_distance(&self, chunks: i32) -> ControlResult<()> {
        let mut state = self.state.lock();
        state.view_distance.validate(chunks)?;
        self.host
            .view_distance
            .set_view_distance(chunks)
            .map_err(|e| ControlError::effector("set_view_distance", e))?;

        state.view_distance.current = chunks;
        state.view_distance.auto_enabled = false;
        state.pin_pending = false;
        if state.emergency_state().is_episode() {
            state.manual_override = true;
        }
        info!(view_distance = chunks, "View distance set manually");
        Ok(())
    }

    /// Flip automatic view distance. Returns the new setting.
    pub fn toggle_auto_view_distance(&self) -> bool {
        let mut state = self.state.lock();
        let enabled = !state.view_distance.auto_enabled;
        state.view_distance.auto_enabled = enabled;
        state.last_view_distance_adjust = None;
        info!(enabled, "Automatic view distance toggled");
        enabled
    }

    /// Toggle the status display for `target`. Returns `true` if now shown.
    ///
    /// Subscribing requires the target to be online; unsubscribing does not.
    pub fn toggle_display(&self, target: SubscriberId) -> ControlResult<bool> {
        let mut state = self.state.lock();
        if !state.display.contains(&target) && !self.host.subscribers.is_online(&target) {
            return Err(ControlError::Validation(format!(
                "Player '{}' is not online",
                target
            )));
        }
        Ok(state.display.toggle(target))
    }

    pub fn display_subscribers(&self) -> Vec<SubscriberId> {
        self.state.lock().display.subscribers()
    }

    /// Forget a disconnected subscriber.
    pub fn on_subscriber_quit(&self, id: &SubscriberId) {
        if self.state.lock().display.remove(id) {
            tracing::debug!(subscriber = %id, "Display subscriber left");
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Reload the config file. On failure the running config is kept.
    pub fn reload(&self) -> ControlResult<()> {
        let path = self.config_path();
        let config = OptimizerConfig::load_from(&path)?;
        self.reload_config(config)?;
        info!(path = %path.display(), "Configuration reloaded");
        Ok(())
    }

    /// Replace the running config wholesale.
    ///
    /// History and statistics are kept. View distance bounds are re-clamped
    /// and pushed to the host if `current` moved. Auto flags revert to the
    /// new config's values.
    pub fn reload_config(&self, config: OptimizerConfig) -> ControlResult<()> {
        config.validate()?;

        let mut state = self.state.lock();
        state.history.resize(config.history.capacity);
        state.emergency.set_thresholds(
            config.thresholds.tps_critical,
            config.thresholds.tps_warning,
        );
        state.view_distance_policy = ViewDistancePolicy::from_config(&config);
        state.view_distance.auto_enabled = config.view_distance.auto;

        let before = state.view_distance.current;
        if state.view_distance.rebound(
            config.view_distance.min,
            config.view_distance.max,
            config.view_distance.base,
        ) {
            let clamped = state.view_distance.current;
            if let Err(e) = self.host.view_distance.set_view_distance(clamped) {
                warn!(
                    error = %e,
                    from = before,
                    to = clamped,
                    "Failed to apply clamped view distance"
                );
                state.stats.effector_failures += 1;
            }
        }

        state.cleanup.set_interval(config.optimization_interval());
        state.cleanup.set_auto_enabled(config.optimizer.auto_optimize);
        state.display.set_interval(config.display_interval());
        state
            .alerter
            .reconfigure(config.thresholds.tps_critical, config.lag_alert_cooldown());
        state.config = config;
        Ok(())
    }
}
