//! Async driver for the control loop.
//!
//! [`ControlDaemon`] ticks a shared [`ControlLoop`] on a fixed period until
//! cancelled. Each tick runs on the blocking pool (host calls are
//! synchronous) and is awaited before the next one is scheduled, so ticks
//! never overlap. A tick that panics is logged and counted; the daemon keeps
//! going.
//!
//! # Example
//!
//! ```ignore
//! let daemon = ControlDaemon::new(control, DaemonConfig::default());
//! let shutdown = CancellationToken::new();
//! let summary = daemon.run(shutdown.clone()).await;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::control::{ControlLoop, TickReport};

// =============================================================================
// Configuration
// =============================================================================

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Configuration for the control daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub tick_period: Duration,
    /// Stop after this many ticks. `None` runs until cancelled.
    pub max_ticks: Option<u64>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            max_ticks: None,
        }
    }
}

impl DaemonConfig {
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }
}

/// Totals reported when the daemon stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DaemonSummary {
    /// Ticks attempted, including ones that panicked.
    pub ticks: u64,
    /// Ticks that took longer than the period.
    pub overruns: u64,
    /// Ticks that panicked.
    pub panics: u64,
}

// =============================================================================
// Daemon
// =============================================================================

/// Periodic driver for a [`ControlLoop`].
pub struct ControlDaemon {
    control: Arc<ControlLoop>,
    config: DaemonConfig,
}

impl ControlDaemon {
    pub fn new(control: Arc<ControlLoop>, config: DaemonConfig) -> Self {
        Self { control, config }
    }

    pub fn control(&self) -> &Arc<ControlLoop> {
        &self.control
    }

    /// Run one tick on the blocking pool.
    ///
    /// A panic inside the tick comes back as the `JoinError`.
    pub async fn tick_once(&self) -> Result<TickReport, JoinError> {
        let control = Arc::clone(&self.control);
        tokio::task::spawn_blocking(move || control.tick(Instant::now())).await
    }

    /// Tick until `shutdown` is cancelled or `max_ticks` is reached.
    pub async fn run(self, shutdown: CancellationToken) -> DaemonSummary {
        info!(
            tick_period_ms = self.config.tick_period.as_millis() as u64,
            "Control daemon starting"
        );

        let mut interval = tokio::time::interval(self.config.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut summary = DaemonSummary::default();

        loop {
            if self
                .config
                .max_ticks
                .is_some_and(|max| summary.ticks >= max)
            {
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Control daemon shutting down");
                    break;
                }

                _ = interval.tick() => {}
            }

            let started = Instant::now();
            // Cancellation mid-tick still waits for the tick to finish
            let result = self.tick_once().await;
            summary.ticks += 1;

            match result {
                Ok(report) => {
                    debug!(
                        tick = summary.ticks,
                        tps = ?report.sample,
                        state = %report.state,
                        view_distance = report.view_distance,
                        "Tick complete"
                    );
                }
                Err(e) if e.is_panic() => {
                    summary.panics += 1;
                    error!(tick = summary.ticks, "Control tick panicked");
                }
                Err(e) => {
                    warn!(tick = summary.ticks, error = %e, "Control tick did not complete");
                }
            }

            let elapsed = started.elapsed();
            if elapsed > self.config.tick_period {
                summary.overruns += 1;
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    period_ms = self.config.tick_period.as_millis() as u64,
                    "Control tick overran its period"
                );
            }
        }

        info!(
            ticks = summary.ticks,
            overruns = summary.overruns,
            panics = summary.panics,
            "Control daemon stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::error::EffectorError;
    use crate::host::{FakeHost, Host, MetricSource};

    struct PanickingSource;

    impl MetricSource for PanickingSource {
        fn current_tps(&self) -> Result<f64, EffectorError> {
            panic!("metric source exploded");
        }
    }

    fn control_with(host: Host) -> Arc<ControlLoop> {
        Arc::new(ControlLoop::new(OptimizerConfig::default(), host).unwrap())
    }

    #[tokio::test]
    async fn test_tick_once_returns_report() {
        let fake = Arc::new(FakeHost::new());
        fake.set_tps(19.8);
        let daemon = ControlDaemon::new(
            control_with(Host::from_shared(fake)),
            DaemonConfig::default(),
        );

        let report = daemon.tick_once().await.unwrap();
        assert_eq!(report.sample, Some(19.8));
    }

    #[tokio::test]
    async fn test_run_stops_after_max_ticks() {
        let fake = Arc::new(FakeHost::new());
        fake.set_tps(20.0);
        let config = DaemonConfig::default()
            .with_tick_period(Duration::from_millis(5))
            .with_max_ticks(3);
        let daemon = ControlDaemon::new(control_with(Host::from_shared(fake)), config);

        let summary = daemon.run(CancellationToken::new()).await;
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.panics, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let fake = Arc::new(FakeHost::new());
        let daemon = ControlDaemon::new(
            control_with(Host::from_shared(fake)),
            DaemonConfig::default(),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let summary = daemon.run(shutdown).await;
        assert_eq!(summary.ticks, 0);
    }

    #[tokio::test]
    async fn test_panicking_tick_is_contained() {
        let fake = Arc::new(FakeHost::new());
        let host = Host::from_shared(fake).with_metrics(Arc::new(PanickingSource));
        let control = control_with(host);
        let config = DaemonConfig::default()
            .with_tick_period(Duration::from_millis(5))
            .with_max_ticks(2);

        let summary = ControlDaemon::new(Arc::clone(&control), config)
            .run(CancellationToken::new())
            .await;
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.panics, 2);

        // The state lock is still usable afterwards
        assert_eq!(control.stats().ticks_skipped, 0);
    }
}
