//! Periodic and on-demand resource reclamation.
//!
//! A pass runs three steps in a fixed order: entities, chunks, memory. A
//! failing step is logged and recorded in the report; the remaining steps
//! still run and the schedule advances regardless, so a broken effector
//! cannot cause a retry storm.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::EffectorError;
use crate::host::{CleanupEffector, CleanupMode};

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupReport {
    pub mode: CleanupMode,
    pub entities_removed: u64,
    pub chunks_cleared: u64,
    pub memory_reclaimed: bool,
    /// Steps that failed, by effector operation name.
    pub failures: Vec<(&'static str, EffectorError)>,
}

impl CleanupReport {
    fn new(mode: CleanupMode) -> Self {
        Self {
            mode,
            entities_removed: 0,
            chunks_cleared: 0,
            memory_reclaimed: false,
            failures: Vec::new(),
        }
    }

    /// Whether every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary for command replies.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Cleanup ({}) removed {} entities, cleared {} chunks",
            self.mode, self.entities_removed, self.chunks_cleared
        );
        if !self.failures.is_empty() {
            let failed: Vec<&str> = self.failures.iter().map(|(op, _)| *op).collect();
            text.push_str(&format!(" ({} failed)", failed.join(", ")));
        }
        text
    }
}

/// Schedule state exposed in status reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CleanupSchedule {
    pub interval_secs: u64,
    pub auto_enabled: bool,
    /// Seconds since the last pass, if one has run.
    pub last_run_secs_ago: Option<u64>,
}

/// Decides when cleanup runs and executes passes.
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    interval: Duration,
    last_run: Option<Instant>,
    auto_enabled: bool,
}

impl CleanupScheduler {
    pub fn new(interval: Duration, auto_enabled: bool) -> Self {
        Self {
            interval,
            last_run: None,
            auto_enabled,
        }
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn auto_enabled(&self) -> bool {
        self.auto_enabled
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn set_auto_enabled(&mut self, enabled: bool) {
        self.auto_enabled = enabled;
    }

    /// Whether a scheduled pass is due. A scheduler that never ran is due.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Run a pass if automatic cleanup is enabled and the interval elapsed.
    pub fn maybe_run(
        &mut self,
        now: Instant,
        mode: CleanupMode,
        effector: &dyn CleanupEffector,
    ) -> Option<CleanupReport> {
        if !self.auto_enabled || !self.is_due(now) {
            return None;
        }
        Some(self.run_now(now, mode, effector))
    }

    /// Run a pass unconditionally.
    pub fn run_now(
        &mut self,
        now: Instant,
        mode: CleanupMode,
        effector: &dyn CleanupEffector,
    ) -> CleanupReport {
        let mut report = CleanupReport::new(mode);

        match effector.clear_entities(mode) {
            Ok(n) => report.entities_removed = n,
            Err(e) => {
                tracing::warn!(error = %e, mode = %mode, "Entity cleanup failed");
                report.failures.push(("clear_entities", e));
            }
        }

        match effector.clear_chunks(mode) {
            Ok(n) => report.chunks_cleared = n,
            Err(e) => {
                tracing::warn!(error = %e, mode = %mode, "Chunk cleanup failed");
                report.failures.push(("clear_chunks", e));
            }
        }

        match effector.reclaim_memory() {
            Ok(()) => report.memory_reclaimed = true,
            Err(e) => {
                tracing::warn!(error = %e, "Memory reclaim failed");
                report.failures.push(("reclaim_memory", e));
            }
        }

        self.last_run = Some(now);

        tracing::info!(
            mode = %mode,
            entities_removed = report.entities_removed,
            chunks_cleared = report.chunks_cleared,
            failures = report.failures.len(),
            "Cleanup pass complete"
        );
        report
    }

    /// Snapshot for status output.
    pub fn schedule(&self, now: Instant) -> CleanupSchedule {
        CleanupSchedule {
            interval_secs: self.interval.as_secs(),
            auto_enabled: self.auto_enabled,
            last_run_secs_ago: self
                .last_run
                .map(|last| now.saturating_duration_since(last).as_secs()),
        }
    }
}
