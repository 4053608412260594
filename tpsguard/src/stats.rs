//! Running totals for the status report and session summary.

use serde::Serialize;

use crate::cleanup::CleanupReport;

/// Counters accumulated over the life of a control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationStats {
    /// Cleanup passes run (scheduled, forced or emergency).
    pub optimizations: u64,
    pub entities_removed: u64,
    pub chunks_cleared: u64,
    pub emergencies: u64,
    /// Ticks whose reading was unavailable.
    pub ticks_skipped: u64,
    /// View distance changes applied by the automatic policy.
    pub view_distance_changes: u64,
    /// Host calls that failed.
    pub effector_failures: u64,
}

impl OptimizationStats {
    pub fn record_cleanup(&mut self, report: &CleanupReport) {
        self.optimizations += 1;
        self.entities_removed += report.entities_removed;
        self.chunks_cleared += report.chunks_cleared;
        self.effector_failures += report.failures.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::CleanupScheduler;
    use crate::host::{CleanupMode, FakeHost};
    use std::time::{Duration, Instant};

    #[test]
    fn test_record_cleanup_accumulates() {
        let host = FakeHost::new();
        host.set_cleanup_yield(5, 2);
        host.fail_memory(true);
        let mut scheduler = CleanupScheduler::new(Duration::from_secs(60), true);
        let mut stats = OptimizationStats::default();

        for _ in 0..2 {
            let report = scheduler.run_now(Instant::now(), CleanupMode::Standard, &host);
            stats.record_cleanup(&report);
        }

        assert_eq!(stats.optimizations, 2);
        assert_eq!(stats.entities_removed, 10);
        assert_eq!(stats.chunks_cleared, 4);
        assert_eq!(stats.effector_failures, 2);
    }
}
