//! Admin lag alerts.

use std::time::{Duration, Instant};

use crate::host::SubscriberSink;

/// Notifies admins when TPS is critical, at most once per cooldown.
#[derive(Debug, Clone)]
pub struct LagAlerter {
    tps_critical: f64,
    cooldown: Duration,
    last_alert: Option<Instant>,
}

impl LagAlerter {
    pub fn new(tps_critical: f64, cooldown: Duration) -> Self {
        Self {
            tps_critical,
            cooldown,
            last_alert: None,
        }
    }

    pub fn reconfigure(&mut self, tps_critical: f64, cooldown: Duration) {
        self.tps_critical = tps_critical;
        self.cooldown = cooldown;
    }

    /// Alert if `tps` is critical and the cooldown has passed.
    ///
    /// Returns `true` when a notice was sent.
    pub fn check(&mut self, now: Instant, tps: f64, sink: &dyn SubscriberSink) -> bool {
        if tps >= self.tps_critical {
            return false;
        }
        if let Some(last) = self.last_alert {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }

        self.last_alert = Some(now);
        tracing::warn!(tps = format!("{:.2}", tps), "Lag alert sent to admins");
        sink.notify_admins(&format!(
            "[TPSGuard] Lag alert: TPS is {:.1} (critical below {:.1})",
            tps, self.tps_critical
        ));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;

    #[test]
    fn test_no_alert_when_healthy() {
        let host = FakeHost::new();
        let mut alerter = LagAlerter::new(15.0, Duration::from_secs(60));
        assert!(!alerter.check(Instant::now(), 19.0, &host));
        assert!(host.admin_notices().is_empty());
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let host = FakeHost::new();
        let mut alerter = LagAlerter::new(15.0, Duration::from_secs(60));
        let start = Instant::now();

        assert!(alerter.check(start, 10.0, &host));
        assert!(!alerter.check(start + Duration::from_secs(30), 10.0, &host));
        assert!(alerter.check(start + Duration::from_secs(60), 10.0, &host));
        assert_eq!(host.admin_notices().len(), 2);
        assert!(host.admin_notices()[0].contains("10.0"));
    }
}
