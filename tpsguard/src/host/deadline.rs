//! Per-call deadlines for host effectors.
//!
//! A hung host call must not stall the control loop. [`DeadlineHost`] runs
//! each wrapped call on the tokio blocking pool and waits for it with
//! `tokio::time::timeout`, reporting [`EffectorError::TimedOut`] on expiry.
//!
//! A capability whose previous call is still running is not called again:
//! the new call fails at once with [`EffectorError::Unavailable`]. A hung
//! host therefore holds at most one blocking thread per capability.
//!
//! The wrapped methods block the calling thread. Call them from synchronous
//! code or `spawn_blocking`, never from inside an async task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::warn;

use super::{
    CleanupEffector, CleanupMode, Host, MetricSource, SubscriberId, SubscriberSink,
    ViewDistanceEffector,
};
use crate::error::EffectorError;

/// Marks a capability as having a call in progress.
#[derive(Debug, Default)]
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn try_acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(&self.0)))
    }
}

/// Clears the flag when the call returns or unwinds.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wraps the effecting capabilities of a [`Host`] with a deadline.
///
/// Metric reads, view distance, cleanup and subscriber sends are bounded.
/// `is_online`, `notify_admins` and permission checks pass straight through.
pub struct DeadlineHost {
    inner: Host,
    timeout: Duration,
    runtime: Handle,
    metrics_busy: InFlight,
    view_distance_busy: InFlight,
    cleanup_busy: InFlight,
    send_busy: InFlight,
}

impl DeadlineHost {
    /// Wrap `inner` and return a host whose calls are bounded by `timeout`.
    ///
    /// Calls run on `runtime`'s blocking pool.
    pub fn wrap(inner: Host, timeout: Duration, runtime: Handle) -> Host {
        let permissions = inner.permissions.clone();
        let wrapped = Arc::new(Self {
            inner,
            timeout,
            runtime,
            metrics_busy: InFlight::default(),
            view_distance_busy: InFlight::default(),
            cleanup_busy: InFlight::default(),
            send_busy: InFlight::default(),
        });
        Host {
            metrics: wrapped.clone(),
            view_distance: wrapped.clone(),
            cleanup: wrapped.clone(),
            subscribers: wrapped,
            permissions,
        }
    }

    fn call<T, F>(&self, busy: &InFlight, operation: &'static str, f: F) -> Result<T, EffectorError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, EffectorError> + Send + 'static,
    {
        let Some(guard) = busy.try_acquire() else {
            warn!(operation, "Host call skipped, previous call still running");
            return Err(EffectorError::Unavailable(format!(
                "{} still running from an earlier call",
                operation
            )));
        };

        let task = self.runtime.spawn_blocking(move || {
            let _guard = guard;
            f()
        });

        match self.runtime.block_on(tokio::time::timeout(self.timeout, task)) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_panic() => Err(EffectorError::Unavailable(format!(
                "{} call panicked",
                operation
            ))),
            Ok(Err(e)) => Err(EffectorError::Unavailable(format!(
                "{} call did not complete: {}",
                operation, e
            ))),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Host call exceeded deadline"
                );
                Err(EffectorError::TimedOut(self.timeout.as_millis() as u64))
            }
        }
    }
}

impl MetricSource for DeadlineHost {
    fn current_tps(&self) -> Result<f64, EffectorError> {
        let metrics = self.inner.metrics.clone();
        self.call(&self.metrics_busy, "current_tps", move || metrics.current_tps())
    }
}

impl ViewDistanceEffector for DeadlineHost {
    fn set_view_distance(&self, chunks: i32) -> Result<(), EffectorError> {
        let effector = self.inner.view_distance.clone();
        self.call(&self.view_distance_busy, "set_view_distance", move || {
            effector.set_view_distance(chunks)
        })
    }
}

impl CleanupEffector for DeadlineHost {
    fn clear_entities(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let effector = self.inner.cleanup.clone();
        self.call(&self.cleanup_busy, "clear_entities", move || {
            effector.clear_entities(mode)
        })
    }

    fn clear_chunks(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let effector = self.inner.cleanup.clone();
        self.call(&self.cleanup_busy, "clear_chunks", move || effector.clear_chunks(mode))
    }

    fn reclaim_memory(&self) -> Result<(), EffectorError> {
        let effector = self.inner.cleanup.clone();
        self.call(&self.cleanup_busy, "reclaim_memory", move || effector.reclaim_memory())
    }
}

impl SubscriberSink for DeadlineHost {
    fn send(&self, id: &SubscriberId, text: &str) -> Result<(), EffectorError> {
        let sink = self.inner.subscribers.clone();
        let id = id.clone();
        let text = text.to_string();
        self.call(&self.send_busy, "send", move || sink.send(&id, &text))
    }

    fn is_online(&self, id: &SubscriberId) -> bool {
        self.inner.subscribers.is_online(id)
    }

    fn notify_admins(&self, text: &str) {
        self.inner.subscribers.notify_admins(text)
    }
}
