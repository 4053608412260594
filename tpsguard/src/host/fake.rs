//! In-memory host for tests and simulations.
//!
//! `FakeHost` implements every capability trait, records every call made
//! against it, and lets callers script readings and inject failures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;

use super::{
    ActorId, CleanupEffector, CleanupMode, MetricSource, PermissionCheck, SubscriberId,
    SubscriberSink, ViewDistanceEffector,
};
use crate::error::EffectorError;

/// One recorded cleanup effector call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupCall {
    Entities(CleanupMode),
    Chunks(CleanupMode),
    Memory,
}

#[derive(Debug, Default)]
struct FakeState {
    // Metric source
    scripted: VecDeque<Result<f64, EffectorError>>,
    steady_tps: Option<f64>,

    // View distance
    view_distance: Option<i32>,
    view_distance_calls: Vec<i32>,
    fail_view_distance: bool,
    view_distance_delay: Option<Duration>,

    // Cleanup
    cleanup_calls: Vec<CleanupCall>,
    entities_per_pass: u64,
    chunks_per_pass: u64,
    fail_entities: bool,
    fail_chunks: bool,
    fail_memory: bool,

    // Subscribers
    online: HashSet<SubscriberId>,
    failing_sends: HashSet<SubscriberId>,
    messages: Vec<(SubscriberId, String)>,
    admin_notices: Vec<String>,

    // Permissions
    grants: HashMap<ActorId, HashSet<String>>,
}

/// Scriptable, recording host.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Metric scripting
    // =========================================================================

    /// Report `tps` on every read once the script is exhausted.
    pub fn set_tps(&self, tps: f64) {
        self.state.lock().steady_tps = Some(tps);
    }

    /// Queue readings returned one per read, ahead of the steady value.
    pub fn push_readings(&self, readings: &[f64]) {
        let mut state = self.state.lock();
        state.scripted.extend(readings.iter().copied().map(Ok));
    }

    /// Make the next read fail.
    pub fn fail_next_reading(&self) {
        self.state
            .lock()
            .scripted
            .push_back(Err(EffectorError::Unavailable("metric offline".to_string())));
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    pub fn fail_view_distance(&self, fail: bool) {
        self.state.lock().fail_view_distance = fail;
    }

    /// Delay every view distance call, for deadline tests.
    pub fn delay_view_distance(&self, delay: Duration) {
        self.state.lock().view_distance_delay = Some(delay);
    }

    pub fn fail_entities(&self, fail: bool) {
        self.state.lock().fail_entities = fail;
    }

    pub fn fail_chunks(&self, fail: bool) {
        self.state.lock().fail_chunks = fail;
    }

    pub fn fail_memory(&self, fail: bool) {
        self.state.lock().fail_memory = fail;
    }

    /// Set the counts reported by each cleanup pass.
    pub fn set_cleanup_yield(&self, entities: u64, chunks: u64) {
        let mut state = self.state.lock();
        state.entities_per_pass = entities;
        state.chunks_per_pass = chunks;
    }

    // =========================================================================
    // Subscribers and permissions
    // =========================================================================

    pub fn connect(&self, id: impl Into<SubscriberId>) {
        self.state.lock().online.insert(id.into());
    }

    pub fn disconnect(&self, id: &SubscriberId) {
        self.state.lock().online.remove(id);
    }

    /// Make sends to `id` fail while it still reports online.
    pub fn fail_sends_to(&self, id: impl Into<SubscriberId>) {
        self.state.lock().failing_sends.insert(id.into());
    }

    pub fn grant(&self, actor: &ActorId, node: &str) {
        self.state
            .lock()
            .grants
            .entry(actor.clone())
            .or_default()
            .insert(node.to_string());
    }

    // =========================================================================
    // Recorded calls
    // =========================================================================

    /// The last view distance successfully applied.
    pub fn view_distance(&self) -> Option<i32> {
        self.state.lock().view_distance
    }

    /// Every view distance requested, including failed calls.
    pub fn view_distance_calls(&self) -> Vec<i32> {
        self.state.lock().view_distance_calls.clone()
    }

    pub fn cleanup_calls(&self) -> Vec<CleanupCall> {
        self.state.lock().cleanup_calls.clone()
    }

    /// Messages delivered to `id`, oldest first.
    pub fn messages_for(&self, id: &SubscriberId) -> Vec<String> {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|(to, _)| to == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn admin_notices(&self) -> Vec<String> {
        self.state.lock().admin_notices.clone()
    }
}

impl MetricSource for FakeHost {
    fn current_tps(&self) -> Result<f64, EffectorError> {
        let mut state = self.state.lock();
        if let Some(next) = state.scripted.pop_front() {
            return next;
        }
        state
            .steady_tps
            .ok_or_else(|| EffectorError::Unavailable("no reading scripted".to_string()))
    }
}

impl ViewDistanceEffector for FakeHost {
    fn set_view_distance(&self, chunks: i32) -> Result<(), EffectorError> {
        let delay = {
            let mut state = self.state.lock();
            state.view_distance_calls.push(chunks);
            state.view_distance_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        if state.fail_view_distance {
            return Err(EffectorError::Rejected("view distance locked".to_string()));
        }
        state.view_distance = Some(chunks);
        Ok(())
    }
}

impl CleanupEffector for FakeHost {
    fn clear_entities(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let mut state = self.state.lock();
        state.cleanup_calls.push(CleanupCall::Entities(mode));
        if state.fail_entities {
            return Err(EffectorError::Rejected("entity cleanup failed".to_string()));
        }
        Ok(state.entities_per_pass)
    }

    fn clear_chunks(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let mut state = self.state.lock();
        state.cleanup_calls.push(CleanupCall::Chunks(mode));
        if state.fail_chunks {
            return Err(EffectorError::Rejected("chunk cleanup failed".to_string()));
        }
        Ok(state.chunks_per_pass)
    }

    fn reclaim_memory(&self) -> Result<(), EffectorError> {
        let mut state = self.state.lock();
        state.cleanup_calls.push(CleanupCall::Memory);
        if state.fail_memory {
            return Err(EffectorError::Rejected("memory reclaim failed".to_string()));
        }
        Ok(())
    }
}

impl SubscriberSink for FakeHost {
    fn send(&self, id: &SubscriberId, text: &str) -> Result<(), EffectorError> {
        let mut state = self.state.lock();
        if !state.online.contains(id) || state.failing_sends.contains(id) {
            return Err(EffectorError::Unavailable(id.to_string()));
        }
        state.messages.push((id.clone(), text.to_string()));
        Ok(())
    }

    fn is_online(&self, id: &SubscriberId) -> bool {
        self.state.lock().online.contains(id)
    }

    fn notify_admins(&self, text: &str) {
        self.state.lock().admin_notices.push(text.to_string());
    }
}

impl PermissionCheck for FakeHost {
    fn has_permission(&self, actor: &ActorId, node: &str) -> bool {
        if *actor == ActorId::Console {
            return true;
        }
        self.state
            .lock()
            .grants
            .get(actor)
            .is_some_and(|nodes| nodes.contains(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_readings_come_before_steady_value() {
        let host = FakeHost::new();
        host.set_tps(20.0);
        host.push_readings(&[14.0, 15.0]);
        host.fail_next_reading();

        assert_eq!(host.current_tps(), Ok(14.0));
        assert_eq!(host.current_tps(), Ok(15.0));
        assert!(host.current_tps().is_err());
        assert_eq!(host.current_tps(), Ok(20.0));
    }

    #[test]
    fn test_unscripted_reading_is_unavailable() {
        assert!(FakeHost::new().current_tps().is_err());
    }

    #[test]
    fn test_failed_view_distance_is_recorded_but_not_applied() {
        let host = FakeHost::new();
        host.fail_view_distance(true);
        assert!(host.set_view_distance(6).is_err());
        assert_eq!(host.view_distance_calls(), vec![6]);
        assert_eq!(host.view_distance(), None);
    }

    #[test]
    fn test_send_requires_online_subscriber() {
        let host = FakeHost::new();
        let steve = SubscriberId::new("Steve");
        assert!(host.send(&steve, "hi").is_err());

        host.connect("Steve");
        host.send(&steve, "hi").unwrap();
        assert_eq!(host.messages_for(&steve), vec!["hi".to_string()]);
    }

    #[test]
    fn test_console_holds_every_permission() {
        let host = FakeHost::new();
        let alex = ActorId::player("Alex");
        assert!(host.has_permission(&ActorId::Console, "anything"));
        assert!(!host.has_permission(&alex, "serveropt.command.optimize"));

        host.grant(&alex, "serveropt.command.optimize");
        assert!(host.has_permission(&alex, "serveropt.command.optimize"));
    }
}
