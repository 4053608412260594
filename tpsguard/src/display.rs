//! Per-subscriber status display.
//!
//! Subscribers get the status line every display interval, and immediately
//! on the first tick after they subscribe. A subscriber whose delivery fails
//! is dropped on the spot.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::host::{SubscriberId, SubscriberSink};

/// Pushes status text to subscribed viewers.
#[derive(Debug, Clone)]
pub struct DisplayBroadcaster {
    subscribers: HashSet<SubscriberId>,
    pending: HashSet<SubscriberId>,
    interval: Duration,
    last_push: Option<Instant>,
}

impl DisplayBroadcaster {
    pub fn new(interval: Duration) -> Self {
        Self {
            subscribers: HashSet::new(),
            pending: HashSet::new(),
            interval,
            last_push: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Add or remove `id`. Returns `true` if it is now subscribed.
    pub fn toggle(&mut self, id: SubscriberId) -> bool {
        if self.subscribers.remove(&id) {
            self.pending.remove(&id);
            false
        } else {
            self.pending.insert(id.clone());
            self.subscribers.insert(id);
            true
        }
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains(id)
    }

    /// Remove `id`. Returns whether it was subscribed.
    pub fn remove(&mut self, id: &SubscriberId) -> bool {
        self.pending.remove(id);
        self.subscribers.remove(id)
    }

    /// Subscribers in name order.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self.subscribers.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Whether a full push is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_push {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Deliver `text` to whoever is due. Returns the number of successful sends.
    pub fn tick(&mut self, now: Instant, text: &str, sink: &dyn SubscriberSink) -> usize {
        let targets: Vec<SubscriberId> = if self.is_due(now) {
            self.last_push = Some(now);
            self.subscribers.iter().cloned().collect()
        } else {
            self.pending.iter().cloned().collect()
        };
        self.pending.clear();

        let mut delivered = 0;
        for id in targets {
            match sink.send(&id, text) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(subscriber = %id, error = %e, "Dropping display subscriber");
                    self.subscribers.remove(&id);
                }
            }
        }
        delivered
    }
}

impl Default for DisplayBroadcaster {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::defaults::DEFAULT_DISPLAY_INTERVAL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;

    fn id(name: &str) -> SubscriberId {
        SubscriberId::new(name)
    }

    #[test]
    fn test_toggle_twice_unsubscribes() {
        let mut display = DisplayBroadcaster::default();
        assert!(display.toggle(id("Steve")));
        assert!(display.contains(&id("Steve")));
        assert!(!display.toggle(id("Steve")));
        assert!(!display.contains(&id("Steve")));
    }

    #[test]
    fn test_pushes_on_interval() {
        let host = FakeHost::new();
        host.connect("Steve");
        let mut display = DisplayBroadcaster::new(Duration::from_secs(2));
        display.toggle(id("Steve"));

        let start = Instant::now();
        assert_eq!(display.tick(start, "a", &host), 1);
        assert_eq!(display.tick(start + Duration::from_secs(1), "b", &host), 0);
        assert_eq!(display.tick(start + Duration::from_secs(2), "c", &host), 1);
        assert_eq!(
            host.messages_for(&id("Steve")),
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_new_subscriber_gets_immediate_push() {
        let host = FakeHost::new();
        host.connect("Steve");
        host.connect("Alex");
        let mut display = DisplayBroadcaster::new(Duration::from_secs(2));
        display.toggle(id("Steve"));

        let start = Instant::now();
        display.tick(start, "a", &host);
        display.toggle(id("Alex"));
        // Not due, but Alex is new
        assert_eq!(display.tick(start + Duration::from_secs(1), "b", &host), 1);
        assert_eq!(host.messages_for(&id("Alex")), vec!["b".to_string()]);
        assert_eq!(host.messages_for(&id("Steve")), vec!["a".to_string()]);
    }

    #[test]
    fn test_failed_send_removes_subscriber() {
        let host = FakeHost::new();
        let mut display = DisplayBroadcaster::default();
        display.toggle(id("Ghost"));

        assert_eq!(display.tick(Instant::now(), "a", &host), 0);
        assert!(display.is_empty());
    }

    #[test]
    fn test_subscribers_sorted() {
        let mut display = DisplayBroadcaster::default();
        display.toggle(id("b"));
        display.toggle(id("a"));
        assert_eq!(display.subscribers(), vec![id("a"), id("b")]);
    }
}
