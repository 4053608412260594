//! Host capability abstraction.
//!
//! The control loop never talks to a game server directly. Everything it
//! reads or changes goes through one of the narrow traits below, bundled in a
//! [`Host`]. Production embeds implement them against the real server API;
//! tests use [`fake::FakeHost`].
//!
//! All traits are `Send + Sync` so a [`Host`] can be moved onto the blocking
//! pool the daemon runs ticks on.

pub mod deadline;
pub mod fake;
pub mod tick_rate;

use std::fmt;
use std::sync::Arc;

use crate::error::EffectorError;

pub use deadline::DeadlineHost;
pub use fake::FakeHost;
pub use tick_rate::TickRateMeter;

/// Identity of a status display subscriber (usually a player name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Who issued a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorId {
    /// The server console. Holds every permission.
    Console,
    /// A connected player.
    Player(String),
}

impl ActorId {
    pub fn player(name: impl Into<String>) -> Self {
        ActorId::Player(name.into())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Console => f.write_str("CONSOLE"),
            ActorId::Player(name) => f.write_str(name),
        }
    }
}

/// How hard a cleanup pass should reclaim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupMode {
    #[default]
    Standard,
    /// Used while an emergency episode is active.
    Aggressive,
}

impl CleanupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupMode::Standard => "standard",
            CleanupMode::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the throughput metric.
pub trait MetricSource: Send + Sync {
    /// Current ticks per second as reported by the host.
    ///
    /// The sampler validates the value; implementations may return anything.
    fn current_tps(&self) -> Result<f64, EffectorError>;
}

/// Applies a server-wide view distance.
pub trait ViewDistanceEffector: Send + Sync {
    fn set_view_distance(&self, chunks: i32) -> Result<(), EffectorError>;
}

/// Reclaims world resources.
pub trait CleanupEffector: Send + Sync {
    /// Remove excess entities. Returns how many were removed.
    fn clear_entities(&self, mode: CleanupMode) -> Result<u64, EffectorError>;

    /// Unload idle chunks. Returns how many were unloaded.
    fn clear_chunks(&self, mode: CleanupMode) -> Result<u64, EffectorError>;

    /// Ask the host runtime to release memory.
    fn reclaim_memory(&self) -> Result<(), EffectorError>;
}

/// Delivers text to subscribers and admins.
pub trait SubscriberSink: Send + Sync {
    /// Push a status line to one subscriber.
    fn send(&self, id: &SubscriberId, text: &str) -> Result<(), EffectorError>;

    /// Whether the subscriber is currently connected.
    fn is_online(&self, id: &SubscriberId) -> bool;

    /// Broadcast a notice to every admin. Best effort.
    fn notify_admins(&self, text: &str);
}

/// Permission lookup for command actors.
pub trait PermissionCheck: Send + Sync {
    fn has_permission(&self, actor: &ActorId, node: &str) -> bool;
}

/// Bundle of host capabilities handed to the control loop.
#[derive(Clone)]
pub struct Host {
    pub metrics: Arc<dyn MetricSource>,
    pub view_distance: Arc<dyn ViewDistanceEffector>,
    pub cleanup: Arc<dyn CleanupEffector>,
    pub subscribers: Arc<dyn SubscriberSink>,
    pub permissions: Arc<dyn PermissionCheck>,
}

impl Host {
    /// Build a host from one value that implements every capability.
    pub fn from_shared<T>(host: Arc<T>) -> Self
    where
        T: MetricSource
            + ViewDistanceEffector
            + CleanupEffector
            + SubscriberSink
            + PermissionCheck
            + 'static,
    {
        Self {
            metrics: host.clone(),
            view_distance: host.clone(),
            cleanup: host.clone(),
            subscribers: host.clone(),
            permissions: host,
        }
    }

    /// Replace the metric source, keeping every other capability.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricSource>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ActorId::Console.to_string(), "CONSOLE");
        assert_eq!(SubscriberId::from("Alex").to_string(), "Alex");
        assert_eq!(CleanupMode::Aggressive.to_string(), "aggressive");
    }

    #[test]
    fn test_from_shared_wires_every_capability() {
        let fake = Arc::new(FakeHost::new());
        fake.set_tps(19.0);
        let host = Host::from_shared(fake.clone());

        assert_eq!(host.metrics.current_tps(), Ok(19.0));
        host.view_distance.set_view_distance(6).unwrap();
        assert_eq!(fake.view_distance(), Some(6));
    }
}
