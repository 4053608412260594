//! TPSGuard - adaptive performance control for live game servers
//!
//! Samples the server tick rate once per second, keeps a short rolling
//! history, and drives two coupled policies from it: dynamic view distance
//! and emergency load shedding, plus periodic resource cleanup. Every host
//! interaction goes through the capability traits in [`host`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Instant;
//! use tpsguard::config::OptimizerConfig;
//! use tpsguard::control::ControlLoop;
//! use tpsguard::host::{FakeHost, Host};
//!
//! let fake = Arc::new(FakeHost::new());
//! fake.set_tps(19.9);
//!
//! let control = ControlLoop::new(OptimizerConfig::default(), Host::from_shared(fake)).unwrap();
//! let report = control.tick(Instant::now());
//! assert_eq!(report.sample, Some(19.9));
//! ```

pub mod alert;
pub mod cleanup;
pub mod command;
pub mod config;
pub mod control;
pub mod daemon;
pub mod display;
pub mod error;
pub mod history;
pub mod host;
pub mod logging;
pub mod policy;
pub mod sampler;
pub mod stats;

pub use control::{ControlLoop, StatusSnapshot, TickReport};
pub use daemon::{ControlDaemon, DaemonConfig, DaemonSummary};
pub use error::{ControlError, ControlResult, EffectorError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
