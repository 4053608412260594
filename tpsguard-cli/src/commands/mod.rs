//! CLI command implementations.
//!
//! - [`config`] - Configuration management (show, path, init)
//! - [`run`] - Drive the control loop against a simulated server

pub mod config;
pub mod run;
