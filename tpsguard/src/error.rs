//! Error types for the control loop.
//!
//! Nothing in this crate is fatal to the host process. Every variant here
//! describes an action that was skipped or rejected; the loop keeps its prior
//! state and carries on with the next tick.

use thiserror::Error;

use crate::config::ConfigFileError;

/// Failure reported by a host capability (metric read, effector, push).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EffectorError {
    /// The host rejected the call.
    #[error("host rejected call: {0}")]
    Rejected(String),

    /// The call did not return within its deadline.
    #[error("host call timed out after {0} ms")]
    TimedOut(u64),

    /// The target of the call is gone (e.g. a disconnected subscriber).
    #[error("target unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the control loop and its command surface.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The sampler got no reading, or an invalid one (NaN, infinite, negative).
    ///
    /// The tick's policy decisions are skipped; previous state is kept.
    #[error("metric unavailable: {0}")]
    MetricUnavailable(String),

    /// A mitigation call into the host failed.
    #[error("{operation} failed: {source}")]
    EffectorFailure {
        operation: &'static str,
        #[source]
        source: EffectorError,
    },

    /// A command argument was out of bounds or referenced an unknown target.
    #[error("{0}")]
    Validation(String),

    /// The actor lacks the permission node required by the command.
    #[error("You do not have permission to use this command ({node})")]
    PermissionDenied { node: String },

    /// The command line did not name a known command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command was recognised but its arguments were malformed.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),
}

impl ControlError {
    /// Wrap a host failure with the name of the operation that produced it.
    pub fn effector(operation: &'static str, source: EffectorError) -> Self {
        ControlError::EffectorFailure { operation, source }
    }
}

/// Result type for control loop operations.
pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effector_failure_display() {
        let err = ControlError::effector(
            "set_view_distance",
            EffectorError::Rejected("world not loaded".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "set_view_distance failed: host rejected call: world not loaded"
        );
    }

    #[test]
    fn test_permission_denied_names_node() {
        let err = ControlError::PermissionDenied {
            node: "serveropt.command.optimize".to_string(),
        };
        assert!(err.to_string().contains("serveropt.command.optimize"));
    }

    #[test]
    fn test_timed_out_display() {
        assert_eq!(
            EffectorError::TimedOut(2000).to_string(),
            "host call timed out after 2000 ms"
        );
    }
}
