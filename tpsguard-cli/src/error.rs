//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tpsguard::config::ConfigFileError;
use tpsguard::ControlError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read, parsed or written
    Config(ConfigFileError),
    /// Control loop refused to start
    Control(ControlError),
    /// Async runtime could not be created
    Runtime(std::io::Error),
    /// Ctrl+C handler could not be installed
    SignalHandler(String),
    /// `config init` found an existing file
    ConfigExists(PathBuf),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. })
            | CliError::Control(ControlError::Config(ConfigFileError::InvalidValue { .. })) => {
                eprintln!();
                eprintln!("Check the [view_distance] and [thresholds] sections:");
                eprintln!("  1. min <= base <= max");
                eprintln!("  2. tps_critical < tps_warning <= tps_target");
                eprintln!();
                eprintln!("Or regenerate the file with: tpsguard config init --force");
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Control(e) => write!(f, "Failed to start control loop: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::SignalHandler(msg) => {
                write!(f, "Failed to install Ctrl+C handler: {}", msg)
            }
            CliError::ConfigExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Control(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ControlError> for CliError {
    fn from(e: ControlError) -> Self {
        CliError::Control(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_path() {
        let err = CliError::ConfigExists(PathBuf::from("/tmp/tpsguard/config.ini"));
        assert_eq!(
            err.to_string(),
            "Config file already exists: /tmp/tpsguard/config.ini"
        );
    }

    #[test]
    fn test_control_error_keeps_source() {
        let err: CliError = ControlError::Validation("bad bounds".to_string()).into();
        assert!(err.to_string().starts_with("Failed to start control loop"));
        assert!(err.source().is_some());
    }
}
