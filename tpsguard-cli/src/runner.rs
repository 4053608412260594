//! CLI runner for common setup.
//!
//! Loads the configuration and initializes logging so command handlers
//! start from the same state.

use std::path::{Path, PathBuf};

use tpsguard::config::{config_file_path, OptimizerConfig};
use tpsguard::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: OptimizerConfig,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config at `config_path` (or the default path) and start
    /// logging to the file it names.
    ///
    /// Log lines go to the file only: stdout carries command replies. With
    /// `debug_mode` the default level is `debug`, otherwise `info`. RUST_LOG
    /// overrides both.
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_path);
        let config = OptimizerConfig::load_from(&config_path)?;

        let level = if debug_mode { "debug" } else { "info" };
        let logging_guard = init_logging(&config.logging.file, level, false)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TPSGuard v{}", tpsguard::VERSION);
        info!(
            config = %self.config_path.display(),
            log_file = %self.config.logging.file.display(),
            "TPSGuard CLI: {} command", command
        );
    }
}

/// The explicit path if one was given, otherwise ~/.tpsguard/config.ini.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let explicit = Path::new("/srv/game/tpsguard.ini");
        assert_eq!(resolve_config_path(Some(explicit)), explicit.to_path_buf());
        assert_eq!(resolve_config_path(None), config_file_path());
    }
}
