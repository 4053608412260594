//! Configuration for the control loop.
//!
//! [`OptimizerConfig`] is loaded from `~/.tpsguard/config.ini` (missing file
//! means defaults), validated as a whole, and then treated as immutable. A
//! reload builds a fresh value and swaps it in.
//!
//! # Example
//!
//! ```
//! use tpsguard::config::OptimizerConfig;
//!
//! let config = OptimizerConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.view_distance.base, 8);
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    AlertSettings, DisplaySettings, EffectorSettings, HistorySettings, LoggingSettings,
    OptimizerConfig, OptimizerSettings, ThresholdSettings, ViewDistanceSettings,
};
