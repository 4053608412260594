//! Configuration management CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use std::path::Path;

use clap::Subcommand;
use tpsguard::config::OptimizerConfig;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (file values over defaults)
    Show,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    match command {
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = OptimizerConfig::load_from(path)?;
    if !path.exists() {
        println!("# {} not found, showing defaults", path.display());
        println!();
    }
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        OptimizerConfig::default().save_to(path)?;
    } else if !OptimizerConfig::ensure_exists_at(path)? {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        run_init(&path, false).unwrap();
        let err = run_init(&path, false).unwrap_err();
        assert!(matches!(err, CliError::ConfigExists(_)));
    }

    #[test]
    fn test_init_force_restores_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[view_distance]\nbase = 5\n").unwrap();

        run_init(&path, true).unwrap();
        assert_eq!(
            OptimizerConfig::load_from(&path).unwrap(),
            OptimizerConfig::default()
        );
    }

    #[test]
    fn test_show_reports_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[optimizer]\nauto_optimize = maybe\n").unwrap();

        let err = run_show(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
