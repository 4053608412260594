//! TPSGuard CLI - Command-line interface
//!
//! Runs the control loop against a simulated server and manages the
//! configuration file.

mod commands;
mod error;
mod runner;
mod sim;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;
use sim::Profile;

#[derive(Parser)]
#[command(name = "tpsguard")]
#[command(version)]
#[command(about = "Adaptive TPS control for live game servers", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.tpsguard/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop against a simulated server
    ///
    /// Console commands (/tps, /optimize, /vd, ...) are read from stdin and
    /// run with full permissions. Press Ctrl+C or type `quit` to stop.
    Run {
        /// Load profile for the simulated server
        #[arg(long, value_enum, default_value = "steady")]
        profile: Profile,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Tick period in milliseconds
        #[arg(long, default_value = "1000")]
        tick_ms: u64,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,

        /// Print the session summary as JSON
        #[arg(long)]
        summary_json: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            profile,
            ticks,
            tick_ms,
            debug,
            summary_json,
        } => commands::run::run(RunArgs {
            profile,
            ticks,
            tick_ms,
            config: cli.config,
            debug,
            summary_json,
        }),
        Commands::Config { command } => commands::config::run(command, cli.config.as_deref()),
    };

    if let Err(e) = result {
        e.exit();
    }
}
