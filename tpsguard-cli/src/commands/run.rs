//! Run command - drive the control loop against a simulated server.
//!
//! The daemon ticks on a tokio runtime while a console thread reads command
//! lines from stdin and runs them as the server console. Ctrl+C, `quit` or
//! `--ticks` ends the session, after which a summary is printed.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use console::style;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tpsguard::host::{ActorId, DeadlineHost, Host, SubscriberId};
use tpsguard::{ControlDaemon, ControlLoop, DaemonConfig, DaemonSummary, StatusSnapshot};

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::sim::{Profile, SimulatedHost};

/// Arguments for the run command.
#[derive(Debug)]
pub struct RunArgs {
    pub profile: Profile,
    pub ticks: Option<u64>,
    pub tick_ms: u64,
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub summary_json: bool,
}

/// End-of-session report.
#[derive(Debug, Serialize)]
struct SessionSummary {
    profile: &'static str,
    daemon: DaemonSummary,
    status: StatusSnapshot,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");
    let config = runner.config().clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tpsguard-worker")
        .build()
        .map_err(CliError::Runtime)?;

    let sim = Arc::new(SimulatedHost::new(args.profile, config.view_distance.base));
    let host = DeadlineHost::wrap(
        Host::from_shared(Arc::clone(&sim)),
        config.effector_timeout(),
        runtime.handle().clone(),
    );
    let control = Arc::new(
        ControlLoop::new(config, host)?.with_config_path(runner.config_path().to_path_buf()),
    );

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || ctrlc_token.cancel())
        .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let console_control = Arc::clone(&control);
    let console_sim = Arc::clone(&sim);
    let console_shutdown = shutdown.clone();
    // Not joined: a read blocked on stdin cannot be interrupted
    thread::Builder::new()
        .name("tpsguard-console".to_string())
        .spawn(move || console_loop(&console_control, &console_sim, &console_shutdown))
        .map_err(CliError::Runtime)?;

    let mut daemon_config =
        DaemonConfig::default().with_tick_period(Duration::from_millis(args.tick_ms.max(1)));
    if let Some(ticks) = args.ticks {
        daemon_config = daemon_config.with_max_ticks(ticks);
    }

    print_banner(&args, runner.config_path().display().to_string());
    info!(
        profile = args.profile.name(),
        tick_ms = args.tick_ms,
        max_ticks = ?args.ticks,
        "Starting simulated session"
    );

    let daemon_summary =
        runtime.block_on(ControlDaemon::new(Arc::clone(&control), daemon_config).run(shutdown));

    let summary = SessionSummary {
        profile: args.profile.name(),
        daemon: daemon_summary,
        status: control.status(Instant::now()),
    };
    // A host call stuck on the blocking pool must not hold up exit
    runtime.shutdown_timeout(Duration::from_secs(1));

    if args.summary_json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "Failed to serialize session summary"),
        }
    } else {
        print_summary(&summary);
    }

    Ok(())
}

// =============================================================================
// Console
// =============================================================================

/// What the console should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleOutcome {
    Reply(String),
    Error(String),
    Quit,
    Nothing,
}

const CONSOLE_HELP: &str = "\
Console commands:
  /tps, /lag                        current tick rate
  /optimize [status|full|view <player>|reload]
  /vd [<chunks>|auto]               view distance
  join <player>, leave <player>     simulate players connecting
  players                           list online players
  quit                              end the session";

fn console_loop(control: &ControlLoop, sim: &SimulatedHost, shutdown: &CancellationToken) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if shutdown.is_cancelled() {
            break;
        }

        match handle_console_line(control, sim, &line) {
            ConsoleOutcome::Reply(text) => println!("{}", text),
            ConsoleOutcome::Error(text) => println!("{}", style(text).red()),
            ConsoleOutcome::Quit => {
                shutdown.cancel();
                break;
            }
            ConsoleOutcome::Nothing => {}
        }
    }
}

fn handle_console_line(control: &ControlLoop, sim: &SimulatedHost, line: &str) -> ConsoleOutcome {
    let line = line.trim();
    let mut words = line.split_whitespace();

    match (words.next(), words.next(), words.next()) {
        (None, _, _) => ConsoleOutcome::Nothing,
        (Some("quit" | "exit" | "stop"), None, _) => ConsoleOutcome::Quit,
        (Some("help" | "?"), None, _) => ConsoleOutcome::Reply(CONSOLE_HELP.to_string()),
        (Some("players"), None, _) => {
            let online: Vec<String> = sim.online().iter().map(|id| id.to_string()).collect();
            if online.is_empty() {
                ConsoleOutcome::Reply("No players online".to_string())
            } else {
                ConsoleOutcome::Reply(format!("Online: {}", online.join(", ")))
            }
        }
        (Some("join"), Some(name), None) => {
            if sim.join(SubscriberId::new(name)) {
                ConsoleOutcome::Reply(format!("{} joined the game", name))
            } else {
                ConsoleOutcome::Error(format!("{} is already online", name))
            }
        }
        (Some("leave"), Some(name), None) => {
            let id = SubscriberId::new(name);
            if sim.leave(&id) {
                control.on_subscriber_quit(&id);
                ConsoleOutcome::Reply(format!("{} left the game", name))
            } else {
                ConsoleOutcome::Error(format!("{} is not online", name))
            }
        }
        (Some("join" | "leave"), _, _) => {
            ConsoleOutcome::Error("Usage: join <player> | leave <player>".to_string())
        }
        _ => match control.execute(Instant::now(), &ActorId::Console, line) {
            Ok(reply) => ConsoleOutcome::Reply(reply),
            Err(e) => ConsoleOutcome::Error(e.to_string()),
        },
    }
}

// =============================================================================
// Output
// =============================================================================

fn print_banner(args: &RunArgs, config_path: String) {
    println!("{}", style(format!("TPSGuard v{}", tpsguard::VERSION)).bold());
    println!("  Profile:   {}", args.profile.name());
    println!("  Tick:      {} ms", args.tick_ms);
    match args.ticks {
        Some(ticks) => println!("  Ticks:     {}", ticks),
        None => println!("  Ticks:     until stopped"),
    }
    println!("  Config:    {}", config_path);
    println!();
    println!("Type 'help' for console commands. Press Ctrl+C to stop.");
    println!();
}

fn print_summary(summary: &SessionSummary) {
    let status = &summary.status;
    let stats = &status.stats;

    println!();
    println!("{}", style("Session summary").bold());
    println!("  Profile:            {}", summary.profile);
    println!(
        "  Ticks:              {} ({} overruns, {} panics)",
        summary.daemon.ticks, summary.daemon.overruns, summary.daemon.panics
    );
    match status.tps_smoothed {
        Some(tps) => println!("  Final TPS:          {:.2}", tps),
        None => println!("  Final TPS:          no data"),
    }
    println!("  Final state:        {}", status.state);
    println!("  View distance:      {}", status.view_distance.current);
    println!("  Emergencies:        {}", stats.emergencies);
    println!("  Optimizations:      {}", stats.optimizations);
    println!("  Entities removed:   {}", stats.entities_removed);
    println!("  Chunks cleared:     {}", stats.chunks_cleared);
    println!("  View changes:       {}", stats.view_distance_changes);
    println!("  Skipped readings:   {}", stats.ticks_skipped);
    println!("  Effector failures:  {}", stats.effector_failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpsguard::config::OptimizerConfig;

    fn setup() -> (Arc<SimulatedHost>, ControlLoop) {
        let sim = Arc::new(SimulatedHost::new(Profile::Steady, 8));
        let control =
            ControlLoop::new(OptimizerConfig::default(), Host::from_shared(Arc::clone(&sim)))
                .unwrap();
        (sim, control)
    }

    #[test]
    fn test_blank_and_quit_lines() {
        let (sim, control) = setup();
        assert_eq!(handle_console_line(&control, &sim, "   "), ConsoleOutcome::Nothing);
        assert_eq!(handle_console_line(&control, &sim, "quit"), ConsoleOutcome::Quit);
        assert_eq!(handle_console_line(&control, &sim, "exit"), ConsoleOutcome::Quit);
    }

    #[test]
    fn test_commands_run_as_console() {
        let (sim, control) = setup();
        let outcome = handle_console_line(&control, &sim, "/vd 6");
        assert!(matches!(outcome, ConsoleOutcome::Reply(_)));
        assert_eq!(control.view_distance().current, 6);

        let outcome = handle_console_line(&control, &sim, "/warp");
        assert!(matches!(outcome, ConsoleOutcome::Error(_)));
    }

    #[test]
    fn test_leave_drops_display_subscription() {
        let (sim, control) = setup();
        assert!(matches!(
            handle_console_line(&control, &sim, "join Steve"),
            ConsoleOutcome::Reply(_)
        ));
        handle_console_line(&control, &sim, "/optimize view Steve");
        assert_eq!(control.display_subscribers(), vec![SubscriberId::new("Steve")]);

        handle_console_line(&control, &sim, "leave Steve");
        assert!(control.display_subscribers().is_empty());
        assert!(matches!(
            handle_console_line(&control, &sim, "leave Steve"),
            ConsoleOutcome::Error(_)
        ));
    }

    #[test]
    fn test_join_without_name_is_usage_error() {
        let (sim, control) = setup();
        assert!(matches!(
            handle_console_line(&control, &sim, "join"),
            ConsoleOutcome::Error(_)
        ));
        assert!(sim.online().is_empty());
        assert_eq!(
            handle_console_line(&control, &sim, "players"),
            ConsoleOutcome::Reply("No players online".to_string())
        );
    }
}
