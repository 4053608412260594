//! Command dispatch against a running control loop.

use std::time::Instant;

use super::parser::{self, Command, OptimizeAction, ViewDistanceAction, OPTIMIZE_USAGE};
use crate::control::ControlLoop;
use crate::error::{ControlError, ControlResult};
use crate::host::{ActorId, SubscriberId};
use crate::policy::{health_score, TpsGrade};

/// Parse `line`, check `actor`'s permission, and run it.
///
/// Returns the reply text. Errors carry the message to show the actor.
pub fn execute(
    control: &ControlLoop,
    now: Instant,
    actor: &ActorId,
    line: &str,
) -> ControlResult<String> {
    let command = parser::parse(line)?;

    if let Some(node) = command.permission() {
        if !control.host().permissions.has_permission(actor, node) {
            tracing::debug!(actor = %actor, node, "Command denied");
            return Err(ControlError::PermissionDenied {
                node: node.to_string(),
            });
        }
    }

    tracing::debug!(actor = %actor, command = ?command, "Executing command");
    match command {
        Command::Tps => Ok(tps_reply(control)),
        Command::Lag => Ok(lag_reply(control)),
        Command::Optimize(action) => optimize(control, now, action),
        Command::ViewDistance(action) => view_distance(control, action),
    }
}

fn tps_reply(control: &ControlLoop) -> String {
    match control.tps() {
        (Some(instant), Some(smoothed)) => format!(
            "TPS: {:.2} (avg {:.2}) - {}",
            instant,
            smoothed,
            TpsGrade::from_tps(smoothed)
        ),
        _ => "TPS: no data yet".to_string(),
    }
}

fn lag_reply(control: &ControlLoop) -> String {
    let state = control.emergency_state();
    match control.tps().1 {
        Some(smoothed) => format!(
            "Server state: {} | TPS: {:.2} | Health: {}/100",
            state,
            smoothed,
            health_score(smoothed)
        ),
        None => format!("Server state: {} | TPS: no data yet", state),
    }
}

fn optimize(control: &ControlLoop, now: Instant, action: OptimizeAction) -> ControlResult<String> {
    match action {
        OptimizeAction::Usage => Ok(format!("Usage: {}", OPTIMIZE_USAGE)),
        OptimizeAction::Status => Ok(control.status(now).render()),
        OptimizeAction::Full => {
            let report = control.optimize_now(now);
            Ok(report.summary())
        }
        OptimizeAction::View(None) => {
            let viewers = control.display_subscribers();
            if viewers.is_empty() {
                Ok("No players are viewing the performance display".to_string())
            } else {
                let names: Vec<&str> = viewers.iter().map(SubscriberId::as_str).collect();
                Ok(format!("Performance display viewers: {}", names.join(", ")))
            }
        }
        OptimizeAction::View(Some(target)) => {
            let id = SubscriberId::new(target);
            let shown = control.toggle_display(id.clone())?;
            Ok(format!(
                "Performance display {} for {}",
                if shown { "enabled" } else { "disabled" },
                id
            ))
        }
        OptimizeAction::Reload => {
            control.reload()?;
            Ok("Configuration reloaded".to_string())
        }
    }
}

fn view_distance(control: &ControlLoop, action: ViewDistanceAction) -> ControlResult<String> {
    match action {
        ViewDistanceAction::Show => {
            let vd = control.view_distance();
            Ok(format!(
                "View distance: {} (auto: {}, range {}-{})",
                vd.current,
                if vd.auto_enabled { "on" } else { "off" },
                vd.min,
                vd.max
            ))
        }
        ViewDistanceAction::Set(chunks) => {
            control.set_view_distance(chunks)?;
            Ok(format!(
                "View distance set to {} (automatic adjustment disabled)",
                chunks
            ))
        }
        ViewDistanceAction::ToggleAuto => {
            let enabled = control.toggle_auto_view_distance();
            Ok(format!(
                "Automatic view distance {}",
                if enabled { "enabled" } else { "disabled" }
            ))
        }
    }
}
