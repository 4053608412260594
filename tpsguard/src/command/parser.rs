//! Chat and console command parsing.

use crate::error::{ControlError, ControlResult};

/// Permission node for `/optimize` and its subcommands.
pub const PERM_OPTIMIZE: &str = "serveropt.command.optimize";

/// Permission node for `/vd`.
pub const PERM_VIEW_DISTANCE: &str = "serveropt.command.viewdistance";

pub const OPTIMIZE_USAGE: &str = "/optimize <status|full|view [player]|reload>";
pub const VIEW_DISTANCE_USAGE: &str = "/vd [<chunks>|auto]";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tps,
    Lag,
    Optimize(OptimizeAction),
    ViewDistance(ViewDistanceAction),
}

/// `/optimize` subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizeAction {
    Usage,
    Status,
    Full,
    /// Toggle a viewer, or list viewers when no target is given.
    View(Option<String>),
    Reload,
}

/// `/vd` forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDistanceAction {
    Show,
    Set(i32),
    ToggleAuto,
}

impl Command {
    /// Permission node required, or `None` for public commands.
    pub fn permission(&self) -> Option<&'static str> {
        match self {
            Command::Tps | Command::Lag => None,
            Command::Optimize(_) => Some(PERM_OPTIMIZE),
            Command::ViewDistance(_) => Some(PERM_VIEW_DISTANCE),
        }
    }
}

/// Parse a command line. A leading `/` is optional and names are
/// case-insensitive.
pub fn parse(line: &str) -> ControlResult<Command> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Err(ControlError::UnknownCommand(String::new()));
    };
    let args: Vec<&str> = words.collect();

    match name.to_lowercase().as_str() {
        "tps" => Ok(Command::Tps),
        "lag" => Ok(Command::Lag),
        "optimize" | "opt" | "perf" => parse_optimize(&args).map(Command::Optimize),
        "vd" | "viewdistance" => parse_view_distance(&args).map(Command::ViewDistance),
        other => Err(ControlError::UnknownCommand(other.to_string())),
    }
}

fn parse_optimize(args: &[&str]) -> ControlResult<OptimizeAction> {
    let Some(sub) = args.first() else {
        return Ok(OptimizeAction::Usage);
    };
    match (sub.to_lowercase().as_str(), &args[1..]) {
        ("status", []) => Ok(OptimizeAction::Status),
        ("full", []) => Ok(OptimizeAction::Full),
        ("reload", []) => Ok(OptimizeAction::Reload),
        ("view", []) => Ok(OptimizeAction::View(None)),
        ("view", [target]) => Ok(OptimizeAction::View(Some(target.to_string()))),
        _ => Err(ControlError::Usage(OPTIMIZE_USAGE)),
    }
}

fn parse_view_distance(args: &[&str]) -> ControlResult<ViewDistanceAction> {
    match args {
        [] => Ok(ViewDistanceAction::Show),
        [arg] if arg.eq_ignore_ascii_case("auto") => Ok(ViewDistanceAction::ToggleAuto),
        [arg] => arg
            .parse()
            .map(ViewDistanceAction::Set)
            .map_err(|_| ControlError::Usage(VIEW_DISTANCE_USAGE)),
        _ => Err(ControlError::Usage(VIEW_DISTANCE_USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_commands() {
        assert_eq!(parse("/tps").unwrap(), Command::Tps);
        assert_eq!(parse("LAG").unwrap(), Command::Lag);
        assert_eq!(parse("/tps").unwrap().permission(), None);
    }

    #[test]
    fn test_optimize_aliases() {
        for line in ["/optimize status", "/opt status", "/perf STATUS"] {
            assert_eq!(
                parse(line).unwrap(),
                Command::Optimize(OptimizeAction::Status),
                "{}",
                line
            );
        }
        assert_eq!(parse("/optimize").unwrap(), Command::Optimize(OptimizeAction::Usage));
    }

    #[test]
    fn test_optimize_view_target() {
        assert_eq!(
            parse("/optimize view Steve").unwrap(),
            Command::Optimize(OptimizeAction::View(Some("Steve".to_string())))
        );
        assert_eq!(
            parse("/optimize view").unwrap(),
            Command::Optimize(OptimizeAction::View(None))
        );
    }

    #[test]
    fn test_optimize_bad_subcommand() {
        assert!(matches!(
            parse("/optimize explode"),
            Err(ControlError::Usage(OPTIMIZE_USAGE))
        ));
        assert!(matches!(
            parse("/optimize full now"),
            Err(ControlError::Usage(_))
        ));
    }

    #[test]
    fn test_view_distance_forms() {
        assert_eq!(parse("/vd").unwrap(), Command::ViewDistance(ViewDistanceAction::Show));
        assert_eq!(
            parse("/viewdistance 6").unwrap(),
            Command::ViewDistance(ViewDistanceAction::Set(6))
        );
        assert_eq!(
            parse("/vd Auto").unwrap(),
            Command::ViewDistance(ViewDistanceAction::ToggleAuto)
        );
        assert!(matches!(parse("/vd six"), Err(ControlError::Usage(_))));
        assert!(matches!(parse("/vd 6 7"), Err(ControlError::Usage(_))));
    }

    #[test]
    fn test_permission_nodes() {
        assert_eq!(parse("/opt full").unwrap().permission(), Some(PERM_OPTIMIZE));
        assert_eq!(parse("/vd 5").unwrap().permission(), Some(PERM_VIEW_DISTANCE));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(parse("/fly"), Err(ControlError::UnknownCommand(name)) if name == "fly"));
        assert!(matches!(parse("   "), Err(ControlError::UnknownCommand(_))));
    }
}
