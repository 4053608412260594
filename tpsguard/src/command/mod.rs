//! Command surface.
//!
//! | Command | Aliases | Permission |
//! |---|---|---|
//! | `/tps` | | public |
//! | `/lag` | | public |
//! | `/optimize [status\|full\|view [player]\|reload]` | `opt`, `perf` | `serveropt.command.optimize` |
//! | `/vd [<chunks>\|auto]` | `viewdistance` | `serveropt.command.viewdistance` |

mod handler;
mod parser;

pub use handler::execute;
pub use parser::{
    parse, Command, OptimizeAction, ViewDistanceAction, OPTIMIZE_USAGE, PERM_OPTIMIZE,
    PERM_VIEW_DISTANCE, VIEW_DISTANCE_USAGE,
};
