//! Default values for every configuration setting.

/// Run scheduled cleanup passes and emergency mitigation automatically.
pub const DEFAULT_AUTO_OPTIMIZE: bool = true;

/// Seconds between scheduled cleanup passes.
pub const DEFAULT_OPTIMIZATION_INTERVAL_SECS: u64 = 120;

/// View distance restored after an emergency episode (chunks).
pub const DEFAULT_BASE_VIEW_DISTANCE: i32 = 8;

/// Lowest view distance the loop will ever set (chunks).
pub const DEFAULT_MIN_VIEW_DISTANCE: i32 = 4;

/// Highest view distance the loop will ever set (chunks).
pub const DEFAULT_MAX_VIEW_DISTANCE: i32 = 12;

/// Whether the loop adjusts view distance on its own.
pub const DEFAULT_AUTO_VIEW_DISTANCE: bool = true;

/// Minimum seconds between automatic view distance adjustments.
pub const DEFAULT_VIEW_DISTANCE_ADJUST_INTERVAL_SECS: u64 = 15;

/// Hysteresis band around view distance breakpoints (TPS).
pub const DEFAULT_VIEW_DISTANCE_HYSTERESIS: f64 = 0.5;

/// Maximum chunks changed per automatic adjustment (0 = unlimited).
pub const DEFAULT_VIEW_DISTANCE_MAX_STEP: i32 = 1;

/// Instantaneous TPS below which the emergency sequence fires.
pub const DEFAULT_TPS_CRITICAL: f64 = 15.0;

/// Smoothed TPS below which the loop enters Warning.
pub const DEFAULT_TPS_WARNING: f64 = 18.0;

/// Smoothed TPS at which the maximum view distance is allowed.
pub const DEFAULT_TPS_TARGET: f64 = 19.5;

/// Nominal server tick rate.
pub const NOMINAL_TPS: f64 = 20.0;

pub use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Samples averaged for the Warning check.
pub const DEFAULT_EMERGENCY_WINDOW: usize = 5;

/// Samples averaged for view distance decisions.
pub const DEFAULT_VIEW_DISTANCE_WINDOW: usize = 20;

/// Seconds between status display pushes.
pub const DEFAULT_DISPLAY_INTERVAL_SECS: u64 = 2;

/// Minimum seconds between admin lag alerts.
pub const DEFAULT_LAG_ALERT_COOLDOWN_SECS: u64 = 60;

/// Deadline for a single host effector call.
pub const DEFAULT_EFFECTOR_TIMEOUT_MS: u64 = 2000;

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "tpsguard.log";
