//! Configuration structs, one per INI section.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::file::{config_directory, ConfigFileError};

/// Complete control loop configuration.
///
/// Immutable once loaded. A reload replaces the whole value under the
/// control loop's state lock; it is never patched field by field while a
/// tick is reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub optimizer: OptimizerSettings,
    pub view_distance: ViewDistanceSettings,
    pub thresholds: ThresholdSettings,
    pub history: HistorySettings,
    pub display: DisplaySettings,
    pub alerts: AlertSettings,
    pub effectors: EffectorSettings,
    pub logging: LoggingSettings,
}

/// `[optimizer]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Run scheduled cleanup and emergency mitigation automatically.
    pub auto_optimize: bool,
    /// Seconds between scheduled cleanup passes.
    pub optimization_interval_secs: u64,
}

/// `[view_distance]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDistanceSettings {
    pub base: i32,
    pub min: i32,
    pub max: i32,
    /// Start with automatic adjustment enabled.
    pub auto: bool,
    /// Minimum seconds between automatic adjustments.
    pub adjust_interval_secs: u64,
    /// Hysteresis band around breakpoints, in TPS.
    pub hysteresis: f64,
    /// Maximum chunks changed per adjustment; 0 means unlimited.
    pub max_step: i32,
}

/// `[thresholds]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSettings {
    pub tps_critical: f64,
    pub tps_warning: f64,
    pub tps_target: f64,
}

/// `[history]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySettings {
    pub capacity: usize,
    pub emergency_window: usize,
    pub view_distance_window: usize,
}

/// `[display]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub interval_secs: u64,
}

/// `[alerts]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub lag_alert_cooldown_secs: u64,
}

/// `[effectors]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectorSettings {
    pub timeout_ms: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerSettings {
                auto_optimize: DEFAULT_AUTO_OPTIMIZE,
                optimization_interval_secs: DEFAULT_OPTIMIZATION_INTERVAL_SECS,
            },
            view_distance: ViewDistanceSettings {
                base: DEFAULT_BASE_VIEW_DISTANCE,
                min: DEFAULT_MIN_VIEW_DISTANCE,
                max: DEFAULT_MAX_VIEW_DISTANCE,
                auto: DEFAULT_AUTO_VIEW_DISTANCE,
                adjust_interval_secs: DEFAULT_VIEW_DISTANCE_ADJUST_INTERVAL_SECS,
                hysteresis: DEFAULT_VIEW_DISTANCE_HYSTERESIS,
                max_step: DEFAULT_VIEW_DISTANCE_MAX_STEP,
            },
            thresholds: ThresholdSettings {
                tps_critical: DEFAULT_TPS_CRITICAL,
                tps_warning: DEFAULT_TPS_WARNING,
                tps_target: DEFAULT_TPS_TARGET,
            },
            history: HistorySettings {
                capacity: DEFAULT_HISTORY_CAPACITY,
                emergency_window: DEFAULT_EMERGENCY_WINDOW,
                view_distance_window: DEFAULT_VIEW_DISTANCE_WINDOW,
            },
            display: DisplaySettings {
                interval_secs: DEFAULT_DISPLAY_INTERVAL_SECS,
            },
            alerts: AlertSettings {
                lag_alert_cooldown_secs: DEFAULT_LAG_ALERT_COOLDOWN_SECS,
            },
            effectors: EffectorSettings {
                timeout_ms: DEFAULT_EFFECTOR_TIMEOUT_MS,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}

impl OptimizerConfig {
    /// Check cross-field invariants.
    ///
    /// Parsing already rejects malformed single values; this catches
    /// combinations that would break the policies (inverted bounds,
    /// thresholds out of order, empty windows).
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        let vd = &self.view_distance;
        if vd.min < 1 {
            return Err(invalid("view_distance", "min", vd.min, "must be at least 1"));
        }
        if vd.min > vd.max {
            return Err(invalid(
                "view_distance",
                "max",
                vd.max,
                "must not be below view_distance.min",
            ));
        }
        if vd.base < vd.min || vd.base > vd.max {
            return Err(invalid(
                "view_distance",
                "base",
                vd.base,
                "must lie between view_distance.min and view_distance.max",
            ));
        }
        if vd.hysteresis < 0.0 || !vd.hysteresis.is_finite() {
            return Err(invalid(
                "view_distance",
                "hysteresis",
                vd.hysteresis,
                "must be a non-negative number",
            ));
        }
        if vd.max_step < 0 {
            return Err(invalid("view_distance", "max_step", vd.max_step, "must not be negative"));
        }

        let t = &self.thresholds;
        for (key, value) in [
            ("tps_critical", t.tps_critical),
            ("tps_warning", t.tps_warning),
            ("tps_target", t.tps_target),
        ] {
            if !value.is_finite() {
                return Err(invalid("thresholds", key, value, "must be a finite number"));
            }
        }
        if t.tps_critical <= 0.0 {
            return Err(invalid("thresholds", "tps_critical", t.tps_critical, "must be positive"));
        }
        if t.tps_warning <= t.tps_critical {
            return Err(invalid(
                "thresholds",
                "tps_warning",
                t.tps_warning,
                "must be above thresholds.tps_critical",
            ));
        }
        if t.tps_target < t.tps_warning {
            return Err(invalid(
                "thresholds",
                "tps_target",
                t.tps_target,
                "must not be below thresholds.tps_warning",
            ));
        }

        let h = &self.history;
        if h.capacity == 0 {
            return Err(invalid("history", "capacity", h.capacity, "must be positive"));
        }
        if h.emergency_window == 0 || h.emergency_window > h.capacity {
            return Err(invalid(
                "history",
                "emergency_window",
                h.emergency_window,
                "must be between 1 and history.capacity",
            ));
        }
        if h.view_distance_window == 0 || h.view_distance_window > h.capacity {
            return Err(invalid(
                "history",
                "view_distance_window",
                h.view_distance_window,
                "must be between 1 and history.capacity",
            ));
        }

        if self.optimizer.optimization_interval_secs == 0 {
            return Err(invalid(
                "optimizer",
                "optimization_interval",
                0,
                "must be a positive number of seconds",
            ));
        }

        Ok(())
    }

    /// Interval between scheduled cleanup passes.
    pub fn optimization_interval(&self) -> Duration {
        Duration::from_secs(self.optimizer.optimization_interval_secs)
    }

    /// Minimum gap between automatic view distance adjustments.
    pub fn view_distance_adjust_interval(&self) -> Duration {
        Duration::from_secs(self.view_distance.adjust_interval_secs)
    }

    /// Interval between status display pushes.
    pub fn display_interval(&self) -> Duration {
        Duration::from_secs(self.display.interval_secs)
    }

    /// Minimum gap between admin lag alerts.
    pub fn lag_alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alerts.lag_alert_cooldown_secs)
    }

    /// Deadline for a single host effector call.
    pub fn effector_timeout(&self) -> Duration {
        Duration::from_millis(self.effectors.timeout_ms)
    }
}

fn invalid(section: &str, key: &str, value: impl ToString, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
