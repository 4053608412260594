//! INI parsing logic for converting `Ini` → `OptimizerConfig`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::OptimizerConfig;

/// Parse an `Ini` object into an `OptimizerConfig`.
///
/// Starts from `OptimizerConfig::default()` and overlays any values found.
/// Cross-field checks are left to [`OptimizerConfig::validate`].
pub(super) fn parse_ini(ini: &Ini) -> Result<OptimizerConfig, ConfigFileError> {
    let mut config = OptimizerConfig::default();

    // [optimizer] section
    if let Some(section) = ini.section(Some("optimizer")) {
        if let Some(v) = section.get("auto_optimize") {
            config.optimizer.auto_optimize = parse_bool("optimizer", "auto_optimize", v)?;
        }
        if let Some(v) = section.get("optimization_interval") {
            config.optimizer.optimization_interval_secs = parse_value(
                "optimizer",
                "optimization_interval",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [view_distance] section
    if let Some(section) = ini.section(Some("view_distance")) {
        let vd = &mut config.view_distance;
        if let Some(v) = section.get("base") {
            vd.base = parse_value("view_distance", "base", v, "must be an integer (chunks)")?;
        }
        if let Some(v) = section.get("min") {
            vd.min = parse_value("view_distance", "min", v, "must be an integer (chunks)")?;
        }
        if let Some(v) = section.get("max") {
            vd.max = parse_value("view_distance", "max", v, "must be an integer (chunks)")?;
        }
        if let Some(v) = section.get("auto") {
            vd.auto = parse_bool("view_distance", "auto", v)?;
        }
        if let Some(v) = section.get("adjust_interval") {
            vd.adjust_interval_secs = parse_value(
                "view_distance",
                "adjust_interval",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("hysteresis") {
            vd.hysteresis =
                parse_value("view_distance", "hysteresis", v, "must be a number (TPS)")?;
        }
        if let Some(v) = section.get("max_step") {
            vd.max_step = parse_value(
                "view_distance",
                "max_step",
                v,
                "must be a non-negative integer (0 = unlimited)",
            )?;
        }
    }

    // [thresholds] section
    if let Some(section) = ini.section(Some("thresholds")) {
        if let Some(v) = section.get("tps_critical") {
            config.thresholds.tps_critical =
                parse_value("thresholds", "tps_critical", v, "must be a number")?;
        }
        if let Some(v) = section.get("tps_warning") {
            config.thresholds.tps_warning =
                parse_value("thresholds", "tps_warning", v, "must be a number")?;
        }
        if let Some(v) = section.get("tps_target") {
            config.thresholds.tps_target =
                parse_value("thresholds", "tps_target", v, "must be a number")?;
        }
    }

    // [history] section
    if let Some(section) = ini.section(Some("history")) {
        if let Some(v) = section.get("capacity") {
            config.history.capacity =
                parse_value("history", "capacity", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("emergency_window") {
            config.history.emergency_window =
                parse_value("history", "emergency_window", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("view_distance_window") {
            config.history.view_distance_window = parse_value(
                "history",
                "view_distance_window",
                v,
                "must be a positive integer",
            )?;
        }
    }

    // [display] section
    if let Some(section) = ini.section(Some("display")) {
        if let Some(v) = section.get("interval") {
            config.display.interval_secs = parse_value(
                "display",
                "interval",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
    }

    // [alerts] section
    if let Some(section) = ini.section(Some("alerts")) {
        if let Some(v) = section.get("lag_alert_cooldown") {
            config.alerts.lag_alert_cooldown_secs = parse_value(
                "alerts",
                "lag_alert_cooldown",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
    }

    // [effectors] section
    if let Some(section) = ini.section(Some("effectors")) {
        if let Some(v) = section.get("timeout_ms") {
            config.effectors.timeout_ms = parse_value(
                "effectors",
                "timeout_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
}

/// Parse a boolean, accepting true/false, yes/no, on/off and 1/0.
pub(super) fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<OptimizerConfig, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), OptimizerConfig::default());
    }

    #[test]
    fn test_overlay_values() {
        let config = parse(
            "[optimizer]\nauto_optimize = no\noptimization_interval = 300\n\
             [view_distance]\nbase = 10\nhysteresis = 0.25\n\
             [thresholds]\ntps_warning = 17.5\n",
        )
        .unwrap();
        assert!(!config.optimizer.auto_optimize);
        assert_eq!(config.optimizer.optimization_interval_secs, 300);
        assert_eq!(config.view_distance.base, 10);
        assert_eq!(config.view_distance.hysteresis, 0.25);
        assert_eq!(config.thresholds.tps_warning, 17.5);
        // Untouched keys keep their defaults
        assert_eq!(config.view_distance.min, 4);
    }

    #[test]
    fn test_invalid_integer_names_key() {
        let err = parse("[view_distance]\nmin = four\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("view_distance.min"));
        assert!(msg.contains("four"));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let err = parse("[optimizer]\nauto_optimize = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/log/x.log"), PathBuf::from("/var/log/x.log"));
    }
}
