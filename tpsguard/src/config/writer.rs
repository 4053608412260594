//! INI serialization logic for converting `OptimizerConfig` → INI string.

use super::settings::OptimizerConfig;

/// Convert an `OptimizerConfig` to a commented INI string for saving.
pub(super) fn to_config_string(config: &OptimizerConfig) -> String {
    let log_file = config.logging.file.to_string_lossy();

    format!(
        r#"; TPSGuard configuration
; Remove a key to fall back to its default.

[optimizer]
; Run scheduled cleanup passes and emergency mitigation automatically
auto_optimize = {auto_optimize}
; Seconds between scheduled cleanup passes
optimization_interval = {optimization_interval}

[view_distance]
; Chunks restored after an emergency, and the bounds the loop stays within
base = {base}
min = {min}
max = {max}
; Adjust view distance from the smoothed TPS
auto = {auto}
; Seconds between automatic adjustments
adjust_interval = {adjust_interval}
; Hysteresis band around breakpoints (TPS)
hysteresis = {hysteresis}
; Max chunks changed per adjustment (0 = unlimited)
max_step = {max_step}

[thresholds]
; Instantaneous TPS below this fires the emergency sequence
tps_critical = {tps_critical}
; Smoothed TPS below this enters the warning state
tps_warning = {tps_warning}
; Smoothed TPS at which max view distance is allowed
tps_target = {tps_target}

[history]
; Samples kept (one per second)
capacity = {capacity}
; Samples averaged for the warning check
emergency_window = {emergency_window}
; Samples averaged for view distance decisions
view_distance_window = {view_distance_window}

[display]
; Seconds between status pushes to viewers
interval = {display_interval}

[alerts]
; Minimum seconds between admin lag alerts
lag_alert_cooldown = {lag_alert_cooldown}

[effectors]
; Deadline for a single host call
timeout_ms = {timeout_ms}

[logging]
file = {log_file}
"#,
        auto_optimize = config.optimizer.auto_optimize,
        optimization_interval = config.optimizer.optimization_interval_secs,
        base = config.view_distance.base,
        min = config.view_distance.min,
        max = config.view_distance.max,
        auto = config.view_distance.auto,
        adjust_interval = config.view_distance.adjust_interval_secs,
        hysteresis = config.view_distance.hysteresis,
        max_step = config.view_distance.max_step,
        tps_critical = config.thresholds.tps_critical,
        tps_warning = config.thresholds.tps_warning,
        tps_target = config.thresholds.tps_target,
        capacity = config.history.capacity,
        emergency_window = config.history.emergency_window,
        view_distance_window = config.history.view_distance_window,
        display_interval = config.display.interval_secs,
        lag_alert_cooldown = config.alerts.lag_alert_cooldown_secs,
        timeout_ms = config.effectors.timeout_ms,
        log_file = log_file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_contains_every_section() {
        let text = to_config_string(&OptimizerConfig::default());
        for section in [
            "[optimizer]",
            "[view_distance]",
            "[thresholds]",
            "[history]",
            "[display]",
            "[alerts]",
            "[effectors]",
            "[logging]",
        ] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("tps_critical = 15"));
        assert!(text.contains("max = 12"));
    }
}
