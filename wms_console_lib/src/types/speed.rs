//! Drive speed policy shared by the console clients.

/// Per-gear linear speed caps (m/s). Gear 0 is reserved for the
/// emergency stop and caps at zero.
pub fn gear_cap(gear: u8) -> f64 {
    match gear {
        1 => 0.10,
        2 => 0.15,
        3 => 0.22,
        _ => 0.0,
    }
}

/// Full-scale value of the speed gauge (m/s).
pub const MAX_DISPLAY_SPEED: f64 = 0.22;

/// Battery percentage below which the gauge switches to the alert style.
pub const LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// Gauge fill percentage for a measured speed, capped at 100.
pub fn speed_gauge_percent(speed: f64) -> f64 {
    (speed.abs() / MAX_DISPLAY_SPEED * 100.0).min(100.0)
}

/// Color band of a gauge fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    Low,
    Mid,
    High,
}

pub fn speed_gauge_band(percent: f64) -> GaugeBand {
    if percent < 40.0 {
        GaugeBand::Low
    } else if percent < 80.0 {
        GaugeBand::Mid
    } else {
        GaugeBand::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_caps_match_policy() {
        assert_eq!(gear_cap(1), 0.10);
        assert_eq!(gear_cap(2), 0.15);
        assert_eq!(gear_cap(3), 0.22);
        assert_eq!(gear_cap(0), 0.0);
        assert_eq!(gear_cap(4), 0.0);
    }

    #[test]
    fn gauge_percent_caps_at_full_scale() {
        assert_eq!(speed_gauge_percent(0.0), 0.0);
        assert!((speed_gauge_percent(0.11) - 50.0).abs() < 1e-9);
        assert_eq!(speed_gauge_percent(0.5), 100.0);
        // Reverse speeds fill the gauge by magnitude
        assert!((speed_gauge_percent(-0.11) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn gauge_bands_split_at_40_and_80() {
        assert_eq!(speed_gauge_band(0.0), GaugeBand::Low);
        assert_eq!(speed_gauge_band(39.9), GaugeBand::Low);
        assert_eq!(speed_gauge_band(40.0), GaugeBand::Mid);
        assert_eq!(speed_gauge_band(79.9), GaugeBand::Mid);
        assert_eq!(speed_gauge_band(80.0), GaugeBand::High);
        assert_eq!(speed_gauge_band(100.0), GaugeBand::High);
    }
}
