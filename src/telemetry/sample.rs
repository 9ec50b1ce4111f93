//! Telemetry sample type and the synthetic battery model.

use serde::{Deserialize, Serialize};

use crate::geo::Waypoint;
use crate::weather::WeatherReading;

/// Battery percentage reported on the very first tick.
pub const BATTERY_START_PERCENT: u8 = 27;

/// Battery never reports below this percentage.
pub const BATTERY_FLOOR_PERCENT: u8 = 20;

/// One snapshot of simulated vehicle state.
///
/// Created once per sampler tick and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub gps: Waypoint,
    /// Remaining battery in percent, `20..=27`.
    pub battery: u8,
    /// Altitude in meters, always positive.
    pub altitude: f64,
    /// Ground speed in m/s.
    pub speed: f64,
    pub weather: WeatherReading,
}

/// Battery percentage after `ticks` sampler ticks.
///
/// Uses the total tick count, not the wrapped route position, so the battery
/// keeps draining across laps until it settles at the floor.
///
/// # Examples
///
/// ```
/// use drone_telemetry::telemetry::battery_level;
///
/// assert_eq!(battery_level(0), 27);
/// assert_eq!(battery_level(4), 23);
/// assert_eq!(battery_level(500), 20);
/// ```
pub fn battery_level(ticks: u64) -> u8 {
    let drained = u64::from(BATTERY_START_PERCENT).saturating_sub(ticks);
    drained.max(u64::from(BATTERY_FLOOR_PERCENT)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_formula() {
        for ticks in 0..100u64 {
            let expected = (27i64 - ticks as i64).max(20) as u8;
            assert_eq!(battery_level(ticks), expected, "ticks = {}", ticks);
        }
    }

    #[test]
    fn test_battery_never_below_floor() {
        assert_eq!(battery_level(7), 20);
        assert_eq!(battery_level(8), 20);
        assert_eq!(battery_level(u64::MAX), 20);
    }

    #[test]
    fn test_battery_is_non_increasing() {
        let levels: Vec<u8> = (0..50).map(battery_level).collect();
        assert!(levels.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_sample_wire_format() {
        let sample = TelemetrySample {
            gps: Waypoint::new(51.05, -114.07),
            battery: 25,
            altitude: 55.5,
            speed: 6.25,
            weather: WeatherReading::unknown(),
        };

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["gps"]["lat"], 51.05);
        assert_eq!(json["battery"], 25);
        assert_eq!(json["altitude"], 55.5);
        assert_eq!(json["speed"], 6.25);
        assert_eq!(json["weather"]["description"], "N/A");
        assert!(json["weather"]["temp"].is_null());
    }
}
