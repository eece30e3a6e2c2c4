//! Control-loop configuration for the flight dynamics engine

use crate::error::{CodecError, Result};

/// Feet per second of airspeed for one unit of power (0.6 km/h -> ft/s)
pub const AIRSPEED_PER_POWER: f64 = 0.6 / 3.6 * 3.28084;

/// Constants driving both control laws
///
/// Rates are per tick; one tick is one processed word. Climb rates are in
/// ft/s internally and in ft/min on the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlightConfig {
    /// Altitude gap (ft) under which the aircraft is considered on target
    pub altitude_threshold: f64,
    /// Largest change of engine power per tick
    pub max_power_step: f64,
    /// Airspeed in ft/s produced by one unit of power
    pub airspeed_per_power: f64,
    /// Pitch in degrees commanded per foot of altitude gap
    pub pitch_per_foot: f64,
    /// Largest pitch angle in degrees
    pub max_pitch: f64,
    /// Largest climb rate in ft/min
    pub max_climb_rate: f64,
    /// Largest change of climb rate per tick, in ft/s
    pub climb_slew: f64,
    /// Climb rate in ft/min used by manual mode when none was commanded
    pub default_manual_climb: f64,
    /// Pitch in degrees used by manual mode when none was commanded
    pub default_manual_pitch: f64,
    /// Altitude gap (ft) over which manual mode ramps the climb rate down
    pub manual_approach: f64,
    /// Smallest power manual mode derives from airspeed
    pub manual_min_power: f64,
    /// Largest engine power
    pub max_power: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        FlightConfig {
            altitude_threshold: 1.0,
            max_power_step: 5.0,
            airspeed_per_power: AIRSPEED_PER_POWER,
            pitch_per_foot: 0.01,
            max_pitch: 16.0,
            max_climb_rate: 800.0,
            climb_slew: 0.05,
            default_manual_climb: 400.0,
            default_manual_pitch: 10.0,
            manual_approach: 100.0,
            manual_min_power: 50.0,
            max_power: 100.0,
        }
    }
}

impl FlightConfig {
    /// Largest climb rate per tick, in ft/s
    pub fn max_climb_per_tick(&self) -> f64 {
        self.max_climb_rate / 60.0
    }

    /// Check every limit is finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("altitude_threshold", self.altitude_threshold),
            ("max_power_step", self.max_power_step),
            ("airspeed_per_power", self.airspeed_per_power),
            ("pitch_per_foot", self.pitch_per_foot),
            ("max_pitch", self.max_pitch),
            ("max_climb_rate", self.max_climb_rate),
            ("climb_slew", self.climb_slew),
            ("default_manual_climb", self.default_manual_climb),
            ("default_manual_pitch", self.default_manual_pitch),
            ("manual_approach", self.manual_approach),
            ("manual_min_power", self.manual_min_power),
            ("max_power", self.max_power),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(CodecError::invalid_config(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }

        if self.max_pitch >= 90.0 {
            return Err(CodecError::invalid_config(
                "max_pitch must be below 90 degrees".to_string(),
            ));
        }
        if self.manual_min_power > self.max_power {
            return Err(CodecError::invalid_config(format!(
                "manual_min_power {} exceeds max_power {}",
                self.manual_min_power, self.max_power
            )));
        }
        Ok(())
    }

    /// Read a configuration from JSON, missing fields take their defaults
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FlightConfig = serde_json::from_str(json)
            .map_err(|e| CodecError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_is_valid() -> Result<()> {
        let config = FlightConfig::default();
        config.validate()?;
        assert_abs_diff_eq!(config.max_climb_per_tick(), 800.0 / 60.0);
        assert_abs_diff_eq!(config.airspeed_per_power * 80.0, 43.7445, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = FlightConfig {
            climb_slew: 0.0,
            ..FlightConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CodecError::InvalidConfig(_))
        ));

        let config = FlightConfig {
            max_pitch: 95.0,
            ..FlightConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FlightConfig {
            manual_min_power: 150.0,
            ..FlightConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_partial() -> Result<()> {
        let config = FlightConfig::from_json(r#"{ "climb_slew": 0.1 }"#)?;
        assert_abs_diff_eq!(config.climb_slew, 0.1);
        assert_abs_diff_eq!(config.max_pitch, 16.0);
        assert!(FlightConfig::from_json(r#"{ "max_power": -1 }"#).is_err());
        Ok(())
    }
}
