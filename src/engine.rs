//! Flight dynamics engine driven by ARINC 429 words
//!
//! One `Engine` serves one connection. Every processed word is one tick:
//! commands update the desired state, then the automatic or manual control
//! law advances the aircraft and the new state is reported back.

use std::sync::Arc;

use crate::codec::{WordCodec, ERROR_WORD};
use crate::config::FlightConfig;
use crate::core::FlightMode;
use crate::error::Result;
use crate::label::{Value, ALTITUDE_MAX};

/// Pitch commands below this magnitude (degrees) count as "no pitch"
const PITCH_EPSILON: f64 = 0.1;

/// Physical state of the simulated aircraft
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AircraftState {
    /// Current altitude in feet
    pub altitude: f64,
    /// Current engine power (0-100)
    pub power: f64,
    /// Current climb rate in ft/s (per tick)
    pub climb_rate: f64,
    /// Current pitch angle in degrees
    pub angle: f64,
    /// Current flight mode
    pub mode: FlightMode,
    /// Altitude to reach, in feet
    pub desired_altitude: f64,
    /// Power to reach
    pub desired_power: f64,
    /// Climb rate commanded in manual mode, ft/s
    pub desired_climb: f64,
    /// Pitch commanded in manual mode, degrees
    pub desired_angle: f64,
    /// Automatic (`true`) or manual control law
    pub automatic: bool,
}

impl Default for AircraftState {
    fn default() -> Self {
        AircraftState {
            altitude: 0.0,
            power: 0.0,
            climb_rate: 0.0,
            angle: 0.0,
            mode: FlightMode::Ground,
            desired_altitude: 0.0,
            desired_power: 0.0,
            desired_climb: 0.0,
            desired_angle: 0.0,
            automatic: true,
        }
    }
}

/// Per-connection flight dynamics engine
#[derive(Debug)]
pub struct Engine {
    state: AircraftState,
    config: FlightConfig,
    codec: Arc<WordCodec>,
    ticks: u64,
}

impl Engine {
    /// Engine on the ground with the default configuration and label table
    pub fn new() -> Self {
        Engine {
            state: AircraftState::default(),
            config: FlightConfig::default(),
            codec: Arc::new(WordCodec::standard()),
            ticks: 0,
        }
    }

    /// Engine with a custom, validated configuration
    pub fn with_config(config: FlightConfig) -> Result<Self> {
        Self::with_codec(Arc::new(WordCodec::standard()), config)
    }

    /// Engine sharing a word codec built once for all connections
    pub fn with_codec(codec: Arc<WordCodec>, config: FlightConfig) -> Result<Self> {
        config.validate()?;
        Ok(Engine {
            state: AircraftState::default(),
            config,
            codec,
            ticks: 0,
        })
    }

    /// Current aircraft state
    pub fn state(&self) -> &AircraftState {
        &self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Number of control steps run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Process one raw word and return the raw words to send back, in order
    ///
    /// Words failing parity or carrying an unknown label are answered with
    /// the single `ERROR_WORD`. Replies reuse the SDI of the command.
    pub fn process(&mut self, raw: u32) -> Vec<u32> {
        let decoded = match self.codec.decode(raw) {
            Ok(decoded) => decoded,
            Err(error) => {
                tracing::warn!(raw, %error, "rejecting word");
                return vec![ERROR_WORD];
            }
        };

        self.handle(&decoded.value)
            .iter()
            .map(|value| {
                self.codec
                    .encode_value(decoded.sdi, value)
                    .unwrap_or_else(|error| {
                        tracing::warn!(?value, %error, "cannot encode reply");
                        ERROR_WORD
                    })
            })
            .collect()
    }

    /// Apply one decoded command and return the values to report
    pub fn handle(&mut self, command: &Value) -> Vec<Value> {
        match *command {
            Value::Altitude {
                feet: Some(feet),
                mode: Some(_),
            } => {
                self.state.desired_altitude =
                    clamp_input("desired_altitude", feet, -ALTITUDE_MAX, ALTITUDE_MAX);
                self.step();
                self.report()
            }
            Value::Altitude { feet: None, mode } => vec![Value::Altitude { feet: None, mode }],
            Value::Altitude { mode: None, .. } => vec![Value::Altitude {
                feet: None,
                mode: None,
            }],
            Value::ClimbRate(Some(rate)) => {
                let max = self.config.max_climb_rate;
                self.state.desired_climb = clamp_input("desired_climb", rate, -max, max) / 60.0;
                self.step();
                self.report()
            }
            Value::Angle(Some(angle)) => {
                let max = self.config.max_pitch;
                self.state.desired_angle = clamp_input("desired_angle", angle, -max, max);
                self.step();
                self.report()
            }
            Value::Power(Some(power)) => {
                self.state.desired_power =
                    clamp_input("desired_power", power, 0.0, self.config.max_power);
                vec![Value::Power(Some(self.state.power))]
            }
            Value::Autopilot(Some(automatic)) => {
                if automatic != self.state.automatic {
                    tracing::debug!(automatic, "switching control law");
                }
                self.state.automatic = automatic;
                vec![Value::Autopilot(Some(automatic))]
            }
            Value::ClimbRate(None)
            | Value::Angle(None)
            | Value::Power(None)
            | Value::Autopilot(None) => vec![*command],
        }
    }

    /// Run one control step with the active control law
    pub fn step(&mut self) {
        let previous = self.state.mode;
        if self.state.automatic {
            self.automatic_step();
        } else {
            self.manual_step();
        }
        self.ticks += 1;

        let state = &self.state;
        if state.mode != previous {
            tracing::debug!(from = %previous, to = %state.mode, altitude = state.altitude, "mode change");
        }
        tracing::debug!(
            tick = self.ticks,
            altitude = state.altitude,
            climb_rate = state.climb_rate,
            angle = state.angle,
            power = state.power,
            "control step"
        );
    }

    /// Values describing the current state: altitude, climb, angle, power
    pub fn report(&self) -> Vec<Value> {
        let state = &self.state;
        vec![
            Value::Altitude {
                feet: Some(state.altitude),
                mode: Some(state.mode),
            },
            Value::ClimbRate(Some(state.climb_rate * 60.0)),
            Value::Angle(Some(state.angle)),
            Value::Power(Some(state.power)),
        ]
    }

    fn airspeed(&self) -> f64 {
        self.state.power * self.config.airspeed_per_power
    }

    /// Move power towards its target by half the gap, capped per tick
    fn slew_power(&mut self) {
        let diff = self.state.desired_power - self.state.power;
        if diff != 0.0 {
            let step = self.config.max_power_step;
            self.state.power += (diff / 2.0).clamp(-step, step);
        }
    }

    /// Limit a new climb rate to the per-tick slew around the current one
    fn slew_climb(&self, target: f64) -> f64 {
        let slew = self.config.climb_slew;
        let current = self.state.climb_rate;
        target.clamp(current - slew, current + slew)
    }

    /// Largest climb rate towards the target that can still be slewed to
    /// zero before reaching it
    fn stopping_limit(&self, gap: f64) -> f64 {
        let slew = self.config.climb_slew;
        (-slew + (slew * slew + 8.0 * slew * gap.abs()).sqrt()) / 2.0
    }

    /// Integrate one tick of climb, holding at the desired altitude instead
    /// of flying through it
    fn advance(&mut self, climb: f64) {
        let state = &mut self.state;
        let gap = state.desired_altitude - state.altitude;
        state.climb_rate = climb;
        state.altitude = if climb * gap >= 0.0 && climb.abs() >= gap.abs() {
            state.desired_altitude
        } else {
            (state.altitude + climb).clamp(-ALTITUDE_MAX, ALTITUDE_MAX)
        };
    }

    /// Pitch implied by a climb rate at the current airspeed, within the
    /// pitch limit so it stays encodable
    fn implied_pitch(&self, climb: f64) -> Option<f64> {
        let airspeed = self.airspeed();
        if airspeed == 0.0 {
            return None;
        }
        let max = self.config.max_pitch;
        Some(
            (climb / airspeed)
                .clamp(-1.0, 1.0)
                .asin()
                .to_degrees()
                .clamp(-max, max),
        )
    }

    /// Whether the aircraft can stop on target during this tick
    fn on_target(&self) -> bool {
        let gap = self.state.desired_altitude - self.state.altitude;
        gap.abs() <= self.config.altitude_threshold
            && self.state.climb_rate.abs() <= self.config.climb_slew
    }

    /// Pitch follows the altitude gap, climb rate follows pitch and airspeed
    fn automatic_step(&mut self) {
        self.slew_power();
        let airspeed = self.airspeed();

        if self.on_target() {
            if self.state.altitude.abs() < self.config.altitude_threshold {
                self.state.mode = FlightMode::Ground;
                self.state.altitude = 0.0;
            } else {
                self.state.mode = FlightMode::Cruise;
                self.state.altitude = self.state.desired_altitude;
            }
            self.state.climb_rate = 0.0;
            self.state.angle = 0.0;
            return;
        }

        let config = &self.config;
        let gap = self.state.desired_altitude - self.state.altitude;
        let pitch = (gap * config.pitch_per_foot).clamp(-config.max_pitch, config.max_pitch);
        let max_climb = config.max_climb_per_tick().min(self.stopping_limit(gap));
        let target = (airspeed * pitch.to_radians().sin()).clamp(-max_climb, max_climb);
        let climb = self.slew_climb(target);

        // without airspeed the commanded pitch is reported as is
        self.state.angle = self.implied_pitch(climb).unwrap_or(pitch);
        self.advance(climb);
        self.state.mode = FlightMode::Changing;
    }

    /// Climb rate and pitch come from the operator's commands
    fn manual_step(&mut self) {
        self.slew_power();
        let gap = self.state.desired_altitude - self.state.altitude;

        if self.state.mode == FlightMode::Changing {
            if self.on_target() {
                let state = &mut self.state;
                state.climb_rate = 0.0;
                state.angle = 0.0;
                state.desired_climb = 0.0;
                state.desired_angle = 0.0;
                state.altitude = state.desired_altitude.round();
                state.mode = if state.altitude <= 0.0 {
                    FlightMode::Ground
                } else {
                    FlightMode::Cruise
                };
                return;
            }
        } else {
            let commanded = self.state.desired_climb != 0.0 && self.state.desired_angle != 0.0;
            if gap.abs() > self.config.altitude_threshold {
                if self.state.desired_climb == 0.0 {
                    self.state.desired_climb =
                        self.config.default_manual_climb / 60.0 * gap.signum();
                }
                if self.state.desired_angle == 0.0 {
                    self.state.desired_angle = self.config.default_manual_pitch;
                }
                self.state.mode = FlightMode::Changing;
            } else if self.state.mode == FlightMode::Ground && commanded {
                self.state.mode = FlightMode::Changing;
            } else {
                if self.state.mode == FlightMode::Ground {
                    self.state.altitude = 0.0;
                }
                self.state.climb_rate = 0.0;
                self.state.angle = 0.0;
                return;
            }
        }

        let factor = (gap.abs() / self.config.manual_approach).min(1.0);
        let mut target = self.state.desired_climb * factor;
        if target * gap > 0.0 {
            let limit = self.stopping_limit(gap);
            target = target.clamp(-limit, limit);
        }
        let climb = self.slew_climb(target);
        self.advance(climb);

        let k = self.config.airspeed_per_power;
        if self.state.desired_angle.abs() > PITCH_EPSILON && climb != 0.0 {
            let pitch = self.state.desired_angle.abs().to_radians();
            let required = climb.abs() / pitch.sin();
            self.state.power =
                (required / k).clamp(self.config.manual_min_power, self.config.max_power);
        }
        self.state.angle = self.implied_pitch(climb).unwrap_or(0.0);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_input(input: &'static str, value: f64, min: f64, max: f64) -> f64 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!(input, value, clamped, "clamping out-of-range input");
    }
    clamped
}
