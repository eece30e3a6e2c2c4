//! Label value codecs
//!
//! Each label translates one physical quantity to and from an SSM code and
//! a 19-bit data field. A `CodecTable` maps labels to their codec and is
//! built once, then shared read-only by every word codec that needs it.

use std::collections::HashMap;

use crate::core::{FlightMode, Label, Ssm};
use crate::encoding::BcdLayout;
use crate::error::{CodecError, Result};

/// Largest altitude magnitude the altitude ladder can carry, in feet
pub const ALTITUDE_MAX: f64 = 40_000.0;

/// Index of the most significant step of the altitude ladder
const ALTITUDE_SIG_BITS: u32 = 15;

/// The SSM/data pair produced for values that cannot be represented
const INVALID: (Ssm, u32) = (Ssm::PLUS, 0);

/// Climb rate: hundreds, tens, units, tenths
const CLIMB_RATE_LAYOUT: BcdLayout = BcdLayout {
    fraction_digits: 1,
    widths: &[4, 4, 4, 4],
};

/// Pitch angle: tens (1 bit), units, tenths
const ANGLE_LAYOUT: BcdLayout = BcdLayout {
    fraction_digits: 1,
    widths: &[4, 4, 1],
};

/// Power: hundreds (3 bits), tens, units, tenths, hundredths
const POWER_LAYOUT: BcdLayout = BcdLayout {
    fraction_digits: 2,
    widths: &[4, 4, 4, 4, 3],
};

/// Physical payload of a word, one case per label
///
/// `None` marks a quantity that is absent (not computed or not applicable).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Label 001: altitude in feet and flight mode
    Altitude {
        feet: Option<f64>,
        mode: Option<FlightMode>,
    },
    /// Label 002: climb rate in ft/min
    ClimbRate(Option<f64>),
    /// Label 003: pitch angle in degrees
    Angle(Option<f64>),
    /// Label 004: engine power in percent
    Power(Option<f64>),
    /// Label 005: automatic (`true`) or manual control
    Autopilot(Option<bool>),
}

impl Value {
    /// Label that carries this value
    pub fn label(&self) -> Label {
        match self {
            Value::Altitude { .. } => Label::ALTITUDE,
            Value::ClimbRate(_) => Label::CLIMB_RATE,
            Value::Angle(_) => Label::ANGLE,
            Value::Power(_) => Label::POWER,
            Value::Autopilot(_) => Label::AUTOPILOT,
        }
    }

    /// Whether the value carries no usable quantity
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Altitude { feet, mode } => feet.is_none() || mode.is_none(),
            Value::ClimbRate(v) | Value::Angle(v) | Value::Power(v) => v.is_none(),
            Value::Autopilot(v) => v.is_none(),
        }
    }

    /// The same kind of value with every quantity removed
    pub fn absent(label: Label) -> Option<Value> {
        match label {
            Label::ALTITUDE => Some(Value::Altitude {
                feet: None,
                mode: None,
            }),
            Label::CLIMB_RATE => Some(Value::ClimbRate(None)),
            Label::ANGLE => Some(Value::Angle(None)),
            Label::POWER => Some(Value::Power(None)),
            Label::AUTOPILOT => Some(Value::Autopilot(None)),
            _ => None,
        }
    }
}

/// Translation between a physical value and an (SSM, data) pair
pub trait LabelCodec: Send + Sync {
    /// Encode a value, returning the SSM and the 19-bit data field
    ///
    /// Values outside the representable range encode to the invalid
    /// sentinel (SSM 0, data 0). A value of the wrong shape is an error.
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)>;

    /// Decode an SSM and data field into a value
    fn decode(&self, ssm: Ssm, data: u32) -> Value;
}

fn mismatch(label: Label, value: &Value) -> CodecError {
    CodecError::value_mismatch(format!(
        "label {} cannot carry {:?}",
        label, value
    ))
}

/// Label 001: altitude ladder plus flight mode
///
/// Data layout (19 bits): sign at bit 18, 16 ladder bits at 17-2, mode at 1-0.
/// Ladder bit `k` is worth `40000 / 2^(15 - k)` feet.
#[derive(Debug, Clone, Copy, Default)]
pub struct AltitudeCodec;

impl AltitudeCodec {
    fn step(k: u32) -> f64 {
        ALTITUDE_MAX / 2f64.powi((ALTITUDE_SIG_BITS - k) as i32)
    }

    fn encode_altitude(altitude: f64, mode: FlightMode) -> (Ssm, u32) {
        if !altitude.is_finite() || altitude.abs() > ALTITUDE_MAX {
            return INVALID;
        }

        let sign = u32::from(altitude < 0.0);
        let mut remainder = altitude.abs();
        let mut ladder = 0u32;
        for k in (0..=ALTITUDE_SIG_BITS).rev() {
            if remainder <= 1.0 {
                break;
            }
            let step = Self::step(k);
            if remainder >= step {
                ladder |= 1 << k;
                remainder -= step;
            }
        }

        let data = ((sign << (ALTITUDE_SIG_BITS + 1)) | ladder) << 2 | mode.code();
        (Ssm::NORMAL, data)
    }
}

impl LabelCodec for AltitudeCodec {
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)> {
        match *value {
            Value::Altitude {
                feet: Some(feet),
                mode: Some(mode),
            } => Ok(Self::encode_altitude(feet, mode)),
            Value::Altitude {
                feet: None,
                mode: Some(mode),
            } => Ok((Ssm::NO_DATA, mode.code())),
            Value::Altitude { mode: None, .. } => Ok(INVALID),
            ref other => Err(mismatch(Label::ALTITUDE, other)),
        }
    }

    fn decode(&self, ssm: Ssm, data: u32) -> Value {
        match ssm {
            Ssm::FAILURE => Value::Altitude {
                feet: None,
                mode: None,
            },
            Ssm::NO_DATA => Value::Altitude {
                feet: None,
                mode: FlightMode::from_code(data),
            },
            _ => {
                let mode = FlightMode::from_code(data);
                let ladder = data >> 2;
                let magnitude: f64 = (0..=ALTITUDE_SIG_BITS)
                    .filter(|k| ladder & (1 << k) != 0)
                    .map(Self::step)
                    .sum();
                let negative = ladder >> (ALTITUDE_SIG_BITS + 1) != 0;
                Value::Altitude {
                    feet: Some(if negative { -magnitude } else { magnitude }),
                    mode,
                }
            }
        }
    }
}

/// Signed decimal quantity: SSM 0 positive, 3 negative, 1 absent
fn encode_signed(layout: &BcdLayout, value: Option<f64>) -> (Ssm, u32) {
    let Some(value) = value else {
        return (Ssm::NO_DATA, 0);
    };
    let ssm = if value < 0.0 { Ssm::MINUS } else { Ssm::PLUS };
    match layout.pack(value.abs()) {
        Some(data) => (ssm, data),
        None => INVALID,
    }
}

fn decode_signed(layout: &BcdLayout, ssm: Ssm, data: u32) -> Option<f64> {
    match ssm {
        Ssm::NO_DATA => None,
        Ssm::MINUS => Some(-layout.unpack(data)),
        _ => Some(layout.unpack(data)),
    }
}

/// Label 002: climb rate in ft/min, one decimal
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimbRateCodec;

impl LabelCodec for ClimbRateCodec {
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)> {
        match value {
            Value::ClimbRate(rate) => Ok(encode_signed(&CLIMB_RATE_LAYOUT, *rate)),
            other => Err(mismatch(Label::CLIMB_RATE, other)),
        }
    }

    fn decode(&self, ssm: Ssm, data: u32) -> Value {
        Value::ClimbRate(decode_signed(&CLIMB_RATE_LAYOUT, ssm, data))
    }
}

/// Label 003: pitch angle in degrees, one decimal
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleCodec;

impl LabelCodec for AngleCodec {
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)> {
        match value {
            Value::Angle(angle) => Ok(encode_signed(&ANGLE_LAYOUT, *angle)),
            other => Err(mismatch(Label::ANGLE, other)),
        }
    }

    fn decode(&self, ssm: Ssm, data: u32) -> Value {
        Value::Angle(decode_signed(&ANGLE_LAYOUT, ssm, data))
    }
}

/// Label 004: engine power, two decimals
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerCodec;

impl LabelCodec for PowerCodec {
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)> {
        match value {
            Value::Power(power) => Ok(encode_signed(&POWER_LAYOUT, *power)),
            other => Err(mismatch(Label::POWER, other)),
        }
    }

    fn decode(&self, ssm: Ssm, data: u32) -> Value {
        Value::Power(decode_signed(&POWER_LAYOUT, ssm, data))
    }
}

/// Label 005: automatic flag in data bit 0
#[derive(Debug, Clone, Copy, Default)]
pub struct AutopilotCodec;

impl LabelCodec for AutopilotCodec {
    fn encode(&self, value: &Value) -> Result<(Ssm, u32)> {
        match value {
            Value::Autopilot(Some(automatic)) => Ok((Ssm::PLUS, u32::from(*automatic))),
            Value::Autopilot(None) => Ok((Ssm::NO_DATA, 0)),
            other => Err(mismatch(Label::AUTOPILOT, other)),
        }
    }

    fn decode(&self, ssm: Ssm, data: u32) -> Value {
        match ssm {
            Ssm::NO_DATA => Value::Autopilot(None),
            _ => Value::Autopilot(Some(data & 1 != 0)),
        }
    }
}

/// Mapping from label to its value codec
pub struct CodecTable {
    codecs: HashMap<Label, Box<dyn LabelCodec>>,
}

impl CodecTable {
    /// Create an empty table
    pub fn empty() -> Self {
        CodecTable {
            codecs: HashMap::new(),
        }
    }

    /// Table with labels 001 to 005 registered
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(Label::ALTITUDE, AltitudeCodec);
        table.register(Label::CLIMB_RATE, ClimbRateCodec);
        table.register(Label::ANGLE, AngleCodec);
        table.register(Label::POWER, PowerCodec);
        table.register(Label::AUTOPILOT, AutopilotCodec);
        table
    }

    /// Register a codec, replacing any previous one for the label
    pub fn register(&mut self, label: Label, codec: impl LabelCodec + 'static) {
        self.codecs.insert(label, Box::new(codec));
    }

    /// Look up the codec for a label
    pub fn get(&self, label: Label) -> Result<&dyn LabelCodec> {
        self.codecs
            .get(&label)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| CodecError::unknown_label(format!("no codec for label {}", label)))
    }

    /// Whether a codec is registered for the label
    pub fn contains(&self, label: Label) -> bool {
        self.codecs.contains_key(&label)
    }

    /// Number of registered labels
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no label is registered
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for CodecTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for CodecTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut labels: Vec<_> = self.codecs.keys().copied().collect();
        labels.sort();
        f.debug_struct("CodecTable").field("labels", &labels).finish()
    }
}
