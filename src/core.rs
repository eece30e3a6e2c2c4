//! Core types and structures for ARINC 429 bus words

use bitfield::bitfield;

use crate::encoding::{has_odd_parity, odd_parity_bit, reverse_bits};
use crate::error::{CodecError, Result};

/// Width of the label field in bits
pub const LABEL_WIDTH: u32 = 8;
/// Width of the source/destination identifier in bits
pub const SDI_WIDTH: u32 = 2;
/// Width of the data field in bits
pub const DATA_WIDTH: u32 = 19;
/// Width of the sign/status matrix in bits
pub const SSM_WIDTH: u32 = 2;

/// Word label: three octal digits selecting the transported quantity
///
/// Stored the way labels are written, e.g. `Label::new(325)` is octal 325.
/// The hundreds digit only has 2 bits on the wire, so it is limited to 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label(u16);

impl Label {
    /// Label 000, used by the error word
    pub const ERROR: Label = Label(0);
    /// Desired/current altitude with flight mode
    pub const ALTITUDE: Label = Label(1);
    /// Climb rate in ft/min
    pub const CLIMB_RATE: Label = Label(2);
    /// Pitch angle in degrees
    pub const ANGLE: Label = Label(3);
    /// Engine power in percent
    pub const POWER: Label = Label(4);
    /// Automatic/manual control flag
    pub const AUTOPILOT: Label = Label(5);
    /// Largest label value (octal 377)
    pub const MAX: u16 = 377;

    /// Create a label, rejecting digits outside the octal convention
    pub fn new(code: u16) -> Result<Self> {
        let (hundreds, tens, units) = (code / 100, (code / 10) % 10, code % 10);
        if hundreds > 3 || tens > 7 || units > 7 {
            return Err(CodecError::invalid_label(format!(
                "Label {:03} is not a valid octal label (max {:03})",
                code,
                Self::MAX
            )));
        }
        Ok(Label(code))
    }

    /// Rebuild a label from its 8-bit digit pack (hundreds in bits 7-6)
    pub fn from_bits(bits: u8) -> Self {
        let hundreds = ((bits >> 6) & 0x03) as u16;
        let tens = ((bits >> 3) & 0x07) as u16;
        let units = (bits & 0x07) as u16;
        Label(hundreds * 100 + tens * 10 + units)
    }

    /// Pack the three digits into 8 bits
    pub fn to_bits(&self) -> u8 {
        let (hundreds, tens, units) = self.digits();
        (hundreds << 6) | (tens << 3) | units
    }

    /// Digits as (hundreds, tens, units)
    pub fn digits(&self) -> (u8, u8, u8) {
        (
            (self.0 / 100) as u8,
            ((self.0 / 10) % 10) as u8,
            (self.0 % 10) as u8,
        )
    }

    /// Get the label as written
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Source/destination identifier (0-3), passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sdi(u8);

impl Sdi {
    /// Identifier used by the error word
    pub const ZERO: Sdi = Sdi(0);
    /// Maximum identifier value
    pub const MAX: u8 = 3;

    /// Create an identifier, validating it fits in 2 bits
    pub fn new(sdi: u8) -> Result<Self> {
        if sdi > Self::MAX {
            return Err(CodecError::invalid_sdi(format!(
                "SDI {} out of range [0, {}]",
                sdi,
                Self::MAX
            )));
        }
        Ok(Sdi(sdi))
    }

    fn from_bits(bits: u32) -> Self {
        Sdi((bits & 0x3) as u8)
    }

    /// Get the raw identifier
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Sign/status matrix
///
/// The meaning of the four codes depends on the label: the decimal labels
/// use them as sign and availability, altitude uses them as validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ssm(u8);

impl Ssm {
    /// Positive value (decimal labels) or failure (altitude)
    pub const PLUS: Ssm = Ssm(0);
    /// No computed data
    pub const NO_DATA: Ssm = Ssm(1);
    /// Functional test
    pub const TEST: Ssm = Ssm(2);
    /// Negative value (decimal labels) or normal operation (altitude)
    pub const MINUS: Ssm = Ssm(3);

    /// Altitude word failure/invalid
    pub const FAILURE: Ssm = Ssm::PLUS;
    /// Altitude word normal operation
    pub const NORMAL: Ssm = Ssm::MINUS;

    /// Build from the low 2 bits
    pub fn from_bits(bits: u32) -> Self {
        Ssm((bits & 0x3) as u8)
    }

    /// Get the raw 2-bit code
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Aircraft flight mode carried in the altitude word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlightMode {
    /// On the ground
    #[default]
    Ground,
    /// Climbing or descending towards the desired altitude
    Changing,
    /// Holding the desired altitude
    Cruise,
}

impl FlightMode {
    /// 2-bit wire code
    pub fn code(&self) -> u32 {
        match self {
            FlightMode::Ground => 0,
            FlightMode::Changing => 1,
            FlightMode::Cruise => 2,
        }
    }

    /// Decode a 2-bit wire code, code 3 is unassigned
    pub fn from_code(code: u32) -> Option<Self> {
        match code & 0x3 {
            0 => Some(FlightMode::Ground),
            1 => Some(FlightMode::Changing),
            2 => Some(FlightMode::Cruise),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightMode::Ground => write!(f, "On ground"),
            FlightMode::Changing => write!(f, "Altitude changing"),
            FlightMode::Cruise => write!(f, "Cruise"),
        }
    }
}

bitfield! {
    /// A single ARINC 429 word
    ///
    /// Format (bit 1 = least significant):
    /// - Bit 1: parity (odd over the whole word)
    /// - Bits 3-2: SSM, bit-reversed
    /// - Bits 22-4: data, bit-reversed
    /// - Bits 24-23: SDI, bit-reversed
    /// - Bits 32-25: label, bit-reversed
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RawWord(u32);
    impl Debug;
    u32;
    pub parity, set_parity: 0;
    pub ssm_field, set_ssm_field: 2, 1;
    pub data_field, set_data_field: 21, 3;
    pub sdi_field, set_sdi_field: 23, 22;
    pub label_field, set_label_field: 31, 24;
}

impl RawWord {
    /// Wrap a received word without any check
    pub fn from_raw(raw: u32) -> Self {
        RawWord(raw)
    }

    /// Assemble a word from its logical fields and set the parity bit
    pub fn assemble(label: Label, sdi: Sdi, ssm: Ssm, data: u32) -> Self {
        let mut word = RawWord(0);
        word.set_label_field(reverse_bits(label.to_bits() as u32, LABEL_WIDTH));
        word.set_sdi_field(reverse_bits(sdi.value() as u32, SDI_WIDTH));
        word.set_data_field(reverse_bits(data, DATA_WIDTH));
        word.set_ssm_field(reverse_bits(ssm.value() as u32, SSM_WIDTH));
        word.set_parity(odd_parity_bit(word.0 >> 1) == 1);
        word
    }

    /// Get the raw 32-bit value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Whether the word carries an odd number of 1s
    pub fn is_valid(&self) -> bool {
        has_odd_parity(self.0)
    }

    /// Label in written form
    pub fn label(&self) -> Label {
        Label::from_bits(reverse_bits(self.label_field(), LABEL_WIDTH) as u8)
    }

    /// Source/destination identifier
    pub fn sdi(&self) -> Sdi {
        Sdi::from_bits(reverse_bits(self.sdi_field(), SDI_WIDTH))
    }

    /// Sign/status matrix
    pub fn ssm(&self) -> Ssm {
        Ssm::from_bits(reverse_bits(self.ssm_field(), SSM_WIDTH))
    }

    /// 19-bit data payload in natural bit order
    pub fn data(&self) -> u32 {
        reverse_bits(self.data_field(), DATA_WIDTH)
    }
}

impl std::fmt::Display for RawWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Word(label={}, sdi={}, ssm={}, data=0x{:05X})",
            self.label(),
            self.sdi().value(),
            self.ssm().value(),
            self.data()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_creation() {
        assert!(Label::new(1).is_ok());
        assert!(Label::new(377).is_ok());
        assert!(Label::new(8).is_err());
        assert!(Label::new(90).is_err());
        assert!(Label::new(400).is_err());
    }

    #[test]
    fn test_label_bits() -> Result<()> {
        let label = Label::new(325)?;
        assert_eq!(label.to_bits(), 0b11_010_101);
        assert_eq!(Label::from_bits(0b11_010_101), label);
        assert_eq!(label.to_string(), "325");
        Ok(())
    }

    #[test]
    fn test_sdi_creation() {
        assert!(Sdi::new(3).is_ok());
        assert!(Sdi::new(4).is_err());
    }

    #[test]
    fn test_flight_mode_codes() {
        for mode in [FlightMode::Ground, FlightMode::Changing, FlightMode::Cruise] {
            assert_eq!(FlightMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(FlightMode::from_code(3), None);
    }

    #[test]
    fn test_assemble_layout() -> Result<()> {
        // label 001 -> digit pack 0b0000_0001 -> reversed 0b1000_0000
        let word = RawWord::assemble(Label::ALTITUDE, Sdi::new(1)?, Ssm::NO_DATA, 1);
        assert_eq!(word.label_field(), 0b1000_0000);
        assert_eq!(word.sdi_field(), 0b10);
        assert_eq!(word.ssm_field(), 0b10);
        assert_eq!(word.data_field(), 1 << 18);
        assert!(word.is_valid());

        assert_eq!(word.label(), Label::ALTITUDE);
        assert_eq!(word.sdi().value(), 1);
        assert_eq!(word.ssm(), Ssm::NO_DATA);
        assert_eq!(word.data(), 1);
        Ok(())
    }

    #[test]
    fn test_error_word_layout() {
        let word = RawWord::assemble(Label::ERROR, Sdi::ZERO, Ssm::PLUS, 0);
        assert_eq!(word.raw(), 1);
        assert!(word.is_valid());
    }

    #[test]
    fn test_single_bit_flip_invalidates() -> Result<()> {
        let word = RawWord::assemble(Label::new(325)?, Sdi::new(2)?, Ssm::MINUS, 0x1_2345);
        assert!(word.is_valid());
        for bit in 0..32 {
            assert!(!RawWord::from_raw(word.raw() ^ (1 << bit)).is_valid());
        }
        Ok(())
    }
}
