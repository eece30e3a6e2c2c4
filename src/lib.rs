//! # ARINC 429 Autopilot
//!
//! A codec for ARINC 429 bus words and a flight dynamics engine that reacts
//! to them like a bus-connected autopilot.
//!
//! This library provides:
//!
//! - Bit-exact encoding/decoding of 32-bit words (reversed fields, odd parity)
//! - Label value codecs for altitude, climb rate, pitch, power and control mode
//! - A per-connection engine running automatic and manual control laws
//! - Line framing of words over any buffered byte stream
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support
//!
//! ## Example
//!
//! ```
//! use arinc429_autopilot::{Engine, Sdi, Value, WordCodec};
//!
//! let codec = WordCodec::standard();
//! let mut engine = Engine::new();
//!
//! let command = codec.encode_value(Sdi::ZERO, &Value::Power(Some(80.0)))?;
//! let replies = engine.process(command);
//! assert_eq!(codec.decode(replies[0])?.value, Value::Power(Some(0.0)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod config;
pub mod core;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod framing;
pub mod label;

pub use crate::core::{FlightMode, Label, RawWord, Sdi, Ssm};
pub use codec::{DecodedWord, WordCodec, WordCodecBuilder, ERROR_WORD};
pub use config::FlightConfig;
pub use engine::{AircraftState, Engine};
pub use error::{CodecError, Result};
pub use framing::{serve_connection, SessionStats, WordReader};
pub use label::{CodecTable, LabelCodec, Value};

