//! Error types for ARINC 429 word handling

use thiserror::Error;

/// Result type for ARINC 429 operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error types encountered while encoding, decoding or framing bus words
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Parity check failed
    #[error("Parity error: {0}")]
    ParityError(String),

    /// No codec is registered for the label
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Label digits outside the octal convention
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Source/destination identifier wider than 2 bits
    #[error("Invalid SDI: {0}")]
    InvalidSdi(String),

    /// Value shape does not belong to the label's codec
    #[error("Value mismatch: {0}")]
    ValueMismatch(String),

    /// Transport token is not a decimal 32-bit word
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Control-loop configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    /// Create a new ParityError
    pub fn parity_error(msg: impl Into<String>) -> Self {
        CodecError::ParityError(msg.into())
    }

    /// Create a new UnknownLabel error
    pub fn unknown_label(msg: impl Into<String>) -> Self {
        CodecError::UnknownLabel(msg.into())
    }

    /// Create a new InvalidLabel error
    pub fn invalid_label(msg: impl Into<String>) -> Self {
        CodecError::InvalidLabel(msg.into())
    }

    /// Create a new InvalidSdi error
    pub fn invalid_sdi(msg: impl Into<String>) -> Self {
        CodecError::InvalidSdi(msg.into())
    }

    /// Create a new ValueMismatch error
    pub fn value_mismatch(msg: impl Into<String>) -> Self {
        CodecError::ValueMismatch(msg.into())
    }

    /// Create a new InvalidToken error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        CodecError::InvalidToken(msg.into())
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        CodecError::InvalidConfig(msg.into())
    }
}
