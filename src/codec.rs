//! Word codec: full 32-bit ARINC 429 words to and from labelled values

use crate::core::{Label, RawWord, Sdi, Ssm};
use crate::error::{CodecError, Result};
use crate::label::{CodecTable, LabelCodec, Value};

/// Canonical error word: label 000, SDI 0, SSM 0, no data, parity set
pub const ERROR_WORD: u32 = 1;

/// A word that passed the parity check and has a registered label
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedWord {
    /// Label of the word
    pub label: Label,
    /// Source/destination identifier
    pub sdi: Sdi,
    /// Raw sign/status matrix
    pub ssm: Ssm,
    /// Physical value carried by the data field
    pub value: Value,
}

/// ARINC 429 word encoder/decoder
#[derive(Debug, Default)]
pub struct WordCodec {
    table: CodecTable,
}

impl WordCodec {
    /// Create a codec over an explicit label table
    pub fn new(table: CodecTable) -> Self {
        WordCodec { table }
    }

    /// Codec with the five standard labels
    pub fn standard() -> Self {
        Self::new(CodecTable::standard())
    }

    /// Label table in use
    pub fn table(&self) -> &CodecTable {
        &self.table
    }

    /// Encode a value under an explicit label
    ///
    /// Fails with `UnknownLabel` when no codec is registered for `label`;
    /// callers answer that with `ERROR_WORD`.
    pub fn encode(&self, label: Label, sdi: Sdi, value: &Value) -> Result<u32> {
        let codec = self.table.get(label)?;
        let (ssm, data) = codec.encode(value)?;
        let word = RawWord::assemble(label, sdi, ssm, data);
        tracing::trace!(%word, raw = word.raw(), "encoded word");
        Ok(word.raw())
    }

    /// Encode a value under the label its shape belongs to
    pub fn encode_value(&self, sdi: Sdi, value: &Value) -> Result<u32> {
        self.encode(value.label(), sdi, value)
    }

    /// Decode a raw word
    ///
    /// Parity is checked first; a parity failure or an unregistered label
    /// yields an error and never a partially decoded word.
    pub fn decode(&self, raw: u32) -> Result<DecodedWord> {
        let word = RawWord::from_raw(raw);
        if !word.is_valid() {
            return Err(CodecError::parity_error(format!(
                "word {} has an even number of 1s",
                raw
            )));
        }

        let label = word.label();
        let codec: &dyn LabelCodec = self.table.get(label)?;
        let (sdi, ssm) = (word.sdi(), word.ssm());
        let value = codec.decode(ssm, word.data());
        tracing::trace!(%word, ?value, "decoded word");

        Ok(DecodedWord {
            label,
            sdi,
            ssm,
            value,
        })
    }

    /// Whether the word passes the odd parity check
    pub fn is_valid(raw: u32) -> bool {
        RawWord::from_raw(raw).is_valid()
    }

    /// Describe the parity of the 1-count of a word
    pub fn parity_name(raw: u32) -> &'static str {
        if raw.count_ones() % 2 == 1 {
            "Odd"
        } else {
            "Even"
        }
    }
}

/// Builder for word codecs with a custom label table
pub struct WordCodecBuilder {
    table: CodecTable,
}

impl WordCodecBuilder {
    /// Start from the standard label table
    pub fn new() -> Self {
        WordCodecBuilder {
            table: CodecTable::standard(),
        }
    }

    /// Start from an empty label table
    pub fn empty() -> Self {
        WordCodecBuilder {
            table: CodecTable::empty(),
        }
    }

    /// Register a codec for a label
    pub fn with_codec(mut self, label: Label, codec: impl LabelCodec + 'static) -> Self {
        self.table.register(label, codec);
        self
    }

    /// Build the codec
    pub fn build(self) -> WordCodec {
        WordCodec::new(self.table)
    }
}

impl Default for WordCodecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
