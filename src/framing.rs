//! Line framing of bus words over a byte stream
//!
//! Each word travels as its decimal representation, one per line. Tokens
//! that are not a decimal 32-bit value are dropped here and never reach
//! the word codec.

use std::io::{self, BufRead, Write};

use crate::engine::Engine;
use crate::error::{CodecError, Result};

/// Parse one decimal token into a raw word
pub fn parse_token(token: &str) -> Result<u32> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CodecError::invalid_token("empty token"));
    }
    token
        .parse::<u32>()
        .map_err(|e| CodecError::invalid_token(format!("{:?}: {}", token, e)))
}

fn parse_line(line: &[u8]) -> Result<u32> {
    let text = std::str::from_utf8(line)
        .map_err(|e| CodecError::invalid_token(format!("{:?}: {}", line, e)))?;
    parse_token(text)
}

/// Iterator over the words of a line-delimited stream
///
/// Malformed lines are skipped and counted; I/O errors end the iteration
/// after being yielded once.
pub struct WordReader<R> {
    reader: R,
    line: Vec<u8>,
    rejected: u64,
    failed: bool,
}

impl<R: BufRead> WordReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        WordReader {
            reader,
            line: Vec::new(),
            rejected: 0,
            failed: false,
        }
    }

    /// Number of lines dropped so far
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl<R: BufRead> Iterator for WordReader<R> {
    type Item = io::Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => match parse_line(&self.line) {
                    Ok(word) => return Some(Ok(word)),
                    Err(error) => {
                        tracing::warn!(%error, "dropping malformed token");
                        self.rejected += 1;
                    }
                },
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Write words as newline-terminated decimal lines and flush
pub fn write_words<W: Write>(writer: &mut W, words: &[u32]) -> io::Result<()> {
    for word in words {
        writeln!(writer, "{}", word)?;
    }
    writer.flush()
}

/// Counters for one served connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStats {
    /// Words handed to the engine
    pub words_received: u64,
    /// Words written back
    pub words_sent: u64,
    /// Lines dropped as malformed
    pub tokens_rejected: u64,
}

/// Drive one engine over a connection until the reader is exhausted
///
/// Words are processed strictly in arrival order and every reply batch is
/// written and flushed before the next word is read.
pub fn serve_connection<R, W>(
    engine: &mut Engine,
    reader: R,
    mut writer: W,
) -> io::Result<SessionStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();
    let mut words = WordReader::new(reader);

    for word in words.by_ref() {
        let replies = engine.process(word?);
        stats.words_received += 1;
        write_words(&mut writer, &replies)?;
        stats.words_sent += replies.len() as u64;
    }

    stats.tokens_rejected = words.rejected();
    tracing::debug!(?stats, "connection finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{WordCodec, ERROR_WORD};
    use crate::core::Sdi;
    use crate::label::Value;
    use std::io::Cursor;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("42\n"), Ok(42));
        assert_eq!(parse_token("  4294967295 "), Ok(u32::MAX));
        assert!(parse_token("").is_err());
        assert!(parse_token("abc").is_err());
        assert!(parse_token("-1").is_err());
        assert!(parse_token("4294967296").is_err());
    }

    #[test]
    fn test_word_reader_skips_malformed_lines() -> io::Result<()> {
        let input = Cursor::new("1\n\nfoo\n2151677953\n7");
        let mut reader = WordReader::new(input);
        let words = reader.by_ref().collect::<io::Result<Vec<_>>>()?;
        assert_eq!(words, vec![1, 2151677953, 7]);
        assert_eq!(reader.rejected(), 2);
        Ok(())
    }

    #[test]
    fn test_word_reader_skips_invalid_utf8() -> io::Result<()> {
        let input = Cursor::new(&b"1\n\xff\xfe\n2151677953\n"[..]);
        let mut reader = WordReader::new(input);
        let words = reader.by_ref().collect::<io::Result<Vec<_>>>()?;
        assert_eq!(words, vec![1, 2151677953]);
        assert_eq!(reader.rejected(), 1);
        Ok(())
    }

    #[test]
    fn test_serve_connection_survives_binary_garbage() -> io::Result<()> {
        let mut engine = Engine::new();
        let mut output = Vec::new();
        let input = Cursor::new(&b"1\n\xff\xfe\n1\n"[..]);
        let stats = serve_connection(&mut engine, input, &mut output)?;

        assert_eq!(stats.words_received, 2);
        assert_eq!(stats.tokens_rejected, 1);
        assert_eq!(output, b"1\n1\n");
        Ok(())
    }

    #[test]
    fn test_write_words() -> io::Result<()> {
        let mut out = Vec::new();
        write_words(&mut out, &[1, 22, 333])?;
        assert_eq!(out, b"1\n22\n333\n");
        Ok(())
    }

    #[test]
    fn test_serve_connection() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let codec = WordCodec::standard();
        let power = codec.encode_value(Sdi::ZERO, &Value::Power(Some(80.0)))?;
        let input = format!("{}\nnot-a-word\n{}\n", power, power ^ 1);

        let mut engine = Engine::new();
        let mut output = Vec::new();
        let stats = serve_connection(&mut engine, Cursor::new(input), &mut output)?;

        assert_eq!(
            stats,
            SessionStats {
                words_received: 2,
                words_sent: 2,
                tokens_rejected: 1,
            }
        );
        let replies: Vec<u32> = String::from_utf8(output)?
            .lines()
            .map(parse_token)
            .collect::<Result<_>>()?;
        assert_eq!(replies.len(), 2);
        assert_eq!(codec.decode(replies[0])?.value, Value::Power(Some(0.0)));
        assert_eq!(replies[1], ERROR_WORD);
        assert_eq!(engine.state().desired_power, 80.0);
        Ok(())
    }
}
