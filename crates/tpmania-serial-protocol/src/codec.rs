//! Line-based codec for device communication.
//!
//! The firmware sends newline-terminated ASCII lines, sometimes padded with
//! NUL bytes, and a few single-byte tokens with no terminator at all. The
//! codec accumulates raw bytes and hands back cleaned lines.

use crate::constants::{LINE_TERMINATOR, NUL};
use bytes::BytesMut;

/// Initial buffer capacity; beat lines are short.
const INITIAL_CAPACITY: usize = 128;

/// A codec for reading and writing device lines.
///
/// - Accumulates received bytes until a complete line is found
/// - Strips NUL padding, surrounding whitespace and non-ASCII bytes
/// - Skips lines that are empty after cleaning
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// Returns `None` if no terminated, non-empty line is available yet.
    pub fn decode_line(&mut self) -> Option<String> {
        while let Some(end) = self
            .buffer
            .iter()
            .position(|&b| b == LINE_TERMINATOR || b == b'\r')
        {
            let raw = self.buffer.split_to(end + 1);
            let line = clean_line(&raw);
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Take whatever unterminated data is buffered.
    ///
    /// Used once a read times out, so that single-byte tokens like the
    /// end-of-transfer sentinel are delivered even though no newline follows.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = self.buffer.split();
        let line = clean_line(&raw);
        (!line.is_empty()).then_some(line)
    }

    /// Encode a data line for transmission.
    ///
    /// Appends the newline terminator.
    pub fn encode_line(text: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(LINE_TERMINATOR);
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Drop non-ASCII bytes, then trim whitespace and NUL padding from both ends.
fn clean_line(raw: &[u8]) -> String {
    let ascii: String = raw
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect();
    ascii
        .trim_matches(|c: char| c == NUL as char || c.is_ascii_whitespace())
        .to_string()
}
