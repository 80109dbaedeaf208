use std::collections::VecDeque;

use crate::error::{LlmError, Result};

/// Circular buffer for line-based parsing of a byte stream
/// Newlines are single bytes in UTF-8, so splitting on them never cuts a character
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer, without the line terminator
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(Self::to_line(line_bytes))
    }

    /// Drain an unterminated trailing line, if any
    pub fn take_remainder(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(Self::to_line(line_bytes))
    }

    fn to_line(line_bytes: Vec<u8>) -> Result<String> {
        match String::from_utf8(line_bytes) {
            Ok(line) => Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
            Err(e) => Err(LlmError::Decode(format!("Invalid UTF-8 in stream line: {}", e))),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_buffer_basic() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\r\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_multibyte_split_across_extends() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let bytes = "data: né\n".as_bytes();

        buffer.extend(&bytes[..7]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[7..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: né");
    }

    #[test]
    fn test_take_remainder() {
        let mut buffer = CircularLineBuffer::with_capacity(16);
        buffer.extend(b"a\ntail");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "a");
        assert_eq!(buffer.take_remainder().unwrap().unwrap(), "tail");
        assert!(buffer.take_remainder().is_none());
    }
}
