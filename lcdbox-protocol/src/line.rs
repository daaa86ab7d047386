//! Newline-terminated line assembly for the serial channel.
//!
//! Bytes arrive in arbitrary chunks from the USB serial endpoint. The
//! [`LineBuffer`] collects them until `\n` and hands back the trimmed line.
//! A trailing `\r` is removed by the trim, so both `\n` and `\r\n` work.
//!
//! Lines longer than [`MAX_LINE_LEN`] are dropped as a whole: the buffer
//! discards bytes until the next newline and then reports
//! [`LineError::Overflow`] once.

use heapless::{String, Vec};

/// Maximum line length in bytes, excluding the terminator
pub const MAX_LINE_LEN: usize = 64;

/// Errors reported when a line cannot be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded `MAX_LINE_LEN` before its newline arrived
    Overflow,
    /// Line was not valid UTF-8
    InvalidUtf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Accumulating bytes of the current line
    Collecting,
    /// Current line overflowed, dropping bytes until newline
    Discarding,
}

/// Byte-at-a-time line assembler
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buffer: Vec<u8, MAX_LINE_LEN>,
    state: LineState,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty line buffer
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: LineState::Collecting,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = LineState::Collecting;
    }

    /// Number of bytes buffered for the current line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a newline completes a non-empty line,
    /// `Ok(None)` when more bytes are needed or the line was blank, and `Err`
    /// when the completed line has to be thrown away.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<MAX_LINE_LEN>>, LineError> {
        match self.state {
            LineState::Collecting => {
                if byte == b'\n' {
                    return self.take_line();
                }
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.state = LineState::Discarding;
                }
                Ok(None)
            }
            LineState::Discarding => {
                if byte == b'\n' {
                    self.state = LineState::Collecting;
                    return Err(LineError::Overflow);
                }
                Ok(None)
            }
        }
    }

    fn take_line(&mut self) -> Result<Option<String<MAX_LINE_LEN>>, LineError> {
        let result = match core::str::from_utf8(&self.buffer) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    let mut line = String::new();
                    // Cannot fail: `text` is a slice of a buffer of the same capacity
                    let _ = line.push_str(text);
                    Ok(Some(line))
                }
            }
            Err(_) => Err(LineError::InvalidUtf8),
        };
        self.buffer.clear();
        result
    }
}
