//! # Command Line Assembly
//!
//! Builds operator command lines one byte at a time from the input stream.

use std::fmt;
use tracing::debug;

use crate::config::CommandConfig;

/// One complete operator command line (terminator removed)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCommandLine(String);

impl RawCommandLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawCommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-capacity line accumulator.
///
/// Keeps at most `capacity - 1` bytes per line; anything past that is
/// discarded until the end marker arrives. Non-ASCII bytes are stored as
/// `?`. With a start marker configured, bytes outside `start..end` are
/// ignored.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: Vec<u8>,
    capacity: usize,
    start_marker: Option<u8>,
    end_marker: u8,
    in_line: bool,
    truncated: bool,
}

impl LineAssembler {
    pub fn new(capacity: usize, start_marker: Option<u8>, end_marker: u8) -> Self {
        let capacity = capacity.max(2);
        Self {
            buf: Vec::with_capacity(capacity - 1),
            capacity,
            start_marker,
            end_marker,
            in_line: start_marker.is_none(),
            truncated: false,
        }
    }

    /// Build from the `[command]` configuration section
    pub fn from_config(config: &CommandConfig) -> Self {
        let end_marker = u8::try_from(config.end_marker).unwrap_or(b'\n');
        let start_marker = config.start_marker.and_then(|c| u8::try_from(c).ok());
        Self::new(config.line_capacity, start_marker, end_marker)
    }

    /// Feed one byte; returns the line when the end marker completes it
    pub fn push(&mut self, byte: u8) -> Option<RawCommandLine> {
        if !self.in_line {
            if Some(byte) == self.start_marker {
                self.in_line = true;
            }
            return None;
        }

        if byte == self.end_marker {
            return Some(self.finish());
        }

        if self.buf.len() < self.max_len() {
            self.buf.push(if byte.is_ascii() { byte } else { b'?' });
        } else {
            self.truncated = true;
        }
        None
    }

    /// Feed a chunk of input, collecting every line it completes
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<RawCommandLine> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Discard any partial line
    pub fn reset(&mut self) {
        self.buf.clear();
        self.truncated = false;
        self.in_line = self.start_marker.is_none();
    }

    /// Bytes buffered for the line in progress
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Longest line that can be assembled
    pub fn max_len(&self) -> usize {
        self.capacity - 1
    }

    fn finish(&mut self) -> RawCommandLine {
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        if self.truncated {
            debug!("Command line exceeded {} bytes and was truncated", self.max_len());
        }

        // Only ASCII was stored
        let line = RawCommandLine(self.buf.iter().map(|&b| b as char).collect());
        self.reset();
        line
    }
}
