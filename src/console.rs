//! # Operator Console
//!
//! Line-oriented operator output (telemetry renderings, link quality, GPS
//! status, command diagnostics). Diagnostics for developers go through
//! `tracing`; this stream is what the operator (or a GUI reading stdout)
//! sees. Writes are best-effort and never fail the caller.

use std::fmt::Display;
use std::io::{self, Write};
use tracing::debug;

/// Best-effort line writer for operator-facing text
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    /// Console writing to the process stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write one line and flush it
    pub fn line(&mut self, text: impl Display) {
        let result = writeln!(self.out, "{}", text).and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!("Console write failed: {}", e);
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> std::fmt::Debug for Console<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn captured_lines(console: &Console<Vec<u8>>) -> Vec<String> {
    String::from_utf8_lossy(console.get_ref())
        .lines()
        .map(str::to_string)
        .collect()
}
