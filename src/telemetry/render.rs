//! # Telemetry Rendering
//!
//! Human-readable renderings of inbound frames for the operator console.

use serde::Deserialize;

use super::frame::TelemetryFrame;

/// Prefix of every rendered flight-computer frame
pub const FRAME_PREFIX: &str = "FC:";

/// Raw mode never scans further than this into a frame
pub const RAW_SCAN_LIMIT: usize = 200;

/// How inbound frames are shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Verbatim printable text, no field extraction
    #[default]
    Raw,
    /// Labelled schema fields
    Structured,
}

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte) || matches!(byte, b'\r' | b'\n' | b'\t')
}

/// Render the printable part of a frame verbatim.
///
/// Leading non-printable bytes are skipped. Output stops at a NUL, at the
/// first non-printable byte after printable content, or after
/// [`RAW_SCAN_LIMIT`] bytes, so binary garbage behind a truncated frame is
/// never echoed. Embedded line breaks are kept; a trailing one is trimmed
/// because the console terminates every line itself.
///
/// # Examples
///
/// ```
/// use lora_ground_station::telemetry::render::render_raw;
///
/// assert_eq!(render_raw(b"ID:1,2,3\x00\xFF\xFFgarbage"), "FC:ID:1,2,3");
/// ```
pub fn render_raw(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(FRAME_PREFIX.len() + bytes.len().min(RAW_SCAN_LIMIT));
    out.push_str(FRAME_PREFIX);

    let mut found_printable = false;
    for &byte in bytes.iter().take(RAW_SCAN_LIMIT) {
        if byte == 0 {
            break;
        }
        if is_printable(byte) {
            out.push(byte as char);
            found_printable = true;
        } else if found_printable {
            break;
        }
    }

    let trimmed = out.trim_end_matches(|c: char| c == '\r' || c == '\n').len();
    out.truncate(trimmed);
    out
}

/// Render each present field with its label; absent fields are skipped.
///
/// ```text
/// FC: ID=FC1, Ack=1, RSSI=-45, SNR=9.75
/// ```
pub fn render_structured(frame: &TelemetryFrame<'_>) -> String {
    let Some(id) = frame.id() else {
        return format!("{} (empty frame)", FRAME_PREFIX);
    };

    let mut out = format!("{} ID={}", FRAME_PREFIX, id);
    for (field, value) in frame.present_fields() {
        out.push_str(", ");
        out.push_str(field.label());
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Render a received payload in the requested mode
pub fn render(bytes: &[u8], mode: RenderMode) -> String {
    match mode {
        RenderMode::Raw => render_raw(bytes),
        RenderMode::Structured => render_structured(&TelemetryFrame::parse(bytes)),
    }
}
