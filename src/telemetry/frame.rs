//! # Telemetry Frame
//!
//! Borrowed, non-destructive view of one inbound flight-computer frame:
//!
//! ```text
//! <id>:<ack>,<rssi>,<snr>,<batt>,<pitch>,<roll>,<yaw>,<accX>,<accY>,<accZ>,<pressure>,<alt>,<temp>,<ledStatus>,<ledPWM>,<sdStatus>
//! ```
//!
//! The identifier ends at the first `:` or `,`; every later token is split on
//! `,` only. Short frames are normal on a lossy link, so a missing field is
//! reported as `None` and never as zero.

use std::str::FromStr;

/// Identifier plus the 16 schema fields
pub const MAX_FRAME_TOKENS: usize = 17;

/// Schema fields following the frame identifier, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    Ack,
    Rssi,
    Snr,
    BatteryVoltage,
    Pitch,
    Roll,
    Yaw,
    AccelX,
    AccelY,
    AccelZ,
    Pressure,
    Altitude,
    Temperature,
    LedStatus,
    LedPwm,
    SdStatus,
}

impl TelemetryField {
    /// All fields in wire order
    pub const ALL: [TelemetryField; 16] = [
        TelemetryField::Ack,
        TelemetryField::Rssi,
        TelemetryField::Snr,
        TelemetryField::BatteryVoltage,
        TelemetryField::Pitch,
        TelemetryField::Roll,
        TelemetryField::Yaw,
        TelemetryField::AccelX,
        TelemetryField::AccelY,
        TelemetryField::AccelZ,
        TelemetryField::Pressure,
        TelemetryField::Altitude,
        TelemetryField::Temperature,
        TelemetryField::LedStatus,
        TelemetryField::LedPwm,
        TelemetryField::SdStatus,
    ];

    /// Token position in the frame (the identifier is token 0)
    pub fn token_index(self) -> usize {
        self as usize + 1
    }

    /// Display label used in structured rendering
    pub fn label(self) -> &'static str {
        match self {
            TelemetryField::Ack => "Ack",
            TelemetryField::Rssi => "RSSI",
            TelemetryField::Snr => "SNR",
            TelemetryField::BatteryVoltage => "Battery",
            TelemetryField::Pitch => "Pitch",
            TelemetryField::Roll => "Roll",
            TelemetryField::Yaw => "Yaw",
            TelemetryField::AccelX => "AccX",
            TelemetryField::AccelY => "AccY",
            TelemetryField::AccelZ => "AccZ",
            TelemetryField::Pressure => "Pressure",
            TelemetryField::Altitude => "Altitude",
            TelemetryField::Temperature => "Temp",
            TelemetryField::LedStatus => "LED",
            TelemetryField::LedPwm => "LED PWM",
            TelemetryField::SdStatus => "SD",
        }
    }
}

/// Text of a raw frame: everything before the first NUL, cut back to the
/// longest valid UTF-8 prefix.
pub fn frame_text(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    match std::str::from_utf8(bytes) {
        Ok(text) => text,
        // valid_up_to() always marks a char boundary
        Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Lazily split frame text into its non-empty tokens
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let text = text.trim_start_matches(|c: char| c == ':' || c == ',');
    let (id, rest) = match text.find(|c: char| c == ':' || c == ',') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };

    std::iter::once(id)
        .chain(rest.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// One parsed telemetry frame, borrowing from the receive buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryFrame<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> TelemetryFrame<'a> {
    /// Parse a received payload. Never fails: unusable input yields an
    /// empty frame and extra tokens beyond the schema are ignored.
    pub fn parse(bytes: &'a [u8]) -> Self {
        let tokens = tokens(frame_text(bytes)).take(MAX_FRAME_TOKENS).collect();
        Self { tokens }
    }

    /// Command / source identifier (token 0)
    pub fn id(&self) -> Option<&'a str> {
        self.tokens.first().copied()
    }

    pub fn field(&self, field: TelemetryField) -> Option<&'a str> {
        self.tokens.get(field.token_index()).copied()
    }

    /// Parse a present field; `None` when absent or unparseable
    pub fn parse_field<T: FromStr>(&self, field: TelemetryField) -> Option<T> {
        self.field(field).and_then(|value| value.parse().ok())
    }

    /// Present schema fields in wire order
    pub fn present_fields(&self) -> impl Iterator<Item = (TelemetryField, &'a str)> + '_ {
        TelemetryField::ALL
            .into_iter()
            .filter_map(move |field| self.field(field).map(|value| (field, value)))
    }

    /// Number of schema fields present (identifier excluded)
    pub fn field_count(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_FRAME: &[u8] =
        b"FC1:1,-45,9.75,7.92,1.5,-0.5,180.0,0.01,0.02,9.81,101325,152.3,21.4,1,128,1";

    #[test]
    fn test_token_indices_follow_wire_order() {
        for (i, field) in TelemetryField::ALL.iter().enumerate() {
            assert_eq!(field.token_index(), i + 1);
        }
    }

    #[test]
    fn test_parse_full_frame() {
        let frame = TelemetryFrame::parse(FULL_FRAME);

        assert_eq!(frame.id(), Some("FC1"));
        assert_eq!(frame.field_count(), 16);
        assert_eq!(frame.field(TelemetryField::Ack), Some("1"));
        assert_eq!(frame.parse_field::<i32>(TelemetryField::Rssi), Some(-45));
        assert_eq!(frame.parse_field::<f32>(TelemetryField::BatteryVoltage), Some(7.92));
        assert_eq!(frame.parse_field::<f64>(TelemetryField::AccelZ), Some(9.81));
        assert_eq!(frame.field(TelemetryField::LedPwm), Some("128"));
        assert_eq!(frame.field(TelemetryField::SdStatus), Some("1"));
    }

    #[test]
    fn test_short_frame_leaves_fields_absent() {
        let frame = TelemetryFrame::parse(b"FC1:1,-45,9.75,7.92,1.5");

        assert_eq!(frame.field_count(), 5);
        assert_eq!(frame.field(TelemetryField::Pitch), Some("1.5"));
        assert_eq!(frame.field(TelemetryField::Roll), None);
        assert_eq!(frame.parse_field::<f32>(TelemetryField::Altitude), None);
        assert_eq!(frame.present_fields().count(), 5);
    }

    #[test]
    fn test_absent_is_distinct_from_zero() {
        let frame = TelemetryFrame::parse(b"X:0");
        assert_eq!(frame.parse_field::<i32>(TelemetryField::Ack), Some(0));
        assert_eq!(frame.parse_field::<i32>(TelemetryField::Rssi), None);
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        let mut long = FULL_FRAME.to_vec();
        long.extend_from_slice(b",99,98");
        let frame = TelemetryFrame::parse(&long);
        assert_eq!(frame.field_count(), 16);
        assert_eq!(frame.field(TelemetryField::SdStatus), Some("1"));
    }

    #[test]
    fn test_stops_at_nul_and_invalid_utf8() {
        let frame = TelemetryFrame::parse(b"ID:1,2,3\x00\xFF\xFFgarbage");
        assert_eq!(frame.id(), Some("ID"));
        assert_eq!(frame.field_count(), 3);

        let frame = TelemetryFrame::parse(b"ID:1,2\xFF,3");
        assert_eq!(frame.field_count(), 2);
        assert_eq!(frame.field(TelemetryField::Rssi), Some("2"));
    }

    #[test]
    fn test_identifier_without_colon() {
        let frame = TelemetryFrame::parse(b"ID,1,2");
        assert_eq!(frame.id(), Some("ID"));
        assert_eq!(frame.field(TelemetryField::Ack), Some("1"));
    }

    #[test]
    fn test_only_first_colon_splits() {
        let frame = TelemetryFrame::parse(b"ID:12:30,5");
        assert_eq!(frame.field(TelemetryField::Ack), Some("12:30"));
        assert_eq!(frame.field(TelemetryField::Rssi), Some("5"));
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        let frame = TelemetryFrame::parse(b":ID:1,,2,\r\n");
        assert_eq!(frame.id(), Some("ID"));
        assert_eq!(frame.field(TelemetryField::Ack), Some("1"));
        assert_eq!(frame.field(TelemetryField::Rssi), Some("2"));
        assert_eq!(frame.field_count(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(TelemetryFrame::parse(b"").is_empty());
        assert!(TelemetryFrame::parse(b"\x00abc").is_empty());
        assert_eq!(TelemetryFrame::parse(b"").field_count(), 0);
    }

    #[test]
    fn test_parse_does_not_modify_input() {
        let buffer = FULL_FRAME.to_vec();
        let frame = TelemetryFrame::parse(&buffer);
        assert_eq!(frame.field_count(), 16);
        assert_eq!(buffer, FULL_FRAME);
    }
}
