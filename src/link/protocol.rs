//! # Link Protocol Constants and Types
//!
//! Wire-level definitions for the ground-to-flight-computer reply frames.
//!
//! Every reply is a short ASCII record of the form `"<code>,<value>"`:
//!
//! | Reply            | Wire text   |
//! |------------------|-------------|
//! | Keepalive/no-op  | `0,000.00`  |
//! | Ping ack         | `1,000.00`  |
//! | Set value 42.5   | `2,42.50`   |

use std::fmt;

use crate::error::{GroundStationError, Result};

/// Maximum reply payload size in bytes
pub const MAX_PAYLOAD_LEN: usize = 20;

/// Value-setting arguments are reduced modulo this before formatting
pub const VALUE_MODULUS: f64 = 100.0;

/// Value field of the fixed (argument-less) replies
pub const FIXED_REPLY_VALUE: &str = "000.00";

/// Reply codes understood by the flight computer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    /// No operator command pending
    NoOp = 0,
    /// Acknowledge a ping
    PingAck = 1,
    /// Set the flight computer's adjustable value (LED intensity)
    SetValue = 2,
}

impl ReplyCode {
    /// Numeric code as it appears on the wire
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One reply frame queued for transmission.
///
/// Immutable once built; the link-turn controller consumes each payload
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPayload(String);

impl OutboundPayload {
    /// Build a payload from pre-formatted wire text
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the text is not ASCII or exceeds
    /// [`MAX_PAYLOAD_LEN`] bytes.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();

        if !text.is_ascii() {
            return Err(GroundStationError::Protocol(format!(
                "Payload must be ASCII: {:?}",
                text
            )));
        }

        if text.len() > MAX_PAYLOAD_LEN {
            return Err(GroundStationError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                text.len(),
                MAX_PAYLOAD_LEN
            )));
        }

        Ok(Self(text))
    }

    /// The default reply sent when nothing is queued
    pub fn keepalive() -> Self {
        Self::fixed(ReplyCode::NoOp)
    }

    /// Reply acknowledging a ping
    pub fn ping_ack() -> Self {
        Self::fixed(ReplyCode::PingAck)
    }

    /// Reply carrying a value-setting command.
    ///
    /// The value is reduced modulo [`VALUE_MODULUS`] (keeping the sign, like
    /// C's `fmod`) and printed with two decimals.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_ground_station::link::protocol::OutboundPayload;
    ///
    /// assert_eq!(OutboundPayload::set_value(137.4).as_str(), "2,37.40");
    /// ```
    pub fn set_value(value: f64) -> Self {
        let reduced = value % VALUE_MODULUS;
        // |reduced| < 100 prints at most "-99.99"; non-finite input prints "NaN"
        Self(format!("{},{:.2}", ReplyCode::SetValue.code(), reduced))
    }

    fn fixed(code: ReplyCode) -> Self {
        Self(format!("{},{}", code.code(), FIXED_REPLY_VALUE))
    }

    /// Wire text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is the default no-op reply
    pub fn is_keepalive(&self) -> bool {
        *self == Self::keepalive()
    }
}

impl fmt::Display for OutboundPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_codes() {
        assert_eq!(ReplyCode::NoOp.code(), 0);
        assert_eq!(ReplyCode::PingAck.code(), 1);
        assert_eq!(ReplyCode::SetValue.code(), 2);
    }

    #[test]
    fn test_fixed_replies() {
        assert_eq!(OutboundPayload::keepalive().as_str(), "0,000.00");
        assert_eq!(OutboundPayload::ping_ack().as_str(), "1,000.00");
        assert!(OutboundPayload::keepalive().is_keepalive());
        assert!(!OutboundPayload::ping_ack().is_keepalive());
    }

    #[test]
    fn test_set_value_reduces_modulo_100() {
        assert_eq!(OutboundPayload::set_value(137.4).as_str(), "2,37.40");
        assert_eq!(OutboundPayload::set_value(42.5).as_str(), "2,42.50");
        assert_eq!(OutboundPayload::set_value(100.0).as_str(), "2,0.00");
        assert_eq!(OutboundPayload::set_value(0.0).as_str(), "2,0.00");
    }

    #[test]
    fn test_set_value_keeps_sign() {
        assert_eq!(OutboundPayload::set_value(-105.25).as_str(), "2,-5.25");
    }

    #[test]
    fn test_set_value_fits_payload() {
        for value in [-99.999, 99.999, 1e12, -1e12, f64::INFINITY, f64::NAN] {
            assert!(OutboundPayload::set_value(value).len() <= MAX_PAYLOAD_LEN);
        }
    }

    #[test]
    fn test_new_accepts_max_length() {
        let text = "x".repeat(MAX_PAYLOAD_LEN);
        let payload = OutboundPayload::new(text.clone()).unwrap();
        assert_eq!(payload.as_str(), text);
    }

    #[test]
    fn test_new_rejects_oversize() {
        let result = OutboundPayload::new("x".repeat(MAX_PAYLOAD_LEN + 1));
        assert!(matches!(result, Err(GroundStationError::Protocol(_))));
    }

    #[test]
    fn test_new_rejects_non_ascii() {
        assert!(OutboundPayload::new("2,4°").is_err());
    }

    #[test]
    fn test_display_matches_wire_text() {
        let payload = OutboundPayload::ping_ack();
        assert_eq!(payload.to_string(), "1,000.00");
        assert_eq!(payload.as_bytes(), b"1,000.00");
    }
}
