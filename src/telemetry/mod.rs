//! # Telemetry Module
//!
//! Decomposes inbound flight-computer frames for display.
//!
//! This module handles:
//! - Borrowed, non-destructive splitting of a frame into schema fields
//! - Raw rendering (printable text only, stops at trailing garbage)
//! - Structured rendering (labelled fields, absent fields skipped)

pub mod frame;
pub mod render;

pub use frame::{TelemetryField, TelemetryFrame};
pub use render::RenderMode;
