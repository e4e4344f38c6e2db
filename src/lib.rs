//! # LoRa Ground Station Library
//!
//! Ground-station side of a half-duplex LoRa link to a flight computer.
//!
//! Every telemetry frame received from the flight computer licenses exactly
//! one reply from the ground station. Operator commands queue replies; the
//! link turn sends them one per received frame, or a keepalive when nothing
//! is queued.

pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod gps;
pub mod link;
pub mod serial;
pub mod station;
pub mod telemetry;
