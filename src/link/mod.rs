//! # Link Module
//!
//! The half-duplex link-turn protocol between the ground station and the
//! flight computer.
//!
//! This module handles:
//! - Reply payload formats and reply codes
//! - The bounded outbound reply queue (drop-newest when full)
//! - The radio abstraction the protocol runs on
//! - The receive → render → dequeue → transmit turn

pub mod protocol;
pub mod queue;
pub mod radio;
pub mod turn;

pub use protocol::OutboundPayload;
pub use queue::{EnqueueOutcome, OutboundQueue};
pub use radio::Radio;
pub use turn::{LinkState, LinkTurnController, TurnOutcome, TurnSettings};
