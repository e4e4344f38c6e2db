//! # Error Types
//!
//! Custom error types for the ground station using `thiserror`.

use thiserror::Error;

/// Main error type for the ground station
#[derive(Debug, Error)]
pub enum GroundStationError {
    /// Link protocol errors (payload construction, framing)
    #[error("Link protocol error: {0}")]
    Protocol(String),

    /// Radio collaborator errors (receive/transmit failures)
    #[error("Radio error: {0}")]
    Radio(String),

    /// The radio had no frame to hand over
    #[error("No frame available")]
    NoFrame,

    /// Radio hardware could not be brought up
    #[error("Radio initialization failed: {0}")]
    RadioInit(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the ground station
pub type Result<T> = std::result::Result<T, GroundStationError>;
