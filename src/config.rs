//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{GroundStationError, Result};
use crate::telemetry::render::RenderMode;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub gps: GpsConfig,
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration for the UART LoRa modem
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device paths tried in order
    #[serde(default = "default_serial_ports")]
    pub ports: Vec<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Radio framing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    /// Idle time on the UART that closes an inbound frame
    #[serde(default = "default_frame_gap_ms")]
    pub frame_gap_ms: u64,

    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,

    /// Modem appends one RSSI byte to every received frame
    #[serde(default)]
    pub rssi_byte: bool,

    /// Delay after opening the port before the modem is used
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Link-turn protocol configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub render_mode: RenderMode,

    /// Run turns on a timer instead of on radio availability
    #[serde(default)]
    pub debug_rx: bool,

    #[serde(default = "default_debug_interval_ms")]
    pub debug_interval_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,
}

/// Operator command line configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    #[serde(default = "default_line_capacity")]
    pub line_capacity: usize,

    #[serde(default)]
    pub start_marker: Option<char>,

    #[serde(default = "default_end_marker")]
    pub end_marker: char,
}

/// GPS status line configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GpsConfig {
    #[serde(default = "default_gps_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gps_print_interval_ms")]
    pub print_interval_ms: u64,
}

/// Station identity and housekeeping
#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    #[serde(default = "default_callsign")]
    pub callsign: String,

    #[serde(default)]
    pub show_callsign: bool,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated diagnostic logs (disabled when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

// Default value functions
fn default_serial_ports() -> Vec<String> {
    vec!["/dev/ttyUSB0".to_string(), "/dev/ttyACM0".to_string()]
}
fn default_baud_rate() -> u32 { 9600 }

fn default_frame_gap_ms() -> u64 { 20 }
fn default_max_frame_len() -> usize { 251 }
fn default_settle_ms() -> u64 { 100 }

fn default_queue_capacity() -> usize { 10 }
fn default_debug_interval_ms() -> u64 { 1000 }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_tx_timeout_ms() -> u64 { 2000 }

fn default_line_capacity() -> usize { 32 }
fn default_end_marker() -> char { '\n' }

fn default_gps_enabled() -> bool { true }
fn default_gps_print_interval_ms() -> u64 { 1000 }

fn default_callsign() -> String { "VA2ETD".to_string() }
fn default_heartbeat_interval_ms() -> u64 { 5000 }

fn default_log_level() -> String { "info".to_string() }

/// Baud rates supported by common UART LoRa modems
const SUPPORTED_BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            ports: default_serial_ports(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frame_gap_ms: default_frame_gap_ms(),
            max_frame_len: default_max_frame_len(),
            rssi_byte: false,
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            render_mode: RenderMode::default(),
            debug_rx: false,
            debug_interval_ms: default_debug_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            tx_timeout_ms: default_tx_timeout_ms(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            line_capacity: default_line_capacity(),
            start_marker: None,
            end_marker: default_end_marker(),
        }
    }
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            enabled: default_gps_enabled(),
            print_interval_ms: default_gps_print_interval_ms(),
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            callsign: default_callsign(),
            show_callsign: false,
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> GroundStationError {
    GroundStationError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lora_ground_station::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.ports.is_empty() || self.serial.ports.iter().any(|p| p.is_empty()) {
            return Err(invalid("serial ports must be a non-empty list of non-empty paths"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.radio.frame_gap_ms == 0 || self.radio.frame_gap_ms > 1000 {
            return Err(invalid("frame_gap_ms must be between 1 and 1000"));
        }

        if self.radio.max_frame_len == 0 || self.radio.max_frame_len > 255 {
            return Err(invalid("max_frame_len must be between 1 and 255"));
        }

        if self.radio.settle_ms > 10000 {
            return Err(invalid("settle_ms must be at most 10000"));
        }

        // One slot stays reserved, so two is the smallest useful queue
        if self.link.queue_capacity < 2 || self.link.queue_capacity > 64 {
            return Err(invalid("queue_capacity must be between 2 and 64"));
        }

        if self.link.debug_interval_ms == 0 || self.link.debug_interval_ms > 60000 {
            return Err(invalid("debug_interval_ms must be between 1 and 60000"));
        }

        if self.link.poll_interval_ms == 0 || self.link.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        if self.link.tx_timeout_ms == 0 || self.link.tx_timeout_ms > 10000 {
            return Err(invalid("tx_timeout_ms must be between 1 and 10000"));
        }

        if self.command.line_capacity < 2 || self.command.line_capacity > 256 {
            return Err(invalid("line_capacity must be between 2 and 256"));
        }

        if !self.command.end_marker.is_ascii() {
            return Err(invalid("end_marker must be an ASCII character"));
        }

        if let Some(start) = self.command.start_marker {
            if !start.is_ascii() || start == self.command.end_marker {
                return Err(invalid("start_marker must be ASCII and differ from end_marker"));
            }
        }

        if self.gps.print_interval_ms == 0 || self.gps.print_interval_ms > 60000 {
            return Err(invalid("gps print_interval_ms must be between 1 and 60000"));
        }

        if self.station.heartbeat_interval_ms == 0 || self.station.heartbeat_interval_ms > 600_000 {
            return Err(invalid("heartbeat_interval_ms must be between 1 and 600000"));
        }

        if self.station.show_callsign && self.station.callsign.trim().is_empty() {
            return Err(invalid("callsign cannot be empty when show_callsign is enabled"));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        if matches!(self.logging.log_dir.as_deref(), Some("")) {
            return Err(invalid("log_dir cannot be empty when set"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
ports = ["/dev/ttyUSB1"]
baud_rate = 115200

[link]
queue_capacity = 5
render_mode = "structured"

[command]
start_marker = "<"

[station]
callsign = "VE2XYZ"
show_callsign = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.ports, vec!["/dev/ttyUSB1".to_string()]);
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.link.queue_capacity, 5);
        assert_eq!(config.link.render_mode, RenderMode::Structured);
        assert_eq!(config.command.start_marker, Some('<'));
        assert_eq!(config.command.end_marker, '\n');
        assert_eq!(config.station.callsign, "VE2XYZ");
        // Untouched sections fall back to defaults
        assert_eq!(config.gps.print_interval_ms, 1000);
        assert_eq!(config.radio.max_frame_len, 251);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.link.queue_capacity, 10);
        assert_eq!(config.link.render_mode, RenderMode::Raw);
        assert_eq!(config.command.line_capacity, 32);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = Config::load("/nonexistent/ground-station.toml");
        assert!(matches!(result, Err(GroundStationError::Io(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = Config::from_toml_str("[link]\nqueue_capacity = \"ten\"");
        assert!(matches!(result, Err(GroundStationError::Config(_))));
    }

    #[test]
    fn test_unknown_render_mode_rejected() {
        let result = Config::from_toml_str("[link]\nrender_mode = \"hex\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_serial_ports() {
        let mut config = Config::default();
        config.serial.ports = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_serial_port_entry() {
        let mut config = Config::default();
        config.serial.ports = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in SUPPORTED_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_frame_gap_bounds() {
        let mut config = Config::default();
        config.radio.frame_gap_ms = 0;
        assert!(config.validate().is_err());
        config.radio.frame_gap_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_frame_len_bounds() {
        let mut config = Config::default();
        config.radio.max_frame_len = 0;
        assert!(config.validate().is_err());
        config.radio.max_frame_len = 256;
        assert!(config.validate().is_err());
        config.radio.max_frame_len = 255;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_capacity_bounds() {
        let mut config = Config::default();
        config.link.queue_capacity = 1;
        assert!(config.validate().is_err());
        config.link.queue_capacity = 65;
        assert!(config.validate().is_err());
        config.link.queue_capacity = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_zero() {
        let mut config = Config::default();
        config.link.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tx_timeout_too_high() {
        let mut config = Config::default();
        config.link.tx_timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_interval_zero() {
        let mut config = Config::default();
        config.link.debug_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_line_capacity_too_small() {
        let mut config = Config::default();
        config.command.line_capacity = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_marker_equal_to_end_marker() {
        let mut config = Config::default();
        config.command.start_marker = Some('\n');
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_ascii_end_marker() {
        let mut config = Config::default();
        config.command.end_marker = 'é';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gps_print_interval_zero() {
        let mut config = Config::default();
        config.gps.print_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_callsign_when_shown() {
        let mut config = Config::default();
        config.station.show_callsign = true;
        config.station.callsign = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_callsign_when_hidden() {
        let mut config = Config::default();
        config.station.callsign = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir() {
        let mut config = Config::default();
        config.logging.log_dir = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_ports(), vec!["/dev/ttyUSB0", "/dev/ttyACM0"]);
        assert_eq!(default_baud_rate(), 9600);
        assert_eq!(default_frame_gap_ms(), 20);
        assert_eq!(default_max_frame_len(), 251);
        assert_eq!(default_settle_ms(), 100);
        assert_eq!(default_queue_capacity(), 10);
        assert_eq!(default_debug_interval_ms(), 1000);
        assert_eq!(default_poll_interval_ms(), 10);
        assert_eq!(default_tx_timeout_ms(), 2000);
        assert_eq!(default_line_capacity(), 32);
        assert_eq!(default_end_marker(), '\n');
        assert!(default_gps_enabled());
        assert_eq!(default_gps_print_interval_ms(), 1000);
        assert_eq!(default_callsign(), "VA2ETD");
        assert_eq!(default_heartbeat_interval_ms(), 5000);
        assert_eq!(default_log_level(), "info");
    }
}
