//! # Serial Radio Module
//!
//! Drives a UART LoRa modem running in transparent mode.
//!
//! This module handles:
//! - Opening the modem's serial port (8N1, configurable baud rate)
//! - Delimiting inbound frames by idle time on the line
//! - Stripping the optional trailing RSSI byte some modems append
//! - Writing reply frames and waiting for them to drain

pub mod port_trait;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::time::{sleep, timeout, Duration};
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tracing::{debug, info, trace, warn};

use crate::config::{RadioConfig, SerialConfig};
use crate::error::{GroundStationError, Result};
use crate::link::radio::Radio;
use port_trait::SerialPortIO;

/// Read chunk size while assembling a frame
const READ_CHUNK_SIZE: usize = 64;

/// LoRa modem attached over a serial line
pub struct SerialRadio<P: SerialPortIO> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Bytes of the frame being assembled
    pending: BytesMut,
    frame_ready: bool,
    /// Frame was cut at the size cap, so its last byte is payload
    frame_overflow: bool,
    frame_gap: Duration,
    max_frame_len: usize,
    rssi_byte: bool,
    last_rssi: Option<i16>,
}

impl<P: SerialPortIO> std::fmt::Debug for SerialRadio<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadio")
            .field("device_path", &self.device_path)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl SerialRadio<tokio_serial::SerialStream> {
    /// Open the modem on the first configured device path that works.
    ///
    /// Waits `radio.settle_ms` after opening and discards anything the modem
    /// printed while booting.
    ///
    /// # Errors
    ///
    /// Returns [`GroundStationError::RadioInit`] if no device could be opened
    /// or prepared.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lora_ground_station::config::Config;
    /// use lora_ground_station::serial::SerialRadio;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let radio = SerialRadio::open(&config.serial, &config.radio).await?;
    ///     println!("Modem on {}", radio.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(serial: &SerialConfig, radio: &RadioConfig) -> Result<Self> {
        let paths: Vec<&str> = serial.ports.iter().map(String::as_str).collect();
        let (port, device_path) = Self::open_with_paths(&paths, serial.baud_rate)
            .map_err(|e| GroundStationError::RadioInit(e.to_string()))?;

        sleep(Duration::from_millis(radio.settle_ms)).await;

        port.clear(tokio_serial::ClearBuffer::Input).map_err(|e| {
            GroundStationError::RadioInit(format!("Failed to clear {}: {}", device_path, e))
        })?;

        info!("LoRa modem ready on {} at {} baud", device_path, serial.baud_rate);
        Ok(Self::with_port(port, device_path, radio))
    }

    /// Open the first of `paths` that accepts the serial settings
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Returns
    ///
    /// * `Result<(SerialStream, String)>` - Opened port and its path
    pub fn open_with_paths(
        paths: &[&str],
        baud_rate: u32,
    ) -> Result<(tokio_serial::SerialStream, String)> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened modem at {}", path);
                    return Ok((port, path.to_string()));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(GroundStationError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| GroundStationError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> SerialRadio<P> {
    /// Wrap an already opened port
    pub fn with_port(port: P, device_path: impl Into<String>, radio: &RadioConfig) -> Self {
        Self {
            port,
            device_path: device_path.into(),
            pending: BytesMut::with_capacity(radio.max_frame_len + 1),
            frame_ready: false,
            frame_overflow: false,
            frame_gap: Duration::from_millis(radio.frame_gap_ms),
            max_frame_len: radio.max_frame_len,
            rssi_byte: radio.rssi_byte,
            last_rssi: None,
        }
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Frame size on the wire, including the RSSI byte when enabled
    fn wire_frame_cap(&self) -> usize {
        self.max_frame_len + usize::from(self.rssi_byte)
    }

    /// Read until the line goes idle for one frame gap or the frame is full
    async fn fill_pending(&mut self) {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.pending.len() < self.wire_frame_cap() {
            let want = (self.wire_frame_cap() - self.pending.len()).min(READ_CHUNK_SIZE);

            match timeout(self.frame_gap, self.port.read(&mut chunk[..want])).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => self.pending.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    warn!("Serial read failed on {}: {}", self.device_path, e);
                    break;
                }
                // Line idle: frame boundary
                Err(_) => break,
            }
        }

        self.frame_ready = !self.pending.is_empty();
        self.frame_overflow = self.pending.len() >= self.wire_frame_cap();
    }
}

#[async_trait]
impl<P: SerialPortIO> Radio for SerialRadio<P> {
    async fn is_frame_available(&mut self) -> bool {
        if !self.frame_ready {
            self.fill_pending().await;
        }
        self.frame_ready
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.frame_ready {
            self.fill_pending().await;
        }
        if !self.frame_ready {
            return Err(GroundStationError::NoFrame);
        }

        let mut frame = self.pending.split();
        self.frame_ready = false;

        if self.rssi_byte {
            if self.frame_overflow {
                debug!("Frame hit {} bytes, no RSSI byte to strip", frame.len());
                self.last_rssi = None;
            } else if let Some(&raw) = frame.last() {
                frame.truncate(frame.len() - 1);
                self.last_rssi = Some(-(256 - i16::from(raw)));
            }
        }
        self.frame_overflow = false;

        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        trace!("Received frame ({} bytes) on {}", len, self.device_path);
        Ok(len)
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.port
            .write_all(data)
            .await
            .map_err(|e| GroundStationError::Serial(format!("Failed to write frame: {}", e)))?;

        debug!("Sent frame ({} bytes)", data.len());
        Ok(())
    }

    async fn wait_until_sent(&mut self) -> Result<()> {
        self.port
            .flush()
            .await
            .map_err(|e| GroundStationError::Serial(format!("Failed to flush serial port: {}", e)))
    }

    async fn set_receive_mode(&mut self) -> Result<()> {
        // Transparent modems listen whenever idle; only local state needs resetting
        self.pending.clear();
        self.frame_ready = false;
        self.frame_overflow = false;
        Ok(())
    }

    fn last_signal_strength(&self) -> Option<i16> {
        self.last_rssi
    }

    fn last_noise_estimate(&self) -> Option<f32> {
        None
    }
}
