//! # Link-Turn Controller
//!
//! Runs the half-duplex exchange cycle. The radio has no acknowledgment
//! and only one side may transmit at a time, so every inbound frame from
//! the flight computer is treated as the poll that licenses exactly one
//! outbound reply:
//!
//! 1. Clear the receive buffer
//! 2. Receive one frame, stamp it and measure delta-t since the previous one
//! 3. Bound the received bytes to the reported length
//! 4. Render the frame for the operator
//! 5. Report link quality (RSSI, SNR, delta-t)
//! 6. Dequeue one reply (keepalive when nothing is queued)
//! 7. Transmit it
//! 8. Wait for completion, then return the radio to receive mode
//!
//! A failed receive skips the turn with nothing sent. A failed transmit is
//! not retried.

use chrono::{DateTime, Utc};
use std::io::Write;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, warn};

use super::protocol::OutboundPayload;
use super::queue::OutboundQueue;
use super::radio::Radio;
use crate::config::{LinkConfig, RadioConfig};
use crate::console::Console;
use crate::error::{GroundStationError, Result};
use crate::telemetry::render::{render, RenderMode};

/// Prefix of the link-quality line
pub const LINK_QUALITY_PREFIX: &str = "GS:";

/// Controller tuning taken from configuration
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub render_mode: RenderMode,
    /// Run turns on this fixed period instead of on radio availability
    pub debug_interval: Option<Duration>,
    /// Upper bound on waiting for a transmission to complete
    pub tx_timeout: Duration,
    pub max_frame_len: usize,
}

impl TurnSettings {
    pub fn from_config(link: &LinkConfig, radio: &RadioConfig) -> Self {
        Self {
            render_mode: link.render_mode,
            debug_interval: link
                .debug_rx
                .then(|| Duration::from_millis(link.debug_interval_ms)),
            tx_timeout: Duration::from_millis(link.tx_timeout_ms),
            max_frame_len: radio.max_frame_len,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&LinkConfig::default(), &RadioConfig::default())
    }
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Waiting for the radio to report a frame
    Idle,
    /// Executing one exchange
    TurnInProgress,
    /// Radio never came up; no further turns are attempted
    Halted { reason: String },
}

/// Counters for heartbeat reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub turns: u64,
    pub skipped: u64,
    pub tx_failures: u64,
}

/// What happened during one completed turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub received_at: DateTime<Utc>,
    /// Time since the previous receipt (or since start-up for the first one)
    pub delta: Duration,
    pub received_len: usize,
    pub sent: OutboundPayload,
    /// False when the transmit or the completion wait failed
    pub transmitted: bool,
}

/// Result of [`LinkTurnController::run_turn`]
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Completed(TurnReport),
    /// Nothing was received; nothing was sent
    Skipped,
    /// The controller is halted
    Halted,
}

/// Drives one receive, reply, transmit cycle per radio availability event
pub struct LinkTurnController<R: Radio> {
    radio: Option<R>,
    state: LinkState,
    settings: TurnSettings,
    rx_buf: Vec<u8>,
    last_receipt: Instant,
    last_debug_turn: Instant,
    stats: LinkStats,
}

impl<R: Radio> std::fmt::Debug for LinkTurnController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkTurnController")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<R: Radio> LinkTurnController<R> {
    /// Controller over a working radio
    pub fn new(radio: R, settings: TurnSettings) -> Self {
        let now = Instant::now();
        Self {
            radio: Some(radio),
            state: LinkState::Idle,
            rx_buf: vec![0u8; settings.max_frame_len],
            settings,
            last_receipt: now,
            last_debug_turn: now,
            stats: LinkStats::default(),
        }
    }

    /// Controller from the outcome of radio initialization.
    ///
    /// A failed initialization leaves the controller permanently
    /// [`LinkState::Halted`] with the failure as reason.
    pub fn from_init(init: Result<R>, settings: TurnSettings) -> Self {
        match init {
            Ok(radio) => Self::new(radio, settings),
            Err(e) => {
                error!("Radio initialization failed, link halted: {}", e);
                let mut controller = Self {
                    radio: None,
                    state: LinkState::Idle,
                    rx_buf: Vec::new(),
                    settings,
                    last_receipt: Instant::now(),
                    last_debug_turn: Instant::now(),
                    stats: LinkStats::default(),
                };
                controller.halt(e.to_string());
                controller
            }
        }
    }

    /// Stop all further turns and release the radio
    pub fn halt(&mut self, reason: impl Into<String>) {
        self.radio = None;
        self.state = LinkState::Halted {
            reason: reason.into(),
        };
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn halt_reason(&self) -> Option<&str> {
        match &self.state {
            LinkState::Halted { reason } => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Whether a turn should start now
    pub async fn is_ready(&mut self) -> bool {
        let Some(radio) = self.radio.as_mut() else {
            return false;
        };

        match self.settings.debug_interval {
            Some(period) => self.last_debug_turn.elapsed() >= period,
            None => radio.is_frame_available().await,
        }
    }

    /// Execute one turn. Always ends back in [`LinkState::Idle`] unless halted.
    pub async fn run_turn<W: Write>(
        &mut self,
        queue: &mut OutboundQueue,
        console: &mut Console<W>,
    ) -> TurnOutcome {
        let Some(radio) = self.radio.as_mut() else {
            return TurnOutcome::Halted;
        };
        self.state = LinkState::TurnInProgress;

        self.rx_buf.fill(0);

        let debug_turn = self.settings.debug_interval.is_some();
        let received_len = match radio.receive(&mut self.rx_buf).await {
            Ok(len) => len,
            Err(e) if debug_turn => {
                debug!("Debug turn without inbound frame: {}", e);
                0
            }
            Err(e) => {
                debug!("Receive failed, skipping turn: {}", e);
                self.stats.skipped += 1;
                self.state = LinkState::Idle;
                return TurnOutcome::Skipped;
            }
        };

        let now = Instant::now();
        let received_at = Utc::now();
        let delta = now.duration_since(self.last_receipt);
        self.last_receipt = now;
        if debug_turn {
            self.last_debug_turn = now;
        }
        debug!("Frame received at {} ({} bytes, dt {:?})", received_at, received_len, delta);

        let frame = &self.rx_buf[..received_len.min(self.rx_buf.len())];
        console.line(render(frame, self.settings.render_mode));

        console.line(format_link_quality(
            radio.last_signal_strength(),
            radio.last_noise_estimate(),
            delta,
        ));

        let payload = queue.dequeue();
        console.line(format_args!("Sending packet: {}", payload));

        let transmitted = match send_and_wait(radio, &payload, self.settings.tx_timeout).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reply {} not sent: {}", payload, e);
                self.stats.tx_failures += 1;
                false
            }
        };

        if let Err(e) = radio.set_receive_mode().await {
            warn!("Failed to return radio to receive mode: {}", e);
        }

        self.stats.turns += 1;
        self.state = LinkState::Idle;

        TurnOutcome::Completed(TurnReport {
            received_at,
            delta,
            received_len,
            sent: payload,
            transmitted,
        })
    }
}

async fn send_and_wait<R: Radio>(
    radio: &mut R,
    payload: &OutboundPayload,
    tx_timeout: Duration,
) -> Result<()> {
    radio.transmit(payload.as_bytes()).await?;

    match timeout(tx_timeout, radio.wait_until_sent()).await {
        Ok(result) => result,
        Err(_) => Err(GroundStationError::Radio(format!(
            "Transmission not complete after {:?}",
            tx_timeout
        ))),
    }
}

/// `GS:<rssi>,<snr>,<delta_ms>`; values the radio does not report stay empty
pub fn format_link_quality(rssi: Option<i16>, snr: Option<f32>, delta: Duration) -> String {
    format!(
        "{}{},{},{}",
        LINK_QUALITY_PREFIX,
        rssi.map(|v| v.to_string()).unwrap_or_default(),
        snr.map(|v| v.to_string()).unwrap_or_default(),
        delta.as_millis()
    )
}
