//! # Ground Station
//!
//! Owns every piece of runtime state and exposes the three things the
//! control loop does each iteration: ingest operator input, service the
//! link, and service the periodic timers.
//!
//! Operator input is always ingested before a turn of the same iteration
//! so a reply queued by a command can go out on the very next turn.

use std::io::Write;
use tokio::time::{Duration, Instant};
use tracing::{info, warn};

use crate::command::{CommandInterpreter, LineAssembler};
use crate::config::Config;
use crate::console::Console;
use crate::gps::{GpsComposer, GpsSource};
use crate::link::queue::OutboundQueue;
use crate::link::radio::Radio;
use crate::link::turn::{LinkTurnController, TurnOutcome};

/// Prefix of the console line repeated while the link is halted
pub const HALTED_PREFIX: &str = "LINK HALTED: ";

/// Prefix of the station identification line
pub const CALLSIGN_PREFIX: &str = "CALLSIGN:";

/// Ground-station runtime
pub struct GroundStation<R: Radio, G: GpsSource, W: Write> {
    queue: OutboundQueue,
    interpreter: CommandInterpreter,
    link: LinkTurnController<R>,
    gps_source: G,
    /// None when GPS reporting is disabled
    gps: Option<GpsComposer>,
    heartbeat_interval: Duration,
    last_heartbeat: Instant,
    /// Set when the callsign should be announced on every heartbeat
    callsign: Option<String>,
    console: Console<W>,
}

impl<R: Radio, G: GpsSource, W: Write> GroundStation<R, G, W> {
    /// Assemble a station from validated configuration
    pub fn new(
        config: &Config,
        link: LinkTurnController<R>,
        gps_source: G,
        console: Console<W>,
    ) -> Self {
        let now = Instant::now();
        let gps = config
            .gps
            .enabled
            .then(|| GpsComposer::new(Duration::from_millis(config.gps.print_interval_ms), now));
        let callsign = config
            .station
            .show_callsign
            .then(|| config.station.callsign.clone());

        Self {
            queue: OutboundQueue::new(config.link.queue_capacity),
            interpreter: CommandInterpreter::new(LineAssembler::from_config(&config.command)),
            link,
            gps_source,
            gps,
            heartbeat_interval: Duration::from_millis(config.station.heartbeat_interval_ms),
            last_heartbeat: now,
            callsign,
            console,
        }
    }

    /// Feed operator bytes; returns how many complete lines were handled
    pub fn ingest_operator_bytes(&mut self, bytes: &[u8]) -> usize {
        let dispatched = self.interpreter.ingest(bytes, &mut self.queue);
        for message in dispatched.iter().filter_map(|d| d.operator_message()) {
            self.console.line(message);
        }
        dispatched.len()
    }

    /// Run one link turn if the link is ready
    pub async fn service_link(&mut self) -> Option<TurnOutcome> {
        if !self.link.is_ready().await {
            return None;
        }
        Some(self.link.run_turn(&mut self.queue, &mut self.console).await)
    }

    /// Emit the GPS line and heartbeat when their intervals have elapsed
    pub fn service_timers(&mut self, now: Instant) {
        if let Some(composer) = self.gps.as_mut() {
            if let Some(line) = composer.poll(&mut self.gps_source, now) {
                self.console.line(line);
            }
        }

        if now.saturating_duration_since(self.last_heartbeat) >= self.heartbeat_interval {
            self.last_heartbeat = now;
            self.heartbeat();
        }
    }

    fn heartbeat(&mut self) {
        let stats = self.link.stats();
        info!(
            "Heartbeat: {} turns, {} skipped, {} tx failures, {} replies queued",
            stats.turns,
            stats.skipped,
            stats.tx_failures,
            self.queue.len()
        );

        if let Some(reason) = self.link.halt_reason() {
            warn!("Link halted: {}", reason);
            self.console.line(format_args!("{}{}", HALTED_PREFIX, reason));
        }

        if let Some(callsign) = &self.callsign {
            self.console.line(format_args!("{}{}", CALLSIGN_PREFIX, callsign));
        }
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn link(&self) -> &LinkTurnController<R> {
        &self.link
    }

    pub fn console(&self) -> &Console<W> {
        &self.console
    }

    /// Bytes of the operator line currently being assembled
    pub fn pending_command_len(&self) -> usize {
        self.interpreter.pending_len()
    }
}
