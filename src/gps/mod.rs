//! # GPS Module
//!
//! Ground-station GPS status reporting.
//!
//! Sentence decoding lives outside this crate: a decoder publishes
//! [`GpsFix`] snapshots and the control loop only ever reads the latest one
//! by value through [`GpsSource`].

pub mod composer;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub use composer::{compose_gps_line, GpsComposer};

/// Latest position fix reported by the GPS receiver
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsFix {
    /// Decimal degrees
    pub latitude: f64,
    /// Decimal degrees
    pub longitude: f64,
    /// Meters above mean sea level
    pub altitude: f64,
    pub hdop: f64,
    pub vdop: f64,
    /// Seconds since the Unix epoch
    pub utc_unix: u64,
    pub satellites: u8,
    pub speed_kmh: f64,
    /// Course over ground in degrees
    pub course: f64,
    pub valid: bool,
}

impl GpsFix {
    /// Fix time as a calendar timestamp
    pub fn utc_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.utc_unix)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// Read side of an external GPS decoder
#[cfg_attr(test, mockall::automock)]
pub trait GpsSource {
    /// Whether a fix newer than the last one read is available
    fn has_new_fix(&mut self) -> bool;

    /// Latest fix, by value
    fn current_fix(&mut self) -> GpsFix;
}

/// [`GpsSource`] fed through a `tokio::sync::watch` channel
#[derive(Debug, Clone)]
pub struct WatchGpsSource {
    rx: watch::Receiver<GpsFix>,
}

impl WatchGpsSource {
    pub fn new(rx: watch::Receiver<GpsFix>) -> Self {
        Self { rx }
    }

    /// Create a source together with the sender a decoder publishes into
    pub fn channel() -> (watch::Sender<GpsFix>, Self) {
        let (tx, rx) = watch::channel(GpsFix::default());
        (tx, Self::new(rx))
    }
}

impl GpsSource for WatchGpsSource {
    fn has_new_fix(&mut self) -> bool {
        // A dropped publisher just means no further fixes
        self.rx.has_changed().unwrap_or(false)
    }

    fn current_fix(&mut self) -> GpsFix {
        *self.rx.borrow_and_update()
    }
}
