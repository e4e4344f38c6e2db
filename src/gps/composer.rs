//! # GPS Fix Composer
//!
//! Periodic ground-station position line, independent of the link turn:
//!
//! ```text
//! GPS:<lat>,<lon>,<alt>,<hdop>,<vdop>,<utc>,<sats>,<speed>,<course>
//! ```
//!
//! GPS status is push-only observability; it never enters the outbound
//! reply queue.

use tokio::time::{Duration, Instant};
use tracing::trace;

use super::{GpsFix, GpsSource};

/// Line printed when the latest snapshot has no valid fix
pub const NO_FIX_LINE: &str = "GPS: No valid data";

/// Format one fix as a status line
///
/// # Examples
///
/// ```
/// use lora_ground_station::gps::{compose_gps_line, GpsFix};
///
/// assert_eq!(compose_gps_line(&GpsFix::default()), "GPS: No valid data");
/// ```
pub fn compose_gps_line(fix: &GpsFix) -> String {
    if !fix.valid {
        return NO_FIX_LINE.to_string();
    }

    format!(
        "GPS:{:.6},{:.6},{:.2},{:.2},{:.2},{},{},{:.2},{:.2}",
        fix.latitude,
        fix.longitude,
        fix.altitude,
        fix.hdop,
        fix.vdop,
        fix.utc_unix,
        fix.satellites,
        fix.speed_kmh,
        fix.course
    )
}

/// Emits the latest fix on a fixed interval
#[derive(Debug, Clone)]
pub struct GpsComposer {
    interval: Duration,
    last_emit: Instant,
    snapshot: GpsFix,
}

impl GpsComposer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_emit: now,
            snapshot: GpsFix::default(),
        }
    }

    /// Refresh the snapshot from `source` and return a status line when the
    /// print interval has elapsed.
    pub fn poll<S: GpsSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> Option<String> {
        if source.has_new_fix() {
            self.snapshot = source.current_fix();
            trace!("GPS snapshot updated: {:?}", self.snapshot.utc_datetime());
        }

        if now.saturating_duration_since(self.last_emit) < self.interval {
            return None;
        }

        self.last_emit = now;
        Some(compose_gps_line(&self.snapshot))
    }

    /// Latest fix read from the source
    pub fn snapshot(&self) -> GpsFix {
        self.snapshot
    }
}
