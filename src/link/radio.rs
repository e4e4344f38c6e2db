//! Trait abstraction for the half-duplex radio so the link turn can be
//! driven by real hardware or by a scripted radio in tests.

use async_trait::async_trait;

use crate::error::Result;

/// Half-duplex packet radio.
///
/// All calls are bounded in time by the driver; none of them waits
/// indefinitely.
#[async_trait]
pub trait Radio: Send {
    /// Whether a complete inbound frame is waiting
    async fn is_frame_available(&mut self) -> bool;

    /// Copy the pending frame into `buf`, returning its length.
    ///
    /// Frames longer than `buf` are truncated. Returns
    /// [`GroundStationError::NoFrame`](crate::error::GroundStationError::NoFrame)
    /// when nothing is pending.
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Start sending one frame
    async fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Block until the last transmitted frame has left the radio
    async fn wait_until_sent(&mut self) -> Result<()>;

    /// Put the radio back into receive-ready mode
    async fn set_receive_mode(&mut self) -> Result<()>;

    /// Signal strength of the last received frame in dBm, if the radio reports it
    fn last_signal_strength(&self) -> Option<i16>;

    /// Noise estimate (SNR in dB) of the last received frame, if reported
    fn last_noise_estimate(&self) -> Option<f32>;
}
