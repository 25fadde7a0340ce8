//! Time-of-flight helpers for single-sided two-way ranging.
//!
//! ```text
//! Initiator                      Responder
//!   |--- Poll (poll_tx) ------------>|  (poll_rx)
//!   |<-- Response (resp_tx) ---------|
//!   | (resp_rx)                      |
//!
//!   rtd_init = resp_rx - poll_tx
//!   rtd_resp = resp_tx - poll_rx
//!   tof      = (rtd_init - rtd_resp * (1 - clock_offset_ratio)) / 2
//! ```

use super::timestamp::DeviceTimestamp;
use crate::constants::DWT_TIME_UNITS;

/// One-way time of flight in nanoseconds for a distance in metres.
#[must_use]
pub fn tof_nanos(distance_m: f64, speed_of_light: f64) -> f64 {
    distance_m * 1e9 / speed_of_light
}

/// Timestamps of one poll/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwrExchange {
    /// Local poll transmit time.
    pub poll_tx: DeviceTimestamp,
    /// Local response receive time.
    pub resp_rx: DeviceTimestamp,
    /// Remote poll receive time (from the response payload).
    pub poll_rx: DeviceTimestamp,
    /// Remote response transmit time (from the response payload).
    pub resp_tx: DeviceTimestamp,
}

impl TwrExchange {
    /// Time of flight in seconds.
    ///
    /// Round-trip delays are taken on the low 32 bits with wrapping
    /// subtraction, which is exact for exchanges shorter than ~67 ms.
    /// `clock_offset_ratio` is the responder's clock offset relative to ours
    /// (from the carrier integrator); pass `0.0` when unknown.
    #[must_use]
    pub fn tof_seconds(&self, clock_offset_ratio: f64) -> f64 {
        let rtd_init = f64::from(self.resp_rx.low_u32().wrapping_sub(self.poll_tx.low_u32()));
        let rtd_resp = f64::from(self.resp_tx.low_u32().wrapping_sub(self.poll_rx.low_u32()));
        ((rtd_init - rtd_resp * (1.0 - clock_offset_ratio)) / 2.0) * DWT_TIME_UNITS
    }

    /// Estimated distance in metres.
    #[must_use]
    pub fn distance_m(&self, clock_offset_ratio: f64, speed_of_light: f64) -> f64 {
        self.tof_seconds(clock_offset_ratio) * speed_of_light
    }
}
