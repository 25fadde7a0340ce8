//! Simulated master and local clocks
//!
//! Produces the frames a node would hear from a master anchor and from tags,
//! with both clocks free-running at their own rate on 40-bit counters.

use crate::constants::{TICKS_PER_MICROSECOND, TIMESTAMP_MASK};
use crate::sync::frame::{ResponseFrame, encode_blink};
use crate::sync::radio::RxFrame;
use crate::sync::timestamp::DeviceTimestamp;

/// Two free-running clocks observed from one node.
#[derive(Debug, Clone)]
pub struct ClockScenario {
    /// Master counter at scenario time zero, in ticks.
    pub master_origin: u64,
    /// Local counter at scenario time zero, in ticks.
    pub local_origin: u64,
    /// Master rate offset in ppm.
    pub master_ppm: f64,
    /// Local rate offset in ppm.
    pub local_ppm: f64,
    /// Propagation delay from master to node, in nanoseconds.
    pub flight_ns: f64,
    /// Master sender id.
    pub master_id: [u8; 2],
    master_sequence: u8,
}

impl ClockScenario {
    /// Scenario with both clocks at zero, no drift and no flight time.
    #[must_use]
    pub fn new(master_id: [u8; 2]) -> Self {
        Self {
            master_origin: 0,
            local_origin: 0,
            master_ppm: 0.0,
            local_ppm: 0.0,
            flight_ns: 0.0,
            master_id,
            master_sequence: 0,
        }
    }

    /// Set the master rate offset.
    #[must_use]
    pub fn master_ppm(mut self, ppm: f64) -> Self {
        self.master_ppm = ppm;
        self
    }

    /// Set the counter origins.
    #[must_use]
    pub fn origins(mut self, master: u64, local: u64) -> Self {
        self.master_origin = master & TIMESTAMP_MASK;
        self.local_origin = local & TIMESTAMP_MASK;
        self
    }

    /// Set the propagation delay.
    #[must_use]
    pub fn flight_ns(mut self, flight_ns: f64) -> Self {
        self.flight_ns = flight_ns;
        self
    }

    /// Master counter at scenario time `ns`.
    #[must_use]
    pub fn master_at(&self, ns: f64) -> DeviceTimestamp {
        counter_at(self.master_origin, self.master_ppm, ns)
    }

    /// Local counter at scenario time `ns`.
    #[must_use]
    pub fn local_at(&self, ns: f64) -> DeviceTimestamp {
        counter_at(self.local_origin, self.local_ppm, ns)
    }

    /// Master response sent at scenario time `ns`, as received by the node.
    pub fn master_frame(&mut self, ns: f64) -> RxFrame {
        let tx = self.master_at(ns);
        let frame = ResponseFrame::new(self.master_sequence, self.master_id, tx, tx);
        self.master_sequence = self.master_sequence.wrapping_add(1);
        RxFrame::new(frame.encode(), self.local_at(ns + self.flight_ns))
    }

    /// Tag frame received by the node at scenario time `ns`.
    #[must_use]
    pub fn tag_frame(&self, ns: f64, sequence: u8, sender: [u8; 2]) -> RxFrame {
        RxFrame::new(encode_blink(sequence, sender, 0x21), self.local_at(ns))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "scenario times are small and non-negative"
)]
fn counter_at(origin: u64, ppm: f64, ns: f64) -> DeviceTimestamp {
    let ticks = (ns * (1.0 + ppm * 1e-6) / 1_000.0 * TICKS_PER_MICROSECOND).round() as u64;
    DeviceTimestamp::new(origin.wrapping_add(ticks))
}
