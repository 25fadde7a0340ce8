//! Master clock synchronization for UWB ranging nodes.
//!
//! A designated master anchor broadcasts ranging responses carrying its
//! response transmit time. Every node that hears two of them can map its own
//! receive timestamps onto the master's timeline, so frames from any other
//! emitter get a timestamp on a shared clock.
//!
//! ## Flow
//!
//! ```text
//! driver ──ReceiveOutcome──▶ RangingLoop
//!                              │ decode (ReceivedFrame)
//!                              │ classify (FrameClassifier)
//!                 ┌────────────┴────────────┐
//!              Master                     Other
//!        observe_master()             synchronize()
//!        (updates SyncModel)          (reads SyncModel)
//!                 └────────────┬────────────┘
//!                          SyncEvent ──▶ reporting
//! ```
//!
//! ## Timeline
//!
//! Device timestamps are 40-bit tick counters; after conversion to
//! nanoseconds every difference is corrected for a single rollover of
//! [`ROLLOVER_PERIOD_NS`](crate::constants::ROLLOVER_PERIOD_NS).

pub mod classifier;
pub mod clock;
pub mod frame;
#[cfg(feature = "tokio-runtime")]
pub mod handler;
pub mod radio;
pub mod ranging;
pub mod report;
pub mod sequence;
pub mod timestamp;

#[cfg(test)]
mod tests;

// Re-exports for convenient access.
pub use classifier::{FrameClassifier, FrameOrigin, classify};
pub use clock::{
    CalibrationState, ClockSynchronizer, DriftRatio, FrameOutcome, MasterObservation, SyncModel,
};
pub use frame::{EmbeddedTimestamps, ReceivedFrame, ResponseFrame};
#[cfg(feature = "tokio-runtime")]
pub use handler::{RangingLoop, SharedSynchronizer, create_shared_synchronizer};
pub use radio::{ReceiveOutcome, RxFrame, Transceiver};
pub use ranging::{TwrExchange, tof_nanos};
pub use report::{DropReason, SyncEvent, SyncStats, SyncedFrame};
pub use sequence::{GapInfo, SequenceTracker};
pub use timestamp::{DeviceTimestamp, normalize_rollover, rollover_delta};
