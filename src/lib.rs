//! # uwb-clocksync
//!
//! Virtual master clock synchronization for UWB two-way ranging nodes.
//!
//! ## Features
//!
//! - Decoding of ranging frames and their embedded 40-bit timestamps
//! - Master/other frame classification by sender id
//! - Rollover-safe drift ratio estimation against a master anchor
//! - Async ranging loop over a driver-agnostic transceiver
//! - Host console forwarder that stamps report blocks with host time
//!
//! ## Example
//!
//! ```rust
//! use uwb_clocksync::{ClockSynchronizer, SyncConfig};
//!
//! let config = SyncConfig::default().initial_distance_m(0.0);
//! let mut sync = ClockSynchronizer::new(&config);
//!
//! // Two master frames calibrate the model.
//! sync.observe_master_nanos(1_000, 10_000);
//! sync.observe_master_nanos(2_000, 12_000);
//!
//! // Local clock runs at half the master's rate.
//! assert_eq!(sync.synchronize_nanos(2_500).unwrap(), 13_000);
//! ```
//!
//! # Architecture
//!
//! - **Core**: [`sync::clock`] holds the model and both frame paths
//! - **Wire**: [`sync::frame`] and [`sync::timestamp`] decode what the radio delivers
//! - **Runtime**: [`sync::handler`] drives the radio and publishes [`SyncEvent`]s

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Synchronizer configuration
pub mod config;
pub mod constants;
/// Error types
pub mod error;
pub mod sync;

/// Testing utilities
pub mod testing;

#[cfg(feature = "tokio-runtime")]
pub mod forwarder;

// Re-exports
pub use config::{RatioMode, SyncConfig};
pub use error::{FrameError, RxErrorKind, SyncError};
#[cfg(feature = "tokio-runtime")]
pub use forwarder::{ForwarderConfig, LineForwarder};
#[cfg(feature = "tokio-runtime")]
pub use sync::{RangingLoop, SharedSynchronizer, create_shared_synchronizer};
pub use sync::{
    ClockSynchronizer, DeviceTimestamp, DriftRatio, FrameOrigin, ReceivedFrame, SyncEvent,
    SyncStats, SyncedFrame,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    #[cfg(feature = "tokio-runtime")]
    pub use crate::{RangingLoop, create_shared_synchronizer};
    pub use crate::{
        ClockSynchronizer, DeviceTimestamp, DriftRatio, FrameOrigin, RatioMode, ReceivedFrame,
        SyncConfig, SyncError, SyncEvent,
    };
}
