//! Compile-time defaults for the ranging and synchronization core.
//!
//! [`SyncConfig::default`](crate::config::SyncConfig) is built from these
//! values; the synchronizer never reads them directly.

/// Sender identifier carried by the master broadcast emitter.
pub const MASTER_ID: [u8; 2] = *b"MS";

/// Rollover period of the nanosecond timeline (17.2 s).
///
/// The 40-bit device counter wraps after roughly 17.207 s; the model treats
/// this constant as the wrap boundary for every subtraction.
pub const ROLLOVER_PERIOD_NS: i64 = 17_200_000_000;

/// Speed of light in air, in metres per second.
pub const SPEED_OF_LIGHT: f64 = 299_702_547.0;

/// Distance to the master anchor assumed until a ranging estimate exists.
pub const DEFAULT_DISTANCE_M: f64 = 1.0;

/// Device ticks per microsecond (499.2 MHz × 128).
pub const TICKS_PER_MICROSECOND: f64 = 499.2 * 128.0;

/// Device time unit in seconds (~15.65 ps).
pub const DWT_TIME_UNITS: f64 = 1.0 / (499.2e6 * 128.0);

/// Number of significant bits in a device timestamp.
pub const TIMESTAMP_BITS: u32 = 40;

/// Mask selecting the significant bits of a device timestamp.
pub const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Receive buffer capacity; longer frames are rejected.
pub const RX_BUF_LEN: usize = 20;

/// Length of the header common to every ranging frame.
pub const COMMON_LEN: usize = 10;

/// Delay between ranging cycles, in milliseconds.
pub const RNG_DELAY_MS: u64 = 0;

/// Anchor name printed in console report blocks.
pub const DEFAULT_ANCHOR_NAME: &str = "MAGENTA";
