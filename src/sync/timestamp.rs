//! Device timestamp representation and conversions.
//!
//! The radio counts in device time units (~15.65 ps, 499.2 MHz × 128) on a
//! 40-bit counter. Frames embed only the upper 32 bits of a 40-bit value,
//! little-endian. Everything downstream of this module works in signed
//! nanoseconds on a timeline that wraps at the configured rollover period.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::constants::{TICKS_PER_MICROSECOND, TIMESTAMP_MASK};

/// Numerator of the exact tick → nanosecond ratio (`1000 / 63897.6`).
const NANOS_PER_TICK_NUM: u64 = 625;
/// Denominator of the exact tick → nanosecond ratio.
const NANOS_PER_TICK_DEN: u64 = 39_936;

/// A 40-bit device timestamp, in device time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct DeviceTimestamp(u64);

impl DeviceTimestamp {
    /// Zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Largest representable timestamp (`2^40 - 1`).
    pub const MAX: Self = Self(TIMESTAMP_MASK);

    /// Create from a raw counter value, discarding bits above bit 39.
    #[must_use]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks & TIMESTAMP_MASK)
    }

    /// Assemble from the 5 timestamp bytes the driver reads, LSB first.
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 5]) -> Self {
        Self(LittleEndian::read_uint(&bytes, 5))
    }

    /// Reconstruct from a 4-byte embedded frame field.
    ///
    /// The field holds bits 8..40 of the remote timestamp; the low 8 bits of
    /// the result are always zero.
    #[must_use]
    pub fn from_embedded(field: [u8; 4]) -> Self {
        let high = u64::from(LittleEndian::read_u32(&field));
        Self::new(high << 8)
    }

    /// Encode bits 8..40 as a 4-byte little-endian frame field.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "a 40-bit value shifted right by 8 fits in 32 bits"
    )]
    pub fn to_embedded(self) -> [u8; 4] {
        ((self.0 >> 8) as u32).to_le_bytes()
    }

    /// Raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Low 32 bits of the counter.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "intentional low-word view")]
    pub const fn low_u32(self) -> u32 {
        self.0 as u32
    }

    /// Convert to nanoseconds, truncating the sub-nanosecond remainder.
    ///
    /// Computed as an exact fraction, so the only rounding is the final
    /// truncation.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, reason = "2^40 ticks is ~17.2e9 ns")]
    pub const fn to_nanos(self) -> i64 {
        (self.0 * NANOS_PER_TICK_NUM / NANOS_PER_TICK_DEN) as i64
    }

    /// Create from nanoseconds (negative values clamp to zero).
    ///
    /// Accurate to one nanosecond, i.e. within 64 ticks of the original.
    /// Durations longer than one counter period wrap the way the counter does.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "masked to 40 bits by new")]
    pub fn from_nanos(nanos: i64) -> Self {
        let nanos = u128::from(u64::try_from(nanos).unwrap_or(0));
        let ticks = nanos * u128::from(NANOS_PER_TICK_DEN) / u128::from(NANOS_PER_TICK_NUM);
        Self::new(ticks as u64)
    }

    /// Convert to fractional nanoseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "40-bit values are exact in f64")]
    pub fn to_nanos_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_MICROSECOND * 1_000.0
    }

    /// Create from fractional nanoseconds, rounding to the nearest tick.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "clamped to non-negative before the cast"
    )]
    pub fn from_nanos_f64(nanos: f64) -> Self {
        let ticks = (nanos.max(0.0) / 1_000.0 * TICKS_PER_MICROSECOND).round();
        Self::new(ticks as u64)
    }

    /// Tick difference `self - earlier`, modulo the 40-bit counter.
    #[must_use]
    pub const fn wrapping_ticks_since(self, earlier: Self) -> u64 {
        self.0.wrapping_sub(earlier.0) & TIMESTAMP_MASK
    }
}

impl From<u64> for DeviceTimestamp {
    fn from(ticks: u64) -> Self {
        Self::new(ticks)
    }
}

impl std::fmt::Display for DeviceTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:010X}", self.0)
    }
}

/// Elapsed nanoseconds from `earlier` to `later` on a wrapping timeline.
///
/// A negative raw difference means the counter rolled over in between, and
/// the period is added exactly once. The true elapsed time must be shorter
/// than one period.
#[must_use]
pub const fn rollover_delta(later: i64, earlier: i64, period: i64) -> i64 {
    normalize_rollover(later - earlier, period)
}

/// Bring a value that went negative by at most one period back in range.
#[must_use]
pub const fn normalize_rollover(value: i64, period: i64) -> i64 {
    if value < 0 { value + period } else { value }
}
