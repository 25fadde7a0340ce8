use crate::constants::{ROLLOVER_PERIOD_NS, TIMESTAMP_MASK};
use crate::sync::timestamp::{DeviceTimestamp, normalize_rollover, rollover_delta};

// ===== Construction =====

#[test]
fn test_new_masks_to_40_bits() {
    let ts = DeviceTimestamp::new(0xAB_12_3456_7890);
    assert_eq!(ts.ticks(), 0x12_3456_7890);
    assert_eq!(DeviceTimestamp::MAX.ticks(), TIMESTAMP_MASK);
}

#[test]
fn test_from_le_bytes() {
    let ts = DeviceTimestamp::from_le_bytes([0x01, 0x02, 0x03, 0x04, 0x05]);
    assert_eq!(ts.ticks(), 0x05_0403_0201);
}

#[test]
fn test_from_u64() {
    let ts: DeviceTimestamp = 42u64.into();
    assert_eq!(ts.ticks(), 42);
}

#[test]
fn test_display_is_hex() {
    assert_eq!(DeviceTimestamp::new(0xFF).to_string(), "0x00000000FF");
}

// ===== Embedded fields =====

#[test]
fn test_from_embedded_shifts_left_8() {
    assert_eq!(DeviceTimestamp::from_embedded([0x01, 0, 0, 0]).ticks(), 0x100);
    assert_eq!(
        DeviceTimestamp::from_embedded([0xFF; 4]).ticks(),
        0xFF_FFFF_FF00
    );
}

#[test]
fn test_embedded_drops_low_byte() {
    let ts = DeviceTimestamp::new(0x12_3456_78AB);
    let field = ts.to_embedded();
    assert_eq!(field, [0x78, 0x56, 0x34, 0x12]);
    assert_eq!(DeviceTimestamp::from_embedded(field).ticks(), 0x12_3456_7800);
}

#[test]
fn test_low_u32() {
    assert_eq!(DeviceTimestamp::new(0xAA_1234_5678).low_u32(), 0x1234_5678);
}

// ===== Nanosecond conversion =====

#[test]
fn test_to_nanos_exact_multiple() {
    // 39936 ticks is exactly 625 ns.
    assert_eq!(DeviceTimestamp::new(39_936).to_nanos(), 625);
    assert_eq!(DeviceTimestamp::new(39_936 * 16).to_nanos(), 10_000);
}

#[test]
fn test_to_nanos_truncates() {
    // 63898 ticks is ~1000.006 ns.
    assert_eq!(DeviceTimestamp::new(63_898).to_nanos(), 1_000);
    assert_eq!(DeviceTimestamp::new(63).to_nanos(), 0);
}

#[test]
fn test_to_nanos_max() {
    assert_eq!(DeviceTimestamp::MAX.to_nanos(), 17_207_401_025);
}

#[test]
fn test_from_nanos_within_64_ticks() {
    for ticks in [0u64, 1, 63_898, 1 << 32, TIMESTAMP_MASK] {
        let ts = DeviceTimestamp::new(ticks);
        let back = DeviceTimestamp::from_nanos(ts.to_nanos());
        assert!(ticks - back.ticks() <= 64, "ticks {ticks} came back as {back}");
    }
}

#[test]
fn test_from_nanos_negative_clamps() {
    assert_eq!(DeviceTimestamp::from_nanos(-5), DeviceTimestamp::ZERO);
}

#[test]
fn test_from_nanos_long_duration_wraps() {
    // One week: far beyond a u64 multiply by the tick ratio.
    let ts = DeviceTimestamp::from_nanos(604_800_000_000_000);
    assert_eq!(ts.ticks(), 733_298_556_928);
    assert!(ts.ticks() <= TIMESTAMP_MASK);

    let max = DeviceTimestamp::from_nanos(i64::MAX);
    assert!(max.ticks() <= TIMESTAMP_MASK);
}

#[test]
fn test_f64_round_trip_within_one_tick() {
    for ticks in [0u64, 1, 255, 63_898, 0x80_0000_0000, TIMESTAMP_MASK] {
        let ts = DeviceTimestamp::new(ticks);
        let back = DeviceTimestamp::from_nanos_f64(ts.to_nanos_f64());
        assert!(back.ticks().abs_diff(ticks) <= 1);
    }
}

#[test]
fn test_wrapping_ticks_since() {
    let earlier = DeviceTimestamp::new(TIMESTAMP_MASK - 9);
    let later = DeviceTimestamp::new(5);
    assert_eq!(later.wrapping_ticks_since(earlier), 15);
}

// ===== Rollover =====

#[test]
fn test_rollover_delta_forward() {
    assert_eq!(rollover_delta(5_000, 1_000, ROLLOVER_PERIOD_NS), 4_000);
    assert_eq!(rollover_delta(1_000, 1_000, ROLLOVER_PERIOD_NS), 0);
}

#[test]
fn test_rollover_delta_across_wrap() {
    let earlier = ROLLOVER_PERIOD_NS - 100;
    assert_eq!(rollover_delta(100, earlier, ROLLOVER_PERIOD_NS), 200);
}

#[test]
fn test_normalize_rollover() {
    assert_eq!(normalize_rollover(-2, ROLLOVER_PERIOD_NS), ROLLOVER_PERIOD_NS - 2);
    assert_eq!(normalize_rollover(7, ROLLOVER_PERIOD_NS), 7);
}
