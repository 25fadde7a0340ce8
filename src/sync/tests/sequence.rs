use crate::sync::sequence::SequenceTracker;

#[test]
fn test_sequential_frames() {
    let mut tracker = SequenceTracker::new();

    assert!(tracker.record(10).is_none());
    assert!(tracker.record(11).is_none());
    assert!(tracker.record(12).is_none());

    assert_eq!(tracker.frames_received(), 3);
    assert_eq!(tracker.total_lost(), 0);
}

#[test]
fn test_gap_detection() {
    let mut tracker = SequenceTracker::new();

    tracker.record(100);
    let gap = tracker.record(105).unwrap(); // Skipped 101-104

    assert_eq!(gap.start, 101);
    assert_eq!(gap.count, 4);
    assert_eq!(tracker.total_gaps(), 1);
}

#[test]
fn test_wraparound() {
    let mut tracker = SequenceTracker::new();

    tracker.record(254);
    tracker.record(255);
    let gap = tracker.record(0);

    assert!(gap.is_none());
    assert_eq!(tracker.total_lost(), 0);
}

#[test]
fn test_gap_across_wrap() {
    let mut tracker = SequenceTracker::new();

    tracker.record(254);
    let gap = tracker.record(2).unwrap();
    assert_eq!(gap.start, 255);
    assert_eq!(gap.count, 3);
}

#[test]
fn test_large_jump_is_restart() {
    let mut tracker = SequenceTracker::new();

    tracker.record(10);
    assert!(tracker.record(9).is_none());
    assert!(tracker.record(200).is_none());
    assert_eq!(tracker.total_lost(), 0);
}

#[test]
fn test_loss_ratio() {
    let mut tracker = SequenceTracker::new();
    assert!(tracker.loss_ratio().abs() < f64::EPSILON);

    tracker.record(100);
    tracker.record(105);
    // Received 2, lost 4.
    assert!((tracker.loss_ratio() - 0.666).abs() < 0.01);
}

#[test]
fn test_history_bounded() {
    let mut tracker = SequenceTracker::with_history(2);
    for seq in [0u8, 2, 4, 6] {
        tracker.record(seq);
    }

    let gaps: Vec<_> = tracker.recent_gaps().map(|g| g.start).collect();
    assert_eq!(gaps, vec![3, 5]);
    assert_eq!(tracker.total_gaps(), 3);
}

#[test]
fn test_reset() {
    let mut tracker = SequenceTracker::new();
    tracker.record(1);
    tracker.record(5);
    tracker.reset();

    assert_eq!(tracker.frames_received(), 0);
    assert_eq!(tracker.recent_gaps().count(), 0);
    assert!(tracker.record(50).is_none());
}
