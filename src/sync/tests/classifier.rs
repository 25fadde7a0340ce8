use crate::constants::MASTER_ID;
use crate::sync::classifier::{FrameClassifier, FrameOrigin, classify};

#[test]
fn test_master_id_matches() {
    assert_eq!(classify(*b"MS", MASTER_ID), FrameOrigin::Master);
}

#[test]
fn test_other_ids() {
    assert_eq!(classify(*b"T1", MASTER_ID), FrameOrigin::Other);
    assert_eq!(classify(*b"SM", MASTER_ID), FrameOrigin::Other);
    assert_eq!(classify(*b"M\0", MASTER_ID), FrameOrigin::Other);
}

#[test]
fn test_no_case_folding() {
    assert_eq!(classify(*b"ms", MASTER_ID), FrameOrigin::Other);
    assert_eq!(classify(*b"Ms", MASTER_ID), FrameOrigin::Other);
}

#[test]
fn test_classifier_custom_master() {
    let classifier = FrameClassifier::new(*b"A0");
    assert_eq!(classifier.master_id(), *b"A0");
    assert_eq!(classifier.classify(*b"A0"), FrameOrigin::Master);
    assert_eq!(classifier.classify(*b"MS"), FrameOrigin::Other);
}
