//! Master/other frame classification.

use serde::Serialize;

/// Origin of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameOrigin {
    /// Broadcast from the designated master emitter.
    Master,
    /// Any other emitter.
    Other,
}

/// Classify a sender id by exact byte comparison with the master id.
#[must_use]
pub fn classify(sender: [u8; 2], master: [u8; 2]) -> FrameOrigin {
    if sender == master {
        FrameOrigin::Master
    } else {
        FrameOrigin::Other
    }
}

/// Classifier bound to a configured master id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClassifier {
    master: [u8; 2],
}

impl FrameClassifier {
    /// Create a classifier for the given master id.
    #[must_use]
    pub const fn new(master: [u8; 2]) -> Self {
        Self { master }
    }

    /// Classify a sender id.
    #[must_use]
    pub fn classify(&self, sender: [u8; 2]) -> FrameOrigin {
        classify(sender, self.master)
    }

    /// The configured master id.
    #[must_use]
    pub const fn master_id(&self) -> [u8; 2] {
        self.master
    }
}
