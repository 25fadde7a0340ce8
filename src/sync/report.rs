//! Events and counters published by the ranging loop.

use std::fmt::Write;

use serde::Serialize;

use super::clock::MasterObservation;
use super::timestamp::DeviceTimestamp;
use crate::error::{FrameError, RxErrorKind};

/// A non-master frame placed on the master timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncedFrame {
    /// Frame sequence number.
    pub sequence: u8,
    /// Receive time expressed in master nanoseconds.
    pub synced_master_ns: i64,
    /// Sender id of the frame.
    pub sender: [u8; 2],
    /// Master frames observed when the frame was synchronized.
    pub master_frames_received: u64,
    /// Raw local receive timestamp.
    pub local_rx: DeviceTimestamp,
}

impl SyncedFrame {
    /// Render the console block printed for every synchronized frame.
    #[must_use]
    pub fn render_block(&self, reception: u64, anchor: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Reception #: {reception}");
        let _ = writeln!(out, "Pulse #: {}", self.sequence);
        let _ = writeln!(out, "sync_ts_nanosec: {}", self.synced_master_ns);
        let _ = writeln!(out, "masterFramesReceived: {}", self.master_frames_received);
        let _ = writeln!(out, "anchor id: {anchor}");
        let _ = writeln!(
            out,
            "tag id: '{} {}'",
            char::from(self.sender[0]),
            char::from(self.sender[1])
        );
        let _ = writeln!(out, "END frame");
        out
    }
}

/// Why a received frame produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// Shorter than the common header.
    TooShort {
        /// Received length.
        have: usize,
    },
    /// Longer than the receive buffer.
    TooLong {
        /// Received length.
        have: usize,
    },
    /// Master frame without embedded timestamps.
    MissingTimestamps {
        /// Received length.
        have: usize,
    },
    /// Non-master frame before calibration.
    Uncalibrated {
        /// Master frames observed so far.
        master_frames: u64,
    },
}

impl From<&FrameError> for DropReason {
    fn from(err: &FrameError) -> Self {
        match *err {
            FrameError::TooShort { have, .. } => Self::TooShort { have },
            FrameError::TooLong { have, .. } => Self::TooLong { have },
            FrameError::MissingTimestamps { have } => Self::MissingTimestamps { have },
        }
    }
}

/// Events emitted by the ranging loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncEvent {
    /// A non-master frame was synchronized
    Synced {
        /// The synchronized frame
        frame: SyncedFrame,
        /// Console block rendered with the reception count and anchor name
        block: String,
    },
    /// A master frame updated the model
    MasterObserved(MasterObservation),
    /// A frame was discarded
    Dropped {
        /// Frame sequence number, when the header could be read
        sequence: Option<u8>,
        /// Discard reason
        reason: DropReason,
    },
    /// No frame arrived within the receive window
    Timeout,
    /// The radio reported a receive error
    RxError(RxErrorKind),
}

/// Running counters of the ranging loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Successful receptions (any origin, any outcome).
    pub receptions: u64,
    /// Master frames that updated the model.
    pub master_frames: u64,
    /// Non-master frames placed on the master timeline.
    pub synced_frames: u64,
    /// Non-master frames dropped before calibration.
    pub uncalibrated_drops: u64,
    /// Frames discarded by length or content checks.
    pub discarded_frames: u64,
    /// Receive timeouts.
    pub timeouts: u64,
    /// Receive errors.
    pub rx_errors: u64,
    /// Master frames missing from the sequence.
    pub master_sequence_lost: u64,
}

impl SyncStats {
    /// Serialize to a JSON object.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
