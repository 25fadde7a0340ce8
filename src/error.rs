use std::io;
use thiserror::Error;

use serde::Serialize;

/// Errors raised while decoding a received frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame is shorter than the common header
    #[error("frame too short: need {needed} bytes, have {have}")]
    TooShort {
        /// Minimum bytes needed
        needed: usize,
        /// Bytes actually received
        have: usize,
    },

    /// Frame does not fit the receive buffer
    #[error("frame too long: buffer holds {max} bytes, have {have}")]
    TooLong {
        /// Receive buffer capacity
        max: usize,
        /// Bytes actually received
        have: usize,
    },

    /// Master frame without the embedded response timestamps
    #[error("master frame carries no embedded timestamps ({have} bytes)")]
    MissingTimestamps {
        /// Bytes actually received
        have: usize,
    },
}

/// Radio-level receive failures reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RxErrorKind {
    /// Frame check sequence mismatch
    Crc,
    /// Preamble or SFD could not be matched
    Preamble,
    /// PHY header error
    PhyHeader,
    /// Reed-Solomon decoding failure
    ReedSolomon,
    /// Any other receiver fault
    Other,
}

impl std::fmt::Display for RxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crc => write!(f, "CRC mismatch"),
            Self::Preamble => write!(f, "preamble mismatch"),
            Self::PhyHeader => write!(f, "PHY header error"),
            Self::ReedSolomon => write!(f, "Reed-Solomon failure"),
            Self::Other => write!(f, "receiver fault"),
        }
    }
}

/// Errors that can occur while synchronizing to the master clock
#[derive(Debug, Error)]
pub enum SyncError {
    /// Received frame could not be decoded
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Non-master frame arrived before the model was calibrated
    #[error("not calibrated: {master_frames} master frame(s) received, need 2")]
    Uncalibrated {
        /// Master frames observed so far
        master_frames: u64,
    },

    /// No frame arrived within the driver's receive window
    #[error("reception timeout")]
    ReceptionTimeout,

    /// Driver reported a receive error
    #[error("reception error: {0}")]
    Reception(RxErrorKind),

    /// Transceiver could not be driven
    #[error("transceiver error: {0}")]
    Transceiver(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Check if the ranging loop can continue after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Transceiver(_) | Self::Io(_))
    }

    /// Check if the error means a frame was dropped without touching the model
    #[must_use]
    pub fn is_dropped_frame(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Uncalibrated { .. })
    }
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;
