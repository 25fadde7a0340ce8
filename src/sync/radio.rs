//! Boundary to the radio driver.
//!
//! The driver owns interrupts and register access. The ranging loop only
//! sees one [`ReceiveOutcome`] per receive attempt and asks the driver to
//! arm or reset its receiver through [`Transceiver`].

use async_trait::async_trait;
use bytes::Bytes;

use super::timestamp::DeviceTimestamp;
use crate::error::{RxErrorKind, SyncError};

/// A frame as delivered by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxFrame {
    /// Raw payload, FCS included.
    pub payload: Bytes,
    /// Local receive timestamp captured by the PHY.
    pub rx_timestamp: DeviceTimestamp,
}

impl RxFrame {
    /// Create a received frame.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>, rx_timestamp: DeviceTimestamp) -> Self {
        Self {
            payload: payload.into(),
            rx_timestamp,
        }
    }
}

/// Result of one receive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// A frame was received.
    Received(RxFrame),
    /// The receive window elapsed without a frame.
    Timeout,
    /// The radio reported a receive error.
    Error(RxErrorKind),
}

/// Radio receive path control.
#[async_trait]
pub trait Transceiver: Send {
    /// Arm the receiver for the next frame.
    async fn enable_receiver(&mut self) -> Result<(), SyncError>;

    /// Reset the receiver after a timeout or error.
    async fn reset_receiver(&mut self) -> Result<(), SyncError>;
}
