//! Ranging frame decoding and encoding.
//!
//! Frames are IEEE 802.15.4 data frames with 16-bit addressing:
//!
//! ```text
//!  0-1  frame control (0x8841, LE)
//!  2    sequence number
//!  3-4  PAN id (0xDECA, LE)
//!  5-6  destination address
//!  7-8  source address (sender id)
//!  9    function code
//! 10-13 poll RX timestamp   (response frames only)
//! 14-17 response TX timestamp (response frames only)
//! 18-19 FCS, appended by the radio
//! ```

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};

use super::timestamp::DeviceTimestamp;
use crate::constants::{COMMON_LEN, RX_BUF_LEN};
use crate::error::FrameError;

/// Frame control for a data frame with 16-bit addressing.
pub const FRAME_CONTROL_DATA: u16 = 0x8841;

/// PAN identifier used by the ranging network.
pub const PAN_ID: u16 = 0xDECA;

/// Function code of a ranging response.
pub const FUNC_CODE_RESPONSE: u8 = 0xE1;

/// Byte offset of the sequence number.
pub const SN_IDX: usize = 2;
/// Byte offset of the sender id.
pub const SENDER_ID_IDX: usize = 7;
/// Byte offset of the function code.
pub const FUNC_CODE_IDX: usize = 9;
/// Byte offset of the embedded poll RX timestamp.
pub const POLL_RX_TS_IDX: usize = 10;
/// Byte offset of the embedded response TX timestamp.
pub const RESP_TX_TS_IDX: usize = 14;
/// Length of an embedded timestamp field.
pub const TS_LEN: usize = 4;
/// Length of the frame check sequence.
pub const FCS_LEN: usize = 2;

/// Shortest frame that carries both embedded timestamps.
pub const RESPONSE_PAYLOAD_LEN: usize = RESP_TX_TS_IDX + TS_LEN;

/// Full length of a response frame, FCS included.
pub const RESPONSE_FRAME_LEN: usize = RESPONSE_PAYLOAD_LEN + FCS_LEN;

/// Remote timestamps embedded in a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedTimestamps {
    /// When the remote received our poll.
    pub poll_rx: DeviceTimestamp,
    /// When the remote sent this response.
    pub response_tx: DeviceTimestamp,
}

/// A decoded, length-checked frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Frame control field.
    pub frame_control: u16,
    /// Sequence number.
    pub sequence: u8,
    /// PAN identifier.
    pub pan_id: u16,
    /// Destination address bytes.
    pub destination: [u8; 2],
    /// Sender identifier, used for classification.
    pub sender: [u8; 2],
    /// Function code.
    pub function_code: u8,
    /// Embedded remote timestamps, when the frame is long enough to hold them.
    pub timestamps: Option<EmbeddedTimestamps>,
}

impl ReceivedFrame {
    /// Decode a frame using the default receive buffer capacity.
    ///
    /// # Errors
    /// Returns [`FrameError::TooShort`] below the common header length and
    /// [`FrameError::TooLong`] above the receive buffer capacity.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        Self::decode_with_capacity(data, RX_BUF_LEN)
    }

    /// Decode a frame, rejecting anything longer than `capacity`.
    ///
    /// # Errors
    /// See [`ReceivedFrame::decode`].
    pub fn decode_with_capacity(data: &[u8], capacity: usize) -> Result<Self, FrameError> {
        if data.len() > capacity {
            return Err(FrameError::TooLong {
                max: capacity,
                have: data.len(),
            });
        }
        if data.len() < COMMON_LEN {
            return Err(FrameError::TooShort {
                needed: COMMON_LEN,
                have: data.len(),
            });
        }

        let timestamps = (data.len() >= RESPONSE_PAYLOAD_LEN).then(|| EmbeddedTimestamps {
            poll_rx: DeviceTimestamp::from_embedded(ts_field(data, POLL_RX_TS_IDX)),
            response_tx: DeviceTimestamp::from_embedded(ts_field(data, RESP_TX_TS_IDX)),
        });

        Ok(Self {
            frame_control: LittleEndian::read_u16(&data[0..2]),
            sequence: data[SN_IDX],
            pan_id: LittleEndian::read_u16(&data[3..5]),
            destination: [data[5], data[6]],
            sender: [data[SENDER_ID_IDX], data[SENDER_ID_IDX + 1]],
            function_code: data[FUNC_CODE_IDX],
            timestamps,
        })
    }

    /// Embedded timestamps, or an error naming the frame length.
    ///
    /// # Errors
    /// Returns [`FrameError::MissingTimestamps`] for short frames.
    pub fn require_timestamps(&self, frame_len: usize) -> Result<EmbeddedTimestamps, FrameError> {
        self.timestamps
            .ok_or(FrameError::MissingTimestamps { have: frame_len })
    }

    /// Whether the function code marks a ranging response.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.function_code == FUNC_CODE_RESPONSE
    }

    /// Sender id as printable text (non-ASCII bytes shown as `?`).
    #[must_use]
    pub fn sender_str(&self) -> String {
        self.sender
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
            .collect()
    }
}

fn ts_field(data: &[u8], offset: usize) -> [u8; 4] {
    [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]
}

/// Builder for ranging response frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Sequence number.
    pub sequence: u8,
    /// Destination address.
    pub destination: [u8; 2],
    /// Sender id.
    pub sender: [u8; 2],
    /// Remote poll RX time.
    pub poll_rx: DeviceTimestamp,
    /// Remote response TX time.
    pub response_tx: DeviceTimestamp,
}

impl ResponseFrame {
    /// Create a response frame addressed to the default destination (`VE`).
    #[must_use]
    pub fn new(
        sequence: u8,
        sender: [u8; 2],
        poll_rx: DeviceTimestamp,
        response_tx: DeviceTimestamp,
    ) -> Self {
        Self {
            sequence,
            destination: *b"VE",
            sender,
            poll_rx,
            response_tx,
        }
    }

    /// Encode to a full-length frame with a zero FCS.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RESPONSE_FRAME_LEN);
        buf.put_u16_le(FRAME_CONTROL_DATA);
        buf.put_u8(self.sequence);
        buf.put_u16_le(PAN_ID);
        buf.put_slice(&self.destination);
        buf.put_slice(&self.sender);
        buf.put_u8(FUNC_CODE_RESPONSE);
        buf.put_slice(&self.poll_rx.to_embedded());
        buf.put_slice(&self.response_tx.to_embedded());
        buf.put_bytes(0, FCS_LEN);
        buf.freeze()
    }
}

/// Encode a header-only frame (no embedded timestamps), as sent by tags.
#[must_use]
pub fn encode_blink(sequence: u8, sender: [u8; 2], function_code: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMMON_LEN + FCS_LEN);
    buf.put_u16_le(FRAME_CONTROL_DATA);
    buf.put_u8(sequence);
    buf.put_u16_le(PAN_ID);
    buf.put_slice(b"VE");
    buf.put_slice(&sender);
    buf.put_u8(function_code);
    buf.put_bytes(0, FCS_LEN);
    buf.freeze()
}
