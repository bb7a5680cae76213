//! The wire frame type shared between the codec and any transport.

use crate::{
    MAX_DLC,
    Word,
};

/// A classic CAN 2.0B extended frame: a 29-bit identifier plus up to 8
/// payload bytes, packed little-endian into a single [`Word`].
///
/// This is the codec's entire I/O surface — it knows nothing about CAN bus
/// transports, only about the shape of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// 29-bit extended arbitration identifier.
    pub arb_id: u32,
    /// Data length code: number of valid payload bytes, 0..=8.
    pub dlc: u8,
    /// Payload, little-endian bit packed. Only the low `dlc * 8` bits are
    /// meaningful.
    pub payload: Word,
    /// Optional capture timestamp in the transport's own clock domain.
    pub timestamp: Option<u64>,
}

impl Frame {
    /// Builds a frame with no timestamp, clamping `dlc` to [`MAX_DLC`].
    pub fn new(arb_id: u32, dlc: u8, payload: Word) -> Self {
        Self {
            arb_id,
            dlc: dlc.min(MAX_DLC),
            payload,
            timestamp: None,
        }
    }

    /// Returns the payload as a little-endian byte array, bytes beyond `dlc`
    /// zeroed.
    pub fn as_bytes(&self) -> [u8; MAX_DLC as usize] {
        self.payload.to_le_bytes()
    }

    /// Number of bits addressable in this frame's payload (`dlc * 8`).
    pub const fn payload_bits(&self) -> u32 {
        (self.dlc as u32) * 8
    }

    /// Attaches a capture timestamp, builder-style.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
