#![cfg_attr(not(feature = "std"), no_std)]

//! Atomic wire types shared by the CAN schema compiler and the runtime codec.
//!
//! Nothing in this crate knows about device specifications or the intermediate
//! representation built from them — it only defines the bit-level vocabulary
//! ([`Word`], [`Frame`], the 29-bit arbitration identifier) that every other
//! crate in the workspace packs and unpacks against.

mod arbitration;
mod bits;
mod frame;

pub use arbitration::{
    vendor_id,
    Arbitration,
    ArbitrationError,
    DEVICE_TYPE_FILTER_MASK,
    EVERYTHING_BUT_API_INDEX_MASK,
    MESSAGE_ID_BITS,
    VENDOR_ID,
};
pub use bits::{
    buf_byte_len,
    float24_from_bits,
    float24_to_bits,
    mask,
    sign_extend,
};
pub use frame::Frame;

/// Payload word of a classic CAN frame: up to 64 bits, little-endian bit order.
pub type Word = u64;

/// Maximum number of payload bytes in a classic CAN 2.0B frame.
pub const MAX_DLC: u8 = 8;

/// Maximum number of bits addressable in a single frame payload.
pub const MAX_PAYLOAD_BITS: u32 = (MAX_DLC as u32) * 8;
