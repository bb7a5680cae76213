//! Construction and decomposition of the 29-bit extended CAN arbitration
//! identifier used by this vendor family.
//!
//! ```text
//! bits 28..24 : device_type (5)
//! bits 23..16 : vendor_id   (8)   [fixed = 0x0E for this vendor family]
//! bits 15..6  : api_index   (10)  [of which the low 5 bits are the message id]
//! bits  5..0  : device_id   (6)
//! ```

/// The fixed vendor id this schema family addresses.
pub const VENDOR_ID: u8 = 0x0E;

/// Number of low bits of `api_index` that carry the message id.
pub const MESSAGE_ID_BITS: u32 = 5;

/// Mask that isolates `device_type` and `vendor_id`, ignoring `api_index` and `device_id`.
pub const DEVICE_TYPE_FILTER_MASK: u32 = 0x1FFF_0000;

/// Mask that isolates everything but `api_index` — matches all messages/devices
/// of one device type, vendor and device id regardless of message kind.
pub const EVERYTHING_BUT_API_INDEX_MASK: u32 = 0x1FFF_003F;

/// `device_type` value reserved for broadcast identifiers.
pub const BROADCAST_DEVICE_TYPE: u8 = 0;

const DEVICE_TYPE_SHIFT: u32 = 24;
const VENDOR_ID_SHIFT: u32 = 16;
const API_INDEX_SHIFT: u32 = 6;
const DEVICE_TYPE_MASK: u32 = 0x1F;
const VENDOR_ID_MASK: u32 = 0xFF;
const API_INDEX_MASK: u32 = 0x3FF;
const DEVICE_ID_MASK: u32 = 0x3F;

/// Error composing or decoding an arbitration identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArbitrationError {
    /// `device_type` does not fit in 5 bits.
    #[error("device_type {0} does not fit in 5 bits")]
    DeviceTypeOutOfRange(u8),
    /// `api_index` does not fit in 10 bits.
    #[error("api_index {0} does not fit in 10 bits")]
    ApiIndexOutOfRange(u16),
    /// `device_id` does not fit in 6 bits.
    #[error("device_id {0} does not fit in 6 bits")]
    DeviceIdOutOfRange(u8),
}

/// A decomposed 29-bit CAN arbitration identifier for this vendor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arbitration {
    /// Device type / device class discriminator (5 bits).
    pub device_type: u8,
    /// Vendor-assigned api index; for device/host messages the low
    /// [`MESSAGE_ID_BITS`] bits are the message id (10 bits total).
    pub api_index: u16,
    /// Instance id of the device on the bus (6 bits).
    pub device_id: u8,
}

impl Arbitration {
    /// Builds an arbitration identifier from a device type, message/api index
    /// and device instance id, validating each field's width.
    pub fn new(device_type: u8, api_index: u16, device_id: u8) -> Result<Self, ArbitrationError> {
        if device_type > DEVICE_TYPE_MASK as u8 {
            return Err(ArbitrationError::DeviceTypeOutOfRange(device_type));
        }
        if api_index > API_INDEX_MASK as u16 {
            return Err(ArbitrationError::ApiIndexOutOfRange(api_index));
        }
        if device_id > DEVICE_ID_MASK as u8 {
            return Err(ArbitrationError::DeviceIdOutOfRange(device_id));
        }
        Ok(Self {
            device_type,
            api_index,
            device_id,
        })
    }

    /// Message id carried in the low bits of `api_index`.
    pub const fn message_id(&self) -> u8 {
        (self.api_index & ((1 << MESSAGE_ID_BITS) - 1)) as u8
    }

    /// Packs this identifier (with the fixed [`VENDOR_ID`]) into a 29-bit value.
    pub const fn pack(&self) -> u32 {
        ((self.device_type as u32 & DEVICE_TYPE_MASK) << DEVICE_TYPE_SHIFT)
            | ((VENDOR_ID as u32 & VENDOR_ID_MASK) << VENDOR_ID_SHIFT)
            | ((self.api_index as u32 & API_INDEX_MASK) << API_INDEX_SHIFT)
            | (self.device_id as u32 & DEVICE_ID_MASK)
    }

    /// Decomposes a raw 29-bit identifier. Does not validate the vendor id;
    /// callers that care should check `vendor_id(raw) == VENDOR_ID` first.
    pub const fn unpack(raw: u32) -> Self {
        Self {
            device_type: ((raw >> DEVICE_TYPE_SHIFT) & DEVICE_TYPE_MASK) as u8,
            api_index: ((raw >> API_INDEX_SHIFT) & API_INDEX_MASK) as u16,
            device_id: (raw & DEVICE_ID_MASK) as u8,
        }
    }

    /// Whether this identifier addresses the broadcast device type.
    pub const fn is_broadcast(&self) -> bool {
        self.device_type == BROADCAST_DEVICE_TYPE
    }
}

/// Extracts the vendor id field from a raw 29-bit identifier.
pub const fn vendor_id(raw: u32) -> u8 {
    ((raw >> VENDOR_ID_SHIFT) & VENDOR_ID_MASK) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_fixture_matches_hand_computed_id() {
        // dev_type=7, device_id=3, message_id=31, vendor=0x0E
        let arb = Arbitration::new(7, 31, 3).unwrap();
        assert_eq!(arb.pack(), 0x070E07C3);
    }

    #[test]
    fn address_partitioning_round_trips() {
        for device_type in [0u8, 1, 7, 31] {
            for device_id in [0u8, 3, 63] {
                for message_id in [0u8, 5, 31] {
                    let arb = Arbitration::new(device_type, message_id as u16, device_id).unwrap();
                    let raw = arb.pack();
                    assert_eq!(vendor_id(raw), VENDOR_ID);
                    let decoded = Arbitration::unpack(raw);
                    assert_eq!(decoded, arb);
                    assert_eq!(decoded.message_id(), message_id);
                }
            }
        }
    }

    #[test]
    fn device_type_filter_mask_isolates_type_and_vendor() {
        let a = Arbitration::new(7, 31, 3).unwrap().pack();
        let b = Arbitration::new(7, 2, 10).unwrap().pack();
        assert_eq!(a & DEVICE_TYPE_FILTER_MASK, b & DEVICE_TYPE_FILTER_MASK);
    }

    #[test]
    fn everything_but_api_index_mask_ignores_only_api_index() {
        let a = Arbitration::new(7, 31, 3).unwrap().pack();
        let b = Arbitration::new(7, 2, 3).unwrap().pack();
        assert_eq!(
            a & EVERYTHING_BUT_API_INDEX_MASK,
            b & EVERYTHING_BUT_API_INDEX_MASK
        );
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert!(Arbitration::new(32, 0, 0).is_err());
        assert!(Arbitration::new(0, 1024, 0).is_err());
        assert!(Arbitration::new(0, 0, 64).is_err());
    }
}
