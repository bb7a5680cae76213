use dbc_asm::StaticSignal;
use dbc_derive::CanFrame;

#[derive(Debug, PartialEq, CanFrame)]
struct StatusMessage {
    #[can(sint = 16)]
    speed: i16,
    #[can(bitset = 8)]
    flags: u8,
}

#[test]
fn pack_matches_hand_computed_payload() {
    let msg = StatusMessage {
        speed: -100,
        flags: 0x05,
    };
    let packed = msg.pack();
    assert_eq!(packed, ((-100i16 as u16) as u64) | (0x05u64 << 16));
    assert_eq!(StatusMessage::BIT_WIDTH, 24);
}

#[test]
fn round_trips_through_pack_and_unpack() {
    let msg = StatusMessage {
        speed: 12345,
        flags: 0xAA,
    };
    let packed = msg.pack();
    let decoded = StatusMessage::unpack(packed, StatusMessage::BIT_WIDTH);
    assert_eq!(msg, decoded);
}

#[derive(Debug, PartialEq, CanFrame)]
struct WithPadding {
    #[can(uint = 4)]
    nibble: u8,
    #[can(pad = 4)]
    _reserved: (),
    #[can(bool)]
    flag: bool,
}

#[test]
fn padding_consumes_bits_without_a_field() {
    let msg = WithPadding {
        nibble: 0b1010,
        _reserved: (),
        flag: true,
    };
    let packed = msg.pack();
    assert_eq!(packed, 0b1_0000_1010);
    let decoded = WithPadding::unpack(packed, WithPadding::BIT_WIDTH);
    assert_eq!(msg, decoded);
}
