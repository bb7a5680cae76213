//! The closed `DType` sum and the `Signal`/`Message`/`Setting` shapes built
//! from it.
//!
//! This mirrors how `fuel-asm` keeps one explicit variant per instruction
//! shape and dispatches on it with pattern matching rather than runtime type
//! checks: a `DType` here is the CAN-schema analogue of an `Opcode` there —
//! closed, exhaustively matched everywhere it is consumed.

use std::collections::BTreeMap;

/// One named bit-flag inside a [`DType::Bitset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFlag {
    /// Flag name, e.g. `SLOT5`.
    pub name: String,
    /// Bit index within the bitset (0 = LSB).
    pub bit_idx: u32,
    /// Default value of this flag.
    pub default: bool,
    /// Human-readable description.
    pub comment: String,
}

/// One named, integer-valued variant inside a [`DType::Enum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Variant name.
    pub name: String,
    /// Human-readable description.
    pub comment: String,
}

/// The closed sum of data types the IR can express. Every variant knows its
/// own bit width via [`DType::bit_length`].
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    /// Unsigned integer, 1..=64 bits.
    UInt {
        /// Bit width.
        width: u32,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
        /// Default value.
        default: u64,
        /// Scaling factor numerator (documentation only; the codec packs raw integers).
        factor_num: i64,
        /// Scaling factor denominator.
        factor_den: i64,
        /// Scaling offset.
        offset: f64,
    },
    /// Two's-complement signed integer, 1..=64 bits.
    SInt {
        /// Bit width.
        width: u32,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
        /// Default value.
        default: i64,
        /// Scaling factor numerator.
        factor_num: i64,
        /// Scaling factor denominator.
        factor_den: i64,
        /// Scaling offset.
        offset: f64,
    },
    /// IEEE-754 little-endian float, width in `{24, 32, 64}`.
    Float {
        /// Bit width: 24, 32 or 64.
        width: u32,
        /// Optional inclusive lower bound.
        min: Option<f64>,
        /// Optional inclusive upper bound.
        max: Option<f64>,
        /// Default value.
        default: f64,
        /// Whether NaN/Infinity are accepted on encode.
        allow_nan_inf: bool,
        /// Scaling factor numerator.
        factor_num: i64,
        /// Scaling factor denominator.
        factor_den: i64,
        /// Scaling offset.
        offset: f64,
    },
    /// Single bit boolean.
    Bool {
        /// Default value.
        default: bool,
    },
    /// Placeholder bits: contribute only to offsets, carry no value.
    Pad {
        /// Bit width.
        width: u32,
    },
    /// Little-endian byte buffer, capacity `ceil((width + 1) / 8)` bytes.
    Buf {
        /// Bit width (not byte width — see [`DType::bit_length`]).
        width: u32,
        /// Default value, interpreted as a little-endian integer.
        default: u64,
    },
    /// Named bit flags.
    Bitset {
        /// Bitset type name.
        name: String,
        /// Bit width.
        width: u32,
        /// Flags, in declaration order.
        flags: Vec<BitFlag>,
    },
    /// Integer-valued named variants.
    Enum {
        /// Enum type name.
        name: String,
        /// Bit width.
        width: u32,
        /// Index of the default variant.
        default_idx: u64,
        /// Whether this enum is exposed in generated public bindings.
        is_public: bool,
        /// Variants keyed by integer index, in ascending index order.
        values: BTreeMap<u64, EnumValue>,
    },
    /// Composite type: sub-signals inlined at the parent's current offset.
    Struct {
        /// Struct type name.
        name: String,
        /// Sub-signals, in declaration order.
        signals: Vec<Signal>,
    },
}

impl DType {
    /// Total bit width this DType occupies when packed.
    pub fn bit_length(&self) -> u32 {
        match self {
            DType::UInt { width, .. }
            | DType::SInt { width, .. }
            | DType::Float { width, .. }
            | DType::Pad { width }
            | DType::Buf { width, .. }
            | DType::Bitset { width, .. }
            | DType::Enum { width, .. } => *width,
            DType::Bool { .. } => 1,
            DType::Struct { signals, .. } => signals.iter().map(|s| s.dtype.bit_length()).sum(),
        }
    }

    /// `Bitset.default`: bitwise OR of `(default_i << bit_idx_i)`.
    pub fn bitset_default(flags: &[BitFlag]) -> u64 {
        flags.iter().fold(0u64, |acc, f| {
            acc | ((f.default as u64) << f.bit_idx)
        })
    }

    /// Byte capacity of a `Buf` DType: `ceil((width + 1) / 8)`.
    pub fn buf_capacity_bytes(width: u32) -> usize {
        dbc_types::buf_byte_len(width)
    }

    /// Implicit unsigned maximum for a `UInt` of the given width with no
    /// explicit bound: `2^width - 1`.
    pub fn default_uint_max(width: u32) -> u64 {
        dbc_types::mask(width)
    }

    /// Implicit signed minimum for an `SInt` of the given width with no
    /// explicit bound: `-2^(width-1)`.
    pub fn default_sint_min(width: u32) -> i64 {
        if width == 0 {
            0
        } else {
            -(1i64 << (width - 1))
        }
    }

    /// Implicit signed maximum for an `SInt` of the given width with no
    /// explicit bound: `2^(width-1) - 1`.
    pub fn default_sint_max(width: u32) -> i64 {
        if width == 0 {
            0
        } else {
            (1i64 << (width - 1)) - 1
        }
    }
}

/// A named, typed field occupying a contiguous bit range of a message or
/// struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Field name.
    pub name: String,
    /// Human-readable description.
    pub comment: String,
    /// The field's data type.
    pub dtype: DType,
    /// Whether this is a trailing optional signal (see [`crate::codec`]).
    pub optional: bool,
}

impl Signal {
    /// Convenience constructor for a required signal.
    pub fn required(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            dtype,
            optional: false,
        }
    }

    /// Convenience constructor for a trailing optional signal.
    pub fn optional(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            dtype,
            optional: true,
        }
    }
}

/// Where a message originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Sent by the device.
    Device,
    /// Sent by the host.
    Host,
    /// Sent by either.
    Both,
}

/// A CAN message: an ordered list of signals occupying at most 8 bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message id within the device's namespace, 0..=31.
    pub id: u8,
    /// Human-readable description.
    pub comment: String,
    /// Minimum payload length in bytes.
    pub min_length: u8,
    /// Maximum payload length in bytes, 0..=8.
    pub max_length: u8,
    /// Which party sends this message.
    pub source: Source,
    /// Whether this message is exposed in generated public bindings.
    pub is_public: bool,
    /// Signals, in declaration (and wire) order.
    pub signals: Vec<Signal>,
}

/// A device-resident configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Setting name.
    pub name: String,
    /// Setting id, unique within the device.
    pub id: u8,
    /// Human-readable description.
    pub comment: String,
    /// The setting's value type. Its packed width must be at most 48 bits.
    pub dtype: DType,
    /// Whether the setting can be read back.
    pub readable: bool,
    /// Whether the setting can be written.
    pub writable: bool,
    /// Whether writing resets the device to defaults.
    pub reset_on_default: bool,
    /// Whether this setting is vendor-specific.
    pub vendordep: bool,
}

/// The fully resolved intermediate representation for one device: the
/// output of inheritance resolution and lowering, immutable thereafter.
///
/// Built once per spec file; safe to share across threads (wrap in `Arc`)
/// since nothing here is interior-mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Device name, as declared in the spec (post-inheritance).
    pub name: String,
    /// Target architecture identifier, inherited from the base chain if unset.
    pub arch: String,
    /// 5-bit device type, used in the arbitration identifier.
    pub dev_type: u8,
    /// Device class, a free-form classification string.
    pub dev_class: String,
    /// Messages keyed by name.
    pub messages: BTreeMap<String, Message>,
    /// Settings keyed by name.
    pub settings: BTreeMap<String, Setting>,
    /// Enums keyed by name, including the synthesized `SETTING` and
    /// `SETTING_COMMAND` enums.
    pub enums: BTreeMap<String, EnumType>,
    /// Named struct types keyed by name.
    pub structs: BTreeMap<String, DType>,
    /// Named bitset types keyed by name.
    pub bitsets: BTreeMap<String, DType>,
}

/// A named enum type: the resolved form of an `enums{}` entry, independent
/// of any one signal's use of it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    /// Enum name.
    pub name: String,
    /// Bit width.
    pub width: u32,
    /// Index of the default variant.
    pub default_idx: u64,
    /// Whether this enum is exposed in generated public bindings.
    pub is_public: bool,
    /// Variants keyed by integer index.
    pub values: BTreeMap<u64, EnumValue>,
}

impl Device {
    /// Messages in the generator's guaranteed iteration order: descending
    /// by id, excluding messages the spec marked non-public.
    pub fn public_messages_descending(&self) -> Vec<&Message> {
        let mut out: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| m.is_public)
            .collect();
        out.sort_by_key(|m| std::cmp::Reverse(m.id));
        out
    }

    /// Setting commands in the generator's guaranteed iteration order:
    /// ascending by id. Settings themselves are addressed by the
    /// `SETTING` enum, not iterated directly here.
    pub fn settings_ascending(&self) -> Vec<&Setting> {
        let mut out: Vec<&Setting> = self.settings.values().collect();
        out.sort_by_key(|s| s.id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_length_sums_struct_sub_signals() {
        let dtype = DType::Struct {
            name: "Flags".into(),
            signals: vec![
                Signal::required("a", DType::Bool { default: false }),
                Signal::required("b", DType::UInt {
                    width: 7,
                    min: 0,
                    max: 127,
                    default: 0,
                    factor_num: 1,
                    factor_den: 1,
                    offset: 0.0,
                }),
            ],
        };
        assert_eq!(dtype.bit_length(), 8);
    }

    #[test]
    fn bitset_default_ors_flag_defaults() {
        let flags = vec![
            BitFlag {
                name: "A".into(),
                bit_idx: 0,
                default: true,
                comment: String::new(),
            },
            BitFlag {
                name: "B".into(),
                bit_idx: 2,
                default: true,
                comment: String::new(),
            },
        ];
        assert_eq!(DType::bitset_default(&flags), 0b101);
    }

    #[rstest::rstest]
    #[case(8, 255)]
    #[case(1, 1)]
    #[case(16, 65535)]
    fn default_uint_max_matches_width(#[case] width: u32, #[case] expected: u64) {
        assert_eq!(DType::default_uint_max(width), expected);
    }

    #[rstest::rstest]
    #[case(8, -128, 127)]
    #[case(16, -32768, 32767)]
    fn default_sint_bounds_match_width(
        #[case] width: u32,
        #[case] min: i64,
        #[case] max: i64,
    ) {
        assert_eq!(DType::default_sint_min(width), min);
        assert_eq!(DType::default_sint_max(width), max);
    }
}
