//! The little-endian, sub-byte, arbitrary-width bit codec.
//!
//! This is the single implementation of the pack/unpack rules both the
//! runtime (`dbc-runtime`) and the generator interface (`crate::generator`)
//! must replicate bit-for-bit. Like `fuel-asm`'s `pack.rs`/`unpack.rs`, the
//! shift/mask arithmetic lives in free functions; unlike `fuel-asm` (which
//! has one function per fixed instruction shape), here one function walks a
//! runtime list of [`Signal`]s, since the shape is only known once a device
//! spec has been loaded.

use dbc_types::{
    buf_byte_len,
    float24_from_bits,
    float24_to_bits,
    mask,
    sign_extend,
};

use crate::{
    CodecError,
    DType,
    Signal,
    Value,
};

/// Packs an ordered list of `(signal, value)` pairs into a single payload
/// word, starting at bit offset 0.
///
/// `values[i] = None` means the signal is absent; this is only legal for
/// `optional` signals (required signals with no value are a logic error in
/// the caller, not a codec error, since the IR always has a default to fall
/// back on — see `dbc-schema`'s lowering step).
///
/// Returns the packed payload and whether any optional signal was present
/// (the caller uses this to choose between `min_length` and `max_length`
/// DLC, per the spec).
pub fn encode(signals: &[Signal], values: &[Option<Value>]) -> Result<(u64, bool), CodecError> {
    assert_eq!(signals.len(), values.len(), "signals/values length mismatch");
    let mut payload: u64 = 0;
    let mut offset: u32 = 0;
    let mut any_optional_populated = false;

    for (signal, value) in signals.iter().zip(values) {
        let width = signal.dtype.bit_length();
        if signal.optional && value.is_none() {
            offset += width;
            continue;
        }
        if signal.optional {
            any_optional_populated = true;
        }
        let contribution = match value {
            Some(v) => encode_one(signal, v)?,
            None => 0, // Pad carries no value and is skipped below anyway.
        };
        payload |= contribution << offset;
        offset += width;
    }
    Ok((payload, any_optional_populated))
}

fn encode_one(signal: &Signal, value: &Value) -> Result<u64, CodecError> {
    match (&signal.dtype, value) {
        (DType::Pad { .. }, _) => Ok(0),
        (DType::Bool { .. }, Value::Bool(v)) => Ok(*v as u64),
        (DType::UInt { width, min, max, .. }, Value::UInt(v)) => {
            if v < min || v > max {
                return Err(range_error(signal, *v, *min, *max));
            }
            Ok(*v & mask(*width))
        }
        (DType::SInt { width, min, max, .. }, Value::SInt(v)) => {
            if v < min || v > max {
                return Err(range_error(signal, *v, *min, *max));
            }
            Ok((*v as u64) & mask(*width))
        }
        (
            DType::Float {
                width,
                min,
                max,
                allow_nan_inf,
                ..
            },
            Value::Float(v),
        ) => {
            if !allow_nan_inf && !v.is_finite() {
                return Err(CodecError::NonFinite {
                    signal: signal.name.clone(),
                    value: format!("{v}"),
                });
            }
            if let Some(min) = min {
                if v.is_finite() && *v < *min {
                    return Err(range_error(signal, *v, *min, max.unwrap_or(f64::INFINITY)));
                }
            }
            if let Some(max) = max {
                if v.is_finite() && *v > *max {
                    return Err(range_error(signal, *v, min.unwrap_or(f64::NEG_INFINITY), *max));
                }
            }
            encode_float(signal, *width, *v)
        }
        (DType::Buf { width, .. }, Value::Buf(bytes)) => {
            let capacity = buf_byte_len(*width);
            if bytes.len() > capacity {
                return Err(CodecError::BufferTooLong {
                    signal: signal.name.clone(),
                    len: bytes.len(),
                    capacity,
                });
            }
            let mut padded = [0u8; 8];
            padded[..bytes.len()].copy_from_slice(bytes);
            Ok(u64::from_le_bytes(padded) & mask(*width))
        }
        (DType::Bitset { width, .. }, Value::Bitset(v)) => {
            if *v > mask(*width) {
                return Err(range_error(signal, *v, 0u64, mask(*width)));
            }
            Ok(*v)
        }
        (DType::Enum { width, .. }, Value::Enum(idx)) => Ok(*idx & mask(*width)),
        (DType::Struct { signals, .. }, Value::Struct(sub_values)) => {
            let opt_values: Vec<Option<Value>> =
                sub_values.iter().cloned().map(Some).collect();
            let (bits, _) = encode(signals, &opt_values)?;
            Ok(bits)
        }
        (_, value) => unreachable!(
            "{}: value kind {} does not match declared dtype shape",
            signal.name,
            value.kind_name(),
        ),
    }
}

fn encode_float(signal: &Signal, width: u32, v: f64) -> Result<u64, CodecError> {
    match width {
        24 => Ok(float24_to_bits(v as f32) as u64),
        32 => Ok(u32::from_le_bytes((v as f32).to_le_bytes()) as u64),
        64 => Ok(u64::from_le_bytes(v.to_le_bytes())),
        _ => Err(CodecError::InvalidWidth {
            signal: signal.name.clone(),
            width,
        }),
    }
}

fn range_error<T: std::fmt::Display>(signal: &Signal, value: T, min: T, max: T) -> CodecError {
    CodecError::OutOfRange {
        signal: signal.name.clone(),
        value: format!("{value}"),
        min: format!("{min}"),
        max: format!("{max}"),
    }
}

/// Unpacks an ordered list of signals from a payload with `payload_bits`
/// valid bits (typically `dlc * 8`).
///
/// A signal whose offset is `>= payload_bits` decodes to `None` — this is
/// always legal for optional signals; for required signals it signals that
/// the frame is shorter than the schema expects, which callers in strict
/// mode should treat as [`CodecError::ShortPayload`] (this function itself
/// never fails: it is the caller's job to decide strictness, since lenient
/// decoding of required-but-truncated signals to `None` is itself a valid
/// mode per the spec).
pub fn decode(signals: &[Signal], payload: u64, payload_bits: u32) -> Vec<Option<Value>> {
    let mut offset = 0u32;
    let mut out = Vec::with_capacity(signals.len());
    for signal in signals {
        let width = signal.dtype.bit_length();
        out.push(decode_one(signal, payload, offset, payload_bits));
        offset += width;
    }
    out
}

/// Strict-mode variant of [`decode`]: a non-optional signal whose offset is
/// `>= payload_bits` raises [`CodecError::ShortPayload`] instead of decoding
/// to `None`. Optional signals past the payload bound still decode to `None`
/// — that is their defined absent state, not a truncation.
pub fn decode_strict(
    signals: &[Signal],
    payload: u64,
    payload_bits: u32,
) -> Result<Vec<Option<Value>>, CodecError> {
    let mut offset = 0u32;
    let mut out = Vec::with_capacity(signals.len());
    for signal in signals {
        let width = signal.dtype.bit_length();
        if !signal.optional && !matches!(signal.dtype, DType::Pad { .. }) && offset >= payload_bits
        {
            return Err(CodecError::ShortPayload {
                signal: signal.name.clone(),
                offset,
                payload_bits,
            });
        }
        out.push(decode_one(signal, payload, offset, payload_bits));
        offset += width;
    }
    Ok(out)
}

fn decode_one(signal: &Signal, payload: u64, offset: u32, payload_bits: u32) -> Option<Value> {
    if matches!(signal.dtype, DType::Pad { .. }) {
        return None;
    }
    if offset >= payload_bits {
        return None;
    }
    let shifted = if offset >= 64 { 0 } else { payload >> offset };
    Some(match &signal.dtype {
        DType::Pad { .. } => unreachable!(),
        DType::Bool { .. } => Value::Bool(shifted & 1 == 1),
        DType::UInt { width, .. } => Value::UInt(shifted & mask(*width)),
        DType::SInt { width, .. } => Value::SInt(sign_extend(shifted & mask(*width), *width)),
        DType::Float { width, .. } => Value::Float(decode_float(*width, shifted)),
        DType::Buf { width, .. } => {
            let raw = shifted & mask(*width);
            let len = decode_buf_byte_len(*width).min(8);
            Value::Buf(raw.to_le_bytes()[..len].to_vec())
        }
        DType::Bitset { width, .. } => Value::Bitset(shifted & mask(*width)),
        DType::Enum { width, .. } => Value::Enum(shifted & mask(*width)),
        DType::Struct { signals, .. } => {
            let sub_payload_bits = payload_bits.saturating_sub(offset);
            let values = decode(signals, shifted, sub_payload_bits);
            Value::Struct(
                values
                    .into_iter()
                    .zip(signals)
                    .map(|(v, s)| v.unwrap_or_else(|| struct_field_zero(&s.dtype)))
                    .collect(),
            )
        }
    })
}

/// Byte length of a decoded `Buf` value: `ceil(width / 8)`, distinct from
/// [`DType::buf_capacity_bytes`]'s `ceil((width + 1) / 8)` encode capacity —
/// decode yields exactly the bytes the width covers, not the extra byte
/// reserved so encode can round-trip a value one bit over a byte boundary.
fn decode_buf_byte_len(width: u32) -> usize {
    width.div_ceil(8) as usize
}

fn decode_float(width: u32, shifted: u64) -> f64 {
    match width {
        24 => float24_from_bits((shifted & mask(24)) as u32) as f64,
        32 => f32::from_le_bytes(((shifted & mask(32)) as u32).to_le_bytes()) as f64,
        64 => f64::from_le_bytes(shifted.to_le_bytes()),
        // Invalid widths are rejected at lowering time (`InvalidWidth`); by
        // the time decode runs the IR is trusted.
        _ => 0.0,
    }
}

/// Natural zero/null value for a sub-signal whose offset fell past the
/// available payload — used when decoding a `Struct` whose tail runs off
/// the end of a short frame.
fn struct_field_zero(dtype: &DType) -> Value {
    match dtype {
        DType::UInt { .. } => Value::UInt(0),
        DType::SInt { .. } => Value::SInt(0),
        DType::Float { .. } => Value::Float(0.0),
        DType::Bool { .. } => Value::Bool(false),
        DType::Buf { width, .. } => Value::Buf(vec![0u8; decode_buf_byte_len(*width)]),
        DType::Bitset { .. } => Value::Bitset(0),
        DType::Enum { default_idx, .. } => Value::Enum(*default_idx),
        DType::Struct { signals, .. } => {
            Value::Struct(signals.iter().map(|s| struct_field_zero(&s.dtype)).collect())
        }
        DType::Pad { .. } => Value::Bool(false),
    }
}

/// The `(offset, width)` of every non-`Pad` signal in declaration order —
/// the monotone-offset invariant the spec requires, and the query the
/// generator interface (C8) uses so emitters never re-derive layout.
pub fn signal_offsets(signals: &[Signal]) -> Vec<(u32, u32)> {
    let mut offset = 0u32;
    let mut out = Vec::new();
    for signal in signals {
        let width = signal.dtype.bit_length();
        if !matches!(signal.dtype, DType::Pad { .. }) {
            out.push((offset, width));
        }
        offset += width;
    }
    out
}

/// Total bit width of an ordered signal list, padding included.
pub fn total_bit_width(signals: &[Signal]) -> u32 {
    signals.iter().map(|s| s.dtype.bit_length()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;

    fn uint(width: u32) -> DType {
        DType::UInt {
            width,
            min: 0,
            max: DType::default_uint_max(width),
            default: 0,
            factor_num: 1,
            factor_den: 1,
            offset: 0.0,
        }
    }

    fn sint(width: u32) -> DType {
        DType::SInt {
            width,
            min: DType::default_sint_min(width),
            max: DType::default_sint_max(width),
            default: 0,
            factor_num: 1,
            factor_den: 1,
            offset: 0.0,
        }
    }

    fn bitset(width: u32) -> DType {
        DType::Bitset {
            name: "Status".into(),
            width,
            flags: vec![],
        }
    }

    /// Fixture S1: a status message of one `sint16` speed signal followed by
    /// an 8-bit bitset, packed into a single `u16` payload.
    #[test]
    fn fixture_s1_status_message() {
        let signals = vec![
            Signal::required("speed", sint(16)),
            Signal::required("flags", bitset(8)),
        ];
        let values = vec![Some(Value::SInt(-100)), Some(Value::Bitset(0x05))];
        let (payload, _) = encode(&signals, &values).unwrap();
        assert_eq!(payload, ((-100i16 as u16) as u64) | (0x05u64 << 16));

        let decoded = decode(&signals, payload, 24);
        assert_eq!(decoded[0], Some(Value::SInt(-100)));
        assert_eq!(decoded[1], Some(Value::Bitset(0x05)));
    }

    /// Fixture S2: a position output of `sint32`, `uint2`, `uint14` packed
    /// back-to-back, matching the spec's worked payload example.
    #[test]
    fn fixture_s2_position_output() {
        let signals = vec![
            Signal::required("position", sint(32)),
            Signal::required("mode", uint(2)),
            Signal::required("reserved", uint(14)),
        ];
        let values = vec![
            Some(Value::SInt(-1)),
            Some(Value::UInt(0b11)),
            Some(Value::UInt(0)),
        ];
        let (payload, _) = encode(&signals, &values).unwrap();
        // -1 as sint32 is all ones in the low 32 bits; mode (2 bits) follows.
        assert_eq!(payload & 0xFF_FF_FF_FF, 0xFF_FF_FF_FF);
        assert_eq!((payload >> 32) & 0b11, 0b11);

        let decoded = decode(&signals, payload, 48);
        assert_eq!(decoded[0], Some(Value::SInt(-1)));
        assert_eq!(decoded[1], Some(Value::UInt(0b11)));
        assert_eq!(decoded[2], Some(Value::UInt(0)));
    }

    /// Fixture S3: a setting-command message whose trailing signal is
    /// optional; its presence must promote the frame to `max_length`.
    #[test]
    fn fixture_s3_optional_trailing_signal_promotes_dlc() {
        let signals = vec![
            Signal::required("setting_id", uint(8)),
            Signal::optional("value", uint(32)),
        ];

        let (_, populated) = encode(&signals, &[Some(Value::UInt(7)), None]).unwrap();
        assert!(!populated);

        let (_, populated) =
            encode(&signals, &[Some(Value::UInt(7)), Some(Value::UInt(42))]).unwrap();
        assert!(populated);
    }

    #[test]
    fn out_of_range_uint_is_rejected() {
        let signals = vec![Signal::required(
            "byte",
            DType::UInt {
                width: 8,
                min: 0,
                max: 10,
                default: 0,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
            },
        )];
        let err = encode(&signals, &[Some(Value::UInt(11))]).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));
    }

    #[test]
    fn buf_decode_yields_exactly_width_over_8_bytes() {
        let signals = vec![Signal::required("value", DType::Buf { width: 48, default: 0 })];
        let (payload, _) = encode(&signals, &[Some(Value::Buf(vec![1, 2, 3, 4, 5, 6]))]).unwrap();
        let decoded = decode(&signals, payload, 48);
        let Some(Value::Buf(bytes)) = decoded[0].clone() else {
            panic!("expected a Buf value");
        };
        assert_eq!(bytes.len(), 6);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn decode_strict_errors_on_required_signal_past_payload_bound() {
        let signals = vec![
            Signal::required("a", uint(8)),
            Signal::required("b", uint(16)),
        ];
        let err = decode_strict(&signals, 0, 8).unwrap_err();
        assert!(matches!(err, CodecError::ShortPayload { .. }));
    }

    #[test]
    fn decode_strict_allows_optional_signal_past_payload_bound() {
        let signals = vec![
            Signal::required("a", uint(8)),
            Signal::optional("b", uint(16)),
        ];
        let decoded = decode_strict(&signals, 0xFF, 8).unwrap();
        assert_eq!(decoded[0], Some(Value::UInt(0xFF)));
        assert_eq!(decoded[1], None);
    }

    #[test]
    fn signal_offsets_are_monotone_and_skip_pad() {
        let signals = vec![
            Signal::required("a", uint(3)),
            Signal::required("gap", DType::Pad { width: 5 }),
            Signal::required("b", uint(16)),
        ];
        let offsets = signal_offsets(&signals);
        assert_eq!(offsets, vec![(0, 3), (8, 16)]);
        for pair in offsets.windows(2) {
            assert!(pair[0].0 + pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn float24_encode_drops_low_byte() {
        let signals = vec![Signal::required(
            "temp",
            DType::Float {
                width: 24,
                min: None,
                max: None,
                default: 0.0,
                allow_nan_inf: false,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
            },
        )];
        let (payload, _) = encode(&signals, &[Some(Value::Float(1.5))]).unwrap();
        assert_eq!(payload & 0xFF, 0);
    }

    #[quickcheck_macros::quickcheck]
    fn sint_round_trips_over_declared_range(raw: i32) -> TestResult {
        let width = 20u32;
        let min = DType::default_sint_min(width);
        let max = DType::default_sint_max(width);
        let value = (raw as i64).clamp(min, max);
        let signals = vec![Signal::required("v", sint(width))];
        let (payload, _) = encode(&signals, &[Some(Value::SInt(value))]).unwrap();
        let decoded = decode(&signals, payload, width.div_ceil(8) * 8);
        TestResult::from_bool(decoded[0] == Some(Value::SInt(value)))
    }

    #[quickcheck_macros::quickcheck]
    fn round_trip_is_idempotent_for_mixed_signal_list(a: u16, b: i8) -> TestResult {
        let signals = vec![
            Signal::required("a", uint(16)),
            Signal::required("b", sint(8)),
        ];
        let values = vec![Some(Value::UInt(a as u64)), Some(Value::SInt(b as i64))];
        let (payload, _) = encode(&signals, &values).unwrap();
        let decoded = decode(&signals, payload, 24);
        TestResult::from_bool(decoded == values)
    }
}
