//! Lowering (C4): resolves every signal's textual `dtype` reference into
//! the closed [`dbc_asm::DType`] intermediate representation.

use std::collections::BTreeMap;

use dbc_asm::{
    BitFlag,
    DType,
    Device,
    EnumType,
    EnumValue,
    Message,
    Setting,
    Signal,
    Source,
};

use crate::{
    error::LowerError,
    raw::{
        RawDeviceSpec,
        RawSignal,
        RawType,
    },
};

/// Lowers a fully-inheritance-resolved [`RawDeviceSpec`] into a
/// [`dbc_asm::Device`].
#[tracing::instrument(skip(spec), fields(device = %spec.name))]
pub fn lower(spec: &RawDeviceSpec) -> Result<Device, LowerError> {
    let enums = lower_enums(spec)?;

    let mut messages = BTreeMap::new();
    for (name, raw) in &spec.msg {
        messages.insert(name.clone(), lower_message(spec, &enums, name, raw)?);
    }

    let mut settings = BTreeMap::new();
    for (name, raw) in &spec.settings {
        let dtype = resolve_type_ref(spec, &enums, name, &raw.dtype, None)?;
        settings.insert(
            name.clone(),
            Setting {
                name: name.clone(),
                id: raw.id,
                comment: raw.comment.clone(),
                dtype,
                readable: raw.readable,
                writable: raw.writable,
                reset_on_default: raw.reset_on_default,
                vendordep: raw.vendordep,
            },
        );
    }

    let mut structs = BTreeMap::new();
    let mut bitsets = BTreeMap::new();
    for (name, raw_type) in &spec.types {
        let dtype = lower_named_type(spec, &enums, name, raw_type)?;
        match &dtype {
            DType::Struct { .. } => {
                structs.insert(name.clone(), dtype);
            }
            DType::Bitset { .. } => {
                bitsets.insert(name.clone(), dtype);
            }
            _ => {}
        }
    }

    Ok(Device {
        name: spec.name.clone(),
        arch: spec.arch.clone(),
        dev_type: spec.dev_type,
        dev_class: spec.dev_class.clone(),
        messages,
        settings,
        enums,
        structs,
        bitsets,
    })
}

fn lower_enums(spec: &RawDeviceSpec) -> Result<BTreeMap<String, EnumType>, LowerError> {
    let mut out = BTreeMap::new();
    for (name, raw) in &spec.enums {
        let values: BTreeMap<u64, EnumValue> = raw
            .values
            .iter()
            .map(|(variant_name, v)| {
                (
                    v.id,
                    EnumValue {
                        name: variant_name.clone(),
                        comment: v.comment.clone(),
                    },
                )
            })
            .collect();
        let default_idx = raw
            .values
            .get(&raw.default_value)
            .map(|v| v.id)
            .unwrap_or(0);
        out.insert(
            name.clone(),
            EnumType {
                name: name.clone(),
                width: raw.bits,
                default_idx,
                is_public: raw.is_public,
                values,
            },
        );
    }
    Ok(out)
}

fn lower_message(
    spec: &RawDeviceSpec,
    enums: &BTreeMap<String, EnumType>,
    name: &str,
    raw: &crate::raw::RawMessage,
) -> Result<Message, LowerError> {
    let (min_length, max_length) = match (raw.length, raw.min_length, raw.max_length) {
        (Some(len), _, _) => (len, len),
        (None, Some(min), Some(max)) => (min, max),
        (None, Some(min), None) => (min, 8),
        (None, None, Some(max)) => (0, max),
        (None, None, None) => (0, 8),
    };
    let source = match raw.source.as_deref() {
        Some("host") => Source::Host,
        Some("both") => Source::Both,
        _ => Source::Device,
    };
    let mut signals = Vec::with_capacity(raw.signals.len());
    for raw_signal in &raw.signals {
        signals.push(lower_signal(spec, enums, name, raw_signal)?);
    }
    Ok(Message {
        id: raw.id,
        comment: raw.comment.clone(),
        min_length,
        max_length,
        source,
        is_public: raw.is_public,
        signals,
    })
}

fn lower_signal(
    spec: &RawDeviceSpec,
    enums: &BTreeMap<String, EnumType>,
    owner: &str,
    raw: &RawSignal,
) -> Result<Signal, LowerError> {
    let dtype = resolve_type_ref(
        spec,
        enums,
        &format!("{owner}.{}", raw.name),
        &raw.dtype,
        raw.default_value.as_deref(),
    )?;
    Ok(Signal {
        name: raw.name.clone(),
        comment: raw.comment.clone(),
        dtype,
        optional: raw.optional,
    })
}

/// Resolves a signal's textual type reference by prefix, per the rules in
/// the lowering contract.
fn resolve_type_ref(
    spec: &RawDeviceSpec,
    enums: &BTreeMap<String, EnumType>,
    signal_label: &str,
    dtype_ref: &str,
    default_override: Option<&str>,
) -> Result<DType, LowerError> {
    if dtype_ref == "bool" || dtype_ref == "bit" {
        let default = default_override
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        return Ok(DType::Bool { default });
    }
    if dtype_ref == "setting_data" {
        return Ok(DType::Buf {
            width: 48,
            default: 0,
        });
    }
    if let Some(rest) = dtype_ref.strip_prefix("enum:") {
        let enum_type = enums.get(rest).ok_or_else(|| LowerError::UnknownEnum {
            signal: signal_label.to_string(),
            enum_name: rest.to_string(),
        })?;
        return Ok(DType::Enum {
            name: enum_type.name.clone(),
            width: enum_type.width,
            default_idx: default_override
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(enum_type.default_idx),
            is_public: enum_type.is_public,
            values: enum_type.values.clone(),
        });
    }
    for (prefix, ctor) in [
        ("uint:", PrimitiveKind::UInt),
        ("sint:", PrimitiveKind::SInt),
        ("float:", PrimitiveKind::Float),
        ("pad:", PrimitiveKind::Pad),
        ("buf:", PrimitiveKind::Buf),
    ] {
        if let Some(rest) = dtype_ref.strip_prefix(prefix) {
            let width: u32 = rest.parse().map_err(|_| LowerError::UnresolvedType {
                signal: signal_label.to_string(),
                dtype_ref: dtype_ref.to_string(),
            })?;
            return primitive_dtype(signal_label, ctor, width, default_override);
        }
    }

    // Bare name: descend into `types`.
    let raw_type = spec.types.get(dtype_ref).ok_or_else(|| LowerError::UnresolvedType {
        signal: signal_label.to_string(),
        dtype_ref: dtype_ref.to_string(),
    })?;
    let mut dtype = lower_named_type(spec, enums, dtype_ref, raw_type)?;
    apply_default_override(&mut dtype, default_override);
    Ok(dtype)
}

enum PrimitiveKind {
    UInt,
    SInt,
    Float,
    Pad,
    Buf,
}

fn primitive_dtype(
    signal_label: &str,
    kind: PrimitiveKind,
    width: u32,
    default_override: Option<&str>,
) -> Result<DType, LowerError> {
    match kind {
        PrimitiveKind::UInt => {
            if width == 0 || width > 64 {
                return Err(LowerError::InvalidScalarWidth {
                    type_name: signal_label.to_string(),
                    width,
                });
            }
            let default = parse_u64(default_override).unwrap_or(0);
            Ok(DType::UInt {
                width,
                min: 0,
                max: DType::default_uint_max(width),
                default,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
            })
        }
        PrimitiveKind::SInt => {
            if width == 0 || width > 64 {
                return Err(LowerError::InvalidScalarWidth {
                    type_name: signal_label.to_string(),
                    width,
                });
            }
            let default = default_override.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
            Ok(DType::SInt {
                width,
                min: DType::default_sint_min(width),
                max: DType::default_sint_max(width),
                default,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
            })
        }
        PrimitiveKind::Float => {
            if width != 24 && width != 32 && width != 64 {
                return Err(LowerError::InvalidFloatWidth {
                    type_name: signal_label.to_string(),
                    width,
                });
            }
            let default = default_override.and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
            Ok(DType::Float {
                width,
                min: None,
                max: None,
                default,
                allow_nan_inf: false,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
            })
        }
        PrimitiveKind::Pad => Ok(DType::Pad { width }),
        PrimitiveKind::Buf => {
            let default = parse_u64(default_override).unwrap_or(0);
            Ok(DType::Buf { width, default })
        }
    }
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    let v = value?;
    if let Some(hex) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        v.parse().ok()
    }
}

fn apply_default_override(dtype: &mut DType, default_override: Option<&str>) {
    let Some(value) = default_override else {
        return;
    };
    match dtype {
        DType::UInt { default, .. } => {
            if let Some(v) = parse_u64(Some(value)) {
                *default = v;
            }
        }
        DType::SInt { default, .. } => {
            if let Ok(v) = value.parse() {
                *default = v;
            }
        }
        DType::Float { default, .. } => {
            if let Ok(v) = value.parse() {
                *default = v;
            }
        }
        DType::Bool { default } => {
            *default = value == "true" || value == "1";
        }
        DType::Buf { default, .. } => {
            if let Some(v) = parse_u64(Some(value)) {
                *default = v;
            }
        }
        DType::Bitset { .. } | DType::Enum { .. } | DType::Struct { .. } | DType::Pad { .. } => {}
    }
}

/// Lowers a named `types{}` entry: a primitive alias, `struct`, or
/// `bitset`.
fn lower_named_type(
    spec: &RawDeviceSpec,
    enums: &BTreeMap<String, EnumType>,
    name: &str,
    raw: &RawType,
) -> Result<DType, LowerError> {
    match raw.kind.as_str() {
        "struct" => {
            let mut signals = Vec::with_capacity(raw.signals.len());
            for raw_signal in &raw.signals {
                signals.push(lower_signal(spec, enums, name, raw_signal)?);
            }
            Ok(DType::Struct {
                name: name.to_string(),
                signals,
            })
        }
        "bitset" => {
            let width = raw.width.ok_or_else(|| LowerError::InvalidScalarWidth {
                type_name: name.to_string(),
                width: 0,
            })?;
            let flags = raw
                .bit_flags
                .iter()
                .map(|f| BitFlag {
                    name: f.name.clone(),
                    bit_idx: f.bit_idx,
                    default: f.default,
                    comment: f.comment.clone(),
                })
                .collect();
            Ok(DType::Bitset {
                name: name.to_string(),
                width,
                flags,
            })
        }
        "uint" | "sint" | "float" | "bool" | "pad" | "buf" => {
            let width = raw.width.unwrap_or(0);
            let default_str = raw.default_value.clone();
            let kind = match raw.kind.as_str() {
                "uint" => PrimitiveKind::UInt,
                "sint" => PrimitiveKind::SInt,
                "float" => PrimitiveKind::Float,
                "pad" => PrimitiveKind::Pad,
                "buf" => PrimitiveKind::Buf,
                _ => unreachable!(),
            };
            if raw.kind == "bool" {
                return Ok(DType::Bool {
                    default: default_str.as_deref() == Some("true"),
                });
            }
            primitive_dtype(name, kind, width, default_str.as_deref())
        }
        other => Err(LowerError::UnresolvedType {
            signal: name.to_string(),
            dtype_ref: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::raw::{
        RawMessage,
        RawSignal,
    };

    fn base_spec() -> RawDeviceSpec {
        RawDeviceSpec {
            name: "motor".to_string(),
            base: vec![],
            arch: "avr".to_string(),
            is_public: true,
            dev_type: 3,
            dev_class: "drivetrain".to_string(),
            msg: BTreeMap::new(),
            settings: BTreeMap::new(),
            types: BTreeMap::new(),
            enums: BTreeMap::new(),
            setting_commands: BTreeMap::new(),
            vendordep: None,
        }
    }

    #[test]
    fn resolves_primitive_prefixes() {
        let spec = base_spec();
        let enums = BTreeMap::new();
        let dtype = resolve_type_ref(&spec, &enums, "x", "uint:12", None).unwrap();
        assert!(matches!(dtype, DType::UInt { width: 12, .. }));

        let dtype = resolve_type_ref(&spec, &enums, "x", "sint:16", None).unwrap();
        assert!(matches!(dtype, DType::SInt { width: 16, .. }));

        let dtype = resolve_type_ref(&spec, &enums, "x", "float:32", None).unwrap();
        assert!(matches!(dtype, DType::Float { width: 32, .. }));

        let dtype = resolve_type_ref(&spec, &enums, "x", "bool", None).unwrap();
        assert!(matches!(dtype, DType::Bool { .. }));

        let dtype = resolve_type_ref(&spec, &enums, "x", "setting_data", None).unwrap();
        assert!(matches!(dtype, DType::Buf { width: 48, .. }));
    }

    #[test]
    fn descends_into_named_struct_type() {
        let mut spec = base_spec();
        spec.types.insert(
            "Position".to_string(),
            RawType {
                kind: "struct".to_string(),
                width: None,
                min: None,
                max: None,
                default_value: None,
                allow_nan_inf: false,
                factor_num: 1,
                factor_den: 1,
                offset: 0.0,
                signals: vec![RawSignal {
                    name: "x".to_string(),
                    comment: String::new(),
                    dtype: "sint:16".to_string(),
                    optional: false,
                    default_value: None,
                    mux: false,
                    muxed_by: None,
                    muxed_match: None,
                }],
                bit_flags: vec![],
            },
        );
        let enums = BTreeMap::new();
        let dtype = resolve_type_ref(&spec, &enums, "sig", "Position", None).unwrap();
        match dtype {
            DType::Struct { signals, .. } => assert_eq!(signals.len(), 1),
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn message_length_shorthand_sets_both_bounds() {
        let spec = base_spec();
        let enums = BTreeMap::new();
        let raw = RawMessage {
            id: 1,
            min_length: None,
            max_length: None,
            length: Some(4),
            source: None,
            is_public: true,
            vendordep: false,
            comment: String::new(),
            signals: vec![],
        };
        let msg = lower_message(&spec, &enums, "status", &raw).unwrap();
        assert_eq!(msg.min_length, 4);
        assert_eq!(msg.max_length, 4);
    }

    #[test]
    fn unknown_enum_reference_is_reported() {
        let spec = base_spec();
        let enums = BTreeMap::new();
        let err = resolve_type_ref(&spec, &enums, "sig", "enum:Mode", None).unwrap_err();
        assert!(matches!(err, LowerError::UnknownEnum { .. }));
    }
}
