//! The TOML-deserializable shape of a device spec, straight off the wire.
//!
//! Mirrors how the original tooling parsed TOML into dataclasses
//! field-by-field: every optional key gets a `#[serde(default)]` so a
//! minimal base spec (just a handful of types) parses without fuss.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level device spec document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeviceSpec {
    /// Device name.
    pub name: String,
    /// Names of base specs to merge in, in declared order.
    #[serde(default)]
    pub base: Vec<String>,
    /// Target architecture identifier.
    #[serde(default)]
    pub arch: String,
    /// Whether this device is exposed in generated public bindings.
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// 5-bit device type used in the arbitration identifier.
    #[serde(default)]
    pub dev_type: u8,
    /// Free-form device classification.
    #[serde(default)]
    pub dev_class: String,
    /// Messages, keyed by name.
    #[serde(default)]
    pub msg: BTreeMap<String, RawMessage>,
    /// Settings, keyed by name.
    #[serde(default)]
    pub settings: BTreeMap<String, RawSetting>,
    /// Named types (structs, bitsets, primitive aliases), keyed by name.
    #[serde(default)]
    pub types: BTreeMap<String, RawType>,
    /// Enums, keyed by name.
    #[serde(default)]
    pub enums: BTreeMap<String, RawEnum>,
    /// Setting-command entries, keyed by name.
    #[serde(default)]
    pub setting_commands: BTreeMap<String, RawSettingCommand>,
    /// Vendor-specific binding namespace hints.
    pub vendordep: Option<RawVendorDep>,
}

fn default_true() -> bool {
    true
}

/// A CAN message entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    /// Message id within the device's namespace.
    pub id: u8,
    /// Minimum payload length in bytes.
    pub min_length: Option<u8>,
    /// Maximum payload length in bytes.
    pub max_length: Option<u8>,
    /// Shorthand for `min_length = max_length = length`.
    pub length: Option<u8>,
    /// Which party sends this message: `"device"`, `"host"`, or `"both"`.
    #[serde(default)]
    pub source: Option<String>,
    /// Whether this message is exposed in generated public bindings.
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Whether this message is vendor-specific.
    #[serde(default)]
    pub vendordep: bool,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
    /// Signals, in declaration (and wire) order.
    #[serde(default)]
    pub signals: Vec<RawSignal>,
}

/// A setting-command entry: the id a `SETTING_COMMAND` enum variant is
/// synthesized from, nothing more. Unlike a real [`RawMessage`], a setting
/// command carries no payload shape of its own — it addresses one of the
/// fixed set/report-setting frames instead of declaring its own signals.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettingCommand {
    /// Command id within the device's namespace.
    pub id: u8,
    /// Whether this command is vendor-specific.
    #[serde(default)]
    pub vendordep: bool,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
}

/// A signal entry within a message or struct type.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSignal {
    /// Field name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
    /// Textual type reference, resolved at lowering time (see [`crate::lower`]).
    pub dtype: String,
    /// Whether this is a trailing optional signal.
    #[serde(default)]
    pub optional: bool,
    /// Override of the referenced type's default value, as a literal string.
    pub default_value: Option<String>,
    /// Whether this signal selects or is selected by a multiplexer. Not
    /// implemented — see the crate's module docs.
    #[serde(default)]
    pub mux: bool,
    /// Name of the multiplexer signal this one is gated by.
    pub muxed_by: Option<String>,
    /// Value of the multiplexer that selects this signal.
    pub muxed_match: Option<String>,
}

/// A device-resident configuration value entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSetting {
    /// Setting id, unique within the device.
    pub id: u8,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
    /// Textual type reference.
    pub dtype: String,
    /// Whether the setting can be read back.
    #[serde(default = "default_true")]
    pub readable: bool,
    /// Whether the setting can be written.
    #[serde(default = "default_true")]
    pub writable: bool,
    /// Whether writing resets the device to defaults.
    #[serde(default)]
    pub reset_on_default: bool,
    /// Whether this setting is vendor-specific.
    #[serde(default)]
    pub vendordep: bool,
}

/// A named type entry: a primitive alias, a `struct`, or a `bitset`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawType {
    /// One of `uint`, `sint`, `float`, `bool`, `pad`, `buf`, `bitset`, `struct`.
    pub kind: String,
    /// Bit width, for every kind except `struct`.
    pub width: Option<u32>,
    /// Inclusive lower bound, for numeric kinds.
    pub min: Option<f64>,
    /// Inclusive upper bound, for numeric kinds.
    pub max: Option<f64>,
    /// Default value, as a literal string (parsed per-kind at lowering time).
    pub default_value: Option<String>,
    /// Whether NaN/Infinity are accepted on encode, for `float`.
    #[serde(default)]
    pub allow_nan_inf: bool,
    /// Scaling factor numerator.
    #[serde(default = "default_one_i64")]
    pub factor_num: i64,
    /// Scaling factor denominator.
    #[serde(default = "default_one_i64")]
    pub factor_den: i64,
    /// Scaling offset.
    #[serde(default)]
    pub offset: f64,
    /// Sub-signals, for `struct`.
    #[serde(default)]
    pub signals: Vec<RawSignal>,
    /// Named flags, for `bitset`.
    #[serde(default)]
    pub bit_flags: Vec<RawBitFlag>,
}

fn default_one_i64() -> i64 {
    1
}

/// One named bit flag inside a `bitset` type entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBitFlag {
    /// Flag name.
    pub name: String,
    /// Bit index within the bitset (0 = LSB).
    pub bit_idx: u32,
    /// Default value of this flag.
    #[serde(default)]
    pub default: bool,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
}

/// An enum entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnum {
    /// Backing integer type, currently always `"uint"`.
    #[serde(default = "default_uint_btype")]
    pub btype: String,
    /// Bit width.
    pub bits: u32,
    /// Whether this enum is exposed in generated public bindings.
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Name of the default variant; empty string tolerated for the
    /// synthesized `SETTING`/`SETTING_COMMAND` enums.
    #[serde(default)]
    pub default_value: String,
    /// Variants, keyed by name.
    pub values: BTreeMap<String, RawEnumValue>,
}

fn default_uint_btype() -> String {
    "uint".to_string()
}

/// One named variant inside an enum entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnumValue {
    /// Variant's integer index.
    pub id: u64,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
}

/// Vendor-specific binding namespace hints, carried through to generators.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVendorDep {
    /// Java package for generated Java bindings.
    pub java_package: Option<String>,
    /// C++ namespace for generated C++ bindings.
    pub cpp_namespace: Option<String>,
}
