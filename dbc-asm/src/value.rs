//! The dynamic value the interpreter-style codec (see [`crate::codec`])
//! packs and unpacks against a [`crate::DType`].
//!
//! Per the spec's design notes, the in-process IR-driven codec is the
//! "small interpreter over a descriptor list" option — `Value` is that
//! descriptor list's payload type. Compile-time-generated bindings (driven
//! by `dbc-derive`) skip this indirection entirely in favour of native
//! Rust fields, but both must agree on the same bit layout.

/// A value ready to be packed against, or produced by unpacking, a
/// particular [`crate::DType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// For `DType::UInt`.
    UInt(u64),
    /// For `DType::SInt`.
    SInt(i64),
    /// For `DType::Float`.
    Float(f64),
    /// For `DType::Bool`.
    Bool(bool),
    /// For `DType::Buf`, little-endian bytes.
    Buf(Vec<u8>),
    /// For `DType::Bitset`, the raw bit pattern.
    Bitset(u64),
    /// For `DType::Enum`, the variant's integer index (membership is not
    /// enforced on encode — see the spec's open question on forward
    /// compatibility).
    Enum(u64),
    /// For `DType::Struct`, sub-values in the same order as the struct's
    /// signals.
    Struct(Vec<Value>),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::UInt(_) => "uint",
            Value::SInt(_) => "sint",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Buf(_) => "buf",
            Value::Bitset(_) => "bitset",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
        }
    }
}
