//! Codec error kinds.
//!
//! One `thiserror`-derived enum per the spec's error table, following the
//! reference workspace's convention of a dedicated `error.rs` per crate
//! rather than one global error type.

/// Errors raised while packing or unpacking a value against a [`crate::DType`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Value violates the DType's declared `[min, max]` bound at encode.
    #[error("{signal}: value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending signal.
        signal: String,
        /// The value that was rejected, formatted for display.
        value: String,
        /// Lower bound, formatted for display.
        min: String,
        /// Upper bound, formatted for display.
        max: String,
    },
    /// Non-finite float passed to a DType with `allow_nan_inf = false`.
    #[error("{signal}: value {value} is not finite")]
    NonFinite {
        /// Name of the offending signal.
        signal: String,
        /// The non-finite value, formatted for display.
        value: String,
    },
    /// A `Buf` value longer than the DType's declared capacity.
    #[error("{signal}: buffer of {len} bytes exceeds capacity of {capacity} bytes")]
    BufferTooLong {
        /// Name of the offending signal.
        signal: String,
        /// Length of the supplied buffer.
        len: usize,
        /// Maximum number of bytes the DType can hold.
        capacity: usize,
    },
    /// A scalar DType's declared width is not representable (0, or > 64 for
    /// scalars; not in `{24, 32, 64}` for floats).
    #[error("{signal}: invalid width {width}")]
    InvalidWidth {
        /// Name of the offending signal.
        signal: String,
        /// The rejected width.
        width: u32,
    },
    /// Decode of a non-optional signal whose offset exceeds `dlc * 8` while
    /// operating in strict mode.
    #[error("{signal}: offset {offset} exceeds payload bound {payload_bits} bits")]
    ShortPayload {
        /// Name of the offending signal.
        signal: String,
        /// The signal's starting bit offset.
        offset: u32,
        /// The frame's available payload bits (`dlc * 8`).
        payload_bits: u32,
    },
}
