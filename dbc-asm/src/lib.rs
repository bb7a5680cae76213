//! The closed intermediate representation for CAN device schemas and the
//! bit-level codec that packs/unpacks values against it.
//!
//! `dbc-schema` lowers a textual device spec into the [`DType`]/[`Signal`]
//! shapes defined here; `dbc-runtime` drives [`codec::encode`] and
//! [`codec::decode`] against them at message-send/receive time.

#![warn(missing_docs)]

mod codec;
mod dtype;
mod error;
mod static_codec;
mod value;

pub use codec::{decode, decode_strict, encode, signal_offsets, total_bit_width};
pub use dtype::{BitFlag, DType, Device, EnumType, EnumValue, Message, Setting, Signal, Source};
pub use error::CodecError;
pub use static_codec::StaticSignal;
pub use value::Value;

/// Not public API. Re-exports the bit primitives `dbc-derive`-generated
/// code calls into, so generated `StaticSignal` impls don't need their own
/// `dbc-types` dependency declaration.
#[doc(hidden)]
pub mod __private {
    pub use dbc_types::{mask, sign_extend};
}
