//! Derive macro generating compile-time CAN pack/unpack bindings.
//!
//! `#[derive(CanFrame)]` is the "generate pack/unpack at schema compile
//! time" strategy from the design notes on reflection-driven codecs; it is
//! the compile-time counterpart to `dbc-asm`'s interpreter
//! (`dbc_asm::codec::{encode, decode}`), which drives the same bit layout
//! from a runtime descriptor list instead. Annotate each field with
//! `#[can(uint = N)]`, `#[can(sint = N)]`, `#[can(bool)]`,
//! `#[can(bitset = N)]`, or `#[can(pad = N)]`.

#![deny(unused_must_use, unsafe_code)]

extern crate proc_macro;
mod field_kind;
mod frame;

use frame::can_frame_derive;
use proc_macro::TokenStream;
use syn::{
    parse_macro_input,
    DeriveInput,
};

/// Derives `dbc_asm::StaticSignal` for a struct whose fields are each
/// annotated with a `#[can(...)]` wire-shape attribute.
#[proc_macro_derive(CanFrame, attributes(can))]
pub fn derive_can_frame(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    can_frame_derive(input).into()
}
