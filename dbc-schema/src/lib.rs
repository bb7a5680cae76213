//! TOML device-spec parsing, inheritance resolution, and lowering into the
//! `dbc-asm` intermediate representation.
//!
//! The pipeline is: [`raw::RawDeviceSpec`] (C1, straight off the wire) →
//! [`resolve::resolve_inheritance`] (C2, merges the `base[]` chain) →
//! [`lower::lower`] (C4, resolves textual type references into
//! `dbc_asm::DType`). [`loader::DirectorySpecSource`] wires the resolver to
//! a directory of spec files; [`resolve::BaseSpecSource`] keeps it testable
//! against an in-memory fixture map.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod lower;
pub mod raw;
pub mod resolve;

pub use error::{
    LowerError,
    SpecError,
};
pub use loader::DirectorySpecSource;
pub use lower::lower;
pub use raw::RawDeviceSpec;
pub use resolve::{
    resolve_inheritance,
    BaseSpecSource,
};

/// Loads, resolves, and lowers a named device spec from a directory in one
/// call — the composed pipeline most callers want.
pub fn load_device(
    source: &DirectorySpecSource,
    name: &str,
) -> Result<dbc_asm::Device, LoadError> {
    let raw = source.read(name)?;
    let resolved = resolve_inheritance(raw, source)?;
    let device = lower(&resolved)?;
    Ok(device)
}

/// Union of the errors the composed [`load_device`] pipeline can raise.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Failed while reading or resolving the spec's inheritance chain.
    #[error(transparent)]
    Spec(#[from] SpecError),
    /// Failed while lowering the resolved spec into the IR.
    #[error(transparent)]
    Lower(#[from] LowerError),
}
