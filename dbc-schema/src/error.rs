//! Spec-loading and lowering error kinds, one `thiserror` enum per
//! pipeline stage — matching the workspace's one-`error.rs`-per-crate
//! convention.

/// Errors raised while loading and resolving the inheritance chain (C1/C2).
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// A device's `base[]` named a spec the source couldn't find.
    #[error("base spec `{0}` not found")]
    MissingBase(String),
    /// A `base[]` chain revisits a spec already in the chain.
    #[error("cyclic base chain: `{0}` already visited")]
    CyclicBase(String),
    /// A `default_value` for an enum named a variant that doesn't exist.
    #[error("enum `{enum_name}` default `{default_value}` is not a declared variant")]
    UnknownEnumDefault {
        /// The enum's name.
        enum_name: String,
        /// The offending default value.
        default_value: String,
    },
    /// The underlying TOML document failed to parse.
    #[error("failed to parse spec: {0}")]
    Toml(#[from] toml::de::Error),
    /// The underlying spec file couldn't be read.
    #[error("failed to read spec file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while lowering a resolved [`crate::raw::RawDeviceSpec`]
/// into a [`dbc_asm::Device`].
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    /// A signal's `dtype` string didn't match any recognized prefix or
    /// named type.
    #[error("signal `{signal}` has unresolvable type reference `{dtype_ref}`")]
    UnresolvedType {
        /// The signal carrying the bad reference.
        signal: String,
        /// The textual reference that failed to resolve.
        dtype_ref: String,
    },
    /// A signal referenced `enum:<name>` for a name not present in the
    /// resolved spec's `enums` table.
    #[error("signal `{signal}` references unknown enum `{enum_name}`")]
    UnknownEnum {
        /// The signal carrying the bad reference.
        signal: String,
        /// The missing enum's name.
        enum_name: String,
    },
    /// A float type declared a width outside `{24, 32, 64}`.
    #[error("type `{type_name}` declares invalid float width {width}")]
    InvalidFloatWidth {
        /// The offending type's name.
        type_name: String,
        /// The declared width.
        width: u32,
    },
    /// A scalar type declared a width of 0 or greater than 64.
    #[error("type `{type_name}` declares invalid scalar width {width}")]
    InvalidScalarWidth {
        /// The offending type's name.
        type_name: String,
        /// The declared width.
        width: u32,
    },
    /// A `default_value` string couldn't be parsed as the target DType's
    /// literal form.
    #[error("signal `{signal}` has unparsable default value `{value}`")]
    UnparsableDefault {
        /// The signal carrying the bad default.
        signal: String,
        /// The raw default-value string.
        value: String,
    },
}
