//! Parses each field's `#[can(...)]` attribute into its wire shape.

use syn::Attribute;

/// How one struct field is packed onto the wire.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// `#[can(uint = N)]` — field type must be an unsigned integer.
    UInt(u32),
    /// `#[can(sint = N)]` — field type must be a signed integer.
    SInt(u32),
    /// `#[can(bool)]` — one bit.
    Bool,
    /// `#[can(bitset = N)]` — raw `N`-bit pattern, field type an unsigned integer.
    Bitset(u32),
    /// `#[can(pad = N)]` — `N` bits contributing only to offset, no field read/written.
    Pad(u32),
}

impl FieldKind {
    /// Number of bits this field occupies.
    pub fn width(&self) -> u32 {
        match self {
            FieldKind::UInt(w) | FieldKind::SInt(w) | FieldKind::Bitset(w) | FieldKind::Pad(w) => {
                *w
            }
            FieldKind::Bool => 1,
        }
    }

    /// Parses the `#[can(...)]` attribute attached to a field.
    ///
    /// Panics with a descriptive message on malformed input — derive macros
    /// have no other channel to report a spec error at the call site.
    pub fn parse(attrs: &[Attribute]) -> FieldKind {
        for attr in attrs {
            if !attr.path().is_ident("can") {
                continue;
            }
            let mut kind = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("bool") {
                    kind = Some(FieldKind::Bool);
                    return Ok(());
                }
                let value = meta.value()?;
                let width: syn::LitInt = value.parse()?;
                let width: u32 = width.base10_parse()?;
                if meta.path.is_ident("uint") {
                    kind = Some(FieldKind::UInt(width));
                } else if meta.path.is_ident("sint") {
                    kind = Some(FieldKind::SInt(width));
                } else if meta.path.is_ident("bitset") {
                    kind = Some(FieldKind::Bitset(width));
                } else if meta.path.is_ident("pad") {
                    kind = Some(FieldKind::Pad(width));
                } else {
                    return Err(meta.error("unknown `can` field attribute"));
                }
                Ok(())
            })
            .unwrap_or_else(|e| panic!("malformed `#[can(...)]` attribute: {e}"));
            return kind.expect("`#[can(...)]` attribute carried no recognized key");
        }
        panic!("every `CanFrame` field needs a `#[can(...)]` attribute");
    }

    /// Returns `true` if this variant still reads/writes a value, as
    /// opposed to [`FieldKind::Pad`] which only advances the bit offset.
    pub fn has_field(&self) -> bool {
        !matches!(self, FieldKind::Pad(_))
    }
}
