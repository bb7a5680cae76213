use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data,
    DeriveInput,
    Fields,
};

use crate::field_kind::FieldKind;

/// Generates a `dbc_asm::StaticSignal` impl packing/unpacking fields in
/// declaration order, matching the runtime codec's ascending-offset
/// convention (first field at bit 0).
pub fn can_frame_derive(input: DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => panic!("CanFrame only supports structs with named fields"),
        },
        _ => panic!("CanFrame only supports structs"),
    };
    assert!(!fields.is_empty(), "CanFrame struct must have at least one field");

    let mut offset: u32 = 0;
    let mut pack_stmts = Vec::new();
    let mut unpack_fields = Vec::new();
    let mut total_width: u32 = 0;

    for field in fields {
        let kind = FieldKind::parse(&field.attrs);
        let width = kind.width();
        let shift = offset;
        let field_name = field
            .ident
            .clone()
            .expect("CanFrame fields must be named");
        total_width += width;
        offset += width;

        if !kind.has_field() {
            unpack_fields.push(quote! { #field_name: ::core::default::Default::default(), });
            continue;
        }

        let pack_expr = match kind {
            FieldKind::Bool => quote! { (self.#field_name as u64) },
            FieldKind::UInt(w) | FieldKind::Bitset(w) => {
                quote! { ((self.#field_name as u64) & ::dbc_asm::__private::mask(#w)) }
            }
            FieldKind::SInt(w) => {
                quote! { ((self.#field_name as i64 as u64) & ::dbc_asm::__private::mask(#w)) }
            }
            FieldKind::Pad(_) => unreachable!(),
        };
        pack_stmts.push(quote! {
            acc |= (#pack_expr) << #shift;
        });

        let unpack_expr = match kind {
            FieldKind::Bool => quote! { (payload >> #shift) & 1 == 1 },
            FieldKind::UInt(w) | FieldKind::Bitset(w) => {
                quote! { (((payload >> #shift) & ::dbc_asm::__private::mask(#w)) as _) }
            }
            FieldKind::SInt(w) => {
                quote! {
                    ::dbc_asm::__private::sign_extend(
                        (payload >> #shift) & ::dbc_asm::__private::mask(#w),
                        #w,
                    ) as _
                }
            }
            FieldKind::Pad(_) => unreachable!(),
        };
        unpack_fields.push(quote! { #field_name: #unpack_expr, });
    }

    quote! {
        impl ::dbc_asm::StaticSignal for #name {
            const BIT_WIDTH: u32 = #total_width;

            fn pack(&self) -> u64 {
                let mut acc: u64 = 0;
                #(#pack_stmts)*
                acc
            }

            fn unpack(payload: u64, payload_bits: u32) -> Self {
                let payload = if payload_bits < 64 {
                    payload & ::dbc_asm::__private::mask(payload_bits)
                } else {
                    payload
                };
                #name {
                    #(#unpack_fields)*
                }
            }
        }
    }
}
