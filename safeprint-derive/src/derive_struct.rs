//! Struct-specific `Record` derivation.
//!
//! This module generates the field list of the rendered record, the
//! field-level directives, and collects generic parameters that require
//! `ToValue` bounds.

use proc_macro2::{Ident, TokenStream};
use quote::quote_spanned;
use syn::{DataStruct, Fields, Index, LitStr, Member, Result, ext::IdentExt, spanned::Spanned};

use crate::{
    attrs::{FieldStrategy, parse_field_strategy},
    generics::collect_generics_from_type,
};

pub(crate) struct StructOutput {
    /// `.with_field(name, value)` calls building the record inside the
    /// caller's conversion, bound as `cx`.
    pub(crate) fields: Vec<TokenStream>,
    /// `.with_field(name, directive)` calls building the type's directives.
    pub(crate) directives: Vec<TokenStream>,
    pub(crate) used_generics: Vec<Ident>,
}

pub(crate) fn derive_struct(
    data: &DataStruct,
    generics: &syn::Generics,
    crate_root: &TokenStream,
) -> Result<StructOutput> {
    let mut output = StructOutput {
        fields: Vec::new(),
        directives: Vec::new(),
        used_generics: Vec::new(),
    };

    let members: Vec<(Member, LitStr)> = match &data.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .filter_map(|field| field.ident.as_ref())
            .map(|ident| {
                let name = LitStr::new(&ident.unraw().to_string(), ident.span());
                (Member::Named(ident.clone()), name)
            })
            .collect(),
        Fields::Unnamed(fields) => fields
            .unnamed
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let member = Member::Unnamed(Index {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    span: field.span(),
                });
                (member, LitStr::new(&index.to_string(), field.span()))
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    for (field, (member, name)) in data.fields.iter().zip(members) {
        let span = field.span();
        let directive = match parse_field_strategy(&field.attrs)? {
            FieldStrategy::NotPrinted => continue,
            FieldStrategy::Printed(directive) => directive,
        };

        collect_generics_from_type(&field.ty, generics, &mut output.used_generics);
        output.fields.push(quote_spanned! { span =>
            .with_field(#name, #crate_root::ToValue::convert(&self.#member, cx))
        });

        if let Some(directive) = directive {
            let directive = directive.to_tokens(crate_root);
            output.directives.push(quote_spanned! { span =>
                .with_field(#name, #directive)
            });
        }
    }

    Ok(output)
}
