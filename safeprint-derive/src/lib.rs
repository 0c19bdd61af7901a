//! Derive macro for `safeprint`.
//!
//! This crate generates the code behind `#[derive(Record)]`. It:
//! - reads `#[sensitive(...)]` and `#[not_printed]` attributes
//! - emits `ToValue` (field enumeration in declaration order, converted inside
//!   the caller's limits) and `Describe` (registry key and declared directives)
//!
//! It does **not** evaluate selectors or mask anything. That happens in the
//! main `safeprint` crate at render time.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, LitStr, Result, ext::IdentExt, parse_macro_input, spanned::Spanned};

mod attrs;
mod derive_struct;
mod generics;

use attrs::parse_container_directive;
use derive_struct::{StructOutput, derive_struct};
use generics::add_to_value_bounds;

/// Derives `safeprint::ToValue` and `safeprint::Describe` for a struct.
///
/// The rendered record lists the struct's fields in declaration order. Tuple
/// fields are named `0`, `1`, ... The registry key is the module-qualified
/// type name (`module_path!()` + `::` + the struct name).
///
/// # Container Attributes
///
/// - `#[sensitive(...)]`: type-level directive, applied wherever a value of
///   this type is rendered.
///
/// # Field Attributes
///
/// - **No annotation**: the field is rendered through its own `ToValue`.
/// - `#[sensitive]`: the whole field value is replaced with the mask token.
/// - `#[sensitive("$.path", ..., Kind)]`: string literals are selectors relative
///   to the field value; `Kind` is one of `Fixed` (default), `Structural`,
///   `EncodedText` or `Partial(keep_first, keep_last)`.
/// - `#[not_printed]`: the field is omitted from the rendered record.
///
/// Enums and unions are rejected at compile time.
///
/// Directives only take effect once the type is registered:
/// `RuleRegistry::builder().register::<T>()`.
#[proc_macro_derive(Record, attributes(sensitive, not_printed))]
pub fn derive_record(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    let data = match data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span(),
                "`Record` cannot be derived for enums; implement `ToValue` by hand",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`Record` cannot be derived for unions",
            ));
        }
    };

    let crate_root = crate_root();
    let type_directive = parse_container_directive(&attrs)?.map(|directive| {
        let directive = directive.to_tokens(&crate_root);
        quote! { .with_type(#directive) }
    });
    let StructOutput {
        fields,
        directives,
        used_generics,
    } = derive_struct(&data, &generics, &crate_root)?;

    let type_name = LitStr::new(&ident.unraw().to_string(), ident.span());

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let describe_impl = quote! {
        impl #impl_generics #crate_root::Describe for #ident #ty_generics #where_clause {
            const TYPE_NAME: &'static str =
                ::core::concat!(::core::module_path!(), "::", #type_name);

            fn directives() -> #crate_root::TypeDirectives {
                #crate_root::TypeDirectives::new()
                    #type_directive
                    #(#directives)*
            }
        }
    };

    let bounded = add_to_value_bounds(generics.clone(), &used_generics, &crate_root);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    let len = fields.len();
    // A record without printed fields never reads the conversion.
    let cx = if fields.is_empty() {
        quote! { _ }
    } else {
        quote! { cx }
    };
    let to_value_impl = quote! {
        impl #impl_generics #crate_root::ToValue for #ident #ty_generics #where_clause {
            fn convert(&self, cx: &mut #crate_root::Conversion) -> #crate_root::Value {
                cx.composite(#crate_root::ShapeTag::Record, #len, |#cx| {
                    #crate_root::Value::record(
                        #crate_root::Record::new(<Self as #crate_root::Describe>::TYPE_NAME)
                            #(#fields)*
                    )
                })
            }
        }
    };

    Ok(quote! {
        #describe_impl
        #to_value_impl
    })
}

/// Path to the `safeprint` crate as seen from the deriving crate.
///
/// Handles renames (`printer = { package = "safeprint", ... }`) and derives
/// inside `safeprint` itself.
fn crate_root() -> TokenStream {
    match crate_name("safeprint") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::safeprint },
    }
}
