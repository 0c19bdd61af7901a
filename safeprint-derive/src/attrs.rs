//! Parsing of `#[sensitive(...)]` and `#[not_printed]` attributes.
//!
//! This module maps attribute syntax to directive tokens and produces
//! structured errors for invalid forms.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Attribute, Expr, ExprCall, ExprLit, Lit, LitStr, Meta, Result, Token, punctuated::Punctuated,
    spanned::Spanned,
};

/// Sanitizer kind named in `#[sensitive(...)]`.
///
/// | Argument            | Kind                        |
/// |---------------------|-----------------------------|
/// | (none)              | `SanitizerKind::Fixed`      |
/// | `Fixed`             | `SanitizerKind::Fixed`      |
/// | `Structural`        | `SanitizerKind::Structural` |
/// | `EncodedText`       | `SanitizerKind::EncodedText`|
/// | `Partial(a, b)`     | `SanitizerKind::Partial`    |
#[derive(Clone, Debug)]
pub(crate) enum Kind {
    Fixed,
    Structural,
    EncodedText,
    Partial { keep_first: Expr, keep_last: Expr },
}

/// A parsed `#[sensitive(...)]` attribute.
#[derive(Clone, Debug)]
pub(crate) struct Directive {
    pub(crate) selectors: Vec<LitStr>,
    pub(crate) kind: Kind,
}

impl Directive {
    /// Builds the `SensitiveDirective` expression.
    pub(crate) fn to_tokens(&self, crate_root: &TokenStream) -> TokenStream {
        let kind = match &self.kind {
            Kind::Fixed => quote! { #crate_root::SanitizerKind::Fixed },
            Kind::Structural => quote! { #crate_root::SanitizerKind::Structural },
            Kind::EncodedText => quote! { #crate_root::SanitizerKind::EncodedText },
            Kind::Partial {
                keep_first,
                keep_last,
            } => quote! {
                #crate_root::SanitizerKind::Partial {
                    keep_first: #keep_first,
                    keep_last: #keep_last,
                }
            },
        };
        let selectors = &self.selectors;
        quote! {
            #crate_root::SensitiveDirective::new(#kind)
                #(.with_selector(#selectors))*
        }
    }
}

/// What the derive does with one field.
#[derive(Clone, Debug)]
pub(crate) enum FieldStrategy {
    /// Rendered, optionally under a field-level directive.
    Printed(Option<Directive>),
    /// `#[not_printed]`: omitted from the record entirely.
    NotPrinted,
}

const EXPECTED_ARGUMENT: &str = "expected a selector string, `Fixed`, `Structural`, \
                                 `EncodedText` or `Partial(keep_first, keep_last)`";

fn set_once<T>(target: &mut Option<T>, next: T, span: Span, message: &str) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(span, message));
    }
    *target = Some(next);
    Ok(())
}

fn parse_kind_call(call: &ExprCall) -> Result<Kind> {
    let Expr::Path(func) = call.func.as_ref() else {
        return Err(syn::Error::new(call.span(), EXPECTED_ARGUMENT));
    };
    if !func.path.is_ident("Partial") {
        return Err(syn::Error::new(call.span(), EXPECTED_ARGUMENT));
    }
    let mut args = call.args.iter().cloned();
    match (args.next(), args.next(), args.next()) {
        (Some(keep_first), Some(keep_last), None) => Ok(Kind::Partial {
            keep_first,
            keep_last,
        }),
        _ => Err(syn::Error::new(
            call.span(),
            "`Partial` takes exactly two arguments: `Partial(keep_first, keep_last)`",
        )),
    }
}

fn parse_directive(attr: &Attribute) -> Result<Directive> {
    let args = match &attr.meta {
        Meta::Path(_) => Punctuated::new(),
        Meta::List(_) => attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?,
        Meta::NameValue(_) => {
            return Err(syn::Error::new(
                attr.span(),
                "expected #[sensitive] or #[sensitive(...)] syntax \
                 (e.g., #[sensitive(\"$.token\", Structural)])",
            ));
        }
    };

    let mut selectors = Vec::new();
    let mut kind = None;
    for arg in args {
        let span = arg.span();
        match arg {
            Expr::Lit(ExprLit {
                lit: Lit::Str(selector),
                ..
            }) => {
                if selector.value().trim().is_empty() {
                    return Err(syn::Error::new(span, "selector must not be empty"));
                }
                selectors.push(selector);
            }
            Expr::Path(path) => {
                let next = if path.path.is_ident("Fixed") {
                    Kind::Fixed
                } else if path.path.is_ident("Structural") {
                    Kind::Structural
                } else if path.path.is_ident("EncodedText") {
                    Kind::EncodedText
                } else {
                    return Err(syn::Error::new(span, EXPECTED_ARGUMENT));
                };
                set_once(&mut kind, next, span, "multiple sanitizer kinds in one #[sensitive]")?;
            }
            Expr::Call(call) => {
                let next = parse_kind_call(&call)?;
                set_once(&mut kind, next, span, "multiple sanitizer kinds in one #[sensitive]")?;
            }
            _ => return Err(syn::Error::new(span, EXPECTED_ARGUMENT)),
        }
    }

    Ok(Directive {
        selectors,
        kind: kind.unwrap_or(Kind::Fixed),
    })
}

/// Parses the type-level `#[sensitive(...)]`, if any.
pub(crate) fn parse_container_directive(attrs: &[Attribute]) -> Result<Option<Directive>> {
    let mut directive = None;
    for attr in attrs {
        if attr.path().is_ident("not_printed") {
            return Err(syn::Error::new(
                attr.span(),
                "#[not_printed] applies to fields, not to the type",
            ));
        }
        if attr.path().is_ident("sensitive") {
            set_once(
                &mut directive,
                parse_directive(attr)?,
                attr.span(),
                "multiple #[sensitive] attributes on the same type",
            )?;
        }
    }
    Ok(directive)
}

/// Parses field-level attributes.
pub(crate) fn parse_field_strategy(attrs: &[Attribute]) -> Result<FieldStrategy> {
    let mut strategy: Option<FieldStrategy> = None;
    let conflict = "multiple #[sensitive] or #[not_printed] attributes on the same field";
    for attr in attrs {
        if attr.path().is_ident("not_printed") {
            if !matches!(attr.meta, Meta::Path(_)) {
                return Err(syn::Error::new(
                    attr.span(),
                    "#[not_printed] does not take arguments",
                ));
            }
            set_once(&mut strategy, FieldStrategy::NotPrinted, attr.span(), conflict)?;
            continue;
        }

        if !attr.path().is_ident("sensitive") {
            continue;
        }

        let directive = parse_directive(attr)?;
        set_once(
            &mut strategy,
            FieldStrategy::Printed(Some(directive)),
            attr.span(),
            conflict,
        )?;
    }

    Ok(strategy.unwrap_or(FieldStrategy::Printed(None)))
}
