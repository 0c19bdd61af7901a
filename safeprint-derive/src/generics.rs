//! Generic type parameters and `ToValue` bounds.
//!
//! Only parameters that appear in printed fields get a bound. Fields marked
//! `#[not_printed]` are never converted, and `PhantomData<T>` renders as `null`
//! whatever `T` is, so `struct Tagged<T> { id: u64, _marker: PhantomData<T> }`
//! derives for any `T`.

use proc_macro2::TokenStream;
use syn::{
    GenericArgument, Ident, PathArguments, ReturnType, Type, TypeParamBound, parse_quote,
};

struct Collector<'a> {
    generics: &'a syn::Generics,
    found: &'a mut Vec<Ident>,
}

impl Collector<'_> {
    fn ident(&mut self, ident: &Ident) {
        let declared = self.generics.type_params().any(|param| param.ident == *ident);
        if declared && !self.found.contains(ident) {
            self.found.push(ident.clone());
        }
    }

    fn bound(&mut self, bound: &TypeParamBound) {
        if let TypeParamBound::Trait(bound) = bound {
            self.path(&bound.path);
        }
    }

    fn path(&mut self, path: &syn::Path) {
        if path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "PhantomData")
        {
            return;
        }
        for segment in &path.segments {
            self.ident(&segment.ident);
            match &segment.arguments {
                PathArguments::AngleBracketed(args) => {
                    for arg in &args.args {
                        match arg {
                            GenericArgument::Type(ty) => self.ty(ty),
                            GenericArgument::AssocType(assoc) => self.ty(&assoc.ty),
                            GenericArgument::Constraint(constraint) => {
                                constraint.bounds.iter().for_each(|b| self.bound(b));
                            }
                            _ => {}
                        }
                    }
                }
                PathArguments::Parenthesized(args) => {
                    args.inputs.iter().for_each(|input| self.ty(input));
                    if let ReturnType::Type(_, output) = &args.output {
                        self.ty(output);
                    }
                }
                PathArguments::None => {}
            }
        }
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Path(type_path) => {
                if let Some(qself) = &type_path.qself {
                    self.ty(&qself.ty);
                }
                self.path(&type_path.path);
            }
            Type::Reference(reference) => self.ty(&reference.elem),
            Type::Ptr(pointer) => self.ty(&pointer.elem),
            Type::Slice(slice) => self.ty(&slice.elem),
            Type::Array(array) => self.ty(&array.elem),
            Type::Paren(paren) => self.ty(&paren.elem),
            Type::Group(group) => self.ty(&group.elem),
            Type::Tuple(tuple) => tuple.elems.iter().for_each(|elem| self.ty(elem)),
            Type::TraitObject(object) => object.bounds.iter().for_each(|b| self.bound(b)),
            Type::ImplTrait(impl_trait) => impl_trait.bounds.iter().for_each(|b| self.bound(b)),
            _ => {}
        }
    }
}

/// Records every declared type parameter that `ty` mentions.
pub(crate) fn collect_generics_from_type(
    ty: &Type,
    generics: &syn::Generics,
    found: &mut Vec<Ident>,
) {
    Collector { generics, found }.ty(ty);
}

/// Adds `ToValue` bounds to the parameters used by printed fields.
pub(crate) fn add_to_value_bounds(
    mut generics: syn::Generics,
    used_generics: &[Ident],
    crate_root: &TokenStream,
) -> syn::Generics {
    for param in generics.type_params_mut() {
        if used_generics.contains(&param.ident) {
            param.bounds.push(parse_quote!(#crate_root::ToValue));
        }
    }
    generics
}
