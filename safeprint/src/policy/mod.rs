//! Sensitivity rules: where sensitive leaves live and how to mask them.
//!
//! This module provides:
//!
//! - **Selectors** (`selector`): the path grammar (`$.a.b[0]`, `['key']`, `*`)
//!   and its evaluation against [`Value`](crate::Value) graphs and JSON documents.
//!
//! - **Sanitizers** (`sanitizer`): the [`Sanitizer`] trait and its strategies
//!   (fixed, structural, encoded text, partial).
//!
//! - **Directives** (`directive`): [`SensitiveDirective`], pairing selectors with
//!   a sanitizer kind, and [`TypeDirectives`] as declared by `#[derive(Record)]`.
//!
//! # Example
//!
//! ```rust
//! use safeprint::{MaskOptions, Sanitizer, SanitizerKind, Selector, Value};
//!
//! let selector = Selector::parse("$.card.pan").unwrap();
//! let masked = SanitizerKind::EncodedText.mask(
//!     &Value::str(r#"{"card":{"pan":"4111111111111111"}}"#),
//!     Some(&selector),
//!     &MaskOptions::default(),
//! );
//! assert_eq!(masked.as_str(), Some(r#"{"card":{"pan":"***"}}"#));
//! ```

mod directive;
mod partial;
mod sanitizer;
mod selector;

pub use directive::{SensitiveDirective, TypeDirectives};
pub use partial::{MASK_CHAR, PartialMask};
pub use sanitizer::{
    EncodedTextMask, FixedMask, MaskOptions, Sanitizer, SanitizerKind, StructuralMask,
};
pub use selector::{KeyMatch, Location, Segment, Selector, Step};
