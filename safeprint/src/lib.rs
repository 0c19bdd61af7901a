//! Cycle-safe, size-bounded text rendering for logs and audit trails.
//!
//! This crate separates:
//! - **Rules**: which leaf values are sensitive (selectors) and how to mask them
//!   (sanitizers), collected once into an immutable [`RuleRegistry`].
//! - **Printing**: the [`Printer`] walks an arbitrary, possibly cyclic [`Value`]
//!   graph and produces bounded text, masking at field and entry boundaries.
//!
//! What this crate does:
//! - renders shared and self-referential graphs, collapsing repeats to `@ref[n]`
//! - bounds the work spent on oversized containers
//! - provides integrations behind feature flags (`slog`, `tracing`)
//!
//! What it does not do:
//! - deserialize its own output
//! - defend against graphs engineered to defeat it
//!
//! The `Record` derive macro lives in `safeprint-derive` and is re-exported
//! from this crate.

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
    clippy::enum_glob_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[cfg(feature = "derive")]
pub use safeprint_derive::Record;

#[allow(unused_extern_crates)]
extern crate self as safeprint;

/// Emits an internal diagnostic event on the `safeprint` target.
#[cfg(feature = "tracing")]
macro_rules! diagnostic {
    (warn, $($arg:tt)+) => {
        ::tracing::warn!(target: "safeprint", $($arg)+)
    };
    (debug, $($arg:tt)+) => {
        ::tracing::debug!(target: "safeprint", $($arg)+)
    };
}

/// Without `tracing`, only evaluates the field values so call sites read the
/// same under both configurations.
#[cfg(not(feature = "tracing"))]
macro_rules! diagnostic {
    (@fields $(,)?) => {};
    (@fields $message:literal) => {};
    (@fields $field:ident = % $value:expr, $($rest:tt)*) => {
        let _ = &$value;
        $crate::diagnostic!(@fields $($rest)*);
    };
    (@fields $field:ident = ? $value:expr, $($rest:tt)*) => {
        let _ = &$value;
        $crate::diagnostic!(@fields $($rest)*);
    };
    (@fields $field:ident = $value:expr, $($rest:tt)*) => {
        let _ = &$value;
        $crate::diagnostic!(@fields $($rest)*);
    };
    (@fields $field:ident, $($rest:tt)*) => {
        let _ = &$field;
        $crate::diagnostic!(@fields $($rest)*);
    };
    ($level:ident, $($arg:tt)+) => {{
        $crate::diagnostic!(@fields $($arg)+);
    }};
}

pub(crate) use diagnostic;

// Module declarations
pub mod audit;
mod config;
mod error;
pub mod policy;
mod printer;
mod registry;
#[cfg(feature = "slog")]
pub mod slog;
#[cfg(feature = "tracing")]
pub mod tracing;
mod value;

pub use audit::{AuditRecorder, AuditSink};
pub use config::{DEFAULT_MASK_TOKEN, DEFAULT_MAX_CONTAINER_LEN, DEFAULT_MAX_DEPTH, PrinterConfig};
pub use error::{ConfigError, SelectorError};
pub use policy::{
    EncodedTextMask, FixedMask, KeyMatch, Location, MASK_CHAR, MaskOptions, PartialMask,
    SanitizerKind, Sanitizer, Segment, Selector, SensitiveDirective, Step, StructuralMask,
    TypeDirectives,
};
pub use printer::Printer;
pub use registry::{
    DirectiveConfig, RegistryConfig, RuleRegistry, RuleRegistryBuilder, TypeConfig, TypeKey,
};
pub use value::{
    Conversion, Describe, Elided, Elision, Node, Opaque, Record, ShapeTag, ToValue, Value,
};
