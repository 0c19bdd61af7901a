//! Adapters for emitting sanitized values through `tracing`.
//!
//! # Example
//!
//! ```rust
//! use safeprint::Printer;
//!
//! let printer = Printer::default();
//! tracing::info!(payload = %printer.tracing_display(&vec!["a", "b"]));
//! ```

use tracing::field::{DisplayValue, display};

use crate::{audit::AuditSink, printer::Printer, value::ToValue};

impl Printer {
    /// Sanitizes `value` into a display field. The result is a flat string.
    pub fn tracing_display<T: ToValue + ?Sized>(&self, value: &T) -> DisplayValue<String> {
        display(self.sanitize(value))
    }
}

/// An [`AuditSink`] emitting each line as an `info` event on target `audit`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn accept(&self, line: &str) {
        tracing::info!(target: "audit", "{line}");
    }
}
