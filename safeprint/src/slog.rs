//! Adapters for emitting sanitized values through `slog`.
//!
//! [`SanitizedValue`] carries text that has already been through a
//! [`Printer`], so the original value is never handed to a serializer.
//! [`SlogSink`] forwards audit lines to a logger.
//!
//! ```rust
//! use safeprint::Printer;
//! use slog::{Discard, Logger, info, o};
//!
//! let logger = Logger::root(Discard, o!());
//! let printer = Printer::default();
//! info!(logger, "request"; "payload" => printer.slog_value(&vec![1, 2, 3]));
//! ```

use slog::{Key, Logger, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{audit::AuditSink, printer::Printer, value::ToValue};

/// Rendered, masked text logged as a string field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedValue(String);

impl SanitizedValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl SlogValue for SanitizedValue {
    fn serialize(
        &self,
        _record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        serializer.emit_str(key, &self.0)
    }
}

impl Printer {
    /// Sanitizes `value` into an `slog` field value.
    pub fn slog_value<T: ToValue + ?Sized>(&self, value: &T) -> SanitizedValue {
        SanitizedValue(self.sanitize(value))
    }
}

/// An [`AuditSink`] writing each line as an `info` record.
#[derive(Clone, Debug)]
pub struct SlogSink {
    logger: Logger,
}

impl SlogSink {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl AuditSink for SlogSink {
    fn accept(&self, line: &str) {
        slog::info!(self.logger, "audit"; "line" => line);
    }
}
