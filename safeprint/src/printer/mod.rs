//! The sanitizing printer.
//!
//! A [`Printer`] pairs an immutable [`RuleRegistry`] with a [`PrinterConfig`].
//! Each [`Printer::sanitize`] call builds its own invocation context, so one
//! printer can be shared by reference across any number of threads.

mod context;
mod render;

use std::sync::Arc;

use render::Renderer;

use crate::{
    config::PrinterConfig,
    registry::RuleRegistry,
    value::{Conversion, ToValue, Value},
};

/// Renders arbitrary values to bounded, masked text.
///
/// ```rust
/// use safeprint::{Printer, Record, RuleRegistry, Value};
///
/// #[derive(Record)]
/// struct Login {
///     user: String,
///     #[sensitive]
///     password: String,
/// }
///
/// let printer = Printer::new(RuleRegistry::builder().register::<Login>().build());
/// let login = Login { user: "ada".into(), password: "hunter2".into() };
///
/// assert_eq!(printer.sanitize(&login), "{user: ada, password: ***}");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Printer {
    registry: Arc<RuleRegistry>,
    config: PrinterConfig,
}

impl Printer {
    pub fn new(registry: impl Into<Arc<RuleRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            config: PrinterConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PrinterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Converts `value` and renders it. Never fails.
    ///
    /// Conversion honours the same container and depth limits as rendering, so
    /// the elements of an oversized collection are never visited.
    pub fn sanitize<T: ToValue + ?Sized>(&self, value: &T) -> String {
        let mut cx = Conversion::new(self.config.max_container_len, self.config.max_depth);
        self.sanitize_value(&value.convert(&mut cx))
    }

    /// Renders an already-built value graph. Never fails.
    pub fn sanitize_value(&self, value: &Value) -> String {
        Renderer::new(&self.registry, &self.config).finish(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{policy::SensitiveDirective, value::Record};

    #[test]
    fn default_printer_masks_nothing() {
        let printer = Printer::default();
        let mut map = BTreeMap::new();
        map.insert("token", "abc");
        assert_eq!(printer.sanitize(&map), "{token: abc}");
        assert_eq!(printer.sanitize(&Option::<u8>::None), "null");
    }

    #[test]
    fn output_is_deterministic() {
        let registry = RuleRegistry::builder()
            .field_rule("app::R", "ak", SensitiveDirective::masked())
            .build();
        let printer = Printer::new(registry);
        let value = Value::map([
            ("r", Value::record(Record::new("app::R").with_field("ak", "secret"))),
            ("list", Value::seq([Value::from(1), Value::from(2)])),
        ]);
        let first = printer.sanitize_value(&value);
        assert_eq!(first, printer.sanitize_value(&value));
        assert_eq!(first, "{list: [1, 2], r: {ak: ***}}");
    }

    #[test]
    fn ordinals_restart_for_every_call() {
        let shared = Value::seq([Value::from(1)]);
        let value = Value::seq([shared.clone(), shared]);
        let printer = Printer::default();
        assert_eq!(printer.sanitize_value(&value), "[[1], @ref[2]]");
        assert_eq!(printer.sanitize_value(&value), "[[1], @ref[2]]");
    }

    #[test]
    fn printer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Printer>();
    }
}
