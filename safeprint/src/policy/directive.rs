//! Sensitivity directives attached to types and fields.

use std::borrow::Cow;

use super::{sanitizer::SanitizerKind, selector::Selector};
use crate::error::SelectorError;

/// Which leaves of a value are sensitive and how to mask them.
///
/// An empty selector list (or a root `$` selector) masks the whole value the
/// directive is attached to; otherwise only the addressed leaves are masked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SensitiveDirective {
    selectors: Vec<Selector>,
    kind: SanitizerKind,
}

impl SensitiveDirective {
    /// A directive masking the whole value with `kind`.
    pub fn new(kind: SanitizerKind) -> Self {
        Self {
            selectors: Vec::new(),
            kind,
        }
    }

    /// A directive masking the whole value with the fixed mask token.
    pub fn masked() -> Self {
        Self::new(SanitizerKind::Fixed)
    }

    /// Adds a selector, degrading malformed text to a selector that matches
    /// nothing.
    #[must_use]
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selectors.push(Selector::parse_lenient(selector));
        self
    }

    /// Adds a selector, rejecting malformed text.
    pub fn try_with_selector(mut self, selector: &str) -> Result<Self, SelectorError> {
        self.selectors.push(Selector::parse(selector)?);
        Ok(self)
    }

    /// Adds several selectors leniently.
    #[must_use]
    pub fn with_selectors<I, S>(self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        selectors
            .into_iter()
            .fold(self, |directive, selector| directive.with_selector(selector.as_ref()))
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn kind(&self) -> SanitizerKind {
        self.kind
    }

    /// Returns `true` if the whole value is replaced rather than selected leaves.
    pub fn masks_whole_value(&self) -> bool {
        self.selectors.is_empty() || self.selectors.iter().any(Selector::is_root)
    }
}

/// Directives a record type declares for itself and its fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDirectives {
    directive: Option<SensitiveDirective>,
    fields: Vec<(Cow<'static, str>, SensitiveDirective)>,
}

impl TypeDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type-level directive.
    #[must_use]
    pub fn with_type(mut self, directive: SensitiveDirective) -> Self {
        self.directive = Some(directive);
        self
    }

    /// Adds a field-level directive.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<Cow<'static, str>>, directive: SensitiveDirective) -> Self {
        self.fields.push((field.into(), directive));
        self
    }

    pub fn type_directive(&self) -> Option<&SensitiveDirective> {
        self.directive.as_ref()
    }

    pub fn field_directives(&self) -> impl Iterator<Item = (&str, &SensitiveDirective)> {
        self.fields.iter().map(|(name, directive)| (name.as_ref(), directive))
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<SensitiveDirective>,
        Vec<(Cow<'static, str>, SensitiveDirective)>,
    ) {
        (self.directive, self.fields)
    }
}
