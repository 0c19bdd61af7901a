//! The immutable rule registry.
//!
//! Rules are collected once, from `#[derive(Record)]` declarations, explicit
//! registration, or declarative JSON, and are read-only afterwards. Lookups
//! take `&self` and need no locking.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    policy::{SanitizerKind, Selector, SensitiveDirective},
    value::{Describe, ShapeTag},
};

/// What a type-level lookup is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey<'a> {
    /// A record, by its registered type name. Falls back to the `record` shape.
    Record(&'a str),
    /// A structural shape with no declared type (maps, sequences).
    Shape(ShapeTag),
}

#[derive(Clone, Debug, Default)]
struct TypeRules {
    directive: Option<SensitiveDirective>,
    fields: HashMap<String, SensitiveDirective>,
}

/// Resolves sensitivity directives for types, fields and shapes.
#[derive(Clone, Debug, Default)]
pub struct RuleRegistry {
    types: HashMap<String, TypeRules>,
    shapes: HashMap<ShapeTag, SensitiveDirective>,
}

impl RuleRegistry {
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    /// A registry with no rules; every value renders unmodified.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates and builds a registry from declarative configuration.
    pub fn from_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for (type_name, rules) in config.types {
            if let Some(directive) = rules.directive {
                let directive = directive.into_directive(&format!("type `{type_name}`"))?;
                builder = builder.type_rule(type_name.clone(), directive);
            }
            for (field, directive) in rules.fields {
                let directive =
                    directive.into_directive(&format!("field `{type_name}.{field}`"))?;
                builder = builder.field_rule(type_name.clone(), field, directive);
            }
        }
        for (shape, directive) in config.shapes {
            let tag = ShapeTag::from_str(&shape)?;
            let directive = directive.into_directive(&format!("shape `{shape}`"))?;
            builder = builder.shape_rule(tag, directive);
        }
        Ok(builder.build())
    }

    /// Parses a JSON [`RegistryConfig`] and builds a registry from it.
    ///
    /// ```rust
    /// use safeprint::{RuleRegistry, ShapeTag, TypeKey};
    ///
    /// let registry = RuleRegistry::from_json_str(
    ///     r#"{"shapes": {"map": {"selectors": ["password"], "kind": "structural"}}}"#,
    /// )
    /// .unwrap();
    /// assert!(registry.resolve_for_type(TypeKey::Shape(ShapeTag::Map)).is_some());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Type-level lookup: exact record type first, then shape, then nothing.
    pub fn resolve_for_type(&self, key: TypeKey<'_>) -> Option<&SensitiveDirective> {
        match key {
            TypeKey::Record(type_name) => self
                .types
                .get(type_name)
                .and_then(|rules| rules.directive.as_ref())
                .or_else(|| self.shapes.get(&ShapeTag::Record)),
            TypeKey::Shape(tag) => self.shapes.get(&tag),
        }
    }

    /// Field-level lookup on the declaring record type. Exact match only.
    pub fn resolve_for_field(&self, type_name: &str, field: &str) -> Option<&SensitiveDirective> {
        self.types.get(type_name)?.fields.get(field)
    }

    /// Returns `true` if no rule of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
            && self
                .types
                .values()
                .all(|rules| rules.directive.is_none() && rules.fields.is_empty())
    }
}

/// Collects rules for a [`RuleRegistry`]. Later registrations for the same
/// type, field or shape replace earlier ones.
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    registry: RuleRegistry,
}

impl RuleRegistryBuilder {
    /// Registers the directives `T` declares through `#[derive(Record)]`.
    #[must_use]
    pub fn register<T: Describe + ?Sized>(mut self) -> Self {
        let (directive, fields) = T::directives().into_parts();
        let rules = self.rules_mut(T::TYPE_NAME);
        if directive.is_some() {
            rules.directive = directive;
        }
        rules
            .fields
            .extend(fields.into_iter().map(|(name, directive)| (name.into_owned(), directive)));
        self
    }

    #[must_use]
    pub fn type_rule(mut self, type_name: impl Into<String>, directive: SensitiveDirective) -> Self {
        self.rules_mut(type_name).directive = Some(directive);
        self
    }

    #[must_use]
    pub fn field_rule(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        directive: SensitiveDirective,
    ) -> Self {
        self.rules_mut(type_name)
            .fields
            .insert(field.into(), directive);
        self
    }

    /// Registers a structural fallback, e.g. one covering every map.
    #[must_use]
    pub fn shape_rule(mut self, shape: ShapeTag, directive: SensitiveDirective) -> Self {
        self.registry.shapes.insert(shape, directive);
        self
    }

    pub fn build(self) -> RuleRegistry {
        self.registry
    }

    fn rules_mut(&mut self, type_name: impl Into<String>) -> &mut TypeRules {
        self.registry.types.entry(type_name.into()).or_default()
    }
}

// =============================================================================
// Declarative configuration
// =============================================================================

/// Declarative rule input, typically loaded from JSON.
///
/// ```json
/// {
///   "types": {
///     "app::Credentials": {
///       "fields": { "secret": {}, "card": { "selectors": ["$.pan"], "kind": "structural" } }
///     }
///   },
///   "shapes": { "map": { "selectors": ["password"], "kind": "structural" } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub types: BTreeMap<String, TypeConfig>,
    /// Keyed by shape name: `map`, `sequence` or `record`.
    pub shapes: BTreeMap<String, DirectiveConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeConfig {
    pub directive: Option<DirectiveConfig>,
    pub fields: BTreeMap<String, DirectiveConfig>,
}

/// One `(selectors, kind)` tuple. No selectors masks the whole value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectiveConfig {
    pub selectors: Vec<String>,
    pub kind: SanitizerKind,
}

impl DirectiveConfig {
    fn into_directive(self, owner: &str) -> Result<SensitiveDirective, ConfigError> {
        self.selectors
            .iter()
            .try_fold(SensitiveDirective::new(self.kind), |directive, selector| {
                Selector::parse(selector).map_err(|source| ConfigError::InvalidSelector {
                    owner: owner.to_owned(),
                    source,
                })?;
                Ok(directive.with_selector(selector))
            })
    }
}
