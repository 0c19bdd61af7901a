//! The runtime value model the printer walks.
//!
//! - **`Value`**: closed set of shape categories (nil, scalar, opaque, sequence,
//!   keyed container, record)
//! - **`node`**: shared handles that give composites an identity
//! - **`convert`**: limit-aware `ToValue` for std types and the `Describe` hook
//!   used by the `Record` derive

mod convert;
mod node;

use std::{borrow::Cow, collections::BTreeMap, fmt, str::FromStr};

pub use convert::{Conversion, Describe, ToValue};
pub use node::Node;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// =============================================================================
// Value
// =============================================================================

/// A runtime value of arbitrary shape.
///
/// Scalars are held inline. Composites (`Seq`, `Map`, `Record`) are held
/// behind a [`Node`], so a graph may share substructure or contain cycles.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    Str(String),
    /// A value that cannot be introspected (closures, native handles).
    Opaque(Opaque),
    /// Arrays and ordered sequences. Nested sequences model multi-dimensional arrays.
    Seq(Node<Vec<Value>>),
    /// Keyed container. Keys are ordered so output is deterministic.
    Map(Node<BTreeMap<String, Value>>),
    Record(Node<Record>),
    /// A composite left out during conversion because it crossed a limit.
    Elided(Elided),
}

impl Value {
    /// Builds a sequence from its elements.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Seq(Node::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a keyed container from its entries.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Map(Node::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn record(record: Record) -> Self {
        Self::Record(Node::new(record))
    }

    pub fn str(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    /// The shape category of this value.
    pub fn shape(&self) -> ShapeTag {
        match self {
            Value::Nil => ShapeTag::Nil,
            Value::Bool(_)
            | Value::I64(_)
            | Value::U64(_)
            | Value::F64(_)
            | Value::Char(_)
            | Value::Str(_) => ShapeTag::Scalar,
            Value::Opaque(_) => ShapeTag::Opaque,
            Value::Seq(_) => ShapeTag::Seq,
            Value::Map(_) => ShapeTag::Map,
            Value::Record(_) => ShapeTag::Record,
            Value::Elided(elided) => elided.shape(),
        }
    }

    /// Instance identity for composites; `None` for everything else.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Seq(node) => Some(node.identity()),
            Value::Map(node) => Some(node.identity()),
            Value::Record(node) => Some(node.identity()),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same composite instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Copies out the direct children of a composite, or reports its size if it
    /// holds more than `max` children. Returns `None` for non-composites.
    ///
    /// The read lock is held only for the duration of the copy.
    pub(crate) fn entries(&self, max: usize) -> Option<node::Inspected<Bounded>> {
        let bounded = |len: usize, copy: &dyn Fn() -> Entries| {
            if len > max {
                Bounded::Oversized(len)
            } else {
                Bounded::Within(copy())
            }
        };
        match self {
            Value::Seq(node) => Some(node.inspect(|items| {
                bounded(items.len(), &|| Entries::Seq(items.clone()))
            })),
            Value::Map(node) => Some(node.inspect(|entries| {
                bounded(entries.len(), &|| {
                    Entries::Map(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                })
            })),
            Value::Record(node) => Some(node.inspect(|record| {
                bounded(record.len(), &|| Entries::Record(record.clone()))
            })),
            _ => None,
        }
    }
}

/// Direct children of a composite, copied out from under its lock.
pub(crate) enum Entries {
    Seq(Vec<Value>),
    Map(Vec<(String, Value)>),
    Record(Record),
}

pub(crate) enum Bounded {
    Within(Entries),
    Oversized(usize),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::record(value)
    }
}

impl From<Opaque> for Value {
    fn from(value: Opaque) -> Self {
        Value::Opaque(value)
    }
}

impl From<Node<Vec<Value>>> for Value {
    fn from(node: Node<Vec<Value>>) -> Self {
        Value::Seq(node)
    }
}

impl From<Node<BTreeMap<String, Value>>> for Value {
    fn from(node: Node<BTreeMap<String, Value>>) -> Self {
        Value::Map(node)
    }
}

impl From<Node<Record>> for Value {
    fn from(node: Node<Record>) -> Self {
        Value::Record(node)
    }
}

// =============================================================================
// Record
// =============================================================================

/// A user-defined record: a type name plus instance fields in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    type_name: Cow<'static, str>,
    fields: Vec<(Cow<'static, str>, Value)>,
}

impl Record {
    /// Creates an empty record. `type_name` is the registry key for type-level
    /// and field-level rules.
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Replaces the field called `name`, or appends it if absent. Returns the
    /// previous value.
    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The last `::`-separated segment of the type name.
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_ref(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> Vec<(Cow<'static, str>, Value)> {
        self.fields
    }
}

// =============================================================================
// Opaque
// =============================================================================

/// An unintrospectable value, rendered by fallback text only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opaque {
    type_name: &'static str,
    label: Option<String>,
}

impl Opaque {
    /// Captures the type of `value` (closures, function items, handles).
    pub fn of<T: ?Sized>(_value: &T) -> Self {
        Self::named(std::any::type_name::<T>())
    }

    pub fn named(type_name: &'static str) -> Self {
        Self {
            type_name,
            label: None,
        }
    }

    /// Uses `label` verbatim as the rendered text.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Best-effort text: the label if present, otherwise `<type name>`.
    pub fn fallback_text(&self) -> Cow<'_, str> {
        match &self.label {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(format!("<{}>", self.type_name)),
        }
    }
}

// =============================================================================
// Elided
// =============================================================================

/// Why a composite was left out of the value graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elision {
    /// More direct children than the container limit allows.
    Oversized { len: usize, limit: usize },
    /// Nested deeper than the depth limit allows.
    TooDeep { limit: usize },
}

/// Placeholder for a composite whose children were never converted.
///
/// Renders as the same diagnostic the printer emits for an oversized or too
/// deeply nested [`Node`], e.g. `<sequence of 129 exceeds limit 128>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elided {
    shape: ShapeTag,
    cause: Elision,
}

impl Elided {
    pub fn oversized(shape: ShapeTag, len: usize, limit: usize) -> Self {
        Self {
            shape,
            cause: Elision::Oversized { len, limit },
        }
    }

    pub fn too_deep(shape: ShapeTag, limit: usize) -> Self {
        Self {
            shape,
            cause: Elision::TooDeep { limit },
        }
    }

    pub fn shape(&self) -> ShapeTag {
        self.shape
    }

    pub fn cause(&self) -> Elision {
        self.cause
    }
}

impl fmt::Display for Elided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            Elision::Oversized { len, limit } => {
                write!(f, "<{} of {len} exceeds limit {limit}>", self.shape)
            }
            Elision::TooDeep { limit } => {
                write!(f, "<{} nested deeper than {limit}>", self.shape)
            }
        }
    }
}

impl From<Elided> for Value {
    fn from(value: Elided) -> Self {
        Value::Elided(value)
    }
}

// =============================================================================
// ShapeTag
// =============================================================================

/// Shape category of a value; structural fallback rules are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    Nil,
    Scalar,
    Opaque,
    #[serde(rename = "sequence")]
    Seq,
    Map,
    Record,
}

impl ShapeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeTag::Nil => "nil",
            ShapeTag::Scalar => "scalar",
            ShapeTag::Opaque => "opaque",
            ShapeTag::Seq => "sequence",
            ShapeTag::Map => "map",
            ShapeTag::Record => "record",
        }
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeTag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" | "seq" => Ok(ShapeTag::Seq),
            "map" => Ok(ShapeTag::Map),
            "record" => Ok(ShapeTag::Record),
            other => Err(ConfigError::UnknownShape(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_set_replaces_in_place() {
        let mut record = Record::new("app::User")
            .with_field("name", "ada")
            .with_field("age", 36);
        let previous = record.set("name", "grace");
        assert_eq!(previous, Some(Value::str("ada")));
        assert_eq!(record.len(), 2);
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["name", "age"]);
    }

    #[test]
    fn short_type_name_strips_module_path() {
        assert_eq!(Record::new("app::model::User").short_type_name(), "User");
        assert_eq!(Record::new("User").short_type_name(), "User");
    }

    #[test]
    fn opaque_fallback_prefers_label() {
        let closure = |x: i32| x + 1;
        let opaque = Opaque::of(&closure);
        assert!(opaque.fallback_text().starts_with('<'));
        assert!(opaque.type_name().contains("closure"));
        assert_eq!(opaque.with_label("handler").fallback_text(), "handler");
    }

    #[test]
    fn entries_reports_oversized_without_copying() {
        let value = Value::seq((0..10).map(Value::from));
        let inspected = value.entries(4).unwrap();
        assert!(!inspected.poisoned);
        assert!(matches!(inspected.value, Bounded::Oversized(10)));

        let inspected = value.entries(10).unwrap();
        match inspected.value {
            Bounded::Within(Entries::Seq(items)) => assert_eq!(items.len(), 10),
            _ => panic!("expected sequence entries"),
        }
    }

    #[test]
    fn identity_follows_instances() {
        let shared = Value::map([("k", Value::from(1))]);
        let alias = shared.clone();
        let twin = Value::map([("k", Value::from(1))]);
        assert!(shared.same_instance(&alias));
        assert!(!shared.same_instance(&twin));
        assert_eq!(Value::from(1).identity(), None);
    }

    #[test]
    fn shape_tag_parses_structural_names() {
        assert_eq!("map".parse::<ShapeTag>().unwrap(), ShapeTag::Map);
        assert_eq!("sequence".parse::<ShapeTag>().unwrap(), ShapeTag::Seq);
        assert!("scalar".parse::<ShapeTag>().is_err());
    }

    #[test]
    fn elided_renders_its_diagnostic() {
        let oversized = Value::from(Elided::oversized(ShapeTag::Seq, 129, 128));
        assert_eq!(oversized.shape(), ShapeTag::Seq);
        assert_eq!(oversized.identity(), None);
        let Value::Elided(oversized) = oversized else {
            panic!("expected elided value");
        };
        assert_eq!(oversized.to_string(), "<sequence of 129 exceeds limit 128>");
        assert_eq!(
            Elided::too_deep(ShapeTag::Record, 64).to_string(),
            "<record nested deeper than 64>"
        );
    }
}
