//! Conversions from Rust types into [`Value`].
//!
//! Conversion runs inside a [`Conversion`] that carries the container and depth
//! limits of the printer. A collection over either limit becomes an [`Elided`]
//! placeholder and its elements are never visited, so converting a huge or
//! deeply nested value costs no more than rendering it.
//!
//! Identity survives conversion in two ways: [`Node`] handles are passed
//! through as-is, and every `Arc`/`Rc` pointer seen twice in one conversion
//! maps to the same converted node.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap, VecDeque},
    fmt::Display,
    marker::PhantomData,
    rc::Rc,
    sync::Arc,
};

use serde_json::Value as JsonValue;

use super::{Elided, Node, Opaque, Record, ShapeTag, Value};
use crate::{
    config::{DEFAULT_MAX_CONTAINER_LEN, DEFAULT_MAX_DEPTH},
    policy::TypeDirectives,
};

// =============================================================================
// Conversion
// =============================================================================

/// State of one conversion: limits, current depth and shared pointers seen.
///
/// `Printer::sanitize` builds one from its configuration for every call.
/// Hand-written [`ToValue`] impls route composites through
/// [`Conversion::composite`] and shared pointers through
/// [`Conversion::shared`]:
///
/// ```rust
/// use safeprint::{Conversion, ShapeTag, ToValue, Value};
///
/// struct Pair(u8, u8);
///
/// impl ToValue for Pair {
///     fn convert(&self, cx: &mut Conversion) -> Value {
///         cx.composite(ShapeTag::Seq, 2, |cx| {
///             Value::seq([self.0.convert(cx), self.1.convert(cx)])
///         })
///     }
/// }
///
/// let mut cx = Conversion::new(1, 8);
/// assert!(matches!(Pair(1, 2).convert(&mut cx), Value::Elided(_)));
/// ```
#[derive(Debug)]
pub struct Conversion {
    max_container_len: usize,
    max_depth: usize,
    depth: usize,
    shared: HashMap<usize, Value>,
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTAINER_LEN, DEFAULT_MAX_DEPTH)
    }
}

impl Conversion {
    pub fn new(max_container_len: usize, max_depth: usize) -> Self {
        Self {
            max_container_len,
            max_depth,
            depth: 0,
            shared: HashMap::new(),
        }
    }

    /// Number of composites currently being converted above this point.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Converts a composite of `shape` with `len` direct children.
    ///
    /// `build` runs one level deeper, and only when the composite is within
    /// both limits; otherwise the result is an [`Elided`] placeholder.
    pub fn composite(
        &mut self,
        shape: ShapeTag,
        len: usize,
        build: impl FnOnce(&mut Self) -> Value,
    ) -> Value {
        if self.depth >= self.max_depth {
            return Elided::too_deep(shape, self.max_depth).into();
        }
        if len > self.max_container_len {
            return Elided::oversized(shape, len, self.max_container_len).into();
        }
        self.depth += 1;
        let value = build(self);
        self.depth -= 1;
        value
    }

    /// Converts the target of a shared pointer at `address` once per conversion.
    ///
    /// A later call with the same address returns the same node, which the
    /// printer collapses to `@ref[n]`. Scalars and placeholders are not
    /// remembered; they have no identity to share.
    pub fn shared(&mut self, address: usize, convert: impl FnOnce(&mut Self) -> Value) -> Value {
        if let Some(value) = self.shared.get(&address) {
            return value.clone();
        }
        let value = convert(self);
        if value.identity().is_some() {
            self.shared.insert(address, value.clone());
        }
        value
    }
}

// =============================================================================
// ToValue
// =============================================================================

/// Converts a Rust value into the printer's value model.
///
/// Implemented for scalars, strings, std collections, `serde_json::Value`, and
/// by `#[derive(Record)]` for user structs.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be rendered by the printer",
    label = "this type does not implement `ToValue`",
    note = "use `#[derive(Record)]` on the type definition",
    note = "or wrap unintrospectable values with `Opaque::of`"
)]
pub trait ToValue {
    /// Converts within the limits carried by `cx`.
    fn convert(&self, cx: &mut Conversion) -> Value;

    /// Converts with the default limits.
    fn to_value(&self) -> Value {
        self.convert(&mut Conversion::default())
    }
}

/// Registry metadata generated by `#[derive(Record)]`.
pub trait Describe {
    /// Module-qualified type name used as the registry key.
    const TYPE_NAME: &'static str;

    /// Type-level and field-level directives declared with `#[sensitive]`.
    fn directives() -> TypeDirectives;
}

impl ToValue for Value {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Nil
    }
}

impl<T: ?Sized> ToValue for PhantomData<T> {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Nil
    }
}

impl ToValue for bool {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_signed {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn convert(&self, _cx: &mut Conversion) -> Value {
                    Value::I64(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! impl_to_value_unsigned {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn convert(&self, _cx: &mut Conversion) -> Value {
                    Value::U64(u64::from(*self))
                }
            }
        )*
    };
}

impl_to_value_signed!(i8, i16, i32, i64);
impl_to_value_unsigned!(u8, u16, u32, u64);

impl ToValue for isize {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::Str(self.to_string()), Value::I64)
    }
}

impl ToValue for usize {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        u64::try_from(*self).map_or_else(|_| Value::Str(self.to_string()), Value::U64)
    }
}

// Wider than the scalar slots; rendered through their decimal text.
impl ToValue for i128 {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::Str(self.to_string()), Value::I64)
    }
}

impl ToValue for u128 {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        u64::try_from(*self).map_or_else(|_| Value::Str(self.to_string()), Value::U64)
    }
}

impl ToValue for f32 {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::F64(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::F64(*self)
    }
}

impl ToValue for char {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Char(*self)
    }
}

impl ToValue for str {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Str(self.to_owned())
    }
}

impl ToValue for String {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for Cow<'_, str> {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Str(self.clone().into_owned())
    }
}

impl ToValue for Opaque {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Opaque(self.clone())
    }
}

impl ToValue for Record {
    fn convert(&self, cx: &mut Conversion) -> Value {
        cx.composite(ShapeTag::Record, self.len(), |_| Value::record(self.clone()))
    }
}

// =============================================================================
// Wrappers
// =============================================================================

impl<T: ToValue + ?Sized> ToValue for &T {
    fn convert(&self, cx: &mut Conversion) -> Value {
        (**self).convert(cx)
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        (**self).convert(cx)
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        let address = Arc::as_ptr(self).cast::<()>() as usize;
        cx.shared(address, |cx| (**self).convert(cx))
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        let address = Rc::as_ptr(self).cast::<()>() as usize;
        cx.shared(address, |cx| (**self).convert(cx))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        self.as_ref().map_or(Value::Nil, |value| value.convert(cx))
    }
}

// =============================================================================
// Node handles (identity-preserving)
// =============================================================================

// Passed through unconverted; the printer bounds node graphs itself.
impl ToValue for Node<Vec<Value>> {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Seq(self.clone())
    }
}

impl ToValue for Node<BTreeMap<String, Value>> {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Map(self.clone())
    }
}

impl ToValue for Node<Record> {
    fn convert(&self, _cx: &mut Conversion) -> Value {
        Value::Record(self.clone())
    }
}

// =============================================================================
// Collections
// =============================================================================

fn convert_seq<'a, T, I>(cx: &mut Conversion, len: usize, items: I) -> Value
where
    T: ToValue + 'a,
    I: IntoIterator<Item = &'a T>,
{
    cx.composite(ShapeTag::Seq, len, |cx| {
        Value::seq(items.into_iter().map(|item| item.convert(cx)))
    })
}

fn convert_map<'a, K, V, I>(cx: &mut Conversion, len: usize, entries: I) -> Value
where
    K: Display + 'a,
    V: ToValue + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    cx.composite(ShapeTag::Map, len, |cx| {
        Value::map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.convert(cx))),
        )
    })
}

impl<T: ToValue> ToValue for [T] {
    fn convert(&self, cx: &mut Conversion) -> Value {
        convert_seq(cx, self.len(), self)
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn convert(&self, cx: &mut Conversion) -> Value {
        self.as_slice().convert(cx)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        self.as_slice().convert(cx)
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        convert_seq(cx, self.len(), self)
    }
}

impl<K: Display, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        convert_map(cx, self.len(), self)
    }
}

impl<K: Display, V: ToValue> ToValue for BTreeMap<K, V> {
    fn convert(&self, cx: &mut Conversion) -> Value {
        convert_map(cx, self.len(), self)
    }
}

// =============================================================================
// serde_json
// =============================================================================

impl ToValue for JsonValue {
    fn convert(&self, cx: &mut Conversion) -> Value {
        match self {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(flag) => Value::Bool(*flag),
            JsonValue::Number(number) => number
                .as_i64()
                .map(Value::I64)
                .or_else(|| number.as_u64().map(Value::U64))
                .or_else(|| number.as_f64().map(Value::F64))
                .unwrap_or_else(|| Value::Str(number.to_string())),
            JsonValue::String(text) => Value::Str(text.clone()),
            JsonValue::Array(items) => convert_seq(cx, items.len(), items),
            JsonValue::Object(entries) => convert_map(cx, entries.len(), entries),
        }
    }
}
