//! Masking strategies.
//!
//! A [`Sanitizer`] maps a value (and optionally a selector inside it) to its
//! masked replacement. Sanitizers are total: they never fail and never modify
//! their input. Anything they cannot interpret is returned unchanged.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{
    partial::{MASK_CHAR, PartialMask},
    selector::{KeyMatch, Selector, Step},
};
use crate::{
    config::DEFAULT_MASK_TOKEN,
    diagnostic,
    value::{Node, Value},
};

// =============================================================================
// Sanitizer trait
// =============================================================================

/// Settings shared by every sanitizer during one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskOptions<'a> {
    /// Replacement for fully masked values.
    pub token: &'a str,
    /// Character used by partial masks.
    pub mask_char: char,
    /// How selector names are compared with keys.
    pub key_match: KeyMatch,
}

impl Default for MaskOptions<'static> {
    fn default() -> Self {
        Self {
            token: DEFAULT_MASK_TOKEN,
            mask_char: MASK_CHAR,
            key_match: KeyMatch::Exact,
        }
    }
}

impl MaskOptions<'_> {
    fn token_value(&self) -> Value {
        Value::str(self.token)
    }
}

/// A masking strategy.
///
/// `selector == None` means "mask the whole value". With a selector, only the
/// leaves it addresses are replaced, and the result is a copy: the input graph
/// may be shared with other threads and is never written to.
pub trait Sanitizer {
    fn mask(&self, value: &Value, selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value;
}

// =============================================================================
// Strategies
// =============================================================================

/// Ignores its input and returns the mask token.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedMask;

impl Sanitizer for FixedMask {
    fn mask(&self, _value: &Value, _selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value {
        options.token_value()
    }
}

/// Replaces the leaves a selector addresses inside a composite.
///
/// Containers on the path to a matched leaf are copied; siblings keep their
/// original nodes. A selector that matches nothing returns the input instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralMask;

impl Sanitizer for StructuralMask {
    fn mask(&self, value: &Value, selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value {
        match selector {
            None => options.token_value(),
            Some(selector) => {
                let token = options.token_value();
                replace_matches(value, selector, options.key_match, &|_| token.clone())
            }
        }
    }
}

/// Masks leaves inside text that holds a JSON document.
///
/// Text that does not parse is returned unchanged. Non-text values fall back to
/// [`StructuralMask`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodedTextMask;

impl Sanitizer for EncodedTextMask {
    fn mask(&self, value: &Value, selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value {
        let Some(selector) = selector else {
            return options.token_value();
        };
        match value {
            Value::Str(text) => Value::Str(mask_encoded(text, selector, options)),
            other => StructuralMask.mask(other, Some(selector), options),
        }
    }
}

impl Sanitizer for PartialMask {
    fn mask(&self, value: &Value, selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value {
        match selector {
            Some(selector) if !selector.is_root() => {
                replace_matches(value, selector, options.key_match, &|leaf| {
                    partial_leaf(self, leaf, options)
                })
            }
            _ => partial_leaf(self, value, options),
        }
    }
}

fn partial_leaf(mask: &PartialMask, value: &Value, options: &MaskOptions<'_>) -> Value {
    let text: Cow<'_, str> = match value {
        Value::Nil => return Value::Nil,
        Value::Str(text) => Cow::Borrowed(text),
        Value::Bool(flag) => Cow::Owned(flag.to_string()),
        Value::I64(n) => Cow::Owned(n.to_string()),
        Value::U64(n) => Cow::Owned(n.to_string()),
        Value::F64(n) => Cow::Owned(n.to_string()),
        Value::Char(c) => Cow::Owned(c.to_string()),
        Value::Opaque(_)
        | Value::Seq(_)
        | Value::Map(_)
        | Value::Record(_)
        | Value::Elided(_) => {
            return options.token_value();
        }
    };
    mask.apply_to(&text)
        .map_or_else(|| options.token_value(), Value::Str)
}

fn mask_encoded(text: &str, selector: &Selector, options: &MaskOptions<'_>) -> String {
    if selector.is_root() {
        return options.token.to_owned();
    }
    let mut document: JsonValue = match serde_json::from_str(text) {
        Ok(document) => document,
        Err(err) => {
            diagnostic!(debug, error = %err, "embedded text is not JSON; leaving it unmasked");
            return text.to_owned();
        }
    };
    let locations = selector.evaluate_json(&document, options.key_match);
    if locations.is_empty() {
        return text.to_owned();
    }
    for location in &locations {
        if let Some(slot) = document.pointer_mut(&location.to_json_pointer()) {
            *slot = JsonValue::String(options.token.to_owned());
        }
    }
    serde_json::to_string(&document).unwrap_or_else(|_| text.to_owned())
}

// =============================================================================
// Copy-on-write replacement
// =============================================================================

fn replace_matches(
    value: &Value,
    selector: &Selector,
    key_match: KeyMatch,
    replace: &dyn Fn(&Value) -> Value,
) -> Value {
    selector
        .evaluate(value, key_match)
        .iter()
        .fold(value.clone(), |current, location| {
            replace_at(&current, location.steps(), replace)
        })
}

fn replace_at(value: &Value, steps: &[Step], replace: &dyn Fn(&Value) -> Value) -> Value {
    let Some((step, rest)) = steps.split_first() else {
        return replace(value);
    };
    match (value, step) {
        (Value::Seq(node), Step::Index(index)) => {
            let mut items = node.read().clone();
            let Some(slot) = items.get_mut(*index) else {
                return value.clone();
            };
            let replaced = replace_at(slot, rest, replace);
            *slot = replaced;
            Value::Seq(Node::new(items))
        }
        (Value::Map(node), Step::Key(key)) => {
            let mut entries = node.read().clone();
            let Some(slot) = entries.get_mut(key) else {
                return value.clone();
            };
            let replaced = replace_at(slot, rest, replace);
            *slot = replaced;
            Value::Map(Node::new(entries))
        }
        (Value::Record(node), Step::Key(key)) => {
            let mut record = node.read().clone();
            let Some(child) = record.get(key).cloned() else {
                return value.clone();
            };
            record.set(key.clone(), replace_at(&child, rest, replace));
            Value::record(record)
        }
        _ => value.clone(),
    }
}

// =============================================================================
// SanitizerKind
// =============================================================================

/// Names a masking strategy in declarative configuration and derive attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizerKind {
    /// [`FixedMask`].
    #[default]
    Fixed,
    /// [`StructuralMask`].
    Structural,
    /// [`EncodedTextMask`].
    EncodedText,
    /// [`PartialMask`], using the configured mask character.
    Partial {
        #[serde(default)]
        keep_first: usize,
        #[serde(default)]
        keep_last: usize,
    },
}

impl Sanitizer for SanitizerKind {
    fn mask(&self, value: &Value, selector: Option<&Selector>, options: &MaskOptions<'_>) -> Value {
        match *self {
            SanitizerKind::Fixed => FixedMask.mask(value, selector, options),
            SanitizerKind::Structural => StructuralMask.mask(value, selector, options),
            SanitizerKind::EncodedText => EncodedTextMask.mask(value, selector, options),
            SanitizerKind::Partial {
                keep_first,
                keep_last,
            } => PartialMask::new(keep_first, keep_last)
                .with_mask_char(options.mask_char)
                .mask(value, selector, options),
        }
    }
}
