//! Path selectors over nested values and JSON documents.
//!
//! Grammar (a common subset of JSONPath):
//!
//! | Form            | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `$`             | the whole value                           |
//! | `.name`         | field or map entry `name`                 |
//! | `['any name']`  | field or map entry with arbitrary text    |
//! | `[3]`           | element 3 of a sequence                   |
//! | `.*` / `[*]`    | every child                               |
//! | `name.more`     | shorthand for `$.name.more`               |
//!
//! Evaluation is permissive: a selector that matches nothing yields no
//! locations, and a selector built with [`Selector::parse_lenient`] from
//! malformed text matches nothing at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{diagnostic, error::SelectorError, value::Value};

// =============================================================================
// KeyMatch
// =============================================================================

/// How selector names are compared with field names and map keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatch {
    #[default]
    Exact,
    IgnoreAsciiCase,
}

impl KeyMatch {
    pub fn matches(self, pattern: &str, key: &str) -> bool {
        match self {
            KeyMatch::Exact => pattern == key,
            KeyMatch::IgnoreAsciiCase => pattern.eq_ignore_ascii_case(key),
        }
    }
}

// =============================================================================
// Segments and locations
// =============================================================================

/// One step of a selector path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

impl Segment {
    /// Returns `true` if this segment addresses the child reached by `step`.
    pub fn matches(&self, step: &Step, key_match: KeyMatch) -> bool {
        match (self, step) {
            (Segment::Wildcard, _) => true,
            (Segment::Key(pattern), Step::Key(key)) => key_match.matches(pattern, key),
            (Segment::Index(wanted), Step::Index(index)) => wanted == index,
            _ => false,
        }
    }

    pub(crate) fn matches_key(&self, key: &str, key_match: KeyMatch) -> bool {
        match self {
            Segment::Wildcard => true,
            Segment::Key(pattern) => key_match.matches(pattern, key),
            Segment::Index(_) => false,
        }
    }

    pub(crate) fn matches_index(&self, index: usize) -> bool {
        match self {
            Segment::Wildcard => true,
            Segment::Index(wanted) => *wanted == index,
            Segment::Key(_) => false,
        }
    }
}

/// A concrete child step: an actual key or an actual position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// An addressable leaf location, as produced by selector evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// RFC 6901 pointer, as accepted by `serde_json::Value::pointer_mut`.
    pub fn to_json_pointer(&self) -> String {
        let mut pointer = String::new();
        for step in &self.steps {
            pointer.push('/');
            match step {
                Step::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
                Step::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for step in &self.steps {
            match step {
                Step::Key(key) => write_key(f, key)?,
                Step::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn write_key(f: &mut impl fmt::Write, key: &str) -> fmt::Result {
    let plain = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if plain {
        write!(f, ".{key}")
    } else {
        write!(f, "['{}']", key.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

// =============================================================================
// Selector
// =============================================================================

/// A parsed path expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    /// `None` when built leniently from malformed text; matches nothing.
    segments: Option<Vec<Segment>>,
}

impl Selector {
    /// Parses `input`, reporting malformed paths.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let segments = Parser { source, offset: 0 }.parse()?;
        Ok(Self {
            source: source.to_owned(),
            segments: Some(segments),
        })
    }

    /// Parses `input`, degrading a malformed path to a selector that matches
    /// nothing.
    pub fn parse_lenient(input: &str) -> Self {
        match Self::parse(input) {
            Ok(selector) => selector,
            Err(err) => {
                diagnostic!(warn, selector = input, error = %err, "ignoring malformed selector");
                Self {
                    source: input.to_owned(),
                    segments: None,
                }
            }
        }
    }

    /// Builds a selector from already-parsed segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut source = String::from("$");
        for segment in &segments {
            // Writing into a `String` cannot fail.
            let _ = match segment {
                Segment::Key(key) => write_key(&mut source, key),
                Segment::Index(index) => fmt::Write::write_fmt(&mut source, format_args!("[{index}]")),
                Segment::Wildcard => fmt::Write::write_str(&mut source, ".*"),
            };
        }
        Self {
            source,
            segments: Some(segments),
        }
    }

    /// The root selector `$`, addressing the whole value.
    pub fn root() -> Self {
        Self::from_segments(Vec::new())
    }

    /// The text this selector was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments; empty for the root selector and for invalid selectors.
    pub fn segments(&self) -> &[Segment] {
        self.segments.as_deref().unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.segments.is_some()
    }

    /// Returns `true` for a valid selector addressing the whole value.
    pub fn is_root(&self) -> bool {
        self.segments.as_ref().is_some_and(Vec::is_empty)
    }

    /// Resolves every location this selector addresses inside `document`.
    ///
    /// Composite children are read under their locks one level at a time;
    /// `document` is never modified.
    pub fn evaluate(&self, document: &Value, key_match: KeyMatch) -> Vec<Location> {
        let Some(segments) = &self.segments else {
            return Vec::new();
        };
        let mut found = Vec::new();
        collect_value(document, segments, key_match, &mut Vec::new(), &mut found);
        found
    }

    /// Resolves every location this selector addresses inside a JSON document.
    pub fn evaluate_json(&self, document: &JsonValue, key_match: KeyMatch) -> Vec<Location> {
        let Some(segments) = &self.segments else {
            return Vec::new();
        };
        let mut found = Vec::new();
        collect_json(document, segments, key_match, &mut Vec::new(), &mut found);
        found
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

fn collect_value(
    value: &Value,
    segments: &[Segment],
    key_match: KeyMatch,
    trail: &mut Vec<Step>,
    found: &mut Vec<Location>,
) {
    let Some((head, rest)) = segments.split_first() else {
        found.push(Location::new(trail.clone()));
        return;
    };
    for (step, child) in matching_children(value, head, key_match) {
        trail.push(step);
        collect_value(&child, rest, key_match, trail, found);
        trail.pop();
    }
}

// Copies matching children out so no lock is held while descending.
fn matching_children(value: &Value, segment: &Segment, key_match: KeyMatch) -> Vec<(Step, Value)> {
    match value {
        Value::Seq(node) => {
            let items = node.read();
            match segment {
                Segment::Index(index) => items
                    .get(*index)
                    .map(|child| vec![(Step::Index(*index), child.clone())])
                    .unwrap_or_default(),
                Segment::Wildcard => items
                    .iter()
                    .enumerate()
                    .map(|(index, child)| (Step::Index(index), child.clone()))
                    .collect(),
                Segment::Key(_) => Vec::new(),
            }
        }
        Value::Map(node) => {
            let entries = node.read();
            match (segment, key_match) {
                (Segment::Key(key), KeyMatch::Exact) => entries
                    .get(key)
                    .map(|child| vec![(Step::Key(key.clone()), child.clone())])
                    .unwrap_or_default(),
                _ => entries
                    .iter()
                    .filter(|(key, _)| segment.matches_key(key, key_match))
                    .map(|(key, child)| (Step::Key(key.clone()), child.clone()))
                    .collect(),
            }
        }
        Value::Record(node) => node
            .read()
            .fields()
            .filter(|(name, _)| segment.matches_key(name, key_match))
            .map(|(name, child)| (Step::Key(name.to_owned()), child.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_json(
    value: &JsonValue,
    segments: &[Segment],
    key_match: KeyMatch,
    trail: &mut Vec<Step>,
    found: &mut Vec<Location>,
) {
    let Some((head, rest)) = segments.split_first() else {
        found.push(Location::new(trail.clone()));
        return;
    };
    match value {
        JsonValue::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                if head.matches_index(index) {
                    trail.push(Step::Index(index));
                    collect_json(child, rest, key_match, trail, found);
                    trail.pop();
                }
            }
        }
        JsonValue::Object(entries) => {
            for (key, child) in entries {
                if head.matches_key(key, key_match) {
                    trail.push(Step::Key(key.clone()));
                    collect_json(child, rest, key_match, trail, found);
                    trail.pop();
                }
            }
        }
        _ => {}
    }
}

// =============================================================================
// Parsing
// =============================================================================

struct Parser<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<Vec<Segment>, SelectorError> {
        let mut segments = Vec::new();
        // A leading name without `$` is shorthand for `$.name`.
        if !self.eat('$') && self.peek() != Some('[') {
            self.dotted(&mut segments)?;
        }
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.offset += 1;
                    self.dotted(&mut segments)?;
                }
                '[' => {
                    self.offset += 1;
                    self.bracketed(&mut segments)?;
                }
                found => return Err(self.unexpected(found)),
            }
        }
        Ok(segments)
    }

    fn dotted(&mut self, segments: &mut Vec<Segment>) -> Result<(), SelectorError> {
        if self.eat('*') {
            segments.push(Segment::Wildcard);
            return Ok(());
        }
        let start = self.offset;
        let name = self.name();
        if name.is_empty() {
            return Err(SelectorError::ExpectedName {
                selector: self.source.to_owned(),
                offset: start,
            });
        }
        segments.push(Segment::Key(name.to_owned()));
        Ok(())
    }

    fn bracketed(&mut self, segments: &mut Vec<Segment>) -> Result<(), SelectorError> {
        let segment = match self.peek() {
            None => return Err(self.unterminated()),
            Some('*') => {
                self.offset += 1;
                Segment::Wildcard
            }
            Some(quote @ ('\'' | '"')) => {
                self.offset += 1;
                Segment::Key(self.quoted(quote)?)
            }
            Some(_) => {
                let start = self.offset;
                while let Some(c) = self.peek() {
                    if c == ']' {
                        break;
                    }
                    self.offset += c.len_utf8();
                }
                if self.peek().is_none() {
                    return Err(self.unterminated());
                }
                let raw = self.source[start..self.offset].trim();
                let index = raw.parse::<usize>().map_err(|_| SelectorError::InvalidIndex {
                    selector: self.source.to_owned(),
                    index: raw.to_owned(),
                })?;
                Segment::Index(index)
            }
        };
        if !self.eat(']') {
            return Err(match self.peek() {
                None => self.unterminated(),
                Some(found) => self.unexpected(found),
            });
        }
        segments.push(segment);
        Ok(())
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.unterminated()),
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.unterminated()),
                },
                Some(c) if c == quote => return Ok(text),
                Some(c) => text.push(c),
            }
        }
    }

    fn name(&mut self) -> &'a str {
        let start = self.offset;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | ']') || c.is_whitespace() {
                break;
            }
            self.offset += c.len_utf8();
        }
        &self.source[start..self.offset]
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.offset += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::UnexpectedChar {
            selector: self.source.to_owned(),
            found,
            offset: self.offset,
        }
    }

    fn unterminated(&self) -> SelectorError {
        SelectorError::Unterminated {
            selector: self.source.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::value::Record;

    fn segments(input: &str) -> Vec<Segment> {
        Selector::parse(input).unwrap().segments().to_vec()
    }

    #[test]
    fn parses_dotted_and_indexed_paths() {
        assert_eq!(
            segments("$.items[2].pan"),
            vec![
                Segment::Key("items".into()),
                Segment::Index(2),
                Segment::Key("pan".into()),
            ]
        );
        assert_eq!(segments("$[0][1]"), vec![Segment::Index(0), Segment::Index(1)]);
    }

    #[test]
    fn bare_name_is_root_shorthand() {
        assert_eq!(segments("ak"), segments("$.ak"));
        assert_eq!(segments("a.b"), segments("$.a.b"));
        assert_eq!(segments("[3]"), segments("$[3]"));
    }

    #[test]
    fn parses_quoted_keys_and_wildcards() {
        assert_eq!(
            segments("$['x-api.key'].*"),
            vec![Segment::Key("x-api.key".into()), Segment::Wildcard]
        );
        assert_eq!(segments(r#"$["it\"s"][*]"#), vec![Segment::Key("it\"s".into()), Segment::Wildcard]);
    }

    #[test]
    fn root_selector_has_no_segments() {
        let root = Selector::parse("$").unwrap();
        assert!(root.is_root());
        assert!(Selector::root().is_root());
        assert_eq!(Selector::root().as_str(), "$");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("$.a..b"),
            Err(SelectorError::ExpectedName { offset: 4, .. })
        ));
        assert!(matches!(
            Selector::parse("$.a[1"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert!(matches!(
            Selector::parse("$['open"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert!(matches!(
            Selector::parse("$.a[x]"),
            Err(SelectorError::InvalidIndex { .. })
        ));
        assert!(matches!(
            Selector::parse("$a"),
            Err(SelectorError::UnexpectedChar { found: 'a', .. })
        ));
    }

    #[test]
    fn lenient_parse_matches_nothing() {
        let selector = Selector::parse_lenient("$.a[");
        assert!(!selector.is_valid());
        assert!(!selector.is_root());
        let doc = Value::map([("a", Value::from(1))]);
        assert!(selector.evaluate(&doc, KeyMatch::Exact).is_empty());
    }

    #[test]
    fn from_segments_round_trips_text() {
        let selector = Selector::from_segments(vec![
            Segment::Key("card".into()),
            Segment::Key("x y".into()),
            Segment::Index(0),
            Segment::Wildcard,
        ]);
        assert_eq!(selector.as_str(), "$.card['x y'][0].*");
        assert_eq!(Selector::parse(selector.as_str()).unwrap(), selector);
    }

    #[test]
    fn evaluates_against_value_graphs() {
        let card = Record::new("app::Card")
            .with_field("pan", "4111")
            .with_field("cvv", "123");
        let doc = Value::map([
            ("cards", Value::seq([Value::record(card.clone()), Value::record(card)])),
            ("owner", Value::str("ada")),
        ]);

        let selector = Selector::parse("$.cards[*].pan").unwrap();
        let found: Vec<String> = selector
            .evaluate(&doc, KeyMatch::Exact)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(found, ["$.cards[0].pan", "$.cards[1].pan"]);

        let missing = Selector::parse("$.cards[9].pan").unwrap();
        assert!(missing.evaluate(&doc, KeyMatch::Exact).is_empty());
    }

    #[test]
    fn key_match_controls_case_sensitivity() {
        let doc = Value::map([("Password", Value::str("hunter2"))]);
        let selector = Selector::parse("password").unwrap();
        assert!(selector.evaluate(&doc, KeyMatch::Exact).is_empty());
        assert_eq!(selector.evaluate(&doc, KeyMatch::IgnoreAsciiCase).len(), 1);
    }

    #[test]
    fn evaluates_against_json_documents() {
        let doc = json!({"a/b": {"list": [{"k": 1}, {"k": 2}]}});
        let selector = Selector::parse("$['a/b'].list[*].k").unwrap();
        let pointers: Vec<String> = selector
            .evaluate_json(&doc, KeyMatch::Exact)
            .iter()
            .map(Location::to_json_pointer)
            .collect();
        assert_eq!(pointers, ["/a~1b/list/0/k", "/a~1b/list/1/k"]);
    }

    #[test]
    fn root_selector_locates_the_document_itself() {
        let doc = json!(5);
        let found = Selector::root().evaluate_json(&doc, KeyMatch::Exact);
        assert_eq!(found.len(), 1);
        assert!(found[0].is_root());
    }
}
