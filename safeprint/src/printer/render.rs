//! The recursive renderer.
//!
//! Dispatch is over the value's shape. Composites go through the identity
//! check, the size check, rule resolution and finally structural rendering.
//! Selector-bearing directives are not applied by copying the composite;
//! their paths travel down as [`Pending`] residuals and a matched child is
//! masked at its parent boundary, before it is ever rendered.

use std::fmt::Write as _;

use super::context::{InvocationContext, Visit};
use crate::{
    config::PrinterConfig,
    diagnostic,
    policy::{MaskOptions, SanitizerKind, Sanitizer, Segment, Selector, SensitiveDirective},
    registry::{RuleRegistry, TypeKey},
    value::{Bounded, Elided, Entries, Record, ShapeTag, Value},
};

/// The unconsumed tail of a selector that started at an ancestor.
#[derive(Clone, Copy, Debug)]
struct Pending<'a> {
    segments: &'a [Segment],
    kind: SanitizerKind,
}

/// What the parent decided for one child.
#[derive(Debug, Default)]
struct Residual<'a> {
    /// Mask the whole child with this kind instead of rendering it.
    mask: Option<SanitizerKind>,
    /// Paths still to be matched inside the child.
    pending: Vec<Pending<'a>>,
}

impl<'a> Residual<'a> {
    /// Advances every active path whose head segment accepts this child.
    fn descend(active: &[Pending<'a>], accepts: impl Fn(&Segment) -> bool) -> Self {
        let mut residual = Residual::default();
        for pending in active {
            let Some((head, rest)) = pending.segments.split_first() else {
                continue;
            };
            if !accepts(head) {
                continue;
            }
            if rest.is_empty() {
                residual.mask.get_or_insert(pending.kind);
            } else {
                residual.pending.push(Pending {
                    segments: rest,
                    kind: pending.kind,
                });
            }
        }
        residual
    }

    fn apply(&mut self, directive: &'a SensitiveDirective) {
        if self.mask.is_some() {
            return;
        }
        if directive.masks_whole_value() {
            self.mask = Some(directive.kind());
        } else {
            push_selectors(&mut self.pending, directive);
        }
    }
}

fn push_selectors<'a>(pending: &mut Vec<Pending<'a>>, directive: &'a SensitiveDirective) {
    pending.extend(
        directive
            .selectors()
            .iter()
            .filter(|selector| selector.is_valid())
            .map(|selector| Pending {
                segments: selector.segments(),
                kind: directive.kind(),
            }),
    );
}

pub(crate) struct Renderer<'a> {
    registry: &'a RuleRegistry,
    config: &'a PrinterConfig,
    options: MaskOptions<'a>,
    ctx: InvocationContext,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(registry: &'a RuleRegistry, config: &'a PrinterConfig) -> Self {
        Self {
            registry,
            config,
            options: config.mask_options(),
            ctx: InvocationContext::new(),
        }
    }

    /// Renders `root` and consumes the renderer.
    pub(crate) fn finish(mut self, root: &Value) -> String {
        self.render(root, &[], 0);
        self.ctx.into_output()
    }

    fn render(&mut self, value: &Value, pending: &[Pending<'a>], depth: usize) {
        // Writing into a `String` cannot fail, here and below.
        let out = &mut self.ctx.out;
        match value {
            Value::Nil => out.push_str("null"),
            Value::Bool(flag) => {
                let _ = write!(out, "{flag}");
            }
            Value::I64(n) => {
                let _ = write!(out, "{n}");
            }
            Value::U64(n) => {
                let _ = write!(out, "{n}");
            }
            Value::F64(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Char(c) => out.push(*c),
            Value::Str(text) => self.render_text(text, pending),
            Value::Opaque(opaque) => out.push_str(&opaque.fallback_text()),
            Value::Elided(elided) => {
                let _ = write!(out, "{elided}");
            }
            Value::Seq(_) | Value::Map(_) | Value::Record(_) => {
                self.render_composite(value, pending, depth);
            }
        }
    }

    /// Strings are leaves, but an encoded-text path may still reach inside one.
    fn render_text(&mut self, text: &str, pending: &[Pending<'a>]) {
        let mut current = Value::str(text);
        for residual in pending {
            if residual.kind != SanitizerKind::EncodedText || residual.segments.is_empty() {
                continue;
            }
            let selector = Selector::from_segments(residual.segments.to_vec());
            current = residual.kind.mask(&current, Some(&selector), &self.options);
        }
        match current {
            Value::Str(masked) => self.ctx.out.push_str(&masked),
            other => self.render(&other, &[], 0),
        }
    }

    fn render_composite(&mut self, value: &Value, pending: &[Pending<'a>], depth: usize) {
        match self.ctx.visit(value) {
            Some(Visit::Seen(ordinal)) => {
                let _ = write!(self.ctx.out, "@ref[{ordinal}]");
                return;
            }
            Some(Visit::First(_)) => {}
            None => return,
        }

        let shape = value.shape();
        if depth >= self.config.max_depth {
            let elided = Elided::too_deep(shape, self.config.max_depth);
            let _ = write!(self.ctx.out, "{elided}");
            return;
        }

        let Some(inspected) = value.entries(self.config.max_container_len) else {
            return;
        };
        if inspected.poisoned {
            diagnostic!(warn, shape = %shape, "rendering a container poisoned by a panicked writer");
        }
        let entries = match inspected.value {
            Bounded::Within(entries) => entries,
            Bounded::Oversized(len) => {
                diagnostic!(debug, shape = %shape, len, "container exceeds size limit");
                let elided = Elided::oversized(shape, len, self.config.max_container_len);
                let _ = write!(self.ctx.out, "{elided}");
                return;
            }
        };

        let registry = self.registry;
        let type_key = match &entries {
            Entries::Record(record) => TypeKey::Record(record.type_name()),
            Entries::Seq(_) => TypeKey::Shape(ShapeTag::Seq),
            Entries::Map(_) => TypeKey::Shape(ShapeTag::Map),
        };
        let mut active = pending.to_vec();
        if let Some(directive) = registry.resolve_for_type(type_key) {
            if directive.masks_whole_value() {
                let masked = directive.kind().mask(value, None, &self.options);
                self.render(&masked, &[], depth);
                return;
            }
            push_selectors(&mut active, directive);
        }

        match entries {
            Entries::Seq(items) => self.render_seq(&items, &active, depth),
            Entries::Map(entries) => self.render_map(&entries, &active, depth),
            Entries::Record(record) => self.render_record(&record, &active, depth),
        }
    }

    fn render_seq(&mut self, items: &[Value], active: &[Pending<'a>], depth: usize) {
        self.ctx.out.push('[');
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.ctx.out.push_str(", ");
            }
            let residual = Residual::descend(active, |segment| segment.matches_index(index));
            self.render_child(item, residual, depth);
        }
        self.ctx.out.push(']');
    }

    fn render_map(&mut self, entries: &[(String, Value)], active: &[Pending<'a>], depth: usize) {
        let key_match = self.options.key_match;
        self.ctx.out.push('{');
        for (index, (key, child)) in entries.iter().enumerate() {
            if index > 0 {
                self.ctx.out.push_str(", ");
            }
            self.ctx.out.push_str(key);
            self.ctx.out.push_str(": ");
            let residual = Residual::descend(active, |segment| segment.matches_key(key, key_match));
            self.render_child(child, residual, depth);
        }
        self.ctx.out.push('}');
    }

    fn render_record(&mut self, record: &Record, active: &[Pending<'a>], depth: usize) {
        let key_match = self.options.key_match;
        let registry = self.registry;
        if self.config.type_names {
            self.ctx.out.push_str(record.short_type_name());
        }
        self.ctx.out.push('{');
        for (index, (name, child)) in record.fields().enumerate() {
            if index > 0 {
                self.ctx.out.push_str(", ");
            }
            self.ctx.out.push_str(name);
            self.ctx.out.push_str(": ");
            let mut residual =
                Residual::descend(active, |segment| segment.matches_key(name, key_match));
            if let Some(directive) = registry.resolve_for_field(record.type_name(), name) {
                residual.apply(directive);
            }
            self.render_child(child, residual, depth);
        }
        self.ctx.out.push('}');
    }

    /// Masking happens here, at the parent boundary, so the child's original
    /// content is never rendered.
    fn render_child(&mut self, child: &Value, residual: Residual<'a>, depth: usize) {
        match residual.mask {
            Some(kind) => {
                let masked = kind.mask(child, None, &self.options);
                self.render(&masked, &[], depth + 1);
            }
            None => self.render(child, &residual.pending, depth + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::KeyMatch;

    fn render_with(registry: &RuleRegistry, config: &PrinterConfig, value: &Value) -> String {
        Renderer::new(registry, config).finish(value)
    }

    fn render(registry: &RuleRegistry, value: &Value) -> String {
        render_with(registry, &PrinterConfig::default(), value)
    }

    #[test]
    fn renders_every_shape() {
        let value = Value::map([
            ("b", Value::Bool(true)),
            ("c", Value::Char('x')),
            ("f", Value::F64(1.5)),
            ("i", Value::I64(-3)),
            ("n", Value::Nil),
            ("o", Value::Opaque(crate::value::Opaque::named("fn()"))),
            ("s", Value::seq([Value::from("a"), Value::U64(7)])),
        ]);
        assert_eq!(
            render(&RuleRegistry::empty(), &value),
            "{b: true, c: x, f: 1.5, i: -3, n: null, o: <fn()>, s: [a, 7]}"
        );
    }

    #[test]
    fn nested_sequences_render_per_dimension() {
        let grid = Value::seq([
            Value::seq([Value::from(1), Value::from(2)]),
            Value::seq([Value::from(3), Value::from(4)]),
        ]);
        assert_eq!(render(&RuleRegistry::empty(), &grid), "[[1, 2], [3, 4]]");
    }

    #[test]
    fn record_prefix_follows_config() {
        let value = Value::record(Record::new("app::User").with_field("id", 7));
        let config = PrinterConfig::default().with_type_names(true);
        assert_eq!(render_with(&RuleRegistry::empty(), &config, &value), "User{id: 7}");
        assert_eq!(render(&RuleRegistry::empty(), &value), "{id: 7}");
    }

    #[test]
    fn field_directive_masks_at_boundary() {
        let registry = RuleRegistry::builder()
            .field_rule("app::R", "ak", SensitiveDirective::masked())
            .build();
        let value = Value::map([
            ("a", Value::from(1)),
            (
                "b",
                Value::record(Record::new("app::R").with_field("ak", "secret").with_field("id", 2)),
            ),
        ]);
        assert_eq!(render(&registry, &value), "{a: 1, b: {ak: ***, id: 2}}");
    }

    #[test]
    fn type_directive_masks_whole_record() {
        let registry = RuleRegistry::builder()
            .type_rule("app::Token", SensitiveDirective::masked())
            .build();
        let value = Value::seq([Value::record(Record::new("app::Token").with_field("raw", "t0k"))]);
        assert_eq!(render(&registry, &value), "[***]");
    }

    #[test]
    fn selector_masks_nested_composite_wholesale() {
        let registry = RuleRegistry::builder()
            .type_rule(
                "app::Req",
                SensitiveDirective::new(SanitizerKind::Structural).with_selector("$.auth"),
            )
            .build();
        let auth = Value::map([("user", Value::from("ada")), ("pass", Value::from("pw"))]);
        let value = Value::record(Record::new("app::Req").with_field("auth", auth).with_field("path", "/"));
        assert_eq!(render(&registry, &value), "{auth: ***, path: /}");
    }

    #[test]
    fn deep_selector_reaches_through_children() {
        let registry = RuleRegistry::builder()
            .shape_rule(
                ShapeTag::Map,
                SensitiveDirective::new(SanitizerKind::Structural).with_selector("$.items[*].pan"),
            )
            .build();
        let value = Value::map([(
            "items",
            Value::seq([
                Value::map([("pan", Value::from("4111"))]),
                Value::map([("pan", Value::from("5500"))]),
            ]),
        )]);
        let rendered = render(&registry, &value);
        assert_eq!(rendered, "{items: [{pan: ***}, {pan: ***}]}");
    }

    #[test]
    fn encoded_text_field_is_masked_inside_json() {
        let registry = RuleRegistry::builder()
            .field_rule(
                "app::Event",
                "body",
                SensitiveDirective::new(SanitizerKind::EncodedText).with_selector("$.card.pan"),
            )
            .build();
        let value = Value::record(
            Record::new("app::Event").with_field("body", r#"{"card":{"pan":"4111"},"id":1}"#),
        );
        assert_eq!(render(&registry, &value), r#"{body: {"card":{"pan":"***"},"id":1}}"#);
    }

    #[test]
    fn encoded_text_that_is_not_json_passes_through() {
        let registry = RuleRegistry::builder()
            .field_rule(
                "app::Event",
                "body",
                SensitiveDirective::new(SanitizerKind::EncodedText).with_selector("$.pan"),
            )
            .build();
        let value = Value::record(Record::new("app::Event").with_field("body", "pan=4111"));
        assert_eq!(render(&registry, &value), "{body: pan=4111}");
    }

    #[test]
    fn partial_field_keeps_trailing_characters() {
        let registry = RuleRegistry::builder()
            .field_rule(
                "app::Card",
                "pan",
                SensitiveDirective::new(SanitizerKind::Partial {
                    keep_first: 0,
                    keep_last: 4,
                }),
            )
            .build();
        let value = Value::record(Record::new("app::Card").with_field("pan", "4111111111111111"));
        assert_eq!(render(&registry, &value), "{pan: ************1111}");
    }

    #[test]
    fn key_matching_can_ignore_case() {
        let registry = RuleRegistry::builder()
            .shape_rule(
                ShapeTag::Map,
                SensitiveDirective::masked().with_selector("password"),
            )
            .build();
        let value = Value::map([("Password", Value::from("pw"))]);
        assert_eq!(render(&registry, &value), "{Password: pw}");

        let config = PrinterConfig::default().with_key_match(KeyMatch::IgnoreAsciiCase);
        assert_eq!(render_with(&registry, &config, &value), "{Password: ***}");
    }

    #[test]
    fn invalid_selectors_mask_nothing() {
        let registry = RuleRegistry::builder()
            .shape_rule(ShapeTag::Map, SensitiveDirective::masked().with_selector("$.a["))
            .build();
        let value = Value::map([("a", Value::from(1))]);
        assert_eq!(render(&registry, &value), "{a: 1}");
    }

    #[test]
    fn self_reference_renders_back_reference() {
        let Value::Map(node) = Value::map([("a", Value::from(1))]) else {
            unreachable!()
        };
        node.write().insert("self".to_owned(), Value::Map(node.clone()));
        assert_eq!(
            render(&RuleRegistry::empty(), &Value::Map(node.clone())),
            "{a: 1, self: @ref[1]}"
        );
        node.write().clear();
    }

    #[test]
    fn aliased_instance_is_rendered_once() {
        let shared = Value::seq([Value::from(1)]);
        let value = Value::map([("x", shared.clone()), ("y", shared)]);
        assert_eq!(render(&RuleRegistry::empty(), &value), "{x: [1], y: @ref[2]}");
    }

    #[test]
    fn oversized_container_is_summarized() {
        let config = PrinterConfig::default().with_max_container_len(2);
        let value = Value::seq([Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(
            render_with(&RuleRegistry::empty(), &config, &value),
            "<sequence of 3 exceeds limit 2>"
        );
    }

    #[test]
    fn depth_limit_stops_descent() {
        let config = PrinterConfig::default().with_max_depth(2);
        let value = Value::seq([Value::seq([Value::seq([Value::from(1)])])]);
        assert_eq!(
            render_with(&RuleRegistry::empty(), &config, &value),
            "[[<sequence nested deeper than 2>]]"
        );
    }

    #[test]
    fn custom_mask_token_is_used() {
        let registry = RuleRegistry::builder()
            .field_rule("app::R", "ak", SensitiveDirective::masked())
            .build();
        let config = PrinterConfig::default().with_mask_token("[REDACTED]");
        let value = Value::record(Record::new("app::R").with_field("ak", "secret"));
        assert_eq!(render_with(&registry, &config, &value), "{ak: [REDACTED]}");
    }
}
