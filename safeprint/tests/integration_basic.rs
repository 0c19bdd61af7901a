//! End-to-end tests for the public printing API.
//!
//! These tests exercise the integration of:
//! - `Record` derive field enumeration and declared directives,
//! - registry lookup for types, fields and shapes, and
//! - masking at every nesting depth.

use std::collections::{BTreeMap, HashMap};

use safeprint::{
    Opaque, Printer, PrinterConfig, Record, RuleRegistry, SanitizerKind, SensitiveDirective,
    ShapeTag, ToValue, Value,
};

#[derive(Record)]
struct R {
    #[sensitive]
    ak: String,
    id: u32,
}

fn r() -> R {
    R {
        ak: "secret".to_owned(),
        id: 7,
    }
}

fn printer() -> Printer {
    Printer::new(RuleRegistry::builder().register::<R>().build())
}

#[test]
fn masks_field_of_nested_record() {
    let root = BTreeMap::from([("a", Value::from(1)), ("b", r().to_value())]);

    let out = printer().sanitize(&root);

    assert_eq!(out, "{a: 1, b: {ak: ***, id: 7}}");
    assert!(!out.contains("secret"));
}

#[test]
fn masks_at_any_depth() {
    let mut value = r().to_value();
    for depth in 0..40 {
        value = if depth % 2 == 0 {
            Value::seq([Value::from(depth), value])
        } else {
            Value::map([("inner", value)])
        };
    }

    let out = printer().sanitize_value(&value);

    assert!(out.contains("ak: ***"));
    assert!(!out.contains("secret"));
}

#[test]
fn unregistered_type_renders_unmodified() {
    let out = Printer::default().sanitize(&r());
    assert_eq!(out, "{ak: secret, id: 7}");
}

#[test]
fn repeated_calls_are_byte_identical() {
    let mut users = HashMap::new();
    users.insert("ada", r());
    users.insert("bob", r());
    users.insert("eve", r());
    let value = users.to_value();

    let printer = printer();
    let first = printer.sanitize_value(&value);
    for _ in 0..10 {
        assert_eq!(printer.sanitize_value(&value), first);
    }
}

#[test]
fn tuple_and_unit_structs_render() {
    #[derive(Record)]
    struct Pair(u8, #[sensitive(Partial(0, 2))] String);

    #[derive(Record)]
    struct Marker;

    let printer = Printer::new(
        RuleRegistry::builder()
            .register::<Pair>()
            .register::<Marker>()
            .build(),
    );
    assert_eq!(printer.sanitize(&Pair(1, "abcdef".into())), "{0: 1, 1: ****ef}");
    assert_eq!(printer.sanitize(&Marker), "{}");
}

#[test]
fn not_printed_fields_are_omitted() {
    #[derive(Record)]
    struct Session {
        id: u64,
        #[not_printed]
        #[allow(dead_code)]
        raw_cookie: String,
    }

    let session = Session {
        id: 3,
        raw_cookie: "c00k1e".into(),
    };
    assert_eq!(Printer::default().sanitize(&session), "{id: 3}");
}

#[test]
fn type_level_selectors_reach_nested_fields() {
    #[derive(Record)]
    struct Card {
        pan: String,
        exp: String,
    }

    #[derive(Record)]
    #[sensitive("$.card.pan", "$.cvv", Structural)]
    struct Payment {
        card: Card,
        cvv: u16,
        amount: u64,
    }

    let payment = Payment {
        card: Card {
            pan: "4111111111111111".into(),
            exp: "12/30".into(),
        },
        cvv: 123,
        amount: 4200,
    };
    let printer = Printer::new(RuleRegistry::builder().register::<Payment>().build());

    let out = printer.sanitize(&payment);

    assert_eq!(out, "{card: {pan: ***, exp: 12/30}, cvv: ***, amount: 4200}");
}

#[test]
fn encoded_text_field_is_rewritten() {
    #[derive(Record)]
    struct Event {
        kind: &'static str,
        #[sensitive("$.user.password", EncodedText)]
        payload: String,
    }

    let printer = Printer::new(RuleRegistry::builder().register::<Event>().build());
    let event = Event {
        kind: "signup",
        payload: r#"{"user":{"name":"ada","password":"hunter2"}}"#.into(),
    };
    assert_eq!(
        printer.sanitize(&event),
        r#"{kind: signup, payload: {"user":{"name":"ada","password":"***"}}}"#
    );

    let garbled = Event {
        kind: "signup",
        payload: "password=hunter2".into(),
    };
    assert_eq!(printer.sanitize(&garbled), "{kind: signup, payload: password=hunter2}");
}

#[test]
fn shape_rule_covers_every_map() {
    let printer = Printer::new(
        RuleRegistry::builder()
            .shape_rule(
                ShapeTag::Map,
                SensitiveDirective::new(SanitizerKind::Structural).with_selector("password"),
            )
            .build(),
    );
    let value = Value::seq([
        Value::map([("password", Value::from("a")), ("user", Value::from("ada"))]),
        Value::map([("password", Value::from("b"))]),
    ]);
    assert_eq!(
        printer.sanitize_value(&value),
        "[{password: ***, user: ada}, {password: ***}]"
    );
}

#[test]
fn opaque_values_use_fallback_text() {
    let callback = |x: u8| x + 1;
    let value = Value::map([
        ("callback", Value::Opaque(Opaque::of(&callback).with_label("<closure>"))),
        ("handle", Value::Opaque(Opaque::named("FileHandle"))),
    ]);
    assert_eq!(
        Printer::default().sanitize_value(&value),
        "{callback: <closure>, handle: <FileHandle>}"
    );
}

#[test]
fn type_names_can_prefix_records() {
    let printer = printer().with_config(PrinterConfig::default().with_type_names(true));
    assert_eq!(printer.sanitize(&r()), "R{ak: ***, id: 7}");
}

#[test]
fn json_values_render_like_maps() {
    let json = serde_json::json!({"b": [1, true, null], "a": "x"});
    assert_eq!(Printer::default().sanitize(&json), "{a: x, b: [1, true, null]}");
}
