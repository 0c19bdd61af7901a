use std::marker::PhantomData;

use safeprint::{Printer, Record, RuleRegistry};

#[derive(Record)]
struct Envelope<T, Tag> {
    #[sensitive("$.token")]
    body: T,
    #[not_printed]
    cache: Vec<Tag>,
    _tag: PhantomData<Tag>,
}

// Neither `ToValue` nor `Debug`.
struct Opaque;

fn main() {
    let printer = Printer::new(RuleRegistry::builder().register::<Envelope<u8, Opaque>>().build());
    let envelope = Envelope::<u8, Opaque> {
        body: 1,
        cache: Vec::new(),
        _tag: PhantomData,
    };
    let _ = envelope.cache.len();
    let _ = printer.sanitize(&envelope);
}
