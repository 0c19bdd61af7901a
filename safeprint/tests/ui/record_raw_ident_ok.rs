mod inner {
    #[derive(safeprint::Record)]
    pub struct r#Type {
        pub r#type: u8,
        pub nested: Option<Box<r#Type>>,
    }
}

fn main() {
    let value = inner::r#Type {
        r#type: 1,
        nested: None,
    };
    let printed = safeprint::Printer::default().sanitize(&value);
    assert_eq!(printed, "{type: 1, nested: null}");
    assert!(<inner::r#Type as safeprint::Describe>::TYPE_NAME.ends_with("inner::Type"));
}
