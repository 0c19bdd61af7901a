mod record {
    #[test]
    fn accepts_every_sanitizer_kind() {
        let t = trybuild::TestCases::new();
        t.pass("tests/ui/record_kinds_ok.rs");
    }

    #[test]
    fn bounds_only_printed_generics() {
        let t = trybuild::TestCases::new();
        t.pass("tests/ui/record_generic_ok.rs");
    }

    #[test]
    fn unraws_identifiers() {
        let t = trybuild::TestCases::new();
        t.pass("tests/ui/record_raw_ident_ok.rs");
    }
}
