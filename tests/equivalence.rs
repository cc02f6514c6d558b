use ion_core::events::EMBEDDED_DOCUMENTS_ANNOTATION;
use ion_core::prelude::*;

fn stream(text: &str) -> EventStream {
    EventStream::from_text(text).expect("test input parses")
}

fn comparator() -> StreamComparator {
    StreamComparator::default()
}

/// Equivalence of two single-value documents.
fn values_eq(left: &str, right: &str) -> bool {
    let a = stream(left);
    let b = stream(right);
    comparator().events_eq(&a, 0, &b, 0)
}

#[test]
fn materialization_produces_expected_events() {
    let s = stream("{foo: [1, 2]} 3");
    let kinds: Vec<EventKind> = s.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ContainerStart,
            EventKind::ContainerStart,
            EventKind::Scalar,
            EventKind::Scalar,
            EventKind::ContainerEnd,
            EventKind::ContainerEnd,
            EventKind::Scalar,
            EventKind::StreamEnd,
        ]
    );
    assert_eq!(s.events()[1].field_name, Some(IonString::from("foo")));
    assert_eq!(s.events()[2].depth, 2);
    assert_eq!(s.events()[6].depth, 0);
}

#[test]
fn value_len_spans_containers() {
    let s = stream("{foo: [1, 2]} 3");
    assert_eq!(s.value_len(0), 6, "whole struct");
    assert_eq!(s.value_len(1), 4, "inner list");
    assert_eq!(s.value_len(2), 1, "scalar");
    assert_eq!(s.value_len(6), 1, "top-level scalar");
}

#[test]
fn scalar_equivalence_rules() {
    assert!(values_eq("1", "1"));
    assert!(!values_eq("1", "2"));
    assert!(values_eq("18446744073709551616", "18446744073709551616"));

    // Doubles: NaN equals NaN, and signed zeros differ.
    assert!(values_eq("nan", "nan"));
    assert!(!values_eq("0e0", "-0e0"));
    assert!(values_eq("1.5e0", "1.5e0"));

    // Decimals compare by sign, coefficient, and exponent.
    assert!(values_eq("1.0", "1.0"));
    assert!(!values_eq("1.0", "1.00"));
    assert!(!values_eq("1.0", "1.0e0"), "decimal and float differ by type");

    // Text and lobs are byte-identical.
    assert!(values_eq("\"abc\"", "\"abc\""));
    assert!(!values_eq("\"abc\"", "'abc'"), "string and symbol differ by type");
    assert!(values_eq("{{aGVsbG8=}}", "{{aGVsbG8=}}"));
    assert!(!values_eq("{{aGVsbG8=}}", "{{aGVsbG9v}}"));

    // Nulls are equivalent only at the same declared type.
    assert!(values_eq("null", "null"));
    assert!(values_eq("null.int", "null.int"));
    assert!(!values_eq("null", "null.int"));
    assert!(!values_eq("null.int", "0"));
}

#[test]
fn annotations_participate_in_equivalence() {
    assert!(values_eq("a::1", "a::1"));
    assert!(!values_eq("a::1", "b::1"));
    assert!(!values_eq("a::1", "1"));
    assert!(!values_eq("a::b::1", "b::a::1"), "annotation order matters");
}

#[test]
fn sequence_equivalence_is_ordered() {
    assert!(values_eq("[1, 2, 3]", "[1, 2, 3]"));
    assert!(!values_eq("[1, 2, 3]", "[3, 2, 1]"));
    assert!(!values_eq("[1, 2, 3]", "[1, 2]"));
    assert!(!values_eq("[1, 2]", "[1, 2, 3]"));
    assert!(!values_eq("[1, 2, 3]", "(1 2 3)"), "list and sexp differ by type");
    assert!(values_eq("(a (b c))", "(a (b c))"));
}

#[test]
fn struct_equivalence_ignores_field_order() {
    assert!(values_eq("{a: 1, b: 2}", "{b: 2, a: 1}"));
    assert!(!values_eq("{a: 1, b: 2}", "{a: 1, b: 3}"));
    assert!(!values_eq("{a: 1}", "{b: 1}"));
    assert!(values_eq("{a: {x: 1}, b: [2]}", "{b: [2], a: {x: 1}}"));
}

#[test]
fn struct_equivalence_is_bag_equality() {
    // {a:1, a:1} is equivalent to itself but not to {a:1}.
    assert!(values_eq("{a: 1, a: 1}", "{a: 1, a: 1}"));
    assert!(!values_eq("{a: 1, a: 1}", "{a: 1}"));
    assert!(!values_eq("{a: 1}", "{a: 1, a: 1}"));

    // Multiplicity three needs at least multiplicity three of the exact
    // same pair on the other side.
    assert!(values_eq("{k: 1, k: 1, k: 1}", "{k: 1, k: 1, k: 1}"));
    assert!(!values_eq("{k: 1, k: 1, k: 1}", "{k: 1, k: 1}"));
    assert!(!values_eq("{k: 1, k: 1, k: 1}", "{k: 1, k: 1, k: 2}"));

    // Same multiset through different orderings.
    assert!(values_eq("{k: 1, k: 2}", "{k: 2, k: 1}"));
}

#[test]
fn struct_equivalence_laws() {
    let samples = [
        "{}",
        "{a: 1}",
        "{a: 1, a: 1}",
        "{a: 1, b: {c: [1, 2]}}",
        "{b: {c: [1, 2]}, a: 1}",
    ];
    let cmp = comparator();
    for x in samples {
        assert!(values_eq(x, x), "reflexive for {x}");
    }
    for x in samples {
        for y in samples {
            let sx = stream(x);
            let sy = stream(y);
            assert_eq!(
                cmp.events_eq(&sx, 0, &sy, 0),
                cmp.events_eq(&sy, 0, &sx, 0),
                "symmetric for {x} and {y}"
            );
        }
    }
}

#[test]
fn timestamp_equivalence_modes() {
    let utc = stream("2007-08-28T10:30:00Z");
    let shifted = stream("2007-08-28T12:30:00+02:00");

    let field_wise = StreamComparator::new(TsEquality::FieldWise);
    assert!(!field_wise.events_eq(&utc, 0, &shifted, 0));
    assert!(field_wise.events_eq(&utc, 0, &utc, 0));

    let instant = StreamComparator::new(TsEquality::Instant);
    assert!(instant.events_eq(&utc, 0, &shifted, 0));

    // Fraction precision is field-wise significant.
    let coarse = stream("2007-08-28T10:30:00.5Z");
    let fine = stream("2007-08-28T10:30:00.50Z");
    assert!(!field_wise.events_eq(&coarse, 0, &fine, 0));
    assert!(instant.events_eq(&coarse, 0, &fine, 0));
}

#[test]
fn whole_stream_equivalence() {
    let cmp = comparator();
    assert!(cmp.streams_eq(&stream("1 two [3]"), &stream("1 two [3]")));
    assert!(!cmp.streams_eq(&stream("1 two [3]"), &stream("1 two")));
    assert!(!cmp.streams_eq(&stream("1 two"), &stream("1 two [3]")));
}

#[test]
fn materialization_is_idempotent() {
    // Materialize, serialize, re-materialize: the streams are equal.
    let source = "{a: 1, b: [true, 2.5, \"x\"]} sym::(plus 1) 2007-08-28T10:30Z";
    let mut ctx = ion_core::context::DecContext::new(100);
    let document = ion_core::text::parse_document(source, &mut ctx).expect("parse");
    let rendered = ion_core::text::write_document(&document);

    let original = stream(source);
    let round_tripped = stream(&rendered);
    assert!(comparator().streams_eq(&original, &round_tripped), "{rendered}");
}

#[test]
fn equivs_sets_accept_equivalent_members() {
    let cmp = comparator();
    let s = stream("(1 1 1) ({a: 1, b: 2} {b: 2, a: 1})");
    assert!(cmp
        .check_comparison_sets(&s, ComparisonType::Equivs)
        .expect("well-formed"));

    let bad = stream("(1 1 2)");
    assert!(!cmp
        .check_comparison_sets(&bad, ComparisonType::Equivs)
        .expect("well-formed"));
}

#[test]
fn nonequivs_sets_require_pairwise_distinction() {
    let cmp = comparator();
    let s = stream("[1, 2, 3] [1.0, 1.00, 1]");
    assert!(cmp
        .check_comparison_sets(&s, ComparisonType::NonEquivs)
        .expect("well-formed"));

    let bad = stream("[1, 2, 1]");
    assert!(!cmp
        .check_comparison_sets(&bad, ComparisonType::NonEquivs)
        .expect("well-formed"));
}

#[test]
fn embedded_documents_compare_as_streams() {
    // Whitespace-insensitive: "1 " and " 1" parse to the same stream.
    let cmp = comparator();
    let s = stream("embedded_documents::[\"1 \", \" 1\"]");
    assert_eq!(
        s.events()[0].annotations[0],
        IonString::from(EMBEDDED_DOCUMENTS_ANNOTATION)
    );
    assert!(cmp
        .check_comparison_sets(&s, ComparisonType::Equivs)
        .expect("well-formed"));

    let distinct = stream("embedded_documents::[\"{a: 1}\", \"{a: 2}\"]");
    assert!(!cmp
        .check_comparison_sets(&distinct, ComparisonType::Equivs)
        .expect("well-formed"));
    assert!(cmp
        .check_comparison_sets(&distinct, ComparisonType::NonEquivs)
        .expect("well-formed"));
}

#[test]
fn embedded_documents_must_be_strings() {
    let cmp = comparator();
    let s = stream("embedded_documents::[1, 2]");
    assert!(cmp.check_comparison_sets(&s, ComparisonType::Equivs).is_err());
}

#[test]
fn comparison_sets_must_be_sequences() {
    let cmp = comparator();
    let s = stream("{not: a_sequence}");
    assert!(cmp.check_comparison_sets(&s, ComparisonType::Equivs).is_err());
}

mod properties {
    use super::*;
    use quickcheck_macros::quickcheck;

    /// Build a small document from fragment indices so arbitrary inputs
    /// stay parseable.
    fn document_from(seed: Vec<u8>) -> String {
        const FRAGMENTS: [&str; 8] = [
            "1",
            "-2.5",
            "\"text\"",
            "sym",
            "[1, two]",
            "{a: 1, b: [true]}",
            "a::{x: null}",
            "(1 (2))",
        ];
        seed.iter()
            .take(6)
            .map(|b| FRAGMENTS[*b as usize % FRAGMENTS.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[quickcheck]
    fn stream_equivalence_is_reflexive(seed: Vec<u8>) -> bool {
        let text = document_from(seed);
        let s = stream(&text);
        comparator().streams_eq(&s, &s)
    }

    #[quickcheck]
    fn serialization_round_trips(seed: Vec<u8>) -> bool {
        let text = document_from(seed);
        let mut ctx = ion_core::context::DecContext::new(100);
        let document = ion_core::text::parse_document(&text, &mut ctx).expect("parse");
        let rendered = ion_core::text::write_document(&document);
        comparator().streams_eq(&stream(&text), &stream(&rendered))
    }
}
