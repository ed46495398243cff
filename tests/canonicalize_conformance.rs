//! Behavioural tests for `canonicalize`.
//!
//! Covers idempotence, key ordering, round-trip value equality, the error
//! taxonomy, check mode and schema gating.

use pretty_assertions::assert_eq;
use yaml_sort::schema::Schema;
use yaml_sort::yaml::{load, Limits, YamlValue};
use yaml_sort::{canonicalize, canonicalize_str, ErrorKind, Options};

fn sort(input: &str) -> String {
    canonicalize_str(input, &Options::default()).unwrap()
}

fn sort_with(input: &str, options: &Options) -> String {
    canonicalize_str(input, options).unwrap()
}

fn load_default(text: &str) -> YamlValue {
    load(text, Schema::DefaultSafe, &Limits::default()).unwrap()
}

const SAMPLES: &[&str] = &[
    "b: 1\na: 2\n",
    "z: {b: 1, a: 2}\na: 3\n",
    "list:\n  - c: 1\n    a: 2\n  - [3, 2, 1]\n  - plain\n",
    "? [b, a]\n: complex\nx: y\n",
    "anchors:\n  base: &b {y: 1, x: 2}\n  copy: *b\n",
    "merged:\n  <<: {c: 1, b: 2}\n  a: 3\n",
    "strings:\n  quoted: 'true'\n  number: '0x1F'\n  date: '2001-12-14'\n  empty: ''\n  colon: 'a: b'\n",
    "multi: |\n  line one\n  line two\nfolded: >\n  folded\n  text\n",
    "types:\n  int: 0o17\n  hex: 0x1f\n  float: 1_000.5\n  inf: -.inf\n  nul: ~\n  bool: TRUE\n",
    "when: 2001-12-14t21:59:43.10-05:00\nday: 2002-12-14\n",
    "bin: !!binary |\n  aGVsbG8gd29ybGQ=\n",
    "set: !!set {b, a}\nomap: !!omap [{b: 1}, {a: 2}]\npairs: !!pairs [{x: 1}, {x: 2}]\n",
    "unicode:\n  \u{1F600}: emoji\n  \u{FF61}: halfwidth\n  \u{e9}: accent\n",
    "ctrl: \"bell\\a\\ttab\"\n",
    "keys:\n  10: ten\n  9: nine\n  '9': string nine\n  true: yes\n  null: nothing\n",
    "- b: 1\n  a: 2\n- - x\n  - y\n- {}\n- []\n",
    "scalar document\n",
    "lead: |2\n    indented first line\n  second\n",
    "keep: |+\n  text\n\n\nnext: 1\n",
];

// ============================================================================
// Testable properties
// ============================================================================

#[test]
fn test_idempotence() {
    for input in SAMPLES {
        let once = sort(input);
        let twice = sort(&once);
        assert_eq!(once, twice, "not idempotent for input {:?}", input);
    }
}

#[test]
fn test_round_trip_value_equality() {
    for input in SAMPLES {
        let original = load_default(input);
        let canonical = load_default(&sort(input));
        assert!(
            original.eq_unordered(&canonical),
            "value changed for input {:?}: {:?} vs {:?}",
            input,
            original,
            canonical
        );
    }
}

#[test]
fn test_sort_correctness() {
    let out = sort("c: 1\nb: {z: 1, y: 2, x: 3}\na: [3, 1, 2]\n");
    assert_eq!(out, "a:\n  - 3\n  - 1\n  - 2\nb:\n  x: 3\n  y: 2\n  z: 1\nc: 1\n");
}

#[test]
fn test_nested_sort_scenario() {
    assert_eq!(sort("{z: {b: 1, a: 2}, a: 3}"), "a: 3\nz:\n  a: 2\n  b: 1\n");
}

#[test]
fn test_sequence_order_preserved() {
    assert_eq!(sort("- c\n- a\n- b\n"), "- c\n- a\n- b\n");
}

#[test]
fn test_utf16_key_order() {
    // U+1F600 is a surrogate pair starting 0xD83D and sorts before U+FF61.
    assert_eq!(
        sort("\u{FF61}: 1\n\u{1F600}: 2\n"),
        "\u{1F600}: 2\n\u{FF61}: 1\n"
    );
}

#[test]
fn test_non_string_keys_sort_by_text() {
    assert_eq!(sort("b: 1\n10: 2\n9: 3\n"), "10: 2\n9: 3\nb: 1\n");
}

#[test]
fn test_determinism() {
    let input = "z: 1\ny: [b, a]\nx: {d: 1, c: 2}\n";
    let first = canonicalize(input.as_bytes(), &Options::default()).unwrap();
    for _ in 0..10 {
        assert_eq!(canonicalize(input.as_bytes(), &Options::default()).unwrap(), first);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_input_error() {
    for options in [Options::default(), Options::check(), Options::default().with_safe(false)] {
        let err = canonicalize(b"", &options.with_filename("f.yml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert_eq!(err.kind().name(), "EmptyInputError");
        assert_eq!(err.filename(), Some("f.yml"));
    }
}

#[test]
fn test_invalid_schema_name() {
    let err = Options::default()
        .with_schema_name("not_a_real_schema")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    assert_eq!(err.kind().name(), "InvalidSchemaError");
}

#[test]
fn test_schema_names_case_insensitive() {
    for name in [
        "default_safe_schema",
        "DEFAULT_FULL_SCHEMA",
        "Core_Schema",
        "json_schema",
        "FAILSAFE_SCHEMA",
    ] {
        assert!(Options::default().with_schema_name(name).is_ok(), "{}", name);
    }
}

#[test]
fn test_parse_errors() {
    let options = Options::default().with_filename("bad.yml");
    for input in [
        "a: [1, 2\n",
        "a: 1\na: 2\n",
        "a: *missing\n",
        "--- a\n--- b\n",
        "# only a comment\n",
        "a: !custom x\n",
        "a: !!int abc\n",
    ] {
        let err = canonicalize(input.as_bytes(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "input {:?}", input);
        assert_eq!(err.filename(), Some("bad.yml"));
        assert!(err.to_string().starts_with("bad.yml: "), "{}", err);
    }
}

// ============================================================================
// Check mode
// ============================================================================

#[test]
fn test_check_ordered_detection() {
    let options = Options::check();
    let err = canonicalize(b"{b: 1, a: 2}", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSorted);
    assert_eq!(err.kind().name(), "NotSortedError");

    let out = canonicalize(b"{a: 2, b: 1}", &options).unwrap();
    assert_eq!(out, b"a: 2\nb: 1\n");
}

#[test]
fn test_check_ordered_nested() {
    let options = Options::check();
    assert!(canonicalize(b"a: 1\nz:\n  b: 1\n  a: 2\n", &options).is_err());
    assert!(canonicalize(b"a: 1\nz:\n  a: 2\n  b: 1\n", &options).is_ok());
}

#[test]
fn test_check_output_matches_sort_output() {
    let input = b"a:\n  - y: 1\n    z: 2\nb: 'quoted'\n";
    assert_eq!(
        canonicalize(input, &Options::check()).unwrap(),
        canonicalize(input, &Options::default()).unwrap()
    );
}

// ============================================================================
// Schema gating
// ============================================================================

#[test]
fn test_schema_gating() {
    let input = b"fn: !!js/function 'function () { return 1 }'\n";
    let err = canonicalize(input, &Options::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let out = canonicalize(input, &Options::default().with_safe(false)).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "fn: !<tag:yaml.org,2002:js/function> function () { return 1 }\n"
    );

    let full = Options::default().with_schema(Schema::DefaultFull);
    assert!(canonicalize(input, &full).is_ok());
}

#[test]
fn test_safe_schema_rejected_explicitly_even_when_unsafe() {
    let options = Options::default()
        .with_safe(false)
        .with_schema(Schema::DefaultSafe);
    let err = canonicalize(b"r: !!js/regexp /x/\n", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_schema_controls_quoting() {
    let input = "a: 'true'\nb: 'null'\nc: '0x10'\nd: '2001-12-14'\n";
    assert_eq!(sort(input), "a: 'true'\nb: 'null'\nc: '0x10'\nd: '2001-12-14'\n");

    let json = Options::default().with_schema(Schema::Json);
    assert_eq!(sort_with(input, &json), "a: 'true'\nb: 'null'\nc: 0x10\nd: 2001-12-14\n");

    let failsafe = Options::default().with_schema(Schema::Failsafe);
    assert_eq!(sort_with(input, &failsafe), "a: true\nb: null\nc: 0x10\nd: 2001-12-14\n");
}

#[test]
fn test_core_schema_has_no_timestamps() {
    let core = Options::default().with_schema(Schema::Core);
    assert_eq!(sort_with("d: 2001-12-14\n", &core), "d: 2001-12-14\n");
    assert!(canonicalize(b"d: !!timestamp 2001-12-14\n", &core).is_err());
}

#[test]
fn test_json_overflowing_floats_round_trip() {
    let json = Options::default().with_schema(Schema::Json);
    let input = "b: -1e400\na: 1e400\n";
    let output = sort_with(input, &json);
    assert_eq!(output, "a: 1e400\nb: '-1e400'\n");

    let before = load(input, Schema::Json, &Limits::default()).unwrap();
    let after = load(&output, Schema::Json, &Limits::default()).unwrap();
    assert!(before.eq_unordered(&after));
    assert_eq!(after.get("a"), Some(&YamlValue::from("1e400")));

    // Schemas with `.inf` keep the overflow as a float
    assert_eq!(sort("a: 1e400\n"), "a: .inf\n");
}

// ============================================================================
// Emitter details
// ============================================================================

#[test]
fn test_type_normalization() {
    assert_eq!(
        sort("hex: 0x1f\noct: 0o17\nbool: TRUE\nnul: ~\nflt: 1_000.5\nsexa: 1:30\n"),
        "bool: true\nflt: 1000.5\nhex: 31\nnul: null\noct: 15\nsexa: 90\n"
    );
}

#[test]
fn test_timestamps_normalized_to_utc() {
    assert_eq!(
        sort("t: 2001-12-14t21:59:43.10-05:00\nd: 2002-12-14\n"),
        "d: 2002-12-14T00:00:00Z\nt: 2001-12-15T02:59:43.100Z\n"
    );
}

#[test]
fn test_aliases_expand() {
    assert_eq!(
        sort("a: &x {k: v}\nb: *x\n"),
        "a:\n  k: v\nb:\n  k: v\n"
    );
}

#[test]
fn test_merge_keys() {
    assert_eq!(
        sort("base: &b {x: 1, y: 2}\nderived:\n  <<: *b\n  y: 3\n"),
        "base:\n  x: 1\n  y: 2\nderived:\n  x: 1\n  y: 3\n"
    );
}

#[test]
fn test_empty_values() {
    assert_eq!(
        sort("e: {}\nl: []\nn:\ns: ''\n"),
        "e: {}\nl: []\nn: null\ns: ''\n"
    );
}

#[test]
fn test_literal_and_folded_input() {
    assert_eq!(
        sort("b: >\n  one\n  two\na: |\n  x\n  y\n"),
        "a: |\n  x\n  y\nb: |\n  one two\n"
    );
}

#[test]
fn test_line_width_folds_long_strings() {
    let options = Options::default().with_line_width(20);
    let input = "text: the quick brown fox jumps over the lazy dog\n";
    let out = sort_with(input, &options);
    assert_eq!(out, "text: >-\n  the quick brown fox\n  jumps over the lazy\n  dog\n");
    assert_eq!(load_default(&out), load_default(input));
}

#[test]
fn test_bom_stripped() {
    assert_eq!(
        canonicalize("\u{FEFF}b: 1\na: 2\n".as_bytes(), &Options::default()).unwrap(),
        b"a: 2\nb: 1\n"
    );
}
