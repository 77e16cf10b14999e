//! One-shot parsing over complete and truncated buffers.
//!
//! The JSON rendering of the stash is pinned with inline insta snapshots:
//! it shows nesting, key order and null placement in one line, which is
//! exactly what a layout regression would change.

use binstash_decoder::{Builder, DecodeError, Parser, Value, WordSpec};
use binstash_tests::{encode_records, parse_oneshot, record_layout};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

fn json(stash: &binstash_decoder::Stash) -> String {
    serde_json::to_string(stash).unwrap()
}

// ── Words and dotted keys ────────────────────────────────────────────────────

#[test]
fn header_with_nested_ports() {
    // 0x0050 little-endian, 0x0BB8 big-endian.
    let vars = parse_oneshot(&[5, 80, 0, 11, 184], |p| {
        p.word("count", WordSpec::U8)
            .word("ports.src", WordSpec::U16_LE)
            .word("ports.dst", WordSpec::U16_BE);
    });
    assert_snapshot!(json(&vars), @r#"{"count":5,"ports":{"src":80,"dst":3000}}"#);
}

#[test]
fn byte_order_matters_for_the_same_bytes() {
    let vars = parse_oneshot(&[0, 80, 0, 80], |p| {
        p.word("le", WordSpec::U16_LE).word("be", WordSpec::U16_BE);
    });
    assert_snapshot!(json(&vars), @r#"{"le":20480,"be":80}"#);
}

#[test]
fn signed_words_at_every_width() {
    let input = [0xFF, 0xFE, 0xFF, 0xFF, 0xFF, 0x7F, 0x00, 0x00, 0x00, 0x80];
    let vars = parse_oneshot(&input, |p| {
        p.word("a", WordSpec::I8)
            .word("b", WordSpec::I16_LE)
            .word("c", "word24ls".parse().unwrap())
            .word("d", WordSpec::I32_LE);
    });
    assert_snapshot!(json(&vars), @r#"{"a":-1,"b":-2,"c":8388607,"d":-2147483648}"#);
}

// ── Truncation ───────────────────────────────────────────────────────────────

#[test]
fn truncated_input_yields_nulls_not_errors() {
    let vars = parse_oneshot(&[1, 2, 3], |p| {
        p.word("a", WordSpec::U8)
            .word("b", WordSpec::U32_LE)
            .buffer("c", 2)
            .string("d", 1);
    });
    assert_snapshot!(json(&vars), @r#"{"a":1,"b":null,"c":null,"d":null}"#);
}

#[test]
fn truncated_record_list() {
    let full = encode_records(&[(1, "alpha", 0), (2, "beta", 1)], "end");
    let cut = &full[..full.len() - 8];
    let vars = parse_oneshot(cut, |p| record_layout(p));

    assert_eq!(vars.lookup("records.0.name"), Some(&Value::from("alpha")));
    assert_eq!(vars.lookup("records.1.id"), Some(&Value::Number(2.0)));
    assert_eq!(vars.lookup("records.1.name"), Some(&Value::Null));
    assert_eq!(vars.lookup("records.1.flags"), Some(&Value::Null));
    assert_eq!(vars.lookup("trailer"), Some(&Value::Null));
}

// ── Strings ──────────────────────────────────────────────────────────────────

#[test]
fn cstrings_sized_and_unsized() {
    let vars = parse_oneshot(b"bob\0pad\0\0\0\0\0tail", |p| {
        p.cstring("name").cstring_sized("fixed", 8).cstring("rest");
    });
    // The last string has no terminator, so its final byte is dropped.
    assert_snapshot!(json(&vars), @r#"{"name":"bob","fixed":"pad","rest":"tai"}"#);
}

#[test]
fn unsized_cstring_with_nothing_left_is_null() {
    let vars = parse_oneshot(b"x\0", |p| {
        p.cstring("a").cstring("b");
    });
    assert_eq!(vars.lookup("a"), Some(&Value::from("x")));
    assert_eq!(vars.lookup("b"), Some(&Value::Null));
}

#[test]
fn string_to_end_takes_the_rest() {
    let vars = parse_oneshot(b"\x03hi there", |p| {
        p.word("len", WordSpec::U8).skip("len").string_to_end("rest");
    });
    assert_eq!(vars.lookup("rest"), Some(&Value::from("there")));
}

#[test]
fn scan_without_delimiter_takes_the_rest() {
    let vars = parse_oneshot(b"k=v;tail", |p| {
        p.scan("pair", b";").scan("more", b";");
    });
    assert_eq!(vars.lookup("pair"), Some(&Value::from(&b"k=v"[..])));
    assert_eq!(vars.lookup("more"), Some(&Value::from(&b"tail"[..])));
}

// ── Callbacks ────────────────────────────────────────────────────────────────

#[test]
fn nest_resolves_sizes_from_outer_scope() {
    let vars = parse_oneshot(b"\x03abc\x01", |p| {
        p.word("len", WordSpec::U8)
            .nest("body", |h| {
                h.string("text", "len");
            })
            .word("after", WordSpec::U8);
    });
    assert_snapshot!(json(&vars), @r#"{"len":3,"body":{"text":"abc"},"after":1}"#);
}

#[test]
fn tap_chooses_layout_from_parsed_value() {
    let layout = |p: &mut Parser<'_>| {
        p.word("kind", WordSpec::U8).tap(|h| {
            if h.get("kind").and_then(Value::as_u64) == Some(1) {
                h.word("value", WordSpec::U16_BE);
            } else {
                h.cstring("value");
            }
        });
    };
    let vars = parse_oneshot(b"\x01\x01\x00", layout);
    assert_eq!(vars.lookup("value"), Some(&Value::Number(256.0)));
    let vars = parse_oneshot(b"\x02ok\0", layout);
    assert_eq!(vars.lookup("value"), Some(&Value::from("ok")));
}

#[test]
fn peek_reads_the_same_bytes_twice() {
    let mut parser = Parser::new(&[0x12, 0x34, 0x56]);
    parser
        .peek(|h| {
            h.word("magic", WordSpec::U8);
        })
        .word("whole", WordSpec::U16_BE);
    assert_eq!(parser.tell(), 2);
    let vars = parser.finish().unwrap();
    assert_eq!(vars.lookup("magic"), Some(&Value::Number(18.0)));
    assert_eq!(vars.lookup("whole"), Some(&Value::Number(f64::from(0x1234))));
}

#[test]
fn record_list_round_trips() {
    let input = encode_records(&[(7, "one", 1), (8, "two", 2), (9, "three", 3)], "fin");
    let vars = parse_oneshot(&input, |p| record_layout(p));
    assert_snapshot!(
        json(&vars),
        @r#"{"count":3,"records":{"0":{"id":7,"len":3,"name":"one","flags":1},"1":{"id":8,"len":3,"name":"two","flags":2},"2":{"id":9,"len":5,"name":"three","flags":3}},"trailer":"fin"}"#
    );
}

#[test]
fn empty_record_list() {
    let input = encode_records(&[], "x");
    let vars = parse_oneshot(&input, |p| record_layout(p));
    assert_eq!(vars.lookup("count"), Some(&Value::Number(0.0)));
    assert!(vars.lookup("records").is_none());
    assert_eq!(vars.lookup("trailer"), Some(&Value::from("x")));
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[test]
fn missing_size_key_stops_the_parse() {
    let mut parser = Parser::new(&[1, 2, 3]);
    parser.word("a", WordSpec::U8).buffer("b", "nope").word("c", WordSpec::U8);
    assert_eq!(parser.tell(), 1);
    let err = parser.finish().unwrap_err();
    assert!(matches!(err, DecodeError::UnresolvedSize { ref key } if key == "nope"));
    assert_eq!(err.to_string(), "size refers to unknown key \"nope\"");
}

#[test]
fn negative_length_from_input_is_not_fatal() {
    let mut parser = Parser::new(&[0xFF, 1, 2, 3, 4]);
    parser
        .word("len", WordSpec::I8)
        .buffer("body", "len")
        .word("after", WordSpec::U8);
    assert_eq!(parser.tell(), 2);
    assert!(parser.error().is_none());
    let vars = parser.finish().unwrap();
    assert_snapshot!(json(&vars), @r#"{"len":-1,"body":null,"after":1}"#);
}

#[test]
fn string_size_key_is_a_declaration_error() {
    let mut parser = Parser::new(b"ab..");
    parser.string("name", 2).buffer("body", "name");
    assert!(matches!(
        parser.finish(),
        Err(DecodeError::InvalidSize { found: "string", .. })
    ));
}

#[test]
fn custom_separator() {
    use binstash_decoder::DecoderConfig;

    let config = DecoderConfig {
        separator: '/',
        ..DecoderConfig::default()
    };
    let mut parser = Parser::with_config(&[1, 2], config);
    parser.word("a/b", WordSpec::U8).word("a.c", WordSpec::U8);
    let vars = parser.finish().unwrap();
    assert_snapshot!(json(&vars), @r#"{"a":{"b":1},"a.c":2}"#);
}
