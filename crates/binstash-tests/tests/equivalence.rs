//! Streaming and one-shot parsing must agree.
//!
//! Every layout here is parsed once from the whole buffer and then again
//! through a stream at every chunk size from one byte up to the full
//! length. Any divergence points at state lost or duplicated across a
//! chunk boundary.

use binstash_decoder::{Builder, Value, WordSpec};
use binstash_tests::{encode_records, parse_chunked, parse_oneshot, record_layout};
use pretty_assertions::assert_eq;

/// Parse `$input` with the layout body both ways at every chunk size and
/// evaluate to the one-shot stash. The body is expanded once per parser
/// type because [`Builder`] is implemented separately for each.
macro_rules! assert_equivalent {
    ($input:expr, |$b:ident| $body:block) => {{
        let input: &[u8] = $input;
        let expected = parse_oneshot(input, |$b| $body);
        for chunk in 1..=input.len().max(1) {
            let streamed = parse_chunked(input, chunk, |$b| $body);
            assert_eq!(streamed, expected, "chunk size {chunk}");
        }
        expected
    }};
}

#[test]
fn flat_words() {
    let vars = assert_equivalent!(&[5, 80, 0, 11, 184], |b| {
        b.word("count", WordSpec::U8)
            .word("ports.src", WordSpec::U16_LE)
            .word("ports.dst", WordSpec::U16_BE);
    });
    assert_eq!(vars.lookup("ports.src"), Some(&Value::Number(80.0)));
    assert_eq!(vars.lookup("ports.dst"), Some(&Value::Number(3000.0)));
}

#[test]
fn record_list_with_loop_and_nest() {
    let input = encode_records(&[(1, "a", 0), (300, "longer name", 7), (9, "", 1)], "trailer");
    let vars = assert_equivalent!(&input, |b| {
        record_layout(b);
    });
    assert_eq!(vars.lookup("records.1.id"), Some(&Value::Number(300.0)));
    assert_eq!(vars.lookup("records.2.name"), Some(&Value::from("")));
}

#[test]
fn truncated_input() {
    let input = encode_records(&[(1, "abcdef", 0)], "t");
    let cut = &input[..6];
    let vars = assert_equivalent!(cut, |b| {
        record_layout(b);
    });
    assert_eq!(vars.lookup("records.0.name"), Some(&Value::Null));
}

#[test]
fn tap_with_dynamic_sizes() {
    let vars = assert_equivalent!(b"\x02\x03\x01abcXY", |b| {
        b.word("a", WordSpec::U8).word("b", WordSpec::U8).tap(|h| {
            let size = |key| h.get(key).and_then(Value::as_u64).and_then(|n| usize::try_from(n).ok());
            let (second, first) = (size("a").unwrap_or(0), size("b").unwrap_or(0));
            h.skip(1).buffer("first", first).string("second", second);
        });
    });
    assert_eq!(vars.lookup("first"), Some(&Value::from(&b"abc"[..])));
    assert_eq!(vars.lookup("second"), Some(&Value::from("XY")));
}

#[test]
fn peek_then_dispatch() {
    let vars = assert_equivalent!(b"\x02\x00\x05hello rest", |b| {
        b.peek(|h| {
            h.word("version", WordSpec::U8);
        })
        .tap(|h| {
            if h.get("version").and_then(Value::as_u64) == Some(2) {
                h.skip(1).word("len", WordSpec::U16_BE).string("body", "len");
            }
        })
        .string_to_end("rest");
    });
    assert_eq!(vars.lookup("body"), Some(&Value::from("hello")));
    assert_eq!(vars.lookup("rest"), Some(&Value::from(" rest")));
}

#[test]
fn scan_records_until_input_ends() {
    let vars = assert_equivalent!(b"GET /\r\nHost: x\r\n\r\n", |b| {
        b.scan("request", b"\r\n").repeat(|h, ctl| {
            let index = ctl.iteration();
            h.scan(format!("headers.{index}"), b"\r\n");
        });
    });
    assert_eq!(vars.lookup("request"), Some(&Value::from(&b"GET /"[..])));
    assert_eq!(vars.lookup("headers.0"), Some(&Value::from(&b"Host: x"[..])));
    assert_eq!(vars.lookup("headers.1"), Some(&Value::from(&b""[..])));
}

#[test]
fn cstrings_sized_and_unsized() {
    assert_equivalent!(b"ab\0cd\0\0\0efg", |b| {
        b.cstring("one").cstring_sized("two", 5).cstring("three").cstring("four");
    });
}
