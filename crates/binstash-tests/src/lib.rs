//! Shared fixtures for the integration tests and benches.
//!
//! Every layout here is written against the [`Builder`] trait so the same
//! function can be replayed on a one-shot [`Parser`] and a
//! [`StreamParser`], which is what the equivalence tests rely on.

use binstash_decoder::{Builder, Parser, Stash, StreamParser, Value, WordSpec};
use binstash_wire::encode_word;

/// A length-prefixed record list:
///
/// ```text
/// count:u8 { id:u16be  len:u8  name:[len]  flags:u8 } × count  trailer:cstring
/// ```
pub fn record_layout<B: Builder>(builder: &mut B) {
    builder.word("count", WordSpec::U8).repeat(|h, ctl| {
        let total = h.get("count").and_then(Value::as_u64).unwrap_or(0);
        let index = ctl.iteration();
        if u64::try_from(index + 1).unwrap_or(u64::MAX) >= total {
            ctl.end();
        }
        if total == 0 {
            return;
        }
        h.nest(format!("records.{index}"), |r| {
            r.word("id", WordSpec::U16_BE)
                .word("len", WordSpec::U8)
                .string("name", "len")
                .word("flags", WordSpec::U8);
        });
    });
    builder.cstring("trailer");
}

/// Encode records in the shape [`record_layout`] reads.
#[must_use]
pub fn encode_records(records: &[(u16, &str, u8)], trailer: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_word(i64::try_from(records.len()).unwrap_or(0), WordSpec::U8, &mut out);
    for &(id, name, flags) in records {
        encode_word(i64::from(id), WordSpec::U16_BE, &mut out);
        encode_word(i64::try_from(name.len()).unwrap_or(0), WordSpec::U8, &mut out);
        out.extend_from_slice(name.as_bytes());
        encode_word(i64::from(flags), WordSpec::U8, &mut out);
    }
    out.extend_from_slice(trailer.as_bytes());
    out.push(0);
    out
}

/// Parse `input` in one shot with `layout`.
///
/// # Panics
///
/// If the layout raises a decode error.
pub fn parse_oneshot(input: &[u8], layout: impl FnOnce(&mut Parser<'_>)) -> Stash {
    let mut parser = Parser::new(input);
    layout(&mut parser);
    parser.finish().expect("one-shot parse failed")
}

/// Parse `input` through a stream in chunks of `chunk` bytes with `layout`.
///
/// # Panics
///
/// If the layout raises a decode error.
pub fn parse_chunked(input: &[u8], chunk: usize, layout: impl FnOnce(&mut StreamParser)) -> Stash {
    let mut stream = StreamParser::new();
    layout(&mut stream);
    for piece in input.chunks(chunk.max(1)) {
        stream.write(piece).expect("stream write failed");
    }
    stream.finish().expect("stream parse failed")
}
