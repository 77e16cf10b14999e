//! Arbitrary field layouts shared by the decoder fuzz targets.

use arbitrary::Arbitrary;
use binstash_decoder::{Builder, WordSpec};

/// One field declaration. Sizes are either small literals or refer back
/// to an earlier key, so unresolved and non-numeric sizes get exercised.
#[derive(Arbitrary, Clone, Debug)]
pub enum Field {
    Word { key: u8, spec: u8 },
    Buffer { key: u8, size: Size },
    Str { key: u8, size: Size },
    StrToEnd { key: u8 },
    CString { key: u8 },
    CStringSized { key: u8, size: Size },
    Skip { size: Size },
    Scan { key: u8, delimiter: Vec<u8> },
    Nest { key: u8, body: Vec<Field> },
    Peek { body: Vec<Field> },
    Repeat { body: Vec<Field>, max: u8 },
}

#[derive(Arbitrary, Debug, Clone)]
pub enum Size {
    Literal(u8),
    Key(u8),
}

impl Size {
    fn to_size(&self) -> binstash_decoder::Size {
        match self {
            Size::Literal(n) => usize::from(*n).into(),
            Size::Key(k) => key(*k).into(),
        }
    }
}

// A handful of keys, some dotted, so fields collide and nest.
fn key(k: u8) -> String {
    ["a", "b", "c", "a.x", "a.y", "d.e.f", "len", "n"][usize::from(k % 8)].to_owned()
}

fn word_spec(s: u8) -> WordSpec {
    [
        WordSpec::U8,
        WordSpec::I8,
        WordSpec::U16_LE,
        WordSpec::I16_BE,
        WordSpec::U24_BE,
        WordSpec::I32_LE,
        WordSpec::U64_BE,
        WordSpec::I64_LE,
    ][usize::from(s % 8)]
}

pub fn declare<B: Builder>(builder: &mut B, fields: Vec<Field>, depth: u8) {
    for field in fields {
        match field {
            Field::Word { key: k, spec } => {
                builder.word(key(k), word_spec(spec));
            }
            Field::Buffer { key: k, size } => {
                builder.buffer(key(k), size.to_size());
            }
            Field::Str { key: k, size } => {
                builder.string(key(k), size.to_size());
            }
            Field::StrToEnd { key: k } => {
                builder.string_to_end(key(k));
            }
            Field::CString { key: k } => {
                builder.cstring(key(k));
            }
            Field::CStringSized { key: k, size } => {
                builder.cstring_sized(key(k), size.to_size());
            }
            Field::Skip { size } => {
                builder.skip(size.to_size());
            }
            Field::Scan { key: k, delimiter } => {
                builder.scan(key(k), delimiter);
            }
            Field::Nest { key: k, body } if depth < 4 => {
                builder.nest(key(k), move |h| declare(h, body, depth + 1));
            }
            Field::Peek { body } if depth < 4 => {
                builder.peek(move |h| declare(h, body, depth + 1));
            }
            Field::Repeat { body, max } if depth < 4 => {
                builder.repeat(move |h, ctl| {
                    if ctl.iteration() >= usize::from(max % 8) {
                        ctl.end();
                    }
                    declare(h, body.clone(), depth + 1);
                });
            }
            _ => {}
        }
    }
}
