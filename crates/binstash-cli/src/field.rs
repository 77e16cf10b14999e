//! Command-line field specs (`word16lu:ports.src`, `buffer:body:len`, ...).
//!
//! A spec is parsed once into a [`FieldSpec`] and then replayed onto any
//! [`Builder`], so the one-shot and streaming paths see identical layouts.
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use binstash_decoder::{Builder, Size};
use binstash_wire::WordSpec;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSpec {
    Word { key: String, spec: WordSpec },
    Buffer { key: String, size: Size },
    Str { key: String, size: Option<Size> },
    CString { key: String, size: Option<Size> },
    Skip { size: Size },
    Scan { key: String, delimiter: Vec<u8> },
}

impl FieldSpec {
    /// Declare this field on `builder`.
    pub fn apply<B: Builder>(&self, builder: &mut B) {
        match self {
            Self::Word { key, spec } => {
                builder.word(key, *spec);
            }
            Self::Buffer { key, size } => {
                builder.buffer(key, size.clone());
            }
            Self::Str { key, size: Some(size) } => {
                builder.string(key, size.clone());
            }
            Self::Str { key, size: None } => {
                builder.string_to_end(key);
            }
            Self::CString { key, size: Some(size) } => {
                builder.cstring_sized(key, size.clone());
            }
            Self::CString { key, size: None } => {
                builder.cstring(key);
            }
            Self::Skip { size } => {
                builder.skip(size.clone());
            }
            Self::Scan { key, delimiter } => {
                builder.scan(key, delimiter);
            }
        }
    }
}

impl FromStr for FieldSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let key = parts.next();
        let arg = parts.next();

        let need_key = |what: &str| -> Result<String> {
            match key {
                Some(k) if !k.is_empty() => Ok(k.to_owned()),
                _ => Err(anyhow!("field {s:?}: {what} needs a key")),
            }
        };

        let field = match kind {
            "buffer" => Self::Buffer {
                key: need_key("buffer")?,
                size: parse_size(arg.ok_or_else(|| anyhow!("field {s:?}: buffer needs a size"))?),
            },
            "string" => Self::Str {
                key: need_key("string")?,
                size: arg.map(parse_size),
            },
            "cstring" => Self::CString {
                key: need_key("cstring")?,
                size: arg.map(parse_size),
            },
            // `skip:4` puts the size where the key would be.
            "skip" => Self::Skip {
                size: parse_size(
                    arg.or(key)
                        .filter(|raw| !raw.is_empty())
                        .ok_or_else(|| anyhow!("field {s:?}: skip needs a size"))?,
                ),
            },
            "scan" => {
                let delimiter = unescape(arg.ok_or_else(|| anyhow!("field {s:?}: scan needs a delimiter"))?);
                if delimiter.is_empty() {
                    bail!("field {s:?}: scan delimiter is empty");
                }
                Self::Scan {
                    key: need_key("scan")?,
                    delimiter,
                }
            }
            word if word.starts_with("word") => {
                if arg.is_some() {
                    bail!("field {s:?}: words take no size");
                }
                Self::Word {
                    key: need_key("word")?,
                    spec: word.parse()?,
                }
            }
            other => bail!("field {s:?}: unknown kind {other:?}"),
        };
        Ok(field)
    }
}

fn parse_size(raw: &str) -> Size {
    raw.parse::<usize>().map_or_else(|_| Size::from(raw), Size::Literal)
}

/// Decode `\r`, `\n`, `\t`, `\0`, `\\` and `\xHH` escapes.
fn unescape(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'r') => out.push(b'\r'),
            Some(b'n') => out.push(b'\n'),
            Some(b't') => out.push(b'\t'),
            Some(b'0') => out.push(0),
            Some(b'x') => {
                let hi = bytes.next();
                let lo = bytes.next();
                let hex = [hi, lo].into_iter().flatten().map(char::from).collect::<String>();
                match u8::from_str_radix(&hex, 16) {
                    Ok(v) if hex.len() == 2 => out.push(v),
                    _ => {
                        out.extend_from_slice(b"\\x");
                        out.extend_from_slice(hex.as_bytes());
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push(b'\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> FieldSpec {
        s.parse().unwrap()
    }

    #[test]
    fn parses_words() {
        assert_eq!(
            parse("word16lu:ports.src"),
            FieldSpec::Word {
                key: "ports.src".into(),
                spec: WordSpec::U16_LE
            }
        );
    }

    #[test]
    fn parses_sizes_as_literal_or_key() {
        assert_eq!(
            parse("buffer:body:12"),
            FieldSpec::Buffer {
                key: "body".into(),
                size: Size::Literal(12)
            }
        );
        assert_eq!(
            parse("buffer:body:len"),
            FieldSpec::Buffer {
                key: "body".into(),
                size: Size::Key("len".into())
            }
        );
    }

    #[test]
    fn string_without_size_reads_to_end() {
        assert_eq!(
            parse("string:rest"),
            FieldSpec::Str {
                key: "rest".into(),
                size: None
            }
        );
    }

    #[test]
    fn skip_takes_size_in_key_position() {
        assert_eq!(parse("skip:4"), FieldSpec::Skip { size: Size::Literal(4) });
        assert_eq!(parse("skip::len"), FieldSpec::Skip { size: Size::Key("len".into()) });
    }

    #[test]
    fn scan_unescapes_delimiter() {
        assert_eq!(
            parse(r"scan:line:\r\n"),
            FieldSpec::Scan {
                key: "line".into(),
                delimiter: b"\r\n".to_vec()
            }
        );
        assert_eq!(
            parse(r"scan:rec:\x1e"),
            FieldSpec::Scan {
                key: "rec".into(),
                delimiter: vec![0x1e]
            }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        for spec in ["buffer:body", "word16:x", "nope:x", "string", "scan:x:", "word8:x:3"] {
            assert!(spec.parse::<FieldSpec>().is_err(), "{spec} should fail");
        }
    }
}
