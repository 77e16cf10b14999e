use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// Width of a fixed-size integer field.
///
/// Only these five widths exist on the wire. 24-bit words show up in
/// audio and some packed network headers, so they get a slot even though
/// Rust has no native `u24`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldWidth {
    W8,
    W16,
    W24,
    W32,
    W64,
}

impl FieldWidth {
    /// Width in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W24 => 24,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Width in bytes (`bits / 8`), always 1 through 8.
    #[must_use]
    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Look up a width from a bit count.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::W8),
            16 => Some(Self::W16),
            24 => Some(Self::W24),
            32 => Some(Self::W32),
            64 => Some(Self::W64),
            _ => None,
        }
    }
}

/// Byte order used to assemble a word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first (network order).
    Big,
}

/// Whether the top bit of a word is a two's-complement sign bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signedness {
    Unsigned,
    Signed,
}

/// Complete description of a fixed-width word: width, byte order, sign.
///
/// This is the key that every legacy alias (`word16lu`, `word32bs`, ...)
/// reduces to. The constants below cover the combinations most layouts
/// need; anything else is built with [`WordSpec::new`].
///
/// ```text
/// ┌──────────┬───────┬────────┬──────────┐
/// │ Constant │ Width │ Order  │ Sign     │
/// ├──────────┼───────┼────────┼──────────┤
/// │ U8       │ 8     │ big    │ unsigned │
/// │ I8       │ 8     │ big    │ signed   │
/// │ U16_LE   │ 16    │ little │ unsigned │
/// │ U16_BE   │ 16    │ big    │ unsigned │
/// │ ...      │       │        │          │
/// │ I64_BE   │ 64    │ big    │ signed   │
/// └──────────┴───────┴────────┴──────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WordSpec {
    pub width: FieldWidth,
    pub order: ByteOrder,
    pub sign: Signedness,
}

impl WordSpec {
    pub const U8: Self = Self::new(FieldWidth::W8, ByteOrder::Big, Signedness::Unsigned);
    pub const I8: Self = Self::new(FieldWidth::W8, ByteOrder::Big, Signedness::Signed);
    pub const U16_LE: Self = Self::new(FieldWidth::W16, ByteOrder::Little, Signedness::Unsigned);
    pub const U16_BE: Self = Self::new(FieldWidth::W16, ByteOrder::Big, Signedness::Unsigned);
    pub const I16_LE: Self = Self::new(FieldWidth::W16, ByteOrder::Little, Signedness::Signed);
    pub const I16_BE: Self = Self::new(FieldWidth::W16, ByteOrder::Big, Signedness::Signed);
    pub const U24_LE: Self = Self::new(FieldWidth::W24, ByteOrder::Little, Signedness::Unsigned);
    pub const U24_BE: Self = Self::new(FieldWidth::W24, ByteOrder::Big, Signedness::Unsigned);
    pub const U32_LE: Self = Self::new(FieldWidth::W32, ByteOrder::Little, Signedness::Unsigned);
    pub const U32_BE: Self = Self::new(FieldWidth::W32, ByteOrder::Big, Signedness::Unsigned);
    pub const I32_LE: Self = Self::new(FieldWidth::W32, ByteOrder::Little, Signedness::Signed);
    pub const I32_BE: Self = Self::new(FieldWidth::W32, ByteOrder::Big, Signedness::Signed);
    pub const U64_LE: Self = Self::new(FieldWidth::W64, ByteOrder::Little, Signedness::Unsigned);
    pub const U64_BE: Self = Self::new(FieldWidth::W64, ByteOrder::Big, Signedness::Unsigned);
    pub const I64_LE: Self = Self::new(FieldWidth::W64, ByteOrder::Little, Signedness::Signed);
    pub const I64_BE: Self = Self::new(FieldWidth::W64, ByteOrder::Big, Signedness::Signed);

    #[must_use]
    pub const fn new(width: FieldWidth, order: ByteOrder, sign: Signedness) -> Self {
        Self { width, order, sign }
    }

    /// Number of bytes a word of this shape occupies.
    #[must_use]
    pub fn len(self) -> usize {
        self.width.bytes()
    }

    /// Always `false`; words are at least one byte. Present for clippy.
    #[must_use]
    pub fn is_empty(self) -> bool {
        false
    }
}

impl fmt::Display for WordSpec {
    /// Formats as the legacy alias, e.g. `word16lu`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            ByteOrder::Little => 'l',
            ByteOrder::Big => 'b',
        };
        let sign = match self.sign {
            Signedness::Unsigned => 'u',
            Signedness::Signed => 's',
        };
        write!(f, "word{}{order}{sign}", self.width.bits())
    }
}

impl FromStr for WordSpec {
    type Err = WireError;

    /// Parse a legacy alias of the form `word<bits>[l|b][u|s]`.
    ///
    /// The order letter may be omitted only for 8-bit words, where it
    /// has no effect. The sign letter defaults to unsigned.
    ///
    /// | Name        | Result   |
    /// |-------------|----------|
    /// | `word8`     | `U8`     |
    /// | `word8s`    | `I8`     |
    /// | `word16lu`  | `U16_LE` |
    /// | `word32bs`  | `I32_BE` |
    /// | `word64l`   | `U64_LE` |
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| WireError::InvalidWordName {
            name: name.to_owned(),
            reason,
        };

        let rest = name
            .strip_prefix("word")
            .ok_or_else(|| invalid("missing `word` prefix"))?;
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let bits: u32 = rest[..digits]
            .parse()
            .map_err(|_| invalid("missing bit width"))?;
        let width = FieldWidth::from_bits(bits).ok_or_else(|| invalid("width must be 8, 16, 24, 32 or 64"))?;

        let mut flags = rest[digits..].chars().peekable();
        let order = match flags.peek() {
            Some('l') => {
                flags.next();
                Some(ByteOrder::Little)
            }
            Some('b') => {
                flags.next();
                Some(ByteOrder::Big)
            }
            _ => None,
        };
        let sign = match flags.next() {
            None | Some('u') => Signedness::Unsigned,
            Some('s') => Signedness::Signed,
            Some(_) => return Err(invalid("sign must be `u` or `s`")),
        };
        if flags.next().is_some() {
            return Err(invalid("unexpected trailing characters"));
        }

        let order = match (order, width) {
            (Some(order), _) => order,
            (None, FieldWidth::W8) => ByteOrder::Big,
            (None, _) => return Err(invalid("byte order `l` or `b` is required above 8 bits")),
        };

        Ok(Self::new(width, order, sign))
    }
}

/// Decode a fixed-width word into an `f64`.
///
/// Bytes are accumulated most-significant-first for [`ByteOrder::Big`]
/// and least-significant-first for [`ByteOrder::Little`]. A signed word
/// with its top bit set is rebuilt from the inverted bytes, so `-1` and
/// other small negatives are exact at every width.
///
/// The result is an `f64` for every width. Widths up to 32 bits are exact.
/// 64-bit words are exact only up to `2^53`; beyond that the low bits are
/// rounded away. Callers that need every bit of a 64-bit field should read
/// it as a raw buffer instead.
///
/// # Errors
///
/// [`WireError::WindowSize`] if `window.len()` is not exactly
/// `spec.width.bytes()`.
///
/// # Examples
///
/// | Window          | Spec      | Value |
/// |-----------------|-----------|-------|
/// | `[0x50, 0x00]`  | `U16_LE`  | 80    |
/// | `[0x0B, 0xB8]`  | `U16_BE`  | 3000  |
/// | `[0xFF]`        | `I8`      | -1    |
/// | `[0xFF]`        | `U8`      | 255   |
pub fn decode_word(window: &[u8], spec: WordSpec) -> Result<f64, WireError> {
    let expected = spec.len();
    if window.len() != expected {
        return Err(WireError::WindowSize {
            expected,
            found: window.len(),
        });
    }

    let msb = match spec.order {
        ByteOrder::Big => window.first(),
        ByteOrder::Little => window.last(),
    };
    let negative = spec.sign == Signedness::Signed && msb.is_some_and(|b| b & 0x80 != 0);

    // A negative value is accumulated from its one's complement so small
    // magnitudes stay exact at every width: -x - 1 == !x.
    let accumulate = |acc: f64, &byte: &u8| {
        let byte = if negative { !byte } else { byte };
        acc * 256.0 + f64::from(byte)
    };
    let magnitude = match spec.order {
        ByteOrder::Big => window.iter().fold(0.0, accumulate),
        ByteOrder::Little => window.iter().rev().fold(0.0, accumulate),
    };

    Ok(if negative { -magnitude - 1.0 } else { magnitude })
}

/// Encode `value` as a fixed-width word, appending the bytes to `out`.
///
/// The value is truncated to the declared width using two's complement,
/// so `-1` encodes as all-ones at any width regardless of signedness.
/// This is the inverse of [`decode_word`] for every value that fits.
pub fn encode_word(value: i64, spec: WordSpec, out: &mut Vec<u8>) {
    #[allow(clippy::cast_sign_loss)]
    let raw = value as u64;
    let len = spec.len();
    let be = raw.to_be_bytes();
    let significant = &be[be.len() - len..];

    match spec.order {
        ByteOrder::Big => out.extend_from_slice(significant),
        ByteOrder::Little => out.extend(significant.iter().rev()),
    }
}
