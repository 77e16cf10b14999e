use std::fmt;

/// Byte count for a sized read: either a literal, or the name of a field
/// parsed earlier whose numeric value is the count.
///
/// Key references are resolved when the operation runs, not when it is
/// declared, so a layout can say "read `len` bytes" before `len` has
/// been parsed.
///
/// ```text
///   word16lu("len")
///   buffer("body", "len")   ← Size::Key("len"), looked up at run time
///   skip(4)                 ← Size::Literal(4)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Size {
    Literal(usize),
    Key(String),
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Self::Literal(n)
    }
}

impl From<&str> for Size {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for Size {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for Size {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{n}"),
            Self::Key(key) => write!(f, "${key}"),
        }
    }
}
