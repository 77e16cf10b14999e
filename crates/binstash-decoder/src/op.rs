use std::fmt;

use binstash_types::Size;
use binstash_wire::{DelimiterScanner, WireError, WordSpec};

use crate::handle::{Handle, LoopControl};

/// Callback run once: `tap`, `nest` and `peek` bodies.
pub type ScopeFn = Box<dyn FnOnce(&mut Handle<'_>)>;

/// Callback run once per iteration of a `repeat` loop.
pub type LoopFn = Box<dyn FnMut(&mut Handle<'_>, &mut LoopControl)>;

/// One declared unit of work in a parse queue.
///
/// Operations are built through [`Builder`](crate::Builder) and consumed
/// strictly in order by the [`Engine`](crate::Engine). An operation that
/// cannot finish because input has not arrived yet stays at the head of
/// its queue and is retried on the next drive; any search progress it
/// made (the scanners) travels with it.
///
/// ```text
/// ┌──────────┬────────────────────────────────────────────────────────────┐
/// │ Variant  │ Effect                                                     │
/// ├──────────┼────────────────────────────────────────────────────────────┤
/// │ Word     │ fixed-width integer → Number                               │
/// │ Buffer   │ N raw bytes → Bytes                                        │
/// │ Str      │ N bytes, or everything to end of input → Str               │
/// │ CString  │ N bytes, or up to a 0x00 → Str (terminator consumed)       │
/// │ Skip     │ advance N bytes, store nothing                             │
/// │ Scan     │ bytes up to a delimiter → Bytes (delimiter consumed)       │
/// │ Tap      │ callback on the current scope; pushes run next             │
/// │ Nest     │ callback on a fresh child scope stored under a key         │
/// │ Peek     │ child scope merged into the current one, then rewind       │
/// │ Loop     │ callback per iteration until LoopControl::end              │
/// │ Invalid  │ declaration error, raised when reached                     │
/// └──────────┴────────────────────────────────────────────────────────────┘
/// ```
pub enum Op {
    Word {
        key: String,
        spec: WordSpec,
    },
    Buffer {
        key: String,
        size: Size,
    },
    Str {
        key: String,
        size: Option<Size>,
    },
    CString {
        key: String,
        size: Option<Size>,
        scanner: DelimiterScanner,
    },
    Skip {
        size: Size,
    },
    Scan {
        key: String,
        scanner: DelimiterScanner,
    },
    Tap(ScopeFn),
    Nest {
        key: String,
        body: ScopeFn,
    },
    Peek(ScopeFn),
    Loop(LoopFn),
    Invalid(WireError),
}

impl Op {
    /// Short operation name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Word { .. } => "word",
            Self::Buffer { .. } => "buffer",
            Self::Str { .. } => "string",
            Self::CString { .. } => "cstring",
            Self::Skip { .. } => "skip",
            Self::Scan { .. } => "scan",
            Self::Tap(_) => "tap",
            Self::Nest { .. } => "nest",
            Self::Peek(_) => "peek",
            Self::Loop(_) => "loop",
            Self::Invalid(_) => "invalid",
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word { key, spec } => write!(f, "{spec}({key})"),
            Self::Buffer { key, size } => write!(f, "buffer({key}, {size})"),
            Self::Str { key, size: Some(size) } => write!(f, "string({key}, {size})"),
            Self::Str { key, size: None } => write!(f, "string({key}, ..)"),
            Self::CString { key, size: Some(size), .. } => write!(f, "cstring({key}, {size})"),
            Self::CString { key, size: None, .. } => write!(f, "cstring({key})"),
            Self::Skip { size } => write!(f, "skip({size})"),
            Self::Scan { key, scanner } => write!(f, "scan({key}, {:?})", scanner.delimiter()),
            Self::Nest { key, .. } => write!(f, "nest({key}, <fn>)"),
            Self::Invalid(err) => write!(f, "invalid({err})"),
            other => write!(f, "{}(<fn>)", other.name()),
        }
    }
}
