use binstash_types::{Size, Stash, Value};
use binstash_wire::{DelimiterScanner, WordSpec};

use crate::op::Op;

/// Chainable declaration of field operations.
///
/// Implementors only supply [`push`](Self::push); every field type is a
/// provided method that builds the matching [`Op`]. The same surface is
/// available on the one-shot [`Parser`](crate::Parser), the streaming
/// [`StreamParser`](crate::StreamParser), and the [`Handle`] passed into
/// callbacks, so a layout reads the same wherever it is declared.
///
/// # Example
///
/// ```rust
/// use binstash_decoder::{Builder, Parser, Value, WordSpec};
///
/// let mut parser = Parser::new(&[5, 80, 0, 11, 184]);
/// parser
///     .word("count", WordSpec::U8)
///     .word("ports.src", WordSpec::U16_LE)
///     .word("ports.dst", WordSpec::U16_BE);
///
/// let vars = parser.finish().unwrap();
/// assert_eq!(vars.lookup("ports.src"), Some(&Value::Number(80.0)));
/// assert_eq!(vars.lookup("ports.dst"), Some(&Value::Number(3000.0)));
/// ```
pub trait Builder: Sized {
    /// Append an operation.
    fn push(&mut self, op: Op) -> &mut Self;

    /// Fixed-width integer.
    fn word(&mut self, key: impl Into<String>, spec: WordSpec) -> &mut Self {
        self.push(Op::Word {
            key: key.into(),
            spec,
        })
    }

    /// Raw bytes of a literal or key-referenced length.
    fn buffer(&mut self, key: impl Into<String>, size: impl Into<Size>) -> &mut Self {
        self.push(Op::Buffer {
            key: key.into(),
            size: size.into(),
        })
    }

    /// UTF-8 string of a literal or key-referenced length.
    fn string(&mut self, key: impl Into<String>, size: impl Into<Size>) -> &mut Self {
        self.push(Op::Str {
            key: key.into(),
            size: Some(size.into()),
        })
    }

    /// UTF-8 string made of every byte left in the input.
    ///
    /// In a stream this waits for end of input.
    fn string_to_end(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Op::Str {
            key: key.into(),
            size: None,
        })
    }

    /// Null-terminated string. The terminator is consumed, not stored.
    fn cstring(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Op::CString {
            key: key.into(),
            size: None,
            scanner: DelimiterScanner::byte(0),
        })
    }

    /// Fixed-size field holding a null-terminated string; the whole field
    /// is consumed whatever the string's length.
    fn cstring_sized(&mut self, key: impl Into<String>, size: impl Into<Size>) -> &mut Self {
        self.push(Op::CString {
            key: key.into(),
            size: Some(size.into()),
            scanner: DelimiterScanner::byte(0),
        })
    }

    fn skip(&mut self, size: impl Into<Size>) -> &mut Self {
        self.push(Op::Skip { size: size.into() })
    }

    /// Bytes up to `delimiter`. The delimiter is consumed, not stored.
    fn scan(&mut self, key: impl Into<String>, delimiter: impl AsRef<[u8]>) -> &mut Self {
        let op = match DelimiterScanner::new(delimiter.as_ref()) {
            Ok(scanner) => Op::Scan {
                key: key.into(),
                scanner,
            },
            Err(err) => Op::Invalid(err),
        };
        self.push(op)
    }

    /// Run `f` once every earlier operation has finished. Operations it
    /// pushes run before anything queued after the tap.
    fn tap(&mut self, f: impl FnOnce(&mut Handle<'_>) + 'static) -> &mut Self {
        self.push(Op::Tap(Box::new(f)))
    }

    /// Like [`tap`](Self::tap), but the operations `f` pushes write into a
    /// fresh map that is stored under `key` when they finish.
    fn nest(&mut self, key: impl Into<String>, f: impl FnOnce(&mut Handle<'_>) + 'static) -> &mut Self {
        self.push(Op::Nest {
            key: key.into(),
            body: Box::new(f),
        })
    }

    /// Run the operations `f` pushes, merge their results, then rewind to
    /// where the peek started so the same bytes are read again.
    fn peek(&mut self, f: impl FnOnce(&mut Handle<'_>) + 'static) -> &mut Self {
        self.push(Op::Peek(Box::new(f)))
    }

    /// Loop: call `f` at the start of each iteration, run what it pushed,
    /// and go again until [`LoopControl::end`] is called.
    fn repeat(&mut self, f: impl FnMut(&mut Handle<'_>, &mut LoopControl) + 'static) -> &mut Self {
        self.push(Op::Loop(Box::new(f)))
    }
}

/// The context handed to every callback.
///
/// A handle exposes the stash of the scope the callback runs in, read
/// access to the enclosing scope's stash, and collects the operations the
/// callback declares. The engine splices those operations in directly
/// after the operation that invoked the callback.
pub struct Handle<'a> {
    stash: &'a mut Stash,
    outer: Option<&'a Stash>,
    separator: char,
    ops: Vec<Op>,
}

impl<'a> Handle<'a> {
    pub(crate) fn new(stash: &'a mut Stash, outer: Option<&'a Stash>, separator: char) -> Self {
        Self {
            stash,
            outer,
            separator,
            ops: Vec::new(),
        }
    }

    pub(crate) fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// The stash of the scope this callback runs in.
    ///
    /// For `tap` it is the current scope; for `nest`, `peek` and each loop
    /// iteration it is the new, initially empty, child scope.
    #[must_use]
    pub fn stash(&self) -> &Stash {
        self.stash
    }

    pub fn stash_mut(&mut self) -> &mut Stash {
        self.stash
    }

    /// The enclosing scope's stash, if there is one.
    #[must_use]
    pub fn outer(&self) -> Option<&Stash> {
        self.outer
    }

    /// Look up a dotted key in this scope, falling back to the enclosing
    /// scope.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.stash
            .get_path(path, self.separator)
            .or_else(|| self.outer?.get_path(path, self.separator))
    }

    /// Operations pushed so far by this callback.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.ops.len()
    }
}

impl Builder for Handle<'_> {
    fn push(&mut self, op: Op) -> &mut Self {
        self.ops.push(op);
        self
    }
}

/// Termination signal and counter for a `repeat` loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopControl {
    iteration: usize,
    ended: bool,
}

impl LoopControl {
    /// Stop after the current iteration. The operations already pushed
    /// for this iteration still run. Calling it more than once is harmless.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Zero-based index of the iteration being started.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn advance(&mut self) {
        self.iteration += 1;
    }
}
