use std::collections::VecDeque;

use binstash_types::{Size, Stash, Value};
use binstash_wire::{decode_cstring, decode_string, decode_word};
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::handle::{Handle, LoopControl};
use crate::op::{LoopFn, Op, ScopeFn};

/// Outcome of a single [`Engine::drive`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The head operation needs bytes that are not in the window yet.
    Blocked,
    /// Every queued operation has finished.
    Idle,
}

/// What a drive did to the caller's window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Bytes the caller must drop from the front of its window before
    /// the next drive.
    pub consumed: usize,
    pub status: Status,
}

/// A stash and the operations still to run against it.
struct Frame {
    stash: Stash,
    queue: VecDeque<Op>,
}

impl Frame {
    fn new(stash: Stash, ops: Vec<Op>) -> Self {
        Self {
            stash,
            queue: ops.into(),
        }
    }
}

/// Why a child frame exists and what to do when its queue drains.
enum ScopeKind {
    /// Store the child stash under `key` in the parent.
    Nest { key: String },
    /// Merge into the parent, then move the cursor back to `start`.
    Peek { start: usize },
    /// Merge into the parent, then maybe start another iteration.
    Loop {
        body: LoopFn,
        control: LoopControl,
        /// Cumulative offset at which this iteration started.
        started_at: u64,
    },
}

struct Scope {
    frame: Frame,
    kind: ScopeKind,
}

/// Result of trying to take `n` bytes at the cursor.
enum Take<'w> {
    Ready(&'w [u8]),
    /// Not enough bytes and input has ended; the cursor is at the end.
    Short,
    /// Not enough bytes yet.
    Pending,
}

/// The operation interpreter shared by both source adapters.
///
/// The engine owns the root stash and queue plus a stack of child scopes
/// opened by `nest`, `peek` and loop iterations. It never owns input:
/// each [`drive`](Self::drive) is handed the bytes currently available,
/// runs operations from the innermost scope's queue until one needs bytes
/// that are not there, and reports how many leading bytes the caller may
/// now discard.
///
/// ```text
///   window:  [ consumed ........ | cursor → unread ........ ]
///            ^ caller drops these  ^ next operation reads here
///
///   scopes:  root ── nest("hdr") ── loop iteration 3   ← ops run here
/// ```
///
/// With `at_end = false` a read that does not fit blocks and the drive
/// returns [`Status::Blocked`]. With `at_end = true` nothing ever blocks:
/// a read that does not fit stores [`Value::Null`], consumes whatever was
/// left, and the queue keeps going.
///
/// Callbacks run inline. Operations a callback pushes go to the front of
/// the innermost queue, ahead of anything that was already waiting, so a
/// layout can grow in response to the values it has parsed.
pub struct Engine {
    root: Frame,
    scopes: Vec<Scope>,
    /// Read position inside the current window.
    cursor: usize,
    /// Bytes discarded by earlier drives.
    base: u64,
    separator: char,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            root: Frame::new(Stash::new(), Vec::new()),
            scopes: Vec::new(),
            cursor: 0,
            base: 0,
            separator: config.separator,
        }
    }

    /// Append an operation to the end of the root queue.
    pub fn push(&mut self, op: Op) {
        self.root.queue.push_back(op);
    }

    /// Cumulative number of bytes read so far.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.base + self.cursor as u64
    }

    /// `true` when no operation is queued in any scope.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scopes.is_empty() && self.root.queue.is_empty()
    }

    /// The root stash.
    #[must_use]
    pub fn stash(&self) -> &Stash {
        &self.root.stash
    }

    pub fn stash_mut(&mut self) -> &mut Stash {
        &mut self.root.stash
    }

    /// Move the root stash out, leaving an empty one.
    pub fn take_stash(&mut self) -> Stash {
        std::mem::take(&mut self.root.stash)
    }

    /// Discard every root stash entry. Queued operations are untouched.
    pub fn clear_stash(&mut self) {
        self.root.stash.clear();
    }

    /// Run queued operations against `window`.
    ///
    /// `window` must begin at the first byte not yet consumed: after each
    /// call the caller drops [`Progress::consumed`] bytes from its front.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::UnresolvedSize`] / [`DecodeError::InvalidSize`]
    ///   when a size key cannot be turned into a byte count.
    /// - [`DecodeError::Wire`] when an operation was declared with invalid
    ///   arguments.
    ///
    /// # Panics
    ///
    /// If `window` is shorter than the bytes the engine still holds from
    /// earlier drives. After a drive, every byte past
    /// [`Progress::consumed`] must be offered again, and an open `peek`
    /// keeps its start in that retained range. [`Parser`](crate::Parser)
    /// and [`StreamParser`](crate::StreamParser) always honour this.
    pub fn drive(&mut self, window: &[u8], at_end: bool) -> Result<Progress, DecodeError> {
        let status = loop {
            let Some(op) = self.top_mut().queue.pop_front() else {
                if self.close_scope(window.len(), at_end) {
                    continue;
                }
                break Status::Idle;
            };

            trace!(op = ?op, offset = self.tell(), "executing");
            if let Some(op) = self.step(op, window, at_end)? {
                debug!(op = op.name(), offset = self.tell(), "waiting for input");
                self.top_mut().queue.push_front(op);
                break Status::Blocked;
            }
        };

        Ok(Progress {
            consumed: self.compact(),
            status,
        })
    }

    /// Execute one operation. Returns it back if it has to wait for input.
    fn step(&mut self, op: Op, window: &[u8], at_end: bool) -> Result<Option<Op>, DecodeError> {
        match op {
            Op::Word { key, spec } => match self.take(window, spec.len(), at_end) {
                Take::Ready(bytes) => {
                    let value = decode_word(bytes, spec)?;
                    self.store(&key, Value::Number(value));
                }
                Take::Short => self.store_short(&key),
                Take::Pending => return Ok(Some(Op::Word { key, spec })),
            },

            Op::Buffer { key, size } => {
                let Some(n) = self.resolve(&size)? else {
                    self.store(&key, Value::Null);
                    return Ok(None);
                };
                match self.take(window, n, at_end) {
                    Take::Ready(bytes) => self.store(&key, Value::Bytes(bytes.to_vec())),
                    Take::Short => self.store_short(&key),
                    Take::Pending => return Ok(Some(Op::Buffer { key, size })),
                }
            }

            Op::Str { key, size: Some(size) } => {
                let Some(n) = self.resolve(&size)? else {
                    self.store(&key, Value::Null);
                    return Ok(None);
                };
                match self.take(window, n, at_end) {
                    Take::Ready(bytes) => self.store(&key, Value::Str(decode_string(bytes))),
                    Take::Short => self.store_short(&key),
                    Take::Pending => {
                        return Ok(Some(Op::Str {
                            key,
                            size: Some(size),
                        }));
                    }
                }
            }

            Op::Str { key, size: None } => {
                if !at_end {
                    return Ok(Some(Op::Str { key, size: None }));
                }
                let rest = &window[self.cursor..];
                self.cursor = window.len();
                self.store(&key, Value::Str(decode_string(rest)));
            }

            Op::CString {
                key,
                size: Some(size),
                scanner,
            } => {
                let Some(n) = self.resolve(&size)? else {
                    self.store(&key, Value::Null);
                    return Ok(None);
                };
                match self.take(window, n, at_end) {
                    Take::Ready(bytes) => self.store(&key, Value::Str(decode_cstring(bytes))),
                    Take::Short => self.store_short(&key),
                    Take::Pending => {
                        return Ok(Some(Op::CString {
                            key,
                            size: Some(size),
                            scanner,
                        }));
                    }
                }
            }

            Op::CString {
                key,
                size: None,
                mut scanner,
            } => {
                let rest = &window[self.cursor..];
                match scanner.find(rest) {
                    Some(nul) => {
                        self.cursor += nul + 1;
                        self.store(&key, Value::Str(decode_cstring(&rest[..=nul])));
                    }
                    None if at_end && rest.is_empty() => self.store_short(&key),
                    None if at_end => {
                        self.cursor = window.len();
                        self.store(&key, Value::Str(decode_cstring(rest)));
                    }
                    None => {
                        return Ok(Some(Op::CString {
                            key,
                            size: None,
                            scanner,
                        }));
                    }
                }
            }

            Op::Skip { size } => {
                let Some(n) = self.resolve(&size)? else {
                    return Ok(None);
                };
                if let Take::Pending = self.take(window, n, at_end) {
                    return Ok(Some(Op::Skip { size }));
                }
            }

            Op::Scan { key, mut scanner } => {
                let rest = &window[self.cursor..];
                match scanner.find(rest) {
                    Some(offset) => {
                        self.cursor += offset + scanner.delimiter().len();
                        self.store(&key, Value::Bytes(rest[..offset].to_vec()));
                    }
                    None if at_end => {
                        self.cursor = window.len();
                        self.store(&key, Value::Bytes(rest.to_vec()));
                    }
                    None => return Ok(Some(Op::Scan { key, scanner })),
                }
            }

            Op::Tap(body) => self.run_tap(body),
            Op::Nest { key, body } => self.open_scope(body, ScopeKind::Nest { key }),
            Op::Peek(body) => {
                let start = self.cursor;
                self.open_scope(body, ScopeKind::Peek { start });
            }
            Op::Loop(body) => self.begin_iteration(body, LoopControl::default()),
            Op::Invalid(err) => return Err(err.into()),
        }

        Ok(None)
    }

    fn take<'w>(&mut self, window: &'w [u8], n: usize, at_end: bool) -> Take<'w> {
        let rest = &window[self.cursor..];
        if rest.len() >= n {
            self.cursor += n;
            Take::Ready(&rest[..n])
        } else if at_end {
            self.cursor = window.len();
            Take::Short
        } else {
            Take::Pending
        }
    }

    /// Turn a size into a byte count.
    ///
    /// `None` means the referenced field holds no usable count: it was a
    /// short read, or the input gave it a negative or fractional value.
    /// Only a key that was never stored, or one holding a non-number, is
    /// an error.
    fn resolve(&self, size: &Size) -> Result<Option<usize>, DecodeError> {
        let key = match size {
            Size::Literal(n) => return Ok(Some(*n)),
            Size::Key(key) => key,
        };

        let value = self
            .frames_inner_first()
            .find_map(|frame| frame.stash.get_path(key, self.separator))
            .ok_or_else(|| DecodeError::UnresolvedSize { key: key.clone() })?;

        match value {
            Value::Null => Ok(None),
            Value::Number(n) => {
                let count = value.as_u64().and_then(|n| usize::try_from(n).ok());
                if count.is_none() {
                    debug!(key = key.as_str(), value = *n, "size is not a byte count; storing null");
                }
                Ok(count)
            }
            _ => Err(DecodeError::InvalidSize {
                key: key.clone(),
                found: value.kind(),
            }),
        }
    }

    fn store(&mut self, key: &str, value: Value) {
        trace!(key, kind = value.kind(), "stored");
        let separator = self.separator;
        self.top_mut().stash.insert_path(key, separator, value);
    }

    fn store_short(&mut self, key: &str) {
        debug!(key, offset = self.tell(), "input ended before field; storing null");
        self.store(key, Value::Null);
    }

    fn run_tap(&mut self, body: ScopeFn) {
        let separator = self.separator;
        let ops = {
            let (top, outer) = self.split_top();
            let mut handle = Handle::new(&mut top.stash, outer.map(|f| &f.stash), separator);
            body(&mut handle);
            handle.into_ops()
        };
        let queue = &mut self.top_mut().queue;
        for op in ops.into_iter().rev() {
            queue.push_front(op);
        }
    }

    fn open_scope(&mut self, body: ScopeFn, kind: ScopeKind) {
        let mut stash = Stash::new();
        let ops = {
            let mut handle = Handle::new(&mut stash, Some(&self.top().stash), self.separator);
            body(&mut handle);
            handle.into_ops()
        };
        debug!(depth = self.scopes.len() + 1, ops = ops.len(), "scope opened");
        self.scopes.push(Scope {
            frame: Frame::new(stash, ops),
            kind,
        });
    }

    fn begin_iteration(&mut self, mut body: LoopFn, mut control: LoopControl) {
        let mut stash = Stash::new();
        let ops = {
            let mut handle = Handle::new(&mut stash, Some(&self.top().stash), self.separator);
            body(&mut handle, &mut control);
            handle.into_ops()
        };
        trace!(iteration = control.iteration(), ops = ops.len(), "loop iteration");
        let started_at = self.tell();
        self.scopes.push(Scope {
            frame: Frame::new(stash, ops),
            kind: ScopeKind::Loop {
                body,
                control,
                started_at,
            },
        });
    }

    /// Close the innermost scope once its queue has drained. Returns
    /// `false` when there is no scope to close (the root queue is empty).
    fn close_scope(&mut self, window_len: usize, at_end: bool) -> bool {
        let Some(Scope { frame, kind }) = self.scopes.pop() else {
            return false;
        };
        let separator = self.separator;

        match kind {
            ScopeKind::Nest { key } => {
                self.top_mut()
                    .stash
                    .map_at_path(&key, separator)
                    .merge(frame.stash);
            }
            ScopeKind::Peek { start } => {
                self.top_mut().stash.merge(frame.stash);
                self.cursor = start;
            }
            ScopeKind::Loop {
                body,
                mut control,
                started_at,
            } => {
                self.top_mut().stash.merge(frame.stash);
                control.advance();

                // An iteration that began with no input left is the last
                // one; otherwise an unterminated loop would spin forever.
                let input_end = self.base + window_len as u64;
                if control.is_ended() {
                    debug!(iterations = control.iteration(), "loop ended");
                } else if at_end && started_at >= input_end {
                    debug!(iterations = control.iteration(), "loop stopped at end of input");
                } else {
                    self.begin_iteration(body, control);
                }
            }
        }
        true
    }

    /// Release bytes no scope can return to. Open peeks pin their start.
    fn compact(&mut self) -> usize {
        let pinned = self
            .scopes
            .iter()
            .filter_map(|scope| match scope.kind {
                ScopeKind::Peek { start } => Some(start),
                _ => None,
            })
            .min();
        let consumed = pinned.map_or(self.cursor, |start| start.min(self.cursor));

        self.cursor -= consumed;
        for scope in &mut self.scopes {
            if let ScopeKind::Peek { start } = &mut scope.kind {
                *start -= consumed;
            }
        }
        self.base += consumed as u64;
        consumed
    }

    fn top(&self) -> &Frame {
        self.scopes.last().map_or(&self.root, |scope| &scope.frame)
    }

    fn top_mut(&mut self) -> &mut Frame {
        match self.scopes.last_mut() {
            Some(scope) => &mut scope.frame,
            None => &mut self.root,
        }
    }

    /// The innermost frame, mutably, and the frame enclosing it.
    fn split_top(&mut self) -> (&mut Frame, Option<&Frame>) {
        match self.scopes.split_last_mut() {
            None => (&mut self.root, None),
            Some((top, rest)) => {
                let outer = rest.last().map_or(&self.root, |scope| &scope.frame);
                (&mut top.frame, Some(outer))
            }
        }
    }

    fn frames_inner_first(&self) -> impl Iterator<Item = &Frame> {
        self.scopes
            .iter()
            .rev()
            .map(|scope| &scope.frame)
            .chain(std::iter::once(&self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Builder;
    use binstash_wire::WordSpec;
    use pretty_assertions::assert_eq;

    /// Queue operations on a bare engine through a throwaway builder.
    struct Ops(Vec<Op>);

    impl Builder for Ops {
        fn push(&mut self, op: Op) -> &mut Self {
            self.0.push(op);
            self
        }
    }

    fn engine_with(build: impl FnOnce(&mut Ops)) -> Engine {
        let mut ops = Ops(Vec::new());
        build(&mut ops);
        let mut engine = Engine::default();
        for op in ops.0 {
            engine.push(op);
        }
        engine
    }

    #[test]
    fn drive_to_completion() {
        let mut engine = engine_with(|b| {
            b.word("a", WordSpec::U8).word("b", WordSpec::U16_BE);
        });
        let progress = engine.drive(&[1, 0, 2], false).unwrap();
        assert_eq!(progress, Progress { consumed: 3, status: Status::Idle });
        assert_eq!(engine.stash().lookup("b"), Some(&Value::Number(2.0)));
        assert_eq!(engine.tell(), 3);
    }

    #[test]
    fn blocks_without_consuming_partial_word() {
        let mut engine = engine_with(|b| {
            b.word("a", WordSpec::U8).word("b", WordSpec::U32_LE);
        });
        let progress = engine.drive(&[1, 2, 3], false).unwrap();
        assert_eq!(progress, Progress { consumed: 1, status: Status::Blocked });
        assert!(engine.stash().lookup("b").is_none());

        // The caller dropped the consumed byte; the window restarts at 2.
        let progress = engine.drive(&[2, 3, 4, 5], false).unwrap();
        assert_eq!(progress, Progress { consumed: 4, status: Status::Idle });
        assert_eq!(engine.stash().lookup("b"), Some(&Value::Number(f64::from(0x0504_0302))));
    }

    #[test]
    fn at_end_short_read_stores_null_and_continues() {
        let mut engine = engine_with(|b| {
            b.word("a", WordSpec::U32_LE).word("b", WordSpec::U8);
        });
        let progress = engine.drive(&[1, 2], true).unwrap();
        assert_eq!(progress.status, Status::Idle);
        assert_eq!(engine.stash().lookup("a"), Some(&Value::Null));
        assert_eq!(engine.stash().lookup("b"), Some(&Value::Null));
        assert_eq!(engine.tell(), 2);
    }

    #[test]
    fn tap_pushes_run_before_queued_ops() {
        let mut engine = engine_with(|b| {
            b.word("first", WordSpec::U8)
                .tap(|h| {
                    h.word("inserted", WordSpec::U8);
                })
                .word("last", WordSpec::U8);
        });
        engine.drive(&[1, 2, 3], true).unwrap();
        let keys: Vec<_> = engine.stash().keys().collect();
        assert_eq!(keys, vec!["first", "inserted", "last"]);
        assert_eq!(engine.stash().lookup("inserted"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn unresolved_size_is_fatal() {
        let mut engine = engine_with(|b| {
            b.buffer("body", "len");
        });
        let err = engine.drive(&[1, 2, 3], true).unwrap_err();
        assert!(matches!(err, DecodeError::UnresolvedSize { key } if key == "len"));
    }

    #[test]
    fn non_numeric_size_is_fatal() {
        let mut engine = engine_with(|b| {
            b.string("name", 2).buffer("body", "name");
        });
        let err = engine.drive(b"hi..", true).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSize { found: "string", .. }));
    }

    #[test]
    fn negative_size_reads_as_null() {
        let mut engine = engine_with(|b| {
            b.word("len", WordSpec::I8)
                .buffer("body", "len")
                .skip("len")
                .word("after", WordSpec::U8);
        });
        let progress = engine.drive(&[0xFF, 7, 8], true).unwrap();
        assert_eq!(progress.status, Status::Idle);
        assert_eq!(engine.stash().lookup("body"), Some(&Value::Null));
        assert_eq!(engine.stash().lookup("after"), Some(&Value::Number(7.0)));
        assert_eq!(engine.tell(), 2);
    }

    #[test]
    fn size_resolves_through_enclosing_scope() {
        let mut engine = engine_with(|b| {
            b.word("len", WordSpec::U8).nest("body", |h| {
                h.buffer("data", "len");
            });
        });
        engine.drive(&[2, 0xAA, 0xBB], true).unwrap();
        assert_eq!(
            engine.stash().lookup("body.data"),
            Some(&Value::Bytes(vec![0xAA, 0xBB]))
        );
    }

    #[test]
    fn peek_pins_bytes_until_rewound() {
        let mut engine = engine_with(|b| {
            b.peek(|h| {
                h.word("peeked", WordSpec::U16_BE);
            })
            .word("again", WordSpec::U16_BE);
        });
        // Only one byte of the peeked word: nothing may be released.
        let progress = engine.drive(&[0x01], false).unwrap();
        assert_eq!(progress, Progress { consumed: 0, status: Status::Blocked });

        let progress = engine.drive(&[0x01, 0x02], false).unwrap();
        assert_eq!(progress, Progress { consumed: 2, status: Status::Idle });
        assert_eq!(engine.stash().lookup("peeked"), Some(&Value::Number(258.0)));
        assert_eq!(engine.stash().lookup("again"), Some(&Value::Number(258.0)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn window_must_keep_retained_bytes() {
        let mut engine = engine_with(|b| {
            b.peek(|h| {
                h.word("a", WordSpec::U8).word("b", WordSpec::U16_BE);
            });
        });
        // The open peek retains the first byte and has read past it.
        let progress = engine.drive(&[1, 2], false).unwrap();
        assert_eq!(progress.consumed, 0);
        let _ = engine.drive(&[], false);
    }

    #[test]
    fn invalid_scan_is_raised_when_reached() {
        let mut engine = engine_with(|b| {
            b.scan("line", b"");
        });
        let err = engine.drive(b"abc", true).unwrap_err();
        assert!(matches!(err, DecodeError::Wire(_)));
    }
}
