use binstash_types::Stash;
use tracing::warn;

use crate::config::DecoderConfig;
use crate::engine::Engine;
use crate::error::DecodeError;
use crate::handle::Builder;
use crate::op::Op;

/// One-shot parser over a complete, in-memory buffer.
///
/// Every builder call runs immediately: the operation is queued and the
/// engine is driven over the unread rest of the buffer with end of input
/// already signaled. Nothing ever waits for more bytes. A field the
/// buffer is too short for is stored as [`Value::Null`](crate::Value::Null)
/// and later fields still get whatever bytes are left, which makes the
/// parser safe to point at truncated input.
///
/// Because execution is eager, [`tell`](Self::tell) is exact after every
/// call. Declaration errors (a size naming a key that was never parsed)
/// stop the parse; the first one is kept and returned by
/// [`finish`](Self::finish), and later builder calls are ignored.
///
/// # Example
///
/// ```rust
/// use binstash_decoder::{Builder, Parser, Value, WordSpec};
///
/// let mut parser = Parser::new(b"\x03abcdef");
/// parser.word("len", WordSpec::U8).string("name", "len");
/// assert_eq!(parser.tell(), 4);
///
/// let vars = parser.finish().unwrap();
/// assert_eq!(vars.lookup("name"), Some(&Value::Str("abc".into())));
/// ```
pub struct Parser<'b> {
    buf: &'b [u8],
    /// Bytes of `buf` already handed back by the engine.
    pos: usize,
    engine: Engine,
    error: Option<DecodeError>,
}

impl<'b> Parser<'b> {
    #[must_use]
    pub fn new(buf: &'b [u8]) -> Self {
        Self::with_config(buf, DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(buf: &'b [u8], config: DecoderConfig) -> Self {
        Self {
            buf,
            pos: 0,
            engine: Engine::new(&config),
            error: None,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.engine.tell()
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'b [u8] {
        &self.buf[self.pos..]
    }

    /// Results parsed so far.
    #[must_use]
    pub fn vars(&self) -> &Stash {
        self.engine.stash()
    }

    /// The error that stopped the parse, if any.
    #[must_use]
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Consume the parser and return its results.
    ///
    /// # Errors
    ///
    /// The first [`DecodeError`] raised by any operation.
    pub fn finish(mut self) -> Result<Stash, DecodeError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self.engine.take_stash()),
        }
    }

    fn pump(&mut self) {
        match self.engine.drive(&self.buf[self.pos..], true) {
            Ok(progress) => self.pos += progress.consumed,
            Err(err) => {
                warn!(error = %err, offset = self.engine.tell(), "parse stopped");
                self.error = Some(err);
            }
        }
    }
}

impl Builder for Parser<'_> {
    fn push(&mut self, op: Op) -> &mut Self {
        if self.error.is_none() {
            self.engine.push(op);
            self.pump();
        }
        self
    }
}
