use std::io::Read;

use binstash_types::Stash;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::engine::{Engine, Status};
use crate::error::DecodeError;
use crate::handle::Builder;
use crate::op::Op;

/// Push-based parser for input that arrives in pieces.
///
/// Bytes handed to [`write`](Self::write) are appended to a backlog and
/// the queued operations run as far as the backlog allows. An operation
/// that needs more bytes than have arrived waits at the head of its queue
/// until a later write supplies them; nothing is parsed twice and no byte
/// is lost between chunks. Consumed bytes are released from the front of
/// the backlog after every drive.
///
/// Once [`end`](Self::end) is called, the remaining operations run with
/// the same best-effort rules as the one-shot [`Parser`](crate::Parser):
/// anything the backlog cannot satisfy becomes
/// [`Value::Null`](crate::Value::Null).
///
/// ```text
///   write("\x05\x00")   word8 → count = 5, word16 waits (1 of 2 bytes)
///   write("\x50")       word16 → port = 80
///   end()               remaining ops flush as nulls
/// ```
///
/// Feeding the same bytes in any chunking yields the same stash and the
/// same [`tell`](Self::tell) as a one-shot parse of the whole buffer.
///
/// # Example
///
/// ```rust
/// use binstash_decoder::{Builder, StreamParser, Value, WordSpec};
///
/// let mut stream = StreamParser::new();
/// stream.word("count", WordSpec::U8).word("port", WordSpec::U16_LE);
///
/// stream.write(&[5, 80]).unwrap();
/// assert!(!stream.is_done());
/// stream.write(&[0]).unwrap();
/// assert!(stream.is_done());
///
/// assert_eq!(stream.vars().lookup("port"), Some(&Value::Number(80.0)));
/// ```
pub struct StreamParser {
  backlog: BytesMut,
  engine: Engine,
  config: DecoderConfig,
  ended: bool,
  /// Set once an operation fails; the stream then refuses further work.
  failed: bool,
  /// Error raised while pumping from a builder call, reported by the next
  /// `write`, `end` or `finish`.
  pending_error: Option<DecodeError>,
}

impl Default for StreamParser {
  fn default() -> Self {
    Self::new()
  }
}

impl StreamParser {
  #[must_use]
  pub fn new() -> Self {
    Self::with_config(DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(config: DecoderConfig) -> Self {
    Self {
      backlog: BytesMut::with_capacity(config.backlog_capacity),
      engine: Engine::new(&config),
      config,
      ended: false,
      failed: false,
      pending_error: None,
    }
  }

  /// Append a chunk of input and run every operation it unblocks.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::WriteAfterEnd`] if [`end`](Self::end) was already called.
  /// - Any error raised by an operation (see [`DecodeError`]).
  /// - [`DecodeError::Aborted`] once an earlier error has been reported.
  pub fn write(&mut self, chunk: &[u8]) -> Result<Status, DecodeError> {
    if self.ended {
      return Err(DecodeError::WriteAfterEnd);
    }
    self.check()?;
    self.backlog.extend_from_slice(chunk);
    self.pump();
    self.check()
  }

  /// Signal end of input and flush every remaining operation.
  ///
  /// Calling `end` twice is harmless.
  ///
  /// # Errors
  ///
  /// Any error raised by an operation while flushing.
  pub fn end(&mut self) -> Result<(), DecodeError> {
    self.check()?;
    if !self.ended {
      debug!(backlog = self.backlog.len(), offset = self.tell(), "end of input");
      self.ended = true;
      self.pump();
    }
    self.check().map(|_| ())
  }

  /// Discard every stored result while leaving queued operations alone.
  ///
  /// Long-running streams use this to drop records they have already
  /// handled; parsing continues exactly where it was.
  pub fn flush(&mut self) {
    self.engine.clear_stash();
  }

  /// Cumulative bytes consumed.
  #[must_use]
  pub fn tell(&self) -> u64 {
    self.engine.tell()
  }

  /// Bytes received but not yet consumed.
  #[must_use]
  pub fn buffered(&self) -> usize {
    self.backlog.len()
  }

  /// `true` when every queued operation has run.
  #[must_use]
  pub fn is_done(&self) -> bool {
    self.engine.is_idle()
  }

  #[must_use]
  pub fn is_ended(&self) -> bool {
    self.ended
  }

  /// Results parsed so far.
  #[must_use]
  pub fn vars(&self) -> &Stash {
    self.engine.stash()
  }

  /// Mutable access to the results, e.g. to remove a handled record.
  pub fn vars_mut(&mut self) -> &mut Stash {
    self.engine.stash_mut()
  }

  /// End the stream if needed and return the results.
  ///
  /// # Errors
  ///
  /// Any error raised while flushing, or one held from an earlier
  /// builder call.
  pub fn finish(mut self) -> Result<Stash, DecodeError> {
    self.end()?;
    Ok(self.engine.take_stash())
  }

  /// Drain an async reader into the stream, then end it.
  ///
  /// Reads `read_chunk_size` bytes at a time. Operations run as each
  /// chunk arrives, so callbacks fire while the reader is still open.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Io`] from the reader, or any error raised by an
  /// operation.
  pub async fn read_from<R: AsyncRead + Unpin>(&mut self, mut reader: R) -> Result<(), DecodeError> {
    let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];
    loop {
      let n = reader.read(&mut chunk).await?;
      if n == 0 {
        break;
      }
      self.write(&chunk[..n])?;
    }
    self.end()
  }

  /// Blocking counterpart of [`read_from`](Self::read_from).
  ///
  /// # Errors
  ///
  /// [`DecodeError::Io`] from the reader, or any error raised by an
  /// operation.
  pub fn read_from_sync<R: Read>(&mut self, mut reader: R) -> Result<(), DecodeError> {
    let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];
    loop {
      let n = match reader.read(&mut chunk) {
        Ok(0) => break,
        Ok(n) => n,
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e.into()),
      };
      self.write(&chunk[..n])?;
    }
    self.end()
  }

  fn pump(&mut self) {
    if self.failed {
      return;
    }
    match self.engine.drive(&self.backlog, self.ended) {
      Ok(progress) => self.backlog.advance(progress.consumed),
      Err(err) => {
        warn!(error = %err, offset = self.engine.tell(), "stream parse stopped");
        self.failed = true;
        self.pending_error = Some(err);
      }
    }
  }

  /// Report a held error once, then `Aborted` on every later call.
  fn check(&mut self) -> Result<Status, DecodeError> {
    if let Some(err) = self.pending_error.take() {
      return Err(err);
    }
    if self.failed {
      return Err(DecodeError::Aborted);
    }
    Ok(if self.engine.is_idle() {
      Status::Idle
    } else {
      Status::Blocked
    })
  }
}

impl Builder for StreamParser {
  fn push(&mut self, op: Op) -> &mut Self {
    if !self.failed {
      self.engine.push(op);
      self.pump();
    }
    self
  }
}
