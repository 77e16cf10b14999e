use binstash_wire::WireError;

/// Errors that stop a parse.
///
/// Truncated or malformed input is never an error: short reads store
/// [`Value::Null`](binstash_types::Value::Null) and the parse moves on.
/// Every variant here points at a mistake in how the operations were
/// declared or how the parser was driven.
///
/// ```text
///   DecodeError
///   ├── UnresolvedSize     ← size names a key no scope has stored yet
///   ├── InvalidSize        ← size key holds a string, bytes or a map
///   ├── WriteAfterEnd      ← bytes written to a stream after end()
///   ├── Aborted            ← stream already failed with an earlier error
///   ├── Wire(WireError)    ← bad primitive arguments (e.g. empty delimiter)
///   └── Io(std::io::Error) ← from the reader feeding a stream
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A size refers to a key that has not been parsed in this scope or
    /// any enclosing scope. Sizes may only refer backwards.
    #[error("size refers to unknown key {key:?}")]
    UnresolvedSize { key: String },

    /// A size key resolved to something that is not a number. Numbers
    /// that are not byte counts (negative or fractional values read from
    /// the input) act like a short read instead.
    #[error("size key {key:?} holds a {found}, expected a number")]
    InvalidSize { key: String, found: &'static str },

    /// `write` was called on a stream that had already been ended.
    #[error("stream already ended; no more input accepted")]
    WriteAfterEnd,

    /// The stream reported an error earlier and can make no progress.
    #[error("parse aborted by an earlier error")]
    Aborted,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
