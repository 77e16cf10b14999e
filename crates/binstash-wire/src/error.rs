/// Errors raised by the primitive decoders.
///
/// Neither variant is caused by malformed input. Both indicate that a
/// caller handed a primitive something the engine never would: a byte
/// window of the wrong length, or a delimiter with nothing to match.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A fixed-width word was decoded from a window of the wrong size.
    #[error("word window must be {expected} bytes, got {found}")]
    WindowSize { expected: usize, found: usize },

    /// A delimiter scan was declared with an empty delimiter.
    #[error("delimiter must contain at least one byte")]
    EmptyDelimiter,

    /// A word alias name could not be parsed.
    #[error("invalid word name {name:?}: {reason}")]
    InvalidWordName { name: String, reason: &'static str },
}
