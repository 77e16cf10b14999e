use crate::error::WireError;

/// Incremental substring search over a haystack that only grows.
///
/// A streaming parse sees its input in chunks. Each call to
/// [`find`](Self::find) is handed the whole haystack seen so far (same
/// origin, possibly longer than last time) and only examines start
/// positions that have not already been rejected. A match whose first
/// `delimiter.len() - 1` bytes arrived in an earlier chunk is still found,
/// because a start position is only rejected once every byte it could
/// cover has been seen.
///
/// ```text
///   chunk 1: "hello\r"      checked starts 0..=4, start 5 still open
///   chunk 2: "\nworld"      resumes at start 5 → match at 5
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelimiterScanner {
    delimiter: Vec<u8>,
    /// First start position not yet examined.
    next_start: usize,
}

impl DelimiterScanner {
    /// Create a scanner for `delimiter`.
    ///
    /// # Errors
    ///
    /// [`WireError::EmptyDelimiter`] if `delimiter` is empty.
    pub fn new(delimiter: impl Into<Vec<u8>>) -> Result<Self, WireError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(WireError::EmptyDelimiter);
        }
        Ok(Self {
            delimiter,
            next_start: 0,
        })
    }

    /// Scanner for a single byte, e.g. `0x00` for null-terminated strings.
    #[must_use]
    pub fn byte(b: u8) -> Self {
        Self {
            delimiter: vec![b],
            next_start: 0,
        }
    }

    /// The bytes being searched for.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Search `haystack` for the delimiter.
    ///
    /// Returns the offset of the first match. On a miss, remembers how
    /// far the search got so the next call with a longer haystack skips
    /// the positions already ruled out.
    pub fn find(&mut self, haystack: &[u8]) -> Option<usize> {
        let width = self.delimiter.len();
        let found = haystack
            .get(self.next_start..)
            .and_then(|tail| tail.windows(width).position(|w| w == self.delimiter.as_slice()))
            .map(|pos| self.next_start + pos);

        match found {
            Some(offset) => {
                self.next_start = 0;
                Some(offset)
            }
            None => {
                // Every start that fits entirely in the haystack was a miss.
                let exhausted = (haystack.len() + 1).saturating_sub(width);
                self.next_start = self.next_start.max(exhausted);
                None
            }
        }
    }

    /// Forget any progress, as if the scanner had never been called.
    pub fn reset(&mut self) {
        self.next_start = 0;
    }
}
