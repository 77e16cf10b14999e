use binstash_types::DEFAULT_SEPARATOR;

/// Tuning knobs shared by [`Parser`](crate::Parser) and
/// [`StreamParser`](crate::StreamParser).
///
/// ```text
/// ┌──────────────────┬─────────┬──────────────────────────────────────────┐
/// │ Field            │ Default │ Purpose                                  │
/// ├──────────────────┼─────────┼──────────────────────────────────────────┤
/// │ separator        │ '.'     │ Splits dotted keys into nested maps      │
/// │ read_chunk_size  │ 8 KiB   │ Bytes requested per read in read_from    │
/// │ backlog_capacity │ 4 KiB   │ Initial capacity of the stream backlog   │
/// └──────────────────┴─────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Path separator for keys. Also used to resolve size references.
    pub separator: char,

    /// Size of the buffer used when draining a reader into a stream.
    pub read_chunk_size: usize,

    /// Capacity the stream backlog is allocated with.
    pub backlog_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            read_chunk_size: 8 * 1024,
            backlog_capacity: 4 * 1024,
        }
    }
}
