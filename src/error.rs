//! Error types for conflux.

use thiserror::Error;

/// Result type for conflux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for conflux operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A span with `start == end` reached validation.
    ///
    /// Empty mentions carry no text and cannot be classified against
    /// anything; they are rejected at construction rather than silently
    /// matched.
    #[error("degenerate span: empty interval at offset {0}")]
    DegenerateSpan(usize),

    /// A span with `start > end` reached validation.
    #[error("invalid span: start {start} is past end {end}")]
    InvalidSpan {
        /// Claimed start offset.
        start: usize,
        /// Claimed end offset.
        end: usize,
    },

    /// A mention carried a type label outside the closed entity type set.
    #[error("unknown entity type label: {0:?}")]
    UnknownEntityType(String),

    /// A recognizer label could not be parsed.
    #[error("unknown recognizer label: {0:?}")]
    UnknownRecognizer(String),

    /// Weight store could not be read or written.
    ///
    /// Unlike per-mention faults, a missing or corrupt weight table is
    /// fatal: the combiner cannot vote without a coherent table.
    #[error("weight store error: {0}")]
    Store(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a weight store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }
}
