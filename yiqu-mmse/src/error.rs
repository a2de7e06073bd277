//! Error types for the assessment engine.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while administering an assessment.
#[derive(Debug, Error)]
pub enum Error {
    /// The operator's input stream ended before the run finished.
    #[error("operator input closed")]
    InputClosed,

    /// An answer was submitted after the last item was scored.
    #[error("assessment already complete")]
    AlreadyComplete,

    /// A report was requested before every item was scored.
    #[error("assessment incomplete: {answered} of {total} items answered")]
    Incomplete { answered: usize, total: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
