//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = ChainError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while building, persisting, or walking a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain order is zero at an operation that requires an initialised chain.
    #[error("inadmissible chain order: the chain has no order set")]
    InvalidOrder,
    /// A state-table lookup missed.
    #[error("state not found")]
    NotFound,
    /// Generation was requested for a key never observed during training.
    #[error("cannot generate a word after {key:?}")]
    CannotGenerate {
        /// The key that has no recorded successors.
        key: Vec<String>,
    },
    /// The persisted chain is structurally malformed.
    #[error("corrupt chain format: {0}")]
    CorruptFormat(String),
    /// The persisted chain declares an invalid order or a state key of the wrong length.
    #[error("chain string has wrong order: {0}")]
    WrongOrder(String),
    /// The persisted chain ended before a complete record or the trailer was read.
    #[error("truncated chain input: {0}")]
    TruncatedInput(String),
    /// A word cannot be represented in the persisted format.
    #[error("invalid word {0:?}")]
    InvalidWord(String),
    /// A raw word is not valid UTF-8.
    #[error("malformed text encoding: {0}")]
    Encoding(String),
    /// Fetching a remote text source failed.
    #[error("failed to fetch {source_id}: {message}")]
    Transport {
        /// Identifier of the source being fetched.
        source_id: String,
        /// Description of the failure reported by the fetch utility.
        message: String,
    },
    /// Filesystem or stream IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err, None)
    }
}

impl ChainError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` for failures raised while parsing a persisted chain.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptFormat(_) | Self::WrongOrder(_) | Self::TruncatedInput(_)
        )
    }
}
