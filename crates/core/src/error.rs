//! Error types for sqlds
//!
//! Every datastore operation returns [`Result`]. The variants keep "absent"
//! apart from "broken": [`Error::NotFound`] is a normal outcome of a read,
//! while [`Error::Backend`] carries whatever the storage engine reported,
//! untouched and never retried.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::key::{Key, KeyError};
use thiserror::Error;

/// Result type alias for datastore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error reported by a storage engine
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for datastore operations
#[derive(Debug, Error)]
pub enum Error {
    /// No row for the key; returned by get, has and get_size
    #[error("Key not found: {0}")]
    NotFound(Key),

    /// Failure reported by the backing engine (connection loss,
    /// constraint violation, statement error, ...)
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),

    /// A batch failed part way through; the first `applied` statements
    /// took effect and the rest did not run
    #[error("Batch partially applied ({applied} of {total} statements): {source}")]
    PartialBatch {
        /// Statements that completed before the failure
        applied: usize,
        /// Statements queued in the batch
        total: usize,
        /// The failure of statement number `applied`
        #[source]
        source: Box<Error>,
    },

    /// Query descriptor cannot be expressed against the engine
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid datastore configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A result row did not have the shape the projection expects
    #[error("Decode error: {0}")]
    Decode(String),

    /// Key is not in canonical form
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),
}

impl Error {
    /// Wrap an engine error
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(Box::new(error))
    }

    /// True for [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True for [`Error::PartialBatch`]
    pub fn is_partial_batch(&self) -> bool {
        matches!(self, Error::PartialBatch { .. })
    }
}
