//! Error types for SQL storage.

use sqlds_core::BoxError;

/// Errors that can occur in SQL storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    /// A SQLite error occurred.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A Postgres error occurred.
    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    /// The connection pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A row did not have the expected column shape.
    #[error("column {index}: {message}")]
    Column {
        /// Zero-based column index
        index: usize,
        /// What was wrong with it
        message: String,
    },

    /// No thread could be started to read a cursor.
    #[error("failed to start cursor reader: {0}")]
    Spawn(#[source] std::io::Error),

    /// A cursor's reader thread panicked.
    #[error("cursor reader panicked")]
    ReaderPanicked,

    /// More batch results were requested than statements were sent.
    #[error("batch exhausted: all {0} statements already executed")]
    BatchExhausted(usize),

    /// An error from another driver implementing [`Backend`](crate::Backend).
    #[error("driver error: {0}")]
    Driver(#[source] BoxError),
}

impl SqlError {
    /// Wrap an error from another driver.
    pub fn driver<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SqlError::Driver(Box::new(error))
    }
}

impl From<SqlError> for sqlds_core::Error {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::Column { .. } => Self::Decode(error.to_string()),
            other => Self::Backend(Box::new(other)),
        }
    }
}
