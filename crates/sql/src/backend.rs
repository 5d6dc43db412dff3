//! Backend abstraction
//!
//! A [`Backend`] runs statements against one SQL engine. The datastore is
//! written against this trait only, so the engine can be swapped (or faked
//! in tests) without touching the statement builder or translator.
//!
//! Resource contract:
//! - `query` returns a cursor that keeps its connection checked out until
//!   the cursor is dropped
//! - `send_batch` returns a handle that keeps its connection checked out
//!   until the handle is dropped; each `exec` runs the next statement in
//!   submission order and reports its outcome

use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::statement::Statement;
use crate::value::Row;
use std::fmt;

/// Outcomes of a batch sent with [`Backend::send_batch`]
pub trait BatchResults {
    /// Outcome of the next statement: rows affected, or its error
    ///
    /// # Errors
    ///
    /// The statement's error, or [`SqlError::BatchExhausted`] when every
    /// statement has already been consumed.
    fn exec(&mut self) -> Result<u64, SqlError>;
}

/// A SQL engine
pub trait Backend: fmt::Debug + Send + Sync + 'static {
    /// Streaming row cursor; `Send` so result sequences can cross threads
    type Cursor: Iterator<Item = Result<Row, SqlError>> + Send + 'static;

    /// Handle on a sent batch
    type BatchResults: BatchResults;

    /// SQL flavor this engine understands
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns no rows
    fn execute(&self, statement: &Statement) -> Result<u64, SqlError>;

    /// Run a statement and return its first row, if any
    fn query_row(&self, statement: &Statement) -> Result<Option<Row>, SqlError>;

    /// Run a statement and stream its rows
    fn query(&self, statement: &Statement) -> Result<Self::Cursor, SqlError>;

    /// Send statements to run in order on one connection
    fn send_batch(&self, statements: Vec<Statement>) -> Result<Self::BatchResults, SqlError>;
}
