//! Engine chosen by connection string
//!
//! [`AnyBackend`] is what [`SqlDatastore::open`](crate::SqlDatastore::open)
//! builds: SQLite for `sqlite:` urls and file paths, Postgres for
//! `postgres://` and `postgresql://` urls.

use crate::backend::{Backend, BatchResults};
use crate::config::{SqlConfig, Target};
use crate::cursor::StreamingCursor;
use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::postgres::{PostgresBackend, PostgresBatchResults};
use crate::sqlite::{SqliteBackend, SqliteBatchResults};
use crate::statement::Statement;
use crate::value::Row;
use sqlds_core::Result;

/// SQLite or Postgres, decided at open time
#[derive(Debug, Clone)]
pub enum AnyBackend {
    /// SQLite database
    Sqlite(SqliteBackend),
    /// Postgres server
    Postgres(PostgresBackend),
}

impl AnyBackend {
    /// Open the engine the connection string names
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the engine
    /// cannot be reached.
    pub fn open(config: &SqlConfig) -> Result<Self> {
        match config.target()? {
            Target::Sqlite(_) => SqliteBackend::open(config).map(AnyBackend::Sqlite),
            Target::Postgres(_) => PostgresBackend::open(config).map(AnyBackend::Postgres),
        }
    }

    /// The SQLite backend, if that is the engine
    pub fn as_sqlite(&self) -> Option<&SqliteBackend> {
        match self {
            AnyBackend::Sqlite(backend) => Some(backend),
            AnyBackend::Postgres(_) => None,
        }
    }

    /// The Postgres backend, if that is the engine
    pub fn as_postgres(&self) -> Option<&PostgresBackend> {
        match self {
            AnyBackend::Postgres(backend) => Some(backend),
            AnyBackend::Sqlite(_) => None,
        }
    }

    /// Current `(idle, total)` connections in the pool
    pub fn pool_state(&self) -> (u32, u32) {
        let state = match self {
            AnyBackend::Sqlite(backend) => backend.pool().state(),
            AnyBackend::Postgres(backend) => backend.pool().state(),
        };
        (state.idle_connections, state.connections)
    }

    /// Configured pool size
    pub fn max_connections(&self) -> u32 {
        match self {
            AnyBackend::Sqlite(backend) => backend.pool().max_size(),
            AnyBackend::Postgres(backend) => backend.pool().max_size(),
        }
    }
}

impl From<SqliteBackend> for AnyBackend {
    fn from(backend: SqliteBackend) -> Self {
        AnyBackend::Sqlite(backend)
    }
}

impl From<PostgresBackend> for AnyBackend {
    fn from(backend: PostgresBackend) -> Self {
        AnyBackend::Postgres(backend)
    }
}

/// Batch handle of whichever engine ran it
#[derive(Debug)]
pub enum AnyBatchResults {
    /// SQLite batch
    Sqlite(SqliteBatchResults),
    /// Postgres batch
    Postgres(PostgresBatchResults),
}

impl BatchResults for AnyBatchResults {
    fn exec(&mut self) -> std::result::Result<u64, SqlError> {
        match self {
            AnyBatchResults::Sqlite(results) => results.exec(),
            AnyBatchResults::Postgres(results) => results.exec(),
        }
    }
}

impl Backend for AnyBackend {
    type Cursor = StreamingCursor;
    type BatchResults = AnyBatchResults;

    fn dialect(&self) -> Dialect {
        match self {
            AnyBackend::Sqlite(backend) => backend.dialect(),
            AnyBackend::Postgres(backend) => backend.dialect(),
        }
    }

    fn execute(&self, statement: &Statement) -> std::result::Result<u64, SqlError> {
        match self {
            AnyBackend::Sqlite(backend) => backend.execute(statement),
            AnyBackend::Postgres(backend) => backend.execute(statement),
        }
    }

    fn query_row(&self, statement: &Statement) -> std::result::Result<Option<Row>, SqlError> {
        match self {
            AnyBackend::Sqlite(backend) => backend.query_row(statement),
            AnyBackend::Postgres(backend) => backend.query_row(statement),
        }
    }

    fn query(&self, statement: &Statement) -> std::result::Result<StreamingCursor, SqlError> {
        match self {
            AnyBackend::Sqlite(backend) => backend.query(statement),
            AnyBackend::Postgres(backend) => backend.query(statement),
        }
    }

    fn send_batch(
        &self,
        statements: Vec<Statement>,
    ) -> std::result::Result<AnyBatchResults, SqlError> {
        match self {
            AnyBackend::Sqlite(backend) => {
                backend.send_batch(statements).map(AnyBatchResults::Sqlite)
            }
            AnyBackend::Postgres(backend) => {
                backend.send_batch(statements).map(AnyBatchResults::Postgres)
            }
        }
    }
}
