//! SQLite engine
//!
//! [`SqliteBackend`] runs statements through `rusqlite` on connections from
//! an `r2d2` pool. Every connection is configured by the pool's init hook:
//! a busy timeout always, and WAL journaling for file databases.
//!
//! Query cursors own their pooled connection. The connection moves onto the
//! cursor's reader thread, which prepares the statement there and streams
//! rows back (see [`StreamingCursor`]); dropping the cursor finalizes the
//! statement and returns the connection to the pool.
//!
//! SQLite has no wire-level pipelining. A sent batch holds one connection
//! and runs its statements one at a time, in order, as their results are
//! consumed. Statements whose results are never consumed never run.

use crate::backend::{Backend, BatchResults};
use crate::config::{SqlConfig, SqliteTarget};
use crate::cursor::StreamingCursor;
use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::statement::Statement;
use crate::value::{Row, SqlValue};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, ToSql};
use sqlds_core::Result;
use std::fmt;
use tracing::{info, warn};

/// Pool of SQLite connections
pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

type SqliteConnection = PooledConnection<SqliteConnectionManager>;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Copy every column of a SQLite row
fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let count = row.as_ref().column_count();
    let mut columns = Vec::with_capacity(count);
    for index in 0..count {
        let value = match row.get_ref(index)? {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(
                std::str::from_utf8(t)
                    .map_err(rusqlite::Error::Utf8Error)?
                    .to_string(),
            ),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        };
        columns.push(value);
    }
    Ok(Row::new(columns))
}

fn execute_on(conn: &Connection, statement: &Statement) -> std::result::Result<u64, SqlError> {
    let mut prepared = conn.prepare_cached(statement.sql())?;
    let changed = prepared.execute(params_from_iter(statement.params()))?;
    Ok(changed as u64)
}

/// Pending statements of a sent batch, holding their connection
pub struct SqliteBatchResults {
    conn: SqliteConnection,
    pending: std::vec::IntoIter<Statement>,
    total: usize,
}

impl SqliteBatchResults {
    /// Statements not executed yet
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl BatchResults for SqliteBatchResults {
    fn exec(&mut self) -> std::result::Result<u64, SqlError> {
        let statement = self
            .pending
            .next()
            .ok_or(SqlError::BatchExhausted(self.total))?;
        execute_on(&self.conn, &statement)
    }
}

impl fmt::Debug for SqliteBatchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBatchResults")
            .field("total", &self.total)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// SQLite backend on an `r2d2` connection pool
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open the database named by `config` and build its pool
    ///
    /// An in-memory database exists once per connection, so it always gets
    /// a pool of exactly one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the first
    /// connections cannot be opened.
    pub fn open(config: &SqlConfig) -> Result<Self> {
        config.validate()?;
        let busy_timeout = config.busy_timeout();
        let (manager, max_size) = match config.sqlite_target()? {
            SqliteTarget::Memory => {
                if config.max_connections > 1 {
                    warn!(
                        target: "sqlds::open",
                        max_connections = config.max_connections,
                        "In-memory SQLite database limited to one connection"
                    );
                }
                let manager = SqliteConnectionManager::memory()
                    .with_init(move |conn| conn.busy_timeout(busy_timeout));
                (manager, 1)
            }
            SqliteTarget::File(path) => {
                let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
                    conn.busy_timeout(busy_timeout)?;
                    conn.execute_batch("PRAGMA journal_mode = WAL;")
                });
                (manager, config.max_connections)
            }
        };

        let pool = r2d2::Pool::builder()
            .max_size(max_size)
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(SqlError::from)?;

        info!(
            target: "sqlds::open",
            url = %config.url,
            max_connections = max_size,
            "Opened SQLite pool"
        );
        Ok(SqliteBackend { pool })
    }

    /// Use an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        SqliteBackend { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("SqliteBackend")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl Backend for SqliteBackend {
    type Cursor = StreamingCursor;
    type BatchResults = SqliteBatchResults;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, statement: &Statement) -> std::result::Result<u64, SqlError> {
        let conn = self.pool.get()?;
        execute_on(&conn, statement)
    }

    fn query_row(&self, statement: &Statement) -> std::result::Result<Option<Row>, SqlError> {
        let conn = self.pool.get()?;
        let mut prepared = conn.prepare_cached(statement.sql())?;
        let row = prepared
            .query_row(params_from_iter(statement.params()), decode_row)
            .optional()?;
        Ok(row)
    }

    fn query(&self, statement: &Statement) -> std::result::Result<StreamingCursor, SqlError> {
        let conn = self.pool.get()?;
        let statement = statement.clone();
        StreamingCursor::spawn(conn, move |conn, sink| {
            let mut prepared = conn.prepare(statement.sql())?;
            let mut rows = prepared.query(params_from_iter(statement.params()))?;
            sink.ready();
            while let Some(row) = rows.next()? {
                if !sink.send(decode_row(row)?) {
                    break;
                }
            }
            Ok(())
        })
    }

    fn send_batch(
        &self,
        statements: Vec<Statement>,
    ) -> std::result::Result<SqliteBatchResults, SqlError> {
        let conn = self.pool.get()?;
        Ok(SqliteBatchResults {
            conn,
            total: statements.len(),
            pending: statements.into_iter(),
        })
    }
}
