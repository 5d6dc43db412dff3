//! Postgres engine
//!
//! [`PostgresBackend`] runs statements through the synchronous `postgres`
//! client on connections from an `r2d2` pool. Queries stream through
//! `query_raw` on the cursor's reader thread, so a result set is fetched a
//! window at a time like it is on SQLite.
//!
//! Batches hold one connection and run their statements in order as their
//! results are consumed. Nothing is pipelined or wrapped in a transaction.

use crate::backend::{Backend, BatchResults};
use crate::config::{SqlConfig, Target};
use crate::cursor::StreamingCursor;
use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::statement::Statement;
use crate::value::{Row, SqlValue};
use postgres::fallible_iterator::FallibleIterator;
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls};
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use sqlds_core::{Error, Result};
use std::fmt;
use tracing::info;

/// Pool of Postgres connections
pub type PostgresPool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

type PostgresConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

type Param = Box<dyn ToSql + Sync>;

/// Driver parameter for a bound value
///
/// NULL is bound as a `BYTEA` null, the only column type the datastore
/// ever writes a NULL into.
fn param(value: &SqlValue) -> Param {
    match value {
        SqlValue::Null => Box::new(Option::<Vec<u8>>::None),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::Integer(i) => Box::new(*i),
        SqlValue::Real(f) => Box::new(*f),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Blob(b) => Box::new(b.clone()),
    }
}

fn params(statement: &Statement) -> Vec<Param> {
    statement.params().iter().map(param).collect()
}

fn borrowed(params: &[Param]) -> impl ExactSizeIterator<Item = &dyn ToSql> {
    params.iter().map(|p| &**p as &dyn ToSql)
}

fn column<'a, T>(row: &'a postgres::Row, index: usize) -> std::result::Result<Option<T>, SqlError>
where
    T: postgres::types::FromSql<'a>,
{
    Ok(row.try_get::<_, Option<T>>(index)?)
}

/// Copy every column of a Postgres row
fn decode_row(row: &postgres::Row) -> std::result::Result<Row, SqlError> {
    let mut columns = Vec::with_capacity(row.len());
    for (index, col) in row.columns().iter().enumerate() {
        let ty = col.type_();
        let value = if *ty == Type::BOOL {
            column::<bool>(row, index)?.map(SqlValue::Bool)
        } else if *ty == Type::INT2 {
            column::<i16>(row, index)?.map(|v| SqlValue::Integer(i64::from(v)))
        } else if *ty == Type::INT4 {
            column::<i32>(row, index)?.map(|v| SqlValue::Integer(i64::from(v)))
        } else if *ty == Type::INT8 {
            column::<i64>(row, index)?.map(SqlValue::Integer)
        } else if *ty == Type::FLOAT4 {
            column::<f32>(row, index)?.map(|v| SqlValue::Real(f64::from(v)))
        } else if *ty == Type::FLOAT8 {
            column::<f64>(row, index)?.map(SqlValue::Real)
        } else if *ty == Type::BYTEA {
            column::<Vec<u8>>(row, index)?.map(SqlValue::Blob)
        } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
            column::<String>(row, index)?.map(SqlValue::Text)
        } else {
            return Err(SqlError::Column {
                index,
                message: format!("unsupported column type {}", ty),
            });
        };
        columns.push(value.unwrap_or(SqlValue::Null));
    }
    Ok(Row::new(columns))
}

fn execute_on(client: &mut Client, statement: &Statement) -> std::result::Result<u64, SqlError> {
    let params = params(statement);
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| &**p).collect();
    Ok(client.execute(statement.sql(), &refs)?)
}

/// Pending statements of a sent batch, holding their connection
pub struct PostgresBatchResults {
    conn: PostgresConnection,
    pending: std::vec::IntoIter<Statement>,
    total: usize,
}

impl PostgresBatchResults {
    /// Statements not executed yet
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl BatchResults for PostgresBatchResults {
    fn exec(&mut self) -> std::result::Result<u64, SqlError> {
        let statement = self
            .pending
            .next()
            .ok_or(SqlError::BatchExhausted(self.total))?;
        execute_on(&mut self.conn, &statement)
    }
}

impl fmt::Debug for PostgresBatchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresBatchResults")
            .field("total", &self.total)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Postgres backend on an `r2d2` connection pool
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PostgresPool,
}

impl PostgresBackend {
    /// Connect to the server named by `config` and build its pool
    ///
    /// The pool opens its connections up front, so an unreachable server is
    /// reported here after `connection_timeout` rather than on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a bad or non-Postgres connection
    /// string and [`Error::Backend`] if the server cannot be reached.
    pub fn open(config: &SqlConfig) -> Result<Self> {
        config.validate()?;
        let url = match config.target()? {
            Target::Postgres(url) => url,
            Target::Sqlite(_) => {
                return Err(Error::InvalidConfig(format!(
                    "connection string '{}' names a SQLite database, not a Postgres server",
                    config.url
                )))
            }
        };
        let mut client_config: postgres::Config = url.parse().map_err(|e| {
            Error::InvalidConfig(format!("invalid Postgres connection string: {}", e))
        })?;
        client_config.connect_timeout(config.connection_timeout());
        let database = client_config.get_dbname().unwrap_or_default().to_string();

        let manager = PostgresConnectionManager::new(client_config, NoTls);
        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(SqlError::from)?;

        info!(
            target: "sqlds::open",
            database = %database,
            max_connections = config.max_connections,
            "Opened Postgres pool"
        );
        Ok(PostgresBackend { pool })
    }

    /// Use an existing pool
    pub fn from_pool(pool: PostgresPool) -> Self {
        PostgresBackend { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PostgresBackend")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl Backend for PostgresBackend {
    type Cursor = StreamingCursor;
    type BatchResults = PostgresBatchResults;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&self, statement: &Statement) -> std::result::Result<u64, SqlError> {
        let mut conn = self.pool.get()?;
        execute_on(&mut conn, statement)
    }

    fn query_row(&self, statement: &Statement) -> std::result::Result<Option<Row>, SqlError> {
        let mut conn = self.pool.get()?;
        let params = params(statement);
        let mut rows = conn.query_raw(statement.sql(), borrowed(&params))?;
        let first = rows.next()?;
        first.map(|row| decode_row(&row)).transpose()
    }

    fn query(&self, statement: &Statement) -> std::result::Result<StreamingCursor, SqlError> {
        let conn = self.pool.get()?;
        let statement = statement.clone();
        StreamingCursor::spawn(conn, move |conn, sink| {
            let params = params(&statement);
            let mut rows = conn.query_raw(statement.sql(), borrowed(&params))?;
            sink.ready();
            while let Some(row) = rows.next()? {
                if !sink.send(decode_row(&row)?) {
                    break;
                }
            }
            Ok(())
        })
    }

    fn send_batch(
        &self,
        statements: Vec<Statement>,
    ) -> std::result::Result<PostgresBatchResults, SqlError> {
        let conn = self.pool.get()?;
        Ok(PostgresBatchResults {
            conn,
            total: statements.len(),
            pending: statements.into_iter(),
        })
    }
}
