//! SQL storage for sqlds
//!
//! This crate stores a datastore in one SQL table of `(key, data)` rows:
//! - SqlDatastore: the datastore, generic over a [`Backend`]
//! - Statements: one parameterized statement per primitive
//! - translate: query translation with limit/offset pushdown
//! - EntryRows: lazy row decoding into entries
//! - SqlBatch: ordered batches sent on one connection
//! - SqliteBackend: `rusqlite` on an `r2d2` pool
//! - PostgresBackend: the `postgres` client on an `r2d2` pool
//! - AnyBackend: whichever of the two a connection string names
//! - StreamingCursor: rows read ahead by a thread that owns the connection
//! - SqlConfig: connection string, table and pool options
//!
//! # Example
//!
//! ```no_run
//! use sqlds_core::{Key, Read, Write};
//! use sqlds_sql::{SqlConfig, SqlDatastore};
//!
//! let config = SqlConfig::new("sqlite:blocks.db").with_create_table(true);
//! let store = SqlDatastore::open(&config)?;
//! store.put(&Key::new("/blocks/a"), b"hello")?;
//! assert_eq!(store.get(&Key::new("/blocks/a"))?, b"hello");
//! # Ok::<(), sqlds_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod any;
pub mod backend;
pub mod batch;
pub mod config;
pub mod cursor;
pub mod datastore;
pub mod dialect;
pub mod error;
pub mod postgres;
pub mod rows;
pub mod sqlite;
pub mod statement;
pub mod translate;
pub mod value;

pub use any::{AnyBackend, AnyBatchResults};
pub use backend::{Backend, BatchResults};
pub use batch::SqlBatch;
pub use config::{SqlConfig, SqliteTarget, TableName, Target, DEFAULT_TABLE};
pub use cursor::{RowSink, StreamingCursor, READ_AHEAD};
pub use datastore::SqlDatastore;
pub use dialect::Dialect;
pub use error::SqlError;
pub use self::postgres::{PostgresBackend, PostgresBatchResults, PostgresPool};
pub use rows::EntryRows;
pub use sqlite::{SqliteBackend, SqliteBatchResults, SqlitePool};
pub use statement::{Statement, Statements};
pub use translate::{translate, Projection, QueryPlan, Residual};
pub use value::{Row, SqlValue};
