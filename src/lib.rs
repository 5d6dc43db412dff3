//! sqlds - key/value datastore on a SQL table
//!
//! Values are opaque byte strings stored under hierarchical keys, one row per
//! key, in a `(key, data)` table of a relational database.
//!
//! # Quick Start
//!
//! ```no_run
//! use sqlds::{Batch, Batching, Key, Query, Read, SqlConfig, SqlDatastore, Write};
//!
//! let config = SqlConfig::new("sqlite:blocks.db").with_create_table(true);
//! let store = SqlDatastore::open(&config)?;
//!
//! store.put(&Key::new("/blocks/a"), b"hello")?;
//! assert_eq!(store.get(&Key::new("/blocks/a"))?, b"hello");
//!
//! let mut batch = store.batch()?;
//! batch.put(&Key::new("/blocks/b"), b"world")?;
//! batch.delete(&Key::new("/blocks/a"))?;
//! batch.commit()?;
//!
//! for entry in store.query(Query::new().with_prefix("/blocks").keys_only())? {
//!     println!("{}", entry?.key);
//! }
//! # Ok::<(), sqlds::Error>(())
//! ```
//!
//! # Architecture
//!
//! `sqlds-core` defines keys, queries, lazy result sequences and the
//! datastore traits. `sqlds-sql` implements them over a SQL table through a
//! pluggable [`Backend`]; [`SqlDatastore::open`] picks SQLite or Postgres
//! from the connection string.

pub use sqlds_core::query;
pub use sqlds_core::{
    Batch, Batching, BoxError, Datastore, Entry, Error, Key, KeyError, MapBatch, MapDatastore,
    Query, Read, Result, Results, Write,
};
pub use sqlds_sql::{
    AnyBackend, Backend, BatchResults, Dialect, PostgresBackend, SqlBatch, SqlConfig,
    SqlDatastore, SqlError, SqliteBackend, Statement, StreamingCursor, TableName, Target,
    DEFAULT_TABLE,
};
