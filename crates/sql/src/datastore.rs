//! SQL-table-backed datastore
//!
//! [`SqlDatastore`] maps every datastore primitive onto one statement
//! against a `(key, data)` table and answers queries with a single `SELECT`
//! plus whatever naive stages the translator could not push into SQL.
//!
//! [`SqlDatastore::open`] picks the engine from the connection string; any
//! other [`Backend`] can be supplied with [`SqlDatastore::with_backend`].

use crate::any::AnyBackend;
use crate::backend::Backend;
use crate::batch::SqlBatch;
use crate::config::{SqlConfig, TableName};
use crate::rows::EntryRows;
use crate::statement::Statements;
use crate::translate::translate;
use sqlds_core::{Batching, Datastore, Error, Key, Query, Read, Result, Results, Write};
use std::sync::Arc;
use tracing::{debug, info};

/// Datastore over one SQL table
///
/// Cheap to clone; clones share the backend and its pool.
#[derive(Debug)]
pub struct SqlDatastore<B: Backend = AnyBackend> {
    backend: Arc<B>,
    statements: Arc<Statements>,
}

impl SqlDatastore<AnyBackend> {
    /// Open a datastore on the engine the connection string names
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the database
    /// cannot be opened, or the table cannot be created.
    pub fn open(config: &SqlConfig) -> Result<Self> {
        let table = config.table_name()?;
        let backend = AnyBackend::open(config)?;
        let store = SqlDatastore::with_backend(backend, table);
        if config.create_table {
            store.create_table()?;
        }
        Ok(store)
    }
}

impl<B: Backend> SqlDatastore<B> {
    /// Datastore over `table` on an existing backend
    pub fn with_backend(backend: B, table: TableName) -> Self {
        let statements = Statements::new(backend.dialect(), table);
        SqlDatastore {
            backend: Arc::new(backend),
            statements: Arc::new(statements),
        }
    }

    /// The backend this datastore runs on
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// SQL text used for the primitives
    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    /// Create the table if it does not exist
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the statement fails.
    pub fn create_table(&self) -> Result<()> {
        self.backend.execute(&self.statements.create_table())?;
        info!(
            target: "sqlds::open",
            table = %self.statements.table(),
            "Ensured table exists"
        );
        Ok(())
    }
}

impl<B: Backend> Clone for SqlDatastore<B> {
    fn clone(&self) -> Self {
        SqlDatastore {
            backend: Arc::clone(&self.backend),
            statements: Arc::clone(&self.statements),
        }
    }
}

impl<B: Backend> Read for SqlDatastore<B> {
    fn get(&self, key: &Key) -> Result<Vec<u8>> {
        match self.backend.query_row(&self.statements.get(key))? {
            Some(row) => Ok(row.blob(0)?),
            None => Err(Error::NotFound(key.clone())),
        }
    }

    fn has(&self, key: &Key) -> Result<bool> {
        // EXISTS always yields a row; treat a missing one like get does
        match self.backend.query_row(&self.statements.has(key))? {
            Some(row) => Ok(row.boolean(0)?),
            None => Err(Error::NotFound(key.clone())),
        }
    }

    fn get_size(&self, key: &Key) -> Result<usize> {
        let row = self
            .backend
            .query_row(&self.statements.size(key))?
            .ok_or_else(|| Error::NotFound(key.clone()))?;
        Ok(row.size(0)?)
    }

    fn query(&self, query: Query) -> Result<Results> {
        let plan = translate(&self.statements, &query)?;
        debug!(
            target: "sqlds::query",
            sql = plan.statement.sql(),
            pushdown = plan.pushes_down_pagination(),
            filters = plan.residual.filters.len(),
            orders = plan.residual.orders.len(),
            query = %query,
            "Running query"
        );
        let cursor = self.backend.query(&plan.statement)?;
        let rows = EntryRows::new(cursor, plan.projection);
        Ok(plan.residual.apply(Results::new(query, rows)))
    }
}

impl<B: Backend> Write for SqlDatastore<B> {
    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        self.backend.execute(&self.statements.put(key, value))?;
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        self.backend.execute(&self.statements.delete(key))?;
        Ok(())
    }
}

impl<B: Backend> Datastore for SqlDatastore<B> {
    fn sync(&self, _prefix: &Key) -> Result<()> {
        Ok(())
    }

    /// The backend is shared with clones and with whoever supplied it, so
    /// closing only logs; the pool is released when the last handle drops.
    fn close(&self) -> Result<()> {
        info!(
            target: "sqlds::open",
            table = %self.statements.table(),
            "Closing datastore"
        );
        Ok(())
    }
}

impl<B: Backend> Batching for SqlDatastore<B> {
    type Batch = SqlBatch<B>;

    fn batch(&self) -> Result<SqlBatch<B>> {
        Ok(SqlBatch::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.statements),
        ))
    }
}
