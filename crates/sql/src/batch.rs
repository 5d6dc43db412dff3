//! Batch accumulator
//!
//! [`SqlBatch`] queues one statement per put or delete and sends them all
//! to the backend on commit, as one ordered batch on one connection. The
//! batch is not wrapped in a transaction: statements that ran before a
//! failure stay applied, and the failure is reported as
//! [`Error::PartialBatch`] so the caller knows how far it got.

use crate::backend::{Backend, BatchResults};
use crate::statement::{Statement, Statements};
use sqlds_core::{Batch, Error, Key, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pending writes against a [`SqlDatastore`](crate::SqlDatastore)
#[derive(Debug)]
pub struct SqlBatch<B: Backend> {
    backend: Arc<B>,
    statements: Arc<Statements>,
    queued: Vec<Statement>,
}

impl<B: Backend> SqlBatch<B> {
    pub(crate) fn new(backend: Arc<B>, statements: Arc<Statements>) -> Self {
        SqlBatch {
            backend,
            statements,
            queued: Vec::new(),
        }
    }

    /// Number of queued statements
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

impl<B: Backend> Batch for SqlBatch<B> {
    fn put(&mut self, key: &Key, value: &[u8]) -> Result<()> {
        self.queued.push(self.statements.put(key, value));
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.queued.push(self.statements.delete(key));
        Ok(())
    }

    fn commit(self) -> Result<()> {
        let total = self.queued.len();
        if total == 0 {
            return Ok(());
        }
        debug!(target: "sqlds::batch", statements = total, "Committing batch");

        let mut results = self.backend.send_batch(self.queued)?;
        for applied in 0..total {
            if let Err(e) = results.exec() {
                let error = Error::from(e);
                if applied == 0 {
                    return Err(error);
                }
                warn!(
                    target: "sqlds::batch",
                    applied,
                    total,
                    error = %error,
                    "Batch partially applied"
                );
                return Err(Error::PartialBatch {
                    applied,
                    total,
                    source: Box::new(error),
                });
            }
        }
        Ok(())
    }
}
