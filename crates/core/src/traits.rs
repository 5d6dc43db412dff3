//! Datastore traits
//!
//! These traits are the storage-interface contract every backend satisfies:
//! single-key reads and writes, queries returning lazy [`Results`], and
//! write batches committed in one round trip.
//!
//! Thread safety: a [`Datastore`] is shared between threads, so all of its
//! methods take `&self`. A [`Batch`] is owned by one caller from creation
//! until [`Batch::commit`] consumes it.

use crate::error::Result;
use crate::key::Key;
use crate::query::{Query, Results};

/// Read side of a datastore
pub trait Read {
    /// Value stored under `key`
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if there is no row for the
    /// key; any other error comes from the backend.
    fn get(&self, key: &Key) -> Result<Vec<u8>>;

    /// Whether a value is stored under `key`
    ///
    /// Absence is `Ok(false)`, not an error.
    fn has(&self, key: &Key) -> Result<bool>;

    /// Size in bytes of the value stored under `key`
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if there is no row for the key.
    fn get_size(&self, key: &Key) -> Result<usize>;

    /// Run a query
    ///
    /// The returned sequence may hold backend resources (a cursor on a
    /// pooled connection) until it is drained, closed or dropped.
    fn query(&self, query: Query) -> Result<Results>;
}

/// Write side of a datastore
pub trait Write {
    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &Key, value: &[u8]) -> Result<()>;

    /// Remove `key`; removing a missing key succeeds
    fn delete(&self, key: &Key) -> Result<()>;
}

/// A complete datastore
pub trait Datastore: Read + Write + Send + Sync {
    /// Make writes under `prefix` durable
    fn sync(&self, prefix: &Key) -> Result<()>;

    /// Release resources held by the datastore
    fn close(&self) -> Result<()>;
}

/// A set of writes sent together
pub trait Batch {
    /// Queue a put
    fn put(&mut self, key: &Key, value: &[u8]) -> Result<()>;

    /// Queue a delete
    fn delete(&mut self, key: &Key) -> Result<()>;

    /// Send every queued write, in the order queued
    fn commit(self) -> Result<()>;
}

/// A datastore that supports batches
pub trait Batching: Datastore {
    /// Batch type returned by [`Batching::batch`]
    type Batch: Batch;

    /// Start an empty batch
    fn batch(&self) -> Result<Self::Batch>;
}
