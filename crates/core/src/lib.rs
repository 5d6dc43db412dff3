//! Core types and traits for sqlds
//!
//! This crate defines the storage-interface contract that every sqlds
//! backend satisfies:
//! - Key: canonical hierarchical keys
//! - Error: error taxonomy separating "absent" from "broken"
//! - Query: query descriptors, entries and lazy result sequences
//! - Naive stages: in-memory filter/order/offset/limit over result sequences
//! - Traits: Read, Write, Datastore, Batch, Batching
//! - MapDatastore: in-memory reference implementation
//! - Conformance (feature `test-utils`): reusable backend test suite

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod mem;
pub mod query;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;

pub use error::{BoxError, Error, Result};
pub use key::{Key, KeyError};
pub use mem::{MapBatch, MapDatastore};
pub use query::{Entry, Query, Results};
pub use traits::{Batch, Batching, Datastore, Read, Write};
