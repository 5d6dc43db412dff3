//! Integration Tests
//!
//! End-to-end tests of the SQLite datastore through the public crate API:
//! - Properties: the datastore contract on a real database file
//! - Pool: cursors and batches hold and release pooled connections
//! - Concurrency: one datastore shared between threads
//! - Config: opening from TOML files

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod config;
mod pool;
mod properties;
