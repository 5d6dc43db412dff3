//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use sqlds::{Key, SqlConfig, SqlDatastore, Write};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (visible with --nocapture)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// TestStore - SQLite datastore in a temporary directory
// ============================================================================

/// File-backed datastore that lives as long as its directory
pub struct TestStore {
    pub store: SqlDatastore,
    pub dir: TempDir,
}

impl TestStore {
    /// Store with default options and the table created
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Store with adjusted options
    pub fn with_config(adjust: impl FnOnce(SqlConfig) -> SqlConfig) -> Self {
        init_tracing();
        let dir = TempDir::new().expect("temp dir");
        let config = adjust(Self::config_for(&dir));
        let store = SqlDatastore::open(&config).expect("open store");
        TestStore { store, dir }
    }

    /// Default config pointing into `dir`
    pub fn config_for(dir: &TempDir) -> SqlConfig {
        SqlConfig::new(format!("sqlite://{}", dir.path().join("blocks.db").display()))
            .with_create_table(true)
            .with_connection_timeout(Duration::from_secs(5))
    }

    /// Open a second datastore on the same database file
    pub fn reopen(&self) -> SqlDatastore {
        SqlDatastore::open(&Self::config_for(&self.dir)).expect("reopen store")
    }

    /// Idle and total pool connections
    pub fn pool_state(&self) -> (u32, u32) {
        self.store.backend().pool_state()
    }
}

// ============================================================================
// Data helpers
// ============================================================================

/// Write `/<prefix>/k00 .. k<n-1>` with single-byte values `0..n`
pub fn fill(store: &impl Write, prefix: &str, n: u8) {
    for i in 0..n {
        store
            .put(&Key::new(format!("{}/k{:02}", prefix, i)), &[i])
            .expect("put");
    }
}

/// Keys of a drained query
pub fn keys(entries: &[sqlds::Entry]) -> Vec<String> {
    entries.iter().map(|e| e.key.clone()).collect()
}
