//! Configuration Tests
//!
//! Opening datastores from TOML files and rejecting bad options.

use crate::common::*;
use sqlds::{Error, Key, Read, SqlConfig, SqlDatastore, Write};
use tempfile::TempDir;

#[test]
fn open_from_toml_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("kv.db");
    let config_path = dir.path().join("sqlds.toml");
    std::fs::write(
        &config_path,
        format!(
            "url = \"sqlite:{}\"\ntable = \"kv_blocks\"\nmax_connections = 3\ncreate_table = true\n",
            db.display()
        ),
    )
    .unwrap();

    let config = SqlConfig::from_file(&config_path).unwrap();
    assert_eq!(config.table, "kv_blocks");
    assert_eq!(config.max_connections, 3);

    let store = SqlDatastore::open(&config).unwrap();
    store.put(&Key::new("/a"), b"v").unwrap();
    assert_eq!(store.get(&Key::new("/a")).unwrap(), b"v");
    assert_eq!(store.statements().table().as_str(), "kv_blocks");
    assert_eq!(store.backend().max_connections(), 3);
    assert!(store.backend().as_sqlite().is_some());
}

#[test]
fn tables_are_independent() {
    let dir = TempDir::new().unwrap();
    let base = TestStore::config_for(&dir);
    let first = SqlDatastore::open(&base.clone().with_table("first")).unwrap();
    let second = SqlDatastore::open(&base.with_table("second")).unwrap();

    first.put(&Key::new("/a"), b"1").unwrap();
    assert!(!second.has(&Key::new("/a")).unwrap());
}

#[test]
fn injection_in_table_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = TestStore::config_for(&dir).with_table("blocks; DROP TABLE blocks");
    assert!(matches!(
        SqlDatastore::open(&config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn unsupported_url_is_rejected() {
    let config = SqlConfig::new("mysql://localhost/blocks");
    assert!(matches!(
        SqlDatastore::open(&config),
        Err(Error::InvalidConfig(_))
    ));
}
