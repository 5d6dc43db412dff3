//! Connection Pool Tests
//!
//! A result sequence keeps one pooled connection checked out until it is
//! drained, closed or dropped. These tests run many more queries than the
//! pool has connections to show that every path gives the connection back.

use crate::common::*;
use sqlds::{Batch, Batching, Error, Key, Query, Read};
use std::time::Duration;

const POOL_SIZE: u32 = 2;

fn small_pool() -> TestStore {
    let t = TestStore::with_config(|config| {
        config
            .with_max_connections(POOL_SIZE)
            .with_connection_timeout(Duration::from_millis(300))
    });
    fill(&t.store, "/pool", 5);
    t
}

fn assert_all_idle(t: &TestStore) {
    let (idle, total) = t.pool_state();
    assert_eq!(idle, total, "connections still checked out");
}

#[test]
fn drained_sequences_release_connections() {
    let t = small_pool();
    for _ in 0..50 {
        let entries = t
            .store
            .query(Query::new().with_prefix("/pool"))
            .unwrap()
            .rest()
            .unwrap();
        assert_eq!(entries.len(), 5);
    }
    assert_all_idle(&t);
}

#[test]
fn closed_sequences_release_connections() {
    let t = small_pool();
    for _ in 0..50 {
        let mut results = t.store.query(Query::new().with_prefix("/pool")).unwrap();
        assert!(results.next().is_some());
        results.close();
        // Still usable for single-key reads while the sequence object lives
        assert_eq!(t.store.get(&Key::new("/pool/k00")).unwrap(), vec![0]);
    }
    assert_all_idle(&t);
}

#[test]
fn dropped_sequences_release_connections() {
    let t = small_pool();
    for _ in 0..50 {
        let mut results = t.store.query(Query::new().with_prefix("/pool")).unwrap();
        assert!(results.next().is_some());
        drop(results);
    }
    assert_all_idle(&t);
}

#[test]
fn limit_releases_connection_without_draining() {
    let t = small_pool();
    for _ in 0..50 {
        let entries: Vec<_> = t
            .store
            .query(Query::new().with_prefix("/pool").with_limit(1))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
    assert_all_idle(&t);
}

#[test]
fn open_sequences_hold_connections() {
    let t = small_pool();
    let held: Vec<_> = (0..POOL_SIZE)
        .map(|_| t.store.query(Query::new().with_prefix("/pool")).unwrap())
        .collect();

    // Every connection is checked out, so the next checkout times out
    let err = t.store.get(&Key::new("/pool/k00")).unwrap_err();
    assert!(matches!(err, Error::Backend(_)));

    drop(held);
    assert_eq!(t.store.get(&Key::new("/pool/k00")).unwrap(), vec![0]);
    assert_all_idle(&t);
}

#[test]
fn committed_batches_release_connections() {
    let t = small_pool();
    for i in 0..50u8 {
        let mut batch = t.store.batch().unwrap();
        batch.put(&Key::new(format!("/pool/batch/{}", i)), &[i]).unwrap();
        batch.commit().unwrap();
    }
    assert_all_idle(&t);
}
