//! Datastore Property Tests
//!
//! Each contract property checked against a file-backed SQLite store.

use crate::common::*;
use sqlds::query::{Entry, FilterFn, FilterKeyCompare, Op, OrderByValueDescending};
use sqlds::{Batch, Batching, Datastore, Error, Key, Query, Read, Write};
use std::sync::Arc;

// ============================================================================
// Single-key primitives
// ============================================================================

#[test]
fn put_then_get_round_trips() {
    let t = TestStore::new();
    let key = Key::new("/blocks/QmFoo");
    let value: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    t.store.put(&key, &value).unwrap();
    assert_eq!(t.store.get(&key).unwrap(), value);
}

#[test]
fn keys_are_canonicalized_on_every_path() {
    let t = TestStore::new();
    t.store.put(&Key::new("blocks//a/./b/"), b"v").unwrap();
    assert_eq!(t.store.get(&Key::new("/blocks/a/b")).unwrap(), b"v");
    let entries = t.store.query(Query::new().keys_only()).unwrap().rest().unwrap();
    assert_eq!(keys(&entries), vec!["/blocks/a/b"]);
}

#[test]
fn delete_makes_key_not_found() {
    let t = TestStore::new();
    let key = Key::new("/a");
    t.store.put(&key, b"v").unwrap();
    t.store.delete(&key).unwrap();
    assert!(matches!(t.store.get(&key), Err(Error::NotFound(_))));
    assert!(matches!(t.store.get_size(&key), Err(Error::NotFound(_))));
    assert!(!t.store.has(&key).unwrap());
}

#[test]
fn repeated_put_is_idempotent() {
    let t = TestStore::new();
    let key = Key::new("/a");
    for _ in 0..3 {
        t.store.put(&key, b"same").unwrap();
    }
    assert_eq!(t.store.get(&key).unwrap(), b"same");
    let entries = t.store.query(Query::new()).unwrap().rest().unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn has_agrees_with_get() {
    let t = TestStore::new();
    fill(&t.store, "/h", 3);
    for i in 0..6u8 {
        let key = Key::new(format!("/h/k{:02}", i));
        assert_eq!(t.store.has(&key).unwrap(), t.store.get(&key).is_ok());
    }
}

#[test]
fn size_equals_value_length() {
    let t = TestStore::new();
    for len in [0usize, 1, 255, 70_000] {
        let key = Key::new(format!("/size/{}", len));
        t.store.put(&key, &vec![7u8; len]).unwrap();
        assert_eq!(t.store.get_size(&key).unwrap(), len);
    }
}

#[test]
fn writes_survive_reopen() {
    let t = TestStore::new();
    t.store.put(&Key::new("/durable"), b"yes").unwrap();
    t.store.sync(&Key::new("/")).unwrap();
    t.store.close().unwrap();
    let reopened = t.reopen();
    assert_eq!(reopened.get(&Key::new("/durable")).unwrap(), b"yes");
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn prefix_matches_whole_segments() {
    let t = TestStore::new();
    for key in ["/a", "/a/1", "/a/1/x", "/ab", "/ab/1", "/b/a/1"] {
        t.store.put(&Key::new(key), b"v").unwrap();
    }
    let entries = t
        .store
        .query(Query::new().with_prefix("/a").keys_only())
        .unwrap()
        .rest()
        .unwrap();
    assert_eq!(keys(&entries), vec!["/a/1", "/a/1/x"]);
}

#[test]
fn prefix_match_is_case_sensitive() {
    let t = TestStore::new();
    t.store.put(&Key::new("/Blocks/1"), b"v").unwrap();
    t.store.put(&Key::new("/blocks/1"), b"v").unwrap();
    let entries = t
        .store
        .query(Query::new().with_prefix("/blocks"))
        .unwrap()
        .rest()
        .unwrap();
    assert_eq!(keys(&entries), vec!["/blocks/1"]);
}

#[test]
fn filter_runs_before_limit() {
    let t = TestStore::new();
    fill(&t.store, "/f", 20);
    let query = Query::new()
        .with_prefix("/f")
        .with_filter(Arc::new(FilterKeyCompare::new(Op::GreaterThanOrEqual, "/f/k15")))
        .with_limit(3);
    let entries = t.store.query(query).unwrap().rest().unwrap();
    assert_eq!(keys(&entries), vec!["/f/k15", "/f/k16", "/f/k17"]);
}

#[test]
fn filters_and_orders_compose() {
    let t = TestStore::new();
    fill(&t.store, "/o", 10);
    let query = Query::new()
        .with_prefix("/o")
        .with_filter(Arc::new(FilterFn(|e: &Entry| e.value_bytes()[0] >= 4)))
        .with_order(Arc::new(OrderByValueDescending))
        .with_offset(1)
        .with_limit(3);
    let entries = t.store.query(query).unwrap().rest().unwrap();
    assert_eq!(keys(&entries), vec!["/o/k08", "/o/k07", "/o/k06"]);
}

#[test]
fn pushed_down_pagination_walks_in_key_order() {
    let t = TestStore::new();
    fill(&t.store, "/p", 25);
    let mut seen = Vec::new();
    for page in 0..3 {
        let entries = t
            .store
            .query(
                Query::new()
                    .with_prefix("/p")
                    .keys_only()
                    .with_offset(page * 10)
                    .with_limit(10),
            )
            .unwrap()
            .rest()
            .unwrap();
        seen.extend(keys(&entries));
    }
    let expected: Vec<String> = (0..25).map(|i| format!("/p/k{:02}", i)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn keys_only_with_sizes_never_carries_values() {
    let t = TestStore::new();
    t.store.put(&Key::new("/s/a"), b"abcd").unwrap();
    t.store.put(&Key::new("/s/b"), b"").unwrap();
    let entries = t
        .store
        .query(Query::new().with_prefix("/s").keys_only().returns_sizes())
        .unwrap()
        .rest()
        .unwrap();
    assert_eq!(
        entries,
        vec![Entry::key_with_size("/s/a", 4), Entry::key_with_size("/s/b", 0)]
    );
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn batch_applies_in_submission_order() {
    let t = TestStore::new();
    t.store.put(&Key::new("/b/old"), b"x").unwrap();

    let mut batch = t.store.batch().unwrap();
    batch.delete(&Key::new("/b/old")).unwrap();
    batch.put(&Key::new("/b/new"), b"1").unwrap();
    batch.put(&Key::new("/b/new"), b"2").unwrap();
    batch.put(&Key::new("/b/old"), b"back").unwrap();
    batch.delete(&Key::new("/b/new")).unwrap();
    batch.put(&Key::new("/b/new"), b"3").unwrap();
    batch.commit().unwrap();

    assert_eq!(t.store.get(&Key::new("/b/old")).unwrap(), b"back");
    assert_eq!(t.store.get(&Key::new("/b/new")).unwrap(), b"3");
}

#[test]
fn large_batch_commits() {
    let t = TestStore::new();
    let mut batch = t.store.batch().unwrap();
    for i in 0..500u32 {
        batch
            .put(&Key::new(format!("/bulk/{:04}", i)), &i.to_be_bytes())
            .unwrap();
    }
    batch.commit().unwrap();
    let entries = t
        .store
        .query(Query::new().with_prefix("/bulk").keys_only())
        .unwrap()
        .rest()
        .unwrap();
    assert_eq!(entries.len(), 500);
}
