//! Conformance tests for datastore backends.
//!
//! These tests verify that any backend implementation behaves correctly
//! according to the datastore trait contract. To use these tests with a
//! custom backend, call [`conformance`] (or the individual test functions)
//! with your datastore instance.
//!
//! Every test writes below its own `/conformance/<name>` namespace, so the
//! whole suite can run against a single store.

use crate::error::{Error, Result};
use crate::key::Key;
use crate::query::{Entry, Filter, FilterFn, OrderByKeyDescending, Query};
use crate::traits::{Batch, Batching};
use std::sync::Arc;

/// Run all conformance tests against a datastore.
pub fn conformance<D: Batching>(store: &D) -> Result<()> {
    test_put_get_roundtrip(store)?;
    test_get_missing(store)?;
    test_delete(store)?;
    test_put_overwrites(store)?;
    test_has_matches_get(store)?;
    test_get_size(store)?;
    test_sync(store)?;
    test_prefix_query(store)?;
    test_root_prefix_query(store)?;
    test_filter_then_limit(store)?;
    test_order_offset_limit(store)?;
    test_pushed_down_pagination(store)?;
    test_key_order_is_bytewise(store)?;
    test_projections(store)?;
    test_batch_order(store)?;
    test_empty_batch(store)?;
    test_close_results_early(store)?;
    Ok(())
}

fn key(test: &str, rest: &str) -> Key {
    Key::new(format!("/conformance/{}/{}", test, rest))
}

fn keys_of(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|e| e.key.clone()).collect()
}

/// Put followed by get returns the value.
pub fn test_put_get_roundtrip<D: Batching>(store: &D) -> Result<()> {
    let k = key("roundtrip", "a");
    store.put(&k, b"hello")?;
    assert_eq!(store.get(&k)?, b"hello");

    let empty = key("roundtrip", "empty");
    store.put(&empty, b"")?;
    assert_eq!(store.get(&empty)?, b"");

    let binary = key("roundtrip", "binary");
    let value: Vec<u8> = (0..=255).collect();
    store.put(&binary, &value)?;
    assert_eq!(store.get(&binary)?, value);
    Ok(())
}

/// Reading a missing key is NotFound, never a backend error.
pub fn test_get_missing<D: Batching>(store: &D) -> Result<()> {
    let k = key("missing", "nope");
    assert!(matches!(store.get(&k), Err(Error::NotFound(ref missing)) if *missing == k));
    assert!(matches!(store.get_size(&k), Err(Error::NotFound(_))));
    assert!(!store.has(&k)?);
    Ok(())
}

/// Delete removes the row; deleting again is a no-op.
pub fn test_delete<D: Batching>(store: &D) -> Result<()> {
    let k = key("delete", "a");
    store.put(&k, b"v")?;
    store.delete(&k)?;
    assert!(store.get(&k).unwrap_err().is_not_found());
    store.delete(&k)?;
    store.delete(&key("delete", "never-written"))?;
    Ok(())
}

/// Repeated puts are idempotent and the last write wins.
pub fn test_put_overwrites<D: Batching>(store: &D) -> Result<()> {
    let k = key("overwrite", "a");
    store.put(&k, b"v1")?;
    store.put(&k, b"v1")?;
    assert_eq!(store.get(&k)?, b"v1");
    store.put(&k, b"v2-longer")?;
    assert_eq!(store.get(&k)?, b"v2-longer");
    Ok(())
}

/// has() is true exactly when get() finds a value.
pub fn test_has_matches_get<D: Batching>(store: &D) -> Result<()> {
    let present = key("has", "present");
    let absent = key("has", "absent");
    store.put(&present, b"x")?;
    assert!(store.has(&present)?);
    assert!(store.get(&present).is_ok());
    assert!(!store.has(&absent)?);
    assert!(store.get(&absent).unwrap_err().is_not_found());
    Ok(())
}

/// get_size() equals the stored length.
pub fn test_get_size<D: Batching>(store: &D) -> Result<()> {
    let k = key("size", "a");
    store.put(&k, b"12345")?;
    assert_eq!(store.get_size(&k)?, store.get(&k)?.len());
    assert_eq!(store.get_size(&k)?, 5);

    let empty = key("size", "empty");
    store.put(&empty, b"")?;
    assert_eq!(store.get_size(&empty)?, 0);
    Ok(())
}

/// sync() succeeds for any key.
pub fn test_sync<D: Batching>(store: &D) -> Result<()> {
    store.sync(&key("sync", "a"))?;
    store.sync(&Key::root())?;
    Ok(())
}

/// A prefix matches whole path segments only.
pub fn test_prefix_query<D: Batching>(store: &D) -> Result<()> {
    store.put(&key("prefix", "a/1"), b"x")?;
    store.put(&key("prefix", "a/2/deep"), b"x")?;
    store.put(&key("prefix", "ab"), b"y")?;
    store.put(&key("prefix", "a"), b"z")?;

    let entries = store
        .query(Query::new().with_prefix("/conformance/prefix/a"))?
        .rest()?;
    assert_eq!(
        keys_of(&entries),
        vec!["/conformance/prefix/a/1", "/conformance/prefix/a/2/deep"]
    );

    // Prefixes are canonicalized before matching
    let entries = store
        .query(Query::new().with_prefix("conformance//prefix/a/"))?
        .rest()?;
    assert_eq!(entries.len(), 2);
    Ok(())
}

/// Root and empty prefixes do not restrict the query.
pub fn test_root_prefix_query<D: Batching>(store: &D) -> Result<()> {
    let k = key("root", "a");
    store.put(&k, b"x")?;
    for prefix in ["", "/"] {
        let entries = store.query(Query::new().with_prefix(prefix))?.rest()?;
        assert!(entries.iter().any(|e| e.key == k.as_str()));
    }
    Ok(())
}

/// Limit applies to entries surviving the filters, not to raw rows.
pub fn test_filter_then_limit<D: Batching>(store: &D) -> Result<()> {
    for i in 0..10u8 {
        store.put(&key("filter", &format!("k{:02}", i)), &[i])?;
    }
    let even: Arc<dyn Filter> = Arc::new(FilterFn(|e: &Entry| e.value_bytes()[0] % 2 == 0));
    let entries = store
        .query(
            Query::new()
                .with_prefix("/conformance/filter")
                .with_filter(even)
                .with_limit(2),
        )?
        .rest()?;
    assert_eq!(
        keys_of(&entries),
        vec!["/conformance/filter/k00", "/conformance/filter/k02"]
    );
    Ok(())
}

/// Orders run before offset and limit.
pub fn test_order_offset_limit<D: Batching>(store: &D) -> Result<()> {
    for i in 0..5u8 {
        store.put(&key("order", &format!("k{}", i)), &[i])?;
    }
    let entries = store
        .query(
            Query::new()
                .with_prefix("/conformance/order")
                .with_order(Arc::new(OrderByKeyDescending))
                .with_offset(1)
                .with_limit(2),
        )?
        .rest()?;
    assert_eq!(
        keys_of(&entries),
        vec!["/conformance/order/k3", "/conformance/order/k2"]
    );
    Ok(())
}

/// Offset and limit without filters or orders.
pub fn test_pushed_down_pagination<D: Batching>(store: &D) -> Result<()> {
    for i in 0..6u8 {
        store.put(&key("page", &format!("k{}", i)), &[i])?;
    }
    let entries = store
        .query(
            Query::new()
                .with_prefix("/conformance/page")
                .with_offset(2)
                .with_limit(3),
        )?
        .rest()?;
    assert_eq!(
        keys_of(&entries),
        vec![
            "/conformance/page/k2",
            "/conformance/page/k3",
            "/conformance/page/k4"
        ]
    );

    let tail = store
        .query(Query::new().with_prefix("/conformance/page").with_offset(4))?
        .rest()?;
    assert_eq!(
        keys_of(&tail),
        vec!["/conformance/page/k4", "/conformance/page/k5"]
    );
    Ok(())
}

/// Results come back in bytewise key order, not segment order.
pub fn test_key_order_is_bytewise<D: Batching>(store: &D) -> Result<()> {
    store.put(&key("bytewise", "a/b"), b"1")?;
    store.put(&key("bytewise", "a-c"), b"2")?;
    let base = Query::new().with_prefix("/conformance/bytewise").keys_only();

    let all = store.query(base.clone())?.rest()?;
    assert_eq!(
        keys_of(&all),
        vec!["/conformance/bytewise/a-c", "/conformance/bytewise/a/b"]
    );

    let first = store.query(base.with_limit(1))?.rest()?;
    assert_eq!(keys_of(&first), vec!["/conformance/bytewise/a-c"]);
    Ok(())
}

/// Each projection fills exactly its fields.
pub fn test_projections<D: Batching>(store: &D) -> Result<()> {
    store.put(&key("projection", "a"), b"abc")?;
    let base = Query::new().with_prefix("/conformance/projection");

    let full = store.query(base.clone())?.rest()?;
    assert_eq!(full, vec![Entry::new("/conformance/projection/a", b"abc".to_vec())]);

    let keys = store.query(base.clone().keys_only())?.rest()?;
    assert_eq!(keys, vec![Entry::key_only("/conformance/projection/a")]);

    let sized = store.query(base.clone().keys_only().returns_sizes())?.rest()?;
    assert_eq!(sized, vec![Entry::key_with_size("/conformance/projection/a", 3)]);

    let full_sized = store.query(base.returns_sizes())?.rest()?;
    assert_eq!(full_sized.len(), 1);
    assert_eq!(full_sized[0].value.as_deref(), Some(&b"abc"[..]));
    assert_eq!(full_sized[0].size, Some(3));
    Ok(())
}

/// Batched writes apply in submission order.
pub fn test_batch_order<D: Batching>(store: &D) -> Result<()> {
    let a = key("batch", "a");
    let b = key("batch", "b");

    let mut batch = store.batch()?;
    batch.put(&a, b"1")?;
    batch.delete(&a)?;
    batch.put(&b, b"1")?;
    batch.put(&b, b"2")?;
    // Nothing is visible before commit
    assert!(!store.has(&b)?);
    batch.commit()?;

    assert!(store.get(&a).unwrap_err().is_not_found());
    assert_eq!(store.get(&b)?, b"2");
    Ok(())
}

/// Committing an empty batch succeeds.
pub fn test_empty_batch<D: Batching>(store: &D) -> Result<()> {
    store.batch()?.commit()
}

/// Closing a sequence before draining it is safe.
pub fn test_close_results_early<D: Batching>(store: &D) -> Result<()> {
    for i in 0..3u8 {
        store.put(&key("close", &format!("k{}", i)), &[i])?;
    }
    let mut results = store.query(Query::new().with_prefix("/conformance/close"))?;
    assert!(results.next().is_some());
    results.close();
    results.close();
    assert!(results.next().is_none());

    // The store is still usable afterwards
    assert_eq!(store.get(&key("close", "k0"))?, vec![0]);
    Ok(())
}
