//! Concurrency Tests
//!
//! One datastore shared between threads through its pool.

use crate::common::*;
use sqlds::{Batch, Batching, Key, Query, Read, Write};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 4;
const KEYS_PER_THREAD: usize = 50;

#[test]
fn concurrent_writers_on_disjoint_keys() {
    let t = TestStore::with_config(|config| config.with_max_connections(THREADS as u32));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let store = t.store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..KEYS_PER_THREAD {
                    let key = Key::new(format!("/t{}/{:03}", n, i));
                    store.put(&key, format!("{}-{}", n, i).as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = t.store.query(Query::new().keys_only()).unwrap().rest().unwrap();
    assert_eq!(all.len(), THREADS * KEYS_PER_THREAD);
    for n in 0..THREADS {
        let own = t
            .store
            .query(Query::new().with_prefix(format!("/t{}", n)))
            .unwrap()
            .rest()
            .unwrap();
        assert_eq!(own.len(), KEYS_PER_THREAD);
        assert!(own
            .iter()
            .all(|e| e.value_bytes().starts_with(format!("{}-", n).as_bytes())));
    }
}

#[test]
fn readers_and_batch_writers_interleave() {
    let t = TestStore::with_config(|config| config.with_max_connections(4));
    fill(&t.store, "/shared", 10);

    let writer = {
        let store = t.store.clone();
        thread::spawn(move || {
            for round in 0..20u8 {
                let mut batch = store.batch().unwrap();
                for i in 0..10 {
                    batch
                        .put(&Key::new(format!("/shared/k{:02}", i)), &[round])
                        .unwrap();
                }
                batch.commit().unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = t.store.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let entries = store
                        .query(Query::new().with_prefix("/shared"))
                        .unwrap()
                        .rest()
                        .unwrap();
                    assert_eq!(entries.len(), 10);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(t.store.get(&Key::new("/shared/k09")).unwrap(), vec![19]);
}
