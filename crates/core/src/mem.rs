//! In-memory datastore
//!
//! `MapDatastore` keeps everything in a `BTreeMap` behind a `RwLock` and
//! answers queries entirely with the naive stages. The map is keyed by the
//! canonical key string, so iteration is bytewise like `ORDER BY key`. It is the reference
//! implementation the conformance suite is checked against, and a
//! convenient stand-in for a SQL store in tests of higher layers.

use crate::error::{Error, Result};
use crate::key::Key;
use crate::query::{naive_query_apply, Entry, Query, Results};
use crate::traits::{Batch, Batching, Datastore, Read, Write};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Datastore backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MapDatastore {
    values: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MapDatastore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl Read for MapDatastore {
    fn get(&self, key: &Key) -> Result<Vec<u8>> {
        self.values
            .read()
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound(key.clone()))
    }

    fn has(&self, key: &Key) -> Result<bool> {
        Ok(self.values.read().contains_key(key.as_str()))
    }

    fn get_size(&self, key: &Key) -> Result<usize> {
        self.values
            .read()
            .get(key.as_str())
            .map(Vec::len)
            .ok_or_else(|| Error::NotFound(key.clone()))
    }

    fn query(&self, query: Query) -> Result<Results> {
        // Snapshot under the read lock so the sequence owns its data
        let entries: Vec<Entry> = self
            .values
            .read()
            .iter()
            .map(|(key, value)| Entry::new(key.as_str(), value.clone()))
            .collect();
        let results = Results::from_entries(query.clone(), entries);
        Ok(naive_query_apply(&query, results))
    }
}

impl Write for MapDatastore {
    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        self.values
            .write()
            .insert(key.as_str().to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        self.values.write().remove(key.as_str());
        Ok(())
    }
}

impl Datastore for MapDatastore {
    fn sync(&self, _prefix: &Key) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Pending write in a [`MapBatch`]
#[derive(Debug, Clone)]
enum MapOp {
    Put(Key, Vec<u8>),
    Delete(Key),
}

/// Batch for [`MapDatastore`]; applied under a single write lock
#[derive(Debug)]
pub struct MapBatch {
    store: MapDatastore,
    ops: Vec<MapOp>,
}

impl Batch for MapBatch {
    fn put(&mut self, key: &Key, value: &[u8]) -> Result<()> {
        self.ops.push(MapOp::Put(key.clone(), value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.ops.push(MapOp::Delete(key.clone()));
        Ok(())
    }

    fn commit(self) -> Result<()> {
        let mut values = self.store.values.write();
        for op in self.ops {
            match op {
                MapOp::Put(key, value) => {
                    values.insert(key.as_str().to_string(), value);
                }
                MapOp::Delete(key) => {
                    values.remove(key.as_str());
                }
            }
        }
        Ok(())
    }
}

impl Batching for MapDatastore {
    type Batch = MapBatch;

    fn batch(&self) -> Result<MapBatch> {
        Ok(MapBatch {
            store: self.clone(),
            ops: Vec::new(),
        })
    }
}
