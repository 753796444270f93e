//! In-memory graph store backed by DashMap.
//!
//! Records are lost on process exit. Useful for tests and for running
//! without a data directory.

use dashmap::DashMap;

use crate::graph::GraphKind;

use super::{GraphStore, StoreResult, StoredGraph};

/// Concurrent in-memory store using a sharded hashmap.
#[derive(Debug, Default)]
pub struct MemStore {
    records: DashMap<GraphKind, StoredGraph>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl GraphStore for MemStore {
    fn get(&self, kind: GraphKind) -> StoreResult<Option<StoredGraph>> {
        Ok(self.records.get(&kind).map(|r| r.value().clone()))
    }

    fn put(&self, record: &StoredGraph) -> StoreResult<()> {
        self.records.insert(record.kind, record.clone());
        Ok(())
    }

    fn remove(&self, kind: GraphKind) -> StoreResult<bool> {
        Ok(self.records.remove(&kind).is_some())
    }

    fn kinds(&self) -> StoreResult<Vec<GraphKind>> {
        let mut kinds: Vec<GraphKind> = self.records.iter().map(|e| *e.key()).collect();
        kinds.sort();
        Ok(kinds)
    }
}
