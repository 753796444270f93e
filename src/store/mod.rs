//! Persistent storage for computed graphs.
//!
//! One record per [`GraphKind`]; every write replaces the whole record in a
//! single atomic step. Two backends:
//!
//! - [`mem::MemStore`]: process-local records in a `DashMap`
//! - [`durable::DurableStore`]: ACID records in a redb database

pub mod durable;
pub mod mem;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::graph::{GraphDocument, GraphKind};

pub use durable::DurableStore;
pub use mem::MemStore;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Free-form record metadata (a JSON object).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The latest build of one graph kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub kind: GraphKind,
    pub document: GraphDocument,
    #[serde(default)]
    pub metadata: Metadata,
    /// Seconds since the Unix epoch.
    pub updated_at: u64,
}

impl StoredGraph {
    /// Wrap a document, stamped with the current time.
    pub fn new(kind: GraphKind, document: GraphDocument, metadata: Metadata) -> Self {
        Self {
            kind,
            document,
            metadata,
            updated_at: now_secs(),
        }
    }

    pub(crate) fn encode(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization {
            message: format!("failed to encode {} record: {e}", self.kind),
        })
    }

    pub(crate) fn decode(bytes: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
            message: format!("failed to decode stored graph: {e}"),
        })
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Keyed storage of [`StoredGraph`] records.
///
/// Implementations must make `put` all-or-nothing: a reader sees either the
/// previous record or the new one, never a mix, and a kind never has more
/// than one record.
pub trait GraphStore: Send + Sync {
    /// Fetch the record for `kind`. `Ok(None)` is a cache miss.
    fn get(&self, kind: GraphKind) -> StoreResult<Option<StoredGraph>>;

    /// Insert or replace the record for `record.kind`.
    fn put(&self, record: &StoredGraph) -> StoreResult<()>;

    /// Delete the record for `kind`. Returns whether one existed.
    fn remove(&self, kind: GraphKind) -> StoreResult<bool>;

    /// Kinds that currently have a record, in kind order.
    fn kinds(&self) -> StoreResult<Vec<GraphKind>>;
}
