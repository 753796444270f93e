//! ACID-durable graph store backed by redb.
//!
//! One table maps the kind string to a JSON-encoded [`StoredGraph`]. Each
//! `put` is a single write transaction, so a crash mid-save leaves the
//! previous record intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::graph::GraphKind;

use super::{GraphStore, StoreResult, StoredGraph};

/// Latest graph per kind (kind string → JSON record).
const GRAPHS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("graphs");

/// Database file created inside the data directory.
pub const DB_FILE: &str = "boardgraph.redb";

fn redb_err(op: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

/// Durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl DurableStore {
    /// Open or create a store in `data_dir`.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let path = data_dir.join(DB_FILE);
        let db = Database::create(&path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", path.display()),
        })?;

        // Create the table up front so read transactions never miss it.
        let txn = db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        txn.open_table(GRAPHS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        txn.commit().map_err(|e| redb_err("commit", e))?;

        tracing::debug!(path = %path.display(), "opened durable graph store");
        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphStore for DurableStore {
    fn get(&self, kind: GraphKind) -> StoreResult<Option<StoredGraph>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(GRAPHS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let guard = table
            .get(kind.as_str())
            .map_err(|e| redb_err("get", e))?;
        guard.map(|g| StoredGraph::decode(g.value())).transpose()
    }

    fn put(&self, record: &StoredGraph) -> StoreResult<()> {
        // Encode before opening the transaction so a bad record never
        // touches the database.
        let bytes = record.encode()?;
        let txn = self.db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        {
            let mut table = txn
                .open_table(GRAPHS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            table
                .insert(record.kind.as_str(), bytes.as_slice())
                .map_err(|e| redb_err("insert", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(())
    }

    fn remove(&self, kind: GraphKind) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        let existed = {
            let mut table = txn
                .open_table(GRAPHS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            let removed = table
                .remove(kind.as_str())
                .map_err(|e| redb_err("remove", e))?;
            removed.is_some()
        };
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(existed)
    }

    fn kinds(&self) -> StoreResult<Vec<GraphKind>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(GRAPHS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let mut kinds = Vec::new();
        for entry in table.iter().map_err(|e| redb_err("iter", e))? {
            let (key, _) = entry.map_err(|e| redb_err("iter", e))?;
            match key.value().parse::<GraphKind>() {
                Ok(kind) => kinds.push(kind),
                Err(_) => tracing::warn!(key = key.value(), "skipping unknown stored kind"),
            }
        }
        kinds.sort();
        Ok(kinds)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("path", &self.path)
            .finish()
    }
}
