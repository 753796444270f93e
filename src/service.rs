//! Graph cache service: the public face of the crate.
//!
//! The `GraphService` owns the store, the catalogue source and a worker
//! pool for CPU-bound builds. It implements load-or-build over one stored
//! record per [`GraphKind`]:
//!
//! - `load` only reads; a miss is `Ok(None)`
//! - `build` computes in memory from a fresh catalogue snapshot
//! - `save` / `build_and_save` replace the stored record atomically
//! - `get_or_build` never persists

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogSource, JsonCatalog, StaticCatalog};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, StoreError};
use crate::graph::builder::GraphBuilder;
use crate::graph::projection::GraphProjector;
use crate::graph::{Graph, GraphKind, ProjectionKind, ProjectionMode};
use crate::layout::{LayoutEngine, LayoutSummary};
use crate::store::{DurableStore, GraphStore, MemStore, Metadata, StoredGraph};

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Outcome of building and saving one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub kind: GraphKind,
    pub nodes: usize,
    pub edges: usize,
    /// Present when layout ran.
    pub layout: Option<LayoutSummary>,
}

/// A stored kind as listed by [`GraphService::available`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindInfo {
    pub kind: GraphKind,
    pub description: String,
    /// Whether a record is currently stored.
    pub stored: bool,
}

/// A graph together with its layout summary, if layout ran.
struct Built {
    graph: Graph,
    layout: Option<LayoutSummary>,
}

/// Load-or-build access to every graph kind.
pub struct GraphService {
    config: ServiceConfig,
    store: Arc<dyn GraphStore>,
    catalog: Arc<dyn CatalogSource>,
    pool: rayon::ThreadPool,
    write_locks: DashMap<GraphKind, Arc<Mutex<()>>>,
}

impl GraphService {
    /// Create a service over explicit collaborators.
    ///
    /// The config is validated first, so unknown `min_weights` keys are
    /// rejected here as well as in [`ServiceConfig::load`].
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn GraphStore>,
        catalog: Arc<dyn CatalogSource>,
    ) -> ServiceResult<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("boardgraph-build-{i}"))
            .build()
            .map_err(|e| ServiceError::Pool {
                message: e.to_string(),
            })?;
        tracing::info!(
            workers = pool.current_num_threads(),
            layout = config.layout,
            seed = config.seed,
            "graph service ready"
        );
        Ok(Self {
            config,
            store,
            catalog,
            pool,
            write_locks: DashMap::new(),
        })
    }

    /// Create a service from config alone.
    ///
    /// `data_dir` selects a [`DurableStore`] (else [`MemStore`]); `catalog`
    /// selects a [`JsonCatalog`] (else an empty catalogue).
    pub fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        let store: Arc<dyn GraphStore> = match &config.data_dir {
            Some(dir) => Arc::new(DurableStore::open(dir)?),
            None => Arc::new(MemStore::new()),
        };
        let catalog: Arc<dyn CatalogSource> = match &config.catalog {
            Some(path) => Arc::new(JsonCatalog::new(path)),
            None => Arc::new(StaticCatalog::default()),
        };
        Self::new(config, store, catalog)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Stored graph for `kind`, or `None` on a miss. Never builds.
    pub fn load(&self, kind: GraphKind) -> ServiceResult<Option<Graph>> {
        match self.load_record(kind)? {
            Some(record) => Ok(Some(Graph::from_document(record.document)?)),
            None => Ok(None),
        }
    }

    /// The full stored record (document, metadata, timestamp).
    pub fn load_record(&self, kind: GraphKind) -> ServiceResult<Option<StoredGraph>> {
        let record = self.store.get(kind)?;
        tracing::debug!(kind = %kind, hit = record.is_some(), "loaded graph record");
        Ok(record)
    }

    /// Stored graph if present, else a fresh in-memory build.
    ///
    /// The built graph is not persisted.
    pub fn get_or_build(&self, kind: GraphKind) -> ServiceResult<Graph> {
        if let Some(graph) = self.load(kind)? {
            return Ok(graph);
        }
        tracing::info!(kind = %kind, "cache miss, building without saving");
        self.build(kind)
    }

    /// Every kind with its description and whether it is stored.
    pub fn available(&self) -> ServiceResult<Vec<KindInfo>> {
        let stored = self.store.kinds()?;
        Ok(GraphKind::all()
            .map(|kind| KindInfo {
                kind,
                description: kind.description().to_string(),
                stored: stored.contains(&kind),
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Builds
    // -----------------------------------------------------------------------

    /// Build `kind` from the current catalogue without persisting it.
    pub fn build(&self, kind: GraphKind) -> ServiceResult<Graph> {
        Ok(self.build_detailed(kind)?.graph)
    }

    fn build_detailed(&self, kind: GraphKind) -> ServiceResult<Built> {
        let catalog = self.catalog.snapshot()?;
        self.pool.install(|| -> ServiceResult<Built> {
            let heterogeneous = GraphBuilder::build(&catalog)?;
            match kind.projection() {
                None => Ok(Built {
                    graph: heterogeneous,
                    layout: None,
                }),
                Some(projection) => self.derive(&heterogeneous, projection),
            }
        })
    }

    /// Project and, if enabled, lay out.
    fn derive(&self, heterogeneous: &Graph, projection: ProjectionKind) -> ServiceResult<Built> {
        let projected = GraphProjector::project(heterogeneous, projection)?;
        if !self.config.layout {
            return Ok(Built {
                graph: projected,
                layout: None,
            });
        }
        let (graph, summary) =
            LayoutEngine::apply(&projected, &self.config.layout_config(projection))?;
        Ok(Built {
            graph,
            layout: Some(summary),
        })
    }

    /// Build `kind` and replace its stored record.
    ///
    /// If the build succeeds but the write fails, the error is
    /// [`ServiceError::Persist`] and carries the graph for a retry.
    pub fn build_and_save(&self, kind: GraphKind) -> ServiceResult<BuildReport> {
        let built = self.build_detailed(kind)?;
        self.persist(kind, built)
    }

    /// Build and save every kind.
    ///
    /// The heterogeneous graph is built once from one snapshot; the six
    /// projections are derived from it in parallel on the build pool and
    /// then saved in kind order. The first failure stops the run.
    pub fn build_and_save_all(&self) -> ServiceResult<Vec<BuildReport>> {
        let catalog: Catalog = self.catalog.snapshot()?;
        let (heterogeneous, projections) = self.pool.install(|| -> ServiceResult<_> {
            let heterogeneous = GraphBuilder::build(&catalog)?;
            let projections = ProjectionKind::ALL
                .par_iter()
                .map(|&p| self.derive(&heterogeneous, p).map(|b| (p, b)))
                .collect::<ServiceResult<Vec<_>>>()?;
            Ok((heterogeneous, projections))
        })?;

        let mut reports = Vec::with_capacity(projections.len() + 1);
        reports.push(self.persist(
            GraphKind::Heterogeneous,
            Built {
                graph: heterogeneous,
                layout: None,
            },
        )?);
        for (projection, built) in projections {
            reports.push(self.persist(GraphKind::Projected(projection), built)?);
        }
        tracing::info!(kinds = reports.len(), "built and saved every graph kind");
        Ok(reports)
    }

    fn persist(&self, kind: GraphKind, built: Built) -> ServiceResult<BuildReport> {
        let mut metadata = Metadata::new();
        if let Some(summary) = &built.layout {
            match serde_json::to_value(summary) {
                Ok(value) => {
                    metadata.insert("layout".into(), value);
                }
                Err(e) => {
                    return Err(self.persist_failed(
                        kind,
                        StoreError::Serialization {
                            message: e.to_string(),
                        },
                        built.graph,
                    ));
                }
            }
        }
        match self.save(kind, &built.graph, metadata) {
            Ok(_) => Ok(BuildReport {
                kind,
                nodes: built.graph.node_count(),
                edges: built.graph.edge_count(),
                layout: built.layout,
            }),
            Err(ServiceError::Store(source)) => Err(self.persist_failed(kind, source, built.graph)),
            Err(other) => Err(other),
        }
    }

    fn persist_failed(&self, kind: GraphKind, source: StoreError, graph: Graph) -> ServiceError {
        tracing::warn!(kind = %kind, error = %source, "built graph could not be saved");
        ServiceError::Persist {
            kind: kind.to_string(),
            source,
            graph: Box::new(graph),
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Replace the stored record for `kind` with `graph`.
    ///
    /// `total_nodes` and `total_edges` are always added to `metadata`, plus
    /// `connection_type` for game-to-game projections. Writes to the same
    /// kind are serialized; writes to different kinds run concurrently.
    pub fn save(
        &self,
        kind: GraphKind,
        graph: &Graph,
        mut metadata: Metadata,
    ) -> ServiceResult<StoredGraph> {
        metadata.insert("total_nodes".into(), graph.node_count().into());
        metadata.insert("total_edges".into(), graph.edge_count().into());
        if let Some(p) = kind.projection() {
            if p.mode() == ProjectionMode::GameToGame {
                metadata.insert("connection_type".into(), p.connector().as_str().into());
            }
        }
        let record = StoredGraph::new(kind, graph.to_document(), metadata);

        let lock = self.write_lock(kind);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.store.put(&record)?;

        tracing::info!(
            kind = %kind,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "saved graph"
        );
        Ok(record)
    }

    /// Drop the stored record for `kind`.
    pub fn invalidate(&self, kind: GraphKind) -> ServiceResult<bool> {
        let lock = self.write_lock(kind);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.store.remove(kind)?)
    }

    fn write_lock(&self, kind: GraphKind) -> Arc<Mutex<()>> {
        self.write_locks.entry(kind).or_default().clone()
    }
}

impl std::fmt::Debug for GraphService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphService")
            .field("config", &self.config)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entity, Game};
    use crate::error::ConfigError;

    fn catalog() -> Catalog {
        let alice = Entity::new(1, 101, "Alice");
        let bob = Entity::new(2, 102, "Bob");
        let m = Entity::new(1, 2001, "Worker Placement");
        Catalog::from_games(vec![
            Game::new(1, "First")
                .with_designer(alice.clone())
                .with_designer(bob.clone())
                .with_mechanic(m.clone()),
            Game::new(2, "Second")
                .with_designer(alice)
                .with_designer(bob)
                .with_mechanic(m),
            Game::new(3, "Third"),
        ])
    }

    fn service(layout: bool) -> GraphService {
        let config = ServiceConfig {
            layout,
            worker_threads: 2,
            ..ServiceConfig::default()
        };
        GraphService::new(
            config,
            Arc::new(MemStore::new()),
            Arc::new(StaticCatalog::new(catalog())),
        )
        .unwrap()
    }

    const DD: GraphKind = GraphKind::Projected(ProjectionKind::DesignerDesigner);
    const GM: GraphKind = GraphKind::Projected(ProjectionKind::GameMechanic);

    #[test]
    fn unknown_min_weight_key_is_rejected_at_startup() {
        let mut config = ServiceConfig::default();
        config.min_weights.insert("game-widget".into(), 2);
        let err = GraphService::new(
            config,
            Arc::new(MemStore::new()),
            Arc::new(StaticCatalog::new(catalog())),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ServiceError::Config(ConfigError::Invalid { .. })));
        assert!(err.to_string().contains("game-widget"));
    }

    #[test]
    fn load_misses_before_any_save() {
        let svc = service(true);
        assert!(svc.load(GraphKind::Heterogeneous).unwrap().is_none());
    }

    #[test]
    fn get_or_build_does_not_persist() {
        let svc = service(true);
        let g = svc.get_or_build(GraphKind::Heterogeneous).unwrap();
        assert_eq!(g.node_count(), 6);
        assert!(svc.load(GraphKind::Heterogeneous).unwrap().is_none());
    }

    #[test]
    fn build_and_save_then_load() {
        let svc = service(false);
        let report = svc.build_and_save(DD).unwrap();
        assert_eq!(report.nodes, 2);
        assert_eq!(report.edges, 1);
        assert!(report.layout.is_none());
        let g = svc.load(DD).unwrap().unwrap();
        assert_eq!(g.edge_between("designer-1", "designer-2").unwrap().weight(), 2);
    }

    #[test]
    fn save_adds_counts_and_connection_type() {
        let svc = service(false);
        let g = svc.build(GM).unwrap();
        let record = svc.save(GM, &g, Metadata::new()).unwrap();
        assert_eq!(record.metadata["total_nodes"], 3);
        assert_eq!(record.metadata["total_edges"], 1);
        assert_eq!(record.metadata["connection_type"], "mechanic");

        let record = svc.save(DD, &svc.build(DD).unwrap(), Metadata::new()).unwrap();
        assert!(!record.metadata.contains_key("connection_type"));
    }

    #[test]
    fn layout_summary_is_recorded() {
        let svc = service(true);
        let report = svc.build_and_save(DD).unwrap();
        let summary = report.layout.unwrap();
        assert_eq!(summary.communities, 0);
        assert_eq!(summary.unclustered_nodes, 2);
        let record = svc.load_record(DD).unwrap().unwrap();
        assert!(record.metadata.contains_key("layout"));
    }

    #[test]
    fn build_and_save_all_covers_every_kind() {
        let svc = service(true);
        let reports = svc.build_and_save_all().unwrap();
        assert_eq!(reports.len(), 7);
        assert_eq!(reports[0].kind, GraphKind::Heterogeneous);
        assert_eq!(svc.store().kinds().unwrap().len(), 7);
        assert!(svc.available().unwrap().iter().all(|k| k.stored));
    }

    #[test]
    fn invalidate_removes_record() {
        let svc = service(false);
        svc.build_and_save(GraphKind::Heterogeneous).unwrap();
        assert!(svc.invalidate(GraphKind::Heterogeneous).unwrap());
        assert!(svc.load(GraphKind::Heterogeneous).unwrap().is_none());
    }

    struct FailingStore;

    impl GraphStore for FailingStore {
        fn get(&self, _: GraphKind) -> crate::store::StoreResult<Option<StoredGraph>> {
            Ok(None)
        }
        fn put(&self, _: &StoredGraph) -> crate::store::StoreResult<()> {
            Err(StoreError::Redb {
                message: "commit failed".into(),
            })
        }
        fn remove(&self, _: GraphKind) -> crate::store::StoreResult<bool> {
            Ok(false)
        }
        fn kinds(&self) -> crate::store::StoreResult<Vec<GraphKind>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_save_hands_back_the_graph() {
        let svc = GraphService::new(
            ServiceConfig::default(),
            Arc::new(FailingStore),
            Arc::new(StaticCatalog::new(catalog())),
        )
        .unwrap();
        let err = svc.build_and_save(GraphKind::Heterogeneous).unwrap_err();
        assert!(matches!(err, ServiceError::Persist { .. }));
        let graph = err.into_unsaved_graph().unwrap();
        assert_eq!(graph.node_count(), 6);
    }
}
