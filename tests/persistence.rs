//! Persistence tests for the redb-backed graph store.
//!
//! These verify the one-record-per-kind contract and that stored graphs
//! survive a restart (close + reopen cycle).

use std::sync::Arc;

use boardgraph::catalog::{Catalog, Entity, Game, StaticCatalog};
use boardgraph::config::ServiceConfig;
use boardgraph::graph::{Graph, GraphKind, ProjectionKind};
use boardgraph::service::GraphService;
use boardgraph::store::{DurableStore, GraphStore, Metadata};

const DD: GraphKind = GraphKind::Projected(ProjectionKind::DesignerDesigner);

fn catalog() -> Catalog {
    let ann = Entity::new(1, 501, "Ann");
    let ben = Entity::new(2, 502, "Ben");
    let cy = Entity::new(3, 503, "Cy");
    Catalog::from_games(vec![
        Game::new(1, "Harbour")
            .with_designer(ann.clone())
            .with_designer(ben.clone())
            .with_mechanic(Entity::new(1, 2001, "Drafting")),
        Game::new(2, "Lighthouse")
            .with_designer(ann)
            .with_designer(ben)
            .with_designer(cy),
    ])
}

fn persistent_service(dir: &std::path::Path) -> GraphService {
    let store = DurableStore::open(dir).unwrap();
    GraphService::new(
        ServiceConfig::with_data_dir(dir),
        Arc::new(store),
        Arc::new(StaticCatalog::new(catalog())),
    )
    .unwrap()
}

fn tagged(tag: &str) -> Metadata {
    let mut m = Metadata::new();
    m.insert("tag".into(), tag.into());
    m
}

#[test]
fn saving_twice_keeps_only_the_second() {
    let dir = tempfile::TempDir::new().unwrap();
    let svc = persistent_service(dir.path());

    let g1 = svc.build(DD).unwrap();
    let mut g2 = Graph::new();
    g2.add_node("designer-9", boardgraph::graph::NodeType::Designer, "Solo", Default::default())
        .unwrap();

    svc.save(DD, &g1, tagged("first")).unwrap();
    svc.save(DD, &g2, tagged("second")).unwrap();

    assert_eq!(svc.store().kinds().unwrap(), vec![DD]);
    let record = svc.load_record(DD).unwrap().unwrap();
    assert_eq!(record.metadata["tag"], "second");
    assert_eq!(record.metadata["total_nodes"], 1);
    assert_eq!(svc.load(DD).unwrap().unwrap().to_document(), g2.to_document());
}

#[test]
fn graphs_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let before = {
        let svc = persistent_service(dir.path());
        svc.build_and_save(DD).unwrap();
        svc.load(DD).unwrap().unwrap().to_document()
    };

    let svc = persistent_service(dir.path());
    let after = svc.load(DD).unwrap().unwrap().to_document();
    assert_eq!(before, after);
    assert!(svc.load(GraphKind::Heterogeneous).unwrap().is_none());
}

#[test]
fn build_all_then_reopen_lists_every_kind() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let svc = persistent_service(dir.path());
        let reports = svc.build_and_save_all().unwrap();
        assert_eq!(reports.len(), 7);
    }
    let svc = GraphService::from_config(ServiceConfig::with_data_dir(dir.path())).unwrap();
    let available = svc.available().unwrap();
    assert_eq!(available.len(), 7);
    assert!(available.iter().all(|k| k.stored));

    let het = svc.load(GraphKind::Heterogeneous).unwrap().unwrap();
    assert_eq!(het.node_count(), 2 + 3 + 1);
}

#[test]
fn concurrent_saves_leave_a_single_whole_record() {
    let dir = tempfile::TempDir::new().unwrap();
    let svc = Arc::new(persistent_service(dir.path()));
    let graph = Arc::new(svc.build(DD).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let svc = Arc::clone(&svc);
            let graph = Arc::clone(&graph);
            std::thread::spawn(move || {
                svc.save(DD, &graph, tagged(&i.to_string())).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(svc.store().kinds().unwrap(), vec![DD]);
    let loaded = svc.load(DD).unwrap().unwrap();
    assert_eq!(loaded.to_document(), graph.to_document());
}

#[test]
fn get_or_build_leaves_store_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let svc = persistent_service(dir.path());
    let g = svc.get_or_build(DD).unwrap();
    assert_eq!(g.node_count(), 3);
    assert!(svc.store().kinds().unwrap().is_empty());
}
