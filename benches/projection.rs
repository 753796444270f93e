//! Benchmarks for graph building, projection and layout.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use boardgraph::catalog::{Catalog, Entity, Game};
use boardgraph::graph::builder::GraphBuilder;
use boardgraph::graph::projection::GraphProjector;
use boardgraph::graph::ProjectionKind;
use boardgraph::layout::{LayoutConfig, LayoutEngine};

/// A random catalogue of `games` games drawing from fixed attribute pools.
fn synthetic_catalog(games: u64) -> Catalog {
    let mut rng = StdRng::seed_from_u64(0);
    let pick = |rng: &mut StdRng, pool: u64, max: usize, prefix: &str| -> Vec<Entity> {
        let n = rng.gen_range(1..=max);
        let mut ids: Vec<u64> = (0..n).map(|_| rng.gen_range(1..=pool)).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .map(|id| Entity::new(id, id, format!("{prefix} {id}")))
            .collect()
    };
    let games = (1..=games)
        .map(|id| Game {
            mechanics: pick(&mut rng, 60, 5, "Mechanic"),
            categories: pick(&mut rng, 40, 3, "Category"),
            designers: pick(&mut rng, 300, 2, "Designer"),
            ..Game::new(id, format!("Game {id}"))
        })
        .collect();
    Catalog::from_games(games)
}

fn bench_build(c: &mut Criterion) {
    let catalog = synthetic_catalog(1_000);
    c.bench_function("build_heterogeneous_1k", |bench| {
        bench.iter(|| black_box(GraphBuilder::build(&catalog).unwrap()))
    });
}

fn bench_project(c: &mut Criterion) {
    let het = GraphBuilder::build(&synthetic_catalog(1_000)).unwrap();
    c.bench_function("project_game_mechanic_1k", |bench| {
        bench.iter(|| black_box(GraphProjector::project(&het, ProjectionKind::GameMechanic).unwrap()))
    });
    c.bench_function("project_mechanic_mechanic_1k", |bench| {
        bench.iter(|| {
            black_box(GraphProjector::project(&het, ProjectionKind::MechanicMechanic).unwrap())
        })
    });
}

fn bench_layout(c: &mut Criterion) {
    let het = GraphBuilder::build(&synthetic_catalog(300)).unwrap();
    let projected = GraphProjector::project(&het, ProjectionKind::GameCategory).unwrap();
    let config = LayoutConfig::for_kind(ProjectionKind::GameCategory);
    c.bench_function("layout_game_category_300", |bench| {
        bench.iter(|| black_box(LayoutEngine::apply(&projected, &config).unwrap()))
    });
}

criterion_group!(benches, bench_build, bench_project, bench_layout);
criterion_main!(benches);
