// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # boardgraph
//!
//! Relationship graphs over a board-game catalogue: one heterogeneous graph
//! linking games to their mechanics, categories, designers and families,
//! plus six single-type projections annotated with communities and a 2-D
//! layout.
//!
//! ## Architecture
//!
//! - **Catalogue** (`catalog`): snapshot of games and resolved attributes
//! - **Graph** (`graph`): typed petgraph model, builder and projector
//! - **Layout** (`layout`): pruning, Louvain communities, spring layout
//! - **Store** (`store`): one record per graph kind in memory or redb
//! - **Service** (`service`): load-or-build with per-kind write locks
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use boardgraph::catalog::{Catalog, Entity, Game, StaticCatalog};
//! use boardgraph::config::ServiceConfig;
//! use boardgraph::graph::{GraphKind, ProjectionKind};
//! use boardgraph::service::GraphService;
//! use boardgraph::store::MemStore;
//!
//! let catalog = Catalog::from_games(vec![
//!     Game::new(1, "Catan").with_mechanic(Entity::new(1, 2040, "Trading")),
//! ]);
//! let service = GraphService::new(
//!     ServiceConfig::default(),
//!     Arc::new(MemStore::new()),
//!     Arc::new(StaticCatalog::new(catalog)),
//! )
//! .unwrap();
//! service
//!     .build_and_save(GraphKind::Projected(ProjectionKind::GameMechanic))
//!     .unwrap();
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod service;
pub mod store;
