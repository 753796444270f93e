//! Source catalogue: games and their resolved attribute entities.
//!
//! The graph core never talks to the relational store directly. It receives
//! a materialized [`Catalog`] snapshot from a [`CatalogSource`], taken fresh
//! for every build.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Result type for catalogue operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A named attribute entity (mechanic, category, designer or family).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Local numeric key; becomes the node id suffix.
    pub id: u64,
    /// BoardGameGeek id.
    pub bgg_id: u64,
    pub name: String,
}

impl Entity {
    pub fn new(id: u64, bgg_id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            bgg_id,
            name: name.into(),
        }
    }
}

/// A game with its attribute associations already resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub bgg_id: u64,
    pub name: String,
    #[serde(default)]
    pub bgg_rank: Option<u32>,
    #[serde(default)]
    pub year_published: Option<i32>,
    #[serde(default)]
    pub bgg_average_rating: Option<f64>,
    #[serde(default)]
    pub bgg_geek_rating: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub min_players: Option<u32>,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub playing_time: Option<u32>,
    #[serde(default)]
    pub mechanics: Vec<Entity>,
    #[serde(default)]
    pub categories: Vec<Entity>,
    #[serde(default)]
    pub designers: Vec<Entity>,
    #[serde(default)]
    pub families: Vec<Entity>,
}

impl Game {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            bgg_id: id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mechanic(mut self, mechanic: Entity) -> Self {
        self.mechanics.push(mechanic);
        self
    }

    pub fn with_category(mut self, category: Entity) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_designer(mut self, designer: Entity) -> Self {
        self.designers.push(designer);
        self
    }

    pub fn with_family(mut self, family: Entity) -> Self {
        self.families.push(family);
        self
    }
}

/// A snapshot of the source catalogue.
///
/// The standalone attribute lists are optional: entities listed there become
/// nodes even if no game references them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub mechanics: Vec<Entity>,
    #[serde(default)]
    pub categories: Vec<Entity>,
    #[serde(default)]
    pub designers: Vec<Entity>,
    #[serde(default)]
    pub families: Vec<Entity>,
}

impl Catalog {
    pub fn from_games(games: Vec<Game>) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
            && self.mechanics.is_empty()
            && self.categories.is_empty()
            && self.designers.is_empty()
            && self.families.is_empty()
    }
}

/// Provider of catalogue snapshots.
pub trait CatalogSource: Send + Sync {
    /// Materialize the current catalogue.
    fn snapshot(&self) -> CatalogResult<Catalog>;
}

/// A fixed in-memory catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    catalog: Catalog,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl CatalogSource for StaticCatalog {
    fn snapshot(&self) -> CatalogResult<Catalog> {
        Ok(self.catalog.clone())
    }
}

/// A catalogue read from a JSON file on every snapshot.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonCatalog {
    fn snapshot(&self) -> CatalogResult<Catalog> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| CatalogError::Read {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(
            path = %self.path.display(),
            games = catalog.games.len(),
            "loaded catalogue snapshot"
        );
        Ok(catalog)
    }
}
