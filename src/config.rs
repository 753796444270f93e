//! Service configuration, stored as TOML.
//!
//! Every field has a default, so an empty file is a valid config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::ProjectionKind;
use crate::layout::LayoutConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for [`GraphService`](crate::service::GraphService) and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory for the durable store. `None` keeps graphs in memory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// JSON catalogue file read on every build.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Build pool size; 0 lets rayon pick.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Cluster and lay out projections before returning or saving them.
    #[serde(default = "default_true")]
    pub layout: bool,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_true")]
    pub keep_isolated: bool,
    /// Per-projection pruning thresholds, keyed by kind name.
    #[serde(default)]
    pub min_weights: BTreeMap<String, u32>,
}

fn default_seed() -> u64 {
    42
}
fn default_true() -> bool {
    true
}
fn default_iterations() -> usize {
    50
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            catalog: None,
            worker_threads: 0,
            seed: default_seed(),
            layout: true,
            iterations: default_iterations(),
            keep_isolated: true,
            min_weights: BTreeMap::new(),
        }
    }
}

impl ServiceConfig {
    /// Config that persists to `data_dir` (other fields default).
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Reject unknown projection names in `min_weights`.
    pub fn validate(&self) -> ConfigResult<()> {
        for key in self.min_weights.keys() {
            key.parse::<ProjectionKind>()
                .map_err(|e| ConfigError::Invalid {
                    message: format!("min_weights: {e}"),
                })?;
        }
        if self.iterations == 0 && self.layout {
            return Err(ConfigError::Invalid {
                message: "iterations must be at least 1 when layout is enabled".into(),
            });
        }
        Ok(())
    }

    /// Pruning threshold for `kind`: the override if set, else its default.
    pub fn min_weight(&self, kind: ProjectionKind) -> u32 {
        self.min_weights
            .get(kind.as_str())
            .copied()
            .unwrap_or_else(|| kind.default_min_weight())
    }

    /// Layout parameters for `kind`.
    pub fn layout_config(&self, kind: ProjectionKind) -> LayoutConfig {
        LayoutConfig {
            min_weight: self.min_weight(kind),
            seed: self.seed,
            iterations: self.iterations,
            keep_isolated: self.keep_isolated,
            ..LayoutConfig::for_kind(kind)
        }
    }
}
