//! Engine configuration with documented constants
//!
//! Every tunable threshold lives here with an explanation of what it controls.
//! Configuration is built once per run, validated, and passed by reference;
//! nothing in the engine mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::records::UtilityCategory;
use crate::core::types::ActorId;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of sessions processed concurrently
    ///
    /// Each worker holds one session's full event set in memory, so the
    /// default stays low. Raise it only when memory allows.
    pub workers: usize,

    /// Arena every included session must share
    ///
    /// When unset, the arena held by the most sessions is used (ties go to
    /// the lexically smallest name).
    pub target_arena: Option<String>,

    pub tracked: TrackedConfig,
    pub detection: DetectionConfig,
    pub clustering: ClusteringConfig,
    pub profiles: ProfileConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            target_arena: None,
            tracked: TrackedConfig::default(),
            detection: DetectionConfig::default(),
            clustering: ClusteringConfig::default(),
            profiles: ProfileConfig::default(),
        }
    }
}

/// Which side-group the run follows across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedConfig {
    /// Known roster of the tracked side-group
    ///
    /// Leave empty to identify it from the session rosters (actors common to
    /// every session, falling back to actors present in 80% of them).
    pub actors: Vec<ActorId>,

    /// Shared actors needed for a session side-group to count as the tracked one
    ///
    /// Below a full roster so substitutes don't drop a session.
    pub min_overlap: usize,

    /// Minimum roster size accepted by automatic identification
    pub min_players: usize,
}

impl Default for TrackedConfig {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            min_overlap: 4,
            min_players: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Distinct tracked actors inside a stronghold zone needed for a stack
    pub stack_threshold: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { stack_threshold: 3 }
    }
}

/// Density-clustering parameters for one point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Neighborhood radius
    ///
    /// In standardized units when `standardize` is set, arena units otherwise.
    pub eps: f64,

    /// Neighbors (excluding the point itself) a point needs to seed a cluster
    pub min_pts: usize,

    /// Z-score each axis before measuring distances
    pub standardize: bool,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_pts: 2,
            standardize: true,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "eps ({}) must be a positive finite number",
                self.eps
            )));
        }
        if self.min_pts == 0 {
            return Err(ConfigError::Invalid("min_pts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Per-category parameter override, written flat in TOML:
///
/// ```toml
/// [[clustering.overrides]]
/// category = "smoke"
/// eps = 0.3
/// min_pts = 3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverride {
    pub category: UtilityCategory,
    pub eps: f64,
    pub min_pts: usize,
    #[serde(default = "default_standardize")]
    pub standardize: bool,
}

fn default_standardize() -> bool {
    true
}

impl CategoryOverride {
    pub fn params(&self) -> ClusterParams {
        ClusterParams {
            eps: self.eps,
            min_pts: self.min_pts,
            standardize: self.standardize,
        }
    }
}

/// Which utility rows feed hotspot clustering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterScope {
    #[default]
    AllSides,
    TrackedGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub default_params: ClusterParams,

    /// Item categories spread differently; tune them independently
    pub overrides: Vec<CategoryOverride>,

    /// Hotspots kept per category after ranking
    pub top_n: usize,

    pub scope: ClusterScope,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            default_params: ClusterParams::default(),
            overrides: Vec::new(),
            top_n: 5,
            scope: ClusterScope::AllSides,
        }
    }
}

impl ClusteringConfig {
    /// Effective parameters for a category (last matching override wins)
    pub fn params_for(&self, category: UtilityCategory) -> ClusterParams {
        self.overrides
            .iter()
            .rev()
            .find(|o| o.category == category)
            .map(CategoryOverride::params)
            .unwrap_or(self.default_params)
    }
}

/// Round-profile clustering (grouping rounds with similar shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub enabled: bool,

    /// Cells per axis of each occupancy grid
    ///
    /// Three grids (early, mid, late) are built per round, so the feature
    /// vector grows with 3 × grid_size².
    pub grid_size: usize,

    pub params: ClusterParams,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_size: 10,
            params: ClusterParams::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.tracked.min_overlap == 0 {
            return Err(ConfigError::Invalid("tracked.min_overlap must be at least 1".into()));
        }
        if self.detection.stack_threshold == 0 {
            return Err(ConfigError::Invalid(
                "detection.stack_threshold must be at least 1".into(),
            ));
        }
        if self.clustering.top_n == 0 {
            return Err(ConfigError::Invalid("clustering.top_n must be at least 1".into()));
        }
        self.clustering.default_params.validate()?;
        for o in &self.clustering.overrides {
            o.params().validate().map_err(|e| {
                ConfigError::Invalid(format!("override for {}: {}", o.category, e))
            })?;
        }
        if self.profiles.enabled {
            if self.profiles.grid_size == 0 {
                return Err(ConfigError::Invalid("profiles.grid_size must be at least 1".into()));
            }
            self.profiles.params.validate()?;
        }
        Ok(())
    }
}
