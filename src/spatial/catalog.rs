//! Zone catalogs and point classification
//!
//! A `ZoneCatalog` holds every zone of one arena in a fixed total order
//! (footprint area ascending, then name ascending). Classification walks that
//! order and returns the first zone containing the point, so overlapping zones
//! always resolve the same way. Catalogs are immutable once built and are
//! shared across workers through `Arc`.

use ahash::AHashMap;
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::validation::GeometryIssue;
use super::zone::{Zone, ZoneDef};
use crate::core::error::EngineError;
use crate::core::types::Point3;

/// Configuration errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported catalog file: {0}")]
    UnsupportedFormat(String),

    #[error("Catalog for arena '{0}' defines no zones")]
    Empty(String),

    #[error("Duplicate zone name '{zone}' in arena '{arena}'")]
    DuplicateZone { arena: String, zone: String },

    #[error("Degenerate geometry for zone '{zone}': {issues:?}")]
    DegenerateZone { zone: String, issues: Vec<GeometryIssue> },
}

/// On-disk catalog layout (TOML or JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub arena: String,
    pub zones: Vec<ZoneDef>,
}

impl CatalogFile {
    /// Read and parse a catalog file without validating its zones
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A catalog that parsed but was rejected; only its arena is affected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFailure {
    pub arena: String,
    pub source: String,
    pub message: String,
}

/// All zones of one arena, in classification order
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    arena: String,
    zones: Vec<Zone>,
}

impl ZoneCatalog {
    /// Validate definitions and fix the classification order
    pub fn from_defs(arena: impl Into<String>, defs: Vec<ZoneDef>) -> Result<Self, CatalogError> {
        let arena = arena.into();
        if defs.is_empty() {
            return Err(CatalogError::Empty(arena));
        }

        let mut names = BTreeSet::new();
        let mut zones = Vec::with_capacity(defs.len());
        for def in defs {
            if !names.insert(def.name.clone()) {
                return Err(CatalogError::DuplicateZone {
                    arena,
                    zone: def.name,
                });
            }
            let name = def.name.clone();
            let zone = Zone::from_def(def)
                .map_err(|issues| CatalogError::DegenerateZone { zone: name, issues })?;
            zones.push(zone);
        }

        zones.sort_by(|a, b| {
            a.area()
                .total_cmp(&b.area())
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::debug!("Loaded {} zones for arena {}", zones.len(), arena);
        Ok(Self { arena, zones })
    }

    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        Self::from_defs(file.arena, file.zones)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::from_file(file)
    }

    /// Load a catalog file, picking the format from the extension
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_file(CatalogFile::read(path)?)
    }

    pub fn arena(&self) -> &str {
        &self.arena
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones in classification order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// The zone a point belongs to: smallest footprint first, then name
    pub fn classify(&self, point: Point3) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    pub fn strongholds(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.stronghold)
    }

    /// Union of every zone's bounding rectangle
    pub fn bounds(&self) -> Rect<f64> {
        let mut lo = Coord { x: f64::INFINITY, y: f64::INFINITY };
        let mut hi = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };
        for zone in &self.zones {
            let rect = zone.bounds();
            lo.x = lo.x.min(rect.min().x);
            lo.y = lo.y.min(rect.min().y);
            hi.x = hi.x.max(rect.max().x);
            hi.y = hi.y.max(rect.max().y);
        }
        Rect::new(lo, hi)
    }
}

/// Read-only catalogs keyed by arena, plus the arenas whose catalog was
/// rejected
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    catalogs: AHashMap<String, Arc<ZoneCatalog>>,
    failures: Vec<CatalogFailure>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog, returning the one it replaced
    pub fn insert(&mut self, catalog: ZoneCatalog) -> Option<Arc<ZoneCatalog>> {
        self.catalogs
            .insert(catalog.arena().to_string(), Arc::new(catalog))
    }

    pub fn get(&self, arena: &str) -> Option<Arc<ZoneCatalog>> {
        self.catalogs.get(arena).cloned()
    }

    pub fn contains(&self, arena: &str) -> bool {
        self.catalogs.contains_key(arena)
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Rejected catalogs, in load order
    pub fn failures(&self) -> &[CatalogFailure] {
        &self.failures
    }

    /// Why the arena has no catalog, when one was supplied and rejected
    pub fn failure(&self, arena: &str) -> Option<&CatalogFailure> {
        self.failures.iter().find(|f| f.arena == arena)
    }

    /// Load every listed catalog file
    ///
    /// A file that cannot be read or parsed aborts the load. A parsed file
    /// whose zones fail validation only costs its own arena and is kept as a
    /// [`CatalogFailure`].
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CatalogError> {
        let mut set = Self::new();
        for path in paths {
            let path = path.as_ref();
            let file = CatalogFile::read(path)?;
            let arena = file.arena.clone();
            let catalog = match ZoneCatalog::from_file(file) {
                Ok(catalog) => catalog,
                Err(err) => {
                    tracing::warn!("Rejected catalog {} for {}: {}", path.display(), arena, err);
                    set.failures.push(CatalogFailure {
                        arena,
                        source: path.display().to_string(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            tracing::info!(
                "Loaded catalog for {} ({} zones) from {}",
                catalog.arena(),
                catalog.len(),
                path.display()
            );
            if set.insert(catalog).is_some() {
                tracing::warn!("Catalog {} replaced an earlier one", path.display());
            }
        }
        Ok(set)
    }

    /// `classify(arena, x, y, z)`: the zone name, or `None` outside every zone
    pub fn classify(&self, arena: &str, point: Point3) -> Result<Option<&str>, EngineError> {
        let catalog = self
            .catalogs
            .get(arena)
            .ok_or_else(|| EngineError::UnknownArena(arena.to_string()))?;
        Ok(catalog.classify(point).map(|z| z.name.as_str()))
    }
}
