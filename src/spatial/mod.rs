//! Arena geometry: zones, catalogs, classification and spatial indexes

pub mod catalog;
pub mod grid;
pub mod sparse_hash;
pub mod validation;
pub mod zone;

pub use catalog::{CatalogError, CatalogFailure, CatalogFile, CatalogSet, ZoneCatalog};
pub use zone::{ShapeDef, TerritoryTag, Zone, ZoneDef};
