//! Density clustering
//!
//! One DBSCAN engine serves two consumers: landing-point hotspots (2D, hash
//! grid neighborhoods) and round profiles (n-dimensional, linear scan).

pub mod dbscan;
pub mod hotspots;
pub mod index;
pub mod profiles;
pub mod scaling;
pub mod tuning;

pub use dbscan::{cluster_count, Dbscan};
pub use hotspots::{cluster_points, cluster_rows, find_hotspots, CategoryHotspots, Hotspot};
pub use index::{GridIndex, LinearIndex, RegionQuery};
pub use profiles::{cluster_profiles, FeatureExtractor, ProfileSummary, RoundFeatures, RoundProfile};
pub use scaling::Standardizer;
pub use tuning::{tune_parameters, TuningGrid, TuningResult};
