//! Tendency Engine - spatial tendency analysis over recorded competitive sessions
//!
//! Classifies positions against per-arena zone catalogs, derives stack, push
//! and first-contact events for a tracked roster, clusters utility landing
//! points into hotspots, and consolidates many sessions into one dataset.

pub mod aggregate;
pub mod clustering;
pub mod core;
pub mod detection;
pub mod pipeline;
pub mod spatial;
pub mod timeline;

pub use crate::aggregate::ConsolidatedDataset;
pub use crate::core::{EngineConfig, EngineError, Result};
pub use crate::pipeline::Engine;
