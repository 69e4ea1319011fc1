pub mod config;
pub mod error;
pub mod quality;
pub mod records;
pub mod types;

pub use config::{ClusterParams, ClusterScope, EngineConfig};
pub use error::{EngineError, Result};
pub use quality::{DataQuality, QualityTotals};
