use thiserror::Error;

use crate::aggregate::RosterError;
use crate::core::config::ConfigError;
use crate::spatial::CatalogError;

/// Errors that block a run
///
/// Session-level failures never show up here; they become exclusion records
/// in the consolidated output instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Zone catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Zone catalog for target arena '{arena}' was rejected: {message}")]
    TargetCatalogRejected { arena: String, message: String },

    #[error("No zone catalog loaded for arena: {0}")]
    UnknownArena(String),

    #[error("Consolidation invariant violated: {0}")]
    Invariant(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
