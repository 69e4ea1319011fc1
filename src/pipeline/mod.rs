//! Run orchestration
//!
//! Partitions the raw tables by session, validates headers, fans sessions out
//! to the worker pool and hands the joined outcomes to the aggregator.

mod pool;
mod session;

pub use pool::{run_guarded, run_sessions};
pub use session::{process_session, RunContext, SessionOutcome, SessionTask};

use crate::aggregate::{
    select_target_arena, Aggregator, ConsolidatedDataset, Exclusion, SessionValidator,
    TrackedRoster,
};
use crate::clustering::{tune_parameters, TuningGrid, TuningResult};
use crate::core::config::{ClusterScope, EngineConfig};
use crate::core::error::{EngineError, Result};
use crate::core::records::{RawTables, SessionHeader, UtilityCategory};
use crate::core::types::Point2;
use crate::spatial::CatalogSet;

/// Configured engine holding the loaded zone catalogs
pub struct Engine {
    config: EngineConfig,
    catalogs: CatalogSet,
}

impl Engine {
    pub fn new(config: EngineConfig, catalogs: CatalogSet) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, catalogs })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalogs(&self) -> &CatalogSet {
        &self.catalogs
    }

    /// Process every session in `tables` into one consolidated dataset
    ///
    /// Session problems become exclusions; only a broken worker pool or a
    /// violated consolidation invariant fails the run.
    pub fn run(&self, tables: RawTables) -> Result<ConsolidatedDataset> {
        let (inputs, unattributed) = tables.into_sessions();
        if unattributed > 0 {
            tracing::warn!("{} rows reference sessions without a header", unattributed);
        }
        let aggregator = Aggregator::new(&self.config);

        let headers: Vec<&SessionHeader> = inputs.iter().map(|i| &i.header).collect();
        let Some(arena) = select_target_arena(self.config.target_arena.as_deref(), &headers) else {
            tracing::info!("No sessions to process");
            let mut dataset =
                aggregator.consolidate(None, None, Vec::new(), Vec::new(), unattributed)?;
            dataset.metadata.catalog_failures = self.catalogs.failures().to_vec();
            return Ok(dataset);
        };
        tracing::info!("Target arena: {}", arena);
        if let Some(failure) = self.catalogs.failure(&arena) {
            if !self.catalogs.contains(&arena) {
                return Err(EngineError::TargetCatalogRejected {
                    arena,
                    message: failure.message.clone(),
                });
            }
        }

        let on_arena: Vec<&SessionHeader> =
            headers.into_iter().filter(|h| h.arena == arena).collect();
        let roster = TrackedRoster::resolve(&self.config.tracked, &on_arena)?;
        if roster.is_none() {
            tracing::warn!("No tracked roster could be identified; every session will be excluded");
        }

        let mut exclusions: Vec<Exclusion> = Vec::new();
        let mut tasks: Vec<SessionTask> = Vec::new();
        {
            let mut validator = SessionValidator::new(&arena, roster.as_ref(), &self.catalogs);
            for input in inputs {
                match validator.check(&input.header) {
                    Ok(side) => {
                        let tracked = side.clone();
                        tasks.push(SessionTask { input, tracked });
                    }
                    Err(reason) => {
                        tracing::warn!("Excluding session {}: {}", input.id(), reason);
                        exclusions.push(Exclusion::new(input.id().clone(), reason));
                    }
                }
            }
        }

        let outcomes = match self.catalogs.get(&arena) {
            Some(catalog) if !tasks.is_empty() => {
                let ctx = RunContext {
                    catalog,
                    detection: &self.config.detection,
                    profiles: &self.config.profiles,
                };
                run_sessions(self.config.workers, &ctx, &tasks)?
            }
            _ => Vec::new(),
        };

        let mut outputs = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                SessionOutcome::Processed(output) => outputs.push(output),
                SessionOutcome::Excluded(exclusion) => {
                    tracing::warn!(
                        "Excluding session {}: {}",
                        exclusion.session_id,
                        exclusion.reason
                    );
                    exclusions.push(exclusion);
                }
            }
        }

        let mut dataset =
            aggregator.consolidate(Some(arena), roster.as_ref(), outputs, exclusions, unattributed)?;
        dataset.metadata.catalog_failures = self.catalogs.failures().to_vec();
        Ok(dataset)
    }
}

/// Search clustering parameters per category over a finished dataset's
/// utility table
///
/// Honors the configured cluster scope. Calibration only: nothing here
/// changes the engine's configuration.
pub fn tune_hotspot_params(
    dataset: &ConsolidatedDataset,
    config: &EngineConfig,
    grid: &TuningGrid,
) -> Vec<(UtilityCategory, Option<TuningResult>)> {
    UtilityCategory::ALL
        .iter()
        .map(|&category| {
            let points: Vec<Point2> = dataset
                .utility
                .iter()
                .filter(|u| u.category == category)
                .filter(|u| config.clustering.scope == ClusterScope::AllSides || u.tracked)
                .filter(|u| u.x.is_finite() && u.y.is_finite())
                .map(|u| Point2::new(u.x, u.y))
                .collect();
            (category, tune_parameters(&points, grid))
        })
        .collect()
}
