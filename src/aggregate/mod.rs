//! Cross-session aggregation
//!
//! Concatenates per-session outputs into one consolidated dataset with
//! provenance on every row. Nothing is reduced here: rates and comparisons
//! are left to downstream reporting. Tables are sorted by session and round
//! so the result does not depend on the order workers finished in.

pub mod output;
pub mod roster;
pub mod validation;

pub use output::{
    ConsolidatedDataset, RoundRow, RunMetadata, RunStamp, SessionOutput, SessionQuality,
    UtilityRow,
};
pub use roster::{identify_tracked_roster, RosterError, TrackedRoster};
pub use validation::{select_target_arena, Exclusion, ExclusionReason, SessionValidator};

use ahash::AHashSet;
use rayon::prelude::*;

use crate::clustering::{cluster_profiles, find_hotspots, CategoryHotspots, RoundFeatures};
use crate::core::config::{ClusterScope, EngineConfig};
use crate::core::error::{EngineError, Result};
use crate::core::quality::QualityTotals;
use crate::core::records::UtilityCategory;
use crate::core::types::{Point2, SessionId};

/// Single-threaded reducer over finished sessions
pub struct Aggregator<'a> {
    config: &'a EngineConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Merge session outputs, cluster the merged tables and check the
    /// result's integrity
    ///
    /// `unattributed_rows` counts input rows that named no known session.
    pub fn consolidate(
        &self,
        arena: Option<String>,
        roster: Option<&TrackedRoster>,
        mut outputs: Vec<SessionOutput>,
        mut exclusions: Vec<Exclusion>,
        unattributed_rows: usize,
    ) -> Result<ConsolidatedDataset> {
        outputs.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        exclusions.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let mut sessions = Vec::with_capacity(outputs.len());
        let mut quality = Vec::with_capacity(outputs.len());
        let mut totals = QualityTotals {
            unattributed_rows,
            ..Default::default()
        };
        let mut rounds = Vec::new();
        let mut derived_events = Vec::new();
        let mut utility = Vec::new();
        let mut features: Vec<RoundFeatures> = Vec::new();

        for output in outputs {
            if arena.as_deref() != Some(output.arena.as_str()) {
                return Err(EngineError::Invariant(format!(
                    "session {} is on arena '{}', run target is {:?}",
                    output.session_id, output.arena, arena
                )));
            }
            totals.absorb(&output.quality);
            sessions.push(output.session_id.clone());
            quality.push(SessionQuality {
                session_id: output.session_id,
                quality: output.quality,
            });
            rounds.extend(output.rounds);
            derived_events.extend(output.events);
            utility.extend(output.utility);
            features.extend(output.features);
        }

        rounds.sort_by(|a, b| (&a.session_id, a.round_num).cmp(&(&b.session_id, b.round_num)));
        derived_events.sort_by(|a, b| a.canonical_cmp(b));
        utility.sort_by(|a, b| (&a.session_id, a.round_num).cmp(&(&b.session_id, b.round_num)));
        features.sort_by(|a, b| (&a.session_id, a.round_num).cmp(&(&b.session_id, b.round_num)));

        let hotspots = self.cluster_utility(&utility);
        let (round_profiles, profiles) = if self.config.profiles.enabled {
            cluster_profiles(&features, self.config.profiles.params)
        } else {
            (Vec::new(), Vec::new())
        };

        let dataset = ConsolidatedDataset {
            stamp: RunStamp::now(),
            metadata: RunMetadata {
                arena,
                tracked_roster: roster.map(TrackedRoster::fingerprint),
                sessions,
                quality,
                totals,
                clustering: self.config.clustering.clone(),
                profiles,
                catalog_failures: Vec::new(),
            },
            rounds,
            derived_events,
            utility,
            hotspots,
            round_profiles,
            exclusions,
        };
        check_invariants(&dataset)?;

        if dataset.metadata.totals.unclassified_samples > 0 || dataset.metadata.totals.orphan_rows > 0 {
            tracing::info!(
                "Data quality: {} of {} samples unclassified, {} clipped, {} orphan rows, {} incomplete rounds",
                dataset.metadata.totals.unclassified_samples,
                dataset.metadata.totals.position_samples,
                dataset.metadata.totals.boundary_clipped,
                dataset.metadata.totals.orphan_rows,
                dataset.metadata.totals.incomplete_rounds
            );
        }
        tracing::info!("{}", dataset.summary());
        Ok(dataset)
    }

    /// Hotspots for every category, in category order
    fn cluster_utility(&self, utility: &[UtilityRow]) -> Vec<CategoryHotspots> {
        let clustering = &self.config.clustering;
        UtilityCategory::ALL
            .par_iter()
            .map(|&category| {
                let rows: Vec<(usize, Point2)> = utility
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.category == category)
                    .filter(|(_, row)| match clustering.scope {
                        ClusterScope::AllSides => true,
                        ClusterScope::TrackedGroup => row.tracked,
                    })
                    .map(|(i, row)| (i, Point2::new(row.x, row.y)))
                    .collect();
                let result = find_hotspots(
                    category,
                    &rows,
                    clustering.params_for(category),
                    clustering.top_n,
                );
                tracing::debug!(
                    "{}: {} points, {} clusters, {} noise",
                    category,
                    result.points,
                    result.clusters_found,
                    result.noise
                );
                result
            })
            .collect()
    }
}

/// Hard integrity checks on a consolidated dataset
///
/// (session, round) must be unique in the round table, and every derived
/// event, utility row and round profile must point at a present round.
pub fn check_invariants(dataset: &ConsolidatedDataset) -> Result<()> {
    let mut present: AHashSet<(&SessionId, u32)> = AHashSet::with_capacity(dataset.rounds.len());
    for row in &dataset.rounds {
        if !present.insert((&row.session_id, row.round_num)) {
            return Err(EngineError::Invariant(format!(
                "round {} of session {} appears twice",
                row.round_num, row.session_id
            )));
        }
    }

    let dangling = dataset
        .derived_events
        .iter()
        .map(|e| ("derived event", &e.session_id, e.round_num))
        .chain(dataset.utility.iter().map(|u| ("utility row", &u.session_id, u.round_num)))
        .chain(
            dataset
                .round_profiles
                .iter()
                .map(|p| ("round profile", &p.session_id, p.round_num)),
        )
        .find(|(_, session, round)| !present.contains(&(*session, *round)));
    if let Some((table, session, round)) = dangling {
        return Err(EngineError::Invariant(format!(
            "{} references missing round {} of session {}",
            table, round, session
        )));
    }

    let included: AHashSet<&SessionId> = dataset.metadata.sessions.iter().collect();
    // Duplicate headers share an id with the kept copy
    let overlap = dataset.exclusions.iter().find(|e| {
        e.reason != ExclusionReason::DuplicateSession && included.contains(&e.session_id)
    });
    if let Some(exclusion) = overlap {
        return Err(EngineError::Invariant(format!(
            "session {} is both included and excluded",
            exclusion.session_id
        )));
    }

    Ok(())
}
