//! One session's sequential transform chain

use std::sync::Arc;

use crate::aggregate::{Exclusion, ExclusionReason, RoundRow, SessionOutput, UtilityRow};
use crate::clustering::FeatureExtractor;
use crate::core::config::{DetectionConfig, ProfileConfig};
use crate::core::records::{SessionInput, SideGroup};
use crate::detection::{BehaviorDetector, DerivedEvent};
use crate::spatial::ZoneCatalog;
use crate::timeline::build_session_timeline;

/// Tagged result of one session task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Processed(SessionOutput),
    Excluded(Exclusion),
}

/// Read-only state shared by every session worker
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub catalog: Arc<ZoneCatalog>,
    pub detection: &'a DetectionConfig,
    pub profiles: &'a ProfileConfig,
}

/// A validated session and the side-group fielded by the tracked roster
#[derive(Debug, Clone)]
pub struct SessionTask {
    pub input: SessionInput,
    pub tracked: SideGroup,
}

/// The contiguous run of `events` belonging to one round
///
/// Detection emits a session's events in round order.
fn events_of_round(events: &[DerivedEvent], round_num: u32) -> &[DerivedEvent] {
    let start = events.partition_point(|e| e.round_num < round_num);
    let end = events.partition_point(|e| e.round_num <= round_num);
    &events[start..end]
}

/// Timeline, detection and feature extraction for one session
pub fn process_session(ctx: &RunContext<'_>, task: &SessionTask) -> SessionOutcome {
    let SessionTask { input, tracked } = task;
    let session_id = input.id().clone();
    tracing::debug!("Processing session {}", session_id);

    let mut timeline = match build_session_timeline(input, tracked) {
        Ok(timeline) => timeline,
        Err(err) => {
            return SessionOutcome::Excluded(Exclusion::new(session_id, ExclusionReason::from(err)))
        }
    };

    let detector = BehaviorDetector::new(&ctx.catalog, tracked, ctx.detection);
    let events = detector.detect_session(&mut timeline);

    let features = if ctx.profiles.enabled {
        let extractor = FeatureExtractor::new(ctx.catalog.bounds(), ctx.profiles.grid_size);
        timeline
            .rounds
            .iter()
            .filter_map(|round| {
                let round_events = events_of_round(&events, round.round_num());
                extractor.extract(&session_id, round, tracked, round_events)
            })
            .collect()
    } else {
        Vec::new()
    };

    let rounds = timeline.rounds.iter().map(RoundRow::from_timeline).collect();
    let utility = timeline
        .rounds
        .iter()
        .flat_map(|round| &round.utility)
        .map(|record| {
            let is_tracked = tracked.actors.contains(&record.event.actor_id);
            UtilityRow::from_record(record, is_tracked)
        })
        .collect();

    if timeline.quality.has_gaps() {
        tracing::debug!(
            "Session {}: {} unclassified of {} samples, {} clipped, {} orphan rows",
            session_id,
            timeline.quality.unclassified_samples,
            timeline.quality.position_samples,
            timeline.quality.boundary_clipped,
            timeline.quality.orphan_rows
        );
    }
    tracing::info!(
        "Session {} done: {} rounds, {} derived events",
        session_id,
        timeline.rounds.len(),
        events.len()
    );

    SessionOutcome::Processed(SessionOutput {
        session_id,
        arena: input.header.arena.clone(),
        rounds,
        events,
        utility,
        features,
        quality: timeline.quality,
    })
}
