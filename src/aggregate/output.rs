//! Consolidated run output and serialization

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::validation::Exclusion;
use crate::clustering::{CategoryHotspots, ProfileSummary, RoundFeatures, RoundProfile};
use crate::core::config::ClusteringConfig;
use crate::core::quality::{DataQuality, QualityTotals};
use crate::core::records::{RosterFingerprint, RoundRecord, UtilityCategory};
use crate::core::types::{ActorId, Role, SessionId, TimeOffset};
use crate::detection::DerivedEvent;
use crate::spatial::CatalogFailure;
use crate::timeline::{RoundTimeline, UtilityRecord};

/// Identifies one run; the only part of the output allowed to vary between
/// runs over the same input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    pub run_id: Uuid,
    /// Milliseconds since the Unix epoch
    pub generated_at_ms: u64,
}

impl RunStamp {
    pub fn now() -> Self {
        let generated_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            run_id: Uuid::new_v4(),
            generated_at_ms,
        }
    }
}

/// Round table row with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRow {
    pub session_id: SessionId,
    pub round_num: u32,
    /// `None` when the tracked group's role could not be resolved
    pub tracked_role: Option<Role>,
    pub winner: Role,
    pub reason: String,
    pub economy_flag: bool,
    pub start_ts: f64,
    pub end_ts: f64,
    /// Both role-groups had position samples
    pub complete: bool,
}

impl RoundRow {
    pub fn from_timeline(round: &RoundTimeline) -> Self {
        let RoundRecord {
            session_id,
            round_num,
            outcome,
            start_ts,
            end_ts,
            economy_flag,
            ..
        } = &round.record;
        Self {
            session_id: session_id.clone(),
            round_num: *round_num,
            tracked_role: round.tracked_role,
            winner: outcome.winner,
            reason: outcome.reason.clone(),
            economy_flag: *economy_flag,
            start_ts: *start_ts,
            end_ts: *end_ts,
            complete: round.complete,
        }
    }

    /// The tracked group won this round
    pub fn tracked_won(&self) -> Option<bool> {
        self.tracked_role.map(|role| role == self.winner)
    }
}

/// Utility table row with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityRow {
    pub session_id: SessionId,
    pub round_num: u32,
    pub actor_id: ActorId,
    pub role: Role,
    pub category: UtilityCategory,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub ts_offset: TimeOffset,
    pub boundary_clipped: bool,
    /// Thrown by a member of the tracked side-group
    pub tracked: bool,
}

impl UtilityRow {
    pub fn from_record(record: &UtilityRecord, tracked: bool) -> Self {
        let event = &record.event;
        Self {
            session_id: event.session_id.clone(),
            round_num: event.round_num,
            actor_id: event.actor_id.clone(),
            role: event.role,
            category: event.category,
            x: event.x,
            y: event.y,
            z: event.z,
            ts_offset: event.ts_offset,
            boundary_clipped: record.boundary_clipped,
            tracked,
        }
    }
}

/// Everything one session contributes to the run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutput {
    pub session_id: SessionId,
    pub arena: String,
    pub rounds: Vec<RoundRow>,
    pub events: Vec<DerivedEvent>,
    pub utility: Vec<UtilityRow>,
    pub features: Vec<RoundFeatures>,
    pub quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuality {
    pub session_id: SessionId,
    pub quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// `None` only when there was nothing to process
    pub arena: Option<String>,
    pub tracked_roster: Option<RosterFingerprint>,
    /// Included sessions, ascending
    pub sessions: Vec<SessionId>,
    pub quality: Vec<SessionQuality>,
    pub totals: QualityTotals,
    /// Effective clustering parameters
    pub clustering: ClusteringConfig,
    pub profiles: Vec<ProfileSummary>,
    /// Catalogs rejected at load time for arenas other than the target
    #[serde(default)]
    pub catalog_failures: Vec<CatalogFailure>,
}

/// Consolidated, append-only dataset of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDataset {
    pub stamp: RunStamp,
    pub metadata: RunMetadata,
    pub rounds: Vec<RoundRow>,
    pub derived_events: Vec<DerivedEvent>,
    pub utility: Vec<UtilityRow>,
    pub hotspots: Vec<CategoryHotspots>,
    pub round_profiles: Vec<RoundProfile>,
    pub exclusions: Vec<Exclusion>,
}

impl ConsolidatedDataset {
    /// Equal in everything but the run stamp
    pub fn same_content(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.rounds == other.rounds
            && self.derived_events == other.derived_events
            && self.utility == other.utility
            && self.hotspots == other.hotspots
            && self.round_profiles == other.round_profiles
            && self.exclusions == other.exclusions
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn summary(&self) -> String {
        let hotspots: usize = self.hotspots.iter().map(|c| c.hotspots.len()).sum();
        format!(
            "{} sessions on {} ({} excluded): {} rounds, {} derived events, {} utility rows, {} hotspots, unclassified rate {:.1}%",
            self.metadata.sessions.len(),
            self.metadata.arena.as_deref().unwrap_or("-"),
            self.exclusions.len(),
            self.rounds.len(),
            self.derived_events.len(),
            self.utility.len(),
            hotspots,
            self.metadata.totals.unclassified_rate * 100.0,
        )
    }
}
