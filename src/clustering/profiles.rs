//! Round profiles
//!
//! Each analyzable round is summarized as a feature vector of the tracked
//! group's utility usage, contact timing, derived-event counts and where it
//! stood early, mid and late in the round. Rounds with similar vectors are
//! grouped per role with the same density clustering used for hotspots.

use geo::Rect;
use serde::{Deserialize, Serialize};

use super::dbscan::cluster_count;
use super::hotspots::cluster_rows;
use crate::core::config::ClusterParams;
use crate::core::records::SideGroup;
use crate::core::types::{Role, SessionId};
use crate::detection::{DerivedEvent, DerivedKind};
use crate::spatial::grid::Grid;
use crate::timeline::{EntryKind, RoundTimeline};

/// Upper bound (seconds) of the early occupancy window
pub const EARLY_WINDOW: f64 = 15.0;
/// Upper bound (seconds) of the mid-round occupancy window
pub const MID_WINDOW: f64 = 45.0;

/// Scalar features ahead of the occupancy grids
const SCALAR_FEATURES: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundFeatures {
    pub session_id: SessionId,
    pub round_num: u32,
    pub role: Role,
    /// The tracked group won the round
    pub won: bool,
    pub values: Vec<f64>,
}

/// A round and the profile cluster it fell in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundProfile {
    pub session_id: SessionId,
    pub round_num: u32,
    pub role: Role,
    pub won: bool,
    /// `None` is noise; labels are per role
    pub cluster: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub role: Role,
    pub rounds: usize,
    pub clusters_found: usize,
    pub noise: usize,
    pub params: ClusterParams,
}

/// Builds round feature vectors over a fixed arena extent
pub struct FeatureExtractor {
    bounds: Rect<f64>,
    grid_size: usize,
}

impl FeatureExtractor {
    pub fn new(bounds: Rect<f64>, grid_size: usize) -> Self {
        Self { bounds, grid_size }
    }

    pub fn feature_len(&self) -> usize {
        SCALAR_FEATURES + 3 * self.grid_size * self.grid_size
    }

    /// Features for one round, or `None` when the round is not analyzable
    ///
    /// `round_events` are the events derived from this round.
    pub fn extract(
        &self,
        session_id: &SessionId,
        round: &RoundTimeline,
        tracked: &SideGroup,
        round_events: &[DerivedEvent],
    ) -> Option<RoundFeatures> {
        let role = round.tracked_role.filter(|_| round.complete)?;

        let mut counts = [0.0; 4];
        let mut utility_times = Vec::new();
        let mut grids: [Grid<f64>; 3] = [
            Grid::covering(self.bounds, self.grid_size),
            Grid::covering(self.bounds, self.grid_size),
            Grid::covering(self.bounds, self.grid_size),
        ];

        for (_, entries) in round.tracked_actors(tracked) {
            for entry in entries {
                match entry.kind {
                    EntryKind::Utility(category) => {
                        counts[category.index()] += 1.0;
                        utility_times.push(entry.ts_offset);
                    }
                    EntryKind::Position(_) => {
                        let window = if entry.ts_offset <= EARLY_WINDOW {
                            0
                        } else if entry.ts_offset <= MID_WINDOW {
                            1
                        } else {
                            2
                        };
                        grids[window].accumulate(entry.point.xy());
                    }
                }
            }
        }

        let (mean_utility, first_utility) = if utility_times.is_empty() {
            (0.0, 0.0)
        } else {
            let sum: f64 = utility_times.iter().sum();
            let first = utility_times.iter().copied().fold(f64::INFINITY, f64::min);
            (sum / utility_times.len() as f64, first)
        };

        let (mut stacks, mut pushes, mut contact) = (0.0, 0.0, None);
        for event in round_events {
            match event.kind {
                DerivedKind::Stack { .. } => stacks += 1.0,
                DerivedKind::Push { .. } => pushes += 1.0,
                DerivedKind::FirstContact { .. } => contact = Some(event.ts_offset),
            }
        }

        let mut values = Vec::with_capacity(self.feature_len());
        values.extend_from_slice(&counts);
        values.extend([
            mean_utility,
            first_utility,
            contact.unwrap_or(round.duration),
            stacks,
            pushes,
        ]);
        for grid in &grids {
            values.extend_from_slice(grid.cells());
        }
        // Bad coordinates must not poison the scaler
        for v in values.iter_mut().filter(|v| !v.is_finite()) {
            *v = 0.0;
        }

        Some(RoundFeatures {
            session_id: session_id.clone(),
            round_num: round.round_num(),
            role,
            won: round.record.outcome.winner == role,
            values,
        })
    }
}

/// Cluster rounds per role; the returned profiles keep the input order
pub fn cluster_profiles(
    features: &[RoundFeatures],
    params: ClusterParams,
) -> (Vec<RoundProfile>, Vec<ProfileSummary>) {
    let mut labels: Vec<Option<usize>> = vec![None; features.len()];
    let mut summaries = Vec::new();

    for role in Role::ALL {
        let indices: Vec<usize> = (0..features.len())
            .filter(|&i| features[i].role == role)
            .collect();
        if indices.is_empty() {
            continue;
        }
        let rows: Vec<Vec<f64>> = indices.iter().map(|&i| features[i].values.clone()).collect();
        let role_labels = cluster_rows(&rows, params);

        summaries.push(ProfileSummary {
            role,
            rounds: rows.len(),
            clusters_found: cluster_count(&role_labels),
            noise: role_labels.iter().filter(|l| l.is_none()).count(),
            params,
        });
        for (&i, label) in indices.iter().zip(role_labels) {
            labels[i] = label;
        }
    }

    let profiles = features
        .iter()
        .zip(labels)
        .map(|(f, cluster)| RoundProfile {
            session_id: f.session_id.clone(),
            round_num: f.round_num,
            role: f.role,
            won: f.won,
            cluster,
        })
        .collect();

    (profiles, summaries)
}
