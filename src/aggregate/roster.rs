//! Tracked roster identification and side matching

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::core::config::TrackedConfig;
use crate::core::records::{RosterFingerprint, SessionHeader, SideGroup};
use crate::core::types::ActorId;

/// Share of sessions an actor must appear in when no core is common to all
pub const PRESENCE_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Tracked roster is ambiguous between {first} and {second}; set tracked.actors")]
    Ambiguous {
        first: RosterFingerprint,
        second: RosterFingerprint,
    },
}

/// The actor set whose tendencies are being profiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRoster {
    pub actors: BTreeSet<ActorId>,
    /// Shared actors needed for a side-group to count as the roster
    pub min_overlap: usize,
}

impl TrackedRoster {
    pub fn new(actors: impl IntoIterator<Item = ActorId>, min_overlap: usize) -> Self {
        Self {
            actors: actors.into_iter().collect(),
            min_overlap,
        }
    }

    /// Configured actors, or the roster identified from the session headers
    pub fn resolve(
        config: &TrackedConfig,
        headers: &[&SessionHeader],
    ) -> Result<Option<Self>, RosterError> {
        if !config.actors.is_empty() {
            return Ok(Some(Self::new(config.actors.iter().cloned(), config.min_overlap)));
        }
        let Some(actors) = identify_tracked_roster(headers, config.min_players)? else {
            return Ok(None);
        };
        tracing::info!(
            "Identified tracked roster of {} actors across {} sessions",
            actors.len(),
            headers.len()
        );
        Ok(Some(Self::new(actors, config.min_overlap)))
    }

    pub fn fingerprint(&self) -> RosterFingerprint {
        RosterFingerprint::from_actors(&self.actors)
    }

    /// The session side-group fielded by this roster
    ///
    /// The side with the larger overlap wins; equal overlap on both sides is
    /// ambiguous and matches neither.
    pub fn match_side<'a>(&self, header: &'a SessionHeader) -> Option<&'a SideGroup> {
        let [a, b] = &header.side_groups;
        let (overlap_a, overlap_b) = (a.overlap(&self.actors), b.overlap(&self.actors));
        let (best, overlap) = match overlap_a.cmp(&overlap_b) {
            std::cmp::Ordering::Greater => (a, overlap_a),
            std::cmp::Ordering::Less => (b, overlap_b),
            std::cmp::Ordering::Equal => return None,
        };
        (overlap >= self.min_overlap).then_some(best)
    }
}

/// Recurring actors split by the side they play on
///
/// Actors that ever share a side-group in a session end up in the same
/// cohort. Cohorts are in order of their smallest actor id.
fn side_cohorts<'a>(
    candidates: &BTreeSet<&'a ActorId>,
    headers: &[&'a SessionHeader],
) -> Vec<BTreeSet<&'a ActorId>> {
    let mut cohorts: Vec<BTreeSet<&ActorId>> = Vec::new();
    for &header in headers {
        for group in &header.side_groups {
            let mut merged: BTreeSet<&ActorId> = group
                .actors
                .iter()
                .filter(|a| candidates.contains(a))
                .collect();
            if merged.is_empty() {
                continue;
            }
            cohorts.retain(|cohort| {
                if cohort.is_disjoint(&merged) {
                    true
                } else {
                    merged.extend(cohort.iter().copied());
                    false
                }
            });
            cohorts.push(merged);
        }
    }
    cohorts.sort();
    cohorts
}

/// The largest cohort of at least `min_players`, if it is the only one that
/// large
fn pick_cohort(
    cohorts: Vec<BTreeSet<&ActorId>>,
    min_players: usize,
) -> Result<Option<BTreeSet<ActorId>>, RosterError> {
    let mut eligible: Vec<BTreeSet<&ActorId>> = cohorts
        .into_iter()
        .filter(|c| c.len() >= min_players.max(1))
        .collect();
    eligible.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    match eligible.as_slice() {
        [] => Ok(None),
        [first, second, ..] if first.len() == second.len() => Err(RosterError::Ambiguous {
            first: RosterFingerprint::from_actors(first.iter().copied()),
            second: RosterFingerprint::from_actors(second.iter().copied()),
        }),
        [first, ..] => Ok(Some(first.iter().map(|a| (*a).clone()).collect())),
    }
}

/// The recurring roster of one side-group
///
/// Candidates are the actors common to every session, or failing that, those
/// present in at least [`PRESENCE_RATIO`] of them. Candidates are split by
/// side and the largest side cohort of at least `min_players` wins; two
/// equally large cohorts (the same two sides meeting every time) cannot be
/// told apart and yield [`RosterError::Ambiguous`].
pub fn identify_tracked_roster(
    headers: &[&SessionHeader],
    min_players: usize,
) -> Result<Option<BTreeSet<ActorId>>, RosterError> {
    let per_session: Vec<BTreeSet<&ActorId>> = headers
        .iter()
        .map(|h| h.side_groups.iter().flat_map(|g| &g.actors).collect())
        .collect();
    let Some((first, rest)) = per_session.split_first() else {
        return Ok(None);
    };

    let common: BTreeSet<&ActorId> = rest
        .iter()
        .fold(first.clone(), |acc, s| acc.intersection(s).copied().collect());
    if let Some(roster) = pick_cohort(side_cohorts(&common, headers), min_players)? {
        return Ok(Some(roster));
    }

    let mut presence: BTreeMap<&ActorId, usize> = BTreeMap::new();
    for actors in &per_session {
        for actor in actors {
            *presence.entry(*actor).or_default() += 1;
        }
    }
    let threshold = per_session.len() as f64 * PRESENCE_RATIO;
    let frequent: BTreeSet<&ActorId> = presence
        .into_iter()
        .filter(|(_, count)| *count as f64 >= threshold)
        .map(|(actor, _)| actor)
        .collect();
    pick_cohort(side_cohorts(&frequent, headers), min_players)
}
