//! Tracked role resolution

use std::collections::BTreeMap;

use super::{EntryKind, TimelineEntry};
use crate::core::records::{RosterFingerprint, RoundRecord, SideGroup};
use crate::core::types::{ActorId, Role};

/// Role held by the tracked group in a round
///
/// The round's role map is authoritative. When it names neither side by the
/// tracked fingerprint, the role is inferred from the samples themselves.
pub fn resolve_tracked_role(
    record: &RoundRecord,
    fingerprint: &RosterFingerprint,
    tracked: &SideGroup,
    actors: &BTreeMap<ActorId, Vec<TimelineEntry>>,
) -> Option<Role> {
    record
        .role_map
        .role_of(fingerprint)
        .or_else(|| infer_role_from_samples(tracked, actors))
}

/// Majority vote over the first position sample of each tracked actor
///
/// Ties go to the role of the first tracked actor in id order.
pub fn infer_role_from_samples(
    tracked: &SideGroup,
    actors: &BTreeMap<ActorId, Vec<TimelineEntry>>,
) -> Option<Role> {
    let mut votes = [0usize; 2];
    let mut first = None;

    for (actor, entries) in actors {
        if !tracked.actors.contains(actor) {
            continue;
        }
        let Some(entry) = entries
            .iter()
            .find(|e| matches!(e.kind, EntryKind::Position(_)))
        else {
            continue;
        };
        votes[entry.role as usize] += 1;
        first.get_or_insert(entry.role);
    }

    let [attacking, defending] = votes;
    match attacking.cmp(&defending) {
        std::cmp::Ordering::Greater => Some(Role::Attacking),
        std::cmp::Ordering::Less => Some(Role::Defending),
        std::cmp::Ordering::Equal => first,
    }
}
