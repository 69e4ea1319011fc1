//! Stronghold stacking at freeze-end

use std::collections::BTreeMap;

use super::classified::ClassifiedRound;
use super::{DerivedEvent, DerivedKind};
use crate::core::records::Phase;
use crate::core::types::{ActorId, Role, SessionId};
use crate::spatial::{Zone, ZoneCatalog};
use crate::timeline::RoundTimeline;

/// Which capture phase the snapshot is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Snapshot {
    FreezeEnd,
    /// No tracked actor has a freeze-end sample this round
    RoundStart,
}

impl Snapshot {
    fn phase(self) -> Phase {
        match self {
            Snapshot::FreezeEnd => Phase::FreezeEnd,
            Snapshot::RoundStart => Phase::RoundStart,
        }
    }
}

/// Strongholds the tracked group may stack into while holding `role`
fn eligible(zone: &Zone, role: Role) -> bool {
    zone.stronghold && zone.role_affinity.map_or(true, |r| r == role)
}

/// Emit one stack per eligible stronghold holding at least `threshold`
/// distinct tracked actors in the snapshot
pub fn detect_stacks(
    session_id: &SessionId,
    round: &RoundTimeline,
    classified: &ClassifiedRound<'_>,
    catalog: &ZoneCatalog,
    role: Role,
    threshold: usize,
) -> Vec<DerivedEvent> {
    let has_freeze_end = classified
        .tracked
        .values()
        .flatten()
        .any(|s| s.entry.phase() == Some(Phase::FreezeEnd));
    let snapshot = if has_freeze_end {
        Snapshot::FreezeEnd
    } else {
        Snapshot::RoundStart
    };

    // zone name -> (actors, latest snapshot time)
    let mut occupancy: BTreeMap<&str, (Vec<ActorId>, f64)> = BTreeMap::new();
    for (actor, samples) in &classified.tracked {
        let last = samples
            .iter()
            .rev()
            .find(|s| s.entry.phase() == Some(snapshot.phase()));
        let Some(sample) = last else { continue };
        let Some(zone) = sample.zone else { continue };
        if !eligible(zone, role) {
            continue;
        }
        let slot = occupancy.entry(zone.name.as_str()).or_insert((Vec::new(), 0.0));
        slot.0.push((*actor).clone());
        slot.1 = slot.1.max(sample.entry.ts_offset);
    }

    catalog
        .strongholds()
        .filter_map(|zone| {
            let (actors, ts_offset) = occupancy.get(zone.name.as_str())?;
            if actors.len() < threshold {
                return None;
            }
            Some(DerivedEvent {
                session_id: session_id.clone(),
                round_num: round.round_num(),
                ts_offset: *ts_offset,
                role,
                kind: DerivedKind::Stack {
                    zone: zone.name.clone(),
                    actors: actors.clone(),
                },
            })
        })
        .collect()
}
