//! Forward pushes out of defended ground

use super::classified::ClassifiedRound;
use super::{DerivedEvent, DerivedKind};
use crate::core::types::{Role, SessionId};
use crate::spatial::{TerritoryTag, Zone};

/// Per-actor walk state
#[derive(Clone, Copy)]
enum PushState<'a> {
    /// Waiting for a defended -> forward transition
    Seeking { previous: Option<&'a Zone> },
    Fired,
}

/// First defended -> contested/opponent transition of each tracked actor
pub fn detect_pushes(
    session_id: &SessionId,
    round_num: u32,
    classified: &ClassifiedRound<'_>,
    role: Role,
) -> Vec<DerivedEvent> {
    let mut events = Vec::new();

    for (actor, samples) in &classified.tracked {
        let mut state = PushState::Seeking { previous: None };

        for sample in samples {
            let PushState::Seeking { previous } = state else { break };
            // Unclassified samples neither start nor break a transition
            let Some(zone) = sample.zone else { continue };

            let was_defended = previous
                .and_then(|z| z.territory)
                .map(|t| t.relative_to(role) == TerritoryTag::Defended)
                .unwrap_or(false);
            let is_forward = zone
                .territory
                .map(|t| t.relative_to(role).is_forward())
                .unwrap_or(false);

            state = match (was_defended && is_forward, previous) {
                (true, Some(from)) => {
                    events.push(DerivedEvent {
                        session_id: session_id.clone(),
                        round_num,
                        ts_offset: sample.entry.ts_offset,
                        role,
                        kind: DerivedKind::Push {
                            actor: (*actor).clone(),
                            from_zone: from.name.clone(),
                            to_zone: zone.name.clone(),
                        },
                    });
                    PushState::Fired
                }
                _ => PushState::Seeking { previous: Some(zone) },
            };
        }
    }

    events
}
