//! Earliest elimination of a round

use super::{DerivedEvent, DerivedKind};
use crate::core::records::SideGroup;
use crate::core::types::{Role, SessionId};
use crate::spatial::ZoneCatalog;
use crate::timeline::RoundTimeline;

/// First-contact record, or `None` for a round without kills
///
/// `pushes` are the round's already-detected push events.
pub fn detect_first_contact(
    session_id: &SessionId,
    round: &RoundTimeline,
    catalog: &ZoneCatalog,
    tracked: &SideGroup,
    role: Role,
    pushes: &[DerivedEvent],
) -> Option<DerivedEvent> {
    let kill = round.kills.first()?;
    let preceded_by_push = pushes
        .iter()
        .any(|p| matches!(p.kind, DerivedKind::Push { .. }) && p.ts_offset <= kill.ts_offset);

    Some(DerivedEvent {
        session_id: session_id.clone(),
        round_num: round.round_num(),
        ts_offset: kill.ts_offset,
        role,
        kind: DerivedKind::FirstContact {
            attacker: kill.attacker.clone(),
            victim: kill.victim.clone(),
            zone: catalog.classify(kill.point).map(|z| z.name.clone()),
            tracked_initiated: tracked.actors.contains(&kill.attacker),
            preceded_by_push,
        },
    })
}
