//! Behavioral event detection
//!
//! Derives stack, push and first-contact events from complete round
//! timelines. Each round is evaluated on its own; a bad round never blocks
//! the next one.

mod classified;
mod first_contact;
mod push;
mod stack;

pub use classified::{classify_round, ClassifiedRound, ClassifiedSample};
pub use first_contact::detect_first_contact;
pub use push::detect_pushes;
pub use stack::detect_stacks;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::config::DetectionConfig;
use crate::core::records::SideGroup;
use crate::core::types::{ActorId, Role, SessionId, TimeOffset};
use crate::spatial::ZoneCatalog;
use crate::timeline::SessionTimeline;

/// What a derived event observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DerivedKind {
    Stack {
        zone: String,
        actors: Vec<ActorId>,
    },
    Push {
        actor: ActorId,
        from_zone: String,
        to_zone: String,
    },
    FirstContact {
        attacker: ActorId,
        victim: ActorId,
        zone: Option<String>,
        /// The attacker belongs to the tracked group
        tracked_initiated: bool,
        /// A tracked push happened at or before the kill
        preceded_by_push: bool,
    },
}

impl DerivedKind {
    pub fn label(&self) -> &'static str {
        match self {
            DerivedKind::Stack { .. } => "stack",
            DerivedKind::Push { .. } => "push",
            DerivedKind::FirstContact { .. } => "first_contact",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DerivedKind::Stack { .. } => 0,
            DerivedKind::Push { .. } => 1,
            DerivedKind::FirstContact { .. } => 2,
        }
    }

    /// Zone or actor that tells two events of the same kind apart
    fn subject(&self) -> &str {
        match self {
            DerivedKind::Stack { zone, .. } => zone,
            DerivedKind::Push { actor, .. } => actor.as_str(),
            DerivedKind::FirstContact { attacker, .. } => attacker.as_str(),
        }
    }
}

/// A derived event with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedEvent {
    pub session_id: SessionId,
    pub round_num: u32,
    pub ts_offset: TimeOffset,
    /// Role of the tracked group in the round
    pub role: Role,
    #[serde(flatten)]
    pub kind: DerivedKind,
}

impl DerivedEvent {
    /// Total order used for the consolidated event table
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.session_id
            .cmp(&other.session_id)
            .then(self.round_num.cmp(&other.round_num))
            .then(self.kind.rank().cmp(&other.kind.rank()))
            .then(self.ts_offset.total_cmp(&other.ts_offset))
            .then_with(|| self.kind.subject().cmp(other.kind.subject()))
    }
}

/// Runs the three detectors over one session's timeline
pub struct BehaviorDetector<'a> {
    catalog: &'a ZoneCatalog,
    tracked: &'a SideGroup,
    config: &'a DetectionConfig,
}

impl<'a> BehaviorDetector<'a> {
    pub fn new(catalog: &'a ZoneCatalog, tracked: &'a SideGroup, config: &'a DetectionConfig) -> Self {
        Self {
            catalog,
            tracked,
            config,
        }
    }

    /// Detect events in every analyzable round, updating the session's
    /// classification counters as it goes
    pub fn detect_session(&self, timeline: &mut SessionTimeline) -> Vec<DerivedEvent> {
        let SessionTimeline {
            session_id,
            rounds,
            quality,
        } = timeline;
        let mut events = Vec::new();

        for round in rounds.iter() {
            let classified = classify_round(round, self.catalog, self.tracked, quality);
            let Some(role) = round.tracked_role.filter(|_| round.complete) else {
                continue;
            };

            events.extend(detect_stacks(
                session_id,
                round,
                &classified,
                self.catalog,
                role,
                self.config.stack_threshold,
            ));
            let pushes = detect_pushes(session_id, round.round_num(), &classified, role);
            let contact = detect_first_contact(
                session_id,
                round,
                self.catalog,
                self.tracked,
                role,
                &pushes,
            );
            events.extend(pushes);
            events.extend(contact);
        }

        tracing::debug!(
            "{}: {} derived events over {} rounds",
            session_id,
            events.len(),
            rounds.len()
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{
        KillEvent, Phase, PositionSample, RoleMap, RoundOutcome, RoundRecord, SessionHeader,
        SessionInput,
    };
    use crate::spatial::{ShapeDef, TerritoryTag, ZoneDef};
    use crate::timeline::build_session_timeline;

    fn zone(
        name: &str,
        x0: f64,
        stronghold: bool,
        affinity: Option<Role>,
        territory: Option<TerritoryTag>,
    ) -> ZoneDef {
        ZoneDef {
            name: name.into(),
            shape: ShapeDef::Box {
                min: vec![x0, 0.0],
                max: vec![x0 + 10.0, 10.0],
            },
            role_affinity: affinity,
            territory,
            stronghold,
        }
    }

    /// Five zones laid out left to right along x, each 10 wide
    fn catalog() -> ZoneCatalog {
        ZoneCatalog::from_defs(
            "overpass",
            vec![
                zone("ct_spawn", 0.0, false, None, Some(TerritoryTag::Defended)),
                zone("a_site", 10.0, true, Some(Role::Defending), Some(TerritoryTag::Defended)),
                zone("mid", 20.0, false, None, Some(TerritoryTag::Contested)),
                zone("t_spawn", 30.0, false, None, Some(TerritoryTag::Opponent)),
                zone("connector", 40.0, false, None, None),
            ],
        )
        .unwrap()
    }

    fn defenders() -> SideGroup {
        SideGroup::new(["c1", "c2", "c3", "c4"].map(ActorId::from))
    }

    fn attackers() -> SideGroup {
        SideGroup::new(["t1", "t2", "t3", "t4"].map(ActorId::from))
    }

    fn input() -> SessionInput {
        let header = SessionHeader {
            id: SessionId::from("s1"),
            arena: "overpass".into(),
            side_groups: [attackers(), defenders()],
        };
        let mut input = SessionInput::new(header);
        input.rounds.push(RoundRecord {
            session_id: SessionId::from("s1"),
            round_num: 1,
            role_map: RoleMap {
                attacking: attackers().fingerprint(),
                defending: defenders().fingerprint(),
            },
            outcome: RoundOutcome { winner: Role::Attacking, reason: "elimination".into() },
            start_ts: 0.0,
            end_ts: 115.0,
            economy_flag: false,
        });
        // Keep the attacking role-group present so the round is complete
        input.positions.push(pos("t1", Role::Attacking, 0.0, 35.0, Phase::RoundStart));
        input
    }

    fn pos(actor: &str, role: Role, ts: f64, x: f64, phase: Phase) -> PositionSample {
        PositionSample {
            session_id: SessionId::from("s1"),
            round_num: 1,
            actor_id: ActorId::from(actor),
            role,
            ts_offset: ts,
            x,
            y: 5.0,
            z: 0.0,
            phase,
        }
    }

    fn kill(attacker: &str, victim: &str, ts: f64, x: f64) -> KillEvent {
        KillEvent {
            session_id: SessionId::from("s1"),
            round_num: 1,
            actor_id: ActorId::from(attacker),
            victim_id: ActorId::from(victim),
            ts_offset: ts,
            x,
            y: 5.0,
            z: 0.0,
        }
    }

    fn detect(input: &SessionInput, tracked: &SideGroup) -> (Vec<DerivedEvent>, SessionTimeline) {
        let catalog = catalog();
        let config = DetectionConfig::default();
        let mut timeline = build_session_timeline(input, tracked).unwrap();
        let events = BehaviorDetector::new(&catalog, tracked, &config).detect_session(&mut timeline);
        (events, timeline)
    }

    fn count(events: &[DerivedEvent], label: &str) -> usize {
        events.iter().filter(|e| e.kind.label() == label).count()
    }

    #[test]
    fn test_two_in_stronghold_is_not_a_stack() {
        let mut input = input();
        input.positions.push(pos("c1", Role::Defending, 15.0, 12.0, Phase::FreezeEnd));
        input.positions.push(pos("c2", Role::Defending, 15.0, 14.0, Phase::FreezeEnd));
        input.positions.push(pos("c3", Role::Defending, 15.0, 5.0, Phase::FreezeEnd));

        let (events, _) = detect(&input, &defenders());
        assert_eq!(count(&events, "stack"), 0);
    }

    #[test]
    fn test_three_in_stronghold_is_one_stack() {
        let mut input = input();
        input.positions.push(pos("c1", Role::Defending, 15.0, 12.0, Phase::FreezeEnd));
        input.positions.push(pos("c2", Role::Defending, 15.5, 14.0, Phase::FreezeEnd));
        input.positions.push(pos("c3", Role::Defending, 15.2, 18.0, Phase::FreezeEnd));
        // Earlier freeze-end sample outside the zone is superseded
        input.positions.push(pos("c4", Role::Defending, 14.0, 12.0, Phase::FreezeEnd));
        input.positions.push(pos("c4", Role::Defending, 15.0, 5.0, Phase::FreezeEnd));

        let (events, _) = detect(&input, &defenders());
        let stacks: Vec<_> = events.iter().filter(|e| e.kind.label() == "stack").collect();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].ts_offset, 15.5);
        match &stacks[0].kind {
            DerivedKind::Stack { zone, actors } => {
                assert_eq!(zone, "a_site");
                assert_eq!(actors.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stack_falls_back_to_round_start() {
        let mut input = input();
        for actor in ["c1", "c2", "c3"] {
            input.positions.push(pos(actor, Role::Defending, 0.0, 15.0, Phase::RoundStart));
        }
        let (events, _) = detect(&input, &defenders());
        assert_eq!(count(&events, "stack"), 1);
    }

    #[test]
    fn test_stronghold_affinity_excludes_other_role() {
        let mut input = input();
        for actor in ["t1", "t2", "t3"] {
            input.positions.push(pos(actor, Role::Attacking, 15.0, 15.0, Phase::FreezeEnd));
        }
        input.positions.push(pos("c1", Role::Defending, 0.0, 5.0, Phase::RoundStart));

        let (events, _) = detect(&input, &attackers());
        assert_eq!(count(&events, "stack"), 0);
    }

    #[test]
    fn test_push_fires_once_under_reentry() {
        let mut input = input();
        let path = [5.0, 25.0, 5.0, 25.0, 35.0];
        for (i, x) in path.iter().enumerate() {
            input
                .positions
                .push(pos("c1", Role::Defending, 20.0 + i as f64, *x, Phase::MidRound));
        }

        let (events, _) = detect(&input, &defenders());
        let pushes: Vec<_> = events.iter().filter(|e| e.kind.label() == "push").collect();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].ts_offset, 21.0);
        assert!(matches!(
            &pushes[0].kind,
            DerivedKind::Push { from_zone, to_zone, .. } if from_zone == "ct_spawn" && to_zone == "mid"
        ));
    }

    #[test]
    fn test_push_skips_unclassified_but_breaks_on_untagged() {
        let mut input = input();
        // ct_spawn -> nowhere -> mid: still a push
        input.positions.push(pos("c1", Role::Defending, 20.0, 5.0, Phase::MidRound));
        input.positions.push(pos("c1", Role::Defending, 21.0, 500.0, Phase::MidRound));
        input.positions.push(pos("c1", Role::Defending, 22.0, 25.0, Phase::MidRound));
        // ct_spawn -> connector (untagged) -> mid: no push
        input.positions.push(pos("c2", Role::Defending, 20.0, 5.0, Phase::MidRound));
        input.positions.push(pos("c2", Role::Defending, 21.0, 45.0, Phase::MidRound));
        input.positions.push(pos("c2", Role::Defending, 22.0, 25.0, Phase::MidRound));

        let (events, timeline) = detect(&input, &defenders());
        assert_eq!(count(&events, "push"), 1);
        assert_eq!(timeline.quality.unclassified_samples, 1);
        assert_eq!(timeline.quality.position_samples, 7);
    }

    #[test]
    fn test_attacker_territory_is_flipped() {
        let mut input = input();
        input.positions.push(pos("c1", Role::Defending, 0.0, 5.0, Phase::RoundStart));
        input.positions.push(pos("t2", Role::Attacking, 20.0, 35.0, Phase::MidRound));
        input.positions.push(pos("t2", Role::Attacking, 21.0, 25.0, Phase::MidRound));
        // Walking into the defenders' spawn is not leaving defended ground
        input.positions.push(pos("t3", Role::Attacking, 20.0, 25.0, Phase::MidRound));
        input.positions.push(pos("t3", Role::Attacking, 21.0, 5.0, Phase::MidRound));

        let (events, _) = detect(&input, &attackers());
        let pushes: Vec<_> = events.iter().filter(|e| e.kind.label() == "push").collect();
        assert_eq!(pushes.len(), 1);
        assert!(matches!(&pushes[0].kind, DerivedKind::Push { actor, .. } if actor.as_str() == "t2"));
    }

    #[test]
    fn test_first_contact_after_push() {
        let mut input = input();
        input.positions.push(pos("c1", Role::Defending, 20.0, 5.0, Phase::MidRound));
        input.positions.push(pos("c1", Role::Defending, 22.0, 25.0, Phase::MidRound));
        input.kills.push(kill("t1", "c2", 40.0, 25.0));
        input.kills.push(kill("c1", "t1", 22.0, 24.0));

        let (events, _) = detect(&input, &defenders());
        let contact = events
            .iter()
            .find(|e| e.kind.label() == "first_contact")
            .unwrap();
        assert_eq!(contact.ts_offset, 22.0);
        assert_eq!(
            contact.kind,
            DerivedKind::FirstContact {
                attacker: ActorId::from("c1"),
                victim: ActorId::from("t1"),
                zone: Some("mid".into()),
                tracked_initiated: true,
                preceded_by_push: true,
            }
        );
    }

    #[test]
    fn test_round_without_kills_has_no_contact() {
        let mut input = input();
        input.positions.push(pos("c1", Role::Defending, 20.0, 5.0, Phase::MidRound));
        let (events, _) = detect(&input, &defenders());
        assert_eq!(count(&events, "first_contact"), 0);
    }

    #[test]
    fn test_incomplete_round_is_skipped() {
        let mut input = input();
        input.positions.clear();
        for actor in ["c1", "c2", "c3"] {
            input.positions.push(pos(actor, Role::Defending, 15.0, 15.0, Phase::FreezeEnd));
        }
        input.kills.push(kill("c1", "t1", 30.0, 15.0));

        let (events, timeline) = detect(&input, &defenders());
        assert!(events.is_empty());
        // Samples are still counted
        assert_eq!(timeline.quality.position_samples, 3);
    }

    #[test]
    fn test_canonical_order() {
        let event = |round: u32, ts: f64, kind: DerivedKind| DerivedEvent {
            session_id: SessionId::from("s1"),
            round_num: round,
            ts_offset: ts,
            role: Role::Defending,
            kind,
        };
        let push = DerivedKind::Push {
            actor: ActorId::from("c1"),
            from_zone: "a".into(),
            to_zone: "b".into(),
        };
        let stack = DerivedKind::Stack { zone: "a_site".into(), actors: vec![] };
        let mut events = vec![
            event(2, 1.0, stack.clone()),
            event(1, 5.0, push.clone()),
            event(1, 15.0, stack),
        ];
        events.sort_by(|a, b| a.canonical_cmp(b));
        let labels: Vec<(u32, &str)> = events.iter().map(|e| (e.round_num, e.kind.label())).collect();
        assert_eq!(labels, vec![(1, "stack"), (1, "push"), (2, "stack")]);
    }
}
