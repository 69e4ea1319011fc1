//! Event timelines
//!
//! Turns one session's flat rows into per-round, per-actor sequences ordered
//! by time offset. Sorting is stable, so equal timestamps keep ingestion
//! order. Timestamps outside the round window are clipped to the boundary and
//! tagged rather than dropped, since capture sources disagree on clocks.

mod roles;

pub use roles::{infer_role_from_samples, resolve_tracked_role};

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::core::quality::DataQuality;
use crate::core::records::{
    Phase, RoundRecord, SessionInput, SideGroup, UtilityCategory, UtilityEvent,
};
use crate::core::types::{ActorId, Point3, Role, SessionId, TimeOffset};

/// Session-level input defects; the session is excluded, others carry on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("round {found} follows round {previous}; round numbers must start at 1 and strictly increase")]
    InvalidRoundSequence { previous: u32, found: u32 },

    #[error("round {round} has an invalid time window ({start} .. {end})")]
    InvalidRoundWindow { round: u32, start: f64, end: f64 },
}

/// What a timeline entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Position(Phase),
    Utility(UtilityCategory),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub ts_offset: TimeOffset,
    pub point: Point3,
    pub kind: EntryKind,
    /// Role the actor reported for this sample
    pub role: Role,
    pub boundary_clipped: bool,
    /// Position of the source row in its input table
    pub ingest_index: usize,
}

impl TimelineEntry {
    pub fn phase(&self) -> Option<Phase> {
        match self.kind {
            EntryKind::Position(phase) => Some(phase),
            EntryKind::Utility(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KillEntry {
    pub ts_offset: TimeOffset,
    pub point: Point3,
    pub attacker: ActorId,
    pub victim: ActorId,
    pub boundary_clipped: bool,
    pub ingest_index: usize,
}

/// Utility row with its timestamp clipped to the round window
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityRecord {
    pub event: UtilityEvent,
    pub boundary_clipped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundTimeline {
    pub record: RoundRecord,
    pub duration: f64,
    pub actors: BTreeMap<ActorId, Vec<TimelineEntry>>,
    /// Utility rows in ingestion order
    pub utility: Vec<UtilityRecord>,
    /// Eliminations ordered by time
    pub kills: Vec<KillEntry>,
    /// Both role-groups have at least one position sample
    pub complete: bool,
    pub tracked_role: Option<Role>,
}

impl RoundTimeline {
    pub fn round_num(&self) -> u32 {
        self.record.round_num
    }

    /// Complete and with a known tracked role
    pub fn is_analyzable(&self) -> bool {
        self.complete && self.tracked_role.is_some()
    }

    /// Timelines of the tracked group's actors, in actor order
    pub fn tracked_actors<'a>(
        &'a self,
        tracked: &'a SideGroup,
    ) -> impl Iterator<Item = (&'a ActorId, &'a [TimelineEntry])> + 'a {
        self.actors
            .iter()
            .filter(move |(actor, _)| tracked.actors.contains(*actor))
            .map(|(actor, entries)| (actor, entries.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimeline {
    pub session_id: SessionId,
    pub rounds: Vec<RoundTimeline>,
    pub quality: DataQuality,
}

/// Clip an offset into `[0, duration]`, reporting whether it moved
fn clip(ts: f64, duration: f64) -> (f64, bool) {
    if ts.is_nan() || ts < 0.0 {
        (0.0, true)
    } else if ts > duration {
        (duration, true)
    } else {
        (ts, false)
    }
}

fn validate_rounds(rounds: &[RoundRecord]) -> Result<(), SessionError> {
    let mut previous = 0;
    for round in rounds {
        if round.round_num <= previous {
            return Err(SessionError::InvalidRoundSequence {
                previous,
                found: round.round_num,
            });
        }
        if !round.start_ts.is_finite() || !round.end_ts.is_finite() || round.end_ts < round.start_ts {
            return Err(SessionError::InvalidRoundWindow {
                round: round.round_num,
                start: round.start_ts,
                end: round.end_ts,
            });
        }
        previous = round.round_num;
    }
    Ok(())
}

/// Build every round timeline of one session
///
/// `tracked` is the session side-group matched to the tracked roster.
pub fn build_session_timeline(
    input: &SessionInput,
    tracked: &SideGroup,
) -> Result<SessionTimeline, SessionError> {
    validate_rounds(&input.rounds)?;

    let mut quality = DataQuality::default();
    let mut rounds: Vec<RoundTimeline> = input
        .rounds
        .iter()
        .map(|record| RoundTimeline {
            record: record.clone(),
            duration: record.duration(),
            actors: BTreeMap::new(),
            utility: Vec::new(),
            kills: Vec::new(),
            complete: false,
            tracked_role: None,
        })
        .collect();
    let by_num: AHashMap<u32, usize> = rounds
        .iter()
        .enumerate()
        .map(|(i, r)| (r.round_num(), i))
        .collect();

    for (ingest_index, sample) in input.positions.iter().enumerate() {
        let Some(&i) = by_num.get(&sample.round_num) else {
            quality.orphan_rows += 1;
            continue;
        };
        let round = &mut rounds[i];
        let (ts_offset, boundary_clipped) = clip(sample.ts_offset, round.duration);
        quality.boundary_clipped += boundary_clipped as usize;
        round
            .actors
            .entry(sample.actor_id.clone())
            .or_default()
            .push(TimelineEntry {
                ts_offset,
                point: sample.point(),
                kind: EntryKind::Position(sample.phase),
                role: sample.role,
                boundary_clipped,
                ingest_index,
            });
    }

    for (ingest_index, event) in input.utility.iter().enumerate() {
        let Some(&i) = by_num.get(&event.round_num) else {
            quality.orphan_rows += 1;
            continue;
        };
        let round = &mut rounds[i];
        let (ts_offset, boundary_clipped) = clip(event.ts_offset, round.duration);
        quality.boundary_clipped += boundary_clipped as usize;
        round
            .actors
            .entry(event.actor_id.clone())
            .or_default()
            .push(TimelineEntry {
                ts_offset,
                point: event.point(),
                kind: EntryKind::Utility(event.category),
                role: event.role,
                boundary_clipped,
                ingest_index,
            });
        round.utility.push(UtilityRecord {
            event: UtilityEvent { ts_offset, ..event.clone() },
            boundary_clipped,
        });
    }

    for (ingest_index, kill) in input.kills.iter().enumerate() {
        let Some(&i) = by_num.get(&kill.round_num) else {
            quality.orphan_rows += 1;
            continue;
        };
        let round = &mut rounds[i];
        let (ts_offset, boundary_clipped) = clip(kill.ts_offset, round.duration);
        quality.boundary_clipped += boundary_clipped as usize;
        round.kills.push(KillEntry {
            ts_offset,
            point: kill.point(),
            attacker: kill.actor_id.clone(),
            victim: kill.victim_id.clone(),
            boundary_clipped,
            ingest_index,
        });
    }

    let fingerprint = tracked.fingerprint();
    for round in &mut rounds {
        for entries in round.actors.values_mut() {
            entries.sort_by(|a, b| a.ts_offset.total_cmp(&b.ts_offset));
        }
        round.kills.sort_by(|a, b| a.ts_offset.total_cmp(&b.ts_offset));

        let roles_present: BTreeSet<Role> = round
            .actors
            .values()
            .flatten()
            .filter(|e| matches!(e.kind, EntryKind::Position(_)))
            .map(|e| e.role)
            .collect();
        round.complete = Role::ALL.iter().all(|role| roles_present.contains(role));
        if !round.complete {
            tracing::debug!(
                "{} round {}: role-group without samples, skipping behavior detection",
                input.id(),
                round.round_num()
            );
            quality.incomplete_rounds.push(round.round_num());
        }

        round.tracked_role = resolve_tracked_role(&round.record, &fingerprint, tracked, &round.actors);
        if round.tracked_role.is_none() {
            tracing::debug!(
                "{} round {}: tracked role unresolved",
                input.id(),
                round.round_num()
            );
            quality.unresolved_role_rounds.push(round.round_num());
        }
    }

    Ok(SessionTimeline {
        session_id: input.id().clone(),
        rounds,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{
        KillEvent, PositionSample, RoleMap, RosterFingerprint, RoundOutcome, SessionHeader,
    };

    fn group(names: &[&str]) -> SideGroup {
        SideGroup::new(names.iter().map(|n| ActorId::from(*n)))
    }

    fn session() -> SessionInput {
        let attackers = group(&["t1", "t2"]);
        let defenders = group(&["c1", "c2"]);
        let header = SessionHeader {
            id: SessionId::from("s1"),
            arena: "overpass".into(),
            side_groups: [attackers.clone(), defenders.clone()],
        };
        let mut input = SessionInput::new(header);
        input.rounds.push(RoundRecord {
            session_id: SessionId::from("s1"),
            round_num: 1,
            role_map: RoleMap {
                attacking: attackers.fingerprint(),
                defending: defenders.fingerprint(),
            },
            outcome: RoundOutcome { winner: Role::Defending, reason: "elimination".into() },
            start_ts: 1000.0,
            end_ts: 1100.0,
            economy_flag: true,
        });
        input
    }

    fn sample(actor: &str, role: Role, round: u32, ts: f64, phase: Phase) -> PositionSample {
        PositionSample {
            session_id: SessionId::from("s1"),
            round_num: round,
            actor_id: ActorId::from(actor),
            role,
            ts_offset: ts,
            x: ts,
            y: 0.0,
            z: 0.0,
            phase,
        }
    }

    #[test]
    fn test_stable_order_and_clipping() {
        let mut input = session();
        input.positions = vec![
            sample("c1", Role::Defending, 1, 30.0, Phase::MidRound),
            sample("c1", Role::Defending, 1, 10.0, Phase::FreezeEnd),
            sample("c1", Role::Defending, 1, 10.0, Phase::MidRound),
            sample("c1", Role::Defending, 1, -4.0, Phase::RoundStart),
            sample("c1", Role::Defending, 1, 250.0, Phase::MidRound),
            sample("t1", Role::Attacking, 1, 0.0, Phase::RoundStart),
        ];

        let timeline = build_session_timeline(&input, &group(&["c1", "c2"])).unwrap();
        let round = &timeline.rounds[0];
        let entries = &round.actors[&ActorId::from("c1")];

        let order: Vec<usize> = entries.iter().map(|e| e.ingest_index).collect();
        assert_eq!(order, vec![3, 1, 2, 0, 4]); // Ties keep ingestion order
        assert_eq!(entries[0].ts_offset, 0.0);
        assert!(entries[0].boundary_clipped);
        assert_eq!(entries[4].ts_offset, 100.0);
        assert!(entries[4].boundary_clipped);
        assert_eq!(timeline.quality.boundary_clipped, 2);
        assert!(round.complete);
        assert_eq!(round.tracked_role, Some(Role::Defending));
    }

    #[test]
    fn test_missing_role_group_marks_incomplete() {
        let mut input = session();
        input.positions = vec![sample("c1", Role::Defending, 1, 5.0, Phase::FreezeEnd)];

        let timeline = build_session_timeline(&input, &group(&["c1", "c2"])).unwrap();
        assert!(!timeline.rounds[0].complete);
        assert!(!timeline.rounds[0].is_analyzable());
        assert_eq!(timeline.quality.incomplete_rounds, vec![1]);
    }

    #[test]
    fn test_orphan_rows_are_counted() {
        let mut input = session();
        input.positions = vec![sample("c1", Role::Defending, 9, 5.0, Phase::FreezeEnd)];
        input.kills = vec![KillEvent {
            session_id: SessionId::from("s1"),
            round_num: 4,
            actor_id: ActorId::from("c1"),
            victim_id: ActorId::from("t1"),
            ts_offset: 3.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }];

        let timeline = build_session_timeline(&input, &group(&["c1", "c2"])).unwrap();
        assert_eq!(timeline.quality.orphan_rows, 2);
        assert!(timeline.rounds[0].actors.is_empty());
    }

    #[test]
    fn test_kills_sorted_by_time() {
        let mut input = session();
        let kill = |attacker: &str, ts: f64| KillEvent {
            session_id: SessionId::from("s1"),
            round_num: 1,
            actor_id: ActorId::from(attacker),
            victim_id: ActorId::from("x"),
            ts_offset: ts,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        input.kills = vec![kill("late", 40.0), kill("first", 12.0), kill("second", 12.0)];

        let timeline = build_session_timeline(&input, &group(&["c1", "c2"])).unwrap();
        let attackers: Vec<&str> = timeline.rounds[0]
            .kills
            .iter()
            .map(|k| k.attacker.as_str())
            .collect();
        assert_eq!(attackers, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_non_increasing_rounds_rejected() {
        let mut input = session();
        let mut dup = input.rounds[0].clone();
        dup.round_num = 1;
        input.rounds.push(dup);

        let err = build_session_timeline(&input, &group(&["c1"])).unwrap_err();
        assert_eq!(err, SessionError::InvalidRoundSequence { previous: 1, found: 1 });
    }

    #[test]
    fn test_round_zero_rejected() {
        let mut input = session();
        input.rounds[0].round_num = 0;
        assert!(build_session_timeline(&input, &group(&["c1"])).is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut input = session();
        input.rounds[0].end_ts = 900.0;
        let err = build_session_timeline(&input, &group(&["c1"])).unwrap_err();
        assert!(matches!(err, SessionError::InvalidRoundWindow { round: 1, .. }));
    }

    #[test]
    fn test_unknown_fingerprint_falls_back_to_samples() {
        let mut input = session();
        input.rounds[0].role_map.defending = RosterFingerprint("someone+else".into());
        input.positions = vec![
            sample("c1", Role::Defending, 1, 5.0, Phase::FreezeEnd),
            sample("t1", Role::Attacking, 1, 5.0, Phase::FreezeEnd),
        ];
        let timeline = build_session_timeline(&input, &group(&["c1", "c2"])).unwrap();
        assert_eq!(timeline.rounds[0].tracked_role, Some(Role::Defending));
    }
}
