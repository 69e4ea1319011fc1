//! Input table rows produced by the extraction stage
//!
//! Every row carries its session id so flat tables from many sessions can be
//! shipped together and partitioned here with `RawTables::into_sessions`.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::types::{ActorId, Point3, Role, SessionId, TimeOffset};

/// Stable identity of a roster: sorted actor ids joined with '+'
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterFingerprint(pub String);

impl RosterFingerprint {
    pub fn from_actors<'a>(actors: impl IntoIterator<Item = &'a ActorId>) -> Self {
        let sorted: BTreeSet<&str> = actors.into_iter().map(|a| a.as_str()).collect();
        Self(sorted.into_iter().collect::<Vec<_>>().join("+"))
    }
}

impl fmt::Display for RosterFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two competing side-groups of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideGroup {
    pub actors: BTreeSet<ActorId>,
}

impl SideGroup {
    pub fn new(actors: impl IntoIterator<Item = ActorId>) -> Self {
        Self { actors: actors.into_iter().collect() }
    }

    pub fn fingerprint(&self) -> RosterFingerprint {
        RosterFingerprint::from_actors(&self.actors)
    }

    /// Number of actors shared with another roster
    pub fn overlap(&self, roster: &BTreeSet<ActorId>) -> usize {
        self.actors.intersection(roster).count()
    }
}

/// Session header row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub id: SessionId,
    pub arena: String,
    pub side_groups: [SideGroup; 2],
}

/// Which side-group held which role in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    pub attacking: RosterFingerprint,
    pub defending: RosterFingerprint,
}

impl RoleMap {
    pub fn role_of(&self, fingerprint: &RosterFingerprint) -> Option<Role> {
        if &self.attacking == fingerprint {
            Some(Role::Attacking)
        } else if &self.defending == fingerprint {
            Some(Role::Defending)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub winner: Role,
    /// Terminal reason as reported by the recording (e.g. "elimination")
    pub reason: String,
}

/// Round table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub session_id: SessionId,
    pub round_num: u32,
    pub role_map: RoleMap,
    pub outcome: RoundOutcome,
    pub start_ts: f64,
    pub end_ts: f64,
    /// Low-economy / opening round, computed upstream
    #[serde(default)]
    pub economy_flag: bool,
}

impl RoundRecord {
    pub fn duration(&self) -> f64 {
        self.end_ts - self.start_ts
    }
}

/// Capture phase of a position sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    RoundStart,
    FreezeEnd,
    MidRound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub session_id: SessionId,
    pub round_num: u32,
    pub actor_id: ActorId,
    pub role: Role,
    pub ts_offset: TimeOffset,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub phase: Phase,
}

impl PositionSample {
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Thrown item category (the fixed set of four area-denial types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityCategory {
    Smoke,
    Flash,
    Incendiary,
    Explosive,
}

impl UtilityCategory {
    pub const ALL: [UtilityCategory; 4] = [
        UtilityCategory::Smoke,
        UtilityCategory::Flash,
        UtilityCategory::Incendiary,
        UtilityCategory::Explosive,
    ];

    pub fn index(&self) -> usize {
        match self {
            UtilityCategory::Smoke => 0,
            UtilityCategory::Flash => 1,
            UtilityCategory::Incendiary => 2,
            UtilityCategory::Explosive => 3,
        }
    }
}

impl fmt::Display for UtilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UtilityCategory::Smoke => "smoke",
            UtilityCategory::Flash => "flash",
            UtilityCategory::Incendiary => "incendiary",
            UtilityCategory::Explosive => "explosive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityEvent {
    pub session_id: SessionId,
    pub round_num: u32,
    pub actor_id: ActorId,
    pub role: Role,
    pub category: UtilityCategory,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub ts_offset: TimeOffset,
}

impl UtilityEvent {
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Elimination row; only used for first-contact timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub session_id: SessionId,
    pub round_num: u32,
    pub actor_id: ActorId,
    pub victim_id: ActorId,
    pub ts_offset: TimeOffset,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl KillEvent {
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// All rows belonging to one session, in ingestion order
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInput {
    pub header: SessionHeader,
    pub rounds: Vec<RoundRecord>,
    pub positions: Vec<PositionSample>,
    pub utility: Vec<UtilityEvent>,
    pub kills: Vec<KillEvent>,
}

impl SessionInput {
    pub fn new(header: SessionHeader) -> Self {
        Self {
            header,
            rounds: Vec::new(),
            positions: Vec::new(),
            utility: Vec::new(),
            kills: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.header.id
    }
}

/// Flat tables as delivered by the extraction stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTables {
    #[serde(default)]
    pub sessions: Vec<SessionHeader>,
    #[serde(default)]
    pub rounds: Vec<RoundRecord>,
    #[serde(default)]
    pub positions: Vec<PositionSample>,
    #[serde(default)]
    pub utility: Vec<UtilityEvent>,
    #[serde(default)]
    pub kills: Vec<KillEvent>,
}

impl RawTables {
    /// Partition rows by session, preserving ingestion order within each.
    ///
    /// Returns the per-session inputs (in header order) and the number of
    /// rows that named a session with no header. When two headers share an
    /// id, rows go to the first one.
    pub fn into_sessions(self) -> (Vec<SessionInput>, usize) {
        let mut inputs: Vec<SessionInput> = Vec::with_capacity(self.sessions.len());
        let mut index: AHashMap<SessionId, usize> = AHashMap::new();
        for header in self.sessions {
            index.entry(header.id.clone()).or_insert(inputs.len());
            inputs.push(SessionInput::new(header));
        }

        let mut unattributed = 0;
        for round in self.rounds {
            match index.get(&round.session_id) {
                Some(&i) => inputs[i].rounds.push(round),
                None => unattributed += 1,
            }
        }
        for sample in self.positions {
            match index.get(&sample.session_id) {
                Some(&i) => inputs[i].positions.push(sample),
                None => unattributed += 1,
            }
        }
        for event in self.utility {
            match index.get(&event.session_id) {
                Some(&i) => inputs[i].utility.push(event),
                None => unattributed += 1,
            }
        }
        for kill in self.kills {
            match index.get(&kill.session_id) {
                Some(&i) => inputs[i].kills.push(kill),
                None => unattributed += 1,
            }
        }

        (inputs, unattributed)
    }
}
