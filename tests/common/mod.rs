//! Shared fixtures: a small five-zone arena and scripted two-round sessions

#![allow(dead_code)]

use tendency_engine::core::config::EngineConfig;
use tendency_engine::core::records::{
    KillEvent, Phase, PositionSample, RawTables, RoleMap, RoundOutcome, RoundRecord,
    SessionHeader, SideGroup, UtilityCategory, UtilityEvent,
};
use tendency_engine::core::types::{ActorId, Role, SessionId};
use tendency_engine::spatial::{CatalogSet, ZoneCatalog};

pub const TRACKED: [&str; 5] = ["c1", "c2", "c3", "c4", "c5"];

/// Zones 10 units wide laid out along x:
/// ct_spawn [0,10), a_site [10,20), mid [20,30), t_spawn [30,40)
pub const OVERPASS: &str = r#"
    arena = "overpass"

    [[zones]]
    name = "ct_spawn"
    territory = "defended"
    [zones.shape]
    kind = "box"
    min = [0.0, 0.0]
    max = [10.0, 10.0]

    [[zones]]
    name = "a_site"
    role_affinity = "defending"
    territory = "defended"
    stronghold = true
    [zones.shape]
    kind = "box"
    min = [10.0, 0.0]
    max = [20.0, 10.0]

    [[zones]]
    name = "mid"
    territory = "contested"
    [zones.shape]
    kind = "box"
    min = [20.0, 0.0]
    max = [30.0, 10.0]

    [[zones]]
    name = "t_spawn"
    territory = "opponent"
    [zones.shape]
    kind = "box"
    min = [30.0, 0.0]
    max = [40.0, 10.0]
"#;

pub fn catalogs() -> CatalogSet {
    let mut set = CatalogSet::new();
    set.insert(ZoneCatalog::from_toml_str(OVERPASS).unwrap());
    set
}

pub fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.tracked.actors = TRACKED.iter().map(|a| ActorId::from(*a)).collect();
    config
}

fn group(names: &[&str]) -> SideGroup {
    SideGroup::new(names.iter().map(|n| ActorId::from(*n)))
}

fn opponents(session: &str) -> Vec<String> {
    (1..=5).map(|i| format!("{}_o{}", session, i)).collect()
}

/// Rows for one scripted session, appended to `tables`
///
/// Round 1, tracked defending: three tracked actors stack a_site at
/// freeze-end, c4 pushes ct_spawn -> mid, c4 opens the round with a kill.
/// Round 2, tracked attacking: c1 pushes t_spawn -> mid, no kills.
/// Tracked smokes land around (25, 5); one stray smoke lands at (90, 90).
pub fn add_session(tables: &mut RawTables, id: &str, arena: &str) {
    let opp_names = opponents(id);
    let opp: Vec<&str> = opp_names.iter().map(String::as_str).collect();
    add_session_against(tables, id, arena, &opp);
}

/// Same script as [`add_session`] against a given opposing roster
pub fn add_session_against(tables: &mut RawTables, id: &str, arena: &str, opp: &[&str]) {
    let sid = SessionId::from(id);
    let tracked = group(&TRACKED);
    let others = group(opp);

    tables.sessions.push(SessionHeader {
        id: sid.clone(),
        arena: arena.into(),
        side_groups: [others.clone(), tracked.clone()],
    });

    let round = |num: u32, tracked_role: Role, start: f64| RoundRecord {
        session_id: sid.clone(),
        round_num: num,
        role_map: match tracked_role {
            Role::Defending => RoleMap {
                attacking: others.fingerprint(),
                defending: tracked.fingerprint(),
            },
            Role::Attacking => RoleMap {
                attacking: tracked.fingerprint(),
                defending: others.fingerprint(),
            },
        },
        outcome: RoundOutcome { winner: Role::Defending, reason: "elimination".into() },
        start_ts: start,
        end_ts: start + 100.0,
        economy_flag: num == 1,
    };
    tables.rounds.push(round(1, Role::Defending, 0.0));
    tables.rounds.push(round(2, Role::Attacking, 200.0));

    let pos = |round_num: u32, actor: &str, role: Role, ts: f64, x: f64, phase: Phase| {
        PositionSample {
            session_id: sid.clone(),
            round_num,
            actor_id: ActorId::from(actor),
            role,
            ts_offset: ts,
            x,
            y: 5.0,
            z: 0.0,
            phase,
        }
    };

    // Round 1
    for actor in ["c1", "c2", "c3"] {
        tables.positions.push(pos(1, actor, Role::Defending, 15.0, 15.0, Phase::FreezeEnd));
    }
    tables.positions.push(pos(1, "c4", Role::Defending, 15.0, 5.0, Phase::FreezeEnd));
    tables.positions.push(pos(1, "c5", Role::Defending, 15.0, 5.0, Phase::FreezeEnd));
    tables.positions.push(pos(1, "c4", Role::Defending, 20.0, 5.0, Phase::MidRound));
    tables.positions.push(pos(1, "c4", Role::Defending, 25.0, 25.0, Phase::MidRound));
    // Off the map: unclassified
    tables.positions.push(pos(1, "c5", Role::Defending, 25.0, 500.0, Phase::MidRound));
    for &actor in opp {
        tables.positions.push(pos(1, actor, Role::Attacking, 15.0, 35.0, Phase::FreezeEnd));
    }
    tables.kills.push(KillEvent {
        session_id: sid.clone(),
        round_num: 1,
        actor_id: ActorId::from("c4"),
        victim_id: ActorId::from(opp[0]),
        ts_offset: 30.0,
        x: 26.0,
        y: 5.0,
        z: 0.0,
    });

    // Round 2
    for actor in TRACKED {
        tables.positions.push(pos(2, actor, Role::Attacking, 15.0, 35.0, Phase::FreezeEnd));
    }
    tables.positions.push(pos(2, "c1", Role::Attacking, 40.0, 25.0, Phase::MidRound));
    for &actor in opp {
        tables.positions.push(pos(2, actor, Role::Defending, 15.0, 5.0, Phase::FreezeEnd));
    }

    let smoke = |round_num: u32, actor: &str, role: Role, x: f64, y: f64| UtilityEvent {
        session_id: sid.clone(),
        round_num,
        actor_id: ActorId::from(actor),
        role,
        category: UtilityCategory::Smoke,
        x,
        y,
        z: 0.0,
        ts_offset: 18.0,
    };
    tables.utility.push(smoke(1, "c1", Role::Defending, 25.0, 5.0));
    tables.utility.push(smoke(1, "c2", Role::Defending, 25.5, 5.0));
    tables.utility.push(smoke(2, "c3", Role::Attacking, 25.0, 5.5));
    tables.utility.push(smoke(2, opp[1], Role::Defending, 90.0, 90.0));
}

pub fn tables(sessions: &[(&str, &str)]) -> RawTables {
    let mut tables = RawTables::default();
    for (id, arena) in sessions {
        add_session(&mut tables, id, arena);
    }
    tables
}
