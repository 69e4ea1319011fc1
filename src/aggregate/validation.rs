//! Session-level validation and exclusion records

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::roster::TrackedRoster;
use crate::core::records::{SessionHeader, SideGroup};
use crate::core::types::SessionId;
use crate::spatial::CatalogSet;
use crate::timeline::SessionError;

/// Why a session was left out of the consolidated dataset
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ExclusionReason {
    #[error("arena '{found}' does not match target arena '{expected}'")]
    ArenaMismatch { expected: String, found: String },

    #[error("no side-group matches the tracked roster")]
    MissingTrackedGroup,

    #[error("session id already seen in this run")]
    DuplicateSession,

    #[error("round {found} follows round {previous}")]
    InvalidRoundSequence { previous: u32, found: u32 },

    #[error("round {round} has an invalid time window ({start} .. {end})")]
    InvalidRoundWindow { round: u32, start: f64, end: f64 },

    #[error("no zone catalog loaded for arena '{arena}'")]
    MissingCatalog { arena: String },

    #[error("processing failed: {message}")]
    ProcessingFailed { message: String },

    #[error("worker panicked: {message}")]
    WorkerPanicked { message: String },
}

impl From<SessionError> for ExclusionReason {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidRoundSequence { previous, found } => {
                ExclusionReason::InvalidRoundSequence { previous, found }
            }
            SessionError::InvalidRoundWindow { round, start, end } => {
                ExclusionReason::InvalidRoundWindow { round, start, end }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub session_id: SessionId,
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn new(session_id: SessionId, reason: ExclusionReason) -> Self {
        Self { session_id, reason }
    }
}

/// Configured arena, else the arena most sessions were played on
///
/// Ties go to the lexically smallest arena name.
pub fn select_target_arena(configured: Option<&str>, headers: &[&SessionHeader]) -> Option<String> {
    if let Some(arena) = configured {
        return Some(arena.to_string());
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for header in headers {
        *counts.entry(header.arena.as_str()).or_default() += 1;
    }
    // Names come ascending; a later arena has to beat the count strictly
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (arena, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((arena, n)),
        })
        .map(|(arena, _)| arena.to_string())
}

/// Header checks run before any per-session work
pub struct SessionValidator<'a> {
    target_arena: &'a str,
    roster: Option<&'a TrackedRoster>,
    catalogs: &'a CatalogSet,
    seen: BTreeSet<SessionId>,
}

impl<'a> SessionValidator<'a> {
    pub fn new(
        target_arena: &'a str,
        roster: Option<&'a TrackedRoster>,
        catalogs: &'a CatalogSet,
    ) -> Self {
        Self {
            target_arena,
            roster,
            catalogs,
            seen: BTreeSet::new(),
        }
    }

    /// The tracked side-group of an acceptable session
    ///
    /// Call once per header, in input order; the first header with a given
    /// id is kept and later ones are duplicates.
    pub fn check<'h>(&mut self, header: &'h SessionHeader) -> Result<&'h SideGroup, ExclusionReason> {
        if !self.seen.insert(header.id.clone()) {
            return Err(ExclusionReason::DuplicateSession);
        }
        if header.arena != self.target_arena {
            return Err(ExclusionReason::ArenaMismatch {
                expected: self.target_arena.to_string(),
                found: header.arena.clone(),
            });
        }
        if !self.catalogs.contains(&header.arena) {
            return Err(ExclusionReason::MissingCatalog {
                arena: header.arena.clone(),
            });
        }
        self.roster
            .and_then(|roster| roster.match_side(header))
            .ok_or(ExclusionReason::MissingTrackedGroup)
    }
}
