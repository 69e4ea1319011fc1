//! Zone classification of a round's position samples

use std::collections::BTreeMap;

use crate::core::quality::DataQuality;
use crate::core::records::SideGroup;
use crate::core::types::ActorId;
use crate::spatial::{Zone, ZoneCatalog};
use crate::timeline::{RoundTimeline, TimelineEntry};

/// A position entry and the zone it fell in
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedSample<'a> {
    pub entry: &'a TimelineEntry,
    pub zone: Option<&'a Zone>,
}

/// Classified position samples of the tracked actors, in time order
#[derive(Debug, Default)]
pub struct ClassifiedRound<'a> {
    pub tracked: BTreeMap<&'a ActorId, Vec<ClassifiedSample<'a>>>,
}

/// Classify every position sample in the round once
///
/// All actors count toward the quality totals; only the tracked group's
/// samples are kept for detection.
pub fn classify_round<'a>(
    round: &'a RoundTimeline,
    catalog: &'a ZoneCatalog,
    tracked: &SideGroup,
    quality: &mut DataQuality,
) -> ClassifiedRound<'a> {
    let mut classified = ClassifiedRound::default();

    for (actor, entries) in &round.actors {
        let keep = tracked.actors.contains(actor);
        for entry in entries.iter().filter(|e| e.phase().is_some()) {
            let zone = catalog.classify(entry.point);
            quality.position_samples += 1;
            if zone.is_none() {
                quality.unclassified_samples += 1;
            }
            if keep {
                classified
                    .tracked
                    .entry(actor)
                    .or_default()
                    .push(ClassifiedSample { entry, zone });
            }
        }
    }

    classified
}
