//! Data-quality counters
//!
//! Gaps counted here are not errors: the affected sample or round is left out
//! of the derived computation it cannot support, and the count is surfaced in
//! the consolidated output's metadata.

use serde::{Deserialize, Serialize};

/// Per-session data-quality record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Position samples that reached the classifier
    pub position_samples: usize,
    /// Position samples that fell outside every zone
    pub unclassified_samples: usize,
    /// Samples, utility and kill rows whose timestamp was clipped to the round window
    pub boundary_clipped: usize,
    /// Rows referencing a round absent from the round table
    pub orphan_rows: usize,
    /// Rounds where a whole role-group has no samples
    pub incomplete_rounds: Vec<u32>,
    /// Rounds where the tracked group's role could not be determined
    pub unresolved_role_rounds: Vec<u32>,
}

impl DataQuality {
    pub fn unclassified_rate(&self) -> f64 {
        if self.position_samples == 0 {
            0.0
        } else {
            self.unclassified_samples as f64 / self.position_samples as f64
        }
    }

    pub fn has_gaps(&self) -> bool {
        self.unclassified_samples > 0
            || self.boundary_clipped > 0
            || self.orphan_rows > 0
            || !self.incomplete_rounds.is_empty()
            || !self.unresolved_role_rounds.is_empty()
    }
}

/// Run-wide sums over every included session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityTotals {
    pub position_samples: usize,
    pub unclassified_samples: usize,
    pub unclassified_rate: f64,
    pub boundary_clipped: usize,
    pub orphan_rows: usize,
    pub incomplete_rounds: usize,
    pub unresolved_role_rounds: usize,
    /// Rows naming a session that has no header at all
    pub unattributed_rows: usize,
}

impl QualityTotals {
    pub fn absorb(&mut self, quality: &DataQuality) {
        self.position_samples += quality.position_samples;
        self.unclassified_samples += quality.unclassified_samples;
        self.boundary_clipped += quality.boundary_clipped;
        self.orphan_rows += quality.orphan_rows;
        self.incomplete_rounds += quality.incomplete_rounds.len();
        self.unresolved_role_rounds += quality.unresolved_role_rounds.len();
        self.unclassified_rate = if self.position_samples == 0 {
            0.0
        } else {
            self.unclassified_samples as f64 / self.position_samples as f64
        };
    }
}
