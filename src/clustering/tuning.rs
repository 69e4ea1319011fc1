//! Parameter search for calibrating clustering

use serde::{Deserialize, Serialize};

use super::dbscan::cluster_count;
use super::hotspots::cluster_points;
use crate::core::config::ClusterParams;
use crate::core::types::Point2;

/// Number of evenly spaced ε values tried across the range
const EPS_STEPS: usize = 5;

/// Search space for [`tune_parameters`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningGrid {
    pub eps_range: (f64, f64),
    /// Inclusive
    pub min_pts_range: (usize, usize),
    pub target_clusters: usize,
    pub standardize: bool,
}

impl Default for TuningGrid {
    fn default() -> Self {
        Self {
            eps_range: (0.3, 1.0),
            min_pts_range: (2, 5),
            target_clusters: 5,
            standardize: true,
        }
    }
}

impl TuningGrid {
    fn eps_values(&self) -> Vec<f64> {
        let (lo, hi) = self.eps_range;
        let step = (hi - lo) / (EPS_STEPS - 1) as f64;
        (0..EPS_STEPS).map(|i| lo + step * i as f64).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningResult {
    pub params: ClusterParams,
    pub clusters: usize,
    pub noise: usize,
}

/// Try every (ε, min_pts) pair and keep the one whose cluster count is
/// nearest the target; the first best pair in search order wins
///
/// Returns `None` for an empty point set.
pub fn tune_parameters(points: &[Point2], grid: &TuningGrid) -> Option<TuningResult> {
    if points.is_empty() {
        return None;
    }

    let mut best: Option<(usize, TuningResult)> = None;
    for eps in grid.eps_values() {
        for min_pts in grid.min_pts_range.0..=grid.min_pts_range.1 {
            let params = ClusterParams {
                eps,
                min_pts,
                standardize: grid.standardize,
            };
            if params.validate().is_err() {
                continue;
            }
            let labels = cluster_points(points, params);
            let clusters = cluster_count(&labels);
            let score = clusters.abs_diff(grid.target_clusters);

            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((
                    score,
                    TuningResult {
                        params,
                        clusters,
                        noise: labels.iter().filter(|l| l.is_none()).count(),
                    },
                ));
            }
        }
    }

    best.map(|(_, result)| result)
}
