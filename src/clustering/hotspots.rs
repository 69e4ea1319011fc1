//! Utility landing-point hotspots

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::dbscan::{cluster_count, Dbscan};
use super::index::{GridIndex, LinearIndex};
use super::scaling::Standardizer;
use crate::core::config::ClusterParams;
use crate::core::records::UtilityCategory;
use crate::core::types::Point2;

/// One ranked cluster of landing points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub category: UtilityCategory,
    /// 1-based, densest first
    pub rank: usize,
    /// Mean landing point in arena coordinates
    pub centroid: Point2,
    pub member_count: usize,
    /// Rows of the consolidated utility table, ascending
    pub members: Vec<usize>,
}

/// Clustering result for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHotspots {
    pub category: UtilityCategory,
    pub params: ClusterParams,
    /// Landing points that entered clustering
    pub points: usize,
    /// Rows dropped for non-finite coordinates
    pub skipped: usize,
    pub clusters_found: usize,
    pub noise: usize,
    /// Top clusters after ranking
    pub hotspots: Vec<Hotspot>,
}

/// DBSCAN over 2D points, standardized first when the params ask for it
pub fn cluster_points(points: &[Point2], params: ClusterParams) -> Vec<Option<usize>> {
    let working = if params.standardize {
        let scaler = Standardizer::fit_points(points);
        points.iter().map(|p| scaler.transform_point(*p)).collect()
    } else {
        points.to_vec()
    };
    Dbscan::new(params.min_pts).run(&GridIndex::new(working, params.eps))
}

/// DBSCAN over n-dimensional feature rows
pub fn cluster_rows(rows: &[Vec<f64>], params: ClusterParams) -> Vec<Option<usize>> {
    let working = if params.standardize {
        Standardizer::fit(rows).transform(rows)
    } else {
        rows.to_vec()
    };
    Dbscan::new(params.min_pts).run(&LinearIndex::new(working, params.eps))
}

/// Cluster one category's landing points and rank the result
///
/// `rows` pairs each point with its row in the consolidated utility table.
pub fn find_hotspots(
    category: UtilityCategory,
    rows: &[(usize, Point2)],
    params: ClusterParams,
    top_n: usize,
) -> CategoryHotspots {
    let finite: Vec<(usize, Point2)> = rows
        .iter()
        .copied()
        .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
        .collect();
    let points: Vec<Point2> = finite.iter().map(|(_, p)| *p).collect();
    let labels = cluster_points(&points, params);

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        if let Some(cluster) = label {
            groups.entry(*cluster).or_default().push(i);
        }
    }

    let mut hotspots: Vec<Hotspot> = groups
        .into_values()
        .map(|indices| {
            let sum = indices
                .iter()
                .fold(Point2::default(), |acc, &i| acc + points[i]);
            let mut members: Vec<usize> = indices.iter().map(|&i| finite[i].0).collect();
            members.sort_unstable();
            Hotspot {
                category,
                rank: 0,
                centroid: sum * (1.0 / indices.len() as f64),
                member_count: indices.len(),
                members,
            }
        })
        .collect();

    hotspots.sort_by_key(|h| {
        (
            Reverse(h.member_count),
            OrderedFloat(h.centroid.length()),
            h.members.first().copied(),
        )
    });
    hotspots.truncate(top_n);
    for (i, hotspot) in hotspots.iter_mut().enumerate() {
        hotspot.rank = i + 1;
    }

    CategoryHotspots {
        category,
        params,
        points: points.len(),
        skipped: rows.len() - finite.len(),
        clusters_found: cluster_count(&labels),
        noise: labels.iter().filter(|l| l.is_none()).count(),
        hotspots,
    }
}
