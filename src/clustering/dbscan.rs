//! Density-reachability clustering
//!
//! Points are visited in input order, neighbor lists come back sorted, and
//! clusters grow breadth-first, so labels depend only on the points and the
//! parameters.

use std::collections::VecDeque;

use super::index::RegionQuery;

/// DBSCAN over any [`RegionQuery`]; ε lives in the index
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    /// Neighbors (excluding the point itself) needed for a core point
    pub min_pts: usize,
}

impl Dbscan {
    pub fn new(min_pts: usize) -> Self {
        Self { min_pts }
    }

    /// Cluster label per point; `None` is noise
    pub fn run<Q: RegionQuery>(&self, index: &Q) -> Vec<Option<usize>> {
        let n = index.len();
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next_cluster = 0;

        for i in 0..n {
            if visited[i] {
                continue;
            }
            visited[i] = true;

            let neighbors = index.neighbors(i);
            if neighbors.len() < self.min_pts {
                continue; // Noise unless a later core point reaches it
            }

            let cluster = next_cluster;
            next_cluster += 1;
            labels[i] = Some(cluster);

            let mut queue: VecDeque<usize> = neighbors.into();
            while let Some(j) = queue.pop_front() {
                // Border points keep the first cluster that reaches them
                if labels[j].is_none() {
                    labels[j] = Some(cluster);
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;

                let expansion = index.neighbors(j);
                if expansion.len() >= self.min_pts {
                    queue.extend(expansion);
                }
            }
        }

        labels
    }
}

/// Number of distinct clusters in a label vector
pub fn cluster_count(labels: &[Option<usize>]) -> usize {
    labels.iter().flatten().max().map_or(0, |max| max + 1)
}
