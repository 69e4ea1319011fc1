//! Neighborhood queries for density clustering

use crate::core::types::Point2;
use crate::spatial::sparse_hash::SparseHashGrid;

/// ε-neighborhood lookup over a fixed point set
pub trait RegionQuery {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices within ε of point `i` (inclusive), excluding `i`, ascending
    fn neighbors(&self, i: usize) -> Vec<usize>;
}

/// Hash-grid index for 2D points with cell size ε
pub struct GridIndex {
    points: Vec<Point2>,
    eps: f64,
    grid: SparseHashGrid,
}

impl GridIndex {
    pub fn new(points: Vec<Point2>, eps: f64) -> Self {
        let grid = SparseHashGrid::from_points(eps, &points);
        Self { points, eps, grid }
    }
}

impl RegionQuery for GridIndex {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn neighbors(&self, i: usize) -> Vec<usize> {
        let mut found = self.grid.query_radius(self.points[i], self.eps, &self.points);
        found.retain(|&j| j != i);
        found
    }
}

/// Linear scan over n-dimensional rows
pub struct LinearIndex {
    rows: Vec<Vec<f64>>,
    eps: f64,
}

impl LinearIndex {
    pub fn new(rows: Vec<Vec<f64>>, eps: f64) -> Self {
        Self { rows, eps }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl RegionQuery for LinearIndex {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn neighbors(&self, i: usize) -> Vec<usize> {
        let center = &self.rows[i];
        self.rows
            .iter()
            .enumerate()
            .filter(|(j, row)| *j != i && euclidean(center, row) <= self.eps)
            .map(|(j, _)| j)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_and_linear_agree() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.25, 0.25),
            Point2::new(1.0, 1.0),
            Point2::new(-0.5, 0.0),
            Point2::new(3.0, 3.0),
        ];
        let rows: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x, p.y]).collect();
        let grid = GridIndex::new(points, 0.5);
        let linear = LinearIndex::new(rows, 0.5);

        for i in 0..grid.len() {
            assert_eq!(grid.neighbors(i), linear.neighbors(i), "point {}", i);
        }
        assert_eq!(grid.neighbors(0), vec![1, 3]); // Exactly 0.5 away counts
    }
}
