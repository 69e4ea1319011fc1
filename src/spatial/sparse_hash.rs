//! Sparse hash grid for radius queries over a fixed point set

use ahash::AHashMap;
use crate::core::types::Point2;

/// Sparse hash grid mapping cells to point indices
///
/// With the cell size equal to the query radius, every point within the
/// radius lies in the 3x3 cell neighborhood of the query cell.
pub struct SparseHashGrid {
    cell_size: f64,
    cells: AHashMap<(i64, i64), Vec<usize>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    /// Build a grid over `points`, indexed by slice position
    pub fn from_points(cell_size: f64, points: &[Point2]) -> Self {
        let mut grid = Self::new(cell_size);
        grid.rebuild(points.iter().copied().enumerate());
        grid
    }

    #[inline]
    fn cell_coord(&self, pos: Point2) -> (i64, i64) {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, index: usize, pos: Point2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push(index);
    }

    /// Query all indices in neighboring cells (3x3 neighborhood)
    pub fn query_neighbors(&self, pos: Point2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_coord(pos);

        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells.get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
                    .copied()
            })
        })
    }

    /// Indices within `radius` of `center`, ascending
    ///
    /// `positions` must be the slice the grid was built from.
    pub fn query_radius(&self, center: Point2, radius: f64, positions: &[Point2]) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .query_neighbors(center)
            .filter(|&idx| {
                positions
                    .get(idx)
                    .map(|pos| center.distance(pos) <= radius)
                    .unwrap_or(false)
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, points: impl Iterator<Item = (usize, Point2)>) {
        self.clear();
        for (index, pos) in points {
            self.insert(index, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_query_is_sorted_and_inclusive() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(-1.0, 0.0),
            Point2::new(5.0, 5.0),
        ];
        let grid = SparseHashGrid::from_points(1.0, &points);
        let found = grid.query_radius(Point2::new(0.0, 0.0), 1.0, &points);
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn test_negative_coordinates_share_cells_correctly() {
        let points = vec![Point2::new(-0.4, -0.4), Point2::new(0.4, 0.4)];
        let grid = SparseHashGrid::from_points(1.0, &points);
        let found = grid.query_radius(points[0], 1.2, &points);
        assert_eq!(found, vec![0, 1]);
    }
}
