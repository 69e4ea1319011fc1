//! Generic grid for spatial data

use geo::Rect;

use crate::core::types::Point2;

/// Generic 2D grid with square cells
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    pub origin: Point2,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize, cell_size: f64, origin: Point2) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin,
            data: vec![T::default(); width * height],
        }
    }

    /// `cells` x `cells` grid covering `bounds`, sized by its longer side
    pub fn covering(bounds: Rect<f64>, cells: usize) -> Self {
        let cells = cells.max(1);
        let extent = bounds.width().max(bounds.height());
        let cell_size = if extent > 0.0 { extent / cells as f64 } else { 1.0 };
        let origin = Point2::new(bounds.min().x, bounds.min().y);
        Self::new(cells, cells, cell_size, origin)
    }

    #[inline]
    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            Some(&mut self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Convert world position to cell coordinates (clamped to the grid)
    #[inline]
    pub fn world_to_cell(&self, pos: Point2) -> (usize, usize) {
        let x = ((pos.x - self.origin.x) / self.cell_size).floor() as i64;
        let y = ((pos.y - self.origin.y) / self.cell_size).floor() as i64;
        (
            x.max(0).min(self.width as i64 - 1) as usize,
            y.max(0).min(self.height as i64 - 1) as usize,
        )
    }

    /// Row-major cell values
    pub fn cells(&self) -> &[T] {
        &self.data
    }
}

impl Grid<f64> {
    /// Add one observation to the cell holding `pos`
    pub fn accumulate(&mut self, pos: Point2) {
        let (x, y) = self.world_to_cell(pos);
        if let Some(cell) = self.get_mut(x, y) {
            *cell += 1.0;
        }
    }
}
