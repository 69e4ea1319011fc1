//! Per-axis z-score standardization

use crate::core::types::Point2;

/// Below this a column is treated as constant
const MIN_STD: f64 = 1e-12;

/// Column means and population standard deviations
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardizer {
    /// Fit to `rows`; the first row fixes the dimension
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let dims = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut mean = vec![0.0; dims];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; dims];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m) * (v - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                // Constant columns stay unscaled
                if std < MIN_STD {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn fit_points(points: &[Point2]) -> Self {
        let rows: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x, p.y]).collect();
        Self::fit(&rows)
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn transform_point(&self, point: Point2) -> Point2 {
        match self.transform_row(&[point.x, point.y]).as_slice() {
            [x, y] => Point2::new(*x, *y),
            _ => point,
        }
    }
}
