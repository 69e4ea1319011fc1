//! Geometric validation: polygon validity, box extents, height ranges

use super::GeometryIssue;
use geo::{Area, LineString, Polygon};

pub struct GeometricValidator;

impl GeometricValidator {
    /// Validate a polygon footprint represented as a list of [x, y] vertices
    ///
    /// Either winding is accepted. A closing vertex equal to the first one is
    /// ignored.
    pub fn validate_polygon(vertices: &[[f64; 2]]) -> Vec<GeometryIssue> {
        let mut errors = Vec::new();
        let coords = Self::open_ring(vertices);

        if coords.len() < 3 {
            errors.push(GeometryIssue::InsufficientVertices {
                count: coords.len(),
                minimum: 3,
            });
            return errors; // Can't do further checks
        }

        if coords.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            errors.push(GeometryIssue::NonFinite);
            return errors;
        }

        if Self::is_self_intersecting(&coords) {
            errors.push(GeometryIssue::SelfIntersecting {
                description: "Polygon edges cross each other".into(),
            });
        }

        if Self::to_geo_polygon(vertices).unsigned_area() <= f64::EPSILON {
            errors.push(GeometryIssue::ZeroArea);
        }

        errors
    }

    /// Validate an axis-aligned box given as 2D or 3D corners
    pub fn validate_box(min: &[f64], max: &[f64]) -> Vec<GeometryIssue> {
        let mut errors = Vec::new();

        let dims_ok = |len: usize| len == 2 || len == 3;
        if min.len() != max.len() || !dims_ok(min.len()) {
            errors.push(GeometryIssue::MismatchedDimensions {
                min_len: min.len(),
                max_len: max.len(),
            });
            return errors;
        }

        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            errors.push(GeometryIssue::NonFinite);
            return errors;
        }

        for (axis, (lo, hi)) in ['x', 'y', 'z'].into_iter().zip(min.iter().zip(max.iter())) {
            if lo >= hi {
                errors.push(GeometryIssue::EmptyExtent {
                    axis,
                    min: *lo,
                    max: *hi,
                });
            }
        }

        errors
    }

    /// Validate an optional polygon height range
    pub fn validate_height(range: [f64; 2]) -> Vec<GeometryIssue> {
        let [lo, hi] = range;
        if !lo.is_finite() || !hi.is_finite() {
            return vec![GeometryIssue::NonFinite];
        }
        if lo >= hi {
            return vec![GeometryIssue::EmptyExtent { axis: 'z', min: lo, max: hi }];
        }
        Vec::new()
    }

    /// Drop a repeated closing vertex so edge checks see each edge once
    fn open_ring(vertices: &[[f64; 2]]) -> Vec<(f64, f64)> {
        let mut coords: Vec<(f64, f64)> = vertices.iter().map(|[x, y]| (*x, *y)).collect();
        if coords.len() > 1 && coords.first() == coords.last() {
            coords.pop();
        }
        coords
    }

    /// Check if polygon edges intersect each other (excluding adjacent edges)
    fn is_self_intersecting(coords: &[(f64, f64)]) -> bool {
        let n = coords.len();
        if n < 4 {
            return false; // Triangle can't self-intersect
        }

        for i in 0..n {
            let a1 = coords[i];
            let a2 = coords[(i + 1) % n];

            for j in (i + 2)..n {
                // Skip adjacent edges
                if j == (i + n - 1) % n {
                    continue;
                }

                let b1 = coords[j];
                let b2 = coords[(j + 1) % n];

                if Self::segments_intersect(a1, a2, b1, b2) {
                    return true;
                }
            }
        }
        false
    }

    /// Check if two line segments intersect (proper intersection, not touching)
    fn segments_intersect(a1: (f64, f64), a2: (f64, f64), b1: (f64, f64), b2: (f64, f64)) -> bool {
        let d1 = Self::cross_product_sign(b1, b2, a1);
        let d2 = Self::cross_product_sign(b1, b2, a2);
        let d3 = Self::cross_product_sign(a1, a2, b1);
        let d4 = Self::cross_product_sign(a1, a2, b2);

        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }

    fn cross_product_sign(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }

    pub(crate) fn to_geo_polygon(vertices: &[[f64; 2]]) -> Polygon<f64> {
        let coords: Vec<(f64, f64)> = vertices.iter().map(|[x, y]| (*x, *y)).collect();
        // LineString -> Polygon closes the ring
        Polygon::new(LineString::from(coords), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rectangle_passes_either_winding() {
        let ccw = [[0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [0.0, 2.0]];
        let cw = [[0.0, 0.0], [0.0, 2.0], [3.0, 2.0], [3.0, 0.0]];
        assert!(GeometricValidator::validate_polygon(&ccw).is_empty());
        assert!(GeometricValidator::validate_polygon(&cw).is_empty());
    }

    #[test]
    fn test_closed_ring_is_accepted() {
        let closed = [[0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
        assert!(GeometricValidator::validate_polygon(&closed).is_empty());
    }

    #[test]
    fn test_bowtie_is_self_intersecting() {
        let bowtie = [[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0]];
        let errors = GeometricValidator::validate_polygon(&bowtie);
        assert!(errors
            .iter()
            .any(|e| matches!(e, GeometryIssue::SelfIntersecting { .. })));
    }

    #[test]
    fn test_collinear_polygon_has_zero_area() {
        let line = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let errors = GeometricValidator::validate_polygon(&line);
        assert!(errors.contains(&GeometryIssue::ZeroArea));
    }

    #[test]
    fn test_two_vertices_rejected() {
        let errors = GeometricValidator::validate_polygon(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            errors[0],
            GeometryIssue::InsufficientVertices { count: 2, minimum: 3 }
        ));
    }

    #[test]
    fn test_box_checks() {
        assert!(GeometricValidator::validate_box(&[0.0, 0.0], &[1.0, 1.0]).is_empty());
        assert!(GeometricValidator::validate_box(&[0.0, 0.0, 0.0], &[1.0, 1.0, 2.0]).is_empty());

        let flat = GeometricValidator::validate_box(&[0.0, 0.0, 5.0], &[1.0, 1.0, 5.0]);
        assert!(matches!(flat[0], GeometryIssue::EmptyExtent { axis: 'z', .. }));

        let mixed = GeometricValidator::validate_box(&[0.0, 0.0], &[1.0, 1.0, 1.0]);
        assert!(matches!(mixed[0], GeometryIssue::MismatchedDimensions { .. }));

        let nan = GeometricValidator::validate_box(&[f64::NAN, 0.0], &[1.0, 1.0]);
        assert_eq!(nan, vec![GeometryIssue::NonFinite]);
    }

    #[test]
    fn test_height_range() {
        assert!(GeometricValidator::validate_height([0.0, 10.0]).is_empty());
        assert_eq!(GeometricValidator::validate_height([4.0, 4.0]).len(), 1);
    }
}
