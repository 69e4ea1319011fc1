//! Named arena zones
//!
//! `ZoneDef` is the shape written in catalog files; `Zone` is the validated,
//! immutable runtime form with its footprint area and bounding rectangle
//! precomputed for classification.

use geo::{Area, BoundingRect, Coord, Intersects, Polygon, Rect};
use serde::{Deserialize, Serialize};

use super::validation::{GeometricValidator, GeometryIssue};
use crate::core::types::{Point3, Role};

/// Territory attribute used by push detection
///
/// Tags are written from the defending role's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritoryTag {
    Defended,
    Contested,
    Opponent,
}

impl TerritoryTag {
    /// The tag as seen by an actor holding `role`
    pub fn relative_to(&self, role: Role) -> TerritoryTag {
        match (role, self) {
            (Role::Defending, tag) => *tag,
            (Role::Attacking, TerritoryTag::Defended) => TerritoryTag::Opponent,
            (Role::Attacking, TerritoryTag::Opponent) => TerritoryTag::Defended,
            (Role::Attacking, TerritoryTag::Contested) => TerritoryTag::Contested,
        }
    }

    /// Contested or opponent-held ground
    pub fn is_forward(&self) -> bool {
        matches!(self, TerritoryTag::Contested | TerritoryTag::Opponent)
    }
}

/// Zone geometry as written in a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDef {
    /// Axis-aligned box; two coordinates per corner leave height unbounded
    Box { min: Vec<f64>, max: Vec<f64> },
    /// Footprint polygon with an optional [z_min, z_max] height range
    Polygon {
        vertices: Vec<[f64; 2]>,
        #[serde(default)]
        height: Option<[f64; 2]>,
    },
}

/// One zone entry of a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub name: String,
    pub shape: ShapeDef,
    #[serde(default)]
    pub role_affinity: Option<Role>,
    #[serde(default)]
    pub territory: Option<TerritoryTag>,
    /// Checked for stacking at freeze-end
    #[serde(default)]
    pub stronghold: bool,
}

#[derive(Debug, Clone)]
enum ZoneShape {
    Box { min: Point3, max: Point3 },
    Polygon { polygon: Polygon<f64>, z_range: Option<(f64, f64)> },
}

/// Validated zone
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    pub role_affinity: Option<Role>,
    pub territory: Option<TerritoryTag>,
    pub stronghold: bool,
    shape: ZoneShape,
    area: f64,
    bounds: Rect<f64>,
}

impl Zone {
    /// Validate a definition; degenerate geometry is reported, never repaired
    pub fn from_def(def: ZoneDef) -> Result<Self, Vec<GeometryIssue>> {
        let (shape, area, bounds) = match def.shape {
            ShapeDef::Box { min, max } => {
                let issues = GeometricValidator::validate_box(&min, &max);
                if !issues.is_empty() {
                    return Err(issues);
                }
                let (z_min, z_max) = if min.len() == 3 {
                    (min[2], max[2])
                } else {
                    (f64::NEG_INFINITY, f64::INFINITY)
                };
                let lo = Point3::new(min[0], min[1], z_min);
                let hi = Point3::new(max[0], max[1], z_max);
                let area = (hi.x - lo.x) * (hi.y - lo.y);
                let bounds = Rect::new(Coord { x: lo.x, y: lo.y }, Coord { x: hi.x, y: hi.y });
                (ZoneShape::Box { min: lo, max: hi }, area, bounds)
            }
            ShapeDef::Polygon { vertices, height } => {
                let mut issues = GeometricValidator::validate_polygon(&vertices);
                if let Some(range) = height {
                    issues.extend(GeometricValidator::validate_height(range));
                }
                if !issues.is_empty() {
                    return Err(issues);
                }
                let polygon = GeometricValidator::to_geo_polygon(&vertices);
                let bounds = polygon.bounding_rect().ok_or(vec![GeometryIssue::ZeroArea])?;
                let area = polygon.unsigned_area();
                let z_range = height.map(|[lo, hi]| (lo, hi));
                (ZoneShape::Polygon { polygon, z_range }, area, bounds)
            }
        };

        Ok(Self {
            name: def.name,
            role_affinity: def.role_affinity,
            territory: def.territory,
            stronghold: def.stronghold,
            shape,
            area,
            bounds,
        })
    }

    /// Footprint area on the ground plane
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Boundary-inclusive containment test
    pub fn contains(&self, point: Point3) -> bool {
        let (lo, hi) = (self.bounds.min(), self.bounds.max());
        if point.x < lo.x || point.x > hi.x || point.y < lo.y || point.y > hi.y {
            return false;
        }

        match &self.shape {
            ZoneShape::Box { min, max } => point.z >= min.z && point.z <= max.z,
            ZoneShape::Polygon { polygon, z_range } => {
                if let Some((z_lo, z_hi)) = z_range {
                    if point.z < *z_lo || point.z > *z_hi {
                        return false;
                    }
                }
                polygon.intersects(&Coord { x: point.x, y: point.y })
            }
        }
    }
}
