//! Geometry validation for catalog zones

mod geometric;

pub use geometric::GeometricValidator;

use thiserror::Error;

/// Geometry problems that make a zone unusable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryIssue {
    #[error("polygon has {count} vertices, at least {minimum} required")]
    InsufficientVertices { count: usize, minimum: usize },

    #[error("{description}")]
    SelfIntersecting { description: String },

    #[error("footprint area is zero")]
    ZeroArea,

    #[error("coordinate is not a finite number")]
    NonFinite,

    #[error("box corners have {min_len} and {max_len} coordinates, expected 2 or 3 for both")]
    MismatchedDimensions { min_len: usize, max_len: usize },

    #[error("extent along {axis} is empty ({min} .. {max})")]
    EmptyExtent { axis: char, min: f64, max: f64 },
}
