//! Orientation predicates and signed distances.
//!
//! Floating-point predicates with a scale-relative degeneracy band. They are
//! used to assign facet orientation flags in the hull engine and to check the
//! counter-clockwise contract of extracted simplices.

use super::matrix::{determinant_with_singularity, dot};
use nalgebra::DMatrix;

/// Represents the orientation of a simplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The simplex has negative orientation (determinant < 0)
    NEGATIVE,
    /// The simplex is degenerate (determinant ≈ 0)
    DEGENERATE,
    /// The simplex has positive orientation (determinant > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

fn classify(matrix: &DMatrix<f64>) -> Orientation {
    let (det, singular) = determinant_with_singularity(matrix);
    if singular {
        Orientation::DEGENERATE
    } else if det > 0.0 {
        Orientation::POSITIVE
    } else {
        Orientation::NEGATIVE
    }
}

/// Orientation of a full-dimensional simplex given as `d + 1` points in `d` dimensions.
///
/// Sign of `det[p_1 - p_0; ...; p_d - p_0]`. For `d = 2` a counter-clockwise
/// triangle is [`Orientation::POSITIVE`].
///
/// # Examples
///
/// ```rust
/// use hullgraph::geometry::predicates::{Orientation, simplex_orientation};
///
/// let ccw = simplex_orientation(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
/// assert_eq!(ccw, Orientation::POSITIVE);
/// ```
#[must_use]
pub fn simplex_orientation<P: AsRef<[f64]>>(points: &[P]) -> Orientation {
    let Some(origin) = points.first().map(AsRef::as_ref) else {
        return Orientation::DEGENERATE;
    };
    let dim = origin.len();
    if points.len() != dim + 1 {
        return Orientation::DEGENERATE;
    }
    let matrix = DMatrix::from_fn(dim, dim, |i, j| points[i + 1].as_ref()[j] - origin[j]);
    classify(&matrix)
}

/// Orientation of a hull facet's vertex order relative to its outward normal.
///
/// Sign of `det[n; v_1 - v_0; ...; v_{d-1} - v_0]` for `d` vertices in `d`
/// dimensions. Positive means the vertex order is counter-clockwise when seen
/// from outside the hull.
#[must_use]
pub fn facet_orientation<P: AsRef<[f64]>>(vertices: &[P], outward_normal: &[f64]) -> Orientation {
    let dim = outward_normal.len();
    if vertices.len() != dim || dim == 0 {
        return Orientation::DEGENERATE;
    }
    let origin = vertices[0].as_ref();
    let matrix = DMatrix::from_fn(dim, dim, |i, j| {
        if i == 0 {
            outward_normal[j]
        } else {
            vertices[i].as_ref()[j] - origin[j]
        }
    });
    classify(&matrix)
}

/// Signed distance of `point` from the hyperplane `normal · x + offset = 0`.
///
/// Positive values lie on the side the normal points to.
#[inline]
#[must_use]
pub fn signed_distance(point: &[f64], normal: &[f64], offset: f64) -> f64 {
    dot(point, normal) + offset
}

// =============================================================================
// TESTS
// =============================================================================
