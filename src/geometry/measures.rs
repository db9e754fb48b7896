//! Geometric measures on runtime-dimension point slices.
//!
//! Distances, centroids, simplex volumes and circumcenters. Every function
//! takes a slice of coordinate rows so it works for facets (`k < d` vertices
//! spanning a subspace) as well as full-dimensional simplices.

use nalgebra::{DMatrix, DVector};
use num_traits::cast;

use super::matrix::{MatrixError, dot, solve};

/// Squared Euclidean distance.
#[inline]
#[must_use]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance.
#[inline]
#[must_use]
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Vertex centroid of a point list. Returns an empty vector for an empty list.
#[must_use]
pub fn centroid<P: AsRef<[f64]>>(points: &[P]) -> Vec<f64> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut center = vec![0.0; first.as_ref().len()];
    for point in points {
        for (c, x) in center.iter_mut().zip(point.as_ref()) {
            *c += x;
        }
    }
    let count = usize_as_f64(points.len());
    for c in &mut center {
        *c /= count;
    }
    center
}

/// Converts a count to `f64`, saturating on the (unreachable) failure path.
#[inline]
#[must_use]
pub fn usize_as_f64(value: usize) -> f64 {
    cast(value).unwrap_or(f64::MAX)
}

fn factorial(k: usize) -> f64 {
    (1..=k).fold(1.0, |acc, i| acc * usize_as_f64(i))
}

/// `k`-volume of the simplex spanned by `k + 1` points in any ambient dimension.
///
/// Uses the Gram determinant `sqrt(det(E Eᵀ)) / k!` of the edge matrix, so it
/// yields triangle areas in 3-D and segment lengths in 2-D alike. Degenerate
/// simplices have volume 0.
///
/// # Examples
///
/// ```rust
/// use hullgraph::geometry::measures::simplex_volume;
///
/// let area = simplex_volume(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
/// assert!((area - 0.5).abs() < 1e-12);
/// ```
#[must_use]
pub fn simplex_volume<P: AsRef<[f64]>>(points: &[P]) -> f64 {
    let Some(origin) = points.first().map(AsRef::as_ref) else {
        return 0.0;
    };
    let k = points.len() - 1;
    if k == 0 {
        return 0.0;
    }
    let edges: Vec<Vec<f64>> = points[1..]
        .iter()
        .map(|p| p.as_ref().iter().zip(origin).map(|(a, b)| a - b).collect())
        .collect();
    let gram = DMatrix::from_fn(k, k, |i, j| dot(&edges[i], &edges[j]));
    let det = gram.determinant();
    if det <= 0.0 || !det.is_finite() {
        return 0.0;
    }
    det.sqrt() / factorial(k)
}

/// Circumcenter of `k + 1` affinely independent points in any ambient dimension.
///
/// The center is written as `p_0 + Σ λ_j e_j` with `e_j = p_j - p_0`, and the
/// equidistance conditions give the `k × k` system `2 (E Eᵀ) λ = (|e_i|²)`.
/// For a full-dimensional simplex this is the usual circumsphere center.
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] if the points are affinely dependent.
pub fn circumcenter<P: AsRef<[f64]>>(points: &[P]) -> Result<Vec<f64>, MatrixError> {
    let Some(origin) = points.first().map(AsRef::as_ref) else {
        return Err(MatrixError::SingularMatrix);
    };
    let k = points.len() - 1;
    if k == 0 {
        return Ok(origin.to_vec());
    }
    let edges: Vec<Vec<f64>> = points[1..]
        .iter()
        .map(|p| p.as_ref().iter().zip(origin).map(|(a, b)| a - b).collect())
        .collect();
    let gram = DMatrix::from_fn(k, k, |i, j| 2.0 * dot(&edges[i], &edges[j]));
    let rhs = DVector::from_fn(k, |i, _| dot(&edges[i], &edges[i]));
    let lambda = solve(gram, &rhs)?;

    let mut center = origin.to_vec();
    for (j, edge) in edges.iter().enumerate() {
        for (c, e) in center.iter_mut().zip(edge) {
            *c += lambda[j] * e;
        }
    }
    Ok(center)
}

/// Barycentric coordinates of `point` with respect to a full-dimensional simplex.
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] for a degenerate simplex.
pub fn barycentric_coordinates<P: AsRef<[f64]>>(
    simplex: &[P],
    point: &[f64],
) -> Result<Vec<f64>, MatrixError> {
    let Some(origin) = simplex.first().map(AsRef::as_ref) else {
        return Err(MatrixError::SingularMatrix);
    };
    let dim = origin.len();
    if simplex.len() != dim + 1 {
        return Err(MatrixError::SingularMatrix);
    }
    // Columns are the edge vectors; solve E λ = point - origin.
    let edges = DMatrix::from_fn(dim, dim, |i, j| simplex[j + 1].as_ref()[i] - origin[i]);
    let rhs = DVector::from_fn(dim, |i, _| point[i] - origin[i]);
    let lambda = solve(edges, &rhs)?;
    let mut coords = Vec::with_capacity(dim + 1);
    coords.push(1.0 - lambda.iter().sum::<f64>());
    coords.extend(lambda.iter());
    Ok(coords)
}

// =============================================================================
// TESTS
// =============================================================================
