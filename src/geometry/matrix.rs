//! Matrix operations.
//!
//! This module provides the small dense linear algebra helpers used by the
//! predicates, the measures and the hull engine. Sizes are only known at
//! runtime (`d` or `d + 1`), so everything is built on [`nalgebra::DMatrix`].

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Error type for matrix operations.
///
/// # Examples
///
/// ```rust
/// use hullgraph::geometry::matrix::MatrixError;
///
/// let err = MatrixError::SingularMatrix;
/// assert!(matches!(err, MatrixError::SingularMatrix));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// Matrix is singular.
    #[error("Matrix is singular!")]
    SingularMatrix,
    /// Rows handed to a matrix builder have inconsistent lengths.
    #[error("Expected {expected} columns, row {row} has {actual}")]
    ShapeMismatch {
        /// Offending row.
        row: usize,
        /// Its length.
        actual: usize,
        /// Expected length.
        expected: usize,
    },
}

/// Default tolerance for matrix singularity checks.
///
/// Applied relative to the Hadamard bound of the matrix, so it is scale free.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Builds a dense matrix from equally sized rows.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] if a row differs in length from the first.
pub fn matrix_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<DMatrix<f64>, MatrixError> {
    let cols = rows.first().map_or(0, |r| r.as_ref().len());
    for (row, values) in rows.iter().enumerate() {
        let actual = values.as_ref().len();
        if actual != cols {
            return Err(MatrixError::ShapeMismatch {
                row,
                actual,
                expected: cols,
            });
        }
    }
    Ok(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i].as_ref()[j]))
}

/// Product of the Euclidean row norms, an upper bound on `|det|`.
#[must_use]
pub fn hadamard_bound(matrix: &DMatrix<f64>) -> f64 {
    matrix.row_iter().map(|row| row.norm()).product()
}

/// Determinant of a square matrix together with whether it is numerically zero.
///
/// Returns `(det, is_singular)`. A determinant is treated as singular when it
/// is below [`SINGULARITY_TOLERANCE`] times the Hadamard bound.
#[must_use]
pub fn determinant_with_singularity(matrix: &DMatrix<f64>) -> (f64, bool) {
    let det = matrix.determinant();
    let bound = hadamard_bound(matrix);
    let singular = !det.is_finite() || bound == 0.0 || det.abs() <= SINGULARITY_TOLERANCE * bound;
    (det, singular)
}

/// Solves `a * x = b` with an LU decomposition.
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] if `a` is numerically singular.
pub fn solve(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, MatrixError> {
    let (_, singular) = determinant_with_singularity(&a);
    if singular {
        return Err(MatrixError::SingularMatrix);
    }
    let solution = a.lu().solve(b).ok_or(MatrixError::SingularMatrix)?;
    if solution.iter().all(|v| v.is_finite()) {
        Ok(solution)
    } else {
        Err(MatrixError::SingularMatrix)
    }
}

/// Unit normal of the hyperplane spanned by `D` points in `D` dimensions.
///
/// The normal is the generalized cross product of the edge vectors
/// `v_i - v_0`, so `det[n; v_1 - v_0; ...; v_{D-1} - v_0]` is positive for the
/// returned vector. Returns `None` when the points are affinely dependent.
#[must_use]
pub fn hyperplane_normal<P: AsRef<[f64]>>(vertices: &[P]) -> Option<Vec<f64>> {
    let dim = vertices.first()?.as_ref().len();
    if vertices.len() != dim || dim == 0 {
        return None;
    }
    if dim == 1 {
        return Some(vec![1.0]);
    }
    let origin = vertices[0].as_ref();
    let edges = DMatrix::from_fn(dim - 1, dim, |i, j| {
        vertices[i + 1].as_ref()[j] - origin[j]
    });
    let scale: f64 = edges.row_iter().map(|row| row.norm()).product();
    if scale == 0.0 {
        return None;
    }

    let mut normal = vec![0.0; dim];
    for (k, component) in normal.iter_mut().enumerate() {
        let minor = edges.clone().remove_column(k);
        let cofactor = minor.determinant();
        *component = if k % 2 == 0 { cofactor } else { -cofactor };
    }
    let norm = normal.iter().map(|c| c * c).sum::<f64>().sqrt();
    if !norm.is_finite() || norm <= SINGULARITY_TOLERANCE * scale {
        return None;
    }
    for component in &mut normal {
        *component /= norm;
    }
    Some(normal)
}

/// Dot product of two equally long slices.
#[inline]
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_from_rows_shape_mismatch() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert_eq!(
            matrix_from_rows(&rows),
            Err(MatrixError::ShapeMismatch {
                row: 1,
                actual: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn test_determinant_with_singularity() {
        let m = matrix_from_rows(&[[2.0, 0.0], [0.0, 3.0]]).unwrap();
        let (det, singular) = determinant_with_singularity(&m);
        assert_relative_eq!(det, 6.0);
        assert!(!singular);

        let flat = matrix_from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
        assert!(determinant_with_singularity(&flat).1);
    }

    #[test]
    fn test_solve() {
        let a = matrix_from_rows(&[[2.0, 1.0], [1.0, 3.0]]).unwrap();
        let b = DVector::from_vec(vec![3.0, 5.0]);
        let x = solve(a, &b).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);

        let singular = matrix_from_rows(&[[1.0, 1.0], [1.0, 1.0]]).unwrap();
        assert_eq!(solve(singular, &b), Err(MatrixError::SingularMatrix));
    }

    #[test]
    fn test_hyperplane_normal_2d_and_3d() {
        // Edge from (0,0) to (1,0): det[n; e] > 0 gives n = (0, -1).
        let n = hyperplane_normal(&[[0.0, 0.0], [1.0, 0.0]]).unwrap();
        assert_relative_eq!(n[0], 0.0);
        assert_relative_eq!(n[1], -1.0);

        let n = hyperplane_normal(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        assert_relative_eq!(n[2].abs(), 1.0);
        let m = matrix_from_rows(&[n.clone(), vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        assert!(m.determinant() > 0.0);

        assert!(hyperplane_normal(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]).is_none());
        assert!(hyperplane_normal(&[[0.0, 0.0], [0.0, 0.0]]).is_none());
    }
}
