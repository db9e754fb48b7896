//! Row-major point storage shared by every operation.
//!
//! A [`PointSet`] holds `n` points of dimension `d` in a single row-major
//! buffer. The row index of a point is its universal identifier: simplex
//! tables, neighbor tables and Voronoi regions all refer to points by it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while validating raw input before any engine runs.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InputValidationError {
    /// The point dimension is zero or unsupported.
    #[error("Invalid dimension {dimension}: {reason}")]
    InvalidDimension {
        /// The rejected dimension.
        dimension: usize,
        /// Why the dimension was rejected.
        reason: &'static str,
    },
    /// The coordinate buffer is empty.
    #[error("Point set is empty")]
    EmptyPointSet,
    /// The coordinate buffer does not split into whole rows.
    #[error("Coordinate buffer of length {len} is not a multiple of dimension {dimension}")]
    RaggedCoordinates {
        /// Length of the coordinate buffer.
        len: usize,
        /// Expected row width.
        dimension: usize,
    },
    /// Rows of a nested input have different lengths.
    #[error("Row {row} has {actual} coordinates, expected {expected}")]
    RowLengthMismatch {
        /// Offending row.
        row: usize,
        /// Coordinates found in that row.
        actual: usize,
        /// Coordinates found in the first row.
        expected: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("Coordinate {coordinate} of point {point} is not finite ({value})")]
    NonFiniteCoordinate {
        /// Point id.
        point: usize,
        /// Coordinate index within the point.
        coordinate: usize,
        /// The offending value.
        value: f64,
    },
    /// Not enough points to span a full-dimensional hull.
    #[error("Number of points ({points}) is not greater than the number of dimensions ({dimension})")]
    InsufficientPoints {
        /// Number of points supplied.
        points: usize,
        /// Point dimension.
        dimension: usize,
    },
    /// The engine option string exceeds the supported length.
    #[error("Option string too long ({len} > {max} characters)")]
    OptionsTooLong {
        /// Supplied length.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
    /// Query points do not match the dimension of the hull they are tested against.
    #[error("Query points have dimension {actual}, hull was built in dimension {expected}")]
    QueryDimensionMismatch {
        /// Dimension of the queries.
        actual: usize,
        /// Dimension of the hull's input points.
        expected: usize,
    },
    /// A boundary-encoded grid holds a negative simplex reference.
    #[error("Grid row {row} column {column} holds negative simplex reference {value}")]
    NegativeGridReference {
        /// Row of the grid.
        row: usize,
        /// Column of the grid.
        column: usize,
        /// The rejected value.
        value: i64,
    },
}

// =============================================================================
// POINT SET
// =============================================================================

/// `n` points of dimension `d`, stored row-major.
///
/// # Examples
///
/// ```rust
/// use hullgraph::geometry::point_set::PointSet;
///
/// let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!(points.dim(), 2);
/// assert_eq!(points.point(1), &[1.0, 0.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    dim: usize,
    coords: Vec<f64>,
}

impl PointSet {
    /// Builds a point set from a row-major coordinate buffer.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError`] if `dim` is zero, the buffer is empty or
    /// ragged, or any coordinate is not finite.
    pub fn new(dim: usize, coords: Vec<f64>) -> Result<Self, InputValidationError> {
        if dim == 0 {
            return Err(InputValidationError::InvalidDimension {
                dimension: dim,
                reason: "points must have at least one coordinate",
            });
        }
        if coords.is_empty() {
            return Err(InputValidationError::EmptyPointSet);
        }
        if coords.len() % dim != 0 {
            return Err(InputValidationError::RaggedCoordinates {
                len: coords.len(),
                dimension: dim,
            });
        }
        if let Some((index, &value)) = coords.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(InputValidationError::NonFiniteCoordinate {
                point: index / dim,
                coordinate: index % dim,
                value,
            });
        }
        Ok(Self { dim, coords })
    }

    /// Builds a point set from fixed-size rows.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PointSet::new`].
    pub fn from_rows<const D: usize>(rows: &[[f64; D]]) -> Result<Self, InputValidationError> {
        Self::new(D, rows.iter().flatten().copied().collect())
    }

    /// Builds a point set from nested rows of runtime length.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::RowLengthMismatch`] for ragged rows, plus
    /// the conditions of [`PointSet::new`].
    pub fn from_nested(rows: &[Vec<f64>]) -> Result<Self, InputValidationError> {
        let Some(first) = rows.first() else {
            return Err(InputValidationError::EmptyPointSet);
        };
        let dim = first.len();
        let mut coords = Vec::with_capacity(dim * rows.len());
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(InputValidationError::RowLengthMismatch {
                    row,
                    actual: values.len(),
                    expected: dim,
                });
            }
            coords.extend_from_slice(values);
        }
        Self::new(dim, coords)
    }

    /// An empty set of the given dimension, used for empty degenerate outputs.
    #[must_use]
    pub const fn empty(dim: usize) -> Self {
        Self {
            dim,
            coords: Vec::new(),
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.coords.len() / self.dim
        }
    }

    /// Returns `true` if the set holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Point dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[must_use]
    pub fn point(&self, id: usize) -> &[f64] {
        &self.coords[id * self.dim..(id + 1) * self.dim]
    }

    /// Coordinates of point `id`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&[f64]> {
        let start = id.checked_mul(self.dim)?;
        self.coords.get(start..start + self.dim)
    }

    /// Iterator over all points in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.coords.chunks_exact(self.dim.max(1))
    }

    /// Appends a point. The caller guarantees `coords.len() == self.dim()`.
    pub(crate) fn push(&mut self, coords: &[f64]) {
        debug_assert_eq!(coords.len(), self.dim);
        self.coords.extend_from_slice(coords);
    }

    /// The raw row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.coords
    }

    /// Largest absolute coordinate over the whole set.
    #[must_use]
    pub fn max_abs_coordinate(&self) -> f64 {
        self.coords.iter().fold(0.0_f64, |acc, c| acc.max(c.abs()))
    }

    /// Largest L1 norm of any point.
    #[must_use]
    pub fn max_abs_sum(&self) -> f64 {
        self.iter()
            .map(|p| p.iter().map(|c| c.abs()).sum::<f64>())
            .fold(0.0_f64, f64::max)
    }

    /// Checks that this set can feed a full-dimensional hull (`n > d`).
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::InsufficientPoints`] when `n <= d`.
    pub fn require_full_dimensional(&self) -> Result<(), InputValidationError> {
        if self.len() <= self.dim {
            return Err(InputValidationError::InsufficientPoints {
                points: self.len(),
                dimension: self.dim,
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
