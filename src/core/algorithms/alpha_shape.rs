//! Alpha-shape filtering of a simplex reference grid.
//!
//! The grid holds simplex references (row ids into a circumradius table).
//! Filtering keeps a reference when `alpha` exceeds the circumradius it points
//! at and empties the cell otherwise.

use serde::{Deserialize, Serialize};

use crate::core::algorithms::triangulation::ExtractionError;
use crate::geometry::point_set::InputValidationError;

/// A rectangular grid of optional simplex references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplexGrid {
    width: usize,
    cells: Vec<Option<usize>>,
}

impl SimplexGrid {
    /// Builds a grid from rows of 0-based references.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::RowLengthMismatch`] for ragged rows.
    pub fn from_rows(rows: &[Vec<Option<usize>>]) -> Result<Self, InputValidationError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(InputValidationError::RowLengthMismatch {
                    row,
                    actual: values.len(),
                    expected: width,
                });
            }
            cells.extend_from_slice(values);
        }
        Ok(Self { width, cells })
    }

    /// Builds a grid from 1-based references where 0 marks an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::NegativeGridReference`] for negative
    /// cells and [`InputValidationError::RowLengthMismatch`] for ragged rows.
    pub fn from_encoded(rows: &[Vec<i64>]) -> Result<Self, InputValidationError> {
        let decoded = rows
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(|(column, &value)| match usize::try_from(value) {
                        Ok(0) => Ok(None),
                        Ok(reference) => Ok(Some(reference - 1)),
                        Err(_) => Err(InputValidationError::NegativeGridReference {
                            row,
                            column,
                            value,
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(&decoded)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.width == 0 { 0 } else { self.cells.len() / self.width }
    }

    /// `true` if the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<usize>]> + '_ {
        self.cells.chunks_exact(self.width.max(1))
    }

    /// Cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Option<usize>] {
        &self.cells
    }
}

/// Filters `grid` against `radii` at threshold `alpha`.
///
/// A reference `r` survives iff `alpha > radii[r]`. Filtering a filtered grid
/// with the same inputs changes nothing.
///
/// # Errors
///
/// Returns [`ExtractionError::IndexBounds`] if a reference is past the end of
/// `radii`.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::algorithms::alpha_shape::{SimplexGrid, alpha_filter};
///
/// let grid = SimplexGrid::from_rows(&[vec![Some(0), Some(1)], vec![Some(1), None]]).unwrap();
/// let filtered = alpha_filter(&grid, &[0.5, 2.0], 1.0).unwrap();
/// assert_eq!(filtered.cells(), &[Some(0), None, None, None]);
/// ```
pub fn alpha_filter(
    grid: &SimplexGrid,
    radii: &[f64],
    alpha: f64,
) -> Result<SimplexGrid, ExtractionError> {
    let cells = grid
        .cells
        .iter()
        .map(|cell| {
            let Some(reference) = *cell else {
                return Ok(None);
            };
            let radius = radii.get(reference).ok_or(ExtractionError::IndexBounds {
                table: "circumradii",
                index: reference,
                len: radii.len(),
            })?;
            Ok((alpha > *radius).then_some(reference))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SimplexGrid {
        width: grid.width,
        cells,
    })
}
