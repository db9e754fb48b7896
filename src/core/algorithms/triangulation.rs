//! Simplex table extraction.
//!
//! Walks a [`FacetGraph`] and emits one row of point ids per output facet:
//! every lower facet of a Delaunay lifting (width `d + 1`), or every hull
//! facet (width `max(d, largest facet)`, padded with `None`).
//!
//! Row order follows the engine's native vertex order, normalized by
//! [`normalize_orientation`], and a final swap of columns 0 and 1 brings every
//! row into counter-clockwise orientation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::SimplexPointBuffer;
use crate::core::facet_graph::{FacetGraph, FacetId, FacetOrientation, HullMode, VertexId};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while deriving tables from a facet graph.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// A facet could not be reduced to a single simplex.
    #[error(
        "Facet {facet} is non-simplicial: it decomposes into {vertices} distinct vertices, expected {expected}"
    )]
    NonSimplicialFacet {
        /// The offending facet.
        facet: FacetId,
        /// Distinct vertices found.
        vertices: usize,
        /// Vertices required per simplex.
        expected: usize,
    },
    /// A write or lookup fell outside a pre-sized table.
    #[error("Index {index} is out of bounds for {table} of length {len}")]
    IndexBounds {
        /// Which table was addressed.
        table: &'static str,
        /// The rejected index.
        index: usize,
        /// Size of that dimension of the table.
        len: usize,
    },
}

// =============================================================================
// BOUNDED FACET INDEX
// =============================================================================

/// The facets that become output rows, with their row (simplex) ids.
///
/// Delaunay graphs contribute their lower facets, hull graphs all facets,
/// in facet id order. A facet's 1-based visit id is its simplex id plus one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundedFacets {
    facets: Vec<FacetId>,
    simplex_of: Vec<Option<usize>>,
}

impl BoundedFacets {
    /// Indexes the output facets of `graph`.
    #[must_use]
    pub fn new(graph: &FacetGraph) -> Self {
        let mut facets = Vec::with_capacity(graph.facet_count());
        let mut simplex_of = vec![None; graph.facet_count()];
        for (id, facet) in graph.facets() {
            if graph.mode() == HullMode::Delaunay && facet.is_upper_delaunay() {
                continue;
            }
            simplex_of[id.index()] = Some(facets.len());
            facets.push(id);
        }
        Self { facets, simplex_of }
    }

    /// Number of output rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// `true` when nothing is emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Output facets in row order.
    #[must_use]
    pub fn facets(&self) -> &[FacetId] {
        &self.facets
    }

    /// Row id of `facet`, or `None` for an excluded facet.
    #[must_use]
    pub fn simplex_of(&self, facet: FacetId) -> Option<usize> {
        self.simplex_of.get(facet.index()).copied().flatten()
    }
}

// =============================================================================
// SIMPLEX TABLE
// =============================================================================

/// Fixed-width table of optional point ids.
///
/// Writes are bounds-checked and fail with [`ExtractionError::IndexBounds`]
/// instead of growing or truncating.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplexTable {
    width: usize,
    cells: Vec<Option<usize>>,
}

/// Hull facet table: one row per facet, padded with `None`.
pub type FacetMatrix = SimplexTable;

impl SimplexTable {
    /// A table of `rows` empty rows.
    #[must_use]
    pub fn with_rows(rows: usize, width: usize) -> Self {
        Self {
            width,
            cells: vec![None; rows * width],
        }
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

    /// `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[Option<usize>] {
        &self.cells[index * self.width..(index + 1) * self.width]
    }

    /// All rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<usize>]> + '_ {
        self.cells.chunks_exact(self.width.max(1))
    }

    /// Point ids of row `index`, skipping padding.
    pub fn row_ids(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(index).iter().filter_map(|id| *id)
    }

    /// Writes one cell.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::IndexBounds`] if `row` or `column` is outside the table.
    pub fn write(&mut self, row: usize, column: usize, value: usize) -> Result<(), ExtractionError> {
        let rows = self.len();
        if row >= rows {
            return Err(ExtractionError::IndexBounds {
                table: "simplex table rows",
                index: row,
                len: rows,
            });
        }
        if column >= self.width {
            return Err(ExtractionError::IndexBounds {
                table: "simplex table columns",
                index: column,
                len: self.width,
            });
        }
        self.cells[row * self.width + column] = Some(value);
        Ok(())
    }

    /// Swaps two columns in every row.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a >= self.width || b >= self.width {
            return;
        }
        for row in self.cells.chunks_exact_mut(self.width) {
            row.swap(a, b);
        }
    }
}

// =============================================================================
// ORIENTATION NORMALIZATION
// =============================================================================

/// How a facet's vertices are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmissionOrder {
    /// Stored order.
    Forward,
    /// Stored order with the first two vertices swapped.
    ReverseFirstPair,
    /// Concatenate the facet's ridges, each forward when the facet is the
    /// ridge's `top` and first-pair reversed otherwise.
    RidgeWalk,
}

/// The orientation decision table.
///
/// | `hull_dim == 3` | clockwise | simplicial | emission |
/// |---|---|---|---|
/// | yes | yes | any | forward |
/// | no | yes | yes | forward |
/// | any | no | yes | reverse first pair |
/// | otherwise | | no | ridge walk |
#[must_use]
pub fn emission_order(hull_dim: usize, orientation: FacetOrientation, simplicial: bool) -> EmissionOrder {
    let clockwise = orientation == FacetOrientation::Clockwise;
    match (hull_dim == 3, clockwise, simplicial) {
        (true, true, _) | (false, true, true) => EmissionOrder::Forward,
        (_, false, true) => EmissionOrder::ReverseFirstPair,
        (_, _, false) => EmissionOrder::RidgeWalk,
    }
}

fn push_reversed_first_pair(out: &mut Vec<VertexId>, vertices: &[VertexId]) {
    match vertices {
        [first, second, rest @ ..] => {
            out.push(*second);
            out.push(*first);
            out.extend_from_slice(rest);
        }
        _ => out.extend_from_slice(vertices),
    }
}

/// Emits the point ids of `facet` in normalized order.
///
/// Ridge walks keep the first occurrence of every vertex, so the result always
/// lists distinct ids.
#[must_use]
pub fn normalize_orientation(graph: &FacetGraph, facet: FacetId) -> SimplexPointBuffer {
    let record = graph.facet(facet);
    let mut ordered: Vec<VertexId> = Vec::with_capacity(record.vertices().len());
    match emission_order(graph.hull_dim(), record.orientation(), record.is_simplicial()) {
        EmissionOrder::Forward => ordered.extend_from_slice(record.vertices()),
        EmissionOrder::ReverseFirstPair => push_reversed_first_pair(&mut ordered, record.vertices()),
        EmissionOrder::RidgeWalk => {
            for &ridge_id in record.ridges() {
                let ridge = graph.ridge(ridge_id);
                if ridge.top() == facet {
                    ordered.extend_from_slice(ridge.vertices());
                } else {
                    push_reversed_first_pair(&mut ordered, ridge.vertices());
                }
            }
        }
    }

    let mut points = SimplexPointBuffer::new();
    for vertex in ordered {
        let point = graph.point_id(vertex);
        if !points.contains(&point) {
            points.push(point);
        }
    }
    points
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Emits the simplex table of `graph`.
///
/// # Errors
///
/// - [`ExtractionError::NonSimplicialFacet`] when a Delaunay facet does not
///   yield exactly `d + 1` distinct vertices.
/// - [`ExtractionError::IndexBounds`] if a row would overflow the table.
pub fn extract_simplices(
    graph: &FacetGraph,
    bounded: &BoundedFacets,
) -> Result<SimplexTable, ExtractionError> {
    let rows: Vec<SimplexPointBuffer> = bounded
        .facets()
        .iter()
        .map(|&facet| normalize_orientation(graph, facet))
        .collect();

    let width = match graph.mode() {
        HullMode::Delaunay => {
            let expected = graph.input_dim() + 1;
            if let Some((facet, row)) = bounded
                .facets()
                .iter()
                .zip(&rows)
                .find(|(_, row)| row.len() != expected)
            {
                return Err(ExtractionError::NonSimplicialFacet {
                    facet: *facet,
                    vertices: row.len(),
                    expected,
                });
            }
            expected
        }
        HullMode::ConvexHull => rows
            .iter()
            .map(smallvec::SmallVec::len)
            .max()
            .unwrap_or(0)
            .max(graph.input_dim()),
    };

    let mut table = SimplexTable::with_rows(rows.len(), width);
    for (row, points) in rows.iter().enumerate() {
        for (column, &point) in points.iter().enumerate() {
            table.write(row, column, point)?;
        }
    }
    table.swap_columns(0, 1);
    tracing::debug!(rows = table.len(), width, "extracted simplex table");
    Ok(table)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_hull::IncrementalHullEngine;
    use crate::core::engine::{EngineOptions, HullEngine};
    use crate::core::facet_graph::{
        CenterType, FacetBuilder, FacetGraphParts, Hyperplane, Ridge, RidgeId, Vertex, fixtures,
    };
    use crate::geometry::point_set::PointSet;
    use crate::geometry::predicates::{Orientation, facet_orientation, simplex_orientation};

    #[test]
    fn test_emission_order_table_rows() {
        use EmissionOrder::{Forward, ReverseFirstPair, RidgeWalk};
        use FacetOrientation::{Clockwise, CounterClockwise};

        // hull_dim == 3 and clockwise: forward regardless of simpliciality.
        assert_eq!(emission_order(3, Clockwise, true), Forward);
        assert_eq!(emission_order(3, Clockwise, false), Forward);
        // Clockwise simplicial in any other dimension: forward.
        assert_eq!(emission_order(2, Clockwise, true), Forward);
        assert_eq!(emission_order(4, Clockwise, true), Forward);
        // Counter-clockwise simplicial: first pair reversed.
        assert_eq!(emission_order(3, CounterClockwise, true), ReverseFirstPair);
        assert_eq!(emission_order(2, CounterClockwise, true), ReverseFirstPair);
        assert_eq!(emission_order(5, CounterClockwise, true), ReverseFirstPair);
        // Remaining non-simplicial cases walk the ridges.
        assert_eq!(emission_order(3, CounterClockwise, false), RidgeWalk);
        assert_eq!(emission_order(2, Clockwise, false), RidgeWalk);
        assert_eq!(emission_order(4, CounterClockwise, false), RidgeWalk);
    }

    #[test]
    fn test_simplex_table_bounds_checked() {
        let mut table = SimplexTable::with_rows(2, 3);
        assert!(table.write(1, 2, 7).is_ok());
        assert_eq!(
            table.write(2, 0, 1),
            Err(ExtractionError::IndexBounds {
                table: "simplex table rows",
                index: 2,
                len: 2
            })
        );
        assert_eq!(
            table.write(0, 3, 1),
            Err(ExtractionError::IndexBounds {
                table: "simplex table columns",
                index: 3,
                len: 3
            })
        );
        table.swap_columns(1, 2);
        assert_eq!(table.row(1), &[None, Some(7), None]);
        assert_eq!(table.row_ids(1).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_hand_built_square_rows_are_counter_clockwise() {
        let graph = fixtures::unit_square_hull();
        let bounded = BoundedFacets::new(&graph);
        let table = extract_simplices(&graph, &bounded).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.width(), 2);
        // Flags are counter-clockwise, so rows come out in stored order.
        assert_eq!(table.row(0), &[Some(0), Some(1)]);
        for (row, &facet) in bounded.facets().iter().enumerate() {
            let coords: Vec<&[f64]> = table.row_ids(row).map(|p| graph.hull_point(p)).collect();
            let normal = &graph.facet(facet).hyperplane().unwrap().normal;
            assert_eq!(facet_orientation(&coords, normal), Orientation::POSITIVE);
        }
    }

    #[test]
    fn test_engine_delaunay_rows_are_positive() {
        let points = PointSet::from_rows(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [0.5, 0.5],
            [0.2, 0.7],
        ])
        .unwrap();
        let mut engine = IncrementalHullEngine::new();
        let output = engine
            .compute(&points, &EngineOptions::parse("d Qbb Qz").unwrap())
            .unwrap();
        let bounded = BoundedFacets::new(&output.graph);
        let table = extract_simplices(&output.graph, &bounded).unwrap();
        assert_eq!(table.width(), 3);
        for row in 0..table.len() {
            let coords: Vec<&[f64]> = table.row_ids(row).map(|p| points.point(p)).collect();
            assert_eq!(simplex_orientation(&coords), Orientation::POSITIVE);
        }
    }

    fn non_simplicial_delaunay_graph(extra_vertex: bool) -> FacetGraph {
        // One lower quadrilateral facet of a lifted square, described through ridges.
        let points = PointSet::from_rows(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 2.0],
            [0.0, 1.0, 1.0],
        ])
        .unwrap();
        let corners: &[usize] = if extra_vertex { &[0, 1, 2, 3] } else { &[0, 1, 2] };
        let ridges: Vec<Ridge> = (0..corners.len())
            .map(|i| {
                Ridge::new(
                    [VertexId(corners[i]), VertexId(corners[(i + 1) % corners.len()])],
                    FacetId(0),
                    FacetId(0),
                )
            })
            .collect();
        let facet = FacetBuilder::default()
            .vertices(corners.iter().map(|&v| VertexId(v)))
            .ridges((0..ridges.len()).map(RidgeId))
            .simplicial(false)
            .hyperplane(Hyperplane {
                normal: vec![0.577, 0.577, -0.577],
                offset: 0.0,
            })
            .build()
            .unwrap();
        FacetGraph::from_parts(FacetGraphParts {
            mode: HullMode::Delaunay,
            center_type: CenterType::Centrum,
            points,
            num_input_points: 4,
            infinity_point: None,
            facets: vec![facet],
            vertices: (0..4).map(|p| Vertex::new(p, vec![FacetId(0)])).collect(),
            ridges,
        })
        .unwrap()
    }

    #[test]
    fn test_non_simplicial_facet_decomposes_or_fails() {
        let graph = non_simplicial_delaunay_graph(false);
        let table = extract_simplices(&graph, &BoundedFacets::new(&graph)).unwrap();
        assert_eq!(table.len(), 1);
        let mut ids: Vec<_> = table.row_ids(0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);

        let graph = non_simplicial_delaunay_graph(true);
        assert_eq!(
            extract_simplices(&graph, &BoundedFacets::new(&graph)),
            Err(ExtractionError::NonSimplicialFacet {
                facet: FacetId(0),
                vertices: 4,
                expected: 3
            })
        );
    }

    #[test]
    fn test_bounded_facets_skip_upper_delaunay() {
        let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
        let mut engine = IncrementalHullEngine::new();
        let output = engine
            .compute(&points, &EngineOptions::parse("d Qbb Qz").unwrap())
            .unwrap();
        let bounded = BoundedFacets::new(&output.graph);
        assert_eq!(bounded.len(), 2);
        for (id, facet) in output.graph.facets() {
            assert_eq!(bounded.simplex_of(id).is_some(), !facet.is_upper_delaunay());
        }
        assert_eq!(bounded.simplex_of(FacetId(10_000)), None);
    }
}
