//! Per-simplex metrics: areas, circumradii and defining-site coordinates.

use tracing::debug;

use crate::core::algorithms::triangulation::{BoundedFacets, ExtractionError, SimplexTable};
use crate::core::algorithms::voronoi::VoronoiVertex;
use crate::core::facet_graph::{FacetGraph, FacetId, HullMode};
use crate::geometry::measures::{centroid, distance, simplex_volume};
use crate::geometry::point_set::PointSet;

/// Measure of one facet, cached on the facet.
///
/// Hull facets are measured in hull space, so a 3-D hull reports triangle
/// areas and a 2-D hull edge lengths. Delaunay facets are measured in input
/// space, which gives the volume of the Delaunay simplex. Non-simplicial
/// facets are fanned from their centroid over their ridges.
///
/// `None` for facets without a hyperplane and for upper Delaunay facets of a
/// graph with a point at infinity.
#[must_use]
pub fn facet_area(graph: &FacetGraph, facet: FacetId) -> Option<f64> {
    let record = graph.facet(facet);
    record.area_or_init(|| {
        if record.hyperplane().is_none()
            || (record.is_upper_delaunay() && graph.infinity_point().is_some())
        {
            return None;
        }
        let coords = |point: usize| match graph.mode() {
            HullMode::ConvexHull => graph.hull_point(point),
            HullMode::Delaunay => graph.input_point(point),
        };

        if record.is_simplicial() {
            let points: Vec<&[f64]> = record
                .vertices()
                .iter()
                .map(|&v| coords(graph.point_id(v)))
                .collect();
            return Some(simplex_volume(&points));
        }

        if record.ridges().is_empty() {
            debug!(%facet, "non-simplicial facet without ridges has no area");
            return None;
        }
        let corners: Vec<&[f64]> = record
            .vertices()
            .iter()
            .map(|&v| coords(graph.point_id(v)))
            .collect();
        let center = centroid(&corners);
        let total = record
            .ridges()
            .iter()
            .map(|&ridge| {
                let mut piece: Vec<&[f64]> = Vec::with_capacity(graph.hull_dim());
                piece.push(&center);
                piece.extend(
                    graph
                        .ridge(ridge)
                        .vertices()
                        .iter()
                        .map(|&v| coords(graph.point_id(v))),
                );
                simplex_volume(&piece)
            })
            .sum();
        Some(total)
    })
}

/// Areas of the output facets, in row order.
#[must_use]
pub fn extract_areas(graph: &FacetGraph, bounded: &BoundedFacets) -> Vec<Option<f64>> {
    bounded
        .facets()
        .iter()
        .map(|&facet| facet_area(graph, facet))
        .collect()
}

/// Distance from each simplex's first site to its Voronoi vertex.
///
/// Simplices whose Voronoi vertex is at infinity get radius 0.
///
/// # Errors
///
/// Returns [`ExtractionError::IndexBounds`] if `vertices` has fewer entries
/// than `simplices` has rows.
pub fn circumradii(
    graph: &FacetGraph,
    simplices: &SimplexTable,
    vertices: &[VoronoiVertex],
) -> Result<Vec<f64>, ExtractionError> {
    (0..simplices.len())
        .map(|row| {
            let vertex = vertices.get(row).ok_or(ExtractionError::IndexBounds {
                table: "Voronoi vertices",
                index: row,
                len: vertices.len(),
            })?;
            let radius = match (vertex.coords(), simplices.row_ids(row).next()) {
                (Some(center), Some(site)) => distance(graph.input_point(site), center),
                _ => 0.0,
            };
            Ok(radius)
        })
        .collect()
}

/// Input coordinates of the first site of every simplex, in row order.
#[must_use]
pub fn simplex_points(graph: &FacetGraph, simplices: &SimplexTable) -> PointSet {
    let mut points = PointSet::empty(graph.input_dim());
    for row in 0..simplices.len() {
        if let Some(site) = simplices.row_ids(row).next() {
            points.push(graph.input_point(site));
        }
    }
    points
}
