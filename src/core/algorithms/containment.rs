//! Point containment and simplex location against a facet graph.
//!
//! Hull queries look for the facet whose hyperplane lies farthest below (or
//! least above) the query point. The search visits facets through neighbor
//! links from an explicit worklist with its own visited set, so the graph is
//! never mutated. Delaunay queries test the lower facets with barycentric
//! coordinates in input space.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::algorithms::triangulation::BoundedFacets;
use crate::core::engine::Tolerances;
use crate::core::facet_graph::{FacetGraph, FacetId, HullMode};
use crate::geometry::measures::barycentric_coordinates;

/// Slack allowed on barycentric coordinates when locating Delaunay simplices.
pub const BARYCENTRIC_TOLERANCE: f64 = 1e-12;

/// Which side of the hull boundary counts as inside.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainmentRule {
    /// Points on the boundary, up to rounding, are inside.
    #[default]
    Inclusive,
    /// Only points confidently below every facet are inside.
    Strict,
}

/// The facet a query point is closest to leaving the hull through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestFacet {
    /// Facet with the largest signed distance to the query.
    pub facet: FacetId,
    /// That signed distance; positive means above the facet.
    pub distance: f64,
    /// `true` if `distance` exceeds the outside tolerance.
    pub is_outside: bool,
}

/// Finds the facet with the largest signed distance to `point`.
///
/// `point` is in hull coordinates. Returns `None` for a graph without facets
/// or without hyperplanes.
#[must_use]
pub fn find_best_facet(graph: &FacetGraph, tolerances: &Tolerances, point: &[f64]) -> Option<BestFacet> {
    let mut visited = vec![false; graph.facet_count()];
    let mut worklist = VecDeque::new();
    let mut best: Option<(FacetId, f64)> = None;

    // Seed from every unvisited facet so disconnected pieces are still covered.
    for seed in 0..graph.facet_count() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        worklist.push_back(FacetId(seed));
        while let Some(facet) = worklist.pop_front() {
            let record = graph.facet(facet);
            if let Some(plane) = record.hyperplane() {
                let distance = plane.distance(point);
                if best.is_none_or(|(_, d)| distance > d) {
                    best = Some((facet, distance));
                }
            }
            for &neighbor in record.neighbors() {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    worklist.push_back(neighbor);
                }
            }
        }
    }

    best.map(|(facet, distance)| BestFacet {
        facet,
        distance,
        is_outside: distance > tolerances.outside_tolerance(),
    })
}

/// Locates `point` (input coordinates) in a Delaunay graph.
///
/// Returns the row id of the first lower facet whose barycentric coordinates
/// all pass `rule`.
#[must_use]
pub fn locate_simplex(
    graph: &FacetGraph,
    bounded: &BoundedFacets,
    point: &[f64],
    rule: ContainmentRule,
) -> Option<usize> {
    bounded.facets().iter().enumerate().find_map(|(row, &facet)| {
        let simplex = graph.facet_input_points(facet);
        let coords = barycentric_coordinates(&simplex, point).ok()?;
        let inside = match rule {
            ContainmentRule::Inclusive => coords.iter().all(|&c| c >= -BARYCENTRIC_TOLERANCE),
            ContainmentRule::Strict => coords.iter().all(|&c| c > BARYCENTRIC_TOLERANCE),
        };
        inside.then_some(row)
    })
}

/// Whether `point` (input coordinates) lies in the hull under `rule`.
#[must_use]
pub fn contains_point(
    graph: &FacetGraph,
    tolerances: &Tolerances,
    point: &[f64],
    rule: ContainmentRule,
) -> bool {
    match graph.mode() {
        HullMode::ConvexHull => find_best_facet(graph, tolerances, point).is_some_and(|best| match rule {
            ContainmentRule::Inclusive => !best.is_outside,
            ContainmentRule::Strict => best.distance < tolerances.strict_inside_threshold(),
        }),
        HullMode::Delaunay => locate_simplex(graph, &BoundedFacets::new(graph), point, rule).is_some(),
    }
}

/// Locates `point` (input coordinates).
///
/// In a hull graph the result is the index of the best facet of a point that
/// is strictly inside. In a Delaunay graph it is the row id of the containing
/// simplex, found inclusively by [`locate_simplex`].
#[must_use]
pub fn find_simplex(
    graph: &FacetGraph,
    tolerances: &Tolerances,
    bounded: &BoundedFacets,
    point: &[f64],
) -> Option<usize> {
    match graph.mode() {
        HullMode::ConvexHull => find_best_facet(graph, tolerances, point)
            .filter(|best| best.distance < tolerances.strict_inside_threshold())
            .map(|best| best.facet.index()),
        HullMode::Delaunay => locate_simplex(graph, bounded, point, ContainmentRule::Inclusive),
    }
}
