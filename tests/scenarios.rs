//! End-to-end scenarios on small hand-checked inputs.
//!
//! Each test runs a public operation through a fresh session and checks the
//! tables against what can be worked out by hand for the unit square and
//! its variations.

#![forbid(unsafe_code)]

use hullgraph::core::encoding::encode_grid;
use hullgraph::geometry::measures::barycentric_coordinates;
use hullgraph::geometry::predicates::{Orientation, simplex_orientation};
use hullgraph::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn session() -> HullSession<IncrementalHullEngine> {
    init_tracing();
    HullSession::new(IncrementalHullEngine::new())
}

fn unit_square() -> PointSet {
    PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap()
}

fn sorted_row(table: &SimplexTable, row: usize) -> Vec<usize> {
    let mut ids: Vec<usize> = table.row_ids(row).collect();
    ids.sort_unstable();
    ids
}

// =============================================================================
// CONVEX HULL
// =============================================================================

#[test]
fn square_hull_has_four_edges_covering_all_points() {
    let mut session = session();
    let hull = convex_hull(&mut session, &unit_square(), "").unwrap();

    assert_eq!(hull.status, OutputStatus::Success);
    assert_eq!(hull.facets.len(), 4);
    assert_eq!(hull.facets.width(), 2);

    let mut covered = FastHashSet::default();
    for row in 0..hull.facets.len() {
        let ids = sorted_row(&hull.facets, row);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        covered.extend(ids);
    }
    assert_eq!(covered.len(), 4);
    assert!(hull.areas.iter().all(|a| (a.unwrap() - 1.0).abs() < 1e-9));
}

#[test]
fn hull_edges_traverse_counter_clockwise() {
    let mut session = session();
    let points = unit_square();
    let hull = convex_hull(&mut session, &points, "").unwrap();

    // Shoelace over the emitted edges gives the positive polygon area.
    let twice_area: f64 = (0..hull.facets.len())
        .map(|row| {
            let ids: Vec<usize> = hull.facets.row_ids(row).collect();
            let (a, b) = (points.point(ids[0]), points.point(ids[1]));
            a[0] * b[1] - a[1] * b[0]
        })
        .sum();
    assert!((twice_area - 2.0).abs() < 1e-9);
}

// =============================================================================
// DELAUNAY
// =============================================================================

#[test]
fn square_delaunay_has_two_triangles_sharing_the_diagonal() {
    let mut session = session();
    let points = unit_square();
    let triangulation = delaunay(&mut session, &points, "").unwrap();

    assert_eq!(triangulation.simplices.len(), 2);
    let first = sorted_row(&triangulation.simplices, 0);
    let second = sorted_row(&triangulation.simplices, 1);
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    let shared: Vec<usize> = first.iter().copied().filter(|id| second.contains(id)).collect();
    assert_eq!(shared.len(), 2);

    assert_eq!(triangulation.neighbors.len(), 2);
    for (row, list) in triangulation.neighbors.iter().enumerate() {
        let adjacent: Vec<usize> = list.iter().filter_map(|n| n.simplex()).collect();
        assert_eq!(adjacent, vec![1 - row]);
        assert_eq!(list.iter().filter(|n| n.is_boundary()).count(), 2);
    }

    for row in 0..triangulation.simplices.len() {
        let coords: Vec<&[f64]> = triangulation
            .simplices
            .row_ids(row)
            .map(|id| points.point(id))
            .collect();
        assert_eq!(simplex_orientation(&coords), Orientation::POSITIVE);
    }
    assert_eq!(triangulation.simplex_points.len(), 2);
}

#[test]
fn three_points_give_a_single_triangle() {
    let mut session = session();
    let points = PointSet::from_rows(&[[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]]).unwrap();
    let triangulation = delaunay(&mut session, &points, "").unwrap();
    assert_eq!(triangulation.status, OutputStatus::Success);
    assert_eq!(triangulation.simplices.len(), 1);
    assert_eq!(sorted_row(&triangulation.simplices, 0), vec![0, 1, 2]);
    assert!((triangulation.areas[0].unwrap() - 6.0).abs() < 1e-9);
}

#[test]
fn square_with_center_fans_around_the_center() {
    let mut session = session();
    let points = PointSet::from_rows(&[
        [0.0, 0.0],
        [1.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [0.5, 0.5],
    ])
    .unwrap();
    let triangulation = delaunay(&mut session, &points, "").unwrap();
    assert_eq!(triangulation.simplices.len(), 4);
    for row in 0..4 {
        assert!(triangulation.simplices.row_ids(row).any(|id| id == 4));
    }

    let diagram = voronoi(&mut session, &points, "").unwrap();
    assert_eq!(diagram.vertices.len(), 4);
    assert_eq!(diagram.circumradii.len(), 4);
    let center = diagram.regions.iter().find(|r| r.site() == 4).unwrap();
    assert!(!center.is_unbounded());
    for corner in diagram.regions.iter().filter(|r| r.site() != 4) {
        let infinite = corner
            .vertices()
            .iter()
            .filter(|v| **v == RegionVertex::Infinite)
            .count();
        assert_eq!(infinite, 1);
    }
    assert_eq!(session.computations(), 2);
    assert_eq!(session.releases(), 2);
}

// =============================================================================
// ALPHA SHAPE
// =============================================================================

#[test]
fn alpha_filter_keeps_only_small_simplices() {
    let grid = SimplexGrid::from_encoded(&[vec![1, 2], vec![2, 1], vec![1, 0]]).unwrap();
    let filtered = alpha_shape(&grid, &[0.5, 2.0], 1.0).unwrap();
    assert_eq!(encode_grid(&filtered), vec![vec![1, 0], vec![0, 1], vec![1, 0]]);
}

// =============================================================================
// CONTAINMENT
// =============================================================================

#[test]
fn unit_square_contains_its_center_only() {
    let mut session = session();
    let (_, context) = convex_hull_retained(&mut session, &unit_square(), "").unwrap();
    let context = context.unwrap();
    let queries = PointSet::from_rows(&[[0.5, 0.5], [2.0, 2.0]]).unwrap();
    assert_eq!(points_in_hull(&context, &queries).unwrap(), vec![true, false]);
    drop(context);
    assert_eq!(session.releases(), 1);
}

#[test]
fn delaunay_context_locates_simplices() {
    let mut session = session();
    let points = unit_square();
    let (triangulation, context) = delaunay_retained(&mut session, &points, "").unwrap();
    let context = context.unwrap();
    let queries = PointSet::from_rows(&[[0.8, 0.1], [0.1, 0.8], [1.5, 0.5]]).unwrap();
    let located = find_simplex(&context, &queries).unwrap();
    assert_eq!(located.len(), 3);
    assert_eq!(located[2], None);

    for (query, row) in queries.iter().zip(&located).take(2) {
        let simplex: Vec<&[f64]> = triangulation
            .simplices
            .row_ids(row.unwrap())
            .map(|id| points.point(id))
            .collect();
        let coords = barycentric_coordinates(&simplex, query).unwrap();
        assert!(coords.iter().all(|&c| c >= -1e-12));
    }
}
