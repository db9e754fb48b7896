//! Property-based tests for table extraction.
//!
//! This module uses proptest to verify properties that must hold for any
//! point set in general position:
//! - Simplex rows list distinct ids and are positively oriented
//! - Every input point lies in its own hull
//! - Convex combinations of input points are inside, far-away points outside
//! - Delaunay volumes add up to the hull volume
//! - Hull facets face away from the interior
//! - Voronoi regions reference valid vertices and reach infinity at most once
//! - Alpha filtering is idempotent

use hullgraph::geometry::measures::centroid;
use hullgraph::geometry::predicates::{Orientation, simplex_orientation};
use hullgraph::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

/// Strategy for generating finite f64 coordinates
fn finite_coordinate() -> impl Strategy<Value = f64> {
    -100.0..100.0_f64
}

fn points_2d() -> impl Strategy<Value = PointSet> {
    prop::collection::vec(prop::array::uniform2(finite_coordinate()), 4..=24)
        .prop_map(|rows| PointSet::from_rows(&rows).unwrap())
}

fn points_3d() -> impl Strategy<Value = PointSet> {
    prop::collection::vec(prop::array::uniform3(finite_coordinate()), 5..=20)
        .prop_map(|rows| PointSet::from_rows(&rows).unwrap())
}

fn session() -> HullSession<IncrementalHullEngine> {
    HullSession::new(IncrementalHullEngine::new())
}

fn row_coords<'a>(points: &'a PointSet, table: &SimplexTable, row: usize) -> Vec<&'a [f64]> {
    table.row_ids(row).map(|id| points.point(id)).collect()
}

/// Weight vectors for convex combinations; only the first `n` entries of each are used.
fn weight_sets() -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(0.001..1.0_f64, 24), 1..6)
}

fn convex_combinations(points: &PointSet, weights: &[Vec<f64>]) -> PointSet {
    let rows: Vec<Vec<f64>> = weights
        .iter()
        .map(|w| {
            let total: f64 = w[..points.len()].iter().sum();
            let mut combined = vec![0.0; points.dim()];
            for (point, weight) in points.iter().zip(w) {
                for (c, x) in combined.iter_mut().zip(point) {
                    *c += weight / total * x;
                }
            }
            combined
        })
        .collect();
    PointSet::from_nested(&rows).unwrap()
}

/// One query per axis and direction, past the bounding box by half its extent plus one.
fn beyond_bounding_box(points: &PointSet) -> PointSet {
    let rows: Vec<&[f64]> = points.iter().collect();
    let center = centroid(&rows);
    let mut queries = Vec::new();
    for axis in 0..points.dim() {
        let (low, high) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[axis]), hi.max(p[axis]))
        });
        let margin = 1.0 + 0.5 * (high - low);
        for value in [low - margin, high + margin] {
            let mut query = center.clone();
            query[axis] = value;
            queries.push(query);
        }
    }
    PointSet::from_nested(&queries).unwrap()
}

/// Membership of `queries` in a retained hull context and a retained Delaunay context.
fn membership(points: &PointSet, queries: &PointSet) -> Option<(Vec<bool>, Vec<bool>)> {
    let mut session = session();
    let in_hull = {
        let (_, context) = convex_hull_retained(&mut session, points, "").ok()?;
        points_in_hull(&context?, queries).ok()?
    };
    let in_triangulation = {
        let (output, context) = delaunay_retained(&mut session, points, "").ok()?;
        if output.status != OutputStatus::Success {
            return None;
        }
        points_in_hull(&context?, queries).ok()?
    };
    Some((in_hull, in_triangulation))
}

fn cross(a: &[f64], b: &[f64]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Property: Delaunay rows hold d + 1 distinct ids in counter-clockwise order (2D)
    #[test]
    fn prop_delaunay_rows_positive_2d(points in points_2d()) {
        let mut session = session();
        if let Ok(output) = delaunay(&mut session, &points, "") {
            prop_assume!(output.status == OutputStatus::Success);
            prop_assert!(!output.simplices.is_empty());
            for row in 0..output.simplices.len() {
                let mut ids: Vec<usize> = output.simplices.row_ids(row).collect();
                prop_assert_eq!(ids.len(), 3);
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), 3);
                prop_assert!(ids.iter().all(|&id| id < points.len()));
                let coords = row_coords(&points, &output.simplices, row);
                prop_assert_eq!(simplex_orientation(&coords), Orientation::POSITIVE);
            }
            prop_assert_eq!(output.neighbors.len(), output.simplices.len());
        }
    }

    /// Property: Delaunay rows are positively oriented (3D)
    #[test]
    fn prop_delaunay_rows_positive_3d(points in points_3d()) {
        let mut session = session();
        if let Ok(output) = delaunay(&mut session, &points, "") {
            prop_assume!(output.status == OutputStatus::Success);
            for row in 0..output.simplices.len() {
                let coords = row_coords(&points, &output.simplices, row);
                prop_assert_eq!(coords.len(), 4);
                prop_assert_eq!(simplex_orientation(&coords), Orientation::POSITIVE);
            }
        }
    }

    /// Property: Every input point is inside its own hull (inclusive rule)
    #[test]
    fn prop_hull_contains_its_points(points in points_2d()) {
        let mut session = session();
        if let Ok((_, Some(context))) = convex_hull_retained(&mut session, &points, "") {
            let inside = points_in_hull(&context, &points).unwrap();
            prop_assert!(inside.iter().all(|&b| b));
        }
    }

    /// Property: Convex combinations of input points are inside (2D)
    #[test]
    fn prop_convex_combinations_inside_2d(points in points_2d(), weights in weight_sets()) {
        let queries = convex_combinations(&points, &weights);
        if let Some((in_hull, in_triangulation)) = membership(&points, &queries) {
            prop_assert!(in_hull.iter().all(|&b| b));
            prop_assert!(in_triangulation.iter().all(|&b| b));
        }
    }

    /// Property: Convex combinations of input points are inside (3D)
    #[test]
    fn prop_convex_combinations_inside_3d(points in points_3d(), weights in weight_sets()) {
        let queries = convex_combinations(&points, &weights);
        if let Some((in_hull, in_triangulation)) = membership(&points, &queries) {
            prop_assert!(in_hull.iter().all(|&b| b));
            prop_assert!(in_triangulation.iter().all(|&b| b));
        }
    }

    /// Property: Points beyond the bounding box are outside (2D)
    #[test]
    fn prop_far_points_outside_2d(points in points_2d()) {
        let queries = beyond_bounding_box(&points);
        if let Some((in_hull, in_triangulation)) = membership(&points, &queries) {
            prop_assert!(in_hull.iter().all(|&b| !b));
            prop_assert!(in_triangulation.iter().all(|&b| !b));
        }
    }

    /// Property: Points beyond the bounding box are outside (3D)
    #[test]
    fn prop_far_points_outside_3d(points in points_3d()) {
        let queries = beyond_bounding_box(&points);
        if let Some((in_hull, in_triangulation)) = membership(&points, &queries) {
            prop_assert!(in_hull.iter().all(|&b| !b));
            prop_assert!(in_triangulation.iter().all(|&b| !b));
        }
    }

    /// Property: Delaunay areas sum to the area enclosed by the hull edges
    #[test]
    fn prop_delaunay_area_matches_hull_area(points in points_2d()) {
        let mut session = session();
        let hull = convex_hull(&mut session, &points, "");
        let triangulation = delaunay(&mut session, &points, "");
        if let (Ok(hull), Ok(triangulation)) = (hull, triangulation) {
            prop_assume!(triangulation.status == OutputStatus::Success);
            let twice_hull: f64 = (0..hull.facets.len())
                .map(|row| {
                    let e = row_coords(&points, &hull.facets, row);
                    e[0][0] * e[1][1] - e[0][1] * e[1][0]
                })
                .sum();
            let total: f64 = triangulation.areas.iter().flatten().sum();
            prop_assert!(twice_hull > 0.0);
            prop_assert!((total - twice_hull / 2.0).abs() <= 1e-6 * (1.0 + total));
        }
    }

    /// Property: Hull facet rows face away from the interior (3D)
    #[test]
    fn prop_hull_facets_face_outward_3d(points in points_3d()) {
        let mut session = session();
        if let Ok(hull) = convex_hull(&mut session, &points, "") {
            let rows: Vec<&[f64]> = points.iter().collect();
            let center = centroid(&rows);
            for row in 0..hull.facets.len() {
                let v = row_coords(&points, &hull.facets, row);
                prop_assert_eq!(v.len(), 3);
                let e1: Vec<f64> = v[1].iter().zip(v[0]).map(|(a, b)| a - b).collect();
                let e2: Vec<f64> = v[2].iter().zip(v[0]).map(|(a, b)| a - b).collect();
                let normal = cross(&e1, &e2);
                let outward: f64 = normal.iter().zip(v[0].iter().zip(&center)).map(|(n, (p, c))| n * (p - c)).sum();
                prop_assert!(outward > 0.0);
            }
        }
    }

    /// Property: Voronoi regions only reference existing vertices and reach infinity at most once
    #[test]
    fn prop_voronoi_regions_well_formed(points in points_2d()) {
        let mut session = session();
        if let Ok(diagram) = voronoi(&mut session, &points, "") {
            prop_assume!(diagram.status == OutputStatus::Success);
            prop_assert_eq!(diagram.vertices.len(), diagram.simplices.len());
            prop_assert_eq!(diagram.point_regions.len(), points.len());
            for region in &diagram.regions {
                let mut infinite = 0;
                for vertex in region.vertices() {
                    match vertex {
                        RegionVertex::Finite(index) => prop_assert!(*index < diagram.vertices.len()),
                        RegionVertex::Infinite => infinite += 1,
                    }
                }
                prop_assert!(infinite <= 1);
                prop_assert_eq!(diagram.point_regions[region.site()].map(|r| diagram.regions[r].site()), Some(region.site()));
            }
            prop_assert!(diagram.circumradii.iter().all(|r| *r >= 0.0));
        }
    }

    /// Property: Filtering twice with the same radii and alpha changes nothing
    #[test]
    fn prop_alpha_filter_idempotent(
        radii in prop::collection::vec(0.0..10.0_f64, 1..12),
        picks in prop::collection::vec(prop::option::of(0usize..64), 1..8),
        alpha in 0.0..10.0_f64,
    ) {
        let width = picks.len();
        let cells: Vec<Option<usize>> = picks.iter().map(|p| p.map(|r| r % radii.len())).collect();
        let grid = SimplexGrid::from_rows(&[cells.clone(), cells]).unwrap();
        let once = alpha_shape(&grid, &radii, alpha).unwrap();
        let twice = alpha_shape(&once, &radii, alpha).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.width(), width);
        for cell in once.cells().iter().flatten() {
            prop_assert!(alpha > radii[*cell]);
        }
    }
}
