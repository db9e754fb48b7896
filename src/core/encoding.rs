//! Flat, 1-based encodings of operation outputs.
//!
//! Callers that exchange tables as plain integer and float arrays get them
//! here: point ids and simplex ids become 1-based, `0` marks a missing entry,
//! boundary neighbors are the non-positive negated facet id, `-1` marks an
//! infinite region vertex or a point without a region, and Voronoi vertices at
//! infinity are rows of `f64::INFINITY`.

use serde::{Deserialize, Serialize};

use crate::core::algorithms::alpha_shape::SimplexGrid;
use crate::core::algorithms::neighbors::Neighbor;
use crate::core::algorithms::triangulation::SimplexTable;
use crate::core::algorithms::voronoi::{RegionVertex, VoronoiRegion, VoronoiVertex};
use crate::core::operations::{ConvexHullOutput, DelaunayOutput, ExitCode, VoronoiOutput};
use crate::geometry::point_set::PointSet;

/// Encoded missing id.
pub const MISSING: i64 = 0;
/// Encoded infinite region vertex, and the region of a point that has none.
pub const NO_REGION: i64 = -1;

fn one_based(index: usize) -> i64 {
    i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1))
}

fn negated(index: usize) -> i64 {
    i64::try_from(index).map_or(i64::MIN, |i| -i)
}

/// 1-based rows; padding becomes [`MISSING`].
#[must_use]
pub fn encode_table(table: &SimplexTable) -> Vec<Vec<i64>> {
    table
        .rows()
        .map(|row| row.iter().map(|cell| cell.map_or(MISSING, one_based)).collect())
        .collect()
}

/// 1-based grid; empty cells become [`MISSING`].
#[must_use]
pub fn encode_grid(grid: &SimplexGrid) -> Vec<Vec<i64>> {
    grid.rows()
        .map(|row| row.iter().map(|cell| cell.map_or(MISSING, one_based)).collect())
        .collect()
}

/// Adjacent simplices 1-based, boundary neighbors as `-facet`.
#[must_use]
pub fn encode_neighbors(neighbors: &[Vec<Neighbor>]) -> Vec<Vec<i64>> {
    neighbors
        .iter()
        .map(|list| {
            list.iter()
                .map(|neighbor| match *neighbor {
                    Neighbor::Adjacent(simplex) => one_based(simplex),
                    Neighbor::Boundary { facet } => negated(facet.index()),
                })
                .collect()
        })
        .collect()
}

/// Region vertices 1-based, infinity as [`NO_REGION`].
#[must_use]
pub fn encode_regions(regions: &[VoronoiRegion]) -> Vec<Vec<i64>> {
    regions
        .iter()
        .map(|region| {
            region
                .vertices()
                .iter()
                .map(|vertex| match *vertex {
                    RegionVertex::Finite(index) => one_based(index),
                    RegionVertex::Infinite => NO_REGION,
                })
                .collect()
        })
        .collect()
}

/// Point regions 1-based, [`NO_REGION`] for points without one.
#[must_use]
pub fn encode_point_regions(point_regions: &[Option<usize>]) -> Vec<i64> {
    point_regions
        .iter()
        .map(|region| region.map_or(NO_REGION, one_based))
        .collect()
}

/// Located simplices 1-based, [`MISSING`] for queries that were not located.
#[must_use]
pub fn encode_locations(locations: &[Option<usize>]) -> Vec<i64> {
    locations
        .iter()
        .map(|location| location.map_or(MISSING, one_based))
        .collect()
}

/// Voronoi vertex coordinates; vertices at infinity are rows of infinities.
#[must_use]
pub fn encode_vertices(vertices: &[VoronoiVertex], dim: usize) -> Vec<Vec<f64>> {
    vertices
        .iter()
        .map(|vertex| match vertex {
            VoronoiVertex::Finite(coords) => coords.clone(),
            VoronoiVertex::AtInfinity => vec![f64::INFINITY; dim],
        })
        .collect()
}

/// Rows of a point set.
#[must_use]
pub fn encode_points(points: &PointSet) -> Vec<Vec<f64>> {
    points.iter().map(<[f64]>::to_vec).collect()
}

/// Numeric exit code.
#[must_use]
pub const fn encode_exit_code(code: ExitCode) -> i32 {
    code as i32
}

/// Encoded [`ConvexHullOutput`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedConvexHull {
    /// 0 on success, 2 for degenerate input.
    pub exit_code: i32,
    /// 1-based facet rows.
    pub facets: Vec<Vec<i64>>,
    /// Facet measures.
    pub areas: Vec<Option<f64>>,
}

impl From<&ConvexHullOutput> for EncodedConvexHull {
    fn from(output: &ConvexHullOutput) -> Self {
        Self {
            exit_code: encode_exit_code(output.exit_code()),
            facets: encode_table(&output.facets),
            areas: output.areas.clone(),
        }
    }
}

/// Encoded [`DelaunayOutput`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedDelaunay {
    /// 0 on success, 2 for degenerate input.
    pub exit_code: i32,
    /// 1-based simplex rows.
    pub simplices: Vec<Vec<i64>>,
    /// Encoded neighbor lists.
    pub neighbors: Vec<Vec<i64>>,
    /// Simplex volumes.
    pub areas: Vec<Option<f64>>,
    /// First-site coordinates of each simplex.
    pub simplex_points: Vec<Vec<f64>>,
}

impl From<&DelaunayOutput> for EncodedDelaunay {
    fn from(output: &DelaunayOutput) -> Self {
        Self {
            exit_code: encode_exit_code(output.exit_code()),
            simplices: encode_table(&output.simplices),
            neighbors: encode_neighbors(&output.neighbors),
            areas: output.areas.clone(),
            simplex_points: encode_points(&output.simplex_points),
        }
    }
}

/// Encoded [`VoronoiOutput`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedVoronoi {
    /// 0 on success, 2 for degenerate input.
    pub exit_code: i32,
    /// Voronoi vertex coordinates.
    pub vertices: Vec<Vec<f64>>,
    /// Circumradius of each simplex.
    pub circumradii: Vec<f64>,
    /// 1-based simplex rows.
    pub simplices: Vec<Vec<i64>>,
    /// Encoded neighbor lists.
    pub neighbors: Vec<Vec<i64>>,
    /// First-site coordinates of each simplex.
    pub simplex_points: Vec<Vec<f64>>,
    /// Encoded regions.
    pub regions: Vec<Vec<i64>>,
    /// Encoded region of each input point.
    pub point_regions: Vec<i64>,
}

impl From<&VoronoiOutput> for EncodedVoronoi {
    fn from(output: &VoronoiOutput) -> Self {
        Self {
            exit_code: encode_exit_code(output.exit_code()),
            vertices: encode_vertices(&output.vertices, output.simplex_points.dim()),
            circumradii: output.circumradii.clone(),
            simplices: encode_table(&output.simplices),
            neighbors: encode_neighbors(&output.neighbors),
            simplex_points: encode_points(&output.simplex_points),
            regions: encode_regions(&output.regions),
            point_regions: encode_point_regions(&output.point_regions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::facet_graph::FacetId;

    #[test]
    fn test_sentinels() {
        let mut table = SimplexTable::with_rows(1, 3);
        table.write(0, 0, 4).unwrap();
        table.write(0, 1, 0).unwrap();
        assert_eq!(encode_table(&table), vec![vec![5, 1, MISSING]]);

        let neighbors = vec![vec![
            Neighbor::Adjacent(0),
            Neighbor::Boundary { facet: FacetId(7) },
            Neighbor::Boundary { facet: FacetId(0) },
        ]];
        assert_eq!(encode_neighbors(&neighbors), vec![vec![1, -7, 0]]);

        let mut region = VoronoiRegion::new(0);
        region.push(RegionVertex::Finite(2));
        region.push(RegionVertex::Infinite);
        assert_eq!(encode_regions(&[region]), vec![vec![3, NO_REGION]]);

        assert_eq!(encode_point_regions(&[Some(0), None]), vec![1, NO_REGION]);
        assert_eq!(encode_locations(&[None, Some(3)]), vec![MISSING, 4]);
        assert_eq!(encode_exit_code(ExitCode::Degenerate), 2);
    }

    #[test]
    fn test_vertices_at_infinity() {
        let encoded = encode_vertices(
            &[VoronoiVertex::Finite(vec![0.5, 1.5]), VoronoiVertex::AtInfinity],
            2,
        );
        assert_eq!(encoded[0], vec![0.5, 1.5]);
        assert!(encoded[1].iter().all(|c| c.is_infinite()));
    }
}
