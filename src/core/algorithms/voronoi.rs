//! Voronoi diagram extraction from a Delaunay facet graph.
//!
//! Voronoi vertices are the centers of the lower Delaunay facets, one per
//! output simplex and in the same order. The region of a site lists the
//! Voronoi vertices of the facets incident to it; incident upper facets make
//! the region unbounded and contribute a single [`RegionVertex::Infinite`].
//! In the plane the incident facets are walked around the site so regions
//! come out as counter-clockwise polygons.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::algorithms::triangulation::BoundedFacets;
use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::core::facet_graph::{CenterType, FacetGraph, FacetId, HullMode, VertexId};
use crate::geometry::measures::{centroid, circumcenter, squared_distance};

// =============================================================================
// TYPES
// =============================================================================

/// A Voronoi vertex: the center of one output simplex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VoronoiVertex {
    /// Finite center in input space.
    Finite(Vec<f64>),
    /// The facet touches infinity or its center is undefined.
    AtInfinity,
}

impl VoronoiVertex {
    /// Coordinates of a finite vertex.
    #[must_use]
    pub fn coords(&self) -> Option<&[f64]> {
        match self {
            Self::Finite(coords) => Some(coords),
            Self::AtInfinity => None,
        }
    }
}

/// One entry of a Voronoi region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionVertex {
    /// Index into the Voronoi vertex list.
    Finite(usize),
    /// The region extends to infinity.
    Infinite,
}

/// The Voronoi region of one site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoronoiRegion {
    site: usize,
    vertices: Vec<RegionVertex>,
}

impl VoronoiRegion {
    /// An empty region for point `site`.
    #[must_use]
    pub const fn new(site: usize) -> Self {
        Self {
            site,
            vertices: Vec::new(),
        }
    }

    /// Point id of the site.
    #[must_use]
    pub const fn site(&self) -> usize {
        self.site
    }

    /// Region vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[RegionVertex] {
        &self.vertices
    }

    /// `true` if the region reaches infinity.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.vertices.contains(&RegionVertex::Infinite)
    }

    /// Appends a vertex. Only the first [`RegionVertex::Infinite`] is kept.
    pub fn push(&mut self, vertex: RegionVertex) {
        if vertex == RegionVertex::Infinite && self.is_unbounded() {
            return;
        }
        self.vertices.push(vertex);
    }
}

/// Voronoi vertices, regions and the point-to-region map of one graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiDiagram {
    /// One vertex per output simplex, in row order.
    pub vertices: Vec<VoronoiVertex>,
    /// One region per hull vertex, in vertex order (ascending site id).
    pub regions: Vec<VoronoiRegion>,
    /// Region index of every input point; `None` for points in no region.
    pub point_regions: Vec<Option<usize>>,
}

impl VoronoiDiagram {
    /// Builds the diagram for the output facets of `graph`.
    #[must_use]
    pub fn build(graph: &FacetGraph, bounded: &BoundedFacets) -> Self {
        let vertices = voronoi_vertices(graph, bounded);
        let (regions, region_of_vertex) = voronoi_regions(graph, bounded);
        let point_regions = point_regions(graph, &regions, &region_of_vertex);
        debug!(
            vertices = vertices.len(),
            regions = regions.len(),
            "built Voronoi diagram"
        );
        Self {
            vertices,
            regions,
            point_regions,
        }
    }
}

// =============================================================================
// CENTERS
// =============================================================================

/// Center of a facet in input space, cached on the facet.
///
/// `None` when the facet touches the point at infinity, has no hyperplane, is
/// an upper Delaunay facet of a graph with a point at infinity, or its
/// circumcenter is undefined.
#[must_use]
pub fn facet_center(graph: &FacetGraph, facet: FacetId) -> Option<&[f64]> {
    let record = graph.facet(facet);
    record.center_or_init(|| {
        if record.hyperplane().is_none()
            || graph.facet_touches_infinity(facet)
            || (record.is_upper_delaunay() && graph.infinity_point().is_some())
        {
            return None;
        }
        let points = graph.facet_input_points(facet);
        match graph.center_type() {
            CenterType::Circumcenter => circumcenter(&points).ok(),
            CenterType::Centrum => Some(centroid(&points)),
        }
    })
}

/// Centers of the output facets, in row order.
#[must_use]
pub fn voronoi_vertices(graph: &FacetGraph, bounded: &BoundedFacets) -> Vec<VoronoiVertex> {
    bounded
        .facets()
        .iter()
        .map(|&facet| {
            facet_center(graph, facet)
                .map_or(VoronoiVertex::AtInfinity, |c| VoronoiVertex::Finite(c.to_vec()))
        })
        .collect()
}

// =============================================================================
// REGIONS
// =============================================================================

/// Orders the facets around `vertex` by walking shared ridges.
///
/// Works for planar Delaunay graphs, where the facets incident to a vertex
/// form a single cycle. A broken cycle resumes at the next unvisited facet.
fn cyclic_order(graph: &FacetGraph, vertex: VertexId, incident: &[FacetId]) -> Vec<FacetId> {
    let mut remaining: FastHashSet<FacetId> = fast_hash_set_with_capacity(incident.len());
    remaining.extend(incident.iter().copied());
    let mut ordered = Vec::with_capacity(incident.len());
    let mut current = incident.first().copied();
    while let Some(facet) = current {
        remaining.remove(&facet);
        ordered.push(facet);
        let record = graph.facet(facet);
        current = record
            .vertices()
            .iter()
            .zip(record.neighbors())
            .filter(|(v, _)| **v != vertex)
            .map(|(_, n)| *n)
            .find(|n| remaining.contains(n))
            .or_else(|| incident.iter().copied().find(|f| remaining.contains(f)));
    }
    ordered
}

/// Signed winding of consecutive finite centers around `site`.
fn winding(site: &[f64], centers: &[Option<&[f64]>]) -> f64 {
    let count = centers.len();
    (0..count)
        .filter_map(|i| Some((centers[i]?, centers[(i + 1) % count]?)))
        .map(|(a, b)| (a[0] - site[0]) * (b[1] - site[1]) - (a[1] - site[1]) * (b[0] - site[0]))
        .sum()
}

/// Regions of every non-infinity vertex, plus the region index of each vertex.
fn voronoi_regions(
    graph: &FacetGraph,
    bounded: &BoundedFacets,
) -> (Vec<VoronoiRegion>, Vec<Option<usize>>) {
    let planar = graph.mode() == HullMode::Delaunay && graph.hull_dim() == 3;
    let mut regions = Vec::with_capacity(graph.vertex_count());
    let mut region_of_vertex = vec![None; graph.vertex_count()];

    for (id, vertex) in graph.vertices() {
        if graph.is_infinity_vertex(id) {
            continue;
        }
        let mut facets = vertex.neighbors().to_vec();
        if planar && facets.len() > 2 {
            facets = cyclic_order(graph, id, &facets);
            let site = graph.input_point(vertex.point());
            let centers: Vec<Option<&[f64]>> = facets
                .iter()
                .map(|&f| bounded.simplex_of(f).and_then(|_| facet_center(graph, f)))
                .collect();
            if winding(site, &centers) < 0.0 {
                facets.reverse();
            }
        }

        let mut region = VoronoiRegion::new(vertex.point());
        for facet in facets {
            region.push(
                bounded
                    .simplex_of(facet)
                    .map_or(RegionVertex::Infinite, RegionVertex::Finite),
            );
        }
        region_of_vertex[id.index()] = Some(regions.len());
        regions.push(region);
    }
    (regions, region_of_vertex)
}

/// Maps every input point to a region.
///
/// Sites map to their own region. A coplanar point maps to the region of the
/// nearest vertex of the facet it was assigned to; when several facets claim
/// the same point, the last one in facet order wins.
fn point_regions(
    graph: &FacetGraph,
    regions: &[VoronoiRegion],
    region_of_vertex: &[Option<usize>],
) -> Vec<Option<usize>> {
    let mut map = vec![None; graph.num_input_points()];
    for (index, region) in regions.iter().enumerate() {
        if let Some(slot) = map.get_mut(region.site()) {
            *slot = Some(index);
        }
    }

    for (_, facet) in graph.facets() {
        for &point in facet.coplanar_points() {
            if point >= map.len() {
                continue;
            }
            let coords = graph.input_point(point);
            let nearest = facet
                .vertices()
                .iter()
                .filter(|&&v| !graph.is_infinity_vertex(v))
                .min_by(|&&a, &&b| {
                    let da = squared_distance(coords, graph.input_point(graph.point_id(a)));
                    let db = squared_distance(coords, graph.input_point(graph.point_id(b)));
                    da.total_cmp(&db)
                });
            let Some(region) = nearest.and_then(|v| region_of_vertex[v.index()]) else {
                continue;
            };
            if region < regions.len() {
                map[point] = Some(region);
            } else {
                debug!(point, region, "coplanar point maps past the region table");
            }
        }
    }
    map
}

// =============================================================================
// TESTS
// =============================================================================
