//! Index-addressed facet graph produced by a hull engine.
//!
//! A [`FacetGraph`] is the complete, read-only result of one hull computation:
//! facets with their vertex lists, orientation flags, neighbor links and
//! hyperplanes, the vertices they reference, and the ridges shared between
//! adjacent facets. Everything is stored in plain vectors and addressed by the
//! integer newtypes [`FacetId`], [`VertexId`] and [`RidgeId`], so traversals
//! keep their own visited sets instead of flagging the graph.
//!
//! # Modes
//!
//! - [`HullMode::ConvexHull`]: the graph is the hull of the input points, hull
//!   dimension equals input dimension.
//! - [`HullMode::Delaunay`]: the graph is the hull of the points lifted onto a
//!   paraboloid in `d + 1` dimensions. Lower facets are Delaunay simplices,
//!   upper facets (`upper_delaunay`) are excluded from every output.
//!
//! # Caches
//!
//! Each facet lazily caches its center and its area in a [`OnceLock`]. The
//! caches are filled the first time a metric or Voronoi pass asks for them
//! and reused by later passes over the same retained context.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::{FacetNeighborBuffer, FacetRidgeBuffer, FacetVertexBuffer};
use crate::geometry::point_set::PointSet;
use crate::geometry::predicates::signed_distance;

// =============================================================================
// IDS
// =============================================================================

macro_rules! graph_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            /// The position of this element in its graph array.
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

graph_id! {
    /// Index of a facet in [`FacetGraph::facets`].
    FacetId
}
graph_id! {
    /// Index of a vertex in [`FacetGraph::vertices`].
    VertexId
}
graph_id! {
    /// Index of a ridge in [`FacetGraph::ridges`].
    RidgeId
}

// =============================================================================
// ENUMS
// =============================================================================

/// What the engine computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HullMode {
    /// Convex hull of the input points.
    #[default]
    ConvexHull,
    /// Delaunay triangulation via the lifted hull.
    Delaunay,
}

/// How facet centers are represented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CenterType {
    /// Circumcenter of the facet's sites (Voronoi vertices).
    Circumcenter,
    /// Vertex centroid of the facet.
    #[default]
    Centrum,
}

/// Orientation flag of a facet's stored vertex order.
///
/// `CounterClockwise` means the stored order is positively oriented: for a
/// Delaunay facet `det[p_1 - p_0; ...; p_d - p_0] > 0` in input space, for a
/// hull facet `det[n; v_1 - v_0; ...] > 0` against the outward normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetOrientation {
    /// Stored vertex order is negatively oriented.
    Clockwise,
    /// Stored vertex order is positively oriented.
    #[default]
    CounterClockwise,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Structural errors detected while assembling a [`FacetGraph`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FacetGraphError {
    /// A facet, vertex or ridge references a facet id that does not exist.
    #[error("{owner} references missing facet {facet} (graph has {count} facets)")]
    DanglingFacet {
        /// Description of the referencing element.
        owner: String,
        /// The missing id.
        facet: usize,
        /// Number of facets in the graph.
        count: usize,
    },
    /// A facet or ridge references a vertex id that does not exist.
    #[error("{owner} references missing vertex {vertex} (graph has {count} vertices)")]
    DanglingVertex {
        /// Description of the referencing element.
        owner: String,
        /// The missing id.
        vertex: usize,
        /// Number of vertices in the graph.
        count: usize,
    },
    /// A facet references a ridge id that does not exist.
    #[error("Facet {facet} references missing ridge {ridge} (graph has {count} ridges)")]
    DanglingRidge {
        /// Referencing facet.
        facet: usize,
        /// The missing id.
        ridge: usize,
        /// Number of ridges in the graph.
        count: usize,
    },
    /// A vertex or coplanar set references a point id outside the point set.
    #[error("Point id {point} is out of range (point set has {count} points)")]
    PointOutOfRange {
        /// The rejected point id.
        point: usize,
        /// Number of hull-space points.
        count: usize,
    },
    /// Graph-level dimensions do not agree.
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch {
        /// Description of the mismatch.
        message: String,
    },
}

// =============================================================================
// HYPERPLANE
// =============================================================================

/// Oriented supporting hyperplane `normal · x + offset = 0` of a facet.
///
/// The unit normal points out of the hull, so points outside have positive
/// distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperplane {
    /// Outward unit normal.
    pub normal: Vec<f64>,
    /// Offset such that `normal · x + offset` is the signed distance.
    pub offset: f64,
}

impl Hyperplane {
    /// Hyperplane with the given normal passing through `point`.
    #[must_use]
    pub fn through(normal: Vec<f64>, point: &[f64]) -> Self {
        let offset = -signed_distance(point, &normal, 0.0);
        Self { normal, offset }
    }

    /// Signed distance of a hull-space point.
    #[inline]
    #[must_use]
    pub fn distance(&self, point: &[f64]) -> f64 {
        signed_distance(point, &self.normal, self.offset)
    }

    /// The last component of the normal, which separates lower from upper
    /// facets of a Delaunay lifting.
    #[must_use]
    pub fn last_component(&self) -> f64 {
        self.normal.last().copied().unwrap_or(0.0)
    }
}

// =============================================================================
// FACET
// =============================================================================

/// One boundary piece of the hull.
///
/// For a simplicial facet, `neighbors[i]` lies across the ridge opposite
/// `vertices[i]`.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::facet_graph::{FacetBuilder, FacetId, FacetOrientation, VertexId};
///
/// let facet = FacetBuilder::default()
///     .vertices(vec![VertexId(0), VertexId(1)])
///     .neighbors(vec![FacetId(1), FacetId(3)])
///     .orientation(FacetOrientation::Clockwise)
///     .build()
///     .unwrap();
/// assert!(facet.is_clockwise());
/// assert!(facet.is_simplicial());
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Facet {
    /// Vertex ids in stored order.
    #[builder(setter(custom))]
    vertices: FacetVertexBuffer,

    /// Orientation flag of the stored order.
    #[builder(default)]
    orientation: FacetOrientation,

    /// Adjacent facets.
    #[builder(setter(custom), default)]
    neighbors: FacetNeighborBuffer,

    /// Ridges bounding this facet.
    #[builder(setter(custom), default)]
    ridges: FacetRidgeBuffer,

    /// Supporting hyperplane, absent when the engine could not compute one.
    #[builder(setter(strip_option), default)]
    hyperplane: Option<Hyperplane>,

    /// Part of the upper envelope of a Delaunay lifting.
    #[builder(default)]
    upper_delaunay: bool,

    /// Whether the facet has exactly `hull_dim` vertices.
    #[builder(default = "true")]
    simplicial: bool,

    /// Non-vertex point ids assigned to this facet.
    #[builder(default)]
    coplanar_points: Vec<usize>,

    #[builder(setter(skip))]
    center: OnceLock<Option<Vec<f64>>>,

    #[builder(setter(skip))]
    area: OnceLock<Option<f64>>,
}

impl FacetBuilder {
    /// Sets the vertex ids in stored order.
    pub fn vertices<I: IntoIterator<Item = VertexId>>(&mut self, vertices: I) -> &mut Self {
        self.vertices = Some(vertices.into_iter().collect());
        self
    }

    /// Sets the neighbor facet ids.
    pub fn neighbors<I: IntoIterator<Item = FacetId>>(&mut self, neighbors: I) -> &mut Self {
        self.neighbors = Some(neighbors.into_iter().collect());
        self
    }

    /// Sets the ridge ids.
    pub fn ridges<I: IntoIterator<Item = RidgeId>>(&mut self, ridges: I) -> &mut Self {
        self.ridges = Some(ridges.into_iter().collect());
        self
    }

    fn validate(&self) -> Result<(), String> {
        let vertex_count = self.vertices.as_ref().map_or(0, smallvec::SmallVec::len);
        if vertex_count == 0 {
            return Err("a facet needs at least one vertex".to_string());
        }
        let simplicial = self.simplicial.unwrap_or(true);
        let neighbor_count = self.neighbors.as_ref().map_or(0, smallvec::SmallVec::len);
        if simplicial && neighbor_count != 0 && neighbor_count != vertex_count {
            return Err(format!(
                "a simplicial facet lists one neighbor per vertex ({vertex_count} vertices, {neighbor_count} neighbors)"
            ));
        }
        Ok(())
    }
}

impl Facet {
    /// Vertex ids in stored order.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Orientation flag of the stored order.
    #[must_use]
    pub const fn orientation(&self) -> FacetOrientation {
        self.orientation
    }

    /// `true` when the stored order is clockwise.
    #[must_use]
    pub fn is_clockwise(&self) -> bool {
        self.orientation == FacetOrientation::Clockwise
    }

    /// Adjacent facets.
    #[must_use]
    pub fn neighbors(&self) -> &[FacetId] {
        &self.neighbors
    }

    /// Ridges bounding this facet.
    #[must_use]
    pub fn ridges(&self) -> &[RidgeId] {
        &self.ridges
    }

    /// Supporting hyperplane, if the engine produced one.
    #[must_use]
    pub const fn hyperplane(&self) -> Option<&Hyperplane> {
        self.hyperplane.as_ref()
    }

    /// Part of the upper Delaunay envelope.
    #[must_use]
    pub const fn is_upper_delaunay(&self) -> bool {
        self.upper_delaunay
    }

    /// Whether the facet has exactly `hull_dim` vertices.
    #[must_use]
    pub const fn is_simplicial(&self) -> bool {
        self.simplicial
    }

    /// Non-vertex point ids assigned to this facet.
    #[must_use]
    pub fn coplanar_points(&self) -> &[usize] {
        &self.coplanar_points
    }

    /// Cached center, computed by `init` on first use. `None` marks a center at infinity.
    pub(crate) fn center_or_init(&self, init: impl FnOnce() -> Option<Vec<f64>>) -> Option<&[f64]> {
        self.center.get_or_init(init).as_deref()
    }

    /// Cached area, computed by `init` on first use.
    pub(crate) fn area_or_init(&self, init: impl FnOnce() -> Option<f64>) -> Option<f64> {
        *self.area.get_or_init(init)
    }

    /// `true` once the area cache has been filled.
    #[must_use]
    pub fn has_cached_area(&self) -> bool {
        self.area.get().is_some()
    }

    pub(crate) fn push_coplanar_point(&mut self, point: usize) {
        self.coplanar_points.push(point);
    }

    pub(crate) fn push_ridge(&mut self, ridge: RidgeId) {
        self.ridges.push(ridge);
    }
}

// =============================================================================
// VERTEX AND RIDGE
// =============================================================================

/// A hull vertex: one input point plus the facets incident to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    point: usize,
    neighbors: Vec<FacetId>,
}

impl Vertex {
    /// Creates a vertex for point `point` with its incident facets.
    #[must_use]
    pub const fn new(point: usize, neighbors: Vec<FacetId>) -> Self {
        Self { point, neighbors }
    }

    /// Point id of this vertex.
    #[must_use]
    pub const fn point(&self) -> usize {
        self.point
    }

    /// Incident facets.
    #[must_use]
    pub fn neighbors(&self) -> &[FacetId] {
        &self.neighbors
    }
}

/// The `(hull_dim - 2)`-face shared by two facets.
///
/// The stored vertex order follows `top`'s own vertex order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ridge {
    vertices: FacetVertexBuffer,
    top: FacetId,
    bottom: FacetId,
}

impl Ridge {
    /// Creates a ridge between `top` and `bottom`.
    #[must_use]
    pub fn new<I: IntoIterator<Item = VertexId>>(vertices: I, top: FacetId, bottom: FacetId) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            top,
            bottom,
        }
    }

    /// Vertex ids in stored order.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// The owner the stored order is oriented for.
    #[must_use]
    pub const fn top(&self) -> FacetId {
        self.top
    }

    /// The other owner.
    #[must_use]
    pub const fn bottom(&self) -> FacetId {
        self.bottom
    }
}

// =============================================================================
// FACET GRAPH
// =============================================================================

/// Everything needed to assemble a [`FacetGraph`].
#[derive(Clone, Debug)]
pub struct FacetGraphParts {
    /// What the engine computed.
    pub mode: HullMode,
    /// How facet centers are represented.
    pub center_type: CenterType,
    /// Hull-space coordinates of every point, lifted in Delaunay mode,
    /// including the point at infinity if there is one.
    pub points: PointSet,
    /// Number of caller-supplied points; ids `0..num_input_points` are input points.
    pub num_input_points: usize,
    /// Id of the engine-added point at infinity.
    pub infinity_point: Option<usize>,
    /// Facets in id order.
    pub facets: Vec<Facet>,
    /// Vertices in id order.
    pub vertices: Vec<Vertex>,
    /// Ridges in id order.
    pub ridges: Vec<Ridge>,
}

/// The facet graph of one hull computation.
#[derive(Clone, Debug)]
pub struct FacetGraph {
    mode: HullMode,
    center_type: CenterType,
    points: PointSet,
    num_input_points: usize,
    infinity_point: Option<usize>,
    facets: Vec<Facet>,
    vertices: Vec<Vertex>,
    ridges: Vec<Ridge>,
}

impl FacetGraph {
    /// Assembles a graph after checking that every id it holds is in range.
    ///
    /// # Errors
    ///
    /// Returns [`FacetGraphError`] for dangling ids, out-of-range point ids or
    /// inconsistent dimensions.
    pub fn from_parts(parts: FacetGraphParts) -> Result<Self, FacetGraphError> {
        let FacetGraphParts {
            mode,
            center_type,
            points,
            num_input_points,
            infinity_point,
            facets,
            vertices,
            ridges,
        } = parts;

        let min_dim = match mode {
            HullMode::ConvexHull => 1,
            HullMode::Delaunay => 2,
        };
        if points.dim() < min_dim {
            return Err(FacetGraphError::DimensionMismatch {
                message: format!("{mode:?} graph needs hull dimension >= {min_dim}, got {}", points.dim()),
            });
        }
        if num_input_points > points.len() {
            return Err(FacetGraphError::PointOutOfRange {
                point: num_input_points,
                count: points.len(),
            });
        }
        if let Some(infinity) = infinity_point
            && (infinity >= points.len() || infinity < num_input_points)
        {
            return Err(FacetGraphError::PointOutOfRange {
                point: infinity,
                count: points.len(),
            });
        }

        let facet_count = facets.len();
        let vertex_count = vertices.len();
        let check_facet = |owner: &dyn Fn() -> String, id: FacetId| {
            if id.index() < facet_count {
                Ok(())
            } else {
                Err(FacetGraphError::DanglingFacet {
                    owner: owner(),
                    facet: id.index(),
                    count: facet_count,
                })
            }
        };
        let check_vertex = |owner: &dyn Fn() -> String, id: VertexId| {
            if id.index() < vertex_count {
                Ok(())
            } else {
                Err(FacetGraphError::DanglingVertex {
                    owner: owner(),
                    vertex: id.index(),
                    count: vertex_count,
                })
            }
        };

        for (index, vertex) in vertices.iter().enumerate() {
            if vertex.point >= points.len() {
                return Err(FacetGraphError::PointOutOfRange {
                    point: vertex.point,
                    count: points.len(),
                });
            }
            for &facet in &vertex.neighbors {
                check_facet(&|| format!("Vertex {index}"), facet)?;
            }
        }
        for (index, facet) in facets.iter().enumerate() {
            for &vertex in &facet.vertices {
                check_vertex(&|| format!("Facet {index}"), vertex)?;
            }
            for &neighbor in &facet.neighbors {
                check_facet(&|| format!("Facet {index}"), neighbor)?;
            }
            for &ridge in &facet.ridges {
                if ridge.index() >= ridges.len() {
                    return Err(FacetGraphError::DanglingRidge {
                        facet: index,
                        ridge: ridge.index(),
                        count: ridges.len(),
                    });
                }
            }
            if let Some(&point) = facet.coplanar_points.iter().find(|&&p| p >= points.len()) {
                return Err(FacetGraphError::PointOutOfRange {
                    point,
                    count: points.len(),
                });
            }
            if let Some(plane) = &facet.hyperplane
                && plane.normal.len() != points.dim()
            {
                return Err(FacetGraphError::DimensionMismatch {
                    message: format!(
                        "facet {index} normal has {} components, hull dimension is {}",
                        plane.normal.len(),
                        points.dim()
                    ),
                });
            }
        }
        for (index, ridge) in ridges.iter().enumerate() {
            check_facet(&|| format!("Ridge {index}"), ridge.top)?;
            check_facet(&|| format!("Ridge {index}"), ridge.bottom)?;
            for &vertex in &ridge.vertices {
                check_vertex(&|| format!("Ridge {index}"), vertex)?;
            }
        }

        Ok(Self {
            mode,
            center_type,
            points,
            num_input_points,
            infinity_point,
            facets,
            vertices,
            ridges,
        })
    }

    /// What the engine computed.
    #[must_use]
    pub const fn mode(&self) -> HullMode {
        self.mode
    }

    /// How facet centers are represented.
    #[must_use]
    pub const fn center_type(&self) -> CenterType {
        self.center_type
    }

    /// Dimension of the hull: `d` for hulls, `d + 1` for Delaunay liftings.
    #[must_use]
    pub const fn hull_dim(&self) -> usize {
        self.points.dim()
    }

    /// Dimension of the caller's points.
    #[must_use]
    pub const fn input_dim(&self) -> usize {
        match self.mode {
            HullMode::ConvexHull => self.points.dim(),
            HullMode::Delaunay => self.points.dim() - 1,
        }
    }

    /// Number of caller-supplied points.
    #[must_use]
    pub const fn num_input_points(&self) -> usize {
        self.num_input_points
    }

    /// Id of the engine-added point at infinity.
    #[must_use]
    pub const fn infinity_point(&self) -> Option<usize> {
        self.infinity_point
    }

    /// Number of facets, upper Delaunay facets included.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// All facets with their ids.
    pub fn facets(&self) -> impl ExactSizeIterator<Item = (FacetId, &Facet)> + '_ {
        self.facets.iter().enumerate().map(|(i, f)| (FacetId(i), f))
    }

    /// Facet by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a facet of this graph.
    #[must_use]
    pub fn facet(&self, id: FacetId) -> &Facet {
        &self.facets[id.index()]
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// All vertices with their ids.
    pub fn vertices(&self) -> impl ExactSizeIterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices.iter().enumerate().map(|(i, v)| (VertexId(i), v))
    }

    /// Vertex by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a vertex of this graph.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Number of ridges.
    #[must_use]
    pub fn ridge_count(&self) -> usize {
        self.ridges.len()
    }

    /// Ridge by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a ridge of this graph.
    #[must_use]
    pub fn ridge(&self, id: RidgeId) -> &Ridge {
        &self.ridges[id.index()]
    }

    /// Point id of a vertex.
    #[must_use]
    pub fn point_id(&self, vertex: VertexId) -> usize {
        self.vertex(vertex).point
    }

    /// `true` if the vertex is the engine's point at infinity.
    #[must_use]
    pub fn is_infinity_vertex(&self, vertex: VertexId) -> bool {
        self.infinity_point == Some(self.point_id(vertex))
    }

    /// `true` if any vertex of the facet is the point at infinity.
    #[must_use]
    pub fn facet_touches_infinity(&self, facet: FacetId) -> bool {
        self.infinity_point.is_some()
            && self
                .facet(facet)
                .vertices()
                .iter()
                .any(|&v| self.is_infinity_vertex(v))
    }

    /// Hull-space coordinates of a point.
    #[must_use]
    pub fn hull_point(&self, point: usize) -> &[f64] {
        self.points.point(point)
    }

    /// Input-space coordinates of a point (the lifted coordinate dropped).
    #[must_use]
    pub fn input_point(&self, point: usize) -> &[f64] {
        &self.points.point(point)[..self.input_dim()]
    }

    /// Input-space coordinates of a facet's vertices, in stored order.
    #[must_use]
    pub fn facet_input_points(&self, facet: FacetId) -> Vec<&[f64]> {
        self.facet(facet)
            .vertices()
            .iter()
            .map(|&v| self.input_point(self.point_id(v)))
            .collect()
    }

    /// Hull-space coordinates of a facet's vertices, in stored order.
    #[must_use]
    pub fn facet_hull_points(&self, facet: FacetId) -> Vec<&[f64]> {
        self.facet(facet)
            .vertices()
            .iter()
            .map(|&v| self.hull_point(self.point_id(v)))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built graphs for exercising extraction paths the engine never produces.

    use super::*;

    /// Hull of the unit square with explicit orientation flags.
    ///
    /// Facets are the four edges in counter-clockwise traversal order:
    /// bottom, right, top, left.
    pub(crate) fn unit_square_hull() -> FacetGraph {
        let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
            .expect("valid square");
        let edges = [
            ([0, 1], [0.0, -1.0], 0.0),
            ([1, 2], [1.0, 0.0], -1.0),
            ([2, 3], [0.0, 1.0], -1.0),
            ([3, 0], [-1.0, 0.0], 0.0),
        ];
        let facets = edges
            .iter()
            .enumerate()
            .map(|(i, (vs, normal, offset))| {
                FacetBuilder::default()
                    .vertices(vs.iter().map(|&v| VertexId(v)))
                    // neighbor opposite vertex 0 shares vertex 1, i.e. the next edge
                    .neighbors([FacetId((i + 1) % 4), FacetId((i + 3) % 4)])
                    .hyperplane(Hyperplane {
                        normal: normal.to_vec(),
                        offset: *offset,
                    })
                    .build()
                    .expect("valid facet")
            })
            .collect();
        let vertices = (0..4)
            .map(|v| Vertex::new(v, vec![FacetId((v + 3) % 4), FacetId(v)]))
            .collect();
        FacetGraph::from_parts(FacetGraphParts {
            mode: HullMode::ConvexHull,
            center_type: CenterType::Centrum,
            points,
            num_input_points: 4,
            infinity_point: None,
            facets,
            vertices,
            ridges: Vec::new(),
        })
        .expect("valid graph")
    }
}
