//! Built-in beneath-beyond hull engine.
//!
//! [`IncrementalHullEngine`] builds the convex hull of a point set in any
//! dimension by inserting points one at a time. Each insertion deletes the
//! facets visible from the new point and cones the horizon ridges to it, the
//! same cavity scheme a Bowyer-Watson insertion uses for cells. Delaunay mode
//! lifts every point onto the paraboloid `z = |x|²` first and, with `Qz`,
//! adds a point at infinity above the centroid so that cospherical inputs
//! still span the lifted space.
//!
//! The working facets live in a slot map while points are inserted. Once all
//! points are in, they are compacted into a [`FacetGraph`] with integer ids,
//! explicit ridges, orientation flags and coplanar point sets.
//!
//! # Numerical model
//!
//! Distances are plain `f64`. A point is beyond a facet when its distance
//! exceeds `dist_round`, the rounding bound derived from the coordinate
//! magnitudes. Points that would create a degenerate facet are left out of the
//! hull and assigned to a coplanar set instead.

use slotmap::new_key_type;
use tracing::{debug, trace, warn};

use crate::core::collections::{
    Entry, FastHashMap, FastHashSet, MAX_PRACTICAL_DIMENSION_SIZE, SimplexPointBuffer,
    SmallBuffer, StorageMap, fast_hash_map_with_capacity,
};
use crate::core::engine::{EngineError, EngineOptions, EngineOutput, HullEngine, Tolerances};
use crate::core::facet_graph::{
    Facet, FacetBuilder, FacetGraph, FacetGraphParts, FacetId, FacetOrientation, HullMode,
    Hyperplane, Ridge, RidgeId, Vertex, VertexId,
};
use crate::geometry::matrix::{dot, hyperplane_normal};
use crate::geometry::measures::{centroid, usize_as_f64};
use crate::geometry::point_set::PointSet;
use crate::geometry::predicates::{Orientation, facet_orientation, simplex_orientation};

/// Multiple of `dist_round` below which a candidate vertex is considered to
/// lie in the affine hull of the initial simplex.
const FLAT_SIMPLEX_FACTOR: f64 = 10.0;

/// Multiple of the angle rounding error a lifted normal must point down by
/// for its facet to count as a lower Delaunay facet.
const ZERO_DELAUNAY_FACTOR: f64 = 2.0;

new_key_type! {
    /// Key of a facet in the engine's working store.
    struct WorkKey;
}

/// A facet while the hull is under construction.
///
/// `neighbors[i]` lies across the ridge opposite `vertices[i]`.
#[derive(Clone, Debug)]
struct WorkFacet {
    vertices: SimplexPointBuffer,
    neighbors: SmallBuffer<WorkKey, MAX_PRACTICAL_DIMENSION_SIZE>,
    plane: Hyperplane,
}

/// A facet about to be created for a horizon ridge.
struct ConeFacet {
    vertices: SimplexPointBuffer,
    plane: Hyperplane,
    apex_slot: usize,
    outside: WorkKey,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Incremental d-dimensional convex hull engine with Delaunay lifting.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::algorithms::incremental_hull::IncrementalHullEngine;
/// use hullgraph::core::engine::{EngineOptions, HullEngine};
/// use hullgraph::geometry::point_set::PointSet;
///
/// let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
/// let mut engine = IncrementalHullEngine::new();
/// let output = engine.compute(&points, &EngineOptions::default()).unwrap();
/// assert_eq!(output.graph.facet_count(), 4);
/// engine.release(output.graph);
/// assert_eq!(engine.live_graphs(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct IncrementalHullEngine {
    live_graphs: usize,
}

impl IncrementalHullEngine {
    /// Creates an engine with no outstanding graphs.
    #[must_use]
    pub const fn new() -> Self {
        Self { live_graphs: 0 }
    }

    /// Graphs computed and not yet released.
    #[must_use]
    pub const fn live_graphs(&self) -> usize {
        self.live_graphs
    }
}

/// Requested option tokens that [`IncrementalHullEngine`] satisfies without
/// acting on them: its facets are always simplicial, never merged, and always
/// carry their neighbors.
#[must_use]
pub fn implied_tokens(options: &EngineOptions) -> SmallBuffer<&'static str, 4> {
    [
        (options.triangulate, "Qt"),
        (options.exact_pre_merges, "Qx"),
        (options.neighbors_output, "Fn"),
    ]
    .into_iter()
    .filter_map(|(on, token)| on.then_some(token))
    .collect()
}

impl HullEngine for IncrementalHullEngine {
    fn compute(
        &mut self,
        points: &PointSet,
        options: &EngineOptions,
    ) -> Result<EngineOutput, EngineError> {
        let input = HullInput::new(points, options);
        debug!(
            points = points.len(),
            hull_dim = input.points.dim(),
            options = %options,
            "computing hull"
        );
        let implied = implied_tokens(options);
        if !implied.is_empty() {
            debug!(tokens = ?implied, "options implied by the built-in engine");
        }

        let mut builder = HullBuilder::new(&input.points, options);
        let simplex = builder.initial_simplex()?;
        builder.seed(&simplex)?;
        for point in 0..input.points.len() {
            if !builder.is_vertex[point] {
                builder.insert(point);
            }
        }
        let finished = builder.finish(&input, options)?;

        let graph = FacetGraph::from_parts(FacetGraphParts {
            mode: options.mode(),
            center_type: options.center_type(),
            points: input.points,
            num_input_points: input.num_input_points,
            infinity_point: input.infinity_point,
            facets: finished.facets,
            vertices: finished.vertices,
            ridges: finished.ridges,
        })?;
        debug!(
            facets = graph.facet_count(),
            vertices = graph.vertex_count(),
            dist_round = finished.tolerances.dist_round,
            "hull complete"
        );
        self.live_graphs += 1;
        Ok(EngineOutput {
            graph,
            tolerances: finished.tolerances,
        })
    }

    fn release(&mut self, graph: FacetGraph) {
        self.live_graphs = self.live_graphs.saturating_sub(1);
        debug!(facets = graph.facet_count(), "released facet graph");
    }
}

// =============================================================================
// INPUT PREPARATION
// =============================================================================

/// Hull-space points: the input itself, or its lifting plus the point at infinity.
struct HullInput {
    points: PointSet,
    num_input_points: usize,
    infinity_point: Option<usize>,
}

impl HullInput {
    fn new(points: &PointSet, options: &EngineOptions) -> Self {
        if options.mode() == HullMode::ConvexHull {
            return Self {
                points: points.clone(),
                num_input_points: points.len(),
                infinity_point: None,
            };
        }

        let mut lifted: Vec<f64> = points.iter().map(|p| dot(p, p)).collect();
        if options.scale_last {
            let (low, high) = min_max(&lifted);
            let target = points.max_abs_coordinate();
            let span = high - low;
            for z in &mut lifted {
                *z = if span > 0.0 { (*z - low) * target / span } else { 0.0 };
            }
        }

        let mut hull_points = PointSet::empty(points.dim() + 1);
        let mut row = Vec::with_capacity(points.dim() + 1);
        for (p, &z) in points.iter().zip(&lifted) {
            row.clear();
            row.extend_from_slice(p);
            row.push(z);
            hull_points.push(&row);
        }

        // Every lower facet's plane passes below the mean lifted height at the
        // centroid, so any height above the maximum keeps the lower hull intact.
        let infinity_point = options.point_at_infinity.then(|| {
            let (low, high) = min_max(&lifted);
            let margin = (high - low).max(points.max_abs_coordinate());
            let margin = if margin > 0.0 { margin } else { 1.0 };
            let mut apex = centroid(&points.iter().collect::<Vec<_>>());
            apex.push(high + margin);
            hull_points.push(&apex);
            points.len()
        });

        Self {
            points: hull_points,
            num_input_points: points.len(),
            infinity_point,
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Rounding bound for point-to-hyperplane distances.
fn distance_rounding(points: &PointSet) -> f64 {
    let dim = usize_as_f64(points.dim());
    let max_abs = points.max_abs_coordinate();
    let max_dist_sum = (dim.sqrt() * max_abs).min(points.max_abs_sum());
    f64::EPSILON * dim.mul_add(max_dist_sum * 1.01, max_abs)
}

// =============================================================================
// BUILDER
// =============================================================================

struct FinishedHull {
    facets: Vec<Facet>,
    vertices: Vec<Vertex>,
    ridges: Vec<Ridge>,
    tolerances: Tolerances,
}

struct HullBuilder<'a> {
    points: &'a PointSet,
    dim: usize,
    dist_round: f64,
    interior: Vec<f64>,
    facets: StorageMap<WorkKey, WorkFacet>,
    is_vertex: Vec<bool>,
    quiet: bool,
    trace_level: u8,
}

impl<'a> HullBuilder<'a> {
    fn new(points: &'a PointSet, options: &EngineOptions) -> Self {
        Self {
            points,
            dim: points.dim(),
            dist_round: distance_rounding(points),
            interior: Vec::new(),
            facets: StorageMap::with_key(),
            is_vertex: vec![false; points.len()],
            quiet: options.suppress_precision_warnings,
            trace_level: options.trace_level,
        }
    }

    /// Greedy full-dimensional simplex: the point with the smallest first
    /// coordinate, then repeatedly the point farthest from the current affine hull.
    fn initial_simplex(&self) -> Result<SimplexPointBuffer, EngineError> {
        let required = self.dim + 1;
        let count = self.points.len();
        if count < required {
            return Err(EngineError::TooFewPoints {
                points: count,
                required,
                dimension: self.dim,
            });
        }

        let first = (0..count)
            .min_by(|&a, &b| self.points.point(a)[0].total_cmp(&self.points.point(b)[0]))
            .unwrap_or(0);
        let origin = self.points.point(first);
        let threshold = FLAT_SIMPLEX_FACTOR * self.dist_round;

        let mut simplex = SimplexPointBuffer::new();
        simplex.push(first);
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(self.dim);
        while simplex.len() < required {
            let mut best: Option<(usize, Vec<f64>, f64)> = None;
            for id in (0..count).filter(|id| !simplex.contains(id)) {
                let residual = residual(self.points.point(id), origin, &basis);
                let norm = dot(&residual, &residual).sqrt();
                if best.as_ref().is_none_or(|(_, _, b)| norm > *b) {
                    best = Some((id, residual, norm));
                }
            }
            match best {
                Some((id, mut residual, norm)) if norm > threshold => {
                    for c in &mut residual {
                        *c /= norm;
                    }
                    simplex.push(id);
                    basis.push(residual);
                }
                _ => {
                    return Err(EngineError::FlatInput {
                        rank: simplex.len() - 1,
                        dimension: self.dim,
                    });
                }
            }
        }
        trace!(?simplex, "initial simplex");
        Ok(simplex)
    }

    /// Oriented hyperplane through `vertices`, or `None` if the facet would be degenerate.
    fn make_plane(&self, vertices: &[usize]) -> Option<Hyperplane> {
        let coords: Vec<&[f64]> = vertices.iter().map(|&v| self.points.point(v)).collect();
        let normal = hyperplane_normal(&coords)?;
        let mut plane = Hyperplane::through(normal, coords[0]);
        let interior = plane.distance(&self.interior);
        if interior.abs() <= self.dist_round {
            return None;
        }
        if interior > 0.0 {
            for c in &mut plane.normal {
                *c = -*c;
            }
            plane.offset = -plane.offset;
        }
        Some(plane)
    }

    fn seed(&mut self, simplex: &[usize]) -> Result<(), EngineError> {
        let coords: Vec<&[f64]> = simplex.iter().map(|&id| self.points.point(id)).collect();
        self.interior = centroid(&coords);

        let mut keys: SmallBuffer<WorkKey, MAX_PRACTICAL_DIMENSION_SIZE> = SmallBuffer::new();
        for skip in 0..simplex.len() {
            let vertices: SimplexPointBuffer = simplex
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &v)| v)
                .collect();
            let plane = self.make_plane(&vertices).ok_or(EngineError::FlatInput {
                rank: self.dim - 1,
                dimension: self.dim,
            })?;
            keys.push(self.facets.insert(WorkFacet {
                vertices,
                neighbors: SmallBuffer::new(),
                plane,
            }));
        }
        // Facet `skip` shares the ridge opposite simplex vertex `k` with facet `k`.
        for (skip, &key) in keys.iter().enumerate() {
            self.facets[key].neighbors = (0..keys.len())
                .filter(|&k| k != skip)
                .map(|k| keys[k])
                .collect();
        }
        for &id in simplex {
            self.is_vertex[id] = true;
        }
        Ok(())
    }

    fn report_skip(&self, point: usize, reason: &str) {
        if self.quiet {
            debug!(point, reason, "point left out of the hull");
        } else {
            warn!(point, reason, "point left out of the hull");
        }
    }

    /// Adds `point` to the hull. Returns `false` if the point is inside, on the
    /// boundary, or would produce a degenerate facet; the hull is unchanged then.
    fn insert(&mut self, point: usize) -> bool {
        let coords = self.points.point(point);
        let visible: Vec<WorkKey> = self
            .facets
            .iter()
            .filter(|(_, f)| f.plane.distance(coords) > self.dist_round)
            .map(|(k, _)| k)
            .collect();
        if visible.is_empty() {
            return false;
        }
        let visible_set: FastHashSet<WorkKey> = visible.iter().copied().collect();

        let mut cone = Vec::new();
        for &key in &visible {
            let facet = &self.facets[key];
            for (slot, &outside) in facet.neighbors.iter().enumerate() {
                if visible_set.contains(&outside) {
                    continue;
                }
                let mut vertices = facet.vertices.clone();
                vertices[slot] = point;
                let Some(plane) = self.make_plane(&vertices) else {
                    self.report_skip(point, "degenerate cone facet");
                    return false;
                };
                cone.push(ConeFacet {
                    vertices,
                    plane,
                    apex_slot: slot,
                    outside,
                });
            }
        }

        // Pair the cone facets across the sub-ridges that contain the new point.
        let mut links: Vec<SmallBuffer<Option<usize>, MAX_PRACTICAL_DIMENSION_SIZE>> = cone
            .iter()
            .map(|c| SmallBuffer::from_elem(None, c.vertices.len()))
            .collect();
        let mut pending: FastHashMap<SimplexPointBuffer, (usize, usize)> =
            fast_hash_map_with_capacity(cone.len() * self.dim);
        for (i, facet) in cone.iter().enumerate() {
            for slot in (0..facet.vertices.len()).filter(|&s| s != facet.apex_slot) {
                let mut key = without_slot(&facet.vertices, slot);
                key.sort_unstable();
                match pending.entry(key) {
                    Entry::Occupied(entry) => {
                        let (j, other_slot) = entry.remove();
                        links[i][slot] = Some(j);
                        links[j][other_slot] = Some(i);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert((i, slot));
                    }
                }
            }
        }
        if !pending.is_empty() {
            self.report_skip(point, "horizon is not closed");
            return false;
        }

        for key in &visible {
            self.facets.remove(*key);
        }
        let mut placed = Vec::with_capacity(cone.len());
        let mut new_keys = Vec::with_capacity(cone.len());
        for facet in cone {
            placed.push((facet.apex_slot, facet.outside));
            new_keys.push(self.facets.insert(WorkFacet {
                vertices: facet.vertices,
                neighbors: SmallBuffer::new(),
                plane: facet.plane,
            }));
        }
        for (i, &key) in new_keys.iter().enumerate() {
            let (apex_slot, outside) = placed[i];
            self.facets[key].neighbors = links[i]
                .iter()
                .map(|link| link.map_or(outside, |j| new_keys[j]))
                .collect();

            let ridge = without_slot(&self.facets[key].vertices, apex_slot);
            let outside_facet = &mut self.facets[outside];
            if let Some(slot) = outside_facet.vertices.iter().position(|v| !ridge.contains(v)) {
                outside_facet.neighbors[slot] = key;
            }
        }

        self.is_vertex[point] = true;
        if self.trace_level > 0 {
            trace!(
                point,
                removed = visible.len(),
                created = new_keys.len(),
                "inserted point"
            );
        }
        true
    }

    /// Compacts the working store into graph arrays.
    fn finish(
        self,
        input: &HullInput,
        options: &EngineOptions,
    ) -> Result<FinishedHull, EngineError> {
        let mode = options.mode();
        let hull_dim = self.dim;

        let mut facet_ids: FastHashMap<WorkKey, FacetId> =
            fast_hash_map_with_capacity(self.facets.len());
        for (index, (key, _)) in self.facets.iter().enumerate() {
            facet_ids.insert(key, FacetId(index));
        }
        let mut vertex_ids: Vec<Option<VertexId>> = vec![None; self.points.len()];
        let mut vertex_points = Vec::new();
        for (point, _) in self.is_vertex.iter().enumerate().filter(|(_, v)| **v) {
            vertex_ids[point] = Some(VertexId(vertex_points.len()));
            vertex_points.push(point);
        }
        let vertex_of = |point: usize| {
            vertex_ids[point].ok_or_else(|| EngineError::Topology {
                message: format!("facet references point {point} that is not a hull vertex"),
            })
        };
        let facet_of = |key: WorkKey| {
            facet_ids.get(&key).copied().ok_or_else(|| EngineError::Topology {
                message: "facet references a deleted neighbor".to_string(),
            })
        };

        let angle_round = f64::EPSILON * usize_as_f64(hull_dim + 1);
        let mut facets = Vec::with_capacity(self.facets.len());
        let mut ridges = Vec::new();
        let mut min_vertex = 0.0_f64;
        for (key, work) in &self.facets {
            let id = facet_of(key)?;
            let mut neighbors = Vec::with_capacity(work.neighbors.len());
            for (slot, &neighbor) in work.neighbors.iter().enumerate() {
                let other = facet_of(neighbor)?;
                if !self.facets[neighbor].neighbors.contains(&key) {
                    return Err(EngineError::Topology {
                        message: format!("adjacency of {id} and {other} is not symmetric"),
                    });
                }
                neighbors.push(other);
                if id < other {
                    let vertices = without_slot(&work.vertices, slot)
                        .into_iter()
                        .map(vertex_of)
                        .collect::<Result<Vec<_>, _>>()?;
                    ridges.push(Ridge::new(vertices, id, other));
                }
            }
            let vertices = work
                .vertices
                .iter()
                .map(|&p| vertex_of(p))
                .collect::<Result<Vec<_>, _>>()?;

            for &p in &work.vertices {
                min_vertex = min_vertex.min(work.plane.distance(self.points.point(p)));
            }

            let touches_infinity = input
                .infinity_point
                .is_some_and(|inf| work.vertices.contains(&inf));
            let upper_delaunay = mode == HullMode::Delaunay
                && (touches_infinity
                    || work.plane.last_component() >= -ZERO_DELAUNAY_FACTOR * angle_round);
            let orientation = self.orientation_of(work, mode);

            let facet = FacetBuilder::default()
                .vertices(vertices)
                .neighbors(neighbors)
                .orientation(orientation)
                .hyperplane(work.plane.clone())
                .upper_delaunay(upper_delaunay)
                .simplicial(true)
                .build()
                .map_err(|e| EngineError::Topology {
                    message: e.to_string(),
                })?;
            facets.push(facet);
        }

        for (index, ridge) in ridges.iter().enumerate() {
            facets[ridge.top().index()].push_ridge(RidgeId(index));
            facets[ridge.bottom().index()].push_ridge(RidgeId(index));
        }

        self.assign_coplanar_points(&mut facets, input, options);

        let mut incident: Vec<Vec<FacetId>> = vec![Vec::new(); vertex_points.len()];
        for (index, facet) in facets.iter().enumerate() {
            for &v in facet.vertices() {
                incident[v.index()].push(FacetId(index));
            }
        }
        let vertices = vertex_points
            .into_iter()
            .zip(incident)
            .map(|(point, neighbors)| Vertex::new(point, neighbors))
            .collect();

        Ok(FinishedHull {
            facets,
            vertices,
            ridges,
            tolerances: Tolerances {
                min_vertex,
                dist_round: self.dist_round,
            },
        })
    }

    fn orientation_of(&self, work: &WorkFacet, mode: HullMode) -> FacetOrientation {
        let orientation = match mode {
            HullMode::Delaunay => {
                let input_dim = self.dim - 1;
                let coords: Vec<&[f64]> = work
                    .vertices
                    .iter()
                    .map(|&p| &self.points.point(p)[..input_dim])
                    .collect();
                simplex_orientation(&coords)
            }
            HullMode::ConvexHull => {
                let coords: Vec<&[f64]> =
                    work.vertices.iter().map(|&p| self.points.point(p)).collect();
                facet_orientation(&coords, &work.plane.normal)
            }
        };
        match orientation {
            Orientation::NEGATIVE => FacetOrientation::Clockwise,
            Orientation::POSITIVE | Orientation::DEGENERATE => FacetOrientation::CounterClockwise,
        }
    }

    /// Files every input point that did not become a vertex with its best facet.
    ///
    /// Delaunay graphs keep them all, on lower facets. Hull graphs keep only
    /// points within the coplanar band, and only with `Qc`.
    fn assign_coplanar_points(
        &self,
        facets: &mut [Facet],
        input: &HullInput,
        options: &EngineOptions,
    ) {
        let delaunay = options.mode() == HullMode::Delaunay;
        if !delaunay && !options.keep_coplanar {
            return;
        }
        for point in (0..input.num_input_points).filter(|&p| !self.is_vertex[p]) {
            let coords = self.points.point(point);
            let best = facets
                .iter()
                .enumerate()
                .filter(|(_, f)| !(delaunay && f.is_upper_delaunay()))
                .filter_map(|(i, f)| f.hyperplane().map(|h| (i, h.distance(coords))))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            match best {
                Some((index, distance)) if delaunay || distance >= -2.0 * self.dist_round => {
                    trace!(point, facet = index, distance, "coplanar point");
                    facets[index].push_coplanar_point(point);
                }
                _ => {}
            }
        }
    }
}

/// Component of `point - origin` orthogonal to the orthonormal `basis`.
fn residual(point: &[f64], origin: &[f64], basis: &[Vec<f64>]) -> Vec<f64> {
    let mut v: Vec<f64> = point.iter().zip(origin).map(|(p, o)| p - o).collect();
    for b in basis {
        let projection = dot(&v, b);
        for (c, bc) in v.iter_mut().zip(b) {
            *c -= projection * bc;
        }
    }
    v
}

fn without_slot(vertices: &[usize], slot: usize) -> SimplexPointBuffer {
    vertices
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != slot)
        .map(|(_, &v)| v)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
