//! Public hull operations.
//!
//! Each operation validates its input, runs the engine through a
//! [`HullSession`], extracts its tables from the facet graph, and either
//! releases the graph or hands it back inside a [`HullContext`] for later
//! containment queries.
//!
//! # Degenerate input
//!
//! When the engine fails on exactly `d + 1` points (for example three
//! collinear points in the plane), the operation returns empty tables with
//! [`OutputStatus::Degenerate`] instead of an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::algorithms::alpha_shape::{SimplexGrid, alpha_filter};
use crate::core::algorithms::containment::{
    ContainmentRule, contains_point, find_simplex as locate, locate_simplex,
};
use crate::core::algorithms::metrics::{circumradii, extract_areas, simplex_points};
use crate::core::algorithms::neighbors::{Neighbor, extract_neighbors};
use crate::core::algorithms::triangulation::{
    BoundedFacets, ExtractionError, FacetMatrix, SimplexTable, extract_simplices,
};
use crate::core::algorithms::voronoi::{VoronoiDiagram, VoronoiRegion, VoronoiVertex};
use crate::core::context::{HullContext, HullSession};
use crate::core::engine::{EngineError, EngineOptions, HullEngine};
use crate::core::facet_graph::{FacetGraph, HullMode};
use crate::geometry::point_set::{InputValidationError, PointSet};

// =============================================================================
// OPTIONS
// =============================================================================

/// Engine options always prepended for a convex hull.
pub const HULL_OPTIONS: &str = "";
/// Engine options always prepended for a Delaunay triangulation.
pub const DELAUNAY_OPTIONS: &str = "d Qbb Qz T0 Fn";
/// Engine options always prepended for a Voronoi diagram.
pub const VORONOI_OPTIONS: &str = "v Qbb Qz T0 Fn";
/// Input dimension from which `Qx` is appended.
pub const EXACT_PRE_MERGE_DIMENSION: usize = 5;

/// Combines a fixed option prefix with caller options for `dim`-dimensional input.
///
/// # Errors
///
/// Returns [`InputValidationError::OptionsTooLong`] if the caller's options
/// exceed [`EngineOptions::MAX_LEN`].
pub fn compose_options(
    prefix: &str,
    options: &str,
    dim: usize,
) -> Result<EngineOptions, InputValidationError> {
    if options.len() > EngineOptions::MAX_LEN {
        return Err(InputValidationError::OptionsTooLong {
            len: options.len(),
            max: EngineOptions::MAX_LEN,
        });
    }
    let exact = (dim >= EXACT_PRE_MERGE_DIMENSION).then_some("Qx");
    Ok(EngineOptions::from_tokens(
        prefix
            .split_whitespace()
            .chain(options.split_whitespace())
            .chain(exact),
    ))
}

// =============================================================================
// STATUS AND ERRORS
// =============================================================================

/// How an operation finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStatus {
    /// Tables were extracted from a facet graph.
    #[default]
    Success,
    /// The engine failed on minimal input; tables are empty.
    Degenerate,
}

/// Process-style exit code of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Failure with an error.
    Failure = 1,
    /// Degenerate input with empty output.
    Degenerate = 2,
}

impl From<OutputStatus> for ExitCode {
    fn from(status: OutputStatus) -> Self {
        match status {
            OutputStatus::Success => Self::Success,
            OutputStatus::Degenerate => Self::Degenerate,
        }
    }
}

/// Any failure of a public operation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HullError {
    /// The caller's input was rejected before the engine ran.
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),
    /// The engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Tables could not be extracted from the facet graph.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl HullError {
    /// Exit code of a failed operation.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        ExitCode::Failure
    }
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Result of [`convex_hull`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvexHullOutput {
    /// How the operation finished.
    pub status: OutputStatus,
    /// One row of point ids per hull facet.
    pub facets: FacetMatrix,
    /// Measure of each facet: area in 3-D, length in 2-D.
    pub areas: Vec<Option<f64>>,
}

/// Result of [`delaunay`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelaunayOutput {
    /// How the operation finished.
    pub status: OutputStatus,
    /// One row of `d + 1` point ids per simplex.
    pub simplices: SimplexTable,
    /// Neighbor list of each simplex.
    pub neighbors: Vec<Vec<Neighbor>>,
    /// Volume of each simplex in input space.
    ///
    /// This is not the area of the lifted facet on the paraboloid, which is
    /// always larger for a non-degenerate simplex.
    pub areas: Vec<Option<f64>>,
    /// Coordinates of each simplex's first site.
    pub simplex_points: PointSet,
}

/// Result of [`voronoi`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiOutput {
    /// How the operation finished.
    pub status: OutputStatus,
    /// One Voronoi vertex per Delaunay simplex.
    pub vertices: Vec<VoronoiVertex>,
    /// Distance from each simplex's first site to its Voronoi vertex.
    pub circumradii: Vec<f64>,
    /// The Delaunay simplices.
    pub simplices: SimplexTable,
    /// Neighbor list of each simplex.
    pub neighbors: Vec<Vec<Neighbor>>,
    /// Coordinates of each simplex's first site.
    pub simplex_points: PointSet,
    /// Region of each site.
    pub regions: Vec<VoronoiRegion>,
    /// Region index of each input point.
    pub point_regions: Vec<Option<usize>>,
}

impl ConvexHullOutput {
    fn degenerate(dim: usize) -> Self {
        Self {
            status: OutputStatus::Degenerate,
            facets: FacetMatrix::with_rows(0, dim),
            areas: Vec::new(),
        }
    }

    fn extract(graph: &FacetGraph, bounded: &BoundedFacets) -> Result<Self, ExtractionError> {
        Ok(Self {
            status: OutputStatus::Success,
            facets: extract_simplices(graph, bounded)?,
            areas: extract_areas(graph, bounded),
        })
    }

    /// Exit code for this output.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.status.into()
    }
}

impl DelaunayOutput {
    fn degenerate(dim: usize) -> Self {
        Self {
            status: OutputStatus::Degenerate,
            simplices: SimplexTable::with_rows(0, dim + 1),
            neighbors: Vec::new(),
            areas: Vec::new(),
            simplex_points: PointSet::empty(dim),
        }
    }

    fn extract(graph: &FacetGraph, bounded: &BoundedFacets) -> Result<Self, ExtractionError> {
        let simplices = extract_simplices(graph, bounded)?;
        Ok(Self {
            status: OutputStatus::Success,
            neighbors: extract_neighbors(graph, bounded),
            areas: extract_areas(graph, bounded),
            simplex_points: simplex_points(graph, &simplices),
            simplices,
        })
    }

    /// Exit code for this output.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.status.into()
    }
}

impl VoronoiOutput {
    fn degenerate(dim: usize) -> Self {
        Self {
            status: OutputStatus::Degenerate,
            vertices: Vec::new(),
            circumradii: Vec::new(),
            simplices: SimplexTable::with_rows(0, dim + 1),
            neighbors: Vec::new(),
            simplex_points: PointSet::empty(dim),
            regions: Vec::new(),
            point_regions: Vec::new(),
        }
    }

    fn extract(graph: &FacetGraph, bounded: &BoundedFacets) -> Result<Self, ExtractionError> {
        let simplices = extract_simplices(graph, bounded)?;
        let diagram = VoronoiDiagram::build(graph, bounded);
        Ok(Self {
            status: OutputStatus::Success,
            circumradii: circumradii(graph, &simplices, &diagram.vertices)?,
            neighbors: extract_neighbors(graph, bounded),
            simplex_points: simplex_points(graph, &simplices),
            simplices,
            vertices: diagram.vertices,
            regions: diagram.regions,
            point_regions: diagram.point_regions,
        })
    }

    /// Exit code for this output.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.status.into()
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

fn validate_points(points: &PointSet) -> Result<(), InputValidationError> {
    if points.dim() < 2 {
        return Err(InputValidationError::InvalidDimension {
            dimension: points.dim(),
            reason: "hull operations need at least two dimensions",
        });
    }
    points.require_full_dimensional()
}

/// Validates, composes options and opens a context.
///
/// `Ok(None)` marks degenerate minimal input.
fn open_context<'s, E: HullEngine>(
    session: &'s mut HullSession<E>,
    points: &PointSet,
    prefix: &str,
    options: &str,
) -> Result<Option<HullContext<'s, E>>, HullError> {
    validate_points(points)?;
    let engine_options = compose_options(prefix, options, points.dim())?;
    debug!(options = %engine_options, points = points.len(), "running hull operation");
    match session.open(points, &engine_options) {
        Ok(context) => Ok(Some(context)),
        Err(error) if points.len() == points.dim() + 1 => {
            warn!(%error, "engine failed on minimal input, returning empty output");
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

/// Convex hull facets of `points`, retaining the graph for containment queries.
///
/// The context is `None` for degenerate input.
///
/// # Errors
///
/// Returns [`HullError`] for invalid input, engine failures on non-minimal
/// input, or extraction failures. The graph is released on every error path.
pub fn convex_hull_retained<'s, E: HullEngine>(
    session: &'s mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<(ConvexHullOutput, Option<HullContext<'s, E>>), HullError> {
    let Some(context) = open_context(session, points, HULL_OPTIONS, options)? else {
        return Ok((ConvexHullOutput::degenerate(points.dim()), None));
    };
    let output = ConvexHullOutput::extract(context.graph(), context.bounded())?;
    Ok((output, Some(context)))
}

/// Convex hull facets of `points`.
///
/// Each row lists the point ids of one facet, counter-clockwise as seen from
/// outside the hull.
///
/// # Errors
///
/// See [`convex_hull_retained`].
///
/// # Examples
///
/// ```rust
/// use hullgraph::prelude::*;
///
/// let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.2, 0.2]]).unwrap();
/// let mut session = HullSession::new(IncrementalHullEngine::new());
/// let hull = convex_hull(&mut session, &points, "").unwrap();
/// assert_eq!(hull.facets.len(), 3);
/// assert_eq!(session.releases(), 1);
/// ```
pub fn convex_hull<E: HullEngine>(
    session: &mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<ConvexHullOutput, HullError> {
    convex_hull_retained(session, points, options).map(|(output, _)| output)
}

/// Delaunay triangulation of `points`, retaining the graph.
///
/// # Errors
///
/// See [`convex_hull_retained`].
pub fn delaunay_retained<'s, E: HullEngine>(
    session: &'s mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<(DelaunayOutput, Option<HullContext<'s, E>>), HullError> {
    let Some(context) = open_context(session, points, DELAUNAY_OPTIONS, options)? else {
        return Ok((DelaunayOutput::degenerate(points.dim()), None));
    };
    let output = DelaunayOutput::extract(context.graph(), context.bounded())?;
    Ok((output, Some(context)))
}

/// Delaunay triangulation of `points`.
///
/// # Errors
///
/// See [`convex_hull_retained`].
///
/// # Examples
///
/// ```rust
/// use hullgraph::prelude::*;
///
/// let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
/// let mut session = HullSession::new(IncrementalHullEngine::new());
/// let triangulation = delaunay(&mut session, &points, "").unwrap();
/// assert_eq!(triangulation.simplices.len(), 2);
/// let total: f64 = triangulation.areas.iter().flatten().sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
pub fn delaunay<E: HullEngine>(
    session: &mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<DelaunayOutput, HullError> {
    delaunay_retained(session, points, options).map(|(output, _)| output)
}

/// Voronoi diagram of `points`, retaining the Delaunay graph.
///
/// # Errors
///
/// See [`convex_hull_retained`].
pub fn voronoi_retained<'s, E: HullEngine>(
    session: &'s mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<(VoronoiOutput, Option<HullContext<'s, E>>), HullError> {
    let Some(context) = open_context(session, points, VORONOI_OPTIONS, options)? else {
        return Ok((VoronoiOutput::degenerate(points.dim()), None));
    };
    let output = VoronoiOutput::extract(context.graph(), context.bounded())?;
    Ok((output, Some(context)))
}

/// Voronoi diagram of `points`.
///
/// # Errors
///
/// See [`convex_hull_retained`].
pub fn voronoi<E: HullEngine>(
    session: &mut HullSession<E>,
    points: &PointSet,
    options: &str,
) -> Result<VoronoiOutput, HullError> {
    voronoi_retained(session, points, options).map(|(output, _)| output)
}

// =============================================================================
// CONTAINMENT
// =============================================================================

fn check_queries<E: HullEngine>(
    context: &HullContext<'_, E>,
    queries: &PointSet,
) -> Result<(), InputValidationError> {
    if queries.dim() == context.input_dim() {
        Ok(())
    } else {
        Err(InputValidationError::QueryDimensionMismatch {
            actual: queries.dim(),
            expected: context.input_dim(),
        })
    }
}

/// Which queries lie in the retained hull, boundary included.
///
/// # Errors
///
/// Returns [`InputValidationError::QueryDimensionMismatch`] when the queries
/// do not match the hull's input dimension.
pub fn points_in_hull<E: HullEngine>(
    context: &HullContext<'_, E>,
    queries: &PointSet,
) -> Result<Vec<bool>, HullError> {
    points_in_hull_with_rule(context, queries, ContainmentRule::Inclusive)
}

/// Which queries lie in the retained hull under `rule`.
///
/// # Errors
///
/// See [`points_in_hull`].
pub fn points_in_hull_with_rule<E: HullEngine>(
    context: &HullContext<'_, E>,
    queries: &PointSet,
    rule: ContainmentRule,
) -> Result<Vec<bool>, HullError> {
    check_queries(context, queries)?;
    let graph = context.graph();
    Ok(queries
        .iter()
        .map(|query| match graph.mode() {
            HullMode::ConvexHull => contains_point(graph, context.tolerances(), query, rule),
            HullMode::Delaunay => locate_simplex(graph, context.bounded(), query, rule).is_some(),
        })
        .collect())
}

/// Locates each query in the retained graph.
///
/// Delaunay contexts return the row id of the containing simplex. Hull
/// contexts return the index of the best facet of points strictly inside.
///
/// # Errors
///
/// See [`points_in_hull`].
pub fn find_simplex<E: HullEngine>(
    context: &HullContext<'_, E>,
    queries: &PointSet,
) -> Result<Vec<Option<usize>>, HullError> {
    check_queries(context, queries)?;
    Ok(queries
        .iter()
        .map(|query| locate(context.graph(), context.tolerances(), context.bounded(), query))
        .collect())
}

/// Keeps the simplex references of `grid` whose circumradius is below `alpha`.
///
/// # Errors
///
/// Returns [`ExtractionError::IndexBounds`] for references past the end of `radii`.
pub fn alpha_shape(grid: &SimplexGrid, radii: &[f64], alpha: f64) -> Result<SimplexGrid, HullError> {
    Ok(alpha_filter(grid, radii, alpha)?)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_hull::IncrementalHullEngine;

    fn session() -> HullSession<IncrementalHullEngine> {
        HullSession::new(IncrementalHullEngine::new())
    }

    #[test]
    fn test_compose_options() {
        let options = compose_options(DELAUNAY_OPTIONS, "Qc", 2).unwrap();
        assert!(options.delaunay && options.scale_last && options.point_at_infinity);
        assert!(options.keep_coplanar);
        assert!(!options.exact_pre_merges);
        assert!(compose_options(HULL_OPTIONS, "", 5).unwrap().exact_pre_merges);

        // The limit applies to the caller's part only.
        let long = "T0 ".repeat(66);
        assert!(compose_options(VORONOI_OPTIONS, &long, 2).is_ok());
        let too_long = "T0 ".repeat(67);
        assert!(matches!(
            compose_options(VORONOI_OPTIONS, &too_long, 2),
            Err(InputValidationError::OptionsTooLong { len: 201, .. })
        ));
    }

    #[test]
    fn test_input_validation() {
        let mut session = session();
        let line = PointSet::new(1, vec![0.0, 1.0, 2.0]).unwrap();
        assert!(matches!(
            convex_hull(&mut session, &line, ""),
            Err(HullError::InputValidation(InputValidationError::InvalidDimension { dimension: 1, .. }))
        ));
        let pair = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0]]).unwrap();
        assert_eq!(
            delaunay(&mut session, &pair, ""),
            Err(HullError::InputValidation(InputValidationError::InsufficientPoints {
                points: 2,
                dimension: 2
            }))
        );
        assert_eq!(session.computations(), 0);
    }

    #[test]
    fn test_degenerate_minimal_input() {
        let mut session = session();
        let collinear = PointSet::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
        let output = delaunay(&mut session, &collinear, "").unwrap();
        assert_eq!(output.status, OutputStatus::Degenerate);
        assert_eq!(output.exit_code(), ExitCode::Degenerate);
        assert!(output.simplices.is_empty());
        assert_eq!(output.simplices.width(), 3);

        let (hull, context) = convex_hull_retained(&mut session, &collinear, "").unwrap();
        assert_eq!(hull.status, OutputStatus::Degenerate);
        assert!(context.is_none());
    }

    #[test]
    fn test_flat_input_with_more_points_is_an_error() {
        let mut session = session();
        let collinear =
            PointSet::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]).unwrap();
        let error = convex_hull(&mut session, &collinear, "").unwrap_err();
        assert!(matches!(error, HullError::Engine(EngineError::FlatInput { .. })));
        assert_eq!(error.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn test_retained_context_answers_queries() {
        let mut session = session();
        let points =
            PointSet::from_rows(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]]).unwrap();
        let (hull, context) = convex_hull_retained(&mut session, &points, "").unwrap();
        assert_eq!(hull.exit_code(), ExitCode::Success);
        let context = context.unwrap();
        let queries = PointSet::from_rows(&[[1.0, 1.0], [2.0, 1.0], [3.0, 1.0]]).unwrap();
        assert_eq!(
            points_in_hull(&context, &queries).unwrap(),
            vec![true, true, false]
        );
        assert_eq!(
            points_in_hull_with_rule(&context, &queries, ContainmentRule::Strict).unwrap(),
            vec![true, false, false]
        );
        let located = find_simplex(&context, &queries).unwrap();
        assert!(located[0].is_some());
        assert_eq!(located[2], None);

        let wrong = PointSet::from_rows(&[[1.0, 1.0, 1.0]]).unwrap();
        assert!(matches!(
            points_in_hull(&context, &wrong),
            Err(HullError::InputValidation(InputValidationError::QueryDimensionMismatch {
                actual: 3,
                expected: 2
            }))
        ));
        context.close();
        assert_eq!(session.releases(), 1);
    }
}
