//! The hull engine seam.
//!
//! The extraction layer never builds hulls itself. It asks a [`HullEngine`]
//! for a [`FacetGraph`] plus the numerical [`Tolerances`] the engine worked
//! with, and hands the graph back through [`HullEngine::release`] exactly once
//! when it is done.
//!
//! Engine behavior is configured with [`EngineOptions`], either built with
//! [`EngineOptionsBuilder`] or parsed from a whitespace-separated option
//! string such as `"d Qbb Qz T0 Fn"`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::facet_graph::{CenterType, FacetGraph, FacetGraphError, HullMode};
use crate::geometry::point_set::{InputValidationError, PointSet};

// =============================================================================
// ERRORS
// =============================================================================

/// Failures reported by a hull engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// Not enough points to start a hull of the requested dimension.
    #[error("Need at least {required} points for a {dimension}-dimensional hull, got {points}")]
    TooFewPoints {
        /// Points available.
        points: usize,
        /// Points required.
        required: usize,
        /// Hull dimension.
        dimension: usize,
    },
    /// The points do not span the full hull dimension.
    #[error("Initial simplex is flat: input spans only {rank} of {dimension} dimensions")]
    FlatInput {
        /// Dimension actually spanned.
        rank: usize,
        /// Hull dimension.
        dimension: usize,
    },
    /// The engine produced an inconsistent facet topology.
    #[error("Hull topology error: {message}")]
    Topology {
        /// Description of the inconsistency.
        message: String,
    },
    /// The assembled graph failed validation.
    #[error("Engine produced an invalid facet graph: {0}")]
    InvalidGraph(#[from] FacetGraphError),
}

// =============================================================================
// TOLERANCES
// =============================================================================

/// Numerical tolerances reported alongside a facet graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Smallest (most negative) distance of a vertex below one of its own facets.
    pub min_vertex: f64,
    /// Maximum rounding error of a point-to-hyperplane distance.
    pub dist_round: f64,
}

impl Tolerances {
    /// Distance above which a point is certainly outside a facet.
    #[must_use]
    pub fn outside_tolerance(&self) -> f64 {
        2.0 * self.dist_round
    }

    /// Distance below which a point is certainly inside the hull.
    #[must_use]
    pub fn strict_inside_threshold(&self) -> f64 {
        self.min_vertex - 2.0 * self.dist_round
    }
}

/// Result of a successful engine computation.
#[derive(Debug)]
pub struct EngineOutput {
    /// The facet graph, owned by the caller until released.
    pub graph: FacetGraph,
    /// Tolerances the engine worked with.
    pub tolerances: Tolerances,
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Engine configuration.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::engine::{EngineOptions, EngineOptionsBuilder};
/// use hullgraph::core::facet_graph::HullMode;
///
/// let parsed = EngineOptions::parse("d Qbb Qz T0 Fn").unwrap();
/// assert_eq!(parsed.mode(), HullMode::Delaunay);
///
/// let built = EngineOptionsBuilder::default()
///     .delaunay(true)
///     .scale_last(true)
///     .point_at_infinity(true)
///     .neighbors_output(true)
///     .build()
///     .unwrap();
/// assert_eq!(parsed, built);
/// ```
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[builder(default)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors one independent option token"
)]
pub struct EngineOptions {
    /// `d`: Delaunay triangulation via lifting.
    pub delaunay: bool,
    /// `v`: Voronoi centers; implies `delaunay`.
    pub voronoi: bool,
    /// `Qbb`: scale the lifted coordinate to the range of the input coordinates.
    pub scale_last: bool,
    /// `Qz`: add a point at infinity above the lifted points.
    pub point_at_infinity: bool,
    /// `Qc`: keep coplanar points with their nearest facet in hull mode.
    pub keep_coplanar: bool,
    /// `Qt`: triangulated output.
    ///
    /// [`IncrementalHullEngine`](crate::core::algorithms::incremental_hull::IncrementalHullEngine)
    /// only ever emits simplicial facets and ignores this flag.
    pub triangulate: bool,
    /// `Qx`: exact pre-merges, requested for `d >= 5`.
    ///
    /// The built-in engine never merges facets and ignores this flag.
    pub exact_pre_merges: bool,
    /// `Tn`: trace level.
    pub trace_level: u8,
    /// `Fn`: neighbor output requested.
    ///
    /// The built-in engine always records facet neighbors and ignores this flag.
    pub neighbors_output: bool,
    /// `Pp`: suppress precision warnings.
    pub suppress_precision_warnings: bool,
}

impl EngineOptions {
    /// Maximum accepted length of an option string.
    pub const MAX_LEN: usize = 200;

    /// Parses a whitespace-separated option string.
    ///
    /// Unknown tokens are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::OptionsTooLong`] for strings longer than
    /// [`EngineOptions::MAX_LEN`].
    pub fn parse(options: &str) -> Result<Self, InputValidationError> {
        if options.len() > Self::MAX_LEN {
            return Err(InputValidationError::OptionsTooLong {
                len: options.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self::from_tokens(options.split_whitespace()))
    }

    /// Builds options from individual tokens without a length limit.
    ///
    /// Unknown tokens are logged and ignored.
    #[must_use]
    pub fn from_tokens<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> Self {
        let mut parsed = Self::default();
        for token in tokens {
            match token {
                "d" => parsed.delaunay = true,
                "v" => {
                    parsed.voronoi = true;
                    parsed.delaunay = true;
                }
                "Qbb" => parsed.scale_last = true,
                "Qz" => parsed.point_at_infinity = true,
                "Qc" => parsed.keep_coplanar = true,
                "Qt" => parsed.triangulate = true,
                "Qx" => parsed.exact_pre_merges = true,
                "Fn" => parsed.neighbors_output = true,
                "Pp" => parsed.suppress_precision_warnings = true,
                _ => {
                    if let Some(level) = token.strip_prefix('T').and_then(|l| l.parse().ok()) {
                        parsed.trace_level = level;
                    } else {
                        tracing::warn!(token, "ignoring unsupported engine option");
                    }
                }
            }
        }
        parsed
    }

    /// What the engine will compute.
    #[must_use]
    pub const fn mode(&self) -> HullMode {
        if self.delaunay || self.voronoi {
            HullMode::Delaunay
        } else {
            HullMode::ConvexHull
        }
    }

    /// Facet center representation.
    #[must_use]
    pub const fn center_type(&self) -> CenterType {
        if self.voronoi {
            CenterType::Circumcenter
        } else {
            CenterType::Centrum
        }
    }
}

impl std::fmt::Display for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = [
            (self.voronoi, "v"),
            (self.delaunay && !self.voronoi, "d"),
            (self.scale_last, "Qbb"),
            (self.point_at_infinity, "Qz"),
            (self.keep_coplanar, "Qc"),
            (self.triangulate, "Qt"),
            (self.exact_pre_merges, "Qx"),
        ];
        let mut tokens: Vec<String> = flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, t)| (*t).to_string())
            .collect();
        tokens.push(format!("T{}", self.trace_level));
        if self.neighbors_output {
            tokens.push("Fn".to_string());
        }
        if self.suppress_precision_warnings {
            tokens.push("Pp".to_string());
        }
        write!(f, "{}", tokens.join(" "))
    }
}

// =============================================================================
// ENGINE TRAIT
// =============================================================================

/// A convex-hull / Delaunay computation engine.
///
/// Implementations may keep internal state between calls but are not
/// reentrant: [`HullSession`](crate::core::context::HullSession) makes sure no
/// second computation starts while a graph from the same engine is still
/// held.
pub trait HullEngine {
    /// Computes the facet graph of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the hull cannot be built.
    fn compute(
        &mut self,
        points: &PointSet,
        options: &EngineOptions,
    ) -> Result<EngineOutput, EngineError>;

    /// Takes back a graph produced by [`HullEngine::compute`].
    ///
    /// Called exactly once per computed graph.
    fn release(&mut self, graph: FacetGraph);
}

// =============================================================================
// TESTS
// =============================================================================
