//! Retained hull contexts and the engine session that owns them.
//!
//! A [`HullSession`] wraps one [`HullEngine`]. Opening a [`HullContext`]
//! runs a computation and keeps the resulting facet graph alive for later
//! queries. The context borrows the session mutably, so a second computation
//! cannot start while one is still open. Closing or dropping the context hands
//! the graph back to the engine exactly once.

use tracing::debug;

use crate::core::algorithms::triangulation::BoundedFacets;
use crate::core::engine::{EngineError, EngineOptions, HullEngine, Tolerances};
use crate::core::facet_graph::{FacetGraph, HullMode};
use crate::geometry::point_set::PointSet;

/// Owner of a hull engine and its computation counters.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::algorithms::incremental_hull::IncrementalHullEngine;
/// use hullgraph::core::context::HullSession;
/// use hullgraph::core::engine::EngineOptions;
/// use hullgraph::geometry::point_set::PointSet;
///
/// let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
/// let mut session = HullSession::new(IncrementalHullEngine::new());
/// {
///     let context = session.open(&points, &EngineOptions::default()).unwrap();
///     assert_eq!(context.graph().facet_count(), 3);
/// }
/// assert_eq!(session.releases(), 1);
/// assert_eq!(session.engine().live_graphs(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct HullSession<E: HullEngine> {
    engine: E,
    computations: usize,
    releases: usize,
}

impl<E: HullEngine> HullSession<E> {
    /// Wraps `engine`.
    #[must_use]
    pub const fn new(engine: E) -> Self {
        Self {
            engine,
            computations: 0,
            releases: 0,
        }
    }

    /// The wrapped engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Unwraps the engine.
    #[must_use]
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Successful computations so far.
    #[must_use]
    pub const fn computations(&self) -> usize {
        self.computations
    }

    /// Graphs handed back to the engine so far.
    #[must_use]
    pub const fn releases(&self) -> usize {
        self.releases
    }

    /// Runs a computation and retains its graph.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`EngineError`]; nothing is retained in that case.
    pub fn open(
        &mut self,
        points: &PointSet,
        options: &EngineOptions,
    ) -> Result<HullContext<'_, E>, EngineError> {
        let output = self.engine.compute(points, options)?;
        self.computations += 1;
        debug!(
            facets = output.graph.facet_count(),
            mode = ?output.graph.mode(),
            "opened hull context"
        );
        let bounded = BoundedFacets::new(&output.graph);
        Ok(HullContext {
            session: self,
            graph: Some(output.graph),
            bounded,
            tolerances: output.tolerances,
        })
    }
}

/// A retained facet graph.
///
/// Holds the graph until [`HullContext::close`] or drop, whichever comes first.
#[derive(Debug)]
pub struct HullContext<'s, E: HullEngine> {
    session: &'s mut HullSession<E>,
    graph: Option<FacetGraph>,
    bounded: BoundedFacets,
    tolerances: Tolerances,
}

impl<E: HullEngine> HullContext<'_, E> {
    /// The retained graph.
    #[must_use]
    pub fn graph(&self) -> &FacetGraph {
        match &self.graph {
            Some(graph) => graph,
            None => unreachable!("graph is only taken on close or drop"),
        }
    }

    /// Output facets of the retained graph.
    #[must_use]
    pub const fn bounded(&self) -> &BoundedFacets {
        &self.bounded
    }

    /// Tolerances reported by the engine.
    #[must_use]
    pub const fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// What the retained graph represents.
    #[must_use]
    pub fn mode(&self) -> HullMode {
        self.graph().mode()
    }

    /// Dimension of the caller's points.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.graph().input_dim()
    }

    /// Releases the graph now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(graph) = self.graph.take() {
            self.session.engine.release(graph);
            self.session.releases += 1;
            debug!(releases = self.session.releases, "released hull context");
        }
    }
}

impl<E: HullEngine> Drop for HullContext<'_, E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_hull::IncrementalHullEngine;

    fn triangle() -> PointSet {
        PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_close_releases_once() {
        let mut session = HullSession::new(IncrementalHullEngine::new());
        let context = session.open(&triangle(), &EngineOptions::default()).unwrap();
        assert_eq!(context.mode(), HullMode::ConvexHull);
        assert_eq!(context.input_dim(), 2);
        assert_eq!(context.bounded().len(), 3);
        context.close();
        assert_eq!(session.computations(), 1);
        assert_eq!(session.releases(), 1);
        assert_eq!(session.engine().live_graphs(), 0);
    }

    #[test]
    fn test_sequential_contexts() {
        let mut session = HullSession::new(IncrementalHullEngine::new());
        for _ in 0..3 {
            let context = session.open(&triangle(), &EngineOptions::default()).unwrap();
            drop(context);
        }
        assert_eq!(session.computations(), 3);
        assert_eq!(session.releases(), 3);
    }

    #[test]
    fn test_failed_open_retains_nothing() {
        let flat = PointSet::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
        let mut session = HullSession::new(IncrementalHullEngine::new());
        assert!(session.open(&flat, &EngineOptions::default()).is_err());
        assert_eq!(session.computations(), 0);
        assert_eq!(session.releases(), 0);
        assert_eq!(session.into_engine().live_graphs(), 0);
    }
}
