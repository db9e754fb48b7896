//! # hullgraph
//!
//! This is a library for deriving triangulations, neighbor graphs, Voronoi diagrams, alpha
//! shapes and point-in-hull answers from the facet graph of a d-dimensional convex hull.
//!
//! # Features
//!
//! - d-dimensional convex hulls, built by a beneath-beyond [`HullEngine`](core::engine::HullEngine)
//! - Delaunay triangulations via the lifted paraboloid, with a point at infinity for cospherical input
//! - Voronoi vertices, circumradii and regions, counter-clockwise in the plane
//! - Alpha-shape filtering of simplex references
//! - Retained hull contexts for repeated containment and location queries
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use hullgraph::prelude::*;
//!
//! let points = PointSet::from_rows(&[
//!     [0.0, 0.0],
//!     [1.0, 0.0],
//!     [0.0, 1.0],
//!     [1.0, 1.0],
//! ])
//! .unwrap();
//!
//! let mut session = HullSession::new(IncrementalHullEngine::new());
//! let triangulation = delaunay(&mut session, &points, "").unwrap();
//!
//! assert_eq!(triangulation.simplices.len(), 2);   // the unit square splits into 2 triangles
//! assert_eq!(triangulation.simplices.width(), 3); // d + 1 point ids per simplex
//! assert_eq!(session.releases(), 1);              // the facet graph was handed back
//! ```
//!
//! # Orientation
//!
//! Every simplex row is emitted counter-clockwise: the determinant of its edge vectors is
//! positive in input space. Hull facet rows are counter-clockwise as seen from outside the
//! hull. Rows are first normalized per facet from the engine's orientation flags and then
//! columns 0 and 1 are swapped throughout the table.
//!
//! # Retained Contexts
//!
//! A computation can keep its facet graph alive for later queries. The context borrows the
//! session, so only one can be open at a time, and it hands the graph back exactly once
//! when closed or dropped:
//!
//! ```rust
//! use hullgraph::prelude::*;
//!
//! let points = PointSet::from_rows(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]]).unwrap();
//! let mut session = HullSession::new(IncrementalHullEngine::new());
//!
//! let (_hull, context) = convex_hull_retained(&mut session, &points, "").unwrap();
//! let context = context.unwrap();
//!
//! let queries = PointSet::from_rows(&[[1.0, 1.0], [2.0, 1.0], [3.0, 3.0]]).unwrap();
//! assert_eq!(points_in_hull(&context, &queries).unwrap(), vec![true, true, false]);
//! assert_eq!(
//!     points_in_hull_with_rule(&context, &queries, ContainmentRule::Strict).unwrap(),
//!     vec![true, false, false]
//! );
//!
//! context.close();
//! assert_eq!(session.releases(), 1);
//! ```
//!
//! # Degenerate Input
//!
//! When the engine fails on exactly `d + 1` points the operation returns empty tables with
//! [`OutputStatus::Degenerate`](core::operations::OutputStatus::Degenerate) instead of an error:
//!
//! ```rust
//! use hullgraph::prelude::*;
//!
//! let collinear = PointSet::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
//! let mut session = HullSession::new(IncrementalHullEngine::new());
//! let output = delaunay(&mut session, &collinear, "").unwrap();
//!
//! assert_eq!(output.status, OutputStatus::Degenerate);
//! assert_eq!(output.exit_code(), ExitCode::Degenerate);
//! assert!(output.simplices.is_empty());
//! ```

// Allow multiple crate versions due to transitive dependencies
#![expect(clippy::multiple_crate_versions)]
// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the facet graph, the hull engine and the algorithms that
/// derive output tables from a facet graph.
pub mod core {
    /// Extraction algorithms and the built-in hull engine
    pub mod algorithms {
        pub mod alpha_shape;
        pub mod containment;
        pub mod incremental_hull;
        pub mod metrics;
        pub mod neighbors;
        pub mod triangulation;
        pub mod voronoi;
    }
    pub mod collections;
    pub mod context;
    pub mod encoding;
    pub mod engine;
    pub mod facet_graph;
    pub mod operations;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Runtime-dimension point storage, linear algebra and geometric predicates.
pub mod geometry {
    pub mod matrix;
    pub mod measures;
    pub mod point_set;
    pub mod predicates;
}

/// A prelude module that re-exports commonly used types and functions.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::{
            alpha_shape::SimplexGrid,
            containment::ContainmentRule,
            incremental_hull::IncrementalHullEngine,
            neighbors::Neighbor,
            triangulation::{ExtractionError, FacetMatrix, SimplexTable},
            voronoi::{RegionVertex, VoronoiRegion, VoronoiVertex},
        },
        context::{HullContext, HullSession},
        engine::{EngineError, EngineOptions, EngineOptionsBuilder, HullEngine, Tolerances},
        facet_graph::{FacetGraph, FacetId, HullMode, RidgeId, VertexId},
        operations::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::point_set::{InputValidationError, PointSet};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            algorithms::incremental_hull::IncrementalHullEngine, facet_graph::FacetGraph,
            operations::DelaunayOutput,
        },
        geometry::point_set::PointSet,
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<PointSet>());
        assert!(is_normal::<FacetGraph>());
        assert!(is_normal::<IncrementalHullEngine>());
        assert!(is_normal::<DelaunayOutput>());
    }

    #[test]
    fn test_prelude_collections_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut set: FastHashSet<u64> = FastHashSet::default();
        set.insert(789);
        assert!(set.contains(&789));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        assert!(fast_hash_map_with_capacity::<u64, usize>(100).capacity() >= 100);
        assert!(fast_hash_set_with_capacity::<u64>(50).capacity() >= 50);
    }

    #[test]
    fn test_prelude_operation_exports() {
        use crate::prelude::*;

        let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        let mut session = HullSession::new(IncrementalHullEngine::new());
        let hull = convex_hull(&mut session, &points, "").unwrap();
        assert_eq!(hull.facets.len(), 3);
        assert_eq!(hull.exit_code(), ExitCode::Success);
    }
}
