//! Simplex adjacency extraction.
//!
//! For every output row, lists the facets across each of its ridges. A
//! neighbor that is itself an output row is reported by row id. A neighbor
//! that is not (an upper Delaunay facet) is reported as a boundary marker
//! carrying its raw facet id.

use serde::{Deserialize, Serialize};

use crate::core::algorithms::triangulation::BoundedFacets;
use crate::core::facet_graph::{FacetGraph, FacetId};

/// One entry of a simplex's neighbor list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Neighbor {
    /// Adjacent output simplex, by row id.
    Adjacent(usize),
    /// The ridge lies on the boundary; `facet` is the excluded facet beyond it.
    Boundary {
        /// Raw id of the facet across the ridge.
        facet: FacetId,
    },
}

impl Neighbor {
    /// `true` for a boundary marker.
    #[must_use]
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::Boundary { .. })
    }

    /// Row id of an adjacent simplex.
    #[must_use]
    pub const fn simplex(self) -> Option<usize> {
        match self {
            Self::Adjacent(simplex) => Some(simplex),
            Self::Boundary { .. } => None,
        }
    }
}

/// Neighbor lists of every output row, in row order.
///
/// Simplicial rows list the neighbor opposite each stored vertex. Rows of
/// non-simplicial facets list their neighbors in the facet's own order.
#[must_use]
pub fn extract_neighbors(graph: &FacetGraph, bounded: &BoundedFacets) -> Vec<Vec<Neighbor>> {
    bounded
        .facets()
        .iter()
        .map(|&facet| {
            graph
                .facet(facet)
                .neighbors()
                .iter()
                .map(|&neighbor| {
                    bounded
                        .simplex_of(neighbor)
                        .map_or(Neighbor::Boundary { facet: neighbor }, Neighbor::Adjacent)
                })
                .collect()
        })
        .collect()
}
