use crate::core::facet_graph::{FacetId, RidgeId, VertexId};

use super::{MAX_PRACTICAL_DIMENSION_SIZE, SmallBuffer};

// =============================================================================
// ALGORITHM-SPECIFIC BUFFER TYPES
// =============================================================================

/// Vertex list of one facet or one emitted simplex.
pub type FacetVertexBuffer = SmallBuffer<VertexId, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Neighbor list of one facet. Simplicial facets have exactly one neighbor per vertex.
pub type FacetNeighborBuffer = SmallBuffer<FacetId, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Ridge list of one facet.
pub type FacetRidgeBuffer = SmallBuffer<RidgeId, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Point ids of one emitted simplex row, in output order.
pub type SimplexPointBuffer = SmallBuffer<usize, MAX_PRACTICAL_DIMENSION_SIZE>;
