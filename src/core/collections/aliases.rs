use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Working storage backend of the hull engine.
///
/// Facets are created and destroyed at a high rate while points are inserted,
/// so the engine keeps them in a slot map and only compacts them into the
/// index-addressed [`FacetGraph`](crate::core::facet_graph::FacetGraph) at the end.
///
/// # Feature Flags
///
/// - **default**: Uses `DenseSlotMap` (enabled via the default `dense-slotmap` feature)
/// - **--no-default-features**: Uses `SlotMap`
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for integer-keyed lookups.
/// Uses `rustc_hash::FxHasher`.
///
/// # Security Warning
///
/// Not DoS-resistant. Only use with trusted, internal keys.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<usize, usize> = FastHashMap::default();
/// map.insert(3, 7);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Build hasher that instantiates `rustc_hash::FxHasher`.
pub type FastBuildHasher = FxBuildHasher;

/// Re-export the Entry enum for `FastHashMap`.
pub use std::collections::hash_map::Entry;

/// Optimized `HashSet` type for membership tests on ids.
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::collections::FastHashSet;
///
/// let mut visited: FastHashSet<usize> = FastHashSet::default();
/// assert!(visited.insert(4));
/// assert!(!visited.insert(4));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=4**: Short token lists
/// - **N=8**: Facet vertex, neighbor and ridge lists up to `d = 7`
///
/// # Examples
///
/// ```rust
/// use hullgraph::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<usize, 8> = SmallBuffer::new();
/// buffer.extend([0, 1, 2]);
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SEMANTIC SIZE CONSTANTS
// =============================================================================

/// Semantic constant for the maximum practical dimension.
///
/// Most inputs are 2D-5D and the hull of a Delaunay lifting adds one, so 8
/// keeps every simplicial facet's vertex list on the stack.
pub const MAX_PRACTICAL_DIMENSION_SIZE: usize = 8;
