use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Hash map with the fast non-cryptographic `FxHasher`.
///
/// All keys used by the mesh store are small integer newtypes, for which
/// `FxHasher` is considerably faster than the default `SipHash`.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(7, 1);
/// assert_eq!(map.get(&7), Some(&1));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Build hasher backing [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// Hash set with the fast non-cryptographic `FxHasher`.
pub type FastHashSet<T> = FxHashSet<T>;

/// Vector with `N` inline slots before spilling to the heap.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SEMANTIC SIZE CONSTANTS
// =============================================================================

/// Inline capacity for entity point lists.
///
/// Covers every linear kind (a hexahedron has 8 corners). Quadratic solids
/// (up to 20 points) spill to the heap, which is acceptable since they are
/// produced by refinement rather than traversed in hot loops.
pub const MAX_LINEAR_POINTS: usize = 8;

/// Inline capacity for per-facet slots: a hexahedron has 6 facets.
pub const MAX_FACETS: usize = 6;

/// Inline capacity for point incidence lists.
///
/// Typical structured meshes have at most 8 cells around an interior point.
pub const INCIDENCE_BUFFER_SIZE: usize = 8;
