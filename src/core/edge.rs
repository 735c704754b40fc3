//! Canonical edge identifiers.
//!
//! Edges are not stored in the mesh. Refinement still needs a stable key for
//! "the edge between points `a` and `b`" so that the midpoint shared by all
//! cells around that edge is created once. [`EdgeKey`]:
//!
//! - identifies an edge purely by its two endpoint [`PointId`]s
//! - canonicalizes endpoint ordering so `(a, b)` and `(b, a)` map to the same edge
//! - is `Copy`/`Hash`/`Ord` for fast use in sets and maps

use crate::core::point::PointId;

/// Canonical identifier for an (undirected) edge.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::edge::EdgeKey;
/// use meshtopo::core::point::PointId;
///
/// let a = PointId::new(7);
/// let b = PointId::new(2);
/// let edge = EdgeKey::new(a, b);
/// assert_eq!(edge, EdgeKey::new(b, a));
/// assert_eq!(edge.endpoints(), (b, a));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    v0: PointId,
    v1: PointId,
}

impl EdgeKey {
    /// Creates a new canonical edge key with `v0 <= v1`.
    #[must_use]
    pub fn new(a: PointId, b: PointId) -> Self {
        if a <= b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Returns the first (smaller) endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> PointId {
        self.v0
    }

    /// Returns the second (larger) endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> PointId {
        self.v1
    }

    /// Returns both endpoints in canonical order.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (PointId, PointId) {
        (self.v0, self.v1)
    }

    /// Whether both endpoints are the same point.
    #[inline]
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        self.v0 == self.v1
    }
}

impl From<(PointId, PointId)> for EdgeKey {
    #[inline]
    fn from((a, b): (PointId, PointId)) -> Self {
        Self::new(a, b)
    }
}
