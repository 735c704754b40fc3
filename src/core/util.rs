//! General helper utilities

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default distance under which two positions are treated as the same point
/// when copying entities between meshes.
pub const DEFAULT_DEDUP_TOLERANCE: f64 = 1e-6;

/// Default reference-coordinate slack when testing point inclusion in a cell.
pub const DEFAULT_INSIDE_TOLERANCE: f64 = 1e-10;

/// Attribute values at or below this are considered "empty" by prolongation.
pub const ATTRIBUTE_TOLERANCE: f64 = 1e-12;

/// Marker value reserved for background (unassigned) points.
pub const BACKGROUND_MARKER: i32 = -99;

/// Marker of a point created between two points with the given markers.
///
/// Background markers yield to the other endpoint; two background endpoints
/// give `-1`. Equal markers are kept, different ones collapse to `0`.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::util::{BACKGROUND_MARKER, midpoint_marker};
///
/// assert_eq!(midpoint_marker(3, 3), 3);
/// assert_eq!(midpoint_marker(3, 4), 0);
/// assert_eq!(midpoint_marker(BACKGROUND_MARKER, 7), 7);
/// assert_eq!(midpoint_marker(BACKGROUND_MARKER, BACKGROUND_MARKER), -1);
/// ```
#[must_use]
pub const fn midpoint_marker(a: i32, b: i32) -> i32 {
    match (a == BACKGROUND_MARKER, b == BACKGROUND_MARKER) {
        (true, true) => -1,
        (true, false) => b,
        (false, true) => a,
        (false, false) if a == b => a,
        (false, false) => 0,
    }
}

// =============================================================================
// ENTITY IDS
// =============================================================================

/// Declares a dense index newtype for one of the mesh entity arenas.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Wraps a raw arena index.
            #[inline]
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// The raw arena index.
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use entity_id;
