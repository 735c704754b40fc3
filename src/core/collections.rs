//! Collection types used throughout the mesh store.
//!
//! The aliases here pin the hashing strategy (`rustc-hash`) and the inline
//! buffer sizes (`smallvec`) for entity point lists, per-facet neighbor slots
//! and incidence lists, so that hot paths (adjacency derivation, point location,
//! refinement) avoid heap traffic for the common element kinds.

mod aliases;
mod buffers;
mod helpers;
mod spatial_index;

pub use aliases::*;
pub use buffers::*;
pub use helpers::*;
pub use spatial_index::*;
