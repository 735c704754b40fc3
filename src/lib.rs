//! # meshtopo
//!
//! Topology engine for unstructured finite-element meshes in one, two and
//! three dimensions.
//!
//! # Features
//!
//! - Arena-backed entity store of points, cells and boundary facets with
//!   stable integer ids
//! - Shape classification of linear and quadratic elements (edges, triangles,
//!   quadrangles, tetrahedra, hexahedra, prisms, pyramids)
//! - Adjacency derivation with consistent left/right boundary sides
//! - Point location by slope search, seeded from an R*-tree over the points
//! - Quadratic (P2) and geometric (H2) refinement with conforming midpoints
//! - Structured grid generation, sub-mesh extraction and attribute
//!   prolongation
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! // Two triangles covering the unit square.
//! let mut mesh = Mesh::new(Dimension::Two);
//! let p: Vec<PointId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| mesh.create_point(Position::new(x, y, 0.0), 0))
//!     .collect();
//! mesh.create_cell(&[p[0], p[1], p[2]], 1).unwrap();
//! mesh.create_cell(&[p[0], p[2], p[3]], 2).unwrap();
//!
//! // Derive neighbors and boundary facets.
//! mesh.create_neighbour_infos(false).unwrap();
//! assert_eq!(mesh.boundary_count(), 5);
//! assert_eq!(mesh.exterior_boundaries().len(), 4);
//!
//! // Locate a position.
//! let cell = mesh.find_cell(&Position::new(0.2, 0.7, 0.0), false).unwrap();
//! assert_eq!(cell, Some(CellId::new(1)));
//!
//! // Refine geometrically: every triangle splits into four.
//! let fine = mesh.create_h2().unwrap();
//! assert_eq!(fine.cell_count(), 8);
//! assert_eq!(fine.point_count(), 9);
//! ```
//!
//! # Structured Grids
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! let axis = [0.0, 0.5, 1.0];
//! let mut cube = create_3d_grid(&axis, &axis, &axis, 123).unwrap();
//! assert_eq!(cube.cell_count(), 8);
//! assert_eq!(cube.exterior_boundaries().len(), 24);
//!
//! let center = Position::new(0.5, 0.5, 0.5);
//! assert!(cube.find_cell(&center, false).unwrap().is_some());
//! ```
//!
//! # Mesh Invariants
//!
//! Once [`Mesh::create_neighbour_infos`](core::mesh::Mesh::create_neighbour_infos)
//! has run, the following hold and are checked by
//! [`Mesh::validate_adjacency`](core::mesh::Mesh::validate_adjacency):
//!
//! - **Boundary sides** – every boundary on a cell facet has that cell as a
//!   side, and interior facets have two different side cells.
//! - **Side listing** – a cell named as a side of a boundary lists that
//!   boundary among its facet boundaries exactly once.
//! - **Neighbor symmetry** – if cell `a` names `b` across a facet, `b` names
//!   `a` across the same facet.
//! - **Orientation** – the left cell of a face facet (triangle or quadrangle,
//!   linear or quadratic) sees the boundary normal pointing away from its
//!   center.
//!
//! Entity ids are dense and never reused. Points, cells and boundaries are
//! only appended, except through [`Mesh::clear`](core::mesh::Mesh::clear) and
//! the explicit renumbering pass
//! [`Mesh::renumber_points`](core::mesh::Mesh::renumber_points).
//!
//! # Errors
//!
//! Every fallible operation returns a module-level error enum:
//! [`ShapeError`](core::shape::ShapeError),
//! [`MeshError`](core::mesh::MeshError),
//! [`AdjacencyError`](core::adjacency::AdjacencyError),
//! [`LocateError`](core::algorithms::locate::LocateError) and
//! [`RefinementError`](core::algorithms::refine::RefinementError). A mesh on
//! which adjacency derivation failed has inconsistent sides and should be
//! discarded.

// Allow multiple crate versions due to transitive dependencies
#![expect(clippy::multiple_crate_versions)]
// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh entity store and the topological
/// algorithms working on it.
///
/// It includes the [`Mesh`](core::mesh::Mesh) store, the `Point`, `Cell` and
/// `Boundary` entities, shape classification, adjacency derivation and the
/// algorithms for location, refinement, extraction and prolongation.
pub mod core {
    /// Algorithms operating on whole meshes
    pub mod algorithms {
        /// Sub-mesh extraction, hulls and entity copies between meshes
        pub mod extract;
        /// Point location by slope search
        pub mod locate;
        /// Attribute prolongation into empty cells
        pub mod prolongation;
        /// Quadratic and geometric refinement
        pub mod refine;
    }
    pub mod adjacency;
    pub mod boundary;
    pub mod cell;
    /// High-performance collection types for mesh topology
    pub mod collections;
    pub mod edge;
    pub mod mesh;
    pub mod point;
    pub mod shape;
    pub mod util;
    // Re-export the `core` modules.
    pub use boundary::*;
    pub use cell::*;
    pub use edge::*;
    pub use mesh::*;
    pub use point::*;
    pub use shape::*;
    pub use util::*;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Numeric geometry on point positions.
///
/// Positions are `nalgebra` vectors. The module provides the isoparametric
/// shape functions behind the inclusion test, element measures, structured
/// grid generators and rigid transforms.
pub mod geometry {
    pub mod position;
    /// Isoparametric mapping and the point-in-cell predicate
    pub mod shape_functions;
    /// Translation, scaling and rotation of whole meshes
    pub mod transform;
    /// Element measures and structured grid generation
    pub mod util;
    pub use position::*;
    pub use shape_functions::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types and functions.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        adjacency::{AdjacencyError, normal_shows_outside},
        algorithms::{
            extract::{create_hull, extract_by_boundaries, extract_by_cell_ids, extract_by_marker},
            locate::{LocateError, LocateOptions, LocateOptionsBuilder, LocateOutcome},
            prolongation::ProlongationReport,
            refine::{
                MidpointCache, RefinementError, RefinementMode, RefinementOptions,
                RefinementOptionsBuilder,
            },
        },
        boundary::*,
        cell::*,
        edge::*,
        mesh::*,
        point::*,
        shape::*,
        util::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        EntityPointBuffer, FastHashMap, FastHashSet, SmallBuffer, SpatialIndex,
        SpatialIndexError, fast_hash_map_with_capacity, fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{
        position::*,
        shape_functions::Inclusion,
        util::grid_generation::*,
        util::measures::*,
    };
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
            boundary::Boundary, cell::Cell, collections::SpatialIndex, mesh::Mesh, point::Point,
        },
        geometry::position::BoundingBox,
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<Cell>());
        assert!(is_normal::<Boundary>());
        assert!(is_normal::<Mesh>());
        assert!(is_normal::<SpatialIndex>());
        assert!(is_normal::<BoundingBox>());
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

        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);

        let set_with_cap = fast_hash_set_with_capacity::<u64>(50);
        assert!(set_with_cap.capacity() >= 50);
    }

    #[test]
    fn test_prelude_mesh_exports() {
        use crate::prelude::*;

        let mut mesh = create_2d_grid(&[0.0, 1.0], &[0.0, 2.0], 0).unwrap();
        assert_eq!(mesh.cell(CellId::new(0)).kind(), ShapeKind::Quadrangle);
        assert_eq!(midpoint_marker(BACKGROUND_MARKER, 3), 3);

        let size = shape_size(
            ShapeKind::Quadrangle,
            &mesh.positions_of(mesh.cell(CellId::new(0)).points()),
        );
        assert!((size - 2.0).abs() < 1e-12);

        let options = LocateOptionsBuilder::default().extensive(true).build().unwrap();
        assert!(options.extensive);
        assert!(mesh.find_cell(&Position::new(0.5, 1.0, 0.0), false).unwrap().is_some());
    }
}
