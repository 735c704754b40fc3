//! Mesh refinement.
//!
//! Produces a new mesh from a linear source mesh in one of two modes:
//!
//! - **quadratic** (P2): every cell and boundary keeps its shape but gains a
//!   node at the middle of each edge, turning e.g. a triangle into a six-node
//!   triangle
//! - **geometric** (H2): every cell and boundary is split into smaller cells
//!   of the same family (a triangle into four, a hexahedron into eight)
//!
//! Source points keep their ids in the refined mesh. New points are appended
//! in creation order. Midpoints go through a [`MidpointCache`] keyed by the
//! unordered endpoint pair, so cells sharing an edge share its midpoint and
//! the refined mesh stays conforming.
//!
//! Hexahedra and prisms place their face and body centers as midpoints of
//! previously created midpoints. Quadrangles get a fresh center per cell.
//!
//! # Examples
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! let mut mesh = Mesh::new(Dimension::Two);
//! let p: Vec<PointId> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| mesh.create_point(Position::new(x, y, 0.0), 0))
//!     .collect();
//! mesh.create_cell(&p, 4).unwrap();
//!
//! let fine = mesh.create_h2().unwrap();
//! assert_eq!(fine.point_count(), 6);
//! assert_eq!(fine.cell_count(), 4);
//! assert!(fine.cells().iter().all(|c| c.marker() == 4));
//!
//! let quadratic = mesh.create_p2().unwrap();
//! assert_eq!(quadratic.cell(CellId::new(0)).kind(), ShapeKind::Triangle6);
//! ```

use std::fmt;

use thiserror::Error;

use crate::core::boundary::Boundary;
use crate::core::cell::Cell;
use crate::core::collections::{EntityPointBuffer, FastHashMap, fast_hash_map_with_capacity};
use crate::core::edge::EdgeKey;
use crate::core::mesh::{Mesh, MeshError};
use crate::core::point::PointId;
use crate::core::shape::{ShapeKind, Tet10Numbering};
use crate::core::util::midpoint_marker;
use crate::geometry::util::measures::center;

// =============================================================================
// SUBDIVISION TABLES
// =============================================================================
//
// Indices refer to the node list of the parent: corners first, then the
// mid-edge nodes in node-table order, then any extra centers.

const EDGE_CHILDREN: &[&[usize]] = &[&[0, 2], &[2, 1]];

const TRIANGLE_CHILDREN: &[&[usize]] = &[&[0, 3, 5], &[1, 4, 3], &[2, 5, 4], &[3, 4, 5]];

// Node 8 is the quadrangle center.
const QUADRANGLE_CHILDREN: &[&[usize]] = &[
    &[0, 4, 8, 7],
    &[1, 5, 8, 4],
    &[2, 6, 8, 5],
    &[3, 7, 8, 6],
];

const TETRAHEDRON_CHILDREN: &[&[usize]] = &[
    &[4, 6, 5, 0],
    &[4, 5, 6, 9],
    &[7, 9, 4, 1],
    &[7, 4, 9, 5],
    &[8, 7, 5, 2],
    &[8, 5, 7, 9],
    &[6, 9, 8, 3],
    &[6, 8, 9, 5],
];

// Face centers 20..=25 and the body center 26, each the midpoint of two
// earlier nodes.
const HEXAHEDRON_CENTERS: &[[usize; 2]] = &[
    [8, 10],
    [12, 14],
    [8, 12],
    [9, 13],
    [10, 14],
    [11, 15],
    [20, 21],
];

const HEXAHEDRON_CHILDREN: &[&[usize]] = &[
    &[0, 8, 20, 11, 16, 22, 26, 25],
    &[8, 1, 9, 20, 22, 17, 23, 26],
    &[11, 20, 10, 3, 25, 26, 24, 19],
    &[20, 9, 2, 10, 26, 23, 18, 24],
    &[16, 22, 26, 25, 4, 12, 21, 15],
    &[22, 17, 23, 26, 12, 5, 13, 21],
    &[25, 26, 24, 19, 15, 21, 14, 7],
    &[26, 23, 18, 24, 21, 13, 6, 14],
];

// Centers 15..=17 of the three lateral faces.
const PRISM_CENTERS: &[[usize; 2]] = &[[6, 9], [7, 10], [8, 11]];

const PRISM_CHILDREN: &[&[usize]] = &[
    &[0, 6, 8, 12, 15, 17],
    &[1, 7, 6, 13, 16, 15],
    &[2, 8, 7, 14, 17, 16],
    &[6, 7, 8, 15, 16, 17],
    &[12, 15, 17, 3, 9, 11],
    &[13, 16, 15, 4, 10, 9],
    &[14, 17, 16, 5, 11, 10],
    &[15, 16, 17, 9, 10, 11],
];

// =============================================================================
// OPTIONS AND ERRORS
// =============================================================================

/// The two refinement products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefinementMode {
    /// Same cells with mid-edge nodes added.
    Quadratic,
    /// Subdivision into smaller cells of the same family.
    Geometric,
}

impl fmt::Display for RefinementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quadratic => write!(f, "quadratic"),
            Self::Geometric => write!(f, "geometric"),
        }
    }
}

/// What [`refine`] should produce.
///
/// With both flags set, geometric subdivision wins.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::algorithms::refine::{RefinementMode, RefinementOptionsBuilder};
///
/// let options = RefinementOptionsBuilder::default()
///     .geometric(true)
///     .build()
///     .unwrap();
/// assert_eq!(options.mode().unwrap(), RefinementMode::Geometric);
/// ```
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct RefinementOptions {
    /// Add mid-edge nodes to every entity.
    pub quadratic: bool,
    /// Split every entity into children.
    pub geometric: bool,
}

impl RefinementOptions {
    /// The mode these options select.
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::NoRefinementRequested`] when neither flag is set.
    pub const fn mode(&self) -> Result<RefinementMode, RefinementError> {
        match (self.quadratic, self.geometric) {
            (_, true) => Ok(RefinementMode::Geometric),
            (true, false) => Ok(RefinementMode::Quadratic),
            (false, false) => Err(RefinementError::NoRefinementRequested),
        }
    }
}

/// Errors raised by refinement.
///
/// The source mesh is never modified, so a failed refinement leaves nothing
/// to clean up.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum RefinementError {
    /// The element kind has no refinement rule for this mode.
    #[error("{mode} refinement of {kind} entities is not implemented")]
    NotImplemented {
        /// Kind of the offending entity.
        kind: ShapeKind,
        /// Requested mode.
        mode: RefinementMode,
    },
    /// Neither quadratic nor geometric refinement was requested.
    #[error("No refinement requested: set `quadratic` or `geometric`")]
    NoRefinementRequested,
    /// Building the refined mesh failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

// =============================================================================
// MIDPOINT CACHE
// =============================================================================

/// Midpoints created so far, keyed by the unordered endpoint pair.
///
/// A pair of identical points maps to the point itself.
#[derive(Clone, Debug, Default)]
pub struct MidpointCache {
    midpoints: FastHashMap<EdgeKey, PointId>,
}

impl MidpointCache {
    /// Creates an empty cache sized for about `edges` midpoints.
    #[must_use]
    pub fn with_capacity(edges: usize) -> Self {
        Self {
            midpoints: fast_hash_map_with_capacity(edges),
        }
    }

    /// The cached midpoint of `a` and `b`, if created already.
    #[must_use]
    pub fn get(&self, a: PointId, b: PointId) -> Option<PointId> {
        let key = EdgeKey::new(a, b);
        if key.is_degenerate() {
            return Some(a);
        }
        self.midpoints.get(&key).copied()
    }

    /// The midpoint of `a` and `b` in `mesh`, created on first request.
    ///
    /// New midpoints get the combined marker of their endpoints (see
    /// [`midpoint_marker`]).
    ///
    /// # Panics
    ///
    /// Panics if `a` or `b` is not a point of `mesh`.
    pub fn midpoint(&mut self, mesh: &mut Mesh, a: PointId, b: PointId) -> PointId {
        let key = EdgeKey::new(a, b);
        if key.is_degenerate() {
            return a;
        }
        *self.midpoints.entry(key).or_insert_with(|| {
            let (pa, pb) = (mesh.point(a), mesh.point(b));
            let position = (pa.position() + pb.position()) * 0.5;
            let marker = midpoint_marker(pa.marker(), pb.marker());
            mesh.create_point(position, marker)
        })
    }

    /// Number of cached midpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.midpoints.len()
    }

    /// Whether no midpoint was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.midpoints.is_empty()
    }
}

// =============================================================================
// REFINEMENT
// =============================================================================

/// Builds the refined mesh of `source`.
///
/// The result has the dimension and ten-node tetrahedron numbering of
/// `source`. Children inherit the marker and attribute of their parent;
/// boundaries inherit their parent's marker. Attributes are not reset from
/// markers, so a field stored as cell attributes survives refinement
/// unchanged. Call [`Mesh::attributes_from_markers`] on the result when
/// marker-valued attributes are wanted.
/// Adjacency of the result is unknown.
///
/// # Errors
///
/// Returns [`RefinementError::NoRefinementRequested`] when `options` selects
/// nothing, and [`RefinementError::NotImplemented`] for quadratic entities,
/// point cells, and (geometric mode only) pyramids and VTK-numbered
/// tetrahedra.
pub fn refine(source: &Mesh, options: &RefinementOptions) -> Result<Mesh, RefinementError> {
    let mode = options.mode()?;
    let numbering = source.tet10_numbering();

    let mut target = Mesh::new(source.dimension());
    target.set_tet10_numbering(numbering);
    for point in source.points() {
        target.create_point(*point.position(), point.marker());
    }

    let mut cache = MidpointCache::with_capacity(source.point_count() * 2);
    for cell in source.cells() {
        refine_cell(&mut target, &mut cache, cell, mode, numbering)?;
    }
    for boundary in source.boundaries() {
        refine_boundary(&mut target, &mut cache, boundary, mode, numbering)?;
    }

    tracing::debug!(
        %mode,
        cells = source.cell_count(),
        refined_cells = target.cell_count(),
        new_points = target.point_count() - source.point_count(),
        "refined mesh"
    );
    Ok(target)
}

/// Corner nodes of `points` followed by the midpoints named in the node table.
fn nodes_of(
    target: &mut Mesh,
    cache: &mut MidpointCache,
    kind: ShapeKind,
    points: &[PointId],
    numbering: Tet10Numbering,
) -> EntityPointBuffer {
    kind.node_table(numbering)
        .iter()
        .map(|&[a, b]| cache.midpoint(target, points[a], points[b]))
        .collect()
}

fn extend_with_centers(
    target: &mut Mesh,
    cache: &mut MidpointCache,
    nodes: &mut EntityPointBuffer,
    centers: &[[usize; 2]],
) {
    for &[a, b] in centers {
        let node = cache.midpoint(target, nodes[a], nodes[b]);
        nodes.push(node);
    }
}

fn refine_cell(
    target: &mut Mesh,
    cache: &mut MidpointCache,
    cell: &Cell,
    mode: RefinementMode,
    numbering: Tet10Numbering,
) -> Result<(), RefinementError> {
    let kind = cell.kind();
    let not_implemented = RefinementError::NotImplemented { kind, mode };
    if kind.is_quadratic() || kind == ShapeKind::Point {
        return Err(not_implemented);
    }

    let mut nodes = nodes_of(target, cache, kind, cell.points(), numbering);
    let children = match (mode, kind) {
        (RefinementMode::Quadratic, _) => {
            create_child_cell(target, cell, &nodes)?;
            return Ok(());
        }
        (RefinementMode::Geometric, ShapeKind::Edge) => EDGE_CHILDREN,
        (RefinementMode::Geometric, ShapeKind::Triangle) => TRIANGLE_CHILDREN,
        (RefinementMode::Geometric, ShapeKind::Quadrangle) => {
            let corners = target.positions_of(&nodes[..4]);
            nodes.push(target.create_point(center(&corners), 0));
            QUADRANGLE_CHILDREN
        }
        (RefinementMode::Geometric, ShapeKind::Tetrahedron) => match numbering {
            Tet10Numbering::Zienkiewicz => TETRAHEDRON_CHILDREN,
            Tet10Numbering::Vtk => return Err(not_implemented),
        },
        (RefinementMode::Geometric, ShapeKind::Hexahedron) => {
            extend_with_centers(target, cache, &mut nodes, HEXAHEDRON_CENTERS);
            HEXAHEDRON_CHILDREN
        }
        (RefinementMode::Geometric, ShapeKind::Prism) => {
            extend_with_centers(target, cache, &mut nodes, PRISM_CENTERS);
            PRISM_CHILDREN
        }
        _ => return Err(not_implemented),
    };

    for child in children {
        let points: EntityPointBuffer = child.iter().map(|&k| nodes[k]).collect();
        create_child_cell(target, cell, &points)?;
    }
    Ok(())
}

fn create_child_cell(target: &mut Mesh, parent: &Cell, points: &[PointId]) -> Result<(), MeshError> {
    let child = target.create_cell(points, parent.marker())?;
    target.cell_mut(child).set_attribute(parent.attribute());
    Ok(())
}

fn refine_boundary(
    target: &mut Mesh,
    cache: &mut MidpointCache,
    boundary: &Boundary,
    mode: RefinementMode,
    numbering: Tet10Numbering,
) -> Result<(), RefinementError> {
    let kind = boundary.kind();
    let marker = boundary.marker();
    if !matches!(
        kind,
        ShapeKind::Point | ShapeKind::Edge | ShapeKind::Triangle | ShapeKind::Quadrangle
    ) {
        return Err(RefinementError::NotImplemented { kind, mode });
    }

    let mut nodes = nodes_of(target, cache, kind, boundary.points(), numbering);
    let children = match (mode, kind) {
        (RefinementMode::Quadratic, _) | (RefinementMode::Geometric, ShapeKind::Point) => {
            target.create_boundary(&nodes, marker)?;
            return Ok(());
        }
        (RefinementMode::Geometric, ShapeKind::Edge) => EDGE_CHILDREN,
        (RefinementMode::Geometric, ShapeKind::Triangle) => TRIANGLE_CHILDREN,
        _ => {
            // Reuse the center of the adjacent hexahedron or prism face when
            // the cell pass created one across either diagonal.
            let center = match cache.get(nodes[4], nodes[6]) {
                Some(center) => center,
                None => cache.midpoint(target, nodes[5], nodes[7]),
            };
            nodes.push(center);
            QUADRANGLE_CHILDREN
        }
    };

    for child in children {
        let points: EntityPointBuffer = child.iter().map(|&k| nodes[k]).collect();
        target.create_boundary(&points, marker)?;
    }
    Ok(())
}

impl Mesh {
    /// Builds a refined copy; see [`refine`].
    ///
    /// # Errors
    ///
    /// See [`refine`].
    pub fn refine(&self, options: &RefinementOptions) -> Result<Self, RefinementError> {
        refine(self, options)
    }

    /// Geometric refinement: every entity split into children.
    ///
    /// # Errors
    ///
    /// See [`refine`].
    pub fn create_h2(&self) -> Result<Self, RefinementError> {
        refine(
            self,
            &RefinementOptions {
                quadratic: false,
                geometric: true,
            },
        )
    }

    /// Quadratic refinement: mid-edge nodes added to every entity.
    ///
    /// # Errors
    ///
    /// See [`refine`].
    pub fn create_p2(&self) -> Result<Self, RefinementError> {
        refine(
            self,
            &RefinementOptions {
                quadratic: true,
                geometric: false,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::CellId;
    use crate::core::shape::Dimension;
    use crate::core::util::BACKGROUND_MARKER;
    use crate::geometry::position::Position;
    use crate::geometry::util::grid_generation::{create_2d_grid, create_3d_grid};
    use approx::assert_relative_eq;

    fn mesh_with_cell(dimension: Dimension, coords: &[[f64; 3]]) -> Mesh {
        let mut mesh = Mesh::new(dimension);
        let points: Vec<PointId> = coords
            .iter()
            .map(|&[x, y, z]| mesh.create_point(Position::new(x, y, z), 0))
            .collect();
        let cell = mesh.create_cell(&points, 3).unwrap();
        mesh.set_cell_attribute(cell, 2.5).unwrap();
        mesh
    }

    fn total_size(mesh: &Mesh) -> f64 {
        mesh.cell_sizes().iter().sum()
    }

    fn unit_tet() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn test_no_mode_is_an_error() {
        let mesh = mesh_with_cell(Dimension::Two, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(
            mesh.refine(&RefinementOptions::default()).unwrap_err(),
            RefinementError::NoRefinementRequested
        );
    }

    #[test]
    fn test_both_flags_select_geometric() {
        let options = RefinementOptionsBuilder::default()
            .quadratic(true)
            .geometric(true)
            .build()
            .unwrap();
        assert_eq!(options.mode().unwrap(), RefinementMode::Geometric);
    }

    #[test]
    fn test_both_flags_refine_geometrically() {
        let mesh = mesh_with_cell(Dimension::Two, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let options = RefinementOptions {
            quadratic: true,
            geometric: true,
        };
        let fine = mesh.refine(&options).unwrap();
        assert_eq!(fine.point_count(), 6);
        assert_eq!(fine.cell_count(), 4);
        assert!(fine.cells().iter().all(|c| c.kind() == ShapeKind::Triangle));
        assert_relative_eq!(total_size(&fine), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_shared_edges_share_midpoints() {
        let mut mesh = Mesh::new(Dimension::Two);
        let p: Vec<PointId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| mesh.create_point(Position::new(x, y, 0.0), 0))
            .collect();
        mesh.create_cell(&[p[0], p[1], p[2]], 1).unwrap();
        mesh.create_cell(&[p[0], p[2], p[3]], 2).unwrap();

        let fine = mesh.create_h2().unwrap();
        // 4 corners + 5 edge midpoints.
        assert_eq!(fine.point_count(), 9);
        assert_eq!(fine.cell_count(), 8);
        assert_eq!(fine.cell_markers(), vec![1, 1, 1, 1, 2, 2, 2, 2]);
        assert_relative_eq!(total_size(&fine), 1.0, epsilon = 1e-14);
        assert!(!fine.neighbours_known());

        let mut fine = fine;
        fine.create_neighbour_infos(false).unwrap();
        // A conforming refinement keeps the outer boundary at 8 edges.
        assert_eq!(fine.exterior_boundaries().len(), 8);
    }

    #[test]
    fn test_source_points_keep_their_ids() {
        let mesh = mesh_with_cell(Dimension::Two, &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        let fine = mesh.create_h2().unwrap();
        for point in mesh.points() {
            assert_eq!(fine.position(point.id()), point.position());
        }
        assert_relative_eq!(*fine.position(PointId::new(3)), Position::new(1.0, 0.0, 0.0));
        assert!(fine.cells().iter().all(|c| c.attribute() == 2.5));

        let mut fine = fine;
        fine.attributes_from_markers();
        assert_eq!(fine.cell_attributes(), vec![3.0; 4]);
    }

    #[test]
    fn test_midpoint_markers() {
        let mut mesh = Mesh::new(Dimension::Two);
        let a = mesh.create_point(Position::new(0.0, 0.0, 0.0), 5);
        let b = mesh.create_point(Position::new(1.0, 0.0, 0.0), 5);
        let c = mesh.create_point(Position::new(0.0, 1.0, 0.0), BACKGROUND_MARKER);
        mesh.create_cell(&[a, b, c], 0).unwrap();

        let quadratic = mesh.create_p2().unwrap();
        let cell = quadratic.cell(CellId::new(0));
        assert_eq!(cell.kind(), ShapeKind::Triangle6);
        let markers: Vec<i32> = cell.points()[3..]
            .iter()
            .map(|&p| quadratic.point(p).marker())
            .collect();
        // (a, b) agree, (b, c) and (c, a) yield to the non-background side.
        assert_eq!(markers, vec![5, 5, 5]);
    }

    #[test]
    fn test_midpoint_cache() {
        let mut mesh = Mesh::new(Dimension::One);
        let a = mesh.create_point(Position::new(0.0, 0.0, 0.0), 1);
        let b = mesh.create_point(Position::new(4.0, 0.0, 0.0), 2);
        let mut cache = MidpointCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.get(a, b), None);
        assert_eq!(cache.get(a, a), Some(a));

        let m = cache.midpoint(&mut mesh, a, b);
        assert_eq!(cache.midpoint(&mut mesh, b, a), m);
        assert_eq!(cache.midpoint(&mut mesh, a, a), a);
        assert_eq!(cache.len(), 1);
        assert_eq!(mesh.point_count(), 3);
        assert_relative_eq!(*mesh.position(m), Position::new(2.0, 0.0, 0.0));
        assert_eq!(mesh.point(m).marker(), 0);
    }

    #[test]
    fn test_quadrangle_grid_h2() {
        let mut grid = create_2d_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0], 12).unwrap();
        grid.set_all_cell_attributes(1.0);
        let mut fine = grid.create_h2().unwrap();
        // 6 corners + 7 edge midpoints + 2 centers.
        assert_eq!(fine.point_count(), 15);
        assert_eq!(fine.cell_count(), 8);
        assert_relative_eq!(total_size(&fine), 2.0, epsilon = 1e-14);
        // Each of the 7 source edges becomes two.
        assert_eq!(fine.boundary_count(), 14);
        assert_eq!(fine.find_boundaries_by_marker(3..=3).len(), 4);

        fine.create_neighbour_infos(false).unwrap();
        assert_eq!(fine.exterior_boundaries().len(), 12);
        fine.validate_adjacency().unwrap();
    }

    #[test]
    fn test_tetrahedron_h2_conserves_volume() {
        let mesh = mesh_with_cell(Dimension::Three, &unit_tet());
        let fine = mesh.create_h2().unwrap();
        assert_eq!(fine.point_count(), 10);
        assert_eq!(fine.cell_count(), 8);
        assert_relative_eq!(total_size(&fine), 1.0 / 6.0, epsilon = 1e-14);
        for size in fine.cell_sizes() {
            assert_relative_eq!(size, 1.0 / 48.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_vtk_tetrahedra_only_support_p2() {
        let mut mesh = mesh_with_cell(Dimension::Three, &unit_tet());
        mesh.set_tet10_numbering(Tet10Numbering::Vtk);
        assert_eq!(
            mesh.create_h2().unwrap_err(),
            RefinementError::NotImplemented {
                kind: ShapeKind::Tetrahedron,
                mode: RefinementMode::Geometric
            }
        );
        let quadratic = mesh.create_p2().unwrap();
        assert_eq!(quadratic.tet10_numbering(), Tet10Numbering::Vtk);
        let cell = quadratic.cell(CellId::new(0));
        assert_eq!(cell.kind(), ShapeKind::Tetrahedron10);
        // VTK node 6 sits between corners 2 and 0.
        assert_relative_eq!(*quadratic.position(cell.point(6)), Position::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_hexahedron_h2_reuses_face_centers() {
        let mut cube = create_3d_grid(&[0.0, 1.0], &[0.0, 1.0], &[0.0, 1.0], 0).unwrap();
        cube.set_all_cell_attributes(7.0);
        let mut fine = cube.create_h2().unwrap();
        // 8 corners + 12 edges + 6 faces + 1 body center.
        assert_eq!(fine.point_count(), 27);
        assert_eq!(fine.cell_count(), 8);
        assert_eq!(fine.boundary_count(), 24);
        assert_relative_eq!(total_size(&fine), 1.0, epsilon = 1e-13);
        for size in fine.cell_sizes() {
            assert_relative_eq!(size, 0.125, epsilon = 1e-13);
        }
        assert_relative_eq!(*fine.position(PointId::new(26)), Position::new(0.5, 0.5, 0.5));

        fine.create_neighbour_infos(false).unwrap();
        assert_eq!(fine.boundary_count(), 36);
        assert_eq!(fine.exterior_boundaries().len(), 24);
        assert!(fine
            .exterior_boundaries()
            .iter()
            .all(|&b| fine.boundary(b).marker() == 1));
    }

    #[test]
    fn test_prism_h2() {
        let mesh = mesh_with_cell(
            Dimension::Three,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
        );
        let fine = mesh.create_h2().unwrap();
        // 6 corners + 9 edges + 3 lateral face centers.
        assert_eq!(fine.point_count(), 18);
        assert_eq!(fine.cell_count(), 8);
        assert_relative_eq!(total_size(&fine), 0.5, epsilon = 1e-13);
    }

    #[test]
    fn test_pyramid_has_no_subdivision() {
        let mesh = mesh_with_cell(
            Dimension::Three,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
        );
        assert!(matches!(
            mesh.create_h2(),
            Err(RefinementError::NotImplemented {
                kind: ShapeKind::Pyramid,
                ..
            })
        ));
        let quadratic = mesh.create_p2().unwrap();
        assert_eq!(quadratic.cell(CellId::new(0)).kind(), ShapeKind::Pyramid13);
        assert_eq!(quadratic.point_count(), 13);
    }

    #[test]
    fn test_quadratic_input_is_rejected() {
        let mesh = mesh_with_cell(Dimension::Two, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let quadratic = mesh.create_p2().unwrap();
        assert!(matches!(
            quadratic.create_p2(),
            Err(RefinementError::NotImplemented {
                kind: ShapeKind::Triangle6,
                mode: RefinementMode::Quadratic
            })
        ));
    }

    #[test]
    fn test_p2_boundaries_gain_midpoints() {
        let grid = create_2d_grid(&[0.0, 1.0], &[0.0, 1.0], 0).unwrap();
        let quadratic = grid.create_p2().unwrap();
        assert_eq!(quadratic.cell(CellId::new(0)).kind(), ShapeKind::Quadrangle8);
        assert_eq!(quadratic.point_count(), 8);
        assert_eq!(quadratic.boundary_count(), 4);
        assert!(quadratic
            .boundaries()
            .iter()
            .all(|b| b.kind() == ShapeKind::Edge3));
    }

    #[test]
    fn test_1d_h2() {
        let mut mesh = Mesh::new(Dimension::One);
        let a = mesh.create_point(Position::new(0.0, 0.0, 0.0), 0);
        let b = mesh.create_point(Position::new(1.0, 0.0, 0.0), 0);
        mesh.create_cell(&[a, b], 0).unwrap();
        mesh.create_neighbour_infos(false).unwrap();
        let fine = mesh.create_h2().unwrap();
        assert_eq!(fine.cell_count(), 2);
        // Point boundaries are copied, not split.
        assert_eq!(fine.boundary_count(), 2);
    }
}
