//! Cell adjacency and boundary sidedness.
//!
//! For every local facet of every cell, [`create_neighbour_infos`] finds the
//! other cell sharing that facet (if any), finds or creates the boundary
//! entity for it, and records on which side of the boundary each cell lies.
//!
//! A cell is on the *left* of a boundary when its facet orientation agrees with
//! the boundary's:
//!
//! - edge facets (linear or quadratic) compare their first point with the
//!   boundary's first point
//! - face facets test whether the boundary normal points from the cell center
//!   towards the boundary center
//! - single-point facets always agree
//!
//! The per-cell routine is also run lazily by the point locator, which only
//! needs adjacency along its walk.

use thiserror::Error;

use crate::core::boundary::BoundaryId;
use crate::core::cell::CellId;
use crate::core::mesh::Mesh;
use crate::core::point::PointId;
use crate::core::shape::ShapeError;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while deriving or validating adjacency.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdjacencyError {
    /// A boundary ended up without the cell that was just attached to it, or
    /// with the same cell on both sides.
    #[error(
        "Boundary {boundary} is inconsistent after processing cell {cell}: left {left:?}, right {right:?}"
    )]
    CrossCheckFailed {
        /// Cell being processed.
        cell: CellId,
        /// Boundary that failed the check.
        boundary: BoundaryId,
        /// Left side at the time of failure.
        left: Option<CellId>,
        /// Right side at the time of failure.
        right: Option<CellId>,
    },
    /// A facet point list that no boundary kind accepts.
    #[error("Cannot create the boundary for facet {facet} of cell {cell}: {source}")]
    FacetClassification {
        /// Cell owning the facet.
        cell: CellId,
        /// Local facet index.
        facet: usize,
        /// Classification failure.
        source: ShapeError,
    },
    /// A cell that does not list a boundary claiming it as a side.
    #[error("Boundary {boundary} names cell {cell} as a side, but the cell lists it {count} times")]
    SideNotListed {
        /// The boundary.
        boundary: BoundaryId,
        /// The side cell.
        cell: CellId,
        /// How often the cell lists the boundary among its facet boundaries.
        count: usize,
    },
    /// Neighbor links that are not mutual.
    #[error("Cell {cell} names {neighbour} as neighbor across facet {facet}, but not vice versa")]
    AsymmetricNeighbours {
        /// Cell naming the neighbor.
        cell: CellId,
        /// Local facet.
        facet: usize,
        /// The named neighbor.
        neighbour: CellId,
    },
}

// =============================================================================
// NEIGHBOR & BOUNDARY ASSIGNMENT
// =============================================================================

/// Derives neighbors and boundary sides for the whole mesh.
///
/// Does nothing when adjacency is already known, unless `force` is set, in
/// which case all derived information is cleared first. Boundaries created by
/// an earlier pass are reused.
///
/// # Errors
///
/// Returns [`AdjacencyError::CrossCheckFailed`] when the mesh is
/// non-conforming (a facet shared by more than two cells, or two cells with
/// conflicting facet orientations), and
/// [`AdjacencyError::FacetClassification`] when a facet has no boundary kind.
pub fn create_neighbour_infos(mesh: &mut Mesh, force: bool) -> Result<(), AdjacencyError> {
    if mesh.neighbours_known() && !force {
        return Ok(());
    }
    mesh.clear_neighbour_infos();

    let boundaries_before = mesh.boundary_count();
    for index in 0..mesh.cell_count() {
        create_neighbour_infos_for_cell(mesh, CellId::new(index))?;
    }
    mesh.set_neighbours_known(true);

    tracing::debug!(
        cells = mesh.cell_count(),
        boundaries = mesh.boundary_count(),
        created = mesh.boundary_count() - boundaries_before,
        "derived neighbour information"
    );
    Ok(())
}

/// Derives neighbors and boundary sides for the facets of one cell.
///
/// Facets that already have a neighbor are skipped.
///
/// # Errors
///
/// See [`create_neighbour_infos`].
pub fn create_neighbour_infos_for_cell(
    mesh: &mut Mesh,
    cell_id: CellId,
) -> Result<(), AdjacencyError> {
    let numbering = mesh.tet10_numbering();
    for facet in 0..mesh.cell(cell_id).facet_count() {
        if mesh.cell(cell_id).neighbour(facet).is_some() {
            continue;
        }

        let facet_points = mesh.cell(cell_id).facet_points(facet, numbering);
        let neighbour = mesh.find_neighbour_cell(cell_id, &facet_points);
        mesh.cell_mut(cell_id).set_neighbour(facet, neighbour);

        let boundary_id = mesh
            .find_or_insert_boundary(&facet_points, 0)
            .map_err(|source| AdjacencyError::FacetClassification {
                cell: cell_id,
                facet,
                source,
            })?;
        mesh.cell_mut(cell_id)
            .set_facet_boundary(facet, Some(boundary_id));

        let is_left = cell_is_left(mesh, cell_id, boundary_id, &facet_points);
        assign_sides(mesh, cell_id, boundary_id, neighbour, is_left);

        let boundary = mesh.boundary(boundary_id);
        let (left, right) = (boundary.left(), boundary.right());
        if (left != Some(cell_id) && right != Some(cell_id)) || left == right {
            tracing::error!(
                cell = %cell_id,
                boundary = %boundary_id,
                ?left,
                ?right,
                "boundary sides inconsistent; mesh is probably non-conforming"
            );
            return Err(AdjacencyError::CrossCheckFailed {
                cell: cell_id,
                boundary: boundary_id,
                left,
                right,
            });
        }
    }
    Ok(())
}

/// Fills the empty side of `boundary_id` with `cell_id`, and the opposite side
/// with `neighbour` when that is still empty too.
fn assign_sides(
    mesh: &mut Mesh,
    cell_id: CellId,
    boundary_id: BoundaryId,
    neighbour: Option<CellId>,
    cell_is_left: bool,
) {
    let boundary = mesh.boundary_mut(boundary_id);
    if boundary.left().is_none() && cell_is_left {
        if boundary.right() == Some(cell_id) {
            return;
        }
        boundary.set_left(Some(cell_id));
        if neighbour.is_some() && boundary.right().is_none() {
            boundary.set_right(neighbour);
        }
    } else if boundary.right().is_none() {
        if boundary.left() == Some(cell_id) {
            return;
        }
        boundary.set_right(Some(cell_id));
        if neighbour.is_some() && boundary.left().is_none() {
            boundary.set_left(neighbour);
        }
    }
}

/// Whether the facet of `cell_id` given by `facet_points` agrees in
/// orientation with boundary `boundary_id`.
fn cell_is_left(
    mesh: &Mesh,
    cell_id: CellId,
    boundary_id: BoundaryId,
    facet_points: &[PointId],
) -> bool {
    let boundary = mesh.boundary(boundary_id);
    match boundary.kind().corner_count() {
        0 | 1 => true,
        2 => facet_points[0] == boundary.point(0),
        _ => normal_shows_outside(mesh, boundary_id, cell_id),
    }
}

/// Whether the normal of `boundary_id` points away from the center of `cell_id`.
#[must_use]
pub fn normal_shows_outside(mesh: &Mesh, boundary_id: BoundaryId, cell_id: CellId) -> bool {
    let outward = mesh.boundary_center(boundary_id) - mesh.cell_center(cell_id);
    mesh.boundary_normal(boundary_id).dot(&outward) > 0.0
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Checks the consistency of derived adjacency.
///
/// Every side cell of a boundary must list that boundary exactly once among
/// its facet boundaries, no boundary may have the same cell on both sides,
/// and every neighbor link must be mutual.
///
/// # Errors
///
/// Returns the first inconsistency found.
pub fn validate_adjacency(mesh: &Mesh) -> Result<(), AdjacencyError> {
    for boundary in mesh.boundaries() {
        let (left, right) = (boundary.left(), boundary.right());
        match (left, right) {
            (Some(l), Some(r)) if l == r => {
                return Err(AdjacencyError::CrossCheckFailed {
                    cell: l,
                    boundary: boundary.id(),
                    left,
                    right,
                });
            }
            _ => {}
        }
        for side in [left, right].into_iter().flatten() {
            let count = mesh
                .cell(side)
                .facet_boundaries()
                .iter()
                .filter(|&&b| b == Some(boundary.id()))
                .count();
            if count != 1 {
                return Err(AdjacencyError::SideNotListed {
                    boundary: boundary.id(),
                    cell: side,
                    count,
                });
            }
        }
    }

    for cell in mesh.cells() {
        for (facet, neighbour) in cell.neighbours().iter().enumerate() {
            let Some(neighbour) = *neighbour else {
                continue;
            };
            if !mesh.cell(neighbour).neighbours().contains(&Some(cell.id())) {
                return Err(AdjacencyError::AsymmetricNeighbours {
                    cell: cell.id(),
                    facet,
                    neighbour,
                });
            }
        }
    }
    Ok(())
}

impl Mesh {
    /// Derives neighbors and boundary sides; see [`create_neighbour_infos`].
    ///
    /// # Errors
    ///
    /// See [`create_neighbour_infos`].
    pub fn create_neighbour_infos(&mut self, force: bool) -> Result<(), AdjacencyError> {
        create_neighbour_infos(self, force)
    }

    /// Checks derived adjacency; see [`validate_adjacency`].
    ///
    /// # Errors
    ///
    /// See [`validate_adjacency`].
    pub fn validate_adjacency(&self) -> Result<(), AdjacencyError> {
        validate_adjacency(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::{Dimension, ShapeKind};
    use crate::geometry::position::Position;

    fn init_tracing() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }

    fn add_points(mesh: &mut Mesh, coords: &[[f64; 3]]) -> Vec<PointId> {
        coords
            .iter()
            .map(|&[x, y, z]| mesh.create_point(Position::new(x, y, z), 0))
            .collect()
    }

    #[test]
    fn test_two_triangles_share_one_boundary() {
        init_tracing();
        let mut mesh = Mesh::new(Dimension::Two);
        let p = add_points(
            &mut mesh,
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        );
        let c0 = mesh.create_cell(&[p[0], p[1], p[2]], 0).unwrap();
        let c1 = mesh.create_cell(&[p[0], p[2], p[3]], 0).unwrap();

        create_neighbour_infos(&mut mesh, false).unwrap();

        assert_eq!(mesh.boundary_count(), 5);
        // Facet 1 of c0 is (p2, p0); facet 0 of c1 is (p2, p3).
        assert_eq!(mesh.cell(c0).neighbour(1), Some(c1));
        assert_eq!(mesh.cell(c1).neighbour(2), Some(c0));
        let shared = mesh.find_boundary(&[p[0], p[2]]).unwrap();
        let boundary = mesh.boundary(shared);
        assert_eq!(boundary.left(), Some(c0));
        assert_eq!(boundary.right(), Some(c1));
        assert_eq!(mesh.exterior_boundaries().len(), 4);
        validate_adjacency(&mesh).unwrap();
    }

    #[test]
    fn test_exterior_edges_keep_cell_on_left() {
        let mut mesh = Mesh::new(Dimension::Two);
        let p = add_points(&mut mesh, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let c = mesh.create_cell(&[p[0], p[1], p[2]], 0).unwrap();
        create_neighbour_infos(&mut mesh, false).unwrap();
        for boundary in mesh.boundaries() {
            assert_eq!(boundary.left(), Some(c));
            assert_eq!(boundary.right(), None);
            // Counter-clockwise triangle: every exterior normal points outwards.
            assert!(normal_shows_outside(&mesh, boundary.id(), c));
        }
    }

    #[test]
    fn test_edge3_facets_use_the_point_order_rule() {
        init_tracing();
        // Clockwise six-node triangle: corners, then midpoints of (0,1) (1,2) (2,0).
        let mut mesh = Mesh::new(Dimension::Two);
        let p = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.5, 0.0],
                [0.5, 0.5, 0.0],
                [0.5, 0.0, 0.0],
            ],
        );
        let c = mesh.create_cell(&p, 0).unwrap();
        create_neighbour_infos(&mut mesh, false).unwrap();

        assert_eq!(mesh.boundary_count(), 3);
        for boundary in mesh.boundaries() {
            assert_eq!(boundary.kind(), ShapeKind::Edge3);
            assert_eq!(boundary.left(), Some(c));
            assert_eq!(boundary.right(), None);
            // Clockwise cell: the edge normals point inwards.
            assert!(!normal_shows_outside(&mesh, boundary.id(), c));
        }
        validate_adjacency(&mesh).unwrap();
    }

    #[test]
    fn test_prism_and_tetrahedron_share_a_triangle() {
        let mut mesh = Mesh::new(Dimension::Three);
        let p = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [0.3, 0.3, 2.0],
            ],
        );
        let prism = mesh
            .create_cell(&[p[0], p[1], p[2], p[3], p[4], p[5]], 0)
            .unwrap();
        let tet = mesh.create_cell(&[p[3], p[4], p[5], p[6]], 0).unwrap();
        create_neighbour_infos(&mut mesh, false).unwrap();

        // Prism facet 3 is the top triangle (3, 4, 5).
        assert_eq!(mesh.cell(prism).neighbour(3), Some(tet));
        let top = mesh.find_boundary(&[p[3], p[4], p[5]]).unwrap();
        let boundary = mesh.boundary(top);
        assert!(boundary.left().is_some() && boundary.right().is_some());
        assert_ne!(boundary.left(), boundary.right());
        assert_eq!(mesh.boundary_count(), 5 + 3);
        validate_adjacency(&mesh).unwrap();
    }

    #[test]
    fn test_rerun_without_force_is_a_no_op() {
        let mut mesh = Mesh::new(Dimension::One);
        let p = add_points(&mut mesh, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        mesh.create_cell(&[p[0], p[1]], 0).unwrap();
        mesh.create_cell(&[p[1], p[2]], 0).unwrap();
        mesh.create_neighbour_infos(false).unwrap();
        assert_eq!(mesh.boundary_count(), 3);

        mesh.create_neighbour_infos(false).unwrap();
        mesh.create_neighbour_infos(true).unwrap();
        assert_eq!(mesh.boundary_count(), 3);
        mesh.validate_adjacency().unwrap();
    }

    #[test]
    fn test_facet_shared_by_three_cells_fails_cross_check() {
        init_tracing();
        let mut mesh = Mesh::new(Dimension::Two);
        let p = add_points(
            &mut mesh,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, -1.0, 0.0],
                [0.5, 2.0, 0.0],
            ],
        );
        mesh.create_cell(&[p[0], p[1], p[2]], 0).unwrap();
        mesh.create_cell(&[p[1], p[0], p[3]], 0).unwrap();
        mesh.create_cell(&[p[0], p[1], p[4]], 0).unwrap();
        let err = create_neighbour_infos(&mut mesh, false).unwrap_err();
        assert!(matches!(err, AdjacencyError::CrossCheckFailed { .. }));
        assert!(!mesh.neighbours_known());
    }
}
