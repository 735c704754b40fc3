//! Point location by slope search.
//!
//! Finds the cell containing a query position without scanning the mesh.
//!
//! # Algorithm
//!
//! 1. The nearest mesh point is found through the spatial index, and one of
//!    its incident cells becomes the start cell.
//! 2. The walk tests the current cell with its isoparametric inclusion test.
//!    If the position is outside, the shape function values identify the
//!    facet the position lies beyond, and the walk crosses to the neighbor
//!    across that facet.
//! 3. The walk ends when a containing cell is found, when it leaves the mesh
//!    (no neighbor), or when it re-enters a cell it already visited.
//!
//! In *extensive* mode a failed first walk is followed by walks started from
//! every cell in creation order. Visited cells stay marked across these walks,
//! so the whole fallback touches each cell at most once.
//!
//! When adjacency is not yet known, neighbors are derived cell by cell along
//! the walk instead of for the whole mesh.

use thiserror::Error;

use crate::core::adjacency::{AdjacencyError, create_neighbour_infos_for_cell};
use crate::core::cell::CellId;
use crate::core::collections::{FastHashSet, SpatialIndexError, fast_hash_set_with_capacity};
use crate::core::mesh::Mesh;
use crate::core::point::PointId;
use crate::core::util::DEFAULT_INSIDE_TOLERANCE;
use crate::geometry::position::Position;

/// Error during point location.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LocateError {
    /// The mesh has no points.
    #[error("Cannot locate in an empty mesh")]
    EmptyMesh,

    /// The nearest point is not used by any cell.
    #[error("Nearest point {point} belongs to no cell; the mesh is corrupt or has orphan points")]
    OrphanPoint {
        /// The orphan point.
        point: PointId,
    },

    /// The spatial index could not be used.
    #[error(transparent)]
    SpatialIndex(#[from] SpatialIndexError),

    /// Lazy adjacency derivation failed along the walk.
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
}

/// Options for [`find_cell_with_options`].
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::algorithms::locate::LocateOptionsBuilder;
///
/// let options = LocateOptionsBuilder::default()
///     .extensive(true)
///     .build()
///     .unwrap();
/// assert!(options.extensive);
/// assert_eq!(options.inside_tolerance, 1e-10);
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
#[builder(default)]
pub struct LocateOptions {
    /// Retry from every cell when the first walk fails.
    pub extensive: bool,
    /// Slack on reference coordinates when testing inclusion.
    pub inside_tolerance: f64,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            extensive: false,
            inside_tolerance: DEFAULT_INSIDE_TOLERANCE,
        }
    }
}

/// Outcome of one locator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocateOutcome {
    /// The containing cell, if any.
    pub cell: Option<CellId>,
    /// Number of inclusion tests performed.
    pub steps: usize,
    /// Whether the extensive fallback ran.
    pub used_fallback: bool,
}

/// The point nearest to `position`.
///
/// Builds the spatial index on first use.
///
/// # Errors
///
/// Returns [`LocateError::EmptyMesh`] for a mesh without points and
/// [`LocateError::SpatialIndex`] for a partially built index.
pub fn find_nearest_point(mesh: &mut Mesh, position: &Position) -> Result<PointId, LocateError> {
    if mesh.point_count() == 0 {
        return Err(LocateError::EmptyMesh);
    }
    mesh.fill_spatial_index()?;
    mesh.spatial_index()
        .nearest(position)
        .ok_or(LocateError::EmptyMesh)
}

/// Finds the cell containing `position`.
///
/// # Errors
///
/// See [`find_cell_with_options`].
pub fn find_cell(
    mesh: &mut Mesh,
    position: &Position,
    extensive: bool,
) -> Result<Option<CellId>, LocateError> {
    let options = LocateOptions {
        extensive,
        ..LocateOptions::default()
    };
    Ok(find_cell_with_options(mesh, position, &options)?.cell)
}

/// Finds the cell containing `position`, reporting walk statistics.
///
/// A position outside the mesh yields `cell: None`; this is not an error.
///
/// # Errors
///
/// Returns [`LocateError::EmptyMesh`] for a mesh without points,
/// [`LocateError::OrphanPoint`] when the nearest point has no cells,
/// [`LocateError::SpatialIndex`] for a partially built index, and
/// [`LocateError::Adjacency`] when lazy adjacency derivation fails.
pub fn find_cell_with_options(
    mesh: &mut Mesh,
    position: &Position,
    options: &LocateOptions,
) -> Result<LocateOutcome, LocateError> {
    let nearest = find_nearest_point(mesh, position)?;
    let start = *mesh
        .point(nearest)
        .cells()
        .first()
        .ok_or(LocateError::OrphanPoint { point: nearest })?;

    let mut visited = fast_hash_set_with_capacity(16);
    let mut steps = 0;
    if let Some(cell) = slope_search(mesh, position, start, &mut visited, &mut steps, options)? {
        return Ok(LocateOutcome {
            cell: Some(cell),
            steps,
            used_fallback: false,
        });
    }

    if !options.extensive {
        return Ok(LocateOutcome {
            cell: None,
            steps,
            used_fallback: false,
        });
    }

    tracing::debug!(
        x = position.x,
        y = position.y,
        z = position.z,
        steps,
        "slope search failed; walking from every cell"
    );
    visited.clear();
    for index in 0..mesh.cell_count() {
        let start = CellId::new(index);
        if let Some(cell) = slope_search(mesh, position, start, &mut visited, &mut steps, options)? {
            return Ok(LocateOutcome {
                cell: Some(cell),
                steps,
                used_fallback: true,
            });
        }
    }
    Ok(LocateOutcome {
        cell: None,
        steps,
        used_fallback: true,
    })
}

/// Walks from `start` towards `position`; `None` when the walk leaves the mesh
/// or revisits a cell.
fn slope_search(
    mesh: &mut Mesh,
    position: &Position,
    start: CellId,
    visited: &mut FastHashSet<CellId>,
    steps: &mut usize,
    options: &LocateOptions,
) -> Result<Option<CellId>, LocateError> {
    let mut current = Some(start);
    while let Some(cell_id) = current {
        if !visited.insert(cell_id) {
            return Ok(None);
        }
        *steps += 1;

        let inclusion = mesh.cell_inclusion(cell_id, position, options.inside_tolerance);
        if inclusion.inside {
            return Ok(Some(cell_id));
        }

        if !mesh.neighbours_known() {
            create_neighbour_infos_for_cell(mesh, cell_id)?;
        }
        let cell = mesh.cell(cell_id);
        current = inclusion
            .exit_facet(cell.kind())
            .and_then(|facet| cell.neighbour(facet));
    }
    Ok(None)
}

impl Mesh {
    /// The point nearest to `position`; see [`find_nearest_point`].
    ///
    /// # Errors
    ///
    /// See [`find_nearest_point`].
    pub fn find_nearest_point(&mut self, position: &Position) -> Result<PointId, LocateError> {
        find_nearest_point(self, position)
    }

    /// The cell containing `position`; see [`find_cell`].
    ///
    /// # Errors
    ///
    /// See [`find_cell_with_options`].
    pub fn find_cell(
        &mut self,
        position: &Position,
        extensive: bool,
    ) -> Result<Option<CellId>, LocateError> {
        find_cell(self, position, extensive)
    }
}
