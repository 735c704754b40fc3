//! Building meshes from parts of other meshes.
//!
//! - [`extract_by_cell_ids`] and [`extract_by_marker`] copy a subset of cells
//!   into a fresh mesh, renumbering points in first-use order
//! - [`extract_by_boundaries`] does the same for a set of boundaries
//! - [`create_hull`] turns the cells of a 2D surface mesh into the boundaries
//!   of a 3D mesh
//! - [`Mesh::copy_cell_from`] and [`Mesh::copy_boundary_from`] merge single
//!   entities into an existing mesh, deduplicating points by position

use std::ops::RangeBounds;

use crate::core::boundary::BoundaryId;
use crate::core::cell::CellId;
use crate::core::collections::{EntityPointBuffer, FastHashMap, fast_hash_map_with_capacity};
use crate::core::mesh::{Mesh, MeshError};
use crate::core::point::PointId;
use crate::core::shape::Dimension;

/// Source-to-target point mapping that creates target points on first use.
struct PointMap<'a> {
    source: &'a Mesh,
    map: FastHashMap<PointId, PointId>,
}

impl<'a> PointMap<'a> {
    fn new(source: &'a Mesh) -> Self {
        Self {
            source,
            map: fast_hash_map_with_capacity(source.point_count()),
        }
    }

    fn map_or_create(&mut self, target: &mut Mesh, points: &[PointId]) -> EntityPointBuffer {
        let source = self.source;
        points
            .iter()
            .map(|&p| {
                *self.map.entry(p).or_insert_with(|| {
                    let point = source.point(p);
                    target.create_point(*point.position(), point.marker())
                })
            })
            .collect()
    }

    fn mapped(&self, points: &[PointId]) -> Option<EntityPointBuffer> {
        points.iter().map(|p| self.map.get(p).copied()).collect()
    }
}

/// Copies the cells `cells` of `source` into a new mesh.
///
/// Points are renumbered in order of first use. Cells keep their marker and
/// attribute. Source boundaries with a nonzero marker are copied when all of
/// their points survive and share a cell of the new mesh. Adjacency of the
/// result is derived, which creates the remaining boundaries with marker `0`.
///
/// # Errors
///
/// Returns [`MeshError::CellNotFound`] for an unknown cell id and
/// [`MeshError::Adjacency`] if adjacency derivation fails.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::algorithms::extract::extract_by_cell_ids;
/// use meshtopo::core::cell::CellId;
/// use meshtopo::geometry::util::grid_generation::create_2d_grid;
///
/// let grid = create_2d_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0], 0).unwrap();
/// let part = extract_by_cell_ids(&grid, &[CellId::new(1)]).unwrap();
/// assert_eq!(part.point_count(), 4);
/// assert_eq!(part.cell_count(), 1);
/// assert_eq!(part.boundary_count(), 4);
/// ```
pub fn extract_by_cell_ids(source: &Mesh, cells: &[CellId]) -> Result<Mesh, MeshError> {
    if let Some(&cell) = cells.iter().find(|c| source.get_cell(**c).is_none()) {
        return Err(MeshError::CellNotFound {
            cell,
            count: source.cell_count(),
        });
    }

    let mut target = Mesh::new(source.dimension());
    target.set_tet10_numbering(source.tet10_numbering());
    let mut points = PointMap::new(source);

    for &id in cells {
        let cell = source.cell(id);
        let mapped = points.map_or_create(&mut target, cell.points());
        let copy = target.create_cell(&mapped, cell.marker())?;
        target.cell_mut(copy).set_attribute(cell.attribute());
    }

    for boundary in source.boundaries().iter().filter(|b| b.marker() != 0) {
        let Some(mapped) = points.mapped(boundary.points()) else {
            continue;
        };
        if !target.common_cells(&mapped).is_empty() {
            target.create_boundary(&mapped, boundary.marker())?;
        }
    }

    target.create_neighbour_infos(false)?;
    tracing::debug!(
        cells = target.cell_count(),
        points = target.point_count(),
        boundaries = target.boundary_count(),
        "extracted sub-mesh"
    );
    Ok(target)
}

/// Copies the cells of `source` whose marker lies in `markers`; see
/// [`extract_by_cell_ids`].
///
/// # Errors
///
/// See [`extract_by_cell_ids`].
pub fn extract_by_marker<R: RangeBounds<i32>>(source: &Mesh, markers: R) -> Result<Mesh, MeshError> {
    extract_by_cell_ids(source, &source.find_cells_by_marker(markers))
}

/// Copies the boundaries `boundaries` of `source` into a new, cell-free mesh.
///
/// Points are renumbered in order of first use; boundaries keep their marker.
///
/// # Errors
///
/// Returns [`MeshError::BoundaryNotFound`] for an unknown boundary id.
pub fn extract_by_boundaries(source: &Mesh, boundaries: &[BoundaryId]) -> Result<Mesh, MeshError> {
    if let Some(&boundary) = boundaries.iter().find(|b| source.get_boundary(**b).is_none()) {
        return Err(MeshError::BoundaryNotFound {
            boundary,
            count: source.boundary_count(),
        });
    }

    let mut target = Mesh::new(source.dimension());
    target.set_tet10_numbering(source.tet10_numbering());
    let mut points = PointMap::new(source);
    for &id in boundaries {
        let boundary = source.boundary(id);
        let mapped = points.map_or_create(&mut target, boundary.points());
        target.create_boundary(&mapped, boundary.marker())?;
    }
    Ok(target)
}

/// Builds a 3D mesh whose boundaries are the cells of the 2D mesh `surface`.
///
/// All points are copied with their ids and markers; each cell becomes a
/// boundary carrying the cell's marker.
///
/// # Errors
///
/// Returns [`MeshError::DimensionMismatch`] unless `surface` is
/// two-dimensional.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::algorithms::extract::create_hull;
/// use meshtopo::core::shape::{Dimension, ShapeKind};
/// use meshtopo::geometry::util::grid_generation::create_2d_grid;
///
/// let surface = create_2d_grid(&[0.0, 1.0], &[0.0, 1.0], 0).unwrap();
/// let hull = create_hull(&surface).unwrap();
/// assert_eq!(hull.dimension(), Dimension::Three);
/// assert_eq!(hull.cell_count(), 0);
/// assert_eq!(hull.boundaries()[0].kind(), ShapeKind::Quadrangle);
/// ```
pub fn create_hull(surface: &Mesh) -> Result<Mesh, MeshError> {
    if surface.dimension() != Dimension::Two {
        return Err(MeshError::DimensionMismatch {
            expected: Dimension::Two,
            found: surface.dimension(),
        });
    }
    let mut hull = Mesh::new(Dimension::Three);
    for point in surface.points() {
        hull.create_point(*point.position(), point.marker());
    }
    for cell in surface.cells() {
        hull.create_boundary(cell.points(), cell.marker())?;
    }
    Ok(hull)
}

impl Mesh {
    /// Copies cell `cell` of `source` into this mesh.
    ///
    /// Each point is matched against existing points within `tolerance` and
    /// created only if none is found; matched or created points take the
    /// source point's marker. The copy keeps the cell's marker and attribute.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CellNotFound`] for an unknown source cell,
    /// [`MeshError::SpatialIndex`] for a corrupt index, and
    /// [`MeshError::Shape`] when deduplication collapses two of the cell's
    /// points into one.
    pub fn copy_cell_from(
        &mut self,
        source: &Self,
        cell: CellId,
        tolerance: f64,
    ) -> Result<CellId, MeshError> {
        let original = source.get_cell(cell).ok_or(MeshError::CellNotFound {
            cell,
            count: source.cell_count(),
        })?;
        let points = self.merge_points(source, original.points(), tolerance)?;
        let copy = self.create_cell(&points, original.marker())?;
        self.cell_mut(copy).set_attribute(original.attribute());
        Ok(copy)
    }

    /// Copies boundary `boundary` of `source` into this mesh.
    ///
    /// Points are deduplicated as in [`copy_cell_from`](Self::copy_cell_from).
    /// An existing boundary over the same points is reused and takes the
    /// source marker.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::BoundaryNotFound`] for an unknown source boundary;
    /// otherwise as [`copy_cell_from`](Self::copy_cell_from).
    pub fn copy_boundary_from(
        &mut self,
        source: &Self,
        boundary: BoundaryId,
        tolerance: f64,
    ) -> Result<BoundaryId, MeshError> {
        let original = source.get_boundary(boundary).ok_or(MeshError::BoundaryNotFound {
            boundary,
            count: source.boundary_count(),
        })?;
        let points = self.merge_points(source, original.points(), tolerance)?;
        let copy = self.create_boundary(&points, original.marker())?;
        self.boundary_mut(copy).set_marker(original.marker());
        Ok(copy)
    }

    fn merge_points(
        &mut self,
        source: &Self,
        points: &[PointId],
        tolerance: f64,
    ) -> Result<EntityPointBuffer, MeshError> {
        points
            .iter()
            .map(|&p| {
                let point = source.point(p);
                let merged =
                    self.create_point_with_deduplication(*point.position(), point.marker(), tolerance)?;
                self.set_point_marker(merged, point.marker())?;
                Ok(merged)
            })
            .collect()
    }

    /// Sub-mesh of the cells whose marker lies in `markers`; see
    /// [`extract_by_marker`].
    ///
    /// # Errors
    ///
    /// See [`extract_by_cell_ids`].
    pub fn extract_by_marker<R: RangeBounds<i32>>(&self, markers: R) -> Result<Self, MeshError> {
        extract_by_marker(self, markers)
    }
}
