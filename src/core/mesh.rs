//! The mesh entity store.
//!
//! [`Mesh`] owns three dense arenas (points, cells, boundaries) addressed by
//! [`PointId`], [`CellId`] and [`BoundaryId`]. Ids equal arena positions and
//! are never reused; entities are only appended, so ids handed out stay valid
//! for the lifetime of the mesh (until [`clear`](Mesh::clear) or
//! [`renumber_points`](Mesh::renumber_points)).
//!
//! Points carry sorted back-references to the cells and boundaries using them.
//! Those lists are what every topological query intersects: boundary lookup,
//! neighbor discovery, common-cell search.
//!
//! Two derived structures are cached and rebuilt on demand:
//!
//! - the bounding box (`OnceLock`, dropped whenever a position changes)
//! - the [`SpatialIndex`] (built on the first nearest-point query, kept in sync
//!   by [`create_point`](Mesh::create_point), dropped by position transforms)
//!
//! # Examples
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! let mut mesh = Mesh::new(Dimension::Two);
//! let p: Vec<PointId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| mesh.create_point(Position::new(x, y, 0.0), 0))
//!     .collect();
//! mesh.create_cell(&[p[0], p[1], p[2]], 1).unwrap();
//! mesh.create_cell(&[p[0], p[2], p[3]], 2).unwrap();
//!
//! mesh.create_neighbour_infos(false).unwrap();
//! assert!(mesh.neighbours_known());
//! assert_eq!(mesh.boundary_count(), 5);
//! assert_eq!(mesh.find_cells_by_marker(2..=2).len(), 1);
//! ```

// =============================================================================
// IMPORTS
// =============================================================================

use std::ops::RangeBounds;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::adjacency::AdjacencyError;
use crate::core::boundary::{Boundary, BoundaryId};
use crate::core::cell::{Cell, CellId};
use crate::core::collections::{
    EntityPointBuffer, FastHashMap, IncidentCellBuffer, SmallBuffer, SpatialIndex,
    SpatialIndexError,
};
use crate::core::point::{Point, PointId};
use crate::core::shape::{
    Dimension, EntityRole, ShapeError, ShapeKind, Tet10Numbering, check_distinct,
};
use crate::core::util::ATTRIBUTE_TOLERANCE;
use crate::geometry::position::{BoundingBox, Position};
use crate::geometry::shape_functions::{Inclusion, inclusion};
use crate::geometry::util::measures::{boundary_normal, center, shape_size};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by mesh construction and queries.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum MeshError {
    /// Element classification failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A point id outside the point arena.
    #[error("Point {point} does not exist: mesh has {count} points")]
    PointNotFound {
        /// The offending id.
        point: PointId,
        /// Current point count.
        count: usize,
    },
    /// A cell id outside the cell arena.
    #[error("Cell {cell} does not exist: mesh has {count} cells")]
    CellNotFound {
        /// The offending id.
        cell: CellId,
        /// Current cell count.
        count: usize,
    },
    /// A boundary id outside the boundary arena.
    #[error("Boundary {boundary} does not exist: mesh has {count} boundaries")]
    BoundaryNotFound {
        /// The offending id.
        boundary: BoundaryId,
        /// Current boundary count.
        count: usize,
    },
    /// A per-cell array of the wrong length.
    #[error("Expected {expected} per-cell values, got {found}")]
    CellCountMismatch {
        /// Number of cells.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// A point permutation that is not a bijection.
    #[error("Invalid point permutation: {reason}")]
    InvalidPermutation {
        /// What is wrong with it.
        reason: String,
    },
    /// A grid axis with fewer than two coordinates.
    #[error("Grid axis {axis} needs at least 2 coordinates, got {count}")]
    TooFewGridCoordinates {
        /// Axis name.
        axis: char,
        /// Coordinates supplied.
        count: usize,
    },
    /// An operation that needs a mesh of another dimension.
    #[error("Expected a {expected} mesh, got a {found} mesh")]
    DimensionMismatch {
        /// Required dimension.
        expected: Dimension,
        /// Actual dimension.
        found: Dimension,
    },
    /// Spatial index failure.
    #[error(transparent)]
    SpatialIndex(#[from] SpatialIndexError),
    /// Adjacency derivation failure.
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
}

// =============================================================================
// MESH
// =============================================================================

/// Arena-backed store of points, cells and boundaries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mesh {
    dimension: Dimension,
    tet10_numbering: Tet10Numbering,
    points: Vec<Point>,
    cells: Vec<Cell>,
    boundaries: Vec<Boundary>,
    neighbours_known: bool,
    #[serde(skip)]
    bounds: OnceLock<BoundingBox>,
    #[serde(skip)]
    spatial_index: SpatialIndex,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(Dimension::default())
    }
}

impl Mesh {
    /// Creates an empty mesh of the given dimension.
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            tet10_numbering: Tet10Numbering::default(),
            points: Vec::new(),
            cells: Vec::new(),
            boundaries: Vec::new(),
            neighbours_known: false,
            bounds: OnceLock::new(),
            spatial_index: SpatialIndex::default(),
        }
    }

    /// Mesh dimension used to classify new entities.
    #[inline]
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Changes the dimension used to classify entities created from now on.
    ///
    /// Existing entities keep their kinds.
    pub const fn set_dimension(&mut self, dimension: Dimension) {
        self.dimension = dimension;
    }

    /// Ordering convention of ten-node tetrahedra.
    #[inline]
    #[must_use]
    pub const fn tet10_numbering(&self) -> Tet10Numbering {
        self.tet10_numbering
    }

    /// Selects the ten-node tetrahedron ordering.
    pub const fn set_tet10_numbering(&mut self, numbering: Tet10Numbering) {
        self.tet10_numbering = numbering;
    }

    /// Removes every entity and drops the caches.
    pub fn clear(&mut self) {
        self.points.clear();
        self.cells.clear();
        self.boundaries.clear();
        self.neighbours_known = false;
        self.invalidate_geometry();
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Appends a point and returns its id.
    ///
    /// No duplicate check is made; see
    /// [`create_point_with_deduplication`](Self::create_point_with_deduplication).
    pub fn create_point(&mut self, position: Position, marker: i32) -> PointId {
        let id = PointId::new(self.points.len());
        if !self.spatial_index.is_empty() && self.spatial_index.len() == self.points.len() {
            self.spatial_index.insert(id, &position);
        }
        self.points.push(Point::new(id, position, marker));
        self.bounds = OnceLock::new();
        id
    }

    /// Returns an existing point within `tolerance` of `position`, or appends
    /// a new one with `marker`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::SpatialIndex`] if the index is partially built.
    pub fn create_point_with_deduplication(
        &mut self,
        position: Position,
        marker: i32,
        tolerance: f64,
    ) -> Result<PointId, MeshError> {
        self.fill_spatial_index()?;
        if let Some(existing) = self.spatial_index.nearest_within(&position, tolerance) {
            return Ok(existing);
        }
        Ok(self.create_point(position, marker))
    }

    /// Appends a cell over `points`.
    ///
    /// The kind is classified from the point count and the mesh dimension.
    /// Marks adjacency as unknown.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PointNotFound`] for an unknown point id and
    /// [`MeshError::Shape`] for repeated points or an unmapped point count.
    pub fn create_cell(&mut self, points: &[PointId], marker: i32) -> Result<CellId, MeshError> {
        self.check_points(points)?;
        check_distinct(points)?;
        let kind = ShapeKind::classify(EntityRole::Cell, points.len(), self.dimension)?;

        let id = CellId::new(self.cells.len());
        for &p in points {
            self.points[p.index()].add_cell(id);
        }
        self.cells
            .push(Cell::new(id, kind, points.iter().copied().collect(), marker));
        self.neighbours_known = false;
        Ok(id)
    }

    /// Returns the boundary with exactly this point set, or appends a new one.
    ///
    /// An existing boundary keeps its marker.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PointNotFound`] for an unknown point id and
    /// [`MeshError::Shape`] for repeated points or an unmapped point count.
    pub fn create_boundary(
        &mut self,
        points: &[PointId],
        marker: i32,
    ) -> Result<BoundaryId, MeshError> {
        self.check_points(points)?;
        check_distinct(points)?;
        Ok(self.find_or_insert_boundary(points, marker)?)
    }

    /// Find-or-create for point lists already known to be valid.
    pub(crate) fn find_or_insert_boundary(
        &mut self,
        points: &[PointId],
        marker: i32,
    ) -> Result<BoundaryId, ShapeError> {
        if let Some(existing) = self.find_boundary(points) {
            return Ok(existing);
        }
        let kind = ShapeKind::classify(EntityRole::Boundary, points.len(), self.dimension)?;
        let id = BoundaryId::new(self.boundaries.len());
        for &p in points {
            self.points[p.index()].add_boundary(id);
        }
        self.boundaries
            .push(Boundary::new(id, kind, points.iter().copied().collect(), marker));
        Ok(id)
    }

    fn check_points(&self, points: &[PointId]) -> Result<(), MeshError> {
        points
            .iter()
            .find(|p| p.index() >= self.points.len())
            .map_or(Ok(()), |&point| {
                Err(MeshError::PointNotFound {
                    point,
                    count: self.points.len(),
                })
            })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Number of points.
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of boundaries.
    #[inline]
    #[must_use]
    pub fn boundary_count(&self) -> usize {
        self.boundaries.len()
    }

    /// All points in id order.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// All cells in id order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All boundaries in id order.
    #[inline]
    #[must_use]
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// The point with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range; use [`get_point`](Self::get_point) for
    /// a checked lookup.
    #[inline]
    #[must_use]
    pub fn point(&self, id: PointId) -> &Point {
        &self.points[id.index()]
    }

    /// The cell with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    #[must_use]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    /// The boundary with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    #[must_use]
    pub fn boundary(&self, id: BoundaryId) -> &Boundary {
        &self.boundaries[id.index()]
    }

    /// Checked point lookup.
    #[inline]
    #[must_use]
    pub fn get_point(&self, id: PointId) -> Option<&Point> {
        self.points.get(id.index())
    }

    /// Checked cell lookup.
    #[inline]
    #[must_use]
    pub fn get_cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// Checked boundary lookup.
    #[inline]
    #[must_use]
    pub fn get_boundary(&self, id: BoundaryId) -> Option<&Boundary> {
        self.boundaries.get(id.index())
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    pub(crate) fn boundary_mut(&mut self, id: BoundaryId) -> &mut Boundary {
        &mut self.boundaries[id.index()]
    }

    /// Position of point `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    #[must_use]
    pub fn position(&self, id: PointId) -> &Position {
        self.points[id.index()].position()
    }

    /// Positions of `ids`, in order.
    #[must_use]
    pub fn positions_of(&self, ids: &[PointId]) -> SmallBuffer<Position, 8> {
        ids.iter().map(|&id| *self.position(id)).collect()
    }

    /// Positions of every point, in id order.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        self.points.iter().map(|p| *p.position()).collect()
    }

    // =========================================================================
    // MARKERS AND ATTRIBUTES
    // =========================================================================

    /// Sets the marker of a point.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PointNotFound`] for an unknown id.
    pub fn set_point_marker(&mut self, id: PointId, marker: i32) -> Result<(), MeshError> {
        let count = self.points.len();
        self.points
            .get_mut(id.index())
            .ok_or(MeshError::PointNotFound { point: id, count })?
            .set_marker(marker);
        Ok(())
    }

    /// Moves a point and drops the geometric caches.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PointNotFound`] for an unknown id.
    pub fn set_point_position(&mut self, id: PointId, position: Position) -> Result<(), MeshError> {
        let count = self.points.len();
        self.points
            .get_mut(id.index())
            .ok_or(MeshError::PointNotFound { point: id, count })?
            .set_position(position);
        self.invalidate_geometry();
        Ok(())
    }

    /// Sets the marker of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CellNotFound`] for an unknown id.
    pub fn set_cell_marker(&mut self, id: CellId, marker: i32) -> Result<(), MeshError> {
        let count = self.cells.len();
        self.cells
            .get_mut(id.index())
            .ok_or(MeshError::CellNotFound { cell: id, count })?
            .set_marker(marker);
        Ok(())
    }

    /// Sets the attribute of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CellNotFound`] for an unknown id.
    pub fn set_cell_attribute(&mut self, id: CellId, attribute: f64) -> Result<(), MeshError> {
        let count = self.cells.len();
        self.cells
            .get_mut(id.index())
            .ok_or(MeshError::CellNotFound { cell: id, count })?
            .set_attribute(attribute);
        Ok(())
    }

    /// Sets the marker of a boundary.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::BoundaryNotFound`] for an unknown id.
    pub fn set_boundary_marker(&mut self, id: BoundaryId, marker: i32) -> Result<(), MeshError> {
        let count = self.boundaries.len();
        self.boundaries
            .get_mut(id.index())
            .ok_or(MeshError::BoundaryNotFound { boundary: id, count })?
            .set_marker(marker);
        Ok(())
    }

    /// Point markers in id order.
    #[must_use]
    pub fn point_markers(&self) -> Vec<i32> {
        self.points.iter().map(Point::marker).collect()
    }

    /// Cell markers in id order.
    #[must_use]
    pub fn cell_markers(&self) -> Vec<i32> {
        self.cells.iter().map(Cell::marker).collect()
    }

    /// Boundary markers in id order.
    #[must_use]
    pub fn boundary_markers(&self) -> Vec<i32> {
        self.boundaries.iter().map(Boundary::marker).collect()
    }

    /// Cell attributes in id order.
    #[must_use]
    pub fn cell_attributes(&self) -> Vec<f64> {
        self.cells.iter().map(Cell::attribute).collect()
    }

    /// Replaces every cell attribute.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CellCountMismatch`] unless `attributes` has one
    /// value per cell.
    pub fn set_cell_attributes(&mut self, attributes: &[f64]) -> Result<(), MeshError> {
        if attributes.len() != self.cells.len() {
            return Err(MeshError::CellCountMismatch {
                expected: self.cells.len(),
                found: attributes.len(),
            });
        }
        for (cell, &attribute) in self.cells.iter_mut().zip(attributes) {
            cell.set_attribute(attribute);
        }
        Ok(())
    }

    /// Copies each cell's marker into its attribute.
    pub fn attributes_from_markers(&mut self) {
        for cell in &mut self.cells {
            cell.set_attribute(f64::from(cell.marker()));
        }
    }

    /// Sets every cell attribute to `attribute`.
    pub fn set_all_cell_attributes(&mut self, attribute: f64) {
        for cell in &mut self.cells {
            cell.set_attribute(attribute);
        }
    }

    /// Assigns `values[marker]` as attribute to every cell whose marker is a
    /// key of `values`; other cells are left alone.
    pub fn map_cell_attributes(&mut self, values: &FastHashMap<i32, f64>) {
        for cell in &mut self.cells {
            if let Some(&value) = values.get(&cell.marker()) {
                cell.set_attribute(value);
            }
        }
    }

    /// Rewrites boundary markers found as keys of `markers`.
    pub fn map_boundary_markers(&mut self, markers: &FastHashMap<i32, i32>) {
        for boundary in &mut self.boundaries {
            if let Some(&marker) = markers.get(&boundary.marker()) {
                boundary.set_marker(marker);
            }
        }
    }

    // =========================================================================
    // QUERY OPERATIONS
    // =========================================================================

    /// Points whose marker equals `marker`.
    #[must_use]
    pub fn find_points_by_marker(&self, marker: i32) -> Vec<PointId> {
        self.points
            .iter()
            .filter(|p| p.marker() == marker)
            .map(Point::id)
            .collect()
    }

    /// Cells whose marker lies in `range`.
    #[must_use]
    pub fn find_cells_by_marker<R: RangeBounds<i32>>(&self, range: R) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|c| range.contains(&c.marker()))
            .map(Cell::id)
            .collect()
    }

    /// Boundaries whose marker lies in `range`.
    #[must_use]
    pub fn find_boundaries_by_marker<R: RangeBounds<i32>>(&self, range: R) -> Vec<BoundaryId> {
        self.boundaries
            .iter()
            .filter(|b| range.contains(&b.marker()))
            .map(Boundary::id)
            .collect()
    }

    /// Cells selected by attribute.
    ///
    /// With `to == None`, cells whose attribute equals `from` (within
    /// [`ATTRIBUTE_TOLERANCE`]); otherwise cells with `from <= attribute < to`.
    #[must_use]
    pub fn find_cells_by_attribute(&self, from: f64, to: Option<f64>) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|c| {
                let a = c.attribute();
                to.map_or_else(
                    || (a - from).abs() < ATTRIBUTE_TOLERANCE,
                    |to| a >= from && a < to,
                )
            })
            .map(Cell::id)
            .collect()
    }

    /// Boundaries with exactly one neighboring cell.
    #[must_use]
    pub fn exterior_boundaries(&self) -> Vec<BoundaryId> {
        self.boundaries
            .iter()
            .filter(|b| b.is_exterior())
            .map(Boundary::id)
            .collect()
    }

    /// The boundary whose point set equals `points`, in any order.
    #[must_use]
    pub fn find_boundary(&self, points: &[PointId]) -> Option<BoundaryId> {
        let (&first, rest) = points.split_first()?;
        self.get_point(first)?
            .boundaries()
            .iter()
            .copied()
            .find(|&b| {
                let boundary = self.boundary(b);
                boundary.points().len() == points.len()
                    && rest.iter().all(|p| boundary.points().contains(p))
            })
    }

    /// Cells that contain every point of `points`.
    #[must_use]
    pub fn common_cells(&self, points: &[PointId]) -> IncidentCellBuffer {
        let Some((&first, rest)) = points.split_first() else {
            return IncidentCellBuffer::new();
        };
        let Some(first) = self.get_point(first) else {
            return IncidentCellBuffer::new();
        };
        first
            .cells()
            .iter()
            .copied()
            .filter(|&c| {
                rest.iter()
                    .all(|p| self.get_point(*p).is_some_and(|p| p.cells().binary_search(&c).is_ok()))
            })
            .collect()
    }

    /// A cell other than `cell` sharing all of `facet_points`.
    #[must_use]
    pub fn find_neighbour_cell(&self, cell: CellId, facet_points: &[PointId]) -> Option<CellId> {
        self.common_cells(facet_points)
            .into_iter()
            .find(|&c| c != cell)
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// Axis-aligned bounds of all points, cached until a position changes.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if let Some(bbox) = self.bounds.get() {
            return Some(*bbox);
        }
        let bbox = BoundingBox::from_positions(self.points.iter().map(Point::position))?;
        Some(*self.bounds.get_or_init(|| bbox))
    }

    /// Mean of the corner positions of cell `id`.
    #[must_use]
    pub fn cell_center(&self, id: CellId) -> Position {
        center(&self.positions_of(self.cell(id).corners()))
    }

    /// Length, area or volume of cell `id`.
    #[must_use]
    pub fn cell_size(&self, id: CellId) -> f64 {
        let cell = self.cell(id);
        shape_size(cell.kind(), &self.positions_of(cell.corners()))
    }

    /// Mean of the corner positions of boundary `id`.
    #[must_use]
    pub fn boundary_center(&self, id: BoundaryId) -> Position {
        center(&self.positions_of(self.boundary(id).corners()))
    }

    /// Unit normal of boundary `id`, following its point order.
    #[must_use]
    pub fn boundary_normal(&self, id: BoundaryId) -> Position {
        let boundary = self.boundary(id);
        boundary_normal(boundary.kind(), &self.positions_of(boundary.corners()))
    }

    /// Centers of all cells in id order.
    #[must_use]
    pub fn cell_centers(&self) -> Vec<Position> {
        self.cells.iter().map(|c| self.cell_center(c.id())).collect()
    }

    /// Sizes of all cells in id order.
    #[must_use]
    pub fn cell_sizes(&self) -> Vec<f64> {
        self.cells.iter().map(|c| self.cell_size(c.id())).collect()
    }

    /// Inclusion test of `position` against cell `id`.
    #[must_use]
    pub fn cell_inclusion(&self, id: CellId, position: &Position, tolerance: f64) -> Inclusion {
        let cell = self.cell(id);
        inclusion(
            cell.kind(),
            &self.positions_of(cell.corners()),
            position,
            tolerance,
        )
    }

    /// Applies `f` to every position and drops the geometric caches.
    pub(crate) fn map_positions<F>(&mut self, f: F)
    where
        F: Fn(&Position) -> Position,
    {
        for point in &mut self.points {
            let moved = f(point.position());
            point.set_position(moved);
        }
        self.invalidate_geometry();
    }

    // =========================================================================
    // SPATIAL INDEX
    // =========================================================================

    /// Builds the nearest-point index if it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialIndexError::PartiallyBuilt`] when the index holds
    /// some, but not all, points.
    pub fn fill_spatial_index(&mut self) -> Result<(), SpatialIndexError> {
        if self.spatial_index.is_empty() && !self.points.is_empty() {
            self.spatial_index = SpatialIndex::bulk_load(
                self.points.iter().map(|p| (p.id(), p.position())),
            );
            tracing::debug!(points = self.points.len(), "built spatial index");
        }
        self.spatial_index.check_complete(self.points.len())
    }

    /// The nearest-point index in its current state.
    #[must_use]
    pub const fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial_index
    }

    /// Mutable access for tests that need to corrupt the index.
    #[cfg(test)]
    pub(crate) const fn spatial_index_mut(&mut self) -> &mut SpatialIndex {
        &mut self.spatial_index
    }

    fn invalidate_geometry(&mut self) {
        self.bounds = OnceLock::new();
        self.spatial_index.clear();
    }

    // =========================================================================
    // ADJACENCY STATE
    // =========================================================================

    /// Whether neighbor information is complete for every cell.
    #[inline]
    #[must_use]
    pub const fn neighbours_known(&self) -> bool {
        self.neighbours_known
    }

    pub(crate) const fn set_neighbours_known(&mut self, known: bool) {
        self.neighbours_known = known;
    }

    /// Forgets all cell neighbors, facet boundaries and boundary sides.
    ///
    /// Boundary entities themselves are kept.
    pub fn clear_neighbour_infos(&mut self) {
        for cell in &mut self.cells {
            cell.clear_neighbour_infos();
        }
        for boundary in &mut self.boundaries {
            boundary.set_left(None);
            boundary.set_right(None);
        }
        self.neighbours_known = false;
    }

    // =========================================================================
    // RENUMBERING
    // =========================================================================

    /// Moves point `i` to id `permutation[i]`, rewriting every cell and
    /// boundary point list.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidPermutation`] unless `permutation` is a
    /// bijection over the point ids.
    pub fn renumber_points(&mut self, permutation: &[usize]) -> Result<(), MeshError> {
        let count = self.points.len();
        if permutation.len() != count {
            return Err(MeshError::InvalidPermutation {
                reason: format!("length {} does not match {count} points", permutation.len()),
            });
        }
        let mut seen = vec![false; count];
        for &target in permutation {
            if target >= count || std::mem::replace(&mut seen[target], true) {
                return Err(MeshError::InvalidPermutation {
                    reason: format!("target {target} is out of range or repeated"),
                });
            }
        }

        let mut slots: Vec<Option<Point>> = std::iter::repeat_with(|| None).take(count).collect();
        for (old, mut point) in self.points.drain(..).enumerate() {
            let new = PointId::new(permutation[old]);
            point.set_id(new);
            slots[new.index()] = Some(point);
        }
        self.points = slots.into_iter().flatten().collect();

        let remap = |ids: &mut [PointId]| {
            for id in ids {
                *id = PointId::new(permutation[id.index()]);
            }
        };
        for cell in &mut self.cells {
            remap(cell.points_mut());
        }
        for boundary in &mut self.boundaries {
            remap(boundary.points_mut());
        }
        self.spatial_index.clear();
        Ok(())
    }

    /// Point lists of every cell, in id order.
    #[must_use]
    pub fn cell_point_lists(&self) -> Vec<EntityPointBuffer> {
        self.cells
            .iter()
            .map(|c| c.points().iter().copied().collect())
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square_triangles() -> (Mesh, Vec<PointId>) {
        let mut mesh = Mesh::new(Dimension::Two);
        let p: Vec<PointId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| mesh.create_point(Position::new(x, y, 0.0), 0))
            .collect();
        mesh.create_cell(&[p[0], p[1], p[2]], 1).unwrap();
        mesh.create_cell(&[p[0], p[2], p[3]], 2).unwrap();
        (mesh, p)
    }

    #[test]
    fn test_create_cell_sets_back_references() {
        let (mesh, p) = unit_square_triangles();
        assert_eq!(mesh.point(p[0]).cells(), &[CellId::new(0), CellId::new(1)]);
        assert_eq!(mesh.point(p[1]).cells(), &[CellId::new(0)]);
        assert_eq!(mesh.cell(CellId::new(1)).kind(), ShapeKind::Triangle);
    }

    #[test]
    fn test_create_cell_rejects_bad_input() {
        let (mut mesh, p) = unit_square_triangles();
        assert!(matches!(
            mesh.create_cell(&[p[0], PointId::new(42), p[1]], 0),
            Err(MeshError::PointNotFound { count: 4, .. })
        ));
        assert!(matches!(
            mesh.create_cell(&[p[0], p[1], p[0]], 0),
            Err(MeshError::Shape(ShapeError::DuplicatePoint { .. }))
        ));
        let seven: Vec<PointId> = (0..7)
            .map(|i| mesh.create_point(Position::new(f64::from(i), 5.0, 0.0), 0))
            .collect();
        assert!(matches!(
            mesh.create_cell(&seven, 0),
            Err(MeshError::Shape(ShapeError::Unmapped { point_count: 7, .. }))
        ));
        assert_eq!(mesh.cell_count(), 2);
    }

    #[test]
    fn test_create_boundary_is_find_or_create() {
        let (mut mesh, p) = unit_square_triangles();
        let b1 = mesh.create_boundary(&[p[0], p[2]], 5).unwrap();
        let b2 = mesh.create_boundary(&[p[2], p[0]], 9).unwrap();
        assert_eq!(b1, b2);
        assert_eq!(mesh.boundary_count(), 1);
        assert_eq!(mesh.boundary(b1).marker(), 5);
        assert_eq!(mesh.find_boundary(&[p[2], p[0]]), Some(b1));
        assert_eq!(mesh.find_boundary(&[p[1], p[3]]), None);
        assert_eq!(mesh.find_boundary(&[]), None);
    }

    #[test]
    fn test_common_cells_and_neighbour() {
        let (mesh, p) = unit_square_triangles();
        assert_eq!(mesh.common_cells(&[p[0], p[2]]).len(), 2);
        assert_eq!(mesh.common_cells(&[p[1], p[3]]).len(), 0);
        assert_eq!(
            mesh.find_neighbour_cell(CellId::new(0), &[p[2], p[0]]),
            Some(CellId::new(1))
        );
        assert_eq!(mesh.find_neighbour_cell(CellId::new(0), &[p[0], p[1]]), None);
    }

    #[test]
    fn test_marker_and_attribute_queries() {
        let (mut mesh, _) = unit_square_triangles();
        assert_eq!(mesh.find_cells_by_marker(1..3), vec![CellId::new(0), CellId::new(1)]);
        assert_eq!(mesh.find_cells_by_marker(2..), vec![CellId::new(1)]);

        mesh.set_cell_attributes(&[0.5, 2.0]).unwrap();
        assert_eq!(mesh.find_cells_by_attribute(0.5, None), vec![CellId::new(0)]);
        assert_eq!(mesh.find_cells_by_attribute(0.0, Some(3.0)).len(), 2);
        assert_eq!(mesh.find_cells_by_attribute(1.0, Some(2.0)), Vec::<CellId>::new());

        assert!(matches!(
            mesh.set_cell_attributes(&[1.0]),
            Err(MeshError::CellCountMismatch { expected: 2, found: 1 })
        ));
        assert_eq!(mesh.cell_attributes(), vec![0.5, 2.0]);
        assert!(mesh.set_cell_attributes(&[1.0, 1.0, 1.0]).is_err());
        assert_eq!(mesh.cell_attributes(), vec![0.5, 2.0]);

        mesh.attributes_from_markers();
        assert_eq!(mesh.cell_attributes(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_bounding_box_is_invalidated_by_new_points() {
        let (mut mesh, _) = unit_square_triangles();
        let bbox = mesh.bounding_box().unwrap();
        assert_relative_eq!(bbox.max, Position::new(1.0, 1.0, 0.0));

        mesh.create_point(Position::new(3.0, -1.0, 0.0), 0);
        let bbox = mesh.bounding_box().unwrap();
        assert_relative_eq!(bbox.max, Position::new(3.0, 1.0, 0.0));
        assert_relative_eq!(bbox.min, Position::new(0.0, -1.0, 0.0));

        assert!(Mesh::new(Dimension::One).bounding_box().is_none());
    }

    #[test]
    fn test_spatial_index_stays_in_sync() {
        let (mut mesh, _) = unit_square_triangles();
        assert!(mesh.spatial_index().is_empty());
        mesh.fill_spatial_index().unwrap();
        assert_eq!(mesh.spatial_index().len(), 4);

        let q = mesh.create_point(Position::new(5.0, 5.0, 0.0), 0);
        assert_eq!(mesh.spatial_index().len(), 5);
        assert_eq!(mesh.spatial_index().nearest(&Position::new(4.9, 5.0, 0.0)), Some(q));
    }

    #[test]
    fn test_partial_spatial_index_is_an_error() {
        let (mut mesh, _) = unit_square_triangles();
        mesh.spatial_index_mut()
            .insert(PointId::new(0), &Position::zeros());
        assert_eq!(
            mesh.fill_spatial_index(),
            Err(SpatialIndexError::PartiallyBuilt {
                indexed: 1,
                points: 4
            })
        );
    }

    #[test]
    fn test_point_deduplication() {
        let (mut mesh, p) = unit_square_triangles();
        let same = mesh
            .create_point_with_deduplication(Position::new(1.0, 1.0, 1e-9), 0, 1e-6)
            .unwrap();
        assert_eq!(same, p[2]);
        let fresh = mesh
            .create_point_with_deduplication(Position::new(2.0, 2.0, 0.0), 3, 1e-6)
            .unwrap();
        assert_eq!(fresh, PointId::new(4));
        assert_eq!(mesh.point(fresh).marker(), 3);
    }

    #[test]
    fn test_renumber_points() {
        let (mut mesh, _) = unit_square_triangles();
        mesh.renumber_points(&[3, 2, 1, 0]).unwrap();
        assert_relative_eq!(*mesh.position(PointId::new(3)), Position::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.point(PointId::new(3)).id(), PointId::new(3));
        let ids: Vec<usize> = mesh.cell(CellId::new(0)).points().iter().map(|p| p.index()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        // Incidence travels with the point.
        assert_eq!(mesh.point(PointId::new(3)).cells().len(), 2);

        assert!(mesh.renumber_points(&[0, 0, 1, 2]).is_err());
        assert!(mesh.renumber_points(&[0, 1]).is_err());
    }

    #[test]
    fn test_sizes_and_centers() {
        let (mesh, _) = unit_square_triangles();
        let sizes = mesh.cell_sizes();
        assert_relative_eq!(sizes[0], 0.5);
        assert_relative_eq!(sizes[1], 0.5);
        assert_relative_eq!(
            mesh.cell_center(CellId::new(0)),
            Position::new(2.0 / 3.0, 1.0 / 3.0, 0.0)
        );
    }

    #[test]
    fn test_marker_maps() {
        let (mut mesh, p) = unit_square_triangles();
        mesh.set_all_cell_attributes(7.0);
        let values: FastHashMap<i32, f64> = [(2, 0.25)].into_iter().collect();
        mesh.map_cell_attributes(&values);
        assert_eq!(mesh.cell_attributes(), vec![7.0, 0.25]);

        let b = mesh.create_boundary(&[p[0], p[1]], 3).unwrap();
        let markers: FastHashMap<i32, i32> = [(3, 30), (4, 40)].into_iter().collect();
        mesh.map_boundary_markers(&markers);
        assert_eq!(mesh.boundary(b).marker(), 30);
    }

    #[test]
    fn test_set_point_position_invalidates_bounds() {
        let (mut mesh, p) = unit_square_triangles();
        assert_relative_eq!(mesh.bounding_box().unwrap().max, Position::new(1.0, 1.0, 0.0));
        mesh.set_point_position(p[2], Position::new(2.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(mesh.bounding_box().unwrap().max, Position::new(2.0, 3.0, 0.0));
        assert!(mesh.set_point_position(PointId::new(9), Position::zeros()).is_err());
    }

    #[test]
    fn test_clear_resets_everything() {
        let (mut mesh, _) = unit_square_triangles();
        mesh.fill_spatial_index().unwrap();
        mesh.clear();
        assert_eq!(mesh.point_count(), 0);
        assert_eq!(mesh.cell_count(), 0);
        assert!(mesh.spatial_index().is_empty());
        assert!(mesh.bounding_box().is_none());
    }
}
