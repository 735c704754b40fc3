//! Mesh points (nodes).
//!
//! A [`Point`] owns its position and integer marker, and keeps sorted
//! back-references to the cells and boundaries that use it. The back-references
//! exist for traversal only: entities are owned by the [`Mesh`](crate::core::mesh::Mesh)
//! arenas and addressed by id.
//!
//! # Examples
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! let mut mesh = Mesh::new(Dimension::Two);
//! let a = mesh.create_point(Position::new(0.0, 0.0, 0.0), 4);
//! assert_eq!(mesh.point(a).marker(), 4);
//! assert!(mesh.point(a).cells().is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::core::boundary::BoundaryId;
use crate::core::cell::CellId;
use crate::core::collections::{IncidentBoundaryBuffer, IncidentCellBuffer, insert_sorted};
use crate::core::util::entity_id;
use crate::geometry::position::Position;

entity_id! {
    /// Dense id of a point; equal to its index in the mesh point arena.
    PointId
}

/// A mesh node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: PointId,
    position: Position,
    marker: i32,
    cells: IncidentCellBuffer,
    boundaries: IncidentBoundaryBuffer,
}

impl Point {
    pub(crate) fn new(id: PointId, position: Position, marker: i32) -> Self {
        Self {
            id,
            position,
            marker,
            cells: IncidentCellBuffer::new(),
            boundaries: IncidentBoundaryBuffer::new(),
        }
    }

    /// The point id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PointId {
        self.id
    }

    /// The point position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// The integer marker.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> i32 {
        self.marker
    }

    /// Cells using this point, sorted by id.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Boundaries using this point, sorted by id.
    #[inline]
    #[must_use]
    pub fn boundaries(&self) -> &[BoundaryId] {
        &self.boundaries
    }

    /// Euclidean distance to `position`.
    #[must_use]
    pub fn distance(&self, position: &Position) -> f64 {
        (self.position - position).norm()
    }

    pub(crate) const fn set_id(&mut self, id: PointId) {
        self.id = id;
    }

    pub(crate) const fn set_marker(&mut self, marker: i32) {
        self.marker = marker;
    }

    pub(crate) const fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn add_cell(&mut self, cell: CellId) {
        insert_sorted(&mut self.cells, cell);
    }

    pub(crate) fn add_boundary(&mut self, boundary: BoundaryId) {
        insert_sorted(&mut self.boundaries, boundary);
    }
}
