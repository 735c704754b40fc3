//! Boundary entities: the facets between cells.
//!
//! A [`Boundary`] records which cell lies on each side. The *left* cell is the
//! one whose local facet orientation agrees with the boundary's own (its normal
//! points away from the left cell); the *right* cell is the other one. Exterior
//! boundaries have exactly one side set.

use serde::{Deserialize, Serialize};

use crate::core::cell::CellId;
use crate::core::collections::EntityPointBuffer;
use crate::core::point::PointId;
use crate::core::shape::ShapeKind;
use crate::core::util::entity_id;

entity_id! {
    /// Dense id of a boundary; equal to its index in the mesh boundary arena.
    BoundaryId
}

/// A facet-level mesh entity with left/right cell references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    id: BoundaryId,
    kind: ShapeKind,
    points: EntityPointBuffer,
    marker: i32,
    left: Option<CellId>,
    right: Option<CellId>,
}

impl Boundary {
    pub(crate) fn new(
        id: BoundaryId,
        kind: ShapeKind,
        points: EntityPointBuffer,
        marker: i32,
    ) -> Self {
        Self {
            id,
            kind,
            points,
            marker,
            left: None,
            right: None,
        }
    }

    /// The boundary id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> BoundaryId {
        self.id
    }

    /// The classified element kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// All point ids, corners first.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    /// Point at local index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[inline]
    #[must_use]
    pub fn point(&self, i: usize) -> PointId {
        self.points[i]
    }

    /// Corner point ids.
    #[inline]
    #[must_use]
    pub fn corners(&self) -> &[PointId] {
        &self.points[..self.kind.corner_count()]
    }

    /// The integer marker.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> i32 {
        self.marker
    }

    /// Cell on the left side.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> Option<CellId> {
        self.left
    }

    /// Cell on the right side.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> Option<CellId> {
        self.right
    }

    /// Whether only one side has a cell.
    #[inline]
    #[must_use]
    pub const fn is_exterior(&self) -> bool {
        self.left.is_none() != self.right.is_none()
    }

    /// Whether the point set equals `points`, ignoring order.
    #[must_use]
    pub fn has_point_set(&self, points: &[PointId]) -> bool {
        self.points.len() == points.len() && points.iter().all(|p| self.points.contains(p))
    }

    pub(crate) const fn set_marker(&mut self, marker: i32) {
        self.marker = marker;
    }

    pub(crate) const fn set_left(&mut self, cell: Option<CellId>) {
        self.left = cell;
    }

    pub(crate) const fn set_right(&mut self, cell: Option<CellId>) {
        self.right = cell;
    }

    pub(crate) fn points_mut(&mut self) -> &mut [PointId] {
        &mut self.points
    }
}
