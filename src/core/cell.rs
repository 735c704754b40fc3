//! Mesh cells: full-dimensional elements.
//!
//! A [`Cell`] stores its classified [`ShapeKind`], the ordered point list
//! (corners first), an integer marker, a floating attribute and one slot per
//! local facet for the neighboring cell and the boundary entity covering that
//! facet. The facet slots are filled by
//! [`create_neighbour_infos`](crate::core::adjacency::create_neighbour_infos).
//!
//! # Examples
//!
//! ```rust
//! use meshtopo::prelude::*;
//!
//! let mut mesh = Mesh::new(Dimension::Two);
//! let a = mesh.create_point(Position::new(0.0, 0.0, 0.0), 0);
//! let b = mesh.create_point(Position::new(1.0, 0.0, 0.0), 0);
//! let c = mesh.create_point(Position::new(0.0, 1.0, 0.0), 0);
//! let cell = mesh.create_cell(&[a, b, c], 7).unwrap();
//!
//! let cell = mesh.cell(cell);
//! assert_eq!(cell.kind(), ShapeKind::Triangle);
//! assert_eq!(cell.marker(), 7);
//! assert_eq!(cell.facet_count(), 3);
//! assert!(cell.neighbours().iter().all(Option::is_none));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::boundary::BoundaryId;
use crate::core::collections::{EntityPointBuffer, FacetBoundaryBuffer, NeighborBuffer};
use crate::core::point::PointId;
use crate::core::shape::{ShapeKind, Tet10Numbering};
use crate::core::util::entity_id;

entity_id! {
    /// Dense id of a cell; equal to its index in the mesh cell arena.
    CellId
}

/// A full-dimensional mesh element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: CellId,
    kind: ShapeKind,
    points: EntityPointBuffer,
    marker: i32,
    attribute: f64,
    neighbours: NeighborBuffer,
    facet_boundaries: FacetBoundaryBuffer,
}

impl Cell {
    pub(crate) fn new(id: CellId, kind: ShapeKind, points: EntityPointBuffer, marker: i32) -> Self {
        let facets = kind.facet_count();
        Self {
            id,
            kind,
            points,
            marker,
            attribute: 0.0,
            neighbours: std::iter::repeat_n(None, facets).collect(),
            facet_boundaries: std::iter::repeat_n(None, facets).collect(),
        }
    }

    /// The cell id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> CellId {
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

    /// Whether `point` belongs to this cell.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, point: PointId) -> bool {
        self.points.contains(&point)
    }

    /// The integer marker.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> i32 {
        self.marker
    }

    /// The floating attribute.
    #[inline]
    #[must_use]
    pub const fn attribute(&self) -> f64 {
        self.attribute
    }

    /// Number of local facets.
    #[inline]
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Per-facet neighbors; `None` when absent or not yet derived.
    #[inline]
    #[must_use]
    pub fn neighbours(&self) -> &[Option<CellId>] {
        &self.neighbours
    }

    /// Neighbor across facet `facet`.
    ///
    /// # Panics
    ///
    /// Panics if `facet >= self.facet_count()`.
    #[inline]
    #[must_use]
    pub fn neighbour(&self, facet: usize) -> Option<CellId> {
        self.neighbours[facet]
    }

    /// Per-facet boundary entities.
    #[inline]
    #[must_use]
    pub fn facet_boundaries(&self) -> &[Option<BoundaryId>] {
        &self.facet_boundaries
    }

    /// Global point ids of local facet `facet`, in facet order.
    ///
    /// # Panics
    ///
    /// Panics if `facet >= self.facet_count()`.
    #[must_use]
    pub fn facet_points(&self, facet: usize, numbering: Tet10Numbering) -> EntityPointBuffer {
        self.kind
            .facet_nodes(facet, numbering)
            .iter()
            .map(|&local| self.points[local])
            .collect()
    }

    /// Local facet whose point set equals `points` (in any order).
    #[must_use]
    pub fn facet_index_of(&self, points: &[PointId], numbering: Tet10Numbering) -> Option<usize> {
        (0..self.facet_count()).find(|&facet| {
            let facet_points = self.facet_points(facet, numbering);
            facet_points.len() == points.len() && points.iter().all(|p| facet_points.contains(p))
        })
    }

    pub(crate) const fn set_marker(&mut self, marker: i32) {
        self.marker = marker;
    }

    pub(crate) const fn set_attribute(&mut self, attribute: f64) {
        self.attribute = attribute;
    }

    pub(crate) fn set_neighbour(&mut self, facet: usize, neighbour: Option<CellId>) {
        self.neighbours[facet] = neighbour;
    }

    pub(crate) fn set_facet_boundary(&mut self, facet: usize, boundary: Option<BoundaryId>) {
        self.facet_boundaries[facet] = boundary;
    }

    pub(crate) fn clear_neighbour_infos(&mut self) {
        self.neighbours.iter_mut().for_each(|n| *n = None);
        self.facet_boundaries.iter_mut().for_each(|b| *b = None);
    }

    pub(crate) fn points_mut(&mut self) -> &mut [PointId] {
        &mut self.points
    }
}
