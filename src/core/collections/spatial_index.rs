//! R-tree index over point positions for nearest-point queries.

use std::fmt;

use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};
use thiserror::Error;

use crate::core::point::PointId;
use crate::geometry::position::Position;

type IndexedPoint = GeomWithData<[f64; 3], PointId>;

/// Errors raised by the point spatial index.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpatialIndexError {
    /// The index holds some but not all of the mesh points.
    ///
    /// A partially filled index would answer nearest-point queries with a
    /// point that is not actually nearest, so queries refuse to run.
    #[error("Spatial index is partially built: {indexed} of {points} points indexed")]
    PartiallyBuilt {
        /// Entries in the index.
        indexed: usize,
        /// Points in the mesh.
        points: usize,
    },
}

/// Nearest-neighbor index over the mesh points.
///
/// The index is built lazily by the mesh on the first query and kept in sync
/// with [`create_point`](crate::core::mesh::Mesh::create_point) once built.
/// Position transforms and renumbering drop it.
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Builds an index from `(id, position)` pairs in one bulk load.
    #[must_use]
    pub fn bulk_load<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PointId, &'a Position)>,
    {
        let entries: Vec<IndexedPoint> = entries
            .into_iter()
            .map(|(id, position)| GeomWithData::new(to_array(position), id))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Adds a single point.
    pub fn insert(&mut self, id: PointId, position: &Position) {
        self.tree.insert(GeomWithData::new(to_array(position), id));
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Fails unless the index covers exactly `point_count` points.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialIndexError::PartiallyBuilt`] when the sizes differ.
    pub fn check_complete(&self, point_count: usize) -> Result<(), SpatialIndexError> {
        if self.len() == point_count {
            Ok(())
        } else {
            Err(SpatialIndexError::PartiallyBuilt {
                indexed: self.len(),
                points: point_count,
            })
        }
    }

    /// The indexed point closest to `position`.
    #[must_use]
    pub fn nearest(&self, position: &Position) -> Option<PointId> {
        self.tree
            .nearest_neighbor(&to_array(position))
            .map(|entry| entry.data)
    }

    /// The indexed point closest to `position` together with its distance.
    #[must_use]
    pub fn nearest_with_distance(&self, position: &Position) -> Option<(PointId, f64)> {
        let query = to_array(position);
        self.tree
            .nearest_neighbor(&query)
            .map(|entry| (entry.data, entry.distance_2(&query).sqrt()))
    }

    /// The indexed point closest to `position`, if it lies within `tolerance`.
    #[must_use]
    pub fn nearest_within(&self, position: &Position, tolerance: f64) -> Option<PointId> {
        self.nearest_with_distance(position)
            .filter(|&(_, distance)| distance <= tolerance)
            .map(|(id, _)| id)
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len())
            .finish()
    }
}

fn to_array(position: &Position) -> [f64; 3] {
    [position.x, position.y, position.z]
}
