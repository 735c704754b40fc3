use crate::core::boundary::BoundaryId;
use crate::core::cell::CellId;
use crate::core::point::PointId;

use super::{INCIDENCE_BUFFER_SIZE, MAX_FACETS, MAX_LINEAR_POINTS, SmallBuffer};

// =============================================================================
// ENTITY BUFFERS
// =============================================================================

/// Ordered point list of a cell or boundary.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::collections::EntityPointBuffer;
/// use meshtopo::core::point::PointId;
///
/// let points: EntityPointBuffer = [0, 1, 2].into_iter().map(PointId::new).collect();
/// assert_eq!(points.len(), 3);
/// assert!(!points.spilled());
/// ```
pub type EntityPointBuffer = SmallBuffer<PointId, MAX_LINEAR_POINTS>;

/// Local point indices of one facet, in facet order.
pub type LocalIndexBuffer = SmallBuffer<usize, MAX_LINEAR_POINTS>;

/// Per-facet neighbor slots of a cell; `None` means "no neighbor" (mesh exterior)
/// or "not yet derived".
pub type NeighborBuffer = SmallBuffer<Option<CellId>, MAX_FACETS>;

/// Per-facet boundary slots of a cell.
pub type FacetBoundaryBuffer = SmallBuffer<Option<BoundaryId>, MAX_FACETS>;

/// Back-references from a point to the cells using it.
pub type IncidentCellBuffer = SmallBuffer<CellId, INCIDENCE_BUFFER_SIZE>;

/// Back-references from a point to the boundaries using it.
pub type IncidentBoundaryBuffer = SmallBuffer<BoundaryId, INCIDENCE_BUFFER_SIZE>;

/// Shape function values at a query position, one per corner.
pub type ShapeFunctionBuffer = SmallBuffer<f64, MAX_LINEAR_POINTS>;

/// Inserts `value` into a sorted buffer unless already present.
///
/// Incidence lists stay sorted and duplicate-free so that intersections over
/// several points' lists are a linear merge.
pub(crate) fn insert_sorted<T: Ord + Copy, const N: usize>(buffer: &mut SmallBuffer<T, N>, value: T)
where
    [T; N]: smallvec::Array<Item = T>,
{
    if let Err(position) = buffer.binary_search(&value) {
        buffer.insert(position, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sorted_keeps_order_and_skips_duplicates() {
        let mut cells = IncidentCellBuffer::new();
        for id in [3, 1, 2, 3, 1] {
            insert_sorted(&mut cells, CellId::new(id));
        }
        let ids: Vec<usize> = cells.iter().map(|c| c.index()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_neighbor_buffer_defaults_to_unknown() {
        let neighbors: NeighborBuffer = std::iter::repeat_n(None, 4).collect();
        assert!(neighbors.iter().all(Option::is_none));
        assert!(!neighbors.spilled());
    }
}
