//! Point positions and axis-aligned bounds.
//!
//! Positions are always three-dimensional; 1D and 2D meshes simply leave the
//! trailing coordinates at zero. The mesh dimension decides which coordinates
//! take part in shape classification and point inclusion.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Cartesian position of a mesh point.
pub type Position = Vector3<f64>;

/// Axis-aligned bounding box of a set of positions.
///
/// # Examples
///
/// ```rust
/// use meshtopo::geometry::position::{BoundingBox, Position};
///
/// let bbox = BoundingBox::from_positions(&[
///     Position::new(0.0, 1.0, 0.0),
///     Position::new(2.0, -1.0, 3.0),
/// ])
/// .unwrap();
/// assert_eq!(bbox.min, Position::new(0.0, -1.0, 0.0));
/// assert_eq!(bbox.max, Position::new(2.0, 1.0, 3.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Component-wise minimum.
    pub min: Position,
    /// Component-wise maximum.
    pub max: Position,
}

impl BoundingBox {
    /// Bounds of `positions`, or `None` when there are none.
    #[must_use]
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut iter = positions.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |bbox, p| Self {
                min: bbox.min.inf(p),
                max: bbox.max.sup(p),
            },
        ))
    }

    /// Edge lengths of the box.
    #[must_use]
    pub fn extent(&self) -> Position {
        self.max - self.min
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Position {
        (self.min + self.max) * 0.5
    }

    /// Whether `position` lies inside the box (closed on all faces).
    #[must_use]
    pub fn contains(&self, position: &Position) -> bool {
        (0..3).all(|i| position[i] >= self.min[i] && position[i] <= self.max[i])
    }
}
