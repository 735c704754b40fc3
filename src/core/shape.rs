//! Element kinds, their classification and local topology tables.
//!
//! A cell or boundary is classified once, at creation, from its point count
//! and the mesh dimension. The resulting [`ShapeKind`] carries everything the
//! rest of the crate needs to know about the element: its corner count, the
//! ordered local facets used for adjacency, and (for quadratic kinds) which
//! corner pair each mid-edge node sits between.
//!
//! # Local numbering
//!
//! Corners always come first in an entity's point list. Quadratic kinds append
//! one node per edge in the order of their [`ShapeKind::node_table`].
//!
//! ```text
//! Quadrangle        Tetrahedron        Hexahedron
//!   3 --- 2              3               7 ------ 6
//!   |     |             /|\             /|       /|
//!   |     |            / | \           4 ------ 5 |
//!   0 --- 1           0--|--2          | 3 -----|-2
//!                      \ | /           |/       |/
//!                       \|/            0 ------ 1
//!                        1
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::collections::{LocalIndexBuffer, SmallBuffer};

// =============================================================================
// DIMENSION AND NUMBERING
// =============================================================================

/// Topological dimension of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    /// Line meshes.
    One,
    /// Surface meshes in the xy-plane.
    Two,
    /// Volume meshes.
    #[default]
    Three,
}

impl Dimension {
    /// The dimension as a number.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<usize> for Dimension {
    type Error = ShapeError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(ShapeError::InvalidDimension { dimension: other }),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.as_usize())
    }
}

/// Mid-edge node ordering of ten-node tetrahedra.
///
/// Both conventions put the four corners first; they differ in where each
/// edge midpoint goes. Only [`Zienkiewicz`](Self::Zienkiewicz) supports
/// geometric subdivision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tet10Numbering {
    /// Edges (0,1) (0,2) (0,3) (1,2) (2,3) (3,1).
    #[default]
    Zienkiewicz,
    /// Edges (0,1) (1,2) (2,0) (0,3) (1,3) (2,3).
    Vtk,
}

/// Whether an entity is a cell or a boundary; selects the classification table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRole {
    /// Full-dimensional element.
    Cell,
    /// Element of one dimension lower, between cells.
    Boundary,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while classifying an entity.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShapeError {
    /// No element kind has this point count in this dimension.
    #[error("No {role:?} shape with {point_count} points exists in a {dimension} mesh")]
    Unmapped {
        /// Cell or boundary.
        role: EntityRole,
        /// Number of points supplied.
        point_count: usize,
        /// Mesh dimension.
        dimension: Dimension,
    },
    /// The point list names the same point twice.
    #[error("Point list repeats point {point} (positions {first} and {second})")]
    DuplicatePoint {
        /// Repeated point index.
        point: usize,
        /// First local position.
        first: usize,
        /// Second local position.
        second: usize,
    },
    /// A numeric dimension outside 1..=3.
    #[error("Invalid mesh dimension {dimension}: expected 1, 2 or 3")]
    InvalidDimension {
        /// The rejected value.
        dimension: usize,
    },
}

// =============================================================================
// SHAPE KIND
// =============================================================================

/// The closed set of element kinds a mesh can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Single point: 1D boundaries and degenerate cells.
    Point,
    /// Two-node line.
    Edge,
    /// Three-node quadratic line.
    Edge3,
    /// Three-node triangle.
    Triangle,
    /// Six-node quadratic triangle.
    Triangle6,
    /// Four-node quadrilateral.
    Quadrangle,
    /// Eight-node serendipity quadrilateral.
    Quadrangle8,
    /// Four-node tetrahedron.
    Tetrahedron,
    /// Ten-node quadratic tetrahedron.
    Tetrahedron10,
    /// Eight-node hexahedron.
    Hexahedron,
    /// Twenty-node serendipity hexahedron.
    Hexahedron20,
    /// Six-node triangular prism.
    Prism,
    /// Fifteen-node quadratic prism.
    Prism15,
    /// Five-node pyramid with quadrilateral base.
    Pyramid,
    /// Thirteen-node quadratic pyramid.
    Pyramid13,
}

// Local facets of the linear kinds. Simplex facet j is opposite corner j.
const EDGE_FACETS: &[&[usize]] = &[&[1], &[0]];
const TRIANGLE_FACETS: &[&[usize]] = &[&[1, 2], &[2, 0], &[0, 1]];
const QUADRANGLE_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TETRAHEDRON_FACETS: &[&[usize]] = &[&[1, 2, 3], &[2, 0, 3], &[0, 1, 3], &[0, 2, 1]];
const HEXAHEDRON_FACETS: &[&[usize]] = &[
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[0, 1, 5, 4],
    &[4, 5, 6, 7],
    &[0, 3, 2, 1],
];
const PRISM_FACETS: &[&[usize]] = &[
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
    &[0, 1, 4, 3],
    &[3, 4, 5],
    &[0, 2, 1],
];
const PYRAMID_FACETS: &[&[usize]] = &[
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
    &[0, 1, 4],
    &[0, 3, 2, 1],
];

// Node tables: entry k gives the corner pair node k sits between; corners map
// to themselves.
const POINT_NODES: &[[usize; 2]] = &[[0, 0]];
const EDGE_NODES: &[[usize; 2]] = &[[0, 0], [1, 1], [0, 1]];
const TRIANGLE_NODES: &[[usize; 2]] = &[[0, 0], [1, 1], [2, 2], [0, 1], [1, 2], [2, 0]];
const QUADRANGLE_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
];
const TET_ZIENKIEWICZ_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [0, 1],
    [0, 2],
    [0, 3],
    [1, 2],
    [2, 3],
    [3, 1],
];
const TET_VTK_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [0, 1],
    [1, 2],
    [2, 0],
    [0, 3],
    [1, 3],
    [2, 3],
];
const HEXAHEDRON_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [4, 4],
    [5, 5],
    [6, 6],
    [7, 7],
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];
const PRISM_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [4, 4],
    [5, 5],
    [0, 1],
    [1, 2],
    [2, 0],
    [3, 4],
    [4, 5],
    [5, 3],
    [0, 3],
    [1, 4],
    [2, 5],
];
const PYRAMID_NODES: &[[usize; 2]] = &[
    [0, 0],
    [1, 1],
    [2, 2],
    [3, 3],
    [4, 4],
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [0, 4],
    [1, 4],
    [2, 4],
    [3, 4],
];

impl ShapeKind {
    /// Classifies a cell by point count within a mesh of `dimension`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Unmapped`] when no cell kind has `point_count`
    /// points in this dimension.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meshtopo::core::shape::{Dimension, ShapeKind};
    ///
    /// assert_eq!(ShapeKind::classify_cell(4, Dimension::Two).unwrap(), ShapeKind::Quadrangle);
    /// assert_eq!(ShapeKind::classify_cell(4, Dimension::Three).unwrap(), ShapeKind::Tetrahedron);
    /// assert!(ShapeKind::classify_cell(7, Dimension::Three).is_err());
    /// ```
    pub const fn classify_cell(point_count: usize, dimension: Dimension) -> Result<Self, ShapeError> {
        let kind = match (point_count, dimension) {
            (1, _) => Self::Point,
            (2, _) => Self::Edge,
            (3, Dimension::One) => Self::Edge3,
            (3, _) => Self::Triangle,
            (4, Dimension::Three) => Self::Tetrahedron,
            (4, _) => Self::Quadrangle,
            (5, _) => Self::Pyramid,
            (6, Dimension::Two) => Self::Triangle6,
            (6, _) => Self::Prism,
            (8, Dimension::Two) => Self::Quadrangle8,
            (8, _) => Self::Hexahedron,
            (10, _) => Self::Tetrahedron10,
            (13, _) => Self::Pyramid13,
            (15, _) => Self::Prism15,
            (20, _) => Self::Hexahedron20,
            _ => {
                return Err(ShapeError::Unmapped {
                    role: EntityRole::Cell,
                    point_count,
                    dimension,
                });
            }
        };
        Ok(kind)
    }

    /// Classifies a boundary by point count within a mesh of `dimension`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Unmapped`] when no boundary kind has
    /// `point_count` points in this dimension.
    pub const fn classify_boundary(
        point_count: usize,
        dimension: Dimension,
    ) -> Result<Self, ShapeError> {
        let kind = match (point_count, dimension) {
            (1, _) => Self::Point,
            (2, _) => Self::Edge,
            (3, Dimension::Two) => Self::Edge3,
            (3, _) => Self::Triangle,
            (4, _) => Self::Quadrangle,
            (6, _) => Self::Triangle6,
            (8, Dimension::Three) => Self::Quadrangle8,
            _ => {
                return Err(ShapeError::Unmapped {
                    role: EntityRole::Boundary,
                    point_count,
                    dimension,
                });
            }
        };
        Ok(kind)
    }

    /// Classifies an entity for `role`.
    ///
    /// # Errors
    ///
    /// See [`classify_cell`](Self::classify_cell) and
    /// [`classify_boundary`](Self::classify_boundary).
    pub const fn classify(
        role: EntityRole,
        point_count: usize,
        dimension: Dimension,
    ) -> Result<Self, ShapeError> {
        match role {
            EntityRole::Cell => Self::classify_cell(point_count, dimension),
            EntityRole::Boundary => Self::classify_boundary(point_count, dimension),
        }
    }

    /// Total number of nodes, corners plus mid-edge nodes.
    #[must_use]
    pub const fn point_count(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Edge => 2,
            Self::Edge3 | Self::Triangle => 3,
            Self::Quadrangle | Self::Tetrahedron => 4,
            Self::Pyramid => 5,
            Self::Triangle6 | Self::Prism => 6,
            Self::Quadrangle8 | Self::Hexahedron => 8,
            Self::Tetrahedron10 => 10,
            Self::Pyramid13 => 13,
            Self::Prism15 => 15,
            Self::Hexahedron20 => 20,
        }
    }

    /// Number of corner nodes.
    #[must_use]
    pub const fn corner_count(self) -> usize {
        self.linear().point_count()
    }

    /// Topological dimension of the element itself.
    #[must_use]
    pub const fn topological_dimension(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Edge | Self::Edge3 => 1,
            Self::Triangle | Self::Triangle6 | Self::Quadrangle | Self::Quadrangle8 => 2,
            _ => 3,
        }
    }

    /// Whether the kind carries mid-edge nodes.
    #[must_use]
    pub const fn is_quadratic(self) -> bool {
        matches!(
            self,
            Self::Edge3
                | Self::Triangle6
                | Self::Quadrangle8
                | Self::Tetrahedron10
                | Self::Hexahedron20
                | Self::Prism15
                | Self::Pyramid13
        )
    }

    /// The corner-only kind underlying this one.
    #[must_use]
    pub const fn linear(self) -> Self {
        match self {
            Self::Edge3 => Self::Edge,
            Self::Triangle6 => Self::Triangle,
            Self::Quadrangle8 => Self::Quadrangle,
            Self::Tetrahedron10 => Self::Tetrahedron,
            Self::Hexahedron20 => Self::Hexahedron,
            Self::Prism15 => Self::Prism,
            Self::Pyramid13 => Self::Pyramid,
            other => other,
        }
    }

    /// The quadratic counterpart of a linear kind; quadratic kinds and points
    /// map to themselves.
    #[must_use]
    pub const fn quadratic(self) -> Self {
        match self {
            Self::Edge => Self::Edge3,
            Self::Triangle => Self::Triangle6,
            Self::Quadrangle => Self::Quadrangle8,
            Self::Tetrahedron => Self::Tetrahedron10,
            Self::Hexahedron => Self::Hexahedron20,
            Self::Prism => Self::Prism15,
            Self::Pyramid => Self::Pyramid13,
            other => other,
        }
    }

    /// Corner lists of the local facets, in facet order.
    ///
    /// Points have no facets.
    #[must_use]
    pub const fn facet_corners(self) -> &'static [&'static [usize]] {
        match self.linear() {
            Self::Edge => EDGE_FACETS,
            Self::Triangle => TRIANGLE_FACETS,
            Self::Quadrangle => QUADRANGLE_FACETS,
            Self::Tetrahedron => TETRAHEDRON_FACETS,
            Self::Hexahedron => HEXAHEDRON_FACETS,
            Self::Prism => PRISM_FACETS,
            Self::Pyramid => PYRAMID_FACETS,
            _ => &[],
        }
    }

    /// Number of local facets.
    #[must_use]
    pub const fn facet_count(self) -> usize {
        self.facet_corners().len()
    }

    /// Node table of the quadratic counterpart of this kind.
    ///
    /// Entry `k` is the corner pair that node `k` lies between (a corner maps
    /// to itself). Refinement uses it to place midpoints; quadratic facets use
    /// it to locate their mid-edge nodes.
    #[must_use]
    pub const fn node_table(self, numbering: Tet10Numbering) -> &'static [[usize; 2]] {
        match self.linear() {
            Self::Edge => EDGE_NODES,
            Self::Triangle => TRIANGLE_NODES,
            Self::Quadrangle => QUADRANGLE_NODES,
            Self::Tetrahedron => match numbering {
                Tet10Numbering::Zienkiewicz => TET_ZIENKIEWICZ_NODES,
                Tet10Numbering::Vtk => TET_VTK_NODES,
            },
            Self::Hexahedron => HEXAHEDRON_NODES,
            Self::Prism => PRISM_NODES,
            Self::Pyramid => PYRAMID_NODES,
            _ => POINT_NODES,
        }
    }

    /// Local node indices of facet `facet`.
    ///
    /// Linear kinds return the facet corners. Quadratic kinds append the
    /// mid-edge node of every facet edge, in the order a quadratic boundary of
    /// the matching kind expects them.
    ///
    /// # Panics
    ///
    /// Panics if `facet >= self.facet_count()`.
    #[must_use]
    pub fn facet_nodes(self, facet: usize, numbering: Tet10Numbering) -> LocalIndexBuffer {
        let corners = self.facet_corners()[facet];
        let mut nodes: LocalIndexBuffer = corners.iter().copied().collect();
        if !self.is_quadratic() || corners.len() < 2 {
            return nodes;
        }

        let table = self.node_table(numbering);
        let edge_count = if corners.len() == 2 { 1 } else { corners.len() };
        for k in 0..edge_count {
            let a = corners[k];
            let b = corners[(k + 1) % corners.len()];
            if let Some(mid) = mid_node(table, a, b) {
                nodes.push(mid);
            }
        }
        nodes
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Edge => "edge",
            Self::Edge3 => "edge3",
            Self::Triangle => "triangle",
            Self::Triangle6 => "triangle6",
            Self::Quadrangle => "quadrangle",
            Self::Quadrangle8 => "quadrangle8",
            Self::Tetrahedron => "tetrahedron",
            Self::Tetrahedron10 => "tetrahedron10",
            Self::Hexahedron => "hexahedron",
            Self::Hexahedron20 => "hexahedron20",
            Self::Prism => "prism",
            Self::Prism15 => "prism15",
            Self::Pyramid => "pyramid",
            Self::Pyramid13 => "pyramid13",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of the node between corners `a` and `b` (in either order).
fn mid_node(table: &[[usize; 2]], a: usize, b: usize) -> Option<usize> {
    table
        .iter()
        .position(|&[i, j]| i != j && ((i == a && j == b) || (i == b && j == a)))
}

/// Checks that no point index occurs twice in `points`.
///
/// # Errors
///
/// Returns [`ShapeError::DuplicatePoint`] naming the first repeat found.
pub fn check_distinct<T>(points: &[T]) -> Result<(), ShapeError>
where
    T: Copy + PartialEq + Into<usize>,
{
    let mut seen: SmallBuffer<T, 20> = SmallBuffer::new();
    for (second, &point) in points.iter().enumerate() {
        if let Some(first) = seen.iter().position(|&p| p == point) {
            return Err(ShapeError::DuplicatePoint {
                point: point.into(),
                first,
                second,
            });
        }
        seen.push(point);
    }
    Ok(())
}
