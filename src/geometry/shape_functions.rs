//! Linear shape functions and isoparametric point inclusion.
//!
//! Every element kind is mapped from a reference element:
//!
//! | kind        | reference domain                               |
//! |-------------|------------------------------------------------|
//! | edge        | `0 <= r <= 1`                                  |
//! | triangle    | `r, s >= 0`, `r + s <= 1`                      |
//! | quadrangle  | `0 <= r, s <= 1`                               |
//! | tetrahedron | `r, s, t >= 0`, `r + s + t <= 1`               |
//! | hexahedron  | `0 <= r, s, t <= 1`                            |
//! | prism       | triangle in `(r, s)` times `0 <= t <= 1`       |
//! | pyramid     | `0 <= r, s, t <= 1` (base bilinear, apex `t`)  |
//!
//! Only corner nodes take part; quadratic kinds use their linear parent,
//! which is exact for straight-sided elements.
//!
//! Inclusion inverts the map with Newton's method in the first
//! `topological_dimension` Cartesian coordinates.

use nalgebra::{Matrix3, Vector3};

use crate::core::collections::{ShapeFunctionBuffer, SmallBuffer};
use crate::core::shape::ShapeKind;
use crate::geometry::position::Position;

const NEWTON_MAX_ITERATIONS: usize = 32;
const NEWTON_STEP_TOLERANCE: f64 = 1e-13;

type DerivativeBuffer = SmallBuffer<[f64; 3], 8>;

/// Result of testing a position against one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Inclusion {
    /// Whether the position lies in the element (within tolerance).
    pub inside: bool,
    /// Reference coordinates of the position; unused components are zero.
    pub reference: [f64; 3],
    /// Corner shape function values at the position.
    pub shape_functions: ShapeFunctionBuffer,
}

impl Inclusion {
    /// Local facet the position lies beyond: the facet whose nodes carry the
    /// largest summed shape function value.
    #[must_use]
    pub fn exit_facet(&self, kind: ShapeKind) -> Option<usize> {
        exit_facet(kind, &self.shape_functions)
    }
}

/// Corner shape function values at reference coordinates `rst`.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::shape::ShapeKind;
/// use meshtopo::geometry::shape_functions::shape_functions;
///
/// let n = shape_functions(ShapeKind::Triangle, [0.25, 0.5, 0.0]);
/// assert_eq!(n.as_slice(), &[0.25, 0.25, 0.5]);
/// ```
#[must_use]
pub fn shape_functions(kind: ShapeKind, rst: [f64; 3]) -> ShapeFunctionBuffer {
    let [r, s, t] = rst;
    match kind.linear() {
        ShapeKind::Edge => [1.0 - r, r].into_iter().collect(),
        ShapeKind::Triangle => triangle(r, s).into_iter().collect(),
        ShapeKind::Quadrangle => quadrangle(r, s).into_iter().collect(),
        ShapeKind::Tetrahedron => [1.0 - r - s - t, r, s, t].into_iter().collect(),
        ShapeKind::Hexahedron => {
            let q = quadrangle(r, s);
            q.iter()
                .map(|n| n * (1.0 - t))
                .chain(q.iter().map(|n| n * t))
                .collect()
        }
        ShapeKind::Prism => {
            let tri = triangle(r, s);
            tri.iter()
                .map(|n| n * (1.0 - t))
                .chain(tri.iter().map(|n| n * t))
                .collect()
        }
        ShapeKind::Pyramid => {
            let q = quadrangle(r, s);
            q.iter()
                .map(|n| n * (1.0 - t))
                .chain(std::iter::once(t))
                .collect()
        }
        _ => std::iter::once(1.0).collect(),
    }
}

/// Partial derivatives `[dN/dr, dN/ds, dN/dt]` of each corner shape function.
fn shape_derivatives(kind: ShapeKind, rst: [f64; 3]) -> DerivativeBuffer {
    let [r, s, t] = rst;
    let quad_dr = [-(1.0 - s), 1.0 - s, s, -s];
    let quad_ds = [-(1.0 - r), -r, r, 1.0 - r];
    let tri_dr = [-1.0, 1.0, 0.0];
    let tri_ds = [-1.0, 0.0, 1.0];
    match kind.linear() {
        ShapeKind::Edge => [[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]].into_iter().collect(),
        ShapeKind::Triangle => (0..3).map(|i| [tri_dr[i], tri_ds[i], 0.0]).collect(),
        ShapeKind::Quadrangle => (0..4).map(|i| [quad_dr[i], quad_ds[i], 0.0]).collect(),
        ShapeKind::Tetrahedron => [
            [-1.0, -1.0, -1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]
        .into_iter()
        .collect(),
        ShapeKind::Hexahedron => {
            let q = quadrangle(r, s);
            (0..4)
                .map(|i| [quad_dr[i] * (1.0 - t), quad_ds[i] * (1.0 - t), -q[i]])
                .chain((0..4).map(|i| [quad_dr[i] * t, quad_ds[i] * t, q[i]]))
                .collect()
        }
        ShapeKind::Prism => {
            let tri = triangle(r, s);
            (0..3)
                .map(|i| [tri_dr[i] * (1.0 - t), tri_ds[i] * (1.0 - t), -tri[i]])
                .chain((0..3).map(|i| [tri_dr[i] * t, tri_ds[i] * t, tri[i]]))
                .collect()
        }
        ShapeKind::Pyramid => {
            let q = quadrangle(r, s);
            (0..4)
                .map(|i| [quad_dr[i] * (1.0 - t), quad_ds[i] * (1.0 - t), -q[i]])
                .chain(std::iter::once([0.0, 0.0, 1.0]))
                .collect()
        }
        _ => std::iter::once([0.0; 3]).collect(),
    }
}

fn triangle(r: f64, s: f64) -> [f64; 3] {
    [1.0 - r - s, r, s]
}

fn quadrangle(r: f64, s: f64) -> [f64; 4] {
    [(1.0 - r) * (1.0 - s), r * (1.0 - s), r * s, (1.0 - r) * s]
}

/// Reference coordinates of the element centroid, used as Newton start.
const fn reference_center(kind: ShapeKind) -> [f64; 3] {
    match kind.linear() {
        ShapeKind::Edge => [0.5, 0.0, 0.0],
        ShapeKind::Triangle => [1.0 / 3.0, 1.0 / 3.0, 0.0],
        ShapeKind::Quadrangle => [0.5, 0.5, 0.0],
        ShapeKind::Tetrahedron => [0.25, 0.25, 0.25],
        ShapeKind::Hexahedron => [0.5, 0.5, 0.5],
        ShapeKind::Prism => [1.0 / 3.0, 1.0 / 3.0, 0.5],
        ShapeKind::Pyramid => [0.5, 0.5, 0.25],
        _ => [0.0; 3],
    }
}

/// Maps reference coordinates to Cartesian space.
///
/// # Panics
///
/// Panics if `corners` holds fewer points than `kind` has corners.
#[must_use]
pub fn map_to_global(kind: ShapeKind, corners: &[Position], rst: [f64; 3]) -> Position {
    shape_functions(kind, rst)
        .iter()
        .zip(corners)
        .fold(Position::zeros(), |acc, (n, p)| acc + p * *n)
}

/// Inverts the isoparametric map of an element at `position`.
///
/// Returns `None` for points (which have no reference domain) or when the
/// Jacobian becomes singular, which happens for degenerate elements.
#[must_use]
pub fn reference_coordinates(
    kind: ShapeKind,
    corners: &[Position],
    position: &Position,
) -> Option<[f64; 3]> {
    let dim = kind.topological_dimension();
    if dim == 0 || corners.len() < kind.corner_count() {
        return None;
    }

    let mut rst = reference_center(kind);
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let mapped = map_to_global(kind, corners, rst);
        let derivatives = shape_derivatives(kind, rst);

        // Unused reference/Cartesian directions get an identity block so the
        // same 3x3 solve serves every element dimension.
        let mut jacobian = Matrix3::identity();
        let mut residual = Vector3::zeros();
        for row in 0..dim {
            residual[row] = position[row] - mapped[row];
            for col in 0..dim {
                jacobian[(row, col)] = derivatives
                    .iter()
                    .zip(corners)
                    .map(|(d, p)| p[row] * d[col])
                    .sum();
            }
        }

        let step = jacobian.lu().solve(&residual)?;
        for i in 0..dim {
            rst[i] += step[i];
        }
        if step.amax() < NEWTON_STEP_TOLERANCE {
            break;
        }
    }
    Some(rst)
}

/// Whether reference coordinates lie in the reference element of `kind`.
#[must_use]
pub fn is_inside_reference(kind: ShapeKind, rst: [f64; 3], tolerance: f64) -> bool {
    let in_unit = |x: f64| x >= -tolerance && x <= 1.0 + tolerance;
    let [r, s, t] = rst;
    match kind.linear() {
        ShapeKind::Edge => in_unit(r),
        ShapeKind::Triangle => r >= -tolerance && s >= -tolerance && r + s <= 1.0 + tolerance,
        ShapeKind::Tetrahedron => {
            r >= -tolerance && s >= -tolerance && t >= -tolerance && r + s + t <= 1.0 + tolerance
        }
        ShapeKind::Quadrangle => in_unit(r) && in_unit(s),
        ShapeKind::Hexahedron | ShapeKind::Pyramid => in_unit(r) && in_unit(s) && in_unit(t),
        ShapeKind::Prism => {
            r >= -tolerance && s >= -tolerance && r + s <= 1.0 + tolerance && in_unit(t)
        }
        _ => false,
    }
}

/// Tests whether `position` lies in the element spanned by `corners`.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::shape::ShapeKind;
/// use meshtopo::geometry::position::Position;
/// use meshtopo::geometry::shape_functions::inclusion;
///
/// let corners = [
///     Position::new(0.0, 0.0, 0.0),
///     Position::new(2.0, 0.0, 0.0),
///     Position::new(0.0, 2.0, 0.0),
/// ];
/// let hit = inclusion(ShapeKind::Triangle, &corners, &Position::new(0.5, 0.5, 0.0), 1e-10);
/// assert!(hit.inside);
/// let miss = inclusion(ShapeKind::Triangle, &corners, &Position::new(2.0, 2.0, 0.0), 1e-10);
/// assert!(!miss.inside);
/// assert_eq!(miss.exit_facet(ShapeKind::Triangle), Some(0));
/// ```
#[must_use]
pub fn inclusion(
    kind: ShapeKind,
    corners: &[Position],
    position: &Position,
    tolerance: f64,
) -> Inclusion {
    reference_coordinates(kind, corners, position).map_or_else(
        || Inclusion {
            inside: false,
            reference: [0.0; 3],
            shape_functions: std::iter::repeat_n(0.0, kind.corner_count()).collect(),
        },
        |reference| Inclusion {
            inside: is_inside_reference(kind, reference, tolerance),
            reference,
            shape_functions: shape_functions(kind, reference),
        },
    )
}

/// Facet with the largest summed shape function over its corners.
///
/// For a position outside the element this is the facet it lies beyond, which
/// drives the slope search of the point locator.
#[must_use]
pub fn exit_facet(kind: ShapeKind, shape_functions: &[f64]) -> Option<usize> {
    kind.facet_corners()
        .iter()
        .map(|facet| facet.iter().map(|&i| shape_functions[i]).sum::<f64>())
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(facet, _)| facet)
}
