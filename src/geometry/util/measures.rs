//! Element measures: centers, sizes and boundary normals.

use crate::core::shape::ShapeKind;
use crate::geometry::position::Position;

/// Arithmetic mean of `positions`; the origin for an empty slice.
///
/// # Examples
///
/// ```rust
/// use meshtopo::geometry::position::Position;
/// use meshtopo::geometry::util::measures::center;
///
/// let c = center(&[Position::new(0.0, 0.0, 0.0), Position::new(2.0, 4.0, 0.0)]);
/// assert_eq!(c, Position::new(1.0, 2.0, 0.0));
/// ```
#[must_use]
pub fn center(positions: &[Position]) -> Position {
    if positions.is_empty() {
        return Position::zeros();
    }
    #[expect(clippy::cast_precision_loss, reason = "element point counts are tiny")]
    let count = positions.len() as f64;
    positions.iter().sum::<Position>() / count
}

/// Length, area or volume of an element given its corner positions.
///
/// Quadrangles are split along the `0-2` diagonal; solids are decomposed into
/// tetrahedra fanned from the element center over triangulated faces, which
/// is exact for planar faces. Points measure zero.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use meshtopo::core::shape::ShapeKind;
/// use meshtopo::geometry::position::Position;
/// use meshtopo::geometry::util::measures::shape_size;
///
/// let square = [
///     Position::new(0.0, 0.0, 0.0),
///     Position::new(2.0, 0.0, 0.0),
///     Position::new(2.0, 2.0, 0.0),
///     Position::new(0.0, 2.0, 0.0),
/// ];
/// assert_relative_eq!(shape_size(ShapeKind::Quadrangle, &square), 4.0);
/// ```
#[must_use]
pub fn shape_size(kind: ShapeKind, corners: &[Position]) -> f64 {
    match kind.linear() {
        ShapeKind::Edge => (corners[1] - corners[0]).norm(),
        ShapeKind::Triangle => triangle_area(&corners[0], &corners[1], &corners[2]),
        ShapeKind::Quadrangle => {
            triangle_area(&corners[0], &corners[1], &corners[2])
                + triangle_area(&corners[0], &corners[2], &corners[3])
        }
        ShapeKind::Tetrahedron => {
            tetrahedron_volume(&corners[0], &corners[1], &corners[2], &corners[3])
        }
        ShapeKind::Hexahedron | ShapeKind::Prism | ShapeKind::Pyramid => {
            let apex = center(&corners[..kind.corner_count()]);
            kind.facet_corners()
                .iter()
                .map(|facet| {
                    (1..facet.len() - 1)
                        .map(|k| {
                            tetrahedron_volume(
                                &apex,
                                &corners[facet[0]],
                                &corners[facet[k]],
                                &corners[facet[k + 1]],
                            )
                        })
                        .sum::<f64>()
                })
                .sum()
        }
        _ => 0.0,
    }
}

/// Unit normal of a boundary element given its corner positions.
///
/// Edges (in the xy-plane) use the tangent rotated clockwise, `(t.y, -t.x, 0)`;
/// triangles use `(p1 - p0) x (p2 - p0)`; quadrangles use the diagonal cross
/// product `(p2 - p0) x (p3 - p1)`. Degenerate elements and points give the
/// zero vector.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::shape::ShapeKind;
/// use meshtopo::geometry::position::Position;
/// use meshtopo::geometry::util::measures::boundary_normal;
///
/// let edge = [Position::new(0.0, 0.0, 0.0), Position::new(1.0, 0.0, 0.0)];
/// assert_eq!(boundary_normal(ShapeKind::Edge, &edge), Position::new(0.0, -1.0, 0.0));
/// ```
#[must_use]
pub fn boundary_normal(kind: ShapeKind, corners: &[Position]) -> Position {
    let raw = match kind.linear() {
        ShapeKind::Edge => {
            let t = corners[1] - corners[0];
            Position::new(t.y, -t.x, 0.0)
        }
        ShapeKind::Triangle => (corners[1] - corners[0]).cross(&(corners[2] - corners[0])),
        ShapeKind::Quadrangle => (corners[2] - corners[0]).cross(&(corners[3] - corners[1])),
        _ => Position::zeros(),
    };
    raw.try_normalize(f64::MIN_POSITIVE).unwrap_or_else(Position::zeros)
}

/// Area of triangle `abc`.
#[must_use]
pub fn triangle_area(a: &Position, b: &Position, c: &Position) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Unsigned volume of tetrahedron `abcd`.
#[must_use]
pub fn tetrahedron_volume(a: &Position, b: &Position, c: &Position, d: &Position) -> f64 {
    (b - a).dot(&(c - a).cross(&(d - a))).abs() / 6.0
}
