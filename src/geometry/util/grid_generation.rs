//! Structured grid generation.
//!
//! Tensor-product meshes of edges, quadrangles or hexahedra built from one
//! coordinate array per axis. Each generator derives adjacency and marks the
//! exterior boundaries.
//!
//! # Cell marker schemes
//!
//! The `marker_type` argument selects how cell markers are numbered while
//! the grid is swept (x fastest, then y, then z). A digit names an axis whose
//! advance increments the counter:
//!
//! | scheme | 2D                       | 3D                                   |
//! |--------|--------------------------|--------------------------------------|
//! | `0`    | every cell `0`           | every cell `0`                       |
//! | `1`    | count along x, per row   | count along x, per row               |
//! | `2`    | one marker per y row     | one marker per y row, per layer      |
//! | `3`    |                          | one marker per z layer               |
//! | `12`   | count every cell         | count every cell in a layer          |
//! | `13`   |                          | count along x and z, same for all y  |
//! | `23`   |                          | one marker per (y, z) row            |
//! | `123`  |                          | count every cell                     |

use num_traits::ToPrimitive;

use crate::core::mesh::{Mesh, MeshError};
use crate::core::point::PointId;
use crate::core::shape::Dimension;
use crate::geometry::position::Position;

/// Slack when matching exterior edge normals to axis directions.
const NORMAL_TOLERANCE: f64 = 1e-12;

/// Exterior boundary marker of the left end of a 1D grid.
pub const MARKER_1D_LEFT: i32 = 1;
/// Exterior boundary marker of the right end of a 1D grid.
pub const MARKER_1D_RIGHT: i32 = 2;
/// Exterior boundary marker of the top edge (`+y`) of a 2D grid.
pub const MARKER_2D_TOP: i32 = 1;
/// Exterior boundary marker of the left edge (`-x`) of a 2D grid.
pub const MARKER_2D_LEFT: i32 = 2;
/// Exterior boundary marker of the bottom edge (`-y`) of a 2D grid.
pub const MARKER_2D_BOTTOM: i32 = 3;
/// Exterior boundary marker of the right edge (`+x`) of a 2D grid.
pub const MARKER_2D_RIGHT: i32 = 4;
/// Exterior boundary marker of every face of a 3D grid.
pub const MARKER_3D_EXTERIOR: i32 = 1;

/// Creates a 1D mesh of edges between consecutive values of `x`.
///
/// The exterior point boundaries are marked [`MARKER_1D_LEFT`] (at `x[0]`)
/// and [`MARKER_1D_RIGHT`] (at the last value).
///
/// # Errors
///
/// Returns [`MeshError::TooFewGridCoordinates`] for fewer than two values.
///
/// # Examples
///
/// ```rust
/// use meshtopo::geometry::util::grid_generation::create_1d_grid;
///
/// let mesh = create_1d_grid(&[0.0, 1.0, 3.0]).unwrap();
/// assert_eq!(mesh.cell_count(), 2);
/// assert_eq!(mesh.boundary_count(), 3);
/// assert!(mesh.neighbours_known());
/// ```
pub fn create_1d_grid(x: &[f64]) -> Result<Mesh, MeshError> {
    check_axis('x', x)?;
    let mut mesh = Mesh::new(Dimension::One);

    let first = mesh.create_point(Position::new(x[0], 0.0, 0.0), 0);
    let mut previous = first;
    for &xi in &x[1..] {
        let current = mesh.create_point(Position::new(xi, 0.0, 0.0), 0);
        mesh.create_cell(&[previous, current], 0)?;
        previous = current;
    }
    mesh.create_neighbour_infos(false)?;

    for boundary in mesh.exterior_boundaries() {
        let point = mesh.boundary(boundary).point(0);
        if point == first {
            mesh.set_boundary_marker(boundary, MARKER_1D_LEFT)?;
        } else if point == previous {
            mesh.set_boundary_marker(boundary, MARKER_1D_RIGHT)?;
        }
    }
    Ok(mesh)
}

/// Creates a 2D mesh of counter-clockwise quadrangles over the tensor grid
/// `x × y`.
///
/// Exterior edges are marked by the direction of their outward normal:
/// [`MARKER_2D_TOP`], [`MARKER_2D_LEFT`], [`MARKER_2D_BOTTOM`],
/// [`MARKER_2D_RIGHT`]. Cell markers follow `marker_type` (`0`, `1`, `2` or
/// `12`; see the module docs).
///
/// # Errors
///
/// Returns [`MeshError::TooFewGridCoordinates`] when an axis has fewer than
/// two values.
///
/// # Examples
///
/// ```rust
/// use meshtopo::geometry::util::grid_generation::create_2d_grid;
///
/// let mesh = create_2d_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0], 0).unwrap();
/// assert_eq!(mesh.point_count(), 6);
/// assert_eq!(mesh.cell_count(), 2);
/// assert_eq!(mesh.boundary_count(), 7);
/// ```
pub fn create_2d_grid(x: &[f64], y: &[f64], marker_type: u32) -> Result<Mesh, MeshError> {
    check_axis('x', x)?;
    check_axis('y', y)?;
    let mut mesh = Mesh::new(Dimension::Two);
    let nx = x.len();

    let mut marker = 0;
    for (i, &yi) in y.iter().enumerate() {
        if i > 0 && marker_type == 2 {
            marker += 1;
        }
        for (j, &xj) in x.iter().enumerate() {
            let n = mesh.create_point(Position::new(xj, yi, 0.0), 0).index();
            if i > 0 && j > 0 {
                if matches!(marker_type, 1 | 12) {
                    marker += 1;
                }
                let quad = [n - 1 - nx, n - nx, n, n - 1].map(PointId::new);
                mesh.create_cell(&quad, marker)?;
            }
        }
        if marker_type == 1 {
            marker = 0;
        }
    }
    mesh.create_neighbour_infos(false)?;

    for boundary in mesh.exterior_boundaries() {
        let normal = mesh.boundary_normal(boundary);
        let marker = if (normal.y - 1.0).abs() < NORMAL_TOLERANCE {
            MARKER_2D_TOP
        } else if (normal.y + 1.0).abs() < NORMAL_TOLERANCE {
            MARKER_2D_BOTTOM
        } else if (normal.x + 1.0).abs() < NORMAL_TOLERANCE {
            MARKER_2D_LEFT
        } else if (normal.x - 1.0).abs() < NORMAL_TOLERANCE {
            MARKER_2D_RIGHT
        } else {
            continue;
        };
        mesh.set_boundary_marker(boundary, marker)?;
    }
    Ok(mesh)
}

/// Creates a 3D mesh of hexahedra over the tensor grid `x × y × z`.
///
/// Every exterior face is marked [`MARKER_3D_EXTERIOR`]. Cell markers follow
/// `marker_type` (`0`, `1`, `2`, `3`, `12`, `13`, `23` or `123`; see the
/// module docs).
///
/// # Errors
///
/// Returns [`MeshError::TooFewGridCoordinates`] when an axis has fewer than
/// two values.
pub fn create_3d_grid(
    x: &[f64],
    y: &[f64],
    z: &[f64],
    marker_type: u32,
) -> Result<Mesh, MeshError> {
    check_axis('x', x)?;
    check_axis('y', y)?;
    check_axis('z', z)?;
    let mut mesh = Mesh::new(Dimension::Three);
    let nx = x.len();
    let layer = nx * y.len();
    let cells_per_row = (nx - 1).to_i32().unwrap_or(i32::MAX);

    let mut marker: i32 = 0;
    for (k, &zk) in z.iter().enumerate() {
        if k > 0 && marker_type == 3 {
            marker += 1;
        }
        for (j, &yj) in y.iter().enumerate() {
            if j > 0 && marker_type == 2 {
                marker += 1;
            }
            if j > 0 && k > 0 && marker_type == 23 {
                marker += 1;
            }
            for (i, &xi) in x.iter().enumerate() {
                let n = mesh.create_point(Position::new(xi, yj, zk), 0).index();
                if i > 0 && j > 0 && k > 0 {
                    if matches!(marker_type, 1 | 12 | 13 | 123) {
                        marker += 1;
                    }
                    let hex = [
                        n - 1 - nx - layer,
                        n - nx - layer,
                        n - layer,
                        n - 1 - layer,
                        n - 1 - nx,
                        n - nx,
                        n,
                        n - 1,
                    ]
                    .map(PointId::new);
                    mesh.create_cell(&hex, marker)?;
                }
            }
            if marker_type == 1 {
                marker = 0;
            }
            if j > 0 && k > 0 && marker_type == 13 {
                marker -= cells_per_row;
            }
        }
        if k > 0 && marker_type == 13 {
            marker += cells_per_row;
        }
        if matches!(marker_type, 2 | 12) {
            marker = 0;
        }
    }
    mesh.create_neighbour_infos(false)?;

    for boundary in mesh.exterior_boundaries() {
        mesh.set_boundary_marker(boundary, MARKER_3D_EXTERIOR)?;
    }
    Ok(mesh)
}

/// Rejects axes with fewer than two values and warns about repeated ones.
fn check_axis(axis: char, values: &[f64]) -> Result<(), MeshError> {
    if values.len() < 2 {
        return Err(MeshError::TooFewGridCoordinates {
            axis,
            count: values.len(),
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    if sorted.len() != values.len() {
        tracing::warn!(
            axis = %axis,
            values = values.len(),
            unique = sorted.len(),
            "grid axis has non-unique coordinates"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::CellId;
    use approx::assert_relative_eq;

    fn init_tracing() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }

    #[test]
    fn test_1d_grid_marks_both_ends() {
        let mesh = create_1d_grid(&[0.0, 0.5, 2.0, 3.0]).unwrap();
        assert_eq!(mesh.dimension(), Dimension::One);
        assert_eq!(mesh.cell_count(), 3);
        let mut ends: Vec<(f64, i32)> = mesh
            .exterior_boundaries()
            .into_iter()
            .map(|b| {
                let boundary = mesh.boundary(b);
                (mesh.position(boundary.point(0)).x, boundary.marker())
            })
            .collect();
        ends.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(ends, vec![(0.0, MARKER_1D_LEFT), (3.0, MARKER_1D_RIGHT)]);
    }

    #[test]
    fn test_too_few_coordinates() {
        assert_eq!(
            create_1d_grid(&[1.0]).unwrap_err(),
            MeshError::TooFewGridCoordinates { axis: 'x', count: 1 }
        );
        assert_eq!(
            create_2d_grid(&[0.0, 1.0], &[], 0).unwrap_err(),
            MeshError::TooFewGridCoordinates { axis: 'y', count: 0 }
        );
        assert!(matches!(
            create_3d_grid(&[0.0, 1.0], &[0.0, 1.0], &[2.0], 0),
            Err(MeshError::TooFewGridCoordinates { axis: 'z', .. })
        ));
    }

    #[test]
    fn test_non_unique_axis_still_builds() {
        init_tracing();
        // Repeated coordinates only warn; the zero-width column is still meshed.
        let mesh = create_1d_grid(&[0.0, 1.0, 1.0, 2.0]).unwrap();
        assert_eq!(mesh.cell_count(), 3);
    }

    #[test]
    fn test_2d_grid_cells_are_counter_clockwise() {
        let mesh = create_2d_grid(&[0.0, 1.0, 3.0], &[0.0, 2.0, 5.0], 0).unwrap();
        assert_eq!(mesh.cell_count(), 4);
        assert_relative_eq!(mesh.cell_sizes().iter().sum::<f64>(), 15.0);
        for cell in mesh.cells() {
            let p = mesh.positions_of(cell.points());
            let area2 = (p[1] - p[0]).cross(&(p[2] - p[0])).z;
            assert!(area2 > 0.0);
        }
    }

    #[test]
    fn test_2d_grid_exterior_markers() {
        let mesh = create_2d_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], 0).unwrap();
        assert_eq!(mesh.boundary_count(), 12);
        let exterior = mesh.exterior_boundaries();
        assert_eq!(exterior.len(), 8);
        for b in exterior {
            let c = mesh.boundary_center(b);
            let expected = if c.y == 2.0 {
                MARKER_2D_TOP
            } else if c.y == 0.0 {
                MARKER_2D_BOTTOM
            } else if c.x == 0.0 {
                MARKER_2D_LEFT
            } else {
                MARKER_2D_RIGHT
            };
            assert_eq!(mesh.boundary(b).marker(), expected, "boundary at {c:?}");
        }
        assert_eq!(mesh.find_boundaries_by_marker(0..=0).len(), 4);
    }

    #[test]
    fn test_2d_marker_schemes() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 2.0];
        assert_eq!(
            create_2d_grid(&axis, &y, 1).unwrap().cell_markers(),
            vec![1, 2, 3, 1, 2, 3]
        );
        assert_eq!(
            create_2d_grid(&axis, &y, 2).unwrap().cell_markers(),
            vec![1, 1, 1, 2, 2, 2]
        );
        assert_eq!(
            create_2d_grid(&axis, &y, 12).unwrap().cell_markers(),
            vec![1, 2, 3, 4, 5, 6]
        );
        assert_eq!(
            create_2d_grid(&axis, &y, 0).unwrap().cell_markers(),
            vec![0; 6]
        );
    }

    #[test]
    fn test_3d_grid_topology() {
        let axis = [0.0, 1.0, 2.0];
        let mesh = create_3d_grid(&axis, &axis, &axis, 0).unwrap();
        assert_eq!(mesh.point_count(), 27);
        assert_eq!(mesh.cell_count(), 8);
        // 36 faces, 24 of them on the hull.
        assert_eq!(mesh.boundary_count(), 36);
        assert_eq!(mesh.exterior_boundaries().len(), 24);
        assert_eq!(
            mesh.find_boundaries_by_marker(MARKER_3D_EXTERIOR..=MARKER_3D_EXTERIOR).len(),
            24
        );
        assert_relative_eq!(mesh.cell_size(CellId::new(0)), 1.0, epsilon = 1e-12);
        mesh.validate_adjacency().unwrap();
    }

    #[test]
    fn test_3d_marker_schemes() {
        let axis = [0.0, 1.0, 2.0];
        let markers = |scheme| create_3d_grid(&axis, &axis, &axis, scheme).unwrap().cell_markers();
        assert_eq!(markers(1), vec![1, 2, 1, 2, 1, 2, 1, 2]);
        assert_eq!(markers(2), vec![1, 1, 2, 2, 1, 1, 2, 2]);
        assert_eq!(markers(3), vec![1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(markers(12), vec![1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(markers(13), vec![1, 2, 1, 2, 3, 4, 3, 4]);
        assert_eq!(markers(23), vec![1, 1, 2, 2, 3, 3, 4, 4]);
        assert_eq!(markers(123), (1..=8).collect::<Vec<_>>());
    }
}
