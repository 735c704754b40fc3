//! Rigid and affine transforms of mesh positions.
//!
//! Each transform moves every point, then drops the cached bounding box and
//! spatial index; both are rebuilt on next use. Topology is untouched.

use nalgebra::Rotation3;

use crate::core::mesh::Mesh;
use crate::geometry::position::Position;

impl Mesh {
    /// Moves every point by `offset`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meshtopo::prelude::*;
    ///
    /// let mut mesh = Mesh::new(Dimension::Two);
    /// let p = mesh.create_point(Position::new(1.0, 1.0, 0.0), 0);
    /// mesh.translate(&Position::new(2.0, 0.0, 0.0));
    /// assert_eq!(*mesh.position(p), Position::new(3.0, 1.0, 0.0));
    /// ```
    pub fn translate(&mut self, offset: &Position) -> &mut Self {
        self.map_positions(|p| p + offset);
        self
    }

    /// Scales every position component-wise by `factors`.
    pub fn scale(&mut self, factors: &Position) -> &mut Self {
        self.map_positions(|p| p.component_mul(factors));
        self
    }

    /// Rotates every point about the origin.
    ///
    /// `angles` holds the rotation angles in radians about the x, y and z
    /// axes, applied in that order.
    pub fn rotate(&mut self, angles: &Position) -> &mut Self {
        let rotation = Rotation3::from_euler_angles(angles.x, angles.y, angles.z);
        self.map_positions(|p| rotation * p);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point::PointId;
    use crate::core::shape::Dimension;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn two_points() -> (Mesh, PointId, PointId) {
        let mut mesh = Mesh::new(Dimension::Three);
        let a = mesh.create_point(Position::new(1.0, 0.0, 0.0), 0);
        let b = mesh.create_point(Position::new(0.0, 2.0, 3.0), 0);
        (mesh, a, b)
    }

    #[test]
    fn test_translate_and_scale_chain() {
        let (mut mesh, a, b) = two_points();
        mesh.translate(&Position::new(1.0, 1.0, 1.0))
            .scale(&Position::new(2.0, 1.0, 0.5));
        assert_relative_eq!(*mesh.position(a), Position::new(4.0, 1.0, 0.5));
        assert_relative_eq!(*mesh.position(b), Position::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn test_rotate_about_z() {
        let (mut mesh, a, _) = two_points();
        mesh.rotate(&Position::new(0.0, 0.0, FRAC_PI_2));
        assert_relative_eq!(*mesh.position(a), Position::new(0.0, 1.0, 0.0), epsilon = 1e-14);
    }

    #[test]
    fn test_transforms_reset_caches() {
        let (mut mesh, a, _) = two_points();
        mesh.fill_spatial_index().unwrap();
        assert_relative_eq!(mesh.bounding_box().unwrap().max, Position::new(1.0, 2.0, 3.0));

        mesh.translate(&Position::new(10.0, 0.0, 0.0));
        assert!(mesh.spatial_index().is_empty());
        assert_relative_eq!(mesh.bounding_box().unwrap().max, Position::new(11.0, 2.0, 3.0));
        assert_eq!(mesh.find_nearest_point(&Position::new(11.0, 0.0, 0.0)).unwrap(), a);
    }
}
