pub mod geometry;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use geometry::Transformable;
pub use geometry::bounds::BoundingBox;
pub use geometry::line::Line;
pub use geometry::mesh::Mesh;
pub use geometry::plane::Plane;
pub use geometry::point::Point3d;
pub use geometry::transform::Transform;
pub use geometry::vector::Vec3;
pub use traits::{GeometryKernel, MeshKernel};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (model units).
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-10,
        }
    }
}

impl Tolerance {
    /// Tolerance with a custom coincidence distance.
    pub fn with_coincidence(coincidence: f64) -> Self {
        Self {
            coincidence,
            ..Self::default()
        }
    }

    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_angle(&self, angle: f64) -> bool {
        angle.abs() < self.angular
    }
}

/// Tolerance used when none is configured.
pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
