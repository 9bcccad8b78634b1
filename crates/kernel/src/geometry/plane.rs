use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::transform::Transform;
use super::vector::Vec3;
use super::Transformable;

/// An oriented plane with an orthonormal frame. `normal == x_axis x y_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// Build a plane from an origin and two in-plane directions.
    ///
    /// `y_axis` is re-orthogonalized against `x_axis`. Degenerate input falls
    /// back to the world XY frame at `origin`.
    pub fn new(origin: Point3d, x_axis: Vec3, y_axis: Vec3) -> Self {
        let Some(x) = x_axis.normalized() else {
            return Self::world_xy_at(origin);
        };
        let Some(y) = y_axis.reject_from(&x).normalized() else {
            return Self::from_normal(origin, x.cross(&y_axis));
        };
        Self {
            origin,
            x_axis: x,
            y_axis: y,
            normal: x.cross(&y),
        }
    }

    /// Build a plane from an origin and normal, picking a stable x axis.
    pub fn from_normal(origin: Point3d, normal: Vec3) -> Self {
        let Some(normal) = normal.normalized() else {
            return Self::world_xy_at(origin);
        };
        let seed = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let y_axis = normal.cross(&seed).normalized().unwrap_or(Vec3::Y);
        let x_axis = y_axis.cross(&normal);
        Self {
            origin,
            x_axis,
            y_axis,
            normal,
        }
    }

    pub fn world_xy() -> Self {
        Self::world_xy_at(Point3d::ORIGIN)
    }

    fn world_xy_at(origin: Point3d) -> Self {
        Self {
            origin,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
            normal: Vec3::Z,
        }
    }

    /// Same origin and x axis, reversed y axis (and therefore reversed normal).
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            x_axis: self.x_axis,
            y_axis: -self.y_axis,
            normal: -self.normal,
        }
    }

    /// Signed distance along the normal.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.distance_to_point(p)
    }
}

impl Transformable for Plane {
    fn transform(&self, t: &Transform) -> Self {
        let origin = t.transform_point(&self.origin);
        let x_axis = t.transform_vector(&self.x_axis);
        let y_axis = t.transform_vector(&self.y_axis);
        Plane::new(origin, x_axis, y_axis)
    }
}
