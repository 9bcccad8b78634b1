use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::transform::Transform;
use super::vector::Vec3;
use super::Transformable;

/// A finite line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3d,
    pub end: Point3d,
}

impl Line {
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }

    /// Segment starting at `start` and extending `direction` (not normalized).
    pub fn from_direction(start: Point3d, direction: Vec3) -> Self {
        Self::new(start, start + direction)
    }

    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    pub fn point_at(&self, t: f64) -> Point3d {
        self.start + self.direction() * t
    }
}

impl Transformable for Line {
    fn transform(&self, t: &Transform) -> Self {
        Self::new(t.transform_point(&self.start), t.transform_point(&self.end))
    }
}
