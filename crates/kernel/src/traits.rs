//! Geometry kernel abstraction.
//!
//! The aggregation engine only ever asks a handful of yes/no or counting
//! questions about meshes. Those questions live behind `GeometryKernel` so a
//! different backend (or a test double) can answer them.

use std::fmt::Debug;

use crate::geometry::intersection;
use crate::geometry::line::Line;
use crate::geometry::mesh::Mesh;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::geometry::transform::Transform;
use crate::Tolerance;

/// Mesh predicates and frame mapping used by the aggregation engine.
pub trait GeometryKernel: Debug {
    /// True when the surfaces of two meshes cross.
    fn mesh_mesh_intersect(&self, a: &Mesh, b: &Mesh) -> bool;

    /// Number of mesh triangles pierced by the segment.
    fn mesh_line_intersections(&self, mesh: &Mesh, line: &Line) -> usize;

    /// True when the mesh lies on both sides of the plane.
    fn mesh_plane_intersect(&self, mesh: &Mesh, plane: &Plane) -> bool;

    /// Point containment. Points within `tolerance` of the surface count as
    /// inside unless `strictly_inside` is set.
    fn point_in_mesh(
        &self,
        mesh: &Mesh,
        point: &Point3d,
        tolerance: f64,
        strictly_inside: bool,
    ) -> bool;

    /// Rigid transform taking `from`'s frame onto `to`'s frame.
    fn plane_to_plane(&self, from: &Plane, to: &Plane) -> Transform {
        Transform::plane_to_plane(from, to)
    }
}

// ── Triangle mesh backend ──────────────────────────────────────────────────

/// Default kernel: brute-force triangle tests with bounding-box culling.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshKernel {
    pub tolerance: Tolerance,
}

impl MeshKernel {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

impl GeometryKernel for MeshKernel {
    fn mesh_mesh_intersect(&self, a: &Mesh, b: &Mesh) -> bool {
        intersection::mesh_mesh_intersect(a, b)
    }

    fn mesh_line_intersections(&self, mesh: &Mesh, line: &Line) -> usize {
        intersection::mesh_line_intersections(mesh, line)
    }

    fn mesh_plane_intersect(&self, mesh: &Mesh, plane: &Plane) -> bool {
        intersection::mesh_plane_intersect(mesh, plane, self.tolerance.coincidence)
    }

    fn point_in_mesh(
        &self,
        mesh: &Mesh,
        point: &Point3d,
        tolerance: f64,
        strictly_inside: bool,
    ) -> bool {
        intersection::point_in_mesh(mesh, point, tolerance, strictly_inside)
    }
}
