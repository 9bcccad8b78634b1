//! Mesh-level intersection predicates.
//!
//! All tests are triangle based: bounding-box early-outs followed by
//! Moller-Trumbore segment/triangle checks.

use super::bounds::BoundingBox;
use super::line::Line;
use super::mesh::Mesh;
use super::plane::Plane;
use super::point::Point3d;
use super::vector::Vec3;

const PARALLEL_EPS: f64 = 1e-14;

/// Direction used for parity ray casting. Skewed off the axes so rays rarely
/// graze edges of axis-aligned geometry.
const RAY_DIRECTION: Vec3 = Vec3 {
    x: 0.577_215_664_9,
    y: 0.301_029_995_6,
    z: 0.759_134_274_1,
};

/// Parameter `t` along `p0 -> p1` where the segment crosses the triangle.
///
/// `t_min`/`t_max` bound the accepted range, which lets callers choose
/// between closed segments, open segments and rays.
pub fn segment_triangle_hit(
    p0: Point3d,
    p1: Point3d,
    tri: &[Point3d; 3],
    t_min: f64,
    t_max: f64,
) -> Option<f64> {
    let dir = p1 - p0;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < PARALLEL_EPS {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = p0 - tri[0];
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = inv_det * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * e2.dot(&q);
    (t >= t_min && t <= t_max).then_some(t)
}

/// Triangle/triangle crossing test: any edge of one pierces the other.
///
/// Edge endpoints are excluded, so triangles that merely share an edge or a
/// vertex do not count as intersecting. Coplanar overlaps are not reported.
pub fn triangles_intersect(a: &[Point3d; 3], b: &[Point3d; 3]) -> bool {
    let open = |p0: Point3d, p1: Point3d, tri: &[Point3d; 3]| {
        segment_triangle_hit(p0, p1, tri, 1e-8, 1.0 - 1e-8).is_some()
    };
    open(a[0], a[1], b)
        || open(a[1], a[2], b)
        || open(a[2], a[0], b)
        || open(b[0], b[1], a)
        || open(b[1], b[2], a)
        || open(b[2], b[0], a)
}

/// True when the surfaces of the two meshes cross anywhere.
pub fn mesh_mesh_intersect(a: &Mesh, b: &Mesh) -> bool {
    let (box_a, box_b) = (a.bounding_box(), b.bounding_box());
    if !box_a.is_valid() || !box_b.is_valid() || !box_a.intersects(&box_b) {
        return false;
    }

    let tris_b: Vec<([Point3d; 3], BoundingBox)> = b
        .triangles()
        .map(|t| (t, BoundingBox::from_points(&t)))
        .filter(|(_, bb)| bb.intersects(&box_a))
        .collect();

    for tri_a in a.triangles() {
        let bb_a = BoundingBox::from_points(&tri_a);
        if !bb_a.intersects(&box_b) {
            continue;
        }
        for (tri_b, bb_b) in &tris_b {
            if bb_a.intersects(bb_b) && triangles_intersect(&tri_a, tri_b) {
                return true;
            }
        }
    }
    false
}

/// Number of triangles the closed segment passes through.
pub fn mesh_line_intersections(mesh: &Mesh, line: &Line) -> usize {
    let seg_box = BoundingBox::from_points(&[line.start, line.end]);
    if !seg_box.intersects(&mesh.bounding_box()) {
        return 0;
    }
    mesh.triangles()
        .filter(|tri| segment_triangle_hit(line.start, line.end, tri, 0.0, 1.0).is_some())
        .count()
}

/// True when the mesh has vertices strictly on both sides of the plane.
pub fn mesh_plane_intersect(mesh: &Mesh, plane: &Plane, tolerance: f64) -> bool {
    let mut above = false;
    let mut below = false;
    for v in &mesh.vertices {
        let d = plane.distance_to_point(v);
        above |= d > tolerance;
        below |= d < -tolerance;
        if above && below {
            return true;
        }
    }
    false
}

/// Point containment by ray-crossing parity.
///
/// Points within `tolerance` of the surface count as inside unless
/// `strictly_inside` is set.
pub fn point_in_mesh(mesh: &Mesh, p: &Point3d, tolerance: f64, strictly_inside: bool) -> bool {
    let bb = mesh.bounding_box();
    if !bb.is_valid() || !bb.expanded(tolerance).contains_point(p) {
        return false;
    }

    let near_surface = mesh
        .triangles()
        .any(|tri| closest_point_on_triangle(p, &tri).distance_to(p) <= tolerance);
    if near_surface {
        return !strictly_inside;
    }

    let reach = bb.size().length() + (bb.center() - *p).length() + 1.0;
    let far = *p + RAY_DIRECTION * reach;
    let crossings = mesh
        .triangles()
        .filter(|tri| segment_triangle_hit(*p, far, tri, 1e-12, 1.0).is_some())
        .count();
    crossings % 2 == 1
}

/// Closest point on a triangle (Ericson, Real-Time Collision Detection 5.1.5).
pub fn closest_point_on_triangle(p: &Point3d, tri: &[Point3d; 3]) -> Point3d {
    let [a, b, c] = *tri;
    let ab = b - a;
    let ac = c - a;
    let ap = *p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = *p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = *p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f64, y: f64, z: f64) -> Mesh {
        Mesh::centered_box(Point3d::new(x, y, z), [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_overlapping_boxes_intersect() {
        assert!(mesh_mesh_intersect(&unit_box_at(0.0, 0.0, 0.0), &unit_box_at(0.5, 0.3, 0.2)));
    }

    #[test]
    fn test_separate_boxes_do_not_intersect() {
        assert!(!mesh_mesh_intersect(&unit_box_at(0.0, 0.0, 0.0), &unit_box_at(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_line_through_box_hits_two_faces() {
        let line = Line::new(Point3d::new(-2.0, 0.1, 0.2), Point3d::new(2.0, 0.1, 0.2));
        assert_eq!(mesh_line_intersections(&unit_box_at(0.0, 0.0, 0.0), &line), 2);
    }

    #[test]
    fn test_short_line_misses_box() {
        let line = Line::new(Point3d::new(-2.0, 0.1, 0.2), Point3d::new(-1.0, 0.1, 0.2));
        assert_eq!(mesh_line_intersections(&unit_box_at(0.0, 0.0, 0.0), &line), 0);
    }

    #[test]
    fn test_point_in_mesh_parity() {
        let m = unit_box_at(0.0, 0.0, 0.0);
        assert!(point_in_mesh(&m, &Point3d::new(0.1, 0.2, -0.3), 1e-6, false));
        assert!(!point_in_mesh(&m, &Point3d::new(1.1, 0.0, 0.0), 1e-6, false));
    }

    #[test]
    fn test_point_on_surface_respects_strictness() {
        let m = unit_box_at(0.0, 0.0, 0.0);
        let on_face = Point3d::new(0.5, 0.0, 0.0);
        assert!(point_in_mesh(&m, &on_face, 1e-6, false));
        assert!(!point_in_mesh(&m, &on_face, 1e-6, true));
    }

    #[test]
    fn test_mesh_plane_intersect() {
        let m = unit_box_at(0.0, 0.0, 0.0);
        assert!(mesh_plane_intersect(&m, &Plane::world_xy(), 1e-9));
        let high = Plane::from_normal(Point3d::new(0.0, 0.0, 3.0), Vec3::Z);
        assert!(!mesh_plane_intersect(&m, &high, 1e-9));
    }

    #[test]
    fn test_closest_point_inside_face_region() {
        let tri = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ];
        let q = closest_point_on_triangle(&Point3d::new(0.2, 0.2, 5.0), &tri);
        assert!(q.distance_to(&Point3d::new(0.2, 0.2, 0.0)) < 1e-12);
        let corner = closest_point_on_triangle(&Point3d::new(-1.0, -1.0, 0.0), &tri);
        assert!(corner.distance_to(&tri[0]) < 1e-12);
    }
}
