use serde::{Deserialize, Serialize};

use super::bounds::BoundingBox;
use super::point::Point3d;
use super::transform::Transform;
use super::Transformable;

/// An indexed triangle mesh.
///
/// Faces wind counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned box between two corners.
    pub fn cuboid(min: Point3d, max: Point3d) -> Self {
        let (x0, y0, z0) = (min.x.min(max.x), min.y.min(max.y), min.z.min(max.z));
        let (x1, y1, z1) = (min.x.max(max.x), min.y.max(max.y), min.z.max(max.z));
        let vertices = vec![
            Point3d::new(x0, y0, z0),
            Point3d::new(x1, y0, z0),
            Point3d::new(x1, y1, z0),
            Point3d::new(x0, y1, z0),
            Point3d::new(x0, y0, z1),
            Point3d::new(x1, y0, z1),
            Point3d::new(x1, y1, z1),
            Point3d::new(x0, y1, z1),
        ];
        #[rustfmt::skip]
        let faces = vec![
            [0, 2, 1], [0, 3, 2], // bottom (-z)
            [4, 5, 6], [4, 6, 7], // top (+z)
            [0, 1, 5], [0, 5, 4], // front (-y)
            [2, 3, 7], [2, 7, 6], // back (+y)
            [0, 4, 7], [0, 7, 3], // left (-x)
            [1, 2, 6], [1, 6, 5], // right (+x)
        ];
        Self { vertices, faces }
    }

    /// Axis-aligned box centered at `center` with edge lengths `size`.
    pub fn centered_box(center: Point3d, size: [f64; 3]) -> Self {
        let h = [size[0] * 0.5, size[1] * 0.5, size[2] * 0.5];
        Self::cuboid(
            Point3d::new(center.x - h[0], center.y - h[1], center.z - h[2]),
            Point3d::new(center.x + h[0], center.y + h[1], center.z + h[2]),
        )
    }

    pub fn from_bounds(bounds: &BoundingBox) -> Self {
        Self::cuboid(bounds.min, bounds.max)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Iterate faces as vertex triples. Faces with out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3d; 3]> + '_ {
        self.faces.iter().filter_map(|f| {
            Some([
                *self.vertices.get(f[0])?,
                *self.vertices.get(f[1])?,
                *self.vertices.get(f[2])?,
            ])
        })
    }

    pub fn flip_winding(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }
}

impl Transformable for Mesh {
    fn transform(&self, t: &Transform) -> Self {
        let mut mesh = Mesh {
            vertices: self.vertices.iter().map(|v| t.transform_point(v)).collect(),
            faces: self.faces.clone(),
        };
        if t.is_mirrored() {
            mesh.flip_winding();
        }
        mesh
    }
}
