use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use super::plane::Plane;
use super::point::Point3d;
use super::vector::Vec3;

/// A 4x4 homogeneous transformation.
///
/// Composition follows matrix order: `a.compose(&b)` is `a * b`, so `b` is
/// applied first. Serializes as sixteen named row-major fields `M00..M33`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "MatrixFields", into = "MatrixFields")]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build from row-major entries.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            rows[0][0], rows[0][1], rows[0][2], rows[0][3],
            rows[1][0], rows[1][1], rows[1][2], rows[1][3],
            rows[2][0], rows[2][1], rows[2][2], rows[2][3],
            rows[3][0], rows[3][1], rows[3][2], rows[3][3],
        );
        Self { matrix }
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(r, c)];
            }
        }
        rows
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vector3::new(dx, dy, dz)),
        }
    }

    pub fn from_translation_vec(v: Vec3) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)),
        }
    }

    pub fn uniform_scaling(s: f64) -> Self {
        Self::scaling(s, s, s)
    }

    /// Rotation around an axis through the origin by `angle` radians.
    /// A zero axis yields the identity.
    pub fn rotation_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = Vector3::new(axis.x, axis.y, axis.z);
        if axis.norm() < 1e-15 {
            return Self::identity();
        }
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation_axis_angle(Vec3::Z, angle)
    }

    /// Rigid transform mapping the frame of `from` onto the frame of `to`:
    /// origin to origin, x axis to x axis, y axis to y axis.
    pub fn plane_to_plane(from: &Plane, to: &Plane) -> Self {
        let from_frame = frame_matrix(from);
        let to_frame = frame_matrix(to);
        // Frames are orthonormal, so the inverse is the transposed rotation.
        let r = from_frame.fixed_view::<3, 3>(0, 0).transpose();
        let o = Vector3::new(from.origin.x, from.origin.y, from.origin.z);
        let mut inverse = Matrix4::identity();
        inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        inverse.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-(r * o)));
        Self {
            matrix: to_frame * inverse,
        }
    }

    /// Matrix entry at (row, col), 0-indexed.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        if (v.w - 1.0).abs() > 1e-15 && v.w.abs() > 1e-15 {
            Point3d::new(v.x / v.w, v.y / v.w, v.z / v.w)
        } else {
            Point3d::new(v.x, v.y, v.z)
        }
    }

    /// Transform a vector (no translation).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Compose two transforms: `self * other`.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// Determinant of the upper-left 3x3 block.
    pub fn determinant3(&self) -> f64 {
        let block: Matrix3<f64> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        block.determinant()
    }

    /// True when the transform flips handedness; callers flip mesh winding.
    pub fn is_mirrored(&self) -> bool {
        self.determinant3() < 0.0
    }

    pub fn approx_eq(&self, other: &Transform, tol: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

fn frame_matrix(plane: &Plane) -> Matrix4<f64> {
    let (x, y, z, o) = (plane.x_axis, plane.y_axis, plane.normal, plane.origin);
    #[rustfmt::skip]
    let m = Matrix4::new(
        x.x, y.x, z.x, o.x,
        x.y, y.y, z.y, o.y,
        x.z, y.z, z.z, o.z,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Row-major named-field representation used on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[allow(non_snake_case)]
struct MatrixFields {
    M00: f64,
    M01: f64,
    M02: f64,
    M03: f64,
    M10: f64,
    M11: f64,
    M12: f64,
    M13: f64,
    M20: f64,
    M21: f64,
    M22: f64,
    M23: f64,
    M30: f64,
    M31: f64,
    M32: f64,
    M33: f64,
}

impl From<MatrixFields> for Transform {
    fn from(f: MatrixFields) -> Self {
        Transform::from_rows([
            [f.M00, f.M01, f.M02, f.M03],
            [f.M10, f.M11, f.M12, f.M13],
            [f.M20, f.M21, f.M22, f.M23],
            [f.M30, f.M31, f.M32, f.M33],
        ])
    }
}

impl From<Transform> for MatrixFields {
    fn from(t: Transform) -> Self {
        let r = t.to_rows();
        MatrixFields {
            M00: r[0][0],
            M01: r[0][1],
            M02: r[0][2],
            M03: r[0][3],
            M10: r[1][0],
            M11: r[1][1],
            M12: r[1][2],
            M13: r[1][3],
            M20: r[2][0],
            M21: r[2][1],
            M22: r[2][2],
            M23: r[2][3],
            M30: r[3][0],
            M31: r[3][1],
            M32: r[3][2],
            M33: r[3][3],
        }
    }
}
