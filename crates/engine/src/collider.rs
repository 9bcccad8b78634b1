use serde::{Deserialize, Serialize};

use assemblage_kernel::{GeometryKernel, Line, Mesh, Transform, Transformable};

/// Intersection proxy for a part.
///
/// A *multiple* collider holds alternative pieces (for instance one tool
/// envelope per assembly direction); the part is clear when any one piece is.
/// `connections` optionally binds piece `i` to connection `connections[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub geometry: Vec<Mesh>,
    pub multiple: bool,
    pub check_all: bool,
    pub connections: Vec<usize>,
}

/// Result of testing a collider against placed parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColliderCheck {
    pub collision: bool,
    /// Indices of pieces found collision-free (multiple colliders only).
    pub valid_pieces: Vec<usize>,
}

impl Collider {
    /// Single collider made of several meshes.
    pub fn new(geometry: Vec<Mesh>) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    /// Collider made of one mesh.
    pub fn single(mesh: Mesh) -> Self {
        Self::new(vec![mesh])
    }

    /// Alternative pieces, each bound to one connection index.
    pub fn multiple(geometry: Vec<Mesh>, connections: Vec<usize>, check_all: bool) -> Self {
        Self {
            geometry,
            multiple: true,
            check_all,
            connections,
        }
    }

    /// True when there is no geometry to test.
    pub fn is_empty(&self) -> bool {
        self.geometry.iter().all(Mesh::is_empty)
    }

    fn piece_hits(kernel: &dyn GeometryKernel, piece: &Mesh, others: &[&Collider]) -> bool {
        others
            .iter()
            .flat_map(|c| c.geometry.iter())
            .any(|g| kernel.mesh_mesh_intersect(piece, g))
    }

    /// Test against the colliders of placed parts.
    ///
    /// Simple colliders collide as soon as any piece hits anything. Multiple
    /// colliders test each piece on its own; without `check_all` the scan stops
    /// at the first clear piece.
    pub fn check_collisions(&self, kernel: &dyn GeometryKernel, others: &[&Collider]) -> ColliderCheck {
        if !self.multiple {
            let collision = self
                .geometry
                .iter()
                .any(|piece| Self::piece_hits(kernel, piece, others));
            return ColliderCheck {
                collision,
                valid_pieces: Vec::new(),
            };
        }

        let mut valid_pieces = Vec::new();
        for (i, piece) in self.geometry.iter().enumerate() {
            if !Self::piece_hits(kernel, piece, others) {
                valid_pieces.push(i);
                if !self.check_all {
                    break;
                }
            }
        }
        ColliderCheck {
            collision: valid_pieces.is_empty(),
            valid_pieces,
        }
    }

    /// Map clear pieces to the connections they are bound to. Unbound pieces
    /// map to their own index.
    pub fn valid_connections(&self, valid_pieces: &[usize]) -> Vec<usize> {
        valid_pieces
            .iter()
            .map(|&i| self.connections.get(i).copied().unwrap_or(i))
            .collect()
    }

    /// True if any piece crosses the segment.
    pub fn intersects_line(&self, kernel: &dyn GeometryKernel, line: &Line) -> bool {
        self.geometry
            .iter()
            .any(|g| kernel.mesh_line_intersections(g, line) > 0)
    }
}

impl Transformable for Collider {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            geometry: self.geometry.transform(t),
            multiple: self.multiple,
            check_all: self.check_all,
            connections: self.connections.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assemblage_kernel::{MeshKernel, Point3d};

    fn cube(x: f64) -> Mesh {
        // Skewed offsets keep faces out of coplanar contact.
        Mesh::centered_box(Point3d::new(x, 0.13 * x, 0.07 * x), [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_simple_collider_collides() {
        let k = MeshKernel::default();
        let placed = Collider::single(cube(0.5));
        let check = Collider::single(cube(0.0)).check_collisions(&k, &[&placed]);
        assert!(check.collision);
        let far = Collider::single(cube(5.0)).check_collisions(&k, &[&placed]);
        assert!(!far.collision);
    }

    #[test]
    fn test_multiple_collider_collects_clear_pieces() {
        let k = MeshKernel::default();
        let placed = Collider::single(cube(0.0));
        let tool = Collider::multiple(vec![cube(0.3), cube(5.0), cube(9.0)], vec![2, 0, 1], true);
        let check = tool.check_collisions(&k, &[&placed]);
        assert!(!check.collision);
        assert_eq!(check.valid_pieces, vec![1, 2]);
        assert_eq!(tool.valid_connections(&check.valid_pieces), vec![0, 1]);
    }

    #[test]
    fn test_multiple_collider_fast_accept() {
        let k = MeshKernel::default();
        let placed = Collider::single(cube(0.0));
        let tool = Collider::multiple(vec![cube(5.0), cube(9.0)], Vec::new(), false);
        let check = tool.check_collisions(&k, &[&placed]);
        assert_eq!(check.valid_pieces, vec![0]);
    }

    #[test]
    fn test_multiple_collider_all_blocked() {
        let k = MeshKernel::default();
        let placed = Collider::single(cube(0.0));
        let tool = Collider::multiple(vec![cube(0.2), cube(-0.2)], Vec::new(), true);
        assert!(tool.check_collisions(&k, &[&placed]).collision);
    }

    #[test]
    fn test_line_intersection() {
        let k = MeshKernel::default();
        let c = Collider::single(cube(0.0));
        let hit = Line::new(Point3d::new(0.1, 0.2, -3.0), Point3d::new(0.1, 0.2, 3.0));
        let miss = Line::new(Point3d::new(3.0, 0.0, -3.0), Point3d::new(3.0, 0.0, 3.0));
        assert!(c.intersects_line(&k, &hit));
        assert!(!c.intersects_line(&k, &miss));
    }
}
