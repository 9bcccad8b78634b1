//! Placement constraints.
//!
//! Global constraints apply to every candidate of an aggregation. Adjacency
//! and orientation constraints belong to individual parts and travel with them.

use serde::{Deserialize, Serialize};

use assemblage_kernel::{GeometryKernel, Line, Mesh, Plane, Point3d, Transform, Transformable, Vec3};

use crate::collider::Collider;
use crate::part::Part;

// ── Global constraints ─────────────────────────────────────────────────────

/// Keep parts on one side of a plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneConstraint {
    pub plane: Plane,
    /// Keep parts on the side the normal points to.
    pub positive: bool,
    /// Only test the part center.
    pub soft: bool,
    /// A failure rejects the placement on its own.
    pub required: bool,
}

/// Keep parts inside (or outside) a closed mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConstraint {
    pub mesh: Mesh,
    pub inside: bool,
    pub soft: bool,
    pub required: bool,
}

/// Constraint on where parts may be placed in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GlobalConstraint {
    Plane(PlaneConstraint),
    Mesh(MeshConstraint),
}

impl GlobalConstraint {
    /// Half-space bounded by `plane`; `positive` keeps the normal side.
    pub fn plane(plane: Plane, positive: bool, soft: bool, required: bool) -> Self {
        Self::Plane(PlaneConstraint {
            plane,
            positive,
            soft,
            required,
        })
    }

    /// Region bounded by a closed mesh; `inside` keeps the interior.
    pub fn mesh(mesh: Mesh, inside: bool, soft: bool, required: bool) -> Self {
        Self::Mesh(MeshConstraint {
            mesh,
            inside,
            soft,
            required,
        })
    }

    /// Soft constraints only test the part center.
    pub fn is_soft(&self) -> bool {
        match self {
            Self::Plane(c) => c.soft,
            Self::Mesh(c) => c.soft,
        }
    }

    /// A failing required constraint rejects on its own.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Plane(c) => c.required,
            Self::Mesh(c) => c.required,
        }
    }

    /// Point-only test.
    pub fn check_soft(&self, kernel: &dyn GeometryKernel, point: &Point3d, tolerance: f64) -> bool {
        match self {
            Self::Plane(c) => {
                let d = c.plane.distance_to_point(point);
                if c.positive {
                    d > 0.0
                } else {
                    d < 0.0
                }
            }
            Self::Mesh(c) => kernel.point_in_mesh(&c.mesh, point, tolerance, true) == c.inside,
        }
    }

    /// Full test: the point test, and for hard constraints no collider piece
    /// may cross the bound geometry.
    pub fn check(
        &self,
        kernel: &dyn GeometryKernel,
        point: &Point3d,
        collider: &Collider,
        tolerance: f64,
    ) -> bool {
        if !self.check_soft(kernel, point, tolerance) {
            return false;
        }
        if self.is_soft() {
            return true;
        }
        match self {
            Self::Plane(c) => !collider
                .geometry
                .iter()
                .any(|g| kernel.mesh_plane_intersect(g, &c.plane)),
            Self::Mesh(c) => !collider
                .geometry
                .iter()
                .any(|g| kernel.mesh_mesh_intersect(g, &c.mesh)),
        }
    }
}

// ── Adjacency ──────────────────────────────────────────────────────────────

/// Whether probes must hit a listed part or must not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdjacencyMode {
    /// Every probe must touch a neighbour.
    #[default]
    Adjacency,
    /// No probe may touch a neighbour.
    Exclusion,
}

/// A probe line, optionally restricted to neighbours of the given part names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyProbe {
    pub line: Line,
    /// Empty matches any part.
    pub part_names: Vec<String>,
}

impl AdjacencyProbe {
    pub fn new(line: Line, part_names: Vec<String>) -> Self {
        Self { line, part_names }
    }

    fn hits(&self, kernel: &dyn GeometryKernel, part: &Part) -> bool {
        (self.part_names.is_empty() || self.part_names.iter().any(|n| *n == part.name))
            && part.collider.intersects_line(kernel, &self.line)
    }
}

impl Transformable for AdjacencyProbe {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            line: self.line.transform(t),
            part_names: self.part_names.clone(),
        }
    }
}

/// Probe lines tested against neighbouring parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyConstraint {
    pub probes: Vec<AdjacencyProbe>,
    pub mode: AdjacencyMode,
}

impl AdjacencyConstraint {
    pub fn new(probes: Vec<AdjacencyProbe>, mode: AdjacencyMode) -> Self {
        Self { probes, mode }
    }

    /// True when the constraint is satisfied by the given neighbours.
    pub fn check(&self, kernel: &dyn GeometryKernel, neighbours: &[&Part]) -> bool {
        let touches = |probe: &AdjacencyProbe| neighbours.iter().any(|p| probe.hits(kernel, p));
        match self.mode {
            AdjacencyMode::Adjacency => self.probes.iter().all(touches),
            AdjacencyMode::Exclusion => !self.probes.iter().any(touches),
        }
    }
}

impl Transformable for AdjacencyConstraint {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            probes: self.probes.transform(t),
            mode: self.mode,
        }
    }
}

// ── Orientation ────────────────────────────────────────────────────────────

/// A part axis must stay within `max_angle` radians of a world direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationConstraint {
    /// Part-local axis; moves with the part.
    pub axis: Vec3,
    /// World direction; fixed.
    pub direction: Vec3,
    pub max_angle: f64,
}

impl OrientationConstraint {
    pub fn new(axis: Vec3, direction: Vec3, max_angle: f64) -> Self {
        Self {
            axis,
            direction,
            max_angle,
        }
    }

    /// True while the axis stays within `max_angle` of the direction.
    pub fn check(&self) -> bool {
        self.axis.angle_to(&self.direction) <= self.max_angle
    }
}

impl Transformable for OrientationConstraint {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            axis: self.axis.transform(t),
            direction: self.direction,
            max_angle: self.max_angle,
        }
    }
}
