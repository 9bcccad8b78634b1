use serde::{Deserialize, Serialize};

use assemblage_kernel::{Mesh, Point3d, Transform, Transformable};

use crate::attribute::Attribute;
use crate::collider::Collider;
use crate::connection::Connection;
use crate::constraints::{AdjacencyConstraint, OrientationConstraint};
use crate::rule::Rule;
use crate::support::Support;

/// The connections consumed by a placement: `parent_conn` on the parent,
/// `conn` on the placed part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joint {
    pub parent_conn: usize,
    pub conn: usize,
}

/// Optional per-part constraints. A part with an empty bundle behaves like a
/// plain part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartConstraints {
    /// Secondary collider (e.g. an assembly tool envelope) tested against
    /// every placed part.
    pub add_collider: Option<Collider>,
    /// Alternative support groups; one satisfied group is enough.
    pub supports: Vec<Support>,
    pub adjacency: Vec<AdjacencyConstraint>,
    pub orientation: Vec<OrientationConstraint>,
    pub sub_parts: Vec<Part>,
    pub hierarchy_level: usize,
}

impl PartConstraints {
    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.add_collider.is_none()
            && self.supports.is_empty()
            && self.adjacency.is_empty()
            && self.orientation.is_empty()
            && self.sub_parts.is_empty()
    }
}

impl Transformable for PartConstraints {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            add_collider: self.add_collider.transform(t),
            supports: self.supports.transform(t),
            adjacency: self.adjacency.transform(t),
            orientation: self.orientation.transform(t),
            sub_parts: self.sub_parts.transform(t),
            hierarchy_level: self.hierarchy_level,
        }
    }
}

/// A placeable module.
///
/// Palette entries are templates; every placement clones a template,
/// transforms it and appends it to the aggregation with `id` equal to its
/// index there. `parent` and `children` are indices into the same arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    pub id: usize,
    /// Explicit id carried over from a replayed sequence.
    pub label: Option<String>,
    pub geometry: Mesh,
    pub connections: Vec<Connection>,
    /// Indices of connections still available for growth.
    pub active_connections: Vec<usize>,
    pub transformation: Transform,
    pub center: Point3d,
    pub collider: Collider,
    /// Enclosing radius around `center` used by the broad phase.
    pub dim: f64,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub joint: Option<Joint>,
    pub attributes: Vec<Attribute>,
    /// Name of the field scoring this part type when several fields are used.
    pub field: Option<String>,
    pub constraints: Option<PartConstraints>,
    /// Connections left usable by the additional collider at placement time.
    pub valid_connections: Option<Vec<usize>>,
    /// Whether placing this part used up a catalog entry.
    #[serde(default)]
    pub from_catalog: bool,
}

impl Part {
    /// Build a template. Connection ids are reassigned `0..n` and bound to
    /// `name`; `dim` is derived from the collider.
    pub fn new(
        name: impl Into<String>,
        geometry: Mesh,
        connections: Vec<Connection>,
        collider: Collider,
    ) -> Self {
        let name = name.into();
        let connections: Vec<Connection> = connections
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.id = i;
                c.part = name.clone();
                c
            })
            .collect();
        let center = geometry.bounding_box().center();
        let dim = enclosing_radius(&center, &collider, &geometry);
        Self {
            name,
            id: 0,
            label: None,
            geometry,
            connections,
            active_connections: Vec::new(),
            transformation: Transform::identity(),
            center,
            collider,
            dim,
            parent: None,
            children: Vec::new(),
            joint: None,
            attributes: Vec::new(),
            field: None,
            constraints: None,
            valid_connections: None,
            from_catalog: false,
        }
    }

    /// Override the broad-phase radius.
    pub fn with_dim(mut self, dim: f64) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Tag the field scoring this part type.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach a constraint bundle.
    pub fn with_constraints(mut self, constraints: PartConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// True when a non-empty constraint bundle is attached.
    pub fn is_constrained(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Label if one was assigned, the arena id otherwise.
    pub fn display_id(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// Regenerate every rule table and make every connection with rules
    /// available again.
    pub fn reset_part(&mut self, rules: &[Rule]) {
        for conn in &mut self.connections {
            conn.generate_rules_table(rules);
        }
        self.active_connections = self
            .connections
            .iter()
            .filter(|c| c.has_active_rules())
            .map(|c| c.id)
            .collect();
    }

    /// Like [`Part::reset_part`], keeping `consumed` connections unavailable
    /// and honouring any placement-time connection restriction.
    pub fn restore_connections(&mut self, rules: &[Rule], consumed: &[usize]) {
        self.reset_part(rules);
        let valid = self.valid_connections.clone();
        self.active_connections.retain(|c| {
            !consumed.contains(c) && valid.as_ref().map_or(true, |v| v.contains(c))
        });
    }

    pub fn remove_active_connection(&mut self, conn: usize) -> bool {
        match self.active_connections.iter().position(|&c| c == conn) {
            Some(pos) => {
                self.active_connections.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Deactivate a rule at a connection, and the connection too once it has
    /// no rules left.
    pub fn prune_rule(&mut self, conn: usize, rule_index: usize) {
        if let Some(c) = self.connections.get_mut(conn) {
            c.deactivate_rule(rule_index);
            if !c.has_active_rules() {
                self.remove_active_connection(conn);
            }
        }
    }
}

impl Transformable for Part {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            label: self.label.clone(),
            geometry: self.geometry.transform(t),
            connections: self.connections.transform(t),
            active_connections: self.active_connections.clone(),
            transformation: t.compose(&self.transformation),
            center: t.transform_point(&self.center),
            collider: self.collider.transform(t),
            dim: self.dim,
            parent: self.parent,
            children: self.children.clone(),
            joint: self.joint,
            attributes: self.attributes.transform(t),
            field: self.field.clone(),
            constraints: self.constraints.transform(t),
            valid_connections: self.valid_connections.clone(),
            from_catalog: self.from_catalog,
        }
    }
}

fn enclosing_radius(center: &Point3d, collider: &Collider, geometry: &Mesh) -> f64 {
    let source = if collider.geometry.iter().any(|g| !g.vertices.is_empty()) {
        collider.geometry.iter().collect::<Vec<_>>()
    } else {
        vec![geometry]
    };
    source
        .iter()
        .flat_map(|g| g.vertices.iter())
        .map(|v| v.distance_to(center))
        .fold(0.0_f64, f64::max)
}
