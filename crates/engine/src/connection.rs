use serde::{Deserialize, Serialize};

use assemblage_kernel::{Plane, Transform, Transformable};

use crate::rule::Rule;

/// A typed attachment plane on a part.
///
/// `flip_plane` has its y axis (and normal) reversed. New parts are aligned by
/// mapping their connection's flipped plane onto the anchor's plane, so the two
/// normals end up facing each other without mirroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub plane: Plane,
    pub flip_plane: Plane,
    #[serde(rename = "type")]
    pub kind: String,
    /// Name of the owning part.
    pub part: String,
    pub id: usize,
    /// Rules whose first endpoint is this connection.
    pub rules_table: Vec<Rule>,
    /// Indices into `rules_table` still available at this connection.
    pub active_rules: Vec<usize>,
}

impl Connection {
    /// Connection of connection type `kind` on part `part`.
    pub fn new(plane: Plane, kind: impl Into<String>, part: impl Into<String>, id: usize) -> Self {
        Self {
            flip_plane: plane.flipped(),
            plane,
            kind: kind.into(),
            part: part.into(),
            id,
            rules_table: Vec::new(),
            active_rules: Vec::new(),
        }
    }

    /// Rebuild the rule table from `rules`; every matching rule starts active.
    pub fn generate_rules_table(&mut self, rules: &[Rule]) {
        self.rules_table = rules
            .iter()
            .filter(|r| r.part1 == self.part && r.conn1 == self.id)
            .cloned()
            .collect();
        self.active_rules = (0..self.rules_table.len()).collect();
    }

    /// True while any rule is still active here.
    pub fn has_active_rules(&self) -> bool {
        !self.active_rules.is_empty()
    }

    /// Iterate the still-active rules as `(table index, rule)`.
    pub fn active(&self) -> impl Iterator<Item = (usize, &Rule)> + '_ {
        self.active_rules
            .iter()
            .filter_map(|&i| self.rules_table.get(i).map(|r| (i, r)))
    }

    /// Deactivate a rule by table index. Returns false if it was not active.
    pub fn deactivate_rule(&mut self, rule_index: usize) -> bool {
        match self.active_rules.iter().position(|&i| i == rule_index) {
            Some(pos) => {
                self.active_rules.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl Transformable for Connection {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            plane: self.plane.transform(t),
            flip_plane: self.flip_plane.transform(t),
            ..self.clone()
        }
    }
}
