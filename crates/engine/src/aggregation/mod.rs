//! The aggregation: a palette of template parts, a rule set, and the growing
//! arena of placed parts.
//!
//! Growth is incremental. Every `aggregate_*` call continues from the current
//! state, so a host can call it repeatedly and inspect the partial result in
//! between.

mod checks;
mod field;
mod random;
mod sequence;

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use assemblage_kernel::{GeometryKernel, MeshKernel, Tolerance, Transform, Transformable};

use crate::catalog::PartCatalog;
use crate::config::{AggregationConfig, AggregationMode};
use crate::constraints::GlobalConstraint;
use crate::error::AggregationError;
use crate::field::FieldSource;
use crate::part::{Joint, Part};
use crate::queue::AggregationQueue;
use crate::rule::Rule;

pub use checks::{RejectReason, Verdict};

/// Outcome of a growth call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateReport {
    pub requested: usize,
    pub placed: usize,
}

impl AggregateReport {
    /// Number of requested parts that were not placed.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.placed)
    }

    /// True when every requested part was placed.
    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }

    /// Human-readable shortfall, `None` when everything was placed.
    pub fn message(&self) -> Option<String> {
        match self.shortfall() {
            0 => None,
            n => Some(format!("could not place {n} parts")),
        }
    }
}

/// Palette, rules and placed parts, plus the state driving growth.
pub struct Aggregation {
    pub name: String,
    parts: BTreeMap<String, Part>,
    rules: Vec<Rule>,
    config: AggregationConfig,
    aggregated_parts: Vec<Part>,
    field: Option<FieldSource>,
    queue: AggregationQueue,
    queue_stale: bool,
    prev_num: usize,
    global_constraints: Vec<GlobalConstraint>,
    catalog: Option<PartCatalog>,
    kernel: Box<dyn GeometryKernel>,
    rng: StdRng,
}

impl std::fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregation")
            .field("name", &self.name)
            .field("palette", &self.parts.keys().collect::<Vec<_>>())
            .field("rules", &self.rules.len())
            .field("placed", &self.aggregated_parts.len())
            .field("mode", &self.config.mode)
            .field("queue", &self.queue.len())
            .finish()
    }
}

impl Aggregation {
    /// Create an empty aggregation over its own copy of the palette.
    ///
    /// Every rule must reference palette parts and existing connections.
    pub fn new(
        name: impl Into<String>,
        parts: Vec<Part>,
        rules: Vec<Rule>,
        config: AggregationConfig,
    ) -> Result<Self, AggregationError> {
        if parts.is_empty() {
            return Err(AggregationError::EmptyPalette);
        }
        let parts: BTreeMap<String, Part> = parts.into_iter().map(|p| (p.name.clone(), p)).collect();
        validate_rules(&parts, &rules)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let kernel = MeshKernel::new(Tolerance::with_coincidence(config.tolerance));

        let mut aggregation = Self {
            name: name.into(),
            parts,
            rules,
            config,
            aggregated_parts: Vec::new(),
            field: None,
            queue: AggregationQueue::new(),
            queue_stale: false,
            prev_num: 0,
            global_constraints: Vec::new(),
            catalog: None,
            kernel: Box::new(kernel),
            rng,
        };
        aggregation.reset_templates();
        Ok(aggregation)
    }

    /// Replace the default [`MeshKernel`] with another geometry kernel.
    pub fn with_kernel(mut self, kernel: Box<dyn GeometryKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Constraints every placement is checked against in global modes.
    pub fn with_global_constraints(mut self, constraints: Vec<GlobalConstraint>) -> Self {
        self.global_constraints = constraints;
        self
    }

    /// Attach a part catalog for catalog-driven stochastic growth.
    pub fn with_catalog(mut self, catalog: PartCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Attach a field; its queue is built on the next field growth call.
    pub fn with_field(mut self, field: FieldSource) -> Self {
        self.field = Some(field);
        self.queue_stale = true;
        self
    }

    /// Seed with externally placed parts. They get dense ids, lose any tree
    /// links, and can never be removed by [`Aggregation::remove_elements`].
    pub fn with_previous_parts(mut self, previous: Vec<Part>) -> Self {
        for mut part in previous {
            part.id = self.aggregated_parts.len();
            part.parent = None;
            part.children.clear();
            part.joint = None;
            part.from_catalog = false;
            part.reset_part(&self.rules);
            self.aggregated_parts.push(part);
        }
        self.prev_num = self.aggregated_parts.len();
        self.queue_stale = true;
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// Template palette, keyed by part name.
    pub fn parts(&self) -> &BTreeMap<String, Part> {
        &self.parts
    }

    /// Rule set in use.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Configuration the aggregation was built with.
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Current constraint mode.
    pub fn mode(&self) -> AggregationMode {
        self.config.mode
    }

    /// Placed parts in placement order; index equals id.
    pub fn aggregated_parts(&self) -> &[Part] {
        &self.aggregated_parts
    }

    /// Number of placed parts, previous parts included.
    pub fn len(&self) -> usize {
        self.aggregated_parts.len()
    }

    /// True before anything was placed.
    pub fn is_empty(&self) -> bool {
        self.aggregated_parts.is_empty()
    }

    /// Number of previous parts, which are never removed.
    pub fn prev_num(&self) -> usize {
        self.prev_num
    }

    /// Attached part catalog, if any.
    pub fn catalog(&self) -> Option<&PartCatalog> {
        self.catalog.as_ref()
    }

    /// Attached field source, if any.
    pub fn field(&self) -> Option<&FieldSource> {
        self.field.as_ref()
    }

    /// Pending field candidates.
    pub fn queue(&self) -> &AggregationQueue {
        &self.queue
    }

    /// Global constraints checked in global modes.
    pub fn global_constraints(&self) -> &[GlobalConstraint] {
        &self.global_constraints
    }

    /// Geometry kernel used by every intersection test.
    pub fn kernel(&self) -> &dyn GeometryKernel {
        self.kernel.as_ref()
    }

    /// Sub-parts of every placed part at the given hierarchy level.
    pub fn sub_parts(&self, level: usize) -> Vec<&Part> {
        self.aggregated_parts
            .iter()
            .filter_map(|p| p.constraints.as_ref())
            .filter(|c| c.hierarchy_level == level)
            .flat_map(|c| c.sub_parts.iter())
            .collect()
    }

    // ── Reconfiguration ────────────────────────────────────────────────────

    /// Attach or detach the part catalog.
    pub fn set_catalog(&mut self, catalog: Option<PartCatalog>) {
        self.catalog = catalog;
    }

    /// Replace the global constraints.
    pub fn set_global_constraints(&mut self, constraints: Vec<GlobalConstraint>) {
        self.global_constraints = constraints;
    }

    /// Replace the field and rebuild the queue from the placed parts.
    pub fn set_field(&mut self, field: Option<FieldSource>) -> Result<(), AggregationError> {
        self.field = field;
        self.rebuild_queue()
    }

    /// Replace the rule set. Rule tables of templates and placed parts are
    /// regenerated; connections consumed by joints stay consumed.
    pub fn reset_rules(&mut self, rules: Vec<Rule>) -> Result<(), AggregationError> {
        validate_rules(&self.parts, &rules)?;
        self.rules = rules;
        self.reset_templates();
        self.restore_placed_connections();
        self.queue_stale = true;
        Ok(())
    }

    /// Switch the constraint mode and regenerate rule tables.
    pub fn set_mode(&mut self, mode: AggregationMode) -> Result<(), AggregationError> {
        self.config.mode = mode;
        let rules = self.rules.clone();
        self.reset_rules(rules)
    }

    /// Truncate to the first `keep` parts (never below the previous parts),
    /// unlink removed children and make freed connections available again.
    /// Parts drawn from a limited catalog are returned to it.
    pub fn remove_elements(&mut self, keep: usize) -> Result<(), AggregationError> {
        let keep = keep.max(self.prev_num);
        if keep >= self.aggregated_parts.len() {
            return Ok(());
        }
        let removed = self.aggregated_parts.split_off(keep);
        if let Some(catalog) = self.catalog.as_mut().filter(|c| c.is_limited()) {
            for part in removed.iter().filter(|p| p.from_catalog) {
                catalog.update(&part.name, 1.0);
            }
        }
        for part in &mut self.aggregated_parts {
            part.children.retain(|&c| c < keep);
        }
        self.restore_placed_connections();
        debug!(kept = keep, removed = removed.len(), "removed parts");
        self.rebuild_queue()
    }

    // ── Shared helpers ─────────────────────────────────────────────────────

    /// Install already validated placed parts, as loaded from records.
    pub(crate) fn restore_records(&mut self, parts: Vec<Part>, prev_num: usize) {
        self.aggregated_parts = parts;
        self.prev_num = prev_num;
        self.queue_stale = true;
    }

    fn reset_templates(&mut self) {
        for part in self.parts.values_mut() {
            part.reset_part(&self.rules);
        }
    }

    /// Connections of a placed part consumed by its own joint or by its
    /// children's joints.
    fn consumed_connections(&self, id: usize) -> Vec<usize> {
        let Some(part) = self.aggregated_parts.get(id) else {
            return Vec::new();
        };
        part.joint
            .map(|j| j.conn)
            .into_iter()
            .chain(part.children.iter().filter_map(|&c| {
                self.aggregated_parts.get(c).and_then(|child| child.joint).map(|j| j.parent_conn)
            }))
            .collect()
    }

    fn restore_placed_connections(&mut self) {
        for id in 0..self.aggregated_parts.len() {
            let consumed = self.consumed_connections(id);
            self.aggregated_parts[id].restore_connections(&self.rules, &consumed);
        }
    }

    fn template(&self, name: &str) -> Result<&Part, AggregationError> {
        self.parts.get(name).ok_or_else(|| AggregationError::UnknownPart {
            name: name.to_string(),
        })
    }

    /// Transform that joins connection `conn` of `template` to connection
    /// `anchor_conn` of a placed part.
    fn join_transform(
        &self,
        anchor: &Part,
        anchor_conn: usize,
        template: &Part,
        conn: usize,
    ) -> Result<Transform, AggregationError> {
        let target = anchor
            .connections
            .get(anchor_conn)
            .ok_or_else(|| out_of_range(anchor, anchor_conn))?;
        let source = template
            .connections
            .get(conn)
            .ok_or_else(|| out_of_range(template, conn))?;
        Ok(self.kernel.plane_to_plane(&source.flip_plane, &target.plane))
    }

    /// Append a root part at the given transform.
    fn place_root(&mut self, template: &Part, transform: &Transform) -> usize {
        let mut part = template.transform(transform);
        part.id = self.aggregated_parts.len();
        part.parent = None;
        part.children.clear();
        part.joint = None;
        self.aggregated_parts.push(part);
        self.aggregated_parts.len() - 1
    }

    /// Append an already transformed candidate as a child of `parent_id`,
    /// consuming `parent_conn` on the parent and `conn` on the candidate.
    fn place_child(
        &mut self,
        mut part: Part,
        parent_id: usize,
        parent_conn: usize,
        conn: usize,
        valid_connections: Option<Vec<usize>>,
    ) -> usize {
        let id = self.aggregated_parts.len();
        part.id = id;
        part.parent = Some(parent_id);
        part.children.clear();
        part.joint = Some(Joint { parent_conn, conn });
        part.remove_active_connection(conn);
        if let Some(valid) = &valid_connections {
            part.active_connections.retain(|c| valid.contains(c));
        }
        part.valid_connections = valid_connections;

        if let Some(parent) = self.aggregated_parts.get_mut(parent_id) {
            parent.children.push(id);
            parent.remove_active_connection(parent_conn);
        }
        debug!(id, name = %part.name, parent_id, parent_conn, conn, "placed part");
        self.aggregated_parts.push(part);
        id
    }
}

fn out_of_range(part: &Part, index: usize) -> AggregationError {
    AggregationError::ConnectionOutOfRange {
        part: part.name.clone(),
        index,
        count: part.connections.len(),
    }
}

fn validate_rules(parts: &BTreeMap<String, Part>, rules: &[Rule]) -> Result<(), AggregationError> {
    for rule in rules {
        for (name, conn) in [(&rule.part1, rule.conn1), (&rule.part2, rule.conn2)] {
            let part = parts
                .get(name)
                .ok_or_else(|| AggregationError::UnknownPart { name: name.clone() })?;
            if conn >= part.connections.len() {
                return Err(out_of_range(part, conn));
            }
        }
    }
    Ok(())
}
