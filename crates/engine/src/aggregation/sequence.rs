//! Deterministic replay of recorded joins.

use tracing::{info, instrument, warn};

use assemblage_kernel::{Transform, Transformable};

use super::{AggregateReport, Aggregation};
use crate::error::AggregationError;
use crate::rule::{Rule, SequenceStep};

impl Aggregation {
    /// Replay steps of the form `"P1|C1_P2|C2>ID1_ID2"`.
    ///
    /// The first step on an empty aggregation places `P1` at the identity
    /// labelled `ID1`, then joins `P2` labelled `ID2`. Later steps join `P2`
    /// to the placed part labelled `ID1`. No constraints are checked: the
    /// sequence is assumed to come from a valid run. Malformed steps,
    /// connection indices the palette does not have and missing anchors are
    /// skipped and count as not placed. An unknown part name is an error and
    /// leaves the aggregation as it was before that step.
    #[instrument(skip(self, steps), fields(aggregation = %self.name, steps = steps.len()))]
    pub fn aggregate_sequence<S: AsRef<str>>(&mut self, steps: &[S]) -> Result<AggregateReport, AggregationError> {
        let mut placed = 0;
        for text in steps {
            let text = text.as_ref();
            let step: SequenceStep = match text.parse() {
                Ok(step) => step,
                Err(err) => {
                    warn!(%err, "skipping malformed sequence step");
                    continue;
                }
            };
            if self.apply_step(&step)? {
                placed += 1;
            }
        }

        if placed > 0 {
            self.queue_stale = true;
        }
        let report = AggregateReport {
            requested: steps.len(),
            placed,
        };
        match report.message() {
            Some(message) => warn!(%message, "sequence replay incomplete"),
            None => info!(placed, total = self.aggregated_parts.len(), "sequence replay complete"),
        }
        Ok(report)
    }

    fn apply_step(&mut self, step: &SequenceStep) -> Result<bool, AggregationError> {
        let rule = &step.rule;
        let ends = [(self.template(&rule.part1)?, rule.conn1), (self.template(&rule.part2)?, rule.conn2)];
        if let Some((part, conn)) = ends.iter().find(|(part, conn)| *conn >= part.connections.len()) {
            warn!(step = %step, part = %part.name, conn, "connection index out of range, skipping step");
            return Ok(false);
        }

        let anchor_id = if self.aggregated_parts.is_empty() {
            let root = self.template(&rule.part1)?.clone();
            let id = self.place_root(&root, &Transform::identity());
            self.aggregated_parts[id].label = Some(step.id1.clone());
            id
        } else {
            match self.find_by_display_id(&step.id1) {
                Some(id) => id,
                None => {
                    warn!(anchor = %step.id1, step = %step, "anchor part not found");
                    return Ok(false);
                }
            }
        };

        let anchor = &self.aggregated_parts[anchor_id];
        if anchor.name != rule.part1 {
            warn!(anchor = %step.id1, expected = %rule.part1, found = %anchor.name, "anchor part has another type");
            return Ok(false);
        }
        let template = self.template(&rule.part2)?;
        let transform = self.join_transform(anchor, rule.conn1, template, rule.conn2)?;
        let candidate = template.transform(&transform);

        // Informative only: a replayed join is never refused.
        let valid_connections = self.additional_collider_check(&candidate).ok().flatten();
        let id = self.place_child(candidate, anchor_id, rule.conn1, rule.conn2, valid_connections);
        self.aggregated_parts[id].label = Some(step.id2.clone());
        Ok(true)
    }

    /// Most recently placed part whose label (or id, when unlabelled) matches.
    pub fn find_by_display_id(&self, display_id: &str) -> Option<usize> {
        self.aggregated_parts
            .iter()
            .rposition(|p| p.display_id() == display_id)
    }

    /// Steps that rebuild the tree grown from the first part, in placement
    /// order, suitable for [`Aggregation::aggregate_sequence`].
    pub fn sequence_rules(&self) -> Vec<String> {
        let mut in_tree = vec![false; self.aggregated_parts.len()];
        let mut steps = Vec::new();
        for (id, part) in self.aggregated_parts.iter().enumerate() {
            let (Some(parent_id), Some(joint)) = (part.parent, part.joint) else {
                in_tree[id] = id == 0;
                continue;
            };
            let Some(parent) = self.aggregated_parts.get(parent_id) else {
                continue;
            };
            if !in_tree.get(parent_id).copied().unwrap_or(false) {
                continue;
            }
            in_tree[id] = true;
            let step = SequenceStep {
                rule: Rule::new(parent.name.as_str(), joint.parent_conn, part.name.as_str(), joint.conn),
                id1: parent.display_id(),
                id2: part.display_id(),
            };
            steps.push(step.to_string());
        }
        steps
    }
}
