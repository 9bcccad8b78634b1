//! Field-driven growth over a sorted candidate queue.

use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

use assemblage_kernel::{Transform, Transformable};

use super::{AggregateReport, Aggregation, Verdict};
use crate::error::AggregationError;
use crate::queue::QueueEntry;

impl Aggregation {
    /// Grow by up to `num` parts, always placing the queued candidate whose
    /// center scores highest in the field.
    ///
    /// An empty aggregation is seeded with a random part moved onto the
    /// field's highest point (restricted to points passing the global
    /// constraints' point tests when global checks are on). Popped candidates
    /// are discarded whether or not they are placed.
    #[instrument(skip(self), fields(aggregation = %self.name))]
    pub fn aggregate_field(&mut self, num: usize) -> Result<AggregateReport, AggregationError> {
        if self.field.is_none() {
            return Err(AggregationError::MissingField);
        }
        if self.queue_stale {
            self.rebuild_queue()?;
        }

        let mut added = 0;
        if num > 0 && self.aggregated_parts.is_empty() {
            if !self.seed_field_root()? {
                warn!("no field point accepted a seed part");
                return Ok(AggregateReport {
                    requested: num,
                    placed: 0,
                });
            }
            added += 1;
        }

        while added < num {
            let Some((value, entry)) = self.queue.pop_max() else {
                break;
            };
            let parent_free = self
                .aggregated_parts
                .get(entry.parent_id)
                .is_some_and(|p| p.active_connections.contains(&entry.parent_conn));
            if !parent_free {
                continue;
            }

            let candidate = self.template(&entry.part_name)?.transform(&entry.transform);
            match self.check_candidate(&candidate) {
                Verdict::Accept { valid_connections } => {
                    let id = self.place_child(candidate, entry.parent_id, entry.parent_conn, entry.conn, valid_connections);
                    self.compute_next_w_field(id)?;
                    debug!(id, value, "placed field candidate");
                    added += 1;
                }
                Verdict::Reject(_) => {}
            }
        }

        let report = AggregateReport {
            requested: num,
            placed: added,
        };
        match report.message() {
            Some(message) => warn!(%message, queue = self.queue.len(), "field growth stopped early"),
            None => info!(placed = added, total = self.aggregated_parts.len(), "field growth complete"),
        }
        Ok(report)
    }

    fn seed_field_root(&mut self) -> Result<bool, AggregationError> {
        let names: Vec<String> = self.parts.keys().cloned().collect();
        let Some(name) = names.choose(&mut self.rng).cloned() else {
            return Err(AggregationError::EmptyPalette);
        };
        let template = self.template(&name)?.clone();
        let Some(source) = self.field.as_ref() else {
            return Err(AggregationError::MissingField);
        };
        let field = source.field_for(&template)?;

        let filter_global = self.config.mode.checks_global() && !self.global_constraints.is_empty();
        let highest = field.highest_point(|p| {
            !filter_global
                || self
                    .global_constraints
                    .iter()
                    .all(|c| c.check_soft(self.kernel.as_ref(), p, self.config.tolerance))
        });
        let Some(highest) = highest else {
            return Ok(false);
        };

        let shift = highest - template.center;
        let id = self.place_root(&template, &Transform::from_translation_vec(shift));
        debug!(id, %name, "seeded root part at field maximum");
        self.compute_next_w_field(id)?;
        Ok(true)
    }

    /// Queue every candidate reachable from the active connections of a
    /// placed part, scored by the field value at the candidate's center.
    /// Candidates whose center falls outside the field are dropped.
    pub fn compute_next_w_field(&mut self, part_id: usize) -> Result<(), AggregationError> {
        let Some(source) = self.field.as_ref() else {
            return Err(AggregationError::MissingField);
        };
        let Some(part) = self.aggregated_parts.get(part_id) else {
            return Ok(());
        };

        let mut scored = Vec::new();
        for &conn in &part.active_connections {
            let Some(connection) = part.connections.get(conn) else {
                continue;
            };
            for (_, rule) in connection.active() {
                let template = self.template(&rule.part2)?;
                let transform = self.join_transform(part, conn, template, rule.conn2)?;
                let center = transform.transform_point(&template.center);
                if let Some(value) = source.field_for(template)?.value_at(&center) {
                    scored.push((
                        value,
                        QueueEntry {
                            part_name: rule.part2.clone(),
                            parent_id: part_id,
                            parent_conn: conn,
                            conn: rule.conn2,
                            transform,
                        },
                    ));
                }
            }
        }

        for (value, entry) in scored {
            self.queue.insert(value, entry);
        }
        Ok(())
    }

    /// Recompute the queue from every placed part. Without a field the queue
    /// is simply cleared.
    pub(crate) fn rebuild_queue(&mut self) -> Result<(), AggregationError> {
        self.queue.clear();
        self.queue_stale = false;
        if self.field.is_none() {
            return Ok(());
        }
        for id in 0..self.aggregated_parts.len() {
            self.compute_next_w_field(id)?;
        }
        Ok(())
    }
}
