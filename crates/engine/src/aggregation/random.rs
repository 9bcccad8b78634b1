//! Stochastic growth.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use assemblage_kernel::{Transform, Transformable};

use super::{AggregateReport, Aggregation, Verdict};
use crate::error::AggregationError;

/// A rule picked at a placed part's connection.
struct Pick {
    part_id: usize,
    conn: usize,
    rule_index: usize,
}

enum Probe {
    Found(Pick),
    NothingActive,
    CatalogEmpty,
}

impl Aggregation {
    /// Grow by up to `num` parts picked at random.
    ///
    /// Every placement probes random (part, active connection, active rule)
    /// triples. A rejected rule is deactivated at that connection for good
    /// (subject to the prune policy), which is what bounds the search. With
    /// `use_catalog` the new part type is drawn from the catalog first.
    #[instrument(skip(self), fields(aggregation = %self.name))]
    pub fn aggregate_rnd(&mut self, num: usize, use_catalog: bool) -> Result<AggregateReport, AggregationError> {
        let use_catalog = use_catalog && self.catalog.is_some();
        let max_loops = num.saturating_mul(self.config.loop_factor);
        let mut added = 0;
        let mut loops = 0;

        while added < num {
            loops += 1;
            if loops > max_loops {
                warn!(loops, "iteration cap reached");
                break;
            }

            if self.aggregated_parts.is_empty() {
                if !self.seed_random_root(use_catalog)? {
                    break;
                }
                added += 1;
                continue;
            }

            let pick = match self.probe(use_catalog) {
                Probe::Found(pick) => pick,
                Probe::NothingActive => {
                    warn!("no active rule found");
                    break;
                }
                Probe::CatalogEmpty => {
                    warn!("catalog exhausted");
                    break;
                }
            };

            let (anchor, template, rule) = {
                let anchor = &self.aggregated_parts[pick.part_id];
                let rule = anchor.connections[pick.conn].rules_table[pick.rule_index].clone();
                (anchor, self.template(&rule.part2)?, rule)
            };
            let transform = self.join_transform(anchor, pick.conn, template, rule.conn2)?;
            let candidate = template.transform(&transform);

            match self.check_candidate(&candidate) {
                Verdict::Accept { valid_connections } => {
                    let id = self.place_child(candidate, pick.part_id, pick.conn, rule.conn2, valid_connections);
                    if let Some(catalog) = self.catalog.as_mut().filter(|_| use_catalog) {
                        catalog.update(&rule.part2, -1.0);
                        self.aggregated_parts[id].from_catalog = true;
                    }
                    added += 1;
                }
                Verdict::Reject(reason) => {
                    if self.config.prune_policy.prunes(reason) {
                        self.aggregated_parts[pick.part_id].prune_rule(pick.conn, pick.rule_index);
                    }
                }
            }
        }

        if added > 0 {
            // field candidates of the new parts are not queued yet
            self.queue_stale = true;
        }
        let report = AggregateReport {
            requested: num,
            placed: added,
        };
        match report.message() {
            Some(message) => warn!(%message, "stochastic growth stopped early"),
            None => info!(placed = added, total = self.aggregated_parts.len(), "stochastic growth complete"),
        }
        Ok(report)
    }

    /// Place the first part at the identity. Returns false when the catalog
    /// has nothing left.
    fn seed_random_root(&mut self, use_catalog: bool) -> Result<bool, AggregationError> {
        let name = if use_catalog {
            match self.catalog.as_ref().and_then(|c| c.return_weighted_part(&mut self.rng)) {
                Some(name) => name,
                None => return Ok(false),
            }
        } else {
            let names: Vec<&String> = self.parts.keys().collect();
            match names.choose(&mut self.rng) {
                Some(name) => (*name).clone(),
                None => return Err(AggregationError::EmptyPalette),
            }
        };
        let template = self.template(&name)?.clone();
        let id = self.place_root(&template, &Transform::identity());
        if use_catalog {
            if let Some(catalog) = self.catalog.as_mut() {
                catalog.update(&name, -1.0);
                self.aggregated_parts[id].from_catalog = true;
            }
        }
        debug!(id, %name, "seeded root part");
        Ok(true)
    }

    fn probe(&mut self, use_catalog: bool) -> Probe {
        let attempts = if use_catalog {
            self.config.catalog_probe_attempts
        } else {
            self.config.probe_attempts
        };

        for _ in 0..attempts {
            let part_id = self.rng.gen_range(0..self.aggregated_parts.len());
            let part = &self.aggregated_parts[part_id];
            let Some(&conn) = part.active_connections.choose(&mut self.rng) else {
                continue;
            };
            let connection = &part.connections[conn];

            let target = if use_catalog {
                match self.catalog.as_ref().and_then(|c| c.return_weighted_part(&mut self.rng)) {
                    Some(name) => Some(name),
                    None => return Probe::CatalogEmpty,
                }
            } else {
                None
            };

            let candidates: Vec<usize> = connection
                .active()
                .filter(|(_, rule)| target.as_ref().map_or(true, |t| *t == rule.part2))
                .map(|(i, _)| i)
                .collect();
            if let Some(&rule_index) = candidates.choose(&mut self.rng) {
                return Probe::Found(Pick {
                    part_id,
                    conn,
                    rule_index,
                });
            }
        }
        Probe::NothingActive
    }
}
