//! The placement pipeline shared by every growth algorithm.
//!
//! Order matters: the cheap center-distance broad phase runs first and the
//! expensive mesh tests only see the parts it lets through.

use std::fmt;

use tracing::{debug, instrument};

use assemblage_kernel::{Transform, Transformable};

use super::Aggregation;
use crate::collider::Collider;
use crate::part::Part;

/// Why a candidate placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Centers closer than the aggregation tolerance.
    Overlap,
    Collision,
    AdditionalCollider,
    MissingSupports,
    Adjacency,
    Orientation,
    GlobalConstraint,
}

impl RejectReason {
    /// Rejections a later placement could lift.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::MissingSupports | Self::Adjacency)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Overlap => "overlap",
            Self::Collision => "collision",
            Self::AdditionalCollider => "additional collider",
            Self::MissingSupports => "missing supports",
            Self::Adjacency => "adjacency",
            Self::Orientation => "orientation",
            Self::GlobalConstraint => "global constraint",
        };
        f.write_str(text)
    }
}

/// Result of the placement pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `valid_connections` lists the connections the additional collider left
    /// usable, when it is a multiple collider. It belongs to the placed
    /// instance only.
    Accept { valid_connections: Option<Vec<usize>> },
    Reject(RejectReason),
}

impl Verdict {
    /// Whether the candidate may be placed.
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

impl Aggregation {
    /// Run the full pipeline for `part` placed at `transform`.
    pub fn check_all_constraints(&self, part: &Part, transform: &Transform) -> Verdict {
        self.check_candidate(&part.transform(transform))
    }

    /// Run the full pipeline for an already transformed candidate.
    #[instrument(skip(self, candidate), fields(part = %candidate.name))]
    pub fn check_candidate(&self, candidate: &Part) -> Verdict {
        let neighbours = match self.collision_check(candidate) {
            Ok(neighbours) => neighbours,
            Err(reason) => return self.reject(reason),
        };

        let mode = self.config.mode;
        if mode.checks_global() && !self.global_constraints.is_empty() && self.global_constraints_check(candidate) {
            return self.reject(RejectReason::GlobalConstraint);
        }

        let mut valid_connections = None;
        if mode.checks_local() && candidate.is_constrained() {
            match self.additional_collider_check(candidate) {
                Ok(valid) => valid_connections = valid,
                Err(reason) => return self.reject(reason),
            }
            if self.missing_supports_check(candidate, &neighbours) {
                return self.reject(RejectReason::MissingSupports);
            }
            if self.adjacencies_check(candidate, &neighbours) {
                return self.reject(RejectReason::Adjacency);
            }
            if self.orientation_check(candidate) {
                return self.reject(RejectReason::Orientation);
            }
        }
        Verdict::Accept { valid_connections }
    }

    fn reject(&self, reason: RejectReason) -> Verdict {
        debug!(%reason, "candidate rejected");
        Verdict::Reject(reason)
    }

    /// Broad phase plus exact collider test.
    ///
    /// Returns the indices of placed parts within reach of the candidate
    /// (center distance below the sum of both radii), or the reason to reject.
    /// Coincident centers reject regardless of `coll_check`.
    pub fn collision_check(&self, candidate: &Part) -> Result<Vec<usize>, RejectReason> {
        let mut possible_collisions = Vec::new();
        for (i, placed) in self.aggregated_parts.iter().enumerate() {
            let distance = candidate.center.distance_to(&placed.center);
            if distance < self.config.tolerance {
                return Err(RejectReason::Overlap);
            }
            if distance < candidate.dim + placed.dim {
                possible_collisions.push(i);
            }
        }

        if self.config.coll_check && !possible_collisions.is_empty() {
            let others: Vec<&Collider> = possible_collisions
                .iter()
                .map(|&i| &self.aggregated_parts[i].collider)
                .collect();
            if candidate.collider.check_collisions(self.kernel(), &others).collision {
                return Err(RejectReason::Collision);
            }
        }
        Ok(possible_collisions)
    }

    /// Test the secondary collider against every placed part.
    ///
    /// On success, a multiple collider reports which connections its clear
    /// pieces are bound to.
    pub fn additional_collider_check(&self, candidate: &Part) -> Result<Option<Vec<usize>>, RejectReason> {
        let Some(add_collider) = candidate.constraints.as_ref().and_then(|c| c.add_collider.as_ref()) else {
            return Ok(None);
        };
        let others: Vec<&Collider> = self.aggregated_parts.iter().map(|p| &p.collider).collect();
        let check = add_collider.check_collisions(self.kernel(), &others);
        if check.collision {
            return Err(RejectReason::AdditionalCollider);
        }
        Ok(add_collider
            .multiple
            .then(|| add_collider.valid_connections(&check.valid_pieces)))
    }

    /// True when supports are defined and no group is fully satisfied by the
    /// given neighbours.
    pub fn missing_supports_check(&self, candidate: &Part, neighbours: &[usize]) -> bool {
        let Some(constraints) = &candidate.constraints else {
            return false;
        };
        if constraints.supports.is_empty() {
            return false;
        }
        let satisfied = constraints.supports.iter().any(|support| {
            support.directions.iter().all(|line| {
                neighbours
                    .iter()
                    .filter_map(|&i| self.aggregated_parts.get(i))
                    .any(|p| p.collider.intersects_line(self.kernel(), line))
            })
        });
        !satisfied
    }

    /// True when any adjacency or exclusion constraint is violated.
    pub fn adjacencies_check(&self, candidate: &Part, neighbours: &[usize]) -> bool {
        let Some(constraints) = &candidate.constraints else {
            return false;
        };
        if constraints.adjacency.is_empty() {
            return false;
        }
        let parts: Vec<&Part> = neighbours
            .iter()
            .filter_map(|&i| self.aggregated_parts.get(i))
            .collect();
        constraints
            .adjacency
            .iter()
            .any(|c| !c.check(self.kernel(), &parts))
    }

    /// True when any orientation constraint is violated.
    pub fn orientation_check(&self, candidate: &Part) -> bool {
        candidate
            .constraints
            .as_ref()
            .is_some_and(|c| c.orientation.iter().any(|o| !o.check()))
    }

    /// True when the global constraints reject the candidate.
    ///
    /// A failing required constraint rejects on its own. Failing optional
    /// constraints only reject once no constraint is left satisfied.
    pub fn global_constraints_check(&self, candidate: &Part) -> bool {
        let mut valid = self.global_constraints.len();
        for constraint in &self.global_constraints {
            let ok = constraint.check(
                self.kernel(),
                &candidate.center,
                &candidate.collider,
                self.config.tolerance,
            );
            if ok {
                continue;
            }
            if constraint.is_required() {
                return true;
            }
            valid -= 1;
            if valid == 0 {
                return true;
            }
        }
        false
    }
}
