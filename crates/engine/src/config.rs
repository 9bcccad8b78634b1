//! Configuration for aggregation runs.

use serde::{Deserialize, Serialize};

use crate::aggregation::RejectReason;

/// Which constraint families the pipeline evaluates after the collision check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Mode 0: collisions only.
    #[default]
    Unconstrained,
    /// Mode 1: additional collider, supports, adjacency and orientation.
    Local,
    /// Mode 2: global plane/mesh constraints.
    Global,
    /// Mode 3: global first, then the local chain.
    Full,
}

impl AggregationMode {
    /// Mode for a numeric index `0..=3`.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Unconstrained),
            1 => Some(Self::Local),
            2 => Some(Self::Global),
            3 => Some(Self::Full),
            _ => None,
        }
    }

    /// Numeric index of the mode.
    pub fn index(self) -> u8 {
        match self {
            Self::Unconstrained => 0,
            Self::Local => 1,
            Self::Global => 2,
            Self::Full => 3,
        }
    }

    /// Whether part constraints run in this mode.
    pub fn checks_local(self) -> bool {
        matches!(self, Self::Local | Self::Full)
    }

    /// Whether global constraints run in this mode.
    pub fn checks_global(self) -> bool {
        matches!(self, Self::Global | Self::Full)
    }
}

/// What a rejected stochastic probe does to the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrunePolicy {
    /// Every rejection deactivates the rule at that connection.
    #[default]
    Always,
    /// Rejections caused by missing supports or adjacency leave the rule
    /// active, since a later placement may satisfy them.
    KeepOnTransient,
}

impl PrunePolicy {
    /// Whether a rule rejected for `reason` is deactivated.
    pub fn prunes(self, reason: RejectReason) -> bool {
        match self {
            Self::Always => true,
            Self::KeepOnTransient => !reason.is_transient(),
        }
    }
}

/// Parameters shared by every growth algorithm of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Centers closer than this are coincident placements (always rejected).
    pub tolerance: f64,
    /// Run exact collider tests on the broad-phase candidates.
    pub coll_check: bool,
    pub mode: AggregationMode,
    /// Seed for the random generator. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Random probes per stochastic placement without a catalog.
    pub probe_attempts: usize,
    /// Random probes per stochastic placement when drawing from a catalog.
    pub catalog_probe_attempts: usize,
    /// Outer iterations allowed per requested part before giving up.
    pub loop_factor: usize,
    pub prune_policy: PrunePolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            coll_check: true,
            mode: AggregationMode::Unconstrained,
            seed: None,
            probe_attempts: 1000,
            catalog_probe_attempts: 10000,
            loop_factor: 100,
            prune_policy: PrunePolicy::Always,
        }
    }
}

impl AggregationConfig {
    /// Reproducible runs: a fixed seed and otherwise default settings.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Minimum center distance between placed parts.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Toggle the exact collider test.
    pub fn with_coll_check(mut self, coll_check: bool) -> Self {
        self.coll_check = coll_check;
        self
    }

    /// Constraint mode.
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed the random generator for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Probe budgets per placement without and with a catalog.
    pub fn with_probe_attempts(mut self, plain: usize, catalog: usize) -> Self {
        self.probe_attempts = plain;
        self.catalog_probe_attempts = catalog;
        self
    }

    /// Iterations allowed per requested part.
    pub fn with_loop_factor(mut self, loop_factor: usize) -> Self {
        self.loop_factor = loop_factor;
        self
    }

    /// When rejected rules are deactivated.
    pub fn with_prune_policy(mut self, prune_policy: PrunePolicy) -> Self {
        self.prune_policy = prune_policy;
        self
    }
}

/// Options for [`crate::rule::generate_rules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGeneratorOptions {
    /// Allow a part type to connect to itself.
    pub self_part: bool,
    /// Directed type pairs allowed to join. Empty means equal types join.
    pub grammar: Vec<(String, String)>,
}

impl Default for RuleGeneratorOptions {
    fn default() -> Self {
        Self {
            self_part: true,
            grammar: Vec::new(),
        }
    }
}

impl RuleGeneratorOptions {
    /// Allow rules joining a part type to itself.
    pub fn with_self_part(mut self, self_part: bool) -> Self {
        self.self_part = self_part;
        self
    }

    /// Directed connection-type pairs replacing equal-type matching.
    pub fn with_grammar(mut self, grammar: Vec<(String, String)>) -> Self {
        self.grammar = grammar;
        self
    }
}
