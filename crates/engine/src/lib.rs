pub mod aggregation;
pub mod attribute;
pub mod catalog;
pub mod collider;
pub mod config;
pub mod connection;
pub mod constraints;
pub mod data;
pub mod error;
pub mod field;
pub mod graph;
pub mod part;
pub mod queue;
pub mod rule;
pub mod support;

pub use aggregation::{AggregateReport, Aggregation, RejectReason, Verdict};
pub use attribute::{Attribute, AttributeValue};
pub use catalog::{CatalogMode, PartCatalog};
pub use collider::{Collider, ColliderCheck};
pub use config::{AggregationConfig, AggregationMode, PrunePolicy, RuleGeneratorOptions};
pub use connection::Connection;
pub use constraints::{
    AdjacencyConstraint, AdjacencyMode, AdjacencyProbe, GlobalConstraint, MeshConstraint,
    OrientationConstraint, PlaneConstraint,
};
pub use data::{AggregationData, PartRecord};
pub use error::{AggregationError, RuleParseError};
pub use field::{Field, FieldSource};
pub use graph::{Edge, Graph, GraphOptions};
pub use part::{Joint, Part, PartConstraints};
pub use queue::{AggregationQueue, QueueEntry};
pub use rule::{generate_rules, parse_grammar_pair, Rule, SequenceStep};
pub use support::Support;
