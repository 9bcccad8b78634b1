//! Plain records describing an aggregation's placed parts.
//!
//! Geometry is not stored: loading re-instantiates palette templates at the
//! recorded transforms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use assemblage_kernel::{Transform, Transformable};

use crate::aggregation::Aggregation;
use crate::collider::Collider;
use crate::config::{AggregationConfig, AggregationMode};
use crate::error::AggregationError;
use crate::part::{Joint, Part};
use crate::rule::Rule;

/// Serializable state of one placed part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub name: String,
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub active_connections: Vec<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    #[serde(default)]
    pub joint: Option<Joint>,
    /// Cumulative placement, written as sixteen fields `M00..M33`.
    pub transform: Transform,
    pub is_constrained: bool,
    pub collider: Collider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_connections: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_catalog: bool,
}

impl From<&Part> for PartRecord {
    fn from(part: &Part) -> Self {
        Self {
            name: part.name.clone(),
            id: part.id,
            label: part.label.clone(),
            active_connections: part.active_connections.clone(),
            parent: part.parent,
            children: part.children.clone(),
            joint: part.joint,
            transform: part.transformation,
            is_constrained: part.is_constrained(),
            collider: part.collider.clone(),
            valid_connections: part.valid_connections.clone(),
            from_catalog: part.from_catalog,
        }
    }
}

/// Serializable state of a whole aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationData {
    pub name: String,
    #[serde(default)]
    pub mode: AggregationMode,
    #[serde(default)]
    pub prev_num: usize,
    pub rules: Vec<Rule>,
    /// Keyed by id; ids must be `0..n`.
    pub parts: BTreeMap<usize, PartRecord>,
}

impl Aggregation {
    /// Snapshot the placed parts as records.
    pub fn to_data(&self) -> AggregationData {
        AggregationData {
            name: self.name.clone(),
            mode: self.mode(),
            prev_num: self.prev_num(),
            rules: self.rules().to_vec(),
            parts: self
                .aggregated_parts()
                .iter()
                .map(|p| (p.id, PartRecord::from(p)))
                .collect(),
        }
    }

    /// Rebuild an aggregation from records and the palette they were made
    /// with. `rules` replaces the recorded rules when given.
    pub fn from_data(
        data: &AggregationData,
        palette: Vec<Part>,
        rules: Option<Vec<Rule>>,
        config: AggregationConfig,
    ) -> Result<Self, AggregationError> {
        let rules = rules.unwrap_or_else(|| data.rules.clone());
        let config = AggregationConfig {
            mode: data.mode,
            ..config
        };
        let mut aggregation = Aggregation::new(data.name.clone(), palette, rules, config)?;

        let mut placed = Vec::with_capacity(data.parts.len());
        for (expected, (&key, record)) in data.parts.iter().enumerate() {
            if key != expected || record.id != expected {
                return Err(AggregationError::NonDenseIds {
                    expected,
                    found: if key != expected { key } else { record.id },
                });
            }
            let template = aggregation.parts().get(&record.name).ok_or_else(|| AggregationError::UnknownPart {
                name: record.name.clone(),
            })?;
            let connection_count = template.connections.len();
            let bad_index = record
                .active_connections
                .iter()
                .chain(record.joint.iter().map(|j| &j.conn))
                .find(|&&c| c >= connection_count);
            if let Some(&index) = bad_index {
                return Err(AggregationError::ConnectionOutOfRange {
                    part: record.name.clone(),
                    index,
                    count: connection_count,
                });
            }

            // Templates sit at the identity, so the recorded transform is
            // the whole placement.
            let mut part = template.transform(&record.transform);
            part.transformation = record.transform;
            part.id = record.id;
            part.label = record.label.clone();
            part.active_connections = record.active_connections.clone();
            part.parent = record.parent;
            part.children = record.children.clone();
            part.joint = record.joint;
            part.valid_connections = record.valid_connections.clone();
            part.from_catalog = record.from_catalog;
            placed.push(part);
        }

        let count = placed.len();
        for part in &placed {
            let dangling = part
                .parent
                .into_iter()
                .chain(part.children.iter().copied())
                .find(|&i| i >= count);
            if let Some(found) = dangling {
                return Err(AggregationError::NonDenseIds {
                    expected: count,
                    found,
                });
            }
        }

        aggregation.restore_records(placed, data.prev_num.min(count));
        Ok(aggregation)
    }
}
