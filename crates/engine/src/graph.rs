use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregation::Aggregation;
use crate::rule::Rule;

/// A directed connection between two placed parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: usize,
    pub end: usize,
    pub conn_start: usize,
    pub conn_end: usize,
}

/// How a graph is derived from an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Search every nearby pair for coincident connections instead of only
    /// recording the parent/child joints.
    pub full_graph: bool,
    pub tolerance: f64,
    /// Keep only edges some rule licenses.
    pub filter_by_rules: bool,
    /// Rules used for filtering instead of the aggregation's own.
    pub custom_rules: Option<Vec<Rule>>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            full_graph: false,
            tolerance: 0.001,
            filter_by_rules: false,
            custom_rules: None,
        }
    }
}

impl GraphOptions {
    /// Proximity search with the given connection tolerance.
    pub fn full(tolerance: f64) -> Self {
        Self {
            full_graph: true,
            tolerance,
            ..Self::default()
        }
    }

    /// Drop edges no rule licenses.
    pub fn with_rule_filter(mut self, custom_rules: Option<Vec<Rule>>) -> Self {
        self.filter_by_rules = true;
        self.custom_rules = custom_rules;
        self
    }
}

/// Adjacency-list record of realized part-to-part connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    adjacency: BTreeMap<usize, BTreeMap<usize, Edge>>,
}

impl Graph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` without edges.
    pub fn add_node(&mut self, id: usize) {
        self.adjacency.entry(id).or_default();
    }

    /// Add `edge` unless it is a self-loop or the pair is already linked in
    /// that direction. Returns whether it was added.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if edge.start == edge.end {
            return false;
        }
        self.add_node(edge.end);
        let out = self.adjacency.entry(edge.start).or_default();
        if out.contains_key(&edge.end) {
            return false;
        }
        out.insert(edge.end, edge);
        true
    }

    /// Node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.keys().copied()
    }

    /// All edges grouped by start node.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacency.values().flat_map(|out| out.values())
    }

    /// End nodes of edges leaving `id`.
    pub fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|out| out.keys().copied())
    }

    /// Edge from `start` to `end`, if any.
    pub fn edge(&self, start: usize, end: usize) -> Option<&Edge> {
        self.adjacency.get(&start)?.get(&end)
    }

    /// Whether `start` links to `end`.
    pub fn contains_edge(&self, start: usize, end: usize) -> bool {
        self.edge(start, end).is_some()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum()
    }

    /// Build the graph of an aggregation's placed parts.
    pub fn from_aggregation(aggregation: &Aggregation, options: &GraphOptions) -> Self {
        let parts = aggregation.aggregated_parts();
        let rules = options.custom_rules.as_deref().unwrap_or(aggregation.rules());
        let licensed = |a: usize, ca: usize, b: usize, cb: usize| {
            !options.filter_by_rules
                || rules
                    .iter()
                    .any(|r| r.licenses(&parts[a].name, ca, &parts[b].name, cb))
        };

        let mut graph = Graph::new();
        for part in parts {
            graph.add_node(part.id);
        }

        if !options.full_graph {
            for (id, part) in parts.iter().enumerate() {
                let (Some(parent), Some(joint)) = (part.parent, part.joint) else {
                    continue;
                };
                if parent < parts.len() && licensed(parent, joint.parent_conn, id, joint.conn) {
                    graph.add_edge(Edge {
                        start: parent,
                        end: id,
                        conn_start: joint.parent_conn,
                        conn_end: joint.conn,
                    });
                }
            }
            return graph;
        }

        for (i, a) in parts.iter().enumerate() {
            for (j, b) in parts.iter().enumerate() {
                if i == j || a.center.distance_to(&b.center) > a.dim + b.dim + options.tolerance {
                    continue;
                }
                for ca in &a.connections {
                    for cb in &b.connections {
                        if ca.plane.origin.distance_to(&cb.plane.origin) <= options.tolerance
                            && licensed(i, ca.id, j, cb.id)
                        {
                            graph.add_edge(Edge {
                                start: i,
                                end: j,
                                conn_start: ca.id,
                                conn_end: cb.id,
                            });
                        }
                    }
                }
            }
        }
        graph
    }
}
