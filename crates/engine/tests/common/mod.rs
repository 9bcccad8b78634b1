#![allow(dead_code)]

use assemblage_engine::*;
use assemblage_kernel::{Mesh, Plane, Point3d, Vec3};

/// Unit cube with a slightly smaller collider so face-to-face neighbours do
/// not register as collisions. Connection 0 faces +X, connection 1 faces -X,
/// both of type "A".
pub fn unit_part(name: &str) -> Part {
    let geometry = Mesh::centered_box(Point3d::ORIGIN, [1.0, 1.0, 1.0]);
    let collider = Collider::single(Mesh::centered_box(Point3d::ORIGIN, [0.9, 0.9, 0.9]));
    let connections = vec![
        Connection::new(Plane::new(Point3d::new(0.5, 0.0, 0.0), Vec3::Y, Vec3::Z), "A", name, 0),
        Connection::new(Plane::new(Point3d::new(-0.5, 0.0, 0.0), Vec3::Y, -Vec3::Z), "A", name, 1),
    ];
    Part::new(name, geometry, connections, collider)
}

/// Rules chaining `name` parts along X in both directions.
pub fn chain_rules(name: &str) -> Vec<Rule> {
    vec![Rule::new(name, 0, name, 1), Rule::new(name, 1, name, 0)]
}

pub fn chain_aggregation(seed: u64) -> Aggregation {
    Aggregation::new(
        "chain",
        vec![unit_part("P")],
        chain_rules("P"),
        AggregationConfig::seeded(seed),
    )
    .expect("valid chain aggregation")
}

/// Field on the X axis (`counts` samples, spacing 1, starting at x = 0).
pub fn line_field(counts: usize, f: impl Fn(f64) -> f64) -> Field {
    Field::from_fn("line", Point3d::ORIGIN, 1.0, [counts, 1, 1], |p| f(p.x))
}

/// Replays a straight chain: 0 at the origin, then +X, +X, then -X from 0.
pub fn chain_steps() -> Vec<String> {
    vec![
        "P|0_P|1>0_1".to_string(),
        "P|0_P|1>1_2".to_string(),
        "P|1_P|0>0_3".to_string(),
    ]
}

/// Dense ids and in-range tree links.
pub fn assert_dense(aggregation: &Aggregation) {
    let parts = aggregation.aggregated_parts();
    for (i, part) in parts.iter().enumerate() {
        assert_eq!(part.id, i, "id mismatch at index {i}");
        if let Some(parent) = part.parent {
            assert!(parent < parts.len());
            assert!(parts[parent].children.contains(&i));
        }
        assert!(part.children.iter().all(|&c| c < parts.len()));
    }
}

/// Active connections are those with active rules, minus consumed joints.
pub fn assert_active_sets(aggregation: &Aggregation) {
    let parts = aggregation.aggregated_parts();
    for (i, part) in parts.iter().enumerate() {
        let mut consumed: Vec<usize> = part.joint.map(|j| j.conn).into_iter().collect();
        consumed.extend(part.children.iter().filter_map(|&c| parts[c].joint.map(|j| j.parent_conn)));
        let mut expected: Vec<usize> = part
            .connections
            .iter()
            .filter(|c| c.has_active_rules() && !consumed.contains(&c.id))
            .map(|c| c.id)
            .collect();
        let mut actual = part.active_connections.clone();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected, "active set mismatch on part {i}");
    }
}
