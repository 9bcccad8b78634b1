mod common;

use approx::assert_relative_eq;
use assemblage_engine::*;
use assemblage_kernel::{GeometryKernel, MeshKernel, Plane, Point3d, Transform, Transformable, Vec3};

use common::*;

// ── Stochastic growth ──────────────────────────────────────────────────────

#[test]
fn test_minimal_stochastic_run() {
    let mut agg = chain_aggregation(7);
    let report = agg.aggregate_rnd(3, false).unwrap();
    assert_eq!(report.placed, 3);
    assert!(report.message().is_none());
    assert_eq!(agg.len(), 3);
    assert_dense(&agg);
    assert_active_sets(&agg);

    // every non-root part consumed exactly one connection on each side
    for part in &agg.aggregated_parts()[1..] {
        let joint = part.joint.expect("child has a joint");
        let parent = &agg.aggregated_parts()[part.parent.unwrap()];
        assert!(!part.active_connections.contains(&joint.conn));
        assert!(!parent.active_connections.contains(&joint.parent_conn));
        assert_relative_eq!(part.center.distance_to(&parent.center), 1.0, epsilon = 1e-9);
    }

    let kernel = MeshKernel::default();
    let parts = agg.aggregated_parts();
    for (i, a) in parts.iter().enumerate() {
        for b in &parts[i + 1..] {
            for ga in &a.collider.geometry {
                for gb in &b.collider.geometry {
                    assert!(!kernel.mesh_mesh_intersect(ga, gb));
                }
            }
        }
    }
}

#[test]
fn test_stochastic_growth_resumes() {
    let mut agg = chain_aggregation(11);
    agg.aggregate_rnd(2, false).unwrap();
    let report = agg.aggregate_rnd(4, false).unwrap();
    assert!(report.is_complete());
    assert_eq!(agg.len(), 6);
    assert_dense(&agg);
    assert_active_sets(&agg);
}

#[test]
fn test_same_seed_same_result() {
    let mut a = chain_aggregation(3);
    let mut b = chain_aggregation(3);
    a.aggregate_rnd(8, false).unwrap();
    b.aggregate_rnd(8, false).unwrap();
    let centers = |agg: &Aggregation| -> Vec<Point3d> { agg.aggregated_parts().iter().map(|p| p.center).collect() };
    assert_eq!(centers(&a), centers(&b));
}

#[test]
fn test_catalog_exhaustion() {
    let catalog = PartCatalog::new([("P".to_string(), 2.0)], CatalogMode::Limited);
    let mut agg = chain_aggregation(5).with_catalog(catalog);
    let report = agg.aggregate_rnd(5, true).unwrap();
    assert_eq!(report.placed, 2);
    assert_eq!(report.shortfall(), 3);
    assert_eq!(report.message().as_deref(), Some("could not place 3 parts"));
    assert!(agg.catalog().unwrap().is_empty());
    assert_eq!(agg.len(), 2);
}

#[test]
fn test_catalog_restricts_part_types() {
    let q = unit_part("Q");
    let rules = vec![
        Rule::new("P", 0, "P", 1),
        Rule::new("P", 0, "Q", 1),
        Rule::new("Q", 0, "P", 1),
        Rule::new("Q", 0, "Q", 1),
    ];
    let catalog = PartCatalog::new([("P".to_string(), 0.0), ("Q".to_string(), 4.0)], CatalogMode::Limited);
    let mut agg = Aggregation::new("typed", vec![unit_part("P"), q], rules, AggregationConfig::seeded(9))
        .unwrap()
        .with_catalog(catalog);
    let report = agg.aggregate_rnd(4, true).unwrap();
    assert_eq!(report.placed, 4);
    assert!(agg.aggregated_parts().iter().all(|p| p.name == "Q"));
    assert!(agg.catalog().unwrap().is_empty());
}

#[test]
fn test_no_rules_means_single_part() {
    let mut agg = Aggregation::new("lonely", vec![unit_part("P")], Vec::new(), AggregationConfig::seeded(1)).unwrap();
    let report = agg.aggregate_rnd(3, false).unwrap();
    assert_eq!(report.placed, 1);
    assert_eq!(report.shortfall(), 2);
}

// ── Field growth ───────────────────────────────────────────────────────────

#[test]
fn test_field_seed_lands_on_maximum() {
    let field = Field::from_fn("peak", Point3d::new(-5.0, -5.0, -5.0), 1.0, [11, 11, 11], |p| {
        -p.distance_to(&Point3d::new(2.0, 1.0, 3.0))
    });
    let mut agg = chain_aggregation(1).with_field(FieldSource::Single(field));
    let report = agg.aggregate_field(1).unwrap();
    assert!(report.is_complete());
    let center = agg.aggregated_parts()[0].center;
    assert!(center.distance_to(&Point3d::new(2.0, 1.0, 3.0)) < 1e-9);
}

#[test]
fn test_field_growth_prefers_high_values() {
    let field = line_field(21, |x| -(x - 10.0).abs());
    let mut agg = chain_aggregation(2).with_field(FieldSource::Single(field));
    let report = agg.aggregate_field(5).unwrap();
    assert!(report.is_complete());
    let mut xs: Vec<f64> = agg.aggregated_parts().iter().map(|p| p.center.x.round()).collect();
    xs.sort_by(f64::total_cmp);
    assert_eq!(xs, vec![8.0, 9.0, 10.0, 11.0, 12.0]);
    assert_dense(&agg);
    assert_active_sets(&agg);
}

#[test]
fn test_field_queue_exhaustion() {
    let mut agg = chain_aggregation(2).with_field(FieldSource::Single(line_field(5, |x| x)));
    let report = agg.aggregate_field(10).unwrap();
    assert_eq!(report.placed, 5);
    assert_eq!(report.message().as_deref(), Some("could not place 5 parts"));
    assert!(agg.queue().is_empty());
}

#[test]
fn test_field_growth_resumes_after_random_growth() {
    let mut agg = chain_aggregation(4).with_field(FieldSource::Single(line_field(20, |x| x)));
    assert!(agg.aggregate_field(2).unwrap().is_complete());
    assert!(agg.aggregate_rnd(3, false).unwrap().is_complete());
    let leftmost = agg
        .aggregated_parts()
        .iter()
        .map(|p| p.center.x)
        .fold(f64::INFINITY, f64::min);

    // only the leftmost free end still points into the field
    let report = agg.aggregate_field(1).unwrap();
    assert!(report.is_complete());
    assert_eq!(agg.len(), 6);
    assert_relative_eq!(agg.aggregated_parts()[5].center.x, leftmost - 1.0, epsilon = 1e-9);
    assert_dense(&agg);
    assert_active_sets(&agg);
}

#[test]
fn test_field_required() {
    let mut agg = chain_aggregation(2);
    assert_eq!(agg.aggregate_field(1).unwrap_err(), AggregationError::MissingField);
}

#[test]
fn test_field_seed_respects_global_constraints() {
    let field = line_field(21, |x| x);
    let keep_left = GlobalConstraint::plane(Plane::from_normal(Point3d::new(6.5, 0.0, 0.0), Vec3::X), false, true, true);
    let config = AggregationConfig::seeded(4).with_mode(AggregationMode::Global);
    let mut agg = Aggregation::new("bounded", vec![unit_part("P")], chain_rules("P"), config)
        .unwrap()
        .with_field(FieldSource::Single(field))
        .with_global_constraints(vec![keep_left]);
    agg.aggregate_field(3).unwrap();
    let xs: Vec<f64> = agg.aggregated_parts().iter().map(|p| p.center.x.round()).collect();
    assert_eq!(xs, vec![6.0, 5.0, 4.0]);
}

#[test]
fn test_multiple_fields_follow_part_tags() {
    let left = Field::from_fn("left", Point3d::ORIGIN, 1.0, [11, 1, 1], |p| -p.x);
    let part = unit_part("P").with_field("left");
    let mut agg = Aggregation::new("tagged", vec![part], chain_rules("P"), AggregationConfig::seeded(3))
        .unwrap()
        .with_field(FieldSource::multiple([left]));
    agg.aggregate_field(2).unwrap();
    assert_relative_eq!(agg.aggregated_parts()[0].center.x, 0.0, epsilon = 1e-9);

    let untagged = unit_part("P");
    let other = Field::from_fn("other", Point3d::ORIGIN, 1.0, [3, 1, 1], |p| p.x);
    let mut agg = Aggregation::new("untagged", vec![untagged], chain_rules("P"), AggregationConfig::seeded(3))
        .unwrap()
        .with_field(FieldSource::multiple([other]));
    assert!(matches!(agg.aggregate_field(1), Err(AggregationError::UnknownField { .. })));
}

#[test]
fn test_previous_parts_seed_field_growth() {
    let previous = unit_part("P").transform(&Transform::translation(3.0, 0.0, 0.0));
    let mut agg = chain_aggregation(8)
        .with_field(FieldSource::Single(line_field(11, |x| -x)))
        .with_previous_parts(vec![previous]);
    assert_eq!(agg.prev_num(), 1);
    let report = agg.aggregate_field(2).unwrap();
    assert!(report.is_complete());
    let xs: Vec<f64> = agg.aggregated_parts().iter().map(|p| p.center.x.round()).collect();
    assert_eq!(xs, vec![3.0, 2.0, 1.0]);

    agg.remove_elements(0).unwrap();
    assert_eq!(agg.len(), 1);
}

// ── Sequence replay ────────────────────────────────────────────────────────

fn snapshot(agg: &Aggregation) -> Vec<(String, usize, Option<String>, Option<usize>, [[f64; 4]; 4])> {
    agg.aggregated_parts()
        .iter()
        .map(|p| (p.name.clone(), p.id, p.label.clone(), p.parent, p.transformation.to_rows()))
        .collect()
}

#[test]
fn test_sequence_replay_is_deterministic() {
    let mut a = chain_aggregation(1);
    let mut b = chain_aggregation(99);
    let ra = a.aggregate_sequence(&chain_steps()).unwrap();
    b.aggregate_sequence(&chain_steps()).unwrap();
    assert!(ra.is_complete());
    assert_eq!(snapshot(&a), snapshot(&b));

    let xs: Vec<f64> = a.aggregated_parts().iter().map(|p| p.center.x.round()).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, -1.0]);
    let labels: Vec<String> = a.aggregated_parts().iter().map(Part::display_id).collect();
    assert_eq!(labels, vec!["0", "1", "2", "3"]);
    assert_dense(&a);
    assert_active_sets(&a);
}

#[test]
fn test_sequence_skips_bad_steps() {
    let mut agg = chain_aggregation(1);
    let steps = ["P|0_P|1>0_1", "P|0_P|1>9_2", "not a step"];
    let report = agg.aggregate_sequence(&steps).unwrap();
    assert_eq!(report.requested, 3);
    assert_eq!(report.placed, 1);
    assert_eq!(agg.len(), 2);
}

#[test]
fn test_sequence_skips_out_of_range_connections() {
    let mut agg = chain_aggregation(1);
    let steps = ["P|0_P|1>0_1", "P|7_P|1>1_2", "P|0_P|1>1_3"];
    let report = agg.aggregate_sequence(&steps).unwrap();
    assert_eq!(report.placed, 2);
    assert_eq!(agg.len(), 3);
    let last = &agg.aggregated_parts()[2];
    assert_eq!(last.label.as_deref(), Some("3"));
    assert_eq!(last.parent, Some(1));
    assert_relative_eq!(last.center.x, 2.0, epsilon = 1e-9);

    let mut empty = chain_aggregation(1);
    let report = empty.aggregate_sequence(&["P|0_P|5>0_1"]).unwrap();
    assert_eq!(report.placed, 0);
    assert!(empty.is_empty());
}

#[test]
fn test_sequence_unknown_part_is_an_error() {
    let mut agg = chain_aggregation(1);
    let err = agg.aggregate_sequence(&["X|0_P|1>0_1"]).unwrap_err();
    assert!(matches!(err, AggregationError::UnknownPart { .. }));

    // nothing is placed for a step naming an unknown child either
    let err = agg.aggregate_sequence(&["P|0_Missing|1>0_1"]).unwrap_err();
    assert!(matches!(err, AggregationError::UnknownPart { .. }));
    assert!(agg.is_empty());
}

#[test]
fn test_sequence_export_replays_random_run() {
    let mut original = chain_aggregation(21);
    original.aggregate_rnd(6, false).unwrap();
    let steps = original.sequence_rules();
    assert_eq!(steps.len(), 5);

    let mut replay = chain_aggregation(0);
    let report = replay.aggregate_sequence(&steps).unwrap();
    assert!(report.is_complete());
    assert_eq!(replay.len(), original.len());
    for (a, b) in original.aggregated_parts().iter().zip(replay.aggregated_parts()) {
        assert!(a.transformation.approx_eq(&b.transformation, 1e-9));
        assert_eq!(a.parent, b.parent);
    }
}

// ── Editing ────────────────────────────────────────────────────────────────

#[test]
fn test_remove_elements_frees_connections() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_sequence(&chain_steps()).unwrap();
    agg.remove_elements(2).unwrap();
    assert_eq!(agg.len(), 2);
    assert_dense(&agg);
    assert_active_sets(&agg);
    assert_eq!(agg.aggregated_parts()[0].children, vec![1]);
    assert_eq!(agg.aggregated_parts()[0].active_connections, vec![1]);
    assert_eq!(agg.aggregated_parts()[1].active_connections, vec![0]);

    let report = agg.aggregate_rnd(2, false).unwrap();
    assert!(report.is_complete());
    assert_eq!(agg.len(), 4);
}

#[test]
fn test_remove_elements_refunds_only_catalog_parts() {
    let catalog = PartCatalog::new([("P".to_string(), 2.0)], CatalogMode::Limited);
    let mut agg = chain_aggregation(5).with_catalog(catalog);
    assert!(agg.aggregate_rnd(4, false).unwrap().is_complete());
    assert!(agg.aggregated_parts().iter().all(|p| !p.from_catalog));
    agg.remove_elements(1).unwrap();
    assert_relative_eq!(agg.catalog().unwrap().parts_total(), 2.0);

    assert!(agg.aggregate_rnd(2, true).unwrap().is_complete());
    assert!(agg.catalog().unwrap().is_empty());
    let paid: Vec<bool> = agg.aggregated_parts().iter().map(|p| p.from_catalog).collect();
    assert_eq!(paid, vec![false, true, true]);

    agg.remove_elements(2).unwrap();
    assert_relative_eq!(agg.catalog().unwrap().parts_total(), 1.0);
    assert_relative_eq!(agg.catalog().unwrap().amount("P").unwrap(), 1.0);
}

#[test]
fn test_reset_rules_keeps_joints_consumed() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_sequence(&chain_steps()).unwrap();
    agg.reset_rules(vec![Rule::new("P", 0, "P", 1)]).unwrap();
    assert_eq!(agg.parts()["P"].active_connections, vec![0]);
    // part 2 is the +X end: its connection 0 is free and still has a rule
    assert_eq!(agg.aggregated_parts()[2].active_connections, vec![0]);
    // part 3 is the -X end: its free connection 1 has no rule any more
    assert!(agg.aggregated_parts()[3].active_connections.is_empty());
    assert_active_sets(&agg);
}

#[test]
fn test_reset_rules_validates() {
    let mut agg = chain_aggregation(1);
    let err = agg.reset_rules(vec![Rule::new("P", 5, "P", 0)]).unwrap_err();
    assert!(matches!(err, AggregationError::ConnectionOutOfRange { index: 5, .. }));
    let err = agg.reset_rules(vec![Rule::new("P", 0, "Z", 0)]).unwrap_err();
    assert!(matches!(err, AggregationError::UnknownPart { .. }));
}

#[test]
fn test_set_mode_rederives_rules() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_rnd(2, false).unwrap();
    agg.set_mode(AggregationMode::Full).unwrap();
    assert_eq!(agg.mode(), AggregationMode::Full);
    assert_active_sets(&agg);
}

// ── Rules ──────────────────────────────────────────────────────────────────

#[test]
fn test_generate_rules_by_type() {
    let parts = vec![unit_part("P"), unit_part("Q")];
    let all = generate_rules(&parts, &RuleGeneratorOptions::default());
    // two parts x two connections, every pair of type "A" joins
    assert_eq!(all.len(), 16);
    let no_self = generate_rules(&parts, &RuleGeneratorOptions::default().with_self_part(false));
    assert_eq!(no_self.len(), 8);
    assert!(no_self.iter().all(|r| r.part1 != r.part2));
    let grammar = generate_rules(
        &parts,
        &RuleGeneratorOptions::default().with_grammar(vec![("A".to_string(), "B".to_string())]),
    );
    assert!(grammar.is_empty());
}

#[test]
fn test_rule_tables_match_filter() {
    let agg = chain_aggregation(1);
    let template = &agg.parts()["P"];
    for conn in &template.connections {
        let expected: Vec<Rule> = agg
            .rules()
            .iter()
            .filter(|r| r.part1 == "P" && r.conn1 == conn.id)
            .cloned()
            .collect();
        assert_eq!(conn.rules_table, expected);
        assert_eq!(conn.active_rules, (0..expected.len()).collect::<Vec<_>>());
    }
}

// ── Graph ──────────────────────────────────────────────────────────────────

#[test]
fn test_tree_graph() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_sequence(&chain_steps()).unwrap();
    let graph = Graph::from_aggregation(&agg, &GraphOptions::default());
    assert_eq!(graph.edge_count(), 3);
    assert!(graph.contains_edge(0, 1));
    assert!(graph.contains_edge(1, 2));
    assert!(graph.contains_edge(0, 3));
    let edge = graph.edge(0, 3).unwrap();
    assert_eq!((edge.conn_start, edge.conn_end), (1, 0));
}

#[test]
fn test_full_graph_and_rule_filter() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_sequence(&chain_steps()[..2]).unwrap();
    let full = Graph::from_aggregation(&agg, &GraphOptions::full(0.01));
    assert_eq!(full.edge_count(), 4);
    assert!(full.contains_edge(1, 0) && full.contains_edge(2, 1));

    let filtered = Graph::from_aggregation(
        &agg,
        &GraphOptions::full(0.01).with_rule_filter(Some(vec![Rule::new("P", 0, "P", 1)])),
    );
    assert_eq!(filtered.edge_count(), 2);
    assert!(filtered.contains_edge(0, 1) && filtered.contains_edge(1, 2));
}

// ── Data records ───────────────────────────────────────────────────────────

#[test]
fn test_data_round_trip() {
    let mut agg = chain_aggregation(13);
    agg.aggregate_rnd(5, false).unwrap();
    let data = agg.to_data();
    let json = serde_json::to_string(&data).unwrap();
    let back: AggregationData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, data);

    let restored = Aggregation::from_data(&back, vec![unit_part("P")], None, AggregationConfig::seeded(1)).unwrap();
    assert_eq!(restored.len(), 5);
    for (a, b) in agg.aggregated_parts().iter().zip(restored.aggregated_parts()) {
        assert!(a.transformation.approx_eq(&b.transformation, 1e-12));
        assert!(a.center.distance_to(&b.center) < 1e-9);
        assert_eq!(a.active_connections, b.active_connections);
        assert_eq!(a.children, b.children);
    }
}

#[test]
fn test_from_data_rejects_gaps() {
    let mut agg = chain_aggregation(13);
    agg.aggregate_rnd(3, false).unwrap();
    let mut data = agg.to_data();
    let record = data.parts.remove(&1).unwrap();
    data.parts.insert(7, record);
    let err = Aggregation::from_data(&data, vec![unit_part("P")], None, AggregationConfig::default()).unwrap_err();
    assert!(matches!(err, AggregationError::NonDenseIds { expected: 1, .. }));
}

#[test]
fn test_from_data_unknown_part() {
    let mut agg = chain_aggregation(13);
    agg.aggregate_rnd(2, false).unwrap();
    let data = agg.to_data();
    let err = Aggregation::from_data(&data, vec![unit_part("Q")], Some(chain_rules("Q")), AggregationConfig::default())
        .unwrap_err();
    assert!(matches!(err, AggregationError::UnknownPart { .. }));
}

#[test]
fn test_mirrored_record_is_restored() {
    let mut agg = chain_aggregation(1);
    agg.aggregate_rnd(1, false).unwrap();
    let mut data = agg.to_data();
    data.parts.get_mut(&0).unwrap().transform = Transform::scaling(-1.0, 1.0, 1.0);
    let restored = Aggregation::from_data(&data, vec![unit_part("P")], None, AggregationConfig::default()).unwrap();
    let part = &restored.aggregated_parts()[0];
    assert!(part.transformation.is_mirrored());
    assert_relative_eq!(part.connections[0].plane.origin.x, -0.5, epsilon = 1e-12);
}
