//! Integration tests for fc-graph.

use fc_core::{ColumnRole, HeatRole, SignalRole};
use fc_graph::{Attrs, FlowsheetBuilder, GraphError, Structure};
use proptest::prelude::*;

#[test]
fn build_chain() {
    // raw-1 -> pump-1 -> product-1
    let mut builder = FlowsheetBuilder::new();
    builder
        .add_unit("raw-1")
        .add_unit("pump-1")
        .add_unit("product-1");
    builder.add_stream("raw-1", "pump-1", &[] as &[&str]);
    builder.add_stream("pump-1", "product-1", &[] as &[&str]);
    let graph = builder.build().unwrap();

    assert_eq!(graph.unit_count(), 3);
    assert_eq!(graph.stream_count(), 2);
    let pump = graph.find("pump-1").unwrap();
    assert_eq!(graph.in_streams(pump).len(), 1);
    assert_eq!(graph.out_streams(pump).len(), 1);
    assert_eq!(
        graph.edge_listing(),
        vec!["pump-1 -> product-1 []", "raw-1 -> pump-1 []"]
    );
}

#[test]
fn column_and_heat_tags_coexist() {
    let mut builder = FlowsheetBuilder::new();
    builder.add_unit("dist-1").add_unit("hex-1");
    builder.add_stream("dist-1", "hex-1", &["tout", "hot_in"]);
    let graph = builder.build().unwrap();

    let stream = graph.streams().next().unwrap();
    assert_eq!(stream.stream.tags.heat, Some(HeatRole::HotIn));
    assert_eq!(stream.stream.tags.column, Some(ColumnRole::TopOut));
    // Notation order is heat, column, signal regardless of input order.
    assert_eq!(stream.stream.tags.labels(), vec!["hot_in", "tout"]);
}

#[test]
fn duplicate_ids_fail_before_anything_is_built() {
    let mut builder = FlowsheetBuilder::new();
    builder.add_unit("mix-1").add_unit("mix-1");
    assert_eq!(
        builder.build().unwrap_err(),
        GraphError::DuplicateUnit { id: "mix-1".into() }
    );
}

#[test]
fn attributes_are_kept() {
    let mut attrs = Attrs::new();
    attrs.insert("duty".into(), "high".into());
    let mut builder = FlowsheetBuilder::new();
    builder.add_unit_with_attrs("hex-1", attrs.clone());
    let graph = builder.build().unwrap();
    let hex = graph.find("hex-1").unwrap();
    assert_eq!(graph.unit(hex).unwrap().attrs, attrs);
}

#[test]
fn control_loop_view() {
    let mut builder = FlowsheetBuilder::new();
    builder.add_unit("v-1").add_unit("C-1/FC");
    builder.add_stream("v-1", "C-1/FC", &["next_unitop"]);
    builder.add_stream("C-1/FC", "v-1", &["not_next_unitop"]);
    let graph = builder.build().unwrap();

    let signals: Vec<_> = graph
        .streams()
        .filter_map(|s| s.stream.tags.signal)
        .collect();
    assert!(signals.contains(&SignalRole::NextUnit));
    assert!(signals.contains(&SignalRole::NonAdjacent));
    assert_eq!(Structure::walkable(&graph).streams().len(), 1);
    assert_eq!(Structure::all(&graph).weak_components().len(), 1);
}

proptest! {
    #[test]
    fn listing_is_independent_of_insertion_order(n in 2usize..8, rotate in 0usize..8) {
        let ids: Vec<String> = (1..=n).map(|i| format!("u-{i}")).collect();
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();

        let mut forward = FlowsheetBuilder::new();
        for id in &ids {
            forward.add_unit(id.clone());
        }
        for &(a, b) in &edges {
            forward.add_stream(ids[a].clone(), ids[b].clone(), &[] as &[&str]);
        }

        let mut rotated_ids = ids.clone();
        rotated_ids.rotate_left(rotate % n);
        let mut reversed_edges = edges.clone();
        reversed_edges.reverse();
        let mut shuffled = FlowsheetBuilder::new();
        for id in &rotated_ids {
            shuffled.add_unit(id.clone());
        }
        for &(a, b) in &reversed_edges {
            shuffled.add_stream(ids[a].clone(), ids[b].clone(), &[] as &[&str]);
        }

        let g1 = forward.build().unwrap();
        let g2 = shuffled.build().unwrap();
        prop_assert_eq!(g1.edge_listing(), g2.edge_listing());
        prop_assert_eq!(g1.unit_listing(), g2.unit_listing());
    }
}
