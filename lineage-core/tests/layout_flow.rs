//! Layout invariants checked end to end through the full pipeline:
//! spacing within a generation, hub and child anchoring, canvas floors,
//! deterministic output, and advisory ordering hints.

use lineage_core::record::RecordStore;
use lineage_core::testing::{person_record, small_family, union_record};
use lineage_core::{
    build_graph, layout_graph, GraphEdge, GraphPerson, LayoutOptions, LayoutPayload, NoHint,
    OrderHint,
};
use std::collections::HashMap;

const EPS: f64 = 1e-6;

fn layout_of(records: &[lineage_core::SourceRecord]) -> LayoutPayload {
    let (store, _) = RecordStore::from_records(records);
    let graph = build_graph(&store, None);
    layout_graph(&graph, &NoHint, &LayoutOptions::default())
}

fn node_x(layout: &LayoutPayload, id: &str) -> f64 {
    layout
        .nodes
        .iter()
        .find(|n| n.id == id)
        .map(|n| n.x)
        .unwrap_or_else(|| panic!("node {id} not placed"))
}

#[test]
fn same_generation_centers_stay_at_least_one_step_apart() {
    let records = vec![
        person_record("a.md", "Alice A", "1940").with_scalar("id", "a"),
        person_record("b.md", "Bob B", "1941").with_scalar("id", "b"),
        person_record("c.md", "Carol C", "1942").with_scalar("id", "c"),
        person_record("d.md", "Dan D", "1943").with_scalar("id", "d"),
        union_record("m1", &["../a.md", "../b.md"], "1960"),
        person_record("m1/e.md", "Erin E", "1962").with_scalar("id", "e"),
        person_record("m1/f.md", "Finn F", "1964").with_scalar("id", "f"),
        union_record("m2", &["../c.md", "../d.md"], "1961"),
        person_record("m2/g.md", "Gail G", "1963").with_scalar("id", "g"),
    ];
    let layout = layout_of(&records);
    let opts = LayoutOptions::default();

    let max_gen = layout.nodes.iter().map(|n| n.generation).max().unwrap();
    for gen in 0..=max_gen {
        let mut xs: Vec<f64> = layout
            .nodes
            .iter()
            .filter(|n| n.generation == gen)
            .map(|n| n.x)
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!(
                pair[1] - pair[0] >= opts.h_step - EPS,
                "generation {gen}: centers {} and {} too close",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn adjacent_blocks_keep_the_minimum_gap() {
    // Two couples per band: generation 0 holds the pairs (a,b) and (c,d),
    // generation 1 their children e and g, each paired with a spouse who
    // married in. The span of one pair must end at least min_gap before the
    // next pair starts, in both bands.
    let records = vec![
        person_record("a.md", "Alice A", "1940").with_scalar("id", "a"),
        person_record("b.md", "Bob B", "1941").with_scalar("id", "b"),
        person_record("c.md", "Carol C", "1942").with_scalar("id", "c"),
        person_record("d.md", "Dan D", "1943").with_scalar("id", "d"),
        union_record("m1", &["../a.md", "../b.md"], "1960"),
        person_record("m1/e.md", "Erin E", "1962").with_scalar("id", "e"),
        union_record("m2", &["../c.md", "../d.md"], "1961"),
        person_record("m2/g.md", "Gail G", "1963").with_scalar("id", "g"),
        person_record("s1.md", "Sean S", "1962").with_scalar("id", "s1"),
        union_record("m1/me", &["../e.md", "../../s1.md"], "1985"),
        person_record("s2.md", "Toni T", "1964").with_scalar("id", "s2"),
        union_record("m2/mg", &["../g.md", "../../s2.md"], "1986"),
    ];
    let layout = layout_of(&records);
    let opts = LayoutOptions::default();

    // Generation 0: pair (a,b) then pair (c,d).
    assert!(node_x(&layout, "c") - node_x(&layout, "b") >= opts.min_gap - EPS);
    // Generation 1: pair (e,s1) then pair (g,s2).
    assert!(node_x(&layout, "s1") - node_x(&layout, "e") >= opts.h_step - EPS);
    assert!(node_x(&layout, "g") - node_x(&layout, "s1") >= opts.min_gap - EPS);
}

#[test]
fn hub_splits_childless_left_and_coparents_right() {
    // p1 has two same-generation partners: p2 (no children together) and
    // p3 (one child). p2 must land left of p1, p3 right, and the child
    // directly under the p1/p3 union point.
    let records = vec![
        person_record("p1.md", "Hub", "1948").with_scalar("id", "p1"),
        person_record("p2.md", "Partner Two", "1950").with_scalar("id", "p2"),
        person_record("p3.md", "Partner Three", "1952").with_scalar("id", "p3"),
        union_record("ma", &["../p1.md", "../p2.md"], "1970"),
        union_record("mb", &["../p1.md", "../p3.md"], "1980"),
        person_record("mb/c1.md", "Child", "1982").with_scalar("id", "c1"),
    ];
    let layout = layout_of(&records);

    let p1 = node_x(&layout, "p1");
    let p2 = node_x(&layout, "p2");
    let p3 = node_x(&layout, "p3");
    assert!(p2 < p1, "childless partner should sit left of the hub");
    assert!(p1 < p3, "co-parent should sit right of the hub");

    let mb = layout
        .unions
        .iter()
        .find(|u| u.id == "mb")
        .expect("mb union placed");
    assert!((mb.x - (p1 + p3) / 2.0).abs() < EPS);
    assert!((node_x(&layout, "c1") - mb.x).abs() < EPS);
}

#[test]
fn children_sit_one_band_below_their_parents() {
    let layout = layout_of(&small_family());
    let opts = LayoutOptions::default();

    let parent_y = layout
        .nodes
        .iter()
        .find(|n| n.id == "p1")
        .map(|n| n.y)
        .unwrap();
    let child_y = layout
        .nodes
        .iter()
        .find(|n| n.id == "c1")
        .map(|n| n.y)
        .unwrap();
    assert!((child_y - parent_y - opts.level_height).abs() < EPS);
}

#[test]
fn canvas_never_shrinks_below_the_floor() {
    let records = vec![person_record("solo.md", "Solo", "1900").with_scalar("id", "solo")];
    let layout = layout_of(&records);
    let opts = LayoutOptions::default();

    assert!((layout.world_width - opts.min_world_width).abs() < EPS);
    assert!((layout.world_height - opts.min_world_height).abs() < EPS);
    for node in &layout.nodes {
        assert!(node.x >= 0.0 && node.y >= 0.0);
    }
}

#[test]
fn layout_is_deterministic_for_identical_input() {
    let records = small_family();
    let run = || serde_json::to_string(&layout_of(&records)).unwrap();
    assert_eq!(run(), run());
}

/// Fixed keys for a handful of ids, `None` for everyone else's band.
struct FixedKeys(HashMap<String, f64>);

impl OrderHint for FixedKeys {
    fn suggest_order(
        &self,
        _people: &[GraphPerson],
        _edges: &[GraphEdge],
    ) -> Option<HashMap<String, f64>> {
        Some(self.0.clone())
    }
}

/// Always declines, like [`NoHint`] but through a second implementation.
struct Declining;

impl OrderHint for Declining {
    fn suggest_order(
        &self,
        _people: &[GraphPerson],
        _edges: &[GraphEdge],
    ) -> Option<HashMap<String, f64>> {
        None
    }
}

#[test]
fn order_hint_reorders_hub_partners() {
    // Both partners are childless, so both sit left of the hub; their
    // relative order follows the supplied keys.
    let records = vec![
        person_record("p1.md", "Hub", "1948").with_scalar("id", "p1"),
        person_record("p2.md", "Partner Two", "1950").with_scalar("id", "p2"),
        person_record("p3.md", "Partner Three", "1952").with_scalar("id", "p3"),
        union_record("ma", &["../p1.md", "../p2.md"], "1970"),
        union_record("mb", &["../p1.md", "../p3.md"], "1980"),
    ];
    let (store, _) = RecordStore::from_records(&records);
    let graph = build_graph(&store, None);

    let plain = layout_graph(&graph, &NoHint, &LayoutOptions::default());
    assert!(node_x(&plain, "p2") < node_x(&plain, "p3"));

    let hint = FixedKeys(HashMap::from([
        ("p2".to_string(), 5.0),
        ("p3".to_string(), -5.0),
    ]));
    let hinted = layout_graph(&graph, &hint, &LayoutOptions::default());
    assert!(node_x(&hinted, "p3") < node_x(&hinted, "p2"));
}

#[test]
fn declining_hint_matches_no_hint() {
    let (store, _) = RecordStore::from_records(&small_family());
    let graph = build_graph(&store, None);
    let a = layout_graph(&graph, &NoHint, &LayoutOptions::default());
    let b = layout_graph(&graph, &Declining, &LayoutOptions::default());
    assert_eq!(a, b);
}
