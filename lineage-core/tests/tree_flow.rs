//! Nested tree construction through the public API: multi-generation
//! descent, spouse ordering, external spouse links, and explicit roots.

use lineage_core::build_tree;
use lineage_core::record::RecordStore;
use lineage_core::testing::{person_record, small_family, union_record};

#[test]
fn grandchildren_nest_two_levels_down() {
    let mut records = small_family();
    records.push(union_record("m1/mc1", &["../c1.md"], "1998"));
    records.push(person_record("m1/mc1/g1.md", "G One", "2000").with_scalar("id", "g1"));

    let (store, _) = RecordStore::from_records(&records);
    let tree = build_tree(&store, None);

    let root = tree.root.unwrap();
    assert_eq!(root.id, "p1");
    assert_eq!(root.children.len(), 1);
    let child = &root.children[0];
    assert_eq!(child.id, "c1");
    assert_eq!(child.children.len(), 1);
    assert_eq!(child.children[0].id, "g1");
    assert_eq!(tree.total_people, 4);
}

#[test]
fn spouses_appear_in_marriage_date_order() {
    let records = vec![
        person_record("p.md", "Pat", "1940").with_scalar("id", "p"),
        person_record("s1.md", "Sam", "1942").with_scalar("id", "s1"),
        person_record("s2.md", "Sky", "1944").with_scalar("id", "s2"),
        union_record("mx", &["../p.md", "../s1.md"], "1990"),
        union_record("my", &["../p.md", "../s2.md"], "1970"),
    ];
    let (store, _) = RecordStore::from_records(&records);
    let tree = build_tree(&store, None);

    let root = tree.root.unwrap();
    assert_eq!(root.id, "p");
    let married: Vec<(&str, &str)> = root
        .spouses
        .iter()
        .map(|s| (s.full_name.as_str(), s.married.as_str()))
        .collect();
    assert_eq!(married, vec![("Sky", "1970"), ("Sam", "1990")]);
}

#[test]
fn spouse_with_an_external_url_links_out() {
    let records = vec![
        person_record("p.md", "Pat", "1940").with_scalar("id", "p"),
        person_record("s.md", "Sam", "1942")
            .with_scalar("id", "s")
            .with_list("external_url", vec!["https://example.org/sam".into()]),
        union_record("m", &["../p.md", "../s.md"], "1965"),
    ];
    let (store, _) = RecordStore::from_records(&records);
    let tree = build_tree(&store, None);

    let spouse = &tree.root.unwrap().spouses[0];
    assert!(spouse.external);
    assert_eq!(spouse.external_url, "https://example.org/sam");
}

#[test]
fn explicit_root_name_reorients_the_tree() {
    let (store, _) = RecordStore::from_records(&small_family());
    let tree = build_tree(&store, Some("P Two"));

    let root = tree.root.unwrap();
    assert_eq!(root.id, "p2");
    assert_eq!(root.spouses[0].id, "p1");
    assert_eq!(root.children[0].id, "c1");
}

#[test]
fn dangling_partner_refs_do_not_break_the_walk() {
    let records = vec![
        person_record("p.md", "Pat", "1940").with_scalar("id", "p"),
        union_record("m", &["../p.md", "../vanished.md"], "1965"),
        person_record("m/c.md", "Cam", "1967").with_scalar("id", "c"),
    ];
    let (store, _) = RecordStore::from_records(&records);
    let tree = build_tree(&store, None);

    let root = tree.root.unwrap();
    assert!(root.spouses.is_empty());
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].id, "c");
}
