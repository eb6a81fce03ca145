//! Nested ancestry tree for list-style rendering.
//!
//! The tree re-walks the resolver from a chosen root: person → spouses →
//! children, recursively. Source data can be cyclic (bad refs, intermarried
//! branches), so recursion carries an explicit copy-on-descend path set and
//! re-entry produces a terminal node instead of descending again.

use crate::record::{Person, RecordStore, Union};
use crate::resolve::Resolver;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Build payload for the nested tree view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreePayload {
    /// `None` when the collection is empty or unavailable.
    pub root: Option<TreeNode>,
    pub total_people: usize,
    /// RFC 3339 build timestamp.
    pub generated_at: String,
    /// Build-level error, e.g. a missing source collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreePayload {
    /// Explicit "unavailable" payload for a missing source collection.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            root: None,
            total_people: 0,
            generated_at: Utc::now().to_rfc3339(),
            error: Some(reason.into()),
        }
    }
}

/// One person in the nested tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    pub full_name: String,
    pub born: String,
    pub died: String,
    pub birth_place: String,
    pub deceased: bool,
    pub initials: String,
    pub titles: Vec<String>,
    pub external_urls: Vec<String>,
    pub photo: Option<String>,
    pub notes: String,
    pub spouses: Vec<SpouseNode>,
    pub children: Vec<TreeNode>,
}

/// A spouse reached through a shared union; never re-expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpouseNode {
    pub id: String,
    pub full_name: String,
    pub born: String,
    pub died: String,
    pub deceased: bool,
    pub initials: String,
    pub photo: Option<String>,
    /// Whether the spouse links out of the collection.
    pub external: bool,
    pub external_url: String,
    pub married: String,
    pub ended_by: String,
}

impl SpouseNode {
    fn from_person(person: &Person, union: &Union) -> Self {
        Self {
            id: person.id.to_string(),
            full_name: person.full_name.clone(),
            born: person.born.clone(),
            died: person.died.clone(),
            deceased: person.deceased(),
            initials: person.initials(),
            photo: person.photo.clone(),
            external: !person.external_urls.is_empty(),
            external_url: person.external_urls.first().cloned().unwrap_or_default(),
            married: union.married.clone(),
            ended_by: union.ended_by.clone(),
        }
    }
}

/// Pick the root person for tree and graph traversal.
///
/// Precedence: explicit full-name match, then the first partner of the
/// earliest top-level union that resolves to a known person, then the
/// earliest top-level person by birth sort, then the smallest known id.
pub fn select_root<'a>(store: &'a RecordStore, root_name: Option<&str>) -> Option<&'a Person> {
    if let Some(name) = root_name.filter(|n| !n.is_empty()) {
        if let Some(person) = store.person_by_name(name) {
            return Some(person);
        }
    }

    for union in store.top_level_unions() {
        if let Some(person) = union.partner_paths.first().and_then(|p| store.person(p)) {
            return Some(person);
        }
    }

    if let Some(person) = store.top_level_people().first().copied() {
        return Some(person);
    }

    store.people().min_by(|a, b| a.id.cmp(&b.id))
}

/// Materialize the nested tree from the record store.
pub fn build_tree(store: &RecordStore, root_name: Option<&str>) -> TreePayload {
    let resolver = Resolver::new(store);
    let root = select_root(store, root_name)
        .and_then(|person| to_node(resolver, &person.path, &BTreeSet::new()));

    TreePayload {
        root,
        total_people: store.total_people(),
        generated_at: Utc::now().to_rfc3339(),
        error: None,
    }
}

fn to_node<'a>(
    resolver: Resolver<'a>,
    person_path: &'a str,
    path_set: &BTreeSet<&'a str>,
) -> Option<TreeNode> {
    let person = resolver.store().person(person_path)?;

    // Cycle break: a person already on the root-to-node path terminates here.
    if path_set.contains(person_path) {
        return Some(node_for(person, Vec::new(), Vec::new()));
    }

    let mut next_path = path_set.clone();
    next_path.insert(person_path);

    let mut spouses = Vec::new();
    let mut child_paths: Vec<&str> = Vec::new();

    for union in resolver.unions_for_person(person_path) {
        if let Some(spouse) = union
            .other_partner(person_path)
            .and_then(|p| resolver.store().person(p))
        {
            spouses.push(SpouseNode::from_person(spouse, union));
        }

        for child in resolver.children_of_union(union) {
            if !child_paths.contains(&child.path.as_str()) {
                child_paths.push(&child.path);
            }
        }
    }

    let children = child_paths
        .iter()
        .filter_map(|path| to_node(resolver, path, &next_path))
        .collect();

    Some(node_for(person, spouses, children))
}

fn node_for(person: &Person, spouses: Vec<SpouseNode>, children: Vec<TreeNode>) -> TreeNode {
    TreeNode {
        id: person.id.to_string(),
        full_name: person.full_name.clone(),
        born: person.born.clone(),
        died: person.died.clone(),
        birth_place: person.birth_place.clone(),
        deceased: person.deceased(),
        initials: person.initials(),
        titles: person.titles.clone(),
        external_urls: person.external_urls.clone(),
        photo: person.photo.clone(),
        notes: person.notes.clone(),
        spouses,
        children,
    }
}
