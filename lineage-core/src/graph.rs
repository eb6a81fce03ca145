//! Flattened person/union graph built by breadth-first traversal.
//!
//! The walk starts at the chosen root with generation 0 and only ever moves
//! forward: a person reachable over several paths keeps the minimum
//! generation seen and is re-enqueued only when a strictly shorter path
//! shows up. That monotonicity is what makes the traversal terminate even on
//! malformed cyclic source data.

use crate::record::{sort_people, Person, RecordStore, Union};
use crate::resolve::{Resolver, RoleCount};
use crate::tone::{infer_tone, ToneHint};
use crate::tree::select_root;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Visual ring color of a person node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingTone {
    Blue,
    Orange,
}

/// Edge role in the produced graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// person → union
    Partner,
    /// union → child
    Child,
}

/// A person as the visualization front end consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPerson {
    pub id: String,
    pub full_name: String,
    /// First declared title when short enough, else empty.
    pub subtitle: String,
    pub born: String,
    pub died: String,
    pub deceased: bool,
    pub initials: String,
    pub ring_tone: RingTone,
    pub photo: Option<String>,
}

/// A union with its resolved partner and child id lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUnion {
    pub id: String,
    /// Slot order preserved: index 0 = first partner.
    pub partner_ids: Vec<String>,
    pub child_ids: Vec<String>,
    pub married: String,
    pub ended_by: String,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// The flattened graph payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    /// Empty string when the collection has no people.
    pub root_person_id: String,
    pub people: Vec<GraphPerson>,
    pub unions: Vec<GraphUnion>,
    pub edges: Vec<GraphEdge>,
    pub generation_by_id: BTreeMap<String, u32>,
    pub max_generation: u32,
}

impl GraphPayload {
    /// Payload for an empty or unavailable collection.
    pub fn empty() -> Self {
        Self {
            root_person_id: String::new(),
            people: Vec::new(),
            unions: Vec::new(),
            edges: Vec::new(),
            generation_by_id: BTreeMap::new(),
            max_generation: 0,
        }
    }
}

/// Accumulated union state during the walk.
struct UnionAccum<'a> {
    union: &'a Union,
    generation: u32,
    child_paths: Vec<&'a str>,
}

/// Build the flattened graph from the record store.
pub fn build_graph(store: &RecordStore, root_name: Option<&str>) -> GraphPayload {
    let resolver = Resolver::new(store);
    let Some(root) = select_root(store, root_name) else {
        return GraphPayload::empty();
    };

    let mut generation: HashMap<&str, u32> = HashMap::new();
    let mut unions: BTreeMap<&str, UnionAccum<'_>> = BTreeMap::new();
    let mut votes: HashMap<&str, RoleCount> = HashMap::new();
    let mut voted_unions: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, u32)> = VecDeque::new();

    generation.insert(&root.path, 0);
    queue.push_back((&root.path, 0));

    while let Some((path, gen)) = queue.pop_front() {
        // Stale entry: a shorter path to this person was found meanwhile.
        if generation.get(path).is_some_and(|&g| g < gen) {
            continue;
        }

        for union in resolver.unions_for_person(path) {
            let children = resolver.children_of_union(union);
            let accum = unions.entry(&union.dir).or_insert_with(|| UnionAccum {
                union,
                generation: gen,
                child_paths: Vec::new(),
            });
            accum.generation = accum.generation.min(gen);

            // One role vote per union per occupied slot.
            if voted_unions.insert(&union.dir) {
                for (slot, partner) in union.partner_paths.iter().enumerate() {
                    if store.person(partner).is_none() {
                        continue;
                    }
                    let vote = votes.entry(partner).or_default();
                    if slot == 0 {
                        vote.first += 1;
                    } else {
                        vote.second += 1;
                    }
                }
            }

            for partner in &union.partner_paths {
                if store.person(partner).is_none() {
                    continue;
                }
                let entry = generation.entry(partner).or_insert(gen);
                *entry = (*entry).min(gen);
            }

            let child_gen = gen + 1;
            for child in children {
                if !accum.child_paths.contains(&child.path.as_str()) {
                    accum.child_paths.push(&child.path);
                }

                let improved = generation
                    .get(child.path.as_str())
                    .is_none_or(|&g| child_gen < g);
                if improved {
                    generation.insert(&child.path, child_gen);
                    queue.push_back((&child.path, child_gen));
                }
            }
        }
    }

    assemble(store, root, &generation, &unions, &votes)
}

fn assemble(
    store: &RecordStore,
    root: &Person,
    generation: &HashMap<&str, u32>,
    unions: &BTreeMap<&str, UnionAccum<'_>>,
    votes: &HashMap<&str, RoleCount>,
) -> GraphPayload {
    let mut people: Vec<&Person> = generation
        .keys()
        .filter_map(|path| store.person(path))
        .collect();
    people.sort_by(|a, b| {
        generation[a.path.as_str()]
            .cmp(&generation[b.path.as_str()])
            .then_with(|| sort_people(a, b))
    });

    let graph_people: Vec<GraphPerson> = people
        .iter()
        .map(|person| GraphPerson {
            id: person.id.to_string(),
            full_name: person.full_name.clone(),
            subtitle: person.subtitle().to_string(),
            born: person.born.clone(),
            died: person.died.clone(),
            deceased: person.deceased(),
            initials: person.initials(),
            ring_tone: ring_tone_for(person, votes.get(person.path.as_str())),
            photo: person.photo.clone(),
        })
        .collect();

    let mut graph_unions: Vec<GraphUnion> = unions
        .values()
        .filter_map(|accum| {
            let partner_ids: Vec<String> = accum
                .union
                .partner_paths
                .iter()
                .filter_map(|path| store.person(path))
                .map(|p| p.id.to_string())
                .collect();
            if partner_ids.is_empty() {
                return None;
            }
            let child_ids: Vec<String> = accum
                .child_paths
                .iter()
                .filter_map(|path| store.person(path))
                .map(|p| p.id.to_string())
                .collect();
            Some(GraphUnion {
                id: accum.union.id.to_string(),
                partner_ids,
                child_ids,
                married: accum.union.married.clone(),
                ended_by: accum.union.ended_by.clone(),
                generation: accum.generation,
            })
        })
        .collect();
    graph_unions.sort_by(|a, b| a.generation.cmp(&b.generation).then_with(|| a.id.cmp(&b.id)));

    let mut edges = Vec::new();
    for union in &graph_unions {
        for partner_id in &union.partner_ids {
            edges.push(GraphEdge {
                source: partner_id.clone(),
                target: union.id.clone(),
                kind: EdgeKind::Partner,
            });
        }
        for child_id in &union.child_ids {
            edges.push(GraphEdge {
                source: union.id.clone(),
                target: child_id.clone(),
                kind: EdgeKind::Child,
            });
        }
    }

    let generation_by_id: BTreeMap<String, u32> = people
        .iter()
        .map(|p| (p.id.to_string(), generation[p.path.as_str()]))
        .collect();
    let max_generation = generation_by_id.values().copied().max().unwrap_or(0);

    GraphPayload {
        root_person_id: root.id.to_string(),
        people: graph_people,
        unions: graph_unions,
        edges,
        generation_by_id,
        max_generation,
    }
}

/// Textual inference wins when unambiguous; role votes break the tie
/// (first slot → blue, second slot → orange), blue overall default.
fn ring_tone_for(person: &Person, votes: Option<&RoleCount>) -> RingTone {
    match infer_tone(&person.full_name, &person.titles) {
        ToneHint::Blue => RingTone::Blue,
        ToneHint::Orange => RingTone::Orange,
        ToneHint::Ambiguous => match votes {
            Some(count) if count.second > count.first => RingTone::Orange,
            _ => RingTone::Blue,
        },
    }
}
