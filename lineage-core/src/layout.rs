//! Constraint-based coordinate assignment for the person/union graph.
//!
//! Each generation is a horizontal band. Within a band, people are grouped
//! into blocks that must move together: multi-partner hubs with childless
//! partners on the left and co-parents on the right, couples as pairs,
//! everyone else as singletons. Blocks are anchored under the mean of their
//! placed parent unions and spread apart by a forward/backward constraint
//! pass so nothing overlaps. An external layered-graph pre-pass can supply
//! ordering hints; it is advisory only and the layout must work without it.

use crate::geometry::{emit_connectors, Dot, PlacedUnion, Segment};
use crate::graph::{GraphEdge, GraphPayload, GraphPerson, RingTone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Fixed spacing and sizing constants for the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Horizontal distance between members of one block.
    pub h_step: f64,
    /// Minimum horizontal gap between adjacent block spans. Kept at least
    /// as large as `h_step` so the per-person spacing guarantee also holds
    /// across block boundaries.
    pub min_gap: f64,
    /// Vertical distance between generation bands.
    pub level_height: f64,
    /// Vertical offset of generation 0.
    pub top_offset: f64,
    /// Padding added around the content before normalization.
    pub margin: f64,
    /// Lower bound on the reported canvas size.
    pub min_world_width: f64,
    pub min_world_height: f64,
    /// Vertical drop from a union point to its branch bar.
    pub branch_drop: f64,
    /// Risers stop this far above a child's center (avatar radius).
    pub child_clearance: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            h_step: 140.0,
            min_gap: 180.0,
            level_height: 180.0,
            top_offset: 80.0,
            margin: 60.0,
            min_world_width: 640.0,
            min_world_height: 480.0,
            branch_drop: 60.0,
            child_clearance: 36.0,
        }
    }
}

/// Optional external pre-pass supplying relative horizontal keys.
///
/// Implementations return `None` when they cannot help; the layout then
/// falls back to its own ordering. A hint can also be partial: people
/// missing from the map use the fallback keys too.
pub trait OrderHint {
    fn suggest_order(
        &self,
        people: &[GraphPerson],
        edges: &[GraphEdge],
    ) -> Option<HashMap<String, f64>>;
}

/// The always-unavailable hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHint;

impl OrderHint for NoHint {
    fn suggest_order(
        &self,
        _people: &[GraphPerson],
        _edges: &[GraphEdge],
    ) -> Option<HashMap<String, f64>> {
        None
    }
}

/// A positioned person node with its display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub generation: u32,
    pub full_name: String,
    pub subtitle: String,
    pub born: String,
    pub died: String,
    pub deceased: bool,
    pub initials: String,
    pub ring_tone: RingTone,
    pub photo: Option<String>,
}

/// A positioned union point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub generation: u32,
}

/// The drawing payload: nodes, connector geometry, canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPayload {
    pub nodes: Vec<LayoutNode>,
    pub unions: Vec<UnionPoint>,
    pub segments: Vec<Segment>,
    pub dots: Vec<Dot>,
    pub world_width: f64,
    pub world_height: f64,
}

/// Base ordering key for one person within their generation band.
#[derive(Debug, Clone, Copy)]
struct BaseKey {
    key: f64,
    /// Whether the key came from placed parent unions (an x coordinate).
    parent_anchored: bool,
}

/// Assign coordinates to every person and union of the graph.
pub fn layout_graph(
    graph: &GraphPayload,
    hint: &dyn OrderHint,
    opts: &LayoutOptions,
) -> LayoutPayload {
    if graph.people.is_empty() {
        return LayoutPayload {
            nodes: Vec::new(),
            unions: Vec::new(),
            segments: Vec::new(),
            dots: Vec::new(),
            world_width: opts.min_world_width,
            world_height: opts.min_world_height,
        };
    }

    let hint_keys = hint
        .suggest_order(&graph.people, &graph.edges)
        .unwrap_or_default();

    let source_pos: HashMap<&str, usize> = graph
        .people
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.id.as_str(), idx))
        .collect();
    let generation_of = |id: &str| graph.generation_by_id.get(id).copied().unwrap_or(0);
    let root_name = graph
        .people
        .iter()
        .find(|p| p.id == graph.root_person_id)
        .map(|p| p.full_name.as_str())
        .unwrap_or_default();

    // Unions a person descends from, by person id.
    let mut parent_unions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, union) in graph.unions.iter().enumerate() {
        for child_id in &union.child_ids {
            parent_unions.entry(child_id).or_default().push(idx);
        }
    }

    let mut x_of: HashMap<&str, f64> = HashMap::new();

    for band in 0..=graph.max_generation {
        let ids: Vec<&str> = graph
            .people
            .iter()
            .filter(|p| generation_of(&p.id) == band)
            .map(|p| p.id.as_str())
            .collect();
        if ids.is_empty() {
            continue;
        }

        let keys = base_keys(
            graph,
            &ids,
            band,
            root_name,
            &hint_keys,
            &parent_unions,
            &x_of,
        );
        let order = stable_order(graph, &ids, &keys, &source_pos);
        let stable_pos: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(rank, id)| (*id, rank))
            .collect();

        let partners = same_generation_partners(graph, band, &generation_of);
        let blocks = build_blocks(graph, &order, &partners, &keys, &stable_pos);
        place_blocks(band, &blocks, &keys, &stable_pos, opts, &mut x_of);
    }

    assemble(graph, &x_of, opts)
}

/// Base ordering key per person within one band.
fn base_keys<'a>(
    graph: &'a GraphPayload,
    ids: &[&'a str],
    band: u32,
    root_name: &str,
    hint_keys: &HashMap<String, f64>,
    parent_unions: &HashMap<&str, Vec<usize>>,
    x_of: &HashMap<&str, f64>,
) -> HashMap<&'a str, BaseKey> {
    let mut keys = HashMap::new();

    for &id in ids {
        let base = if band == 0 {
            if let Some(&key) = hint_keys.get(id) {
                BaseKey {
                    key,
                    parent_anchored: false,
                }
            } else if id == graph.root_person_id {
                BaseKey {
                    key: f64::NEG_INFINITY,
                    parent_anchored: false,
                }
            } else {
                let name = graph
                    .people
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| p.full_name.as_str())
                    .unwrap_or_default();
                let key = match name.cmp(root_name) {
                    Ordering::Less => -1.0,
                    Ordering::Equal => 0.0,
                    Ordering::Greater => 1.0,
                };
                BaseKey {
                    key,
                    parent_anchored: false,
                }
            }
        } else {
            let parent_xs: Vec<f64> = parent_unions
                .get(id)
                .map(|unions| {
                    unions
                        .iter()
                        .filter_map(|&idx| union_x(&graph.unions[idx].partner_ids, x_of))
                        .collect()
                })
                .unwrap_or_default();

            if !parent_xs.is_empty() {
                BaseKey {
                    key: mean(&parent_xs),
                    parent_anchored: true,
                }
            } else if let Some(&key) = hint_keys.get(id) {
                BaseKey {
                    key,
                    parent_anchored: false,
                }
            } else {
                BaseKey {
                    key: f64::INFINITY,
                    parent_anchored: false,
                }
            }
        };
        keys.insert(id, base);
    }

    keys
}

/// Mean x of a union's placed partners, if any are placed.
fn union_x(partner_ids: &[String], x_of: &HashMap<&str, f64>) -> Option<f64> {
    let xs: Vec<f64> = partner_ids
        .iter()
        .filter_map(|id| x_of.get(id.as_str()).copied())
        .collect();
    if xs.is_empty() {
        None
    } else {
        Some(mean(&xs))
    }
}

/// Sort by base key, ties broken by source order then name.
fn stable_order<'a>(
    graph: &GraphPayload,
    ids: &[&'a str],
    keys: &HashMap<&'a str, BaseKey>,
    source_pos: &HashMap<&str, usize>,
) -> Vec<&'a str> {
    let name_of = |id: &str| {
        graph
            .people
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.full_name.as_str())
            .unwrap_or_default()
    };

    let mut order = ids.to_vec();
    order.sort_by(|a, b| {
        keys[a]
            .key
            .partial_cmp(&keys[b].key)
            .unwrap_or(Ordering::Equal)
            .then_with(|| source_pos[a].cmp(&source_pos[b]))
            .then_with(|| name_of(a).cmp(name_of(b)))
    });
    order
}

/// A same-generation partner and whether the pair has children together.
#[derive(Debug, Clone, Copy)]
struct Partner<'a> {
    id: &'a str,
    has_children: bool,
}

/// Partner adjacency restricted to one generation band, deduplicated per
/// pair (a pair with several unions counts once, co-parenting if any union
/// has children).
fn same_generation_partners<'a>(
    graph: &'a GraphPayload,
    band: u32,
    generation_of: &impl Fn(&str) -> u32,
) -> HashMap<&'a str, Vec<Partner<'a>>> {
    let mut partners: HashMap<&str, Vec<Partner<'_>>> = HashMap::new();

    for union in &graph.unions {
        if union.partner_ids.len() != 2 {
            continue;
        }
        let (a, b) = (union.partner_ids[0].as_str(), union.partner_ids[1].as_str());
        if generation_of(a) != band || generation_of(b) != band {
            continue;
        }
        let has_children = !union.child_ids.is_empty();
        for (this, other) in [(a, b), (b, a)] {
            let list = partners.entry(this).or_default();
            match list.iter_mut().find(|p| p.id == other) {
                Some(existing) => existing.has_children |= has_children,
                None => list.push(Partner {
                    id: other,
                    has_children,
                }),
            }
        }
    }

    partners
}

/// Group a band into blocks that move together.
fn build_blocks<'a>(
    graph: &GraphPayload,
    order: &[&'a str],
    partners: &HashMap<&'a str, Vec<Partner<'a>>>,
    keys: &HashMap<&'a str, BaseKey>,
    stable_pos: &HashMap<&str, usize>,
) -> Vec<Vec<&'a str>> {
    let mut used: HashSet<&str> = HashSet::new();
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    let key_order = |a: &&str, b: &&str| {
        keys[*a]
            .key
            .partial_cmp(&keys[*b].key)
            .unwrap_or(Ordering::Equal)
            .then_with(|| stable_pos[*a].cmp(&stable_pos[*b]))
    };

    // Hub blocks: more than one same-generation partner.
    for &id in order {
        if used.contains(id) {
            continue;
        }
        let all = match partners.get(id) {
            Some(list) if list.len() > 1 => list,
            _ => continue,
        };
        let available: Vec<Partner<'_>> = all
            .iter()
            .copied()
            .filter(|p| !used.contains(p.id))
            .collect();

        let mut left: Vec<&str> = available
            .iter()
            .filter(|p| !p.has_children)
            .map(|p| p.id)
            .collect();
        let mut right: Vec<&str> = available
            .iter()
            .filter(|p| p.has_children)
            .map(|p| p.id)
            .collect();
        left.sort_by(|a, b| key_order(a, b));
        right.sort_by(|a, b| key_order(a, b));

        let mut members = left;
        members.push(id);
        members.extend(right);
        for member in &members {
            used.insert(member);
        }
        blocks.push(members);
    }

    // Pair blocks: exactly one unused partner on each side.
    for &id in order {
        if used.contains(id) {
            continue;
        }
        let my_avail: Vec<&str> = partners
            .get(id)
            .map(|list| {
                list.iter()
                    .map(|p| p.id)
                    .filter(|p| !used.contains(p))
                    .collect()
            })
            .unwrap_or_default();
        if my_avail.len() != 1 {
            continue;
        }
        let other = my_avail[0];

        let other_avail: Vec<&str> = partners
            .get(other)
            .map(|list| {
                list.iter()
                    .map(|p| p.id)
                    .filter(|p| !used.contains(p))
                    .collect()
            })
            .unwrap_or_default();
        if other_avail != [id] {
            continue;
        }

        let tone_of = |pid: &str| {
            graph
                .people
                .iter()
                .find(|p| p.id == pid)
                .map(|p| p.ring_tone)
                .unwrap_or(RingTone::Blue)
        };
        let mut pair = [id, other];
        pair.sort_by(|a, b| {
            tone_rank(tone_of(a))
                .cmp(&tone_rank(tone_of(b)))
                .then_with(|| key_order(a, b))
        });

        used.insert(id);
        used.insert(other);
        blocks.push(pair.to_vec());
    }

    // Singletons.
    for &id in order {
        if used.insert(id) {
            blocks.push(vec![id]);
        }
    }

    blocks
}

fn tone_rank(tone: RingTone) -> u8 {
    match tone {
        RingTone::Blue => 0,
        RingTone::Orange => 1,
    }
}

/// Anchor key of a block: parent-anchored keys win, then any finite key,
/// then the members' stable positions.
fn block_anchor(
    members: &[&str],
    keys: &HashMap<&str, BaseKey>,
    stable_pos: &HashMap<&str, usize>,
) -> f64 {
    let parent_anchored: Vec<f64> = members
        .iter()
        .filter(|id| keys[**id].parent_anchored)
        .map(|id| keys[*id].key)
        .collect();
    if !parent_anchored.is_empty() {
        return mean(&parent_anchored);
    }

    let finite: Vec<f64> = members
        .iter()
        .map(|id| keys[*id].key)
        .filter(|k| k.is_finite())
        .collect();
    if !finite.is_empty() {
        return mean(&finite);
    }

    let positions: Vec<f64> = members.iter().map(|id| stable_pos[*id] as f64).collect();
    mean(&positions)
}

/// Order blocks by anchor and assign member x positions.
fn place_blocks<'a>(
    band: u32,
    blocks: &[Vec<&'a str>],
    keys: &HashMap<&str, BaseKey>,
    stable_pos: &HashMap<&str, usize>,
    opts: &LayoutOptions,
    x_of: &mut HashMap<&'a str, f64>,
) {
    let mut ordered: Vec<(&[&str], f64)> = blocks
        .iter()
        .map(|members| (members.as_slice(), block_anchor(members, keys, stable_pos)))
        .collect();
    ordered.sort_by(|(a, anchor_a), (b, anchor_b)| {
        anchor_a
            .partial_cmp(anchor_b)
            .unwrap_or(Ordering::Equal)
            .then_with(|| stable_pos[a[0]].cmp(&stable_pos[b[0]]))
    });

    let spans: Vec<f64> = ordered
        .iter()
        .map(|(members, _)| (members.len() - 1) as f64 * opts.h_step)
        .collect();

    let centers: Vec<f64> = if band == 0 {
        // Generation 0 is laid out purely left to right.
        let mut centers = Vec::with_capacity(ordered.len());
        let mut cursor = 0.0;
        for span in &spans {
            centers.push(cursor);
            cursor += span + opts.min_gap;
        }
        centers
    } else {
        let desired: Vec<f64> = ordered.iter().map(|(_, anchor)| *anchor).collect();

        let mut forward = vec![0.0; desired.len()];
        for i in 0..desired.len() {
            forward[i] = if i == 0 {
                desired[i]
            } else {
                desired[i].max(forward[i - 1] + spans[i - 1] + opts.min_gap)
            };
        }

        let mut backward = forward.clone();
        for i in (0..desired.len().saturating_sub(1)).rev() {
            backward[i] = forward[i].min(backward[i + 1] - spans[i] - opts.min_gap);
        }

        forward
            .iter()
            .zip(&backward)
            .map(|(f, b)| (f + b) / 2.0)
            .collect()
    };

    for ((members, _), center) in ordered.iter().zip(centers) {
        for (offset, id) in members.iter().enumerate() {
            x_of.insert(id, center + offset as f64 * opts.h_step);
        }
    }
}

/// Union positions, vertical bands, connector geometry, normalization.
fn assemble(graph: &GraphPayload, x_of: &HashMap<&str, f64>, opts: &LayoutOptions) -> LayoutPayload {
    let generation_of = |id: &str| graph.generation_by_id.get(id).copied().unwrap_or(0);
    let band_y = |generation: u32| f64::from(generation) * opts.level_height + opts.top_offset;

    let mut nodes = Vec::new();
    for person in &graph.people {
        let Some(&x) = x_of.get(person.id.as_str()) else {
            continue;
        };
        let generation = generation_of(&person.id);
        nodes.push(LayoutNode {
            id: person.id.clone(),
            x,
            y: band_y(generation),
            generation,
            full_name: person.full_name.clone(),
            subtitle: person.subtitle.clone(),
            born: person.born.clone(),
            died: person.died.clone(),
            deceased: person.deceased,
            initials: person.initials.clone(),
            ring_tone: person.ring_tone,
            photo: person.photo.clone(),
        });
    }

    let mut union_points = Vec::new();
    let mut placed = Vec::new();
    for union in &graph.unions {
        // Unions with no positioned partner are dropped from drawing.
        let Some(x) = union_x(&union.partner_ids, x_of) else {
            continue;
        };
        let y = band_y(union.generation);
        union_points.push(UnionPoint {
            id: union.id.clone(),
            x,
            y,
            generation: union.generation,
        });

        let partner_points: Vec<(f64, f64)> = union
            .partner_ids
            .iter()
            .filter_map(|id| {
                x_of.get(id.as_str())
                    .map(|&px| (px, band_y(generation_of(id))))
            })
            .collect();
        let child_points: Vec<(f64, f64)> = union
            .child_ids
            .iter()
            .filter_map(|id| {
                x_of.get(id.as_str())
                    .map(|&cx| (cx, band_y(generation_of(id))))
            })
            .collect();
        placed.push(PlacedUnion {
            x,
            y,
            partner_points,
            child_points,
        });
    }

    let (mut segments, mut dots) = emit_connectors(&placed, opts);

    normalize(
        &mut nodes,
        &mut union_points,
        &mut segments,
        &mut dots,
        opts,
    )
}

/// Shift everything so the minimum extent sits at the margin and report a
/// canvas size with a fixed floor.
fn normalize(
    nodes: &mut Vec<LayoutNode>,
    unions: &mut Vec<UnionPoint>,
    segments: &mut Vec<Segment>,
    dots: &mut Vec<Dot>,
    opts: &LayoutOptions,
) -> LayoutPayload {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let mut visit = |x: f64, y: f64| {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    };
    for node in nodes.iter() {
        visit(node.x, node.y);
    }
    for union in unions.iter() {
        visit(union.x, union.y);
    }
    for segment in segments.iter() {
        visit(segment.x1, segment.y1);
        visit(segment.x2, segment.y2);
    }
    for dot in dots.iter() {
        visit(dot.x, dot.y);
    }

    if !min_x.is_finite() {
        return LayoutPayload {
            nodes: std::mem::take(nodes),
            unions: std::mem::take(unions),
            segments: std::mem::take(segments),
            dots: std::mem::take(dots),
            world_width: opts.min_world_width,
            world_height: opts.min_world_height,
        };
    }

    let dx = opts.margin - min_x;
    let dy = opts.margin - min_y;

    for node in nodes.iter_mut() {
        node.x += dx;
        node.y += dy;
    }
    for union in unions.iter_mut() {
        union.x += dx;
        union.y += dy;
    }
    for segment in segments.iter_mut() {
        segment.x1 += dx;
        segment.y1 += dy;
        segment.x2 += dx;
        segment.y2 += dy;
    }
    for dot in dots.iter_mut() {
        dot.x += dx;
        dot.y += dy;
    }

    LayoutPayload {
        nodes: std::mem::take(nodes),
        unions: std::mem::take(unions),
        segments: std::mem::take(segments),
        dots: std::mem::take(dots),
        world_width: (max_x + dx + opts.margin).max(opts.min_world_width),
        world_height: (max_y + dy + opts.margin).max(opts.min_world_height),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
