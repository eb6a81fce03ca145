//! Family graph construction and layout engine.
//!
//! This crate turns a genealogical record collection (one file per person,
//! one `_marriage.md` file per union) into:
//! - a nested ancestry tree for list-style rendering,
//! - a flattened person/union graph with generation assignment, and
//! - a deterministic, non-overlapping 2D layout with connector geometry
//!   ready for pan-zoom drawing.
//!
//! Frontmatter parsing, markdown rendering and the static-site pipeline are
//! external collaborators: the engine consumes already-parsed
//! [`SourceRecord`]s and produces plain serializable payloads.
//!
//! # Quick Start
//!
//! ```
//! use lineage_core::{build_family, LayoutOptions, NoHint};
//! use lineage_core::testing::{person_record, union_record};
//!
//! let records = vec![
//!     person_record("ada.md", "Ada", "1815"),
//!     person_record("will.md", "Will", "1813"),
//!     union_record("m1", &["../ada.md", "../will.md"], "1835"),
//!     person_record("m1/byron.md", "Byron", "1836"),
//! ];
//!
//! let build = build_family(&records, None, &NoHint, &LayoutOptions::default());
//! assert_eq!(build.graph.people.len(), 3);
//! assert_eq!(build.graph.max_generation, 1);
//! assert!(build.layout.world_width >= 640.0);
//! ```

pub mod geometry;
pub mod graph;
pub mod layout;
pub mod record;
pub mod resolve;
pub mod testing;
pub mod tone;
pub mod tree;

// Primary public API
pub use geometry::{Dot, Segment};
pub use graph::{
    build_graph, EdgeKind, GraphEdge, GraphPayload, GraphPerson, GraphUnion, RingTone,
};
pub use layout::{layout_graph, LayoutNode, LayoutOptions, LayoutPayload, NoHint, OrderHint};
pub use record::{
    FieldValue, IdentityAssignment, Person, PersonId, RecordStore, SourceError, SourceRecord,
    Union, UnionId,
};
pub use resolve::{Resolver, RoleCount};
pub use tone::{infer_tone, ToneHint};
pub use tree::{build_tree, select_root, SpouseNode, TreeNode, TreePayload};

/// Everything one build invocation produces.
#[derive(Debug, Clone)]
pub struct FamilyBuild {
    pub tree: TreePayload,
    pub graph: GraphPayload,
    pub layout: LayoutPayload,
    /// Generated identities the caller should persist back to source.
    pub identity_assignments: Vec<IdentityAssignment>,
}

/// Run the full pipeline: record store → tree + graph → layout.
pub fn build_family(
    records: &[SourceRecord],
    root_person_name: Option<&str>,
    hint: &dyn OrderHint,
    opts: &LayoutOptions,
) -> FamilyBuild {
    let (store, identity_assignments) = RecordStore::from_records(records);
    let tree = build_tree(&store, root_person_name);
    let graph = build_graph(&store, root_person_name);
    let layout = layout_graph(&graph, hint, opts);

    FamilyBuild {
        tree,
        graph,
        layout,
        identity_assignments,
    }
}

/// Build result for a missing or unreadable source collection: empty
/// payloads plus an explicit error on the tree, so downstream rendering can
/// show an "unavailable" state instead of failing.
pub fn unavailable_build(error: SourceError) -> FamilyBuild {
    FamilyBuild {
        tree: TreePayload::unavailable(error.to_string()),
        graph: GraphPayload::empty(),
        layout: layout_graph(&GraphPayload::empty(), &NoHint, &LayoutOptions::default()),
        identity_assignments: Vec::new(),
    }
}
