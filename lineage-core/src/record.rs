//! Record store: typed person and union records built from parsed source files.
//!
//! The raw frontmatter/markdown pipeline is an external collaborator; it hands
//! us one [`SourceRecord`] per file: a key→value map plus a stable relative
//! file identity. Relationships are encoded by directory structure. A union is
//! a `_marriage.md` file inside its own directory, its children are the
//! sibling person files in that directory, and a person's unions live in
//! subdirectories next to the person's own file.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// File name that marks a record as a union rather than a person.
pub const UNION_FILE_NAME: &str = "_marriage.md";

/// Titles longer than this are not used as a subtitle.
pub const SUBTITLE_MAX_LEN: usize = 40;

/// Errors from the record source collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("family source collection not found: {0}")]
    Missing(String),
}

// ============================================================================
// Source records (collaborator contract)
// ============================================================================

/// One parsed frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Plain scalar, already unquoted and trimmed.
    Scalar(String),
    /// List of scalars (e.g. `titles`, `external_url`).
    List(Vec<String>),
    /// List of `{ref: <relative path>}` items (the `partners` list).
    Refs(Vec<String>),
}

/// A parsed source file: stable relative path, key→value fields, free body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Relative POSIX-style path, unique within the collection.
    pub path: String,
    pub fields: BTreeMap<String, FieldValue>,
    /// Free-text body below the frontmatter (raw, not rendered).
    pub body: String,
}

impl SourceRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: BTreeMap::new(),
            body: String::new(),
        }
    }

    /// Whether this file is a union record (fixed filename marker).
    pub fn is_union(&self) -> bool {
        file_name(&self.path) == UNION_FILE_NAME
    }

    pub fn with_scalar(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::Scalar(value.into()));
        self
    }

    pub fn with_list(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::List(values));
        self
    }

    pub fn with_refs(mut self, key: impl Into<String>, refs: Vec<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::Refs(refs));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn scalar(&self, key: &str) -> &str {
        match self.fields.get(key) {
            Some(FieldValue::Scalar(value)) => value.trim(),
            _ => "",
        }
    }

    pub fn list(&self, key: &str) -> &[String] {
        match self.fields.get(key) {
            Some(FieldValue::List(values)) => values,
            _ => &[],
        }
    }

    pub fn refs(&self, key: &str) -> &[String] {
        match self.fields.get(key) {
            Some(FieldValue::Refs(values)) => values,
            _ => &[],
        }
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Parent directory of a relative path; `""` for top-level entries.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final component of a relative path.
pub(crate) fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Resolve `rel` against `base_dir`, collapsing `.` and `..` components.
/// `..` past the collection root saturates at the root.
pub(crate) fn resolve_ref(base_dir: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier for a person: persisted in the source record, generated
/// once when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Generate a fresh identity for a record that has none.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for a union, derived from its storage location so that
/// reruns over the same collection produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnionId(pub String);

impl fmt::Display for UnionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated identity the caller should persist back into the source file.
///
/// Records that already carry an id never appear here, which makes the
/// write-back idempotent per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAssignment {
    pub path: String,
    pub id: PersonId,
}

// ============================================================================
// Domain records
// ============================================================================

/// A person record. Immutable after store build within one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Stable file identity within the collection.
    pub path: String,
    pub full_name: String,
    /// Free-text date, compared lexicographically, never parsed.
    pub born: String,
    pub died: String,
    pub birth_place: String,
    pub titles: Vec<String>,
    pub external_urls: Vec<String>,
    /// Passthrough photo reference; resolution happens in the pipeline.
    pub photo: Option<String>,
    /// Raw body text; markdown rendering is the pipeline's job.
    pub notes: String,
}

impl Person {
    pub fn deceased(&self) -> bool {
        !self.died.is_empty()
    }

    /// First letters of the first two name words, uppercased.
    pub fn initials(&self) -> String {
        self.full_name
            .split_whitespace()
            .take(2)
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// First declared title, if short enough to display inline.
    pub fn subtitle(&self) -> &str {
        match self.titles.first() {
            Some(title) if title.chars().count() < SUBTITLE_MAX_LEN => title,
            _ => "",
        }
    }
}

/// A union (marriage or equivalent) linking up to two partners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub id: UnionId,
    /// Directory holding the union file; children are its sibling persons.
    pub dir: String,
    /// Resolved partner paths in slot order: index 0 = first partner.
    pub partner_paths: Vec<String>,
    /// Free-text date, compared lexicographically.
    pub married: String,
    pub married_place: String,
    pub ended_by: String,
    pub notes: String,
}

impl Union {
    /// Partner path in the other slot, if any.
    pub fn other_partner(&self, person_path: &str) -> Option<&str> {
        self.partner_paths
            .iter()
            .map(String::as_str)
            .find(|p| *p != person_path)
    }
}

// ============================================================================
// Sort laws
// ============================================================================

/// Ascending by raw `born` text; dated records before undated; ties on name.
pub fn sort_people(a: &Person, b: &Person) -> Ordering {
    compare_dated(&a.born, &b.born).then_with(|| a.full_name.cmp(&b.full_name))
}

/// Ascending by raw `married` text; dated before undated; ties on identity.
pub fn sort_unions(a: &Union, b: &Union) -> Ordering {
    compare_dated(&a.married, &b.married).then_with(|| a.dir.cmp(&b.dir))
}

fn compare_dated(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (false, false) => a.cmp(b),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

// ============================================================================
// Record store
// ============================================================================

/// In-memory map of person and union records for one build invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    people_by_path: BTreeMap<String, Person>,
    unions_by_dir: BTreeMap<String, Union>,
}

impl RecordStore {
    /// Build the store from parsed source records.
    ///
    /// Malformed records (a person without `full_name`, a union resolving no
    /// partner and holding no child files) are skipped, never fatal. Persons
    /// lacking an id get a generated one; the returned assignment list is the
    /// caller's to persist.
    pub fn from_records(records: &[SourceRecord]) -> (Self, Vec<IdentityAssignment>) {
        let mut store = Self::default();
        let mut assignments = Vec::new();

        for record in records {
            if record.is_union() {
                let dir = parent_dir(&record.path).to_string();
                let partner_paths: Vec<String> = record
                    .refs("partners")
                    .iter()
                    .map(|rel| resolve_ref(&dir, rel))
                    .collect();
                store.unions_by_dir.insert(
                    dir.clone(),
                    Union {
                        id: UnionId(dir.clone()),
                        dir,
                        partner_paths,
                        married: record.scalar("married").to_string(),
                        married_place: record.scalar("married_place").to_string(),
                        ended_by: record.scalar("ended_by").to_string(),
                        notes: record.scalar("notes").to_string(),
                    },
                );
                continue;
            }

            let full_name = record.scalar("full_name");
            if full_name.is_empty() {
                log::warn!("skipping person record without full_name: {}", record.path);
                continue;
            }

            let id = match record.scalar("id") {
                "" => {
                    let generated = PersonId::generate();
                    assignments.push(IdentityAssignment {
                        path: record.path.clone(),
                        id: generated.clone(),
                    });
                    generated
                }
                existing => PersonId(existing.to_string()),
            };

            store.people_by_path.insert(
                record.path.clone(),
                Person {
                    id,
                    path: record.path.clone(),
                    full_name: full_name.to_string(),
                    born: record.scalar("born").to_string(),
                    died: record.scalar("died").to_string(),
                    birth_place: record.scalar("birth_place").to_string(),
                    titles: record.list("titles").to_vec(),
                    external_urls: record.list("external_url").to_vec(),
                    photo: match record.scalar("photo") {
                        "" => None,
                        url => Some(url.to_string()),
                    },
                    notes: record.body.trim().to_string(),
                },
            );
        }

        store.drop_empty_unions();
        (store, assignments)
    }

    /// Drop unions with zero resolved partners and zero candidate children.
    fn drop_empty_unions(&mut self) {
        let empty: Vec<String> = self
            .unions_by_dir
            .values()
            .filter(|union| {
                let no_partner = !union
                    .partner_paths
                    .iter()
                    .any(|p| self.people_by_path.contains_key(p));
                let no_children = !self
                    .people_by_path
                    .keys()
                    .any(|path| parent_dir(path) == union.dir);
                no_partner && no_children
            })
            .map(|union| union.dir.clone())
            .collect();

        for dir in empty {
            log::debug!("dropping union with no partners and no children: {dir}");
            self.unions_by_dir.remove(&dir);
        }
    }

    pub fn person(&self, path: &str) -> Option<&Person> {
        self.people_by_path.get(path)
    }

    pub fn person_by_name(&self, full_name: &str) -> Option<&Person> {
        self.people_by_path
            .values()
            .find(|p| p.full_name == full_name)
    }

    /// All persons in path order (deterministic).
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people_by_path.values()
    }

    /// All unions in directory order (deterministic).
    pub fn unions(&self) -> impl Iterator<Item = &Union> {
        self.unions_by_dir.values()
    }

    /// Persons stored directly in the source root, by the person sort law.
    pub fn top_level_people(&self) -> Vec<&Person> {
        let mut people: Vec<&Person> = self
            .people_by_path
            .values()
            .filter(|p| parent_dir(&p.path).is_empty())
            .collect();
        people.sort_by(|a, b| sort_people(a, b));
        people
    }

    /// Unions whose directory sits directly in the source root, by the union
    /// sort law.
    pub fn top_level_unions(&self) -> Vec<&Union> {
        let mut unions: Vec<&Union> = self
            .unions_by_dir
            .values()
            .filter(|u| parent_dir(&u.dir).is_empty())
            .collect();
        unions.sort_by(|a, b| sort_unions(a, b));
        unions
    }

    pub fn total_people(&self) -> usize {
        self.people_by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people_by_path.is_empty()
    }
}
