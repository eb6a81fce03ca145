//! Fixture helpers for building record collections in tests.
//!
//! Source collections are directory-shaped: persons are markdown files,
//! unions are `_marriage.md` files inside their own directory. These helpers
//! build the parsed [`SourceRecord`] form of that shape without touching a
//! file system.

use crate::record::{SourceRecord, UNION_FILE_NAME};

/// A person record at `path` with a name and a free-text birth date.
///
/// Pass an empty `born` for an undated person. Identity is left absent so
/// the store's identity pre-pass kicks in; chain
/// [`SourceRecord::with_scalar`] to pin one.
pub fn person_record(path: &str, full_name: &str, born: &str) -> SourceRecord {
    let mut record = SourceRecord::new(path).with_scalar("full_name", full_name);
    if !born.is_empty() {
        record = record.with_scalar("born", born);
    }
    record
}

/// A union record in directory `dir` with partner refs relative to that
/// directory (e.g. `"../anna.md"`) and a free-text marriage date.
pub fn union_record(dir: &str, partner_refs: &[&str], married: &str) -> SourceRecord {
    let mut record = SourceRecord::new(format!("{dir}/{UNION_FILE_NAME}")).with_refs(
        "partners",
        partner_refs.iter().map(|r| r.to_string()).collect(),
    );
    if !married.is_empty() {
        record = record.with_scalar("married", married);
    }
    record
}

/// A minimal three-person family: `p1.md` and `p2.md` partnered in the
/// sibling union directory `m1`, with child `m1/c1.md`. The shape used by
/// most scenario tests.
pub fn small_family() -> Vec<SourceRecord> {
    vec![
        person_record("p1.md", "P One", "1950").with_scalar("id", "p1"),
        person_record("p2.md", "P Two", "1952").with_scalar("id", "p2"),
        union_record("m1", &["../p1.md", "../p2.md"], "1974"),
        person_record("m1/c1.md", "C One", "1976").with_scalar("id", "c1"),
    ]
}
