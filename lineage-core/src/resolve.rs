//! Relationship resolver: unions of a person, children of a union.
//!
//! Children are not listed in the union record; they are the sibling person
//! files of the union. That leaves one ambiguity: a spouse who married into
//! the family is stored in the same directory as the blood children. Such
//! records are recognized by their role across the unions nested under this
//! one: someone who only ever appears in the second partner slot is treated
//! as spouse-only and excluded from the child list.

use crate::record::{parent_dir, sort_people, sort_unions, Person, RecordStore, Union};
use std::collections::HashMap;

/// How often a person occupies each partner slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCount {
    pub first: u32,
    pub second: u32,
}

impl RoleCount {
    /// Spouse-only heuristic: seen in the second slot, never in the first.
    pub fn second_only(&self) -> bool {
        self.second > 0 && self.first == 0
    }
}

/// Read-only relationship queries over one record store.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    store: &'a RecordStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a RecordStore {
        self.store
    }

    /// Unions that list `person_path` as a partner, stored in directories
    /// next to the person's file, sorted by marriage date.
    pub fn unions_for_person(&self, person_path: &str) -> Vec<&'a Union> {
        let person_dir = parent_dir(person_path);
        let mut unions: Vec<&Union> = self
            .store
            .unions()
            .filter(|u| parent_dir(&u.dir) == person_dir)
            .filter(|u| u.partner_paths.iter().any(|p| p == person_path))
            .collect();
        unions.sort_by(|a, b| sort_unions(a, b));
        unions
    }

    /// Blood children of a union: sibling person files minus the partners,
    /// minus spouse-only records, sorted by birth date.
    pub fn children_of_union(&self, union: &Union) -> Vec<&'a Person> {
        let roles = self.nested_role_counts(&union.dir);

        let mut children: Vec<&Person> = self
            .store
            .people()
            .filter(|p| parent_dir(&p.path) == union.dir)
            .filter(|p| !union.partner_paths.iter().any(|partner| *partner == p.path))
            .filter(|p| !roles.get(p.path.as_str()).is_some_and(RoleCount::second_only))
            .collect();
        children.sort_by(|a, b| sort_people(a, b));
        children
    }

    /// Partner-slot tallies across the unions nested directly under `dir`.
    fn nested_role_counts(&self, dir: &str) -> HashMap<&'a str, RoleCount> {
        let mut roles: HashMap<&str, RoleCount> = HashMap::new();
        for nested in self.store.unions().filter(|u| parent_dir(&u.dir) == dir) {
            if let Some(first) = nested.partner_paths.first() {
                roles.entry(first).or_default().first += 1;
            }
            if let Some(second) = nested.partner_paths.get(1) {
                roles.entry(second).or_default().second += 1;
            }
        }
        roles
    }
}
