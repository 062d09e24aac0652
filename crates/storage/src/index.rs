//! Secondary indices for the document store
//!
//! - UniqueIndex: Maps a unique field value (contact, email) → owning DocId
//! - OwnerIndex: Maps patient DocId → Set<record DocId> for per-patient queries
//!
//! Neither index is thread-safe on its own; the store wraps them in locks.

use healthtrack_core::DocId;
use std::collections::{HashMap, HashSet};

/// Secondary index: unique field value → DocId
///
/// Enforces that at most one document owns a given value. `claim` is the
/// authoritative uniqueness check: the store calls it under the same lock
/// as the write it guards.
#[derive(Debug, Default)]
pub struct UniqueIndex {
    index: HashMap<String, DocId>,
}

impl UniqueIndex {
    /// Create a new empty UniqueIndex
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    /// Owner of `value`, if any
    pub fn owner(&self, value: &str) -> Option<DocId> {
        self.index.get(value).copied()
    }

    /// Is `value` free for document `id`?
    ///
    /// A value already owned by `id` itself counts as free, so a document
    /// can be rewritten without releasing its own keys first.
    pub fn is_available(&self, value: &str, id: DocId) -> bool {
        self.owner(value).map_or(true, |owner| owner == id)
    }

    /// Record `id` as the owner of `value`.
    ///
    /// Returns false (and changes nothing) if another document owns it.
    pub fn claim(&mut self, value: &str, id: DocId) -> bool {
        if !self.is_available(value, id) {
            return false;
        }
        self.index.insert(value.to_string(), id);
        true
    }

    /// Drop `value` if it is owned by `id`.
    pub fn release(&mut self, value: &str, id: DocId) {
        if self.owner(value) == Some(id) {
            self.index.remove(value);
        }
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the number of claimed values
    pub fn len(&self) -> usize {
        self.index.len()
    }
}

/// Secondary index: patient DocId → record DocIds
///
/// Changes records_for_patient from O(total records) to O(patient records).
#[derive(Debug, Default)]
pub struct OwnerIndex {
    index: HashMap<DocId, HashSet<DocId>>,
}

impl OwnerIndex {
    /// Create a new empty OwnerIndex
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    /// Add a record to its owner's set
    pub fn insert(&mut self, owner: DocId, record: DocId) {
        self.index.entry(owner).or_default().insert(record);
    }

    /// Remove a record from its owner's set.
    ///
    /// If the set becomes empty, removes the owner entry entirely
    /// to avoid accumulating empty sets.
    pub fn remove(&mut self, owner: DocId, record: &DocId) {
        if let Some(records) = self.index.get_mut(&owner) {
            records.remove(record);
            if records.is_empty() {
                self.index.remove(&owner);
            }
        }
    }

    /// Get all record ids for an owner
    pub fn get(&self, owner: &DocId) -> Option<&HashSet<DocId>> {
        self.index.get(owner)
    }

    /// Number of records owned by `owner`
    pub fn count(&self, owner: &DocId) -> usize {
        self.get(owner).map_or(0, HashSet::len)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the number of owners in the index
    pub fn len(&self) -> usize {
        self.index.len()
    }
}
