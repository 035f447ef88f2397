//! Reuse of per-leaf outputs across updates of composite inputs.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::dataset::DataObject;

#[derive(Debug)]
struct Entry {
    input: Weak<DataObject>,
    input_mtime: u64,
    output: Arc<DataObject>,
    used: bool,
}

impl Entry {
    fn is_valid_for(&self, input: &Arc<DataObject>) -> bool {
        self.input
            .upgrade()
            .is_some_and(|held| Arc::ptr_eq(&held, input) && input.mtime() <= self.input_mtime)
    }
}

/// Maps input leaves (by depth-first leaf index) to the outputs computed from them.
///
/// An entry is served only while it was computed from the same input leaf and that leaf
/// has not been modified since. Call [`DataObjectCache::finalize`] after each pass to drop
/// entries the pass did not touch.
#[derive(Debug, Default)]
pub struct DataObjectCache {
    entries: BTreeMap<usize, Entry>,
}

impl DataObjectCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for leaf `index` computed from `input`, if still valid. Marks it used.
    pub fn find(&mut self, index: usize, input: &Arc<DataObject>) -> Option<Arc<DataObject>> {
        let entry = self.entries.get_mut(&index)?;
        if !entry.is_valid_for(input) {
            return None;
        }
        entry.used = true;
        Some(Arc::clone(&entry.output))
    }

    /// `true` when leaf `index` has an entry (valid or not).
    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// Record `output` as the result for leaf `index` computed from `input`.
    pub fn update(&mut self, index: usize, input: &Arc<DataObject>, output: Arc<DataObject>) {
        self.entries.insert(
            index,
            Entry {
                input: Arc::downgrade(input),
                input_mtime: input.mtime(),
                output,
                used: true,
            },
        );
    }

    /// Drop entries not used since the previous call; returns how many were dropped.
    pub fn finalize(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.used);
        for e in self.entries.values_mut() {
            e.used = false;
        }
        before - self.entries.len()
    }

    /// Entries whose input leaf is gone or has been modified.
    pub fn invalid_items(&self) -> usize {
        self.entries
            .values()
            .filter(|e| match e.input.upgrade() {
                Some(input) => input.mtime() > e.input_mtime,
                None => true,
            })
            .count()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` without entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/composite_cache.rs"]
mod tests;
