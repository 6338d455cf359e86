use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Record of every variable vector a solve has committed to
///
/// Each entry additionally carries a `searched` flag, set once the exact
/// vector was recorded as feasible and fine-tuned from. Lives for one solve.
#[derive(Default, Debug)]
pub struct VisitedSet {
    /// Vector to searched-flag mapping
    entries: HashMap<Vec<u64>, bool>,

    /// Lookup statistics
    pub stats: VisitStats,
}

/// Counters describing how often the search revisited a point
#[derive(Default, Debug)]
pub struct VisitStats {
    /// Lookups that found an existing entry
    pub revisits: usize,
    /// Entries created
    pub inserts: usize,
}

impl VisitedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vector as explored
    ///
    /// Returns `true` if the vector had not been seen before.
    pub fn insert(&mut self, values: &[u64]) -> bool {
        match self.entries.entry(values.to_vec()) {
            Entry::Occupied(_) => {
                self.stats.revisits += 1;
                false
            }
            Entry::Vacant(entry) => {
                self.stats.inserts += 1;
                entry.insert(false);
                true
            }
        }
    }

    /// Test whether a vector was explored
    pub fn contains(&self, values: &[u64]) -> bool {
        self.entries.contains_key(values)
    }

    /// Mark a vector as feasible and fully processed, inserting it if needed
    pub fn mark_searched(&mut self, values: &[u64]) {
        match self.entries.get_mut(values) {
            Some(searched) => *searched = true,
            None => {
                self.stats.inserts += 1;
                self.entries.insert(values.to_vec(), true);
            }
        }
    }

    /// Test whether a vector was previously marked as searched
    pub fn is_searched(&self, values: &[u64]) -> bool {
        self.entries.get(values).copied().unwrap_or(false)
    }

    /// Number of distinct vectors explored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Test if nothing has been explored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
