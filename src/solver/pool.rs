use crate::io::error::{Result, invalid_input, try_buffer};
use crate::math::float::tolerance_band;
use std::cmp::Ordering;

/// Immutable snapshot of one feasible assignment
#[derive(Clone, Debug, PartialEq)]
pub struct VarVal {
    /// Variable values in declaration order
    pub values: Vec<u64>,
    /// Objective value (lower is better)
    pub objective: f64,
    /// Remaining capacity of the tightest buffer constraint
    pub slack: f64,
}

impl VarVal {
    /// Rank two snapshots by objective, then by slack
    ///
    /// Objectives falling in the same tolerance band are treated as equal, in
    /// which case the smaller slack (denser buffer use) ranks first. The order
    /// is total: no entry ranks ahead of one whose objective is more than the
    /// tolerance smaller.
    pub fn rank(&self, other: &Self) -> Ordering {
        tolerance_band(self.objective)
            .total_cmp(&tolerance_band(other.objective))
            .then_with(|| self.slack.total_cmp(&other.slack))
    }
}

/// Bounded, rank-ordered collection of the best feasible assignments seen
///
/// Entries stay sorted ascending by `(objective, slack)`. A full pool only
/// accepts candidates that beat its current worst entry, and evicts that entry.
#[derive(Debug)]
pub struct SolutionPool {
    entries: Vec<VarVal>,
    top_n: usize,
}

impl SolutionPool {
    /// Create an empty pool holding at most `top_n` entries
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero capacity and `Allocation` if the
    /// backing buffer cannot be reserved
    pub fn new(top_n: usize) -> Result<Self> {
        if top_n == 0 {
            return Err(invalid_input("top_n", &top_n, &"pool must hold at least one solution"));
        }
        // One extra slot so insertion never reallocates before eviction
        let entries = try_buffer("solution pool", top_n + 1)?;
        Ok(Self { entries, top_n })
    }

    /// Offer a candidate to the pool
    ///
    /// Returns `true` if the candidate was kept. Duplicate vectors are ignored.
    pub fn insert(&mut self, candidate: VarVal) -> bool {
        if self
            .entries
            .iter()
            .any(|entry| entry.values == candidate.values)
        {
            return false;
        }

        if self.entries.len() >= self.top_n
            && self
                .entries
                .last()
                .is_some_and(|worst| candidate.rank(worst) != Ordering::Less)
        {
            return false;
        }

        // Equal-ranked entries keep insertion order
        let position = self
            .entries
            .iter()
            .position(|entry| candidate.rank(entry) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, candidate);
        self.entries.truncate(self.top_n);
        true
    }

    /// Best entry, if any
    pub fn best(&self) -> Option<&VarVal> {
        self.entries.first()
    }

    /// Entries from best to worst
    pub fn entries(&self) -> &[VarVal] {
        &self.entries
    }

    /// Consume the pool, yielding entries from best to worst
    pub fn into_entries(self) -> Vec<VarVal> {
        self.entries
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Test if the pool holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.top_n
    }
}
