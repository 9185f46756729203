//! Aggregate progression statistics.

use crate::id::{Category, Tier};
use serde::Serialize;
use std::collections::BTreeMap;

/// Node-state counts over some subset of the catalog.
///
/// `available`, `affordable` and `blocked` only count locked skills, so
/// `unlocked + blocked + (locked with prerequisites met)` equals `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub total: usize,
    pub unlocked: usize,
    /// Prerequisites met and affordable.
    pub available: usize,
    /// Cost within XP, prerequisites ignored.
    pub affordable: usize,
    /// At least one prerequisite missing.
    pub blocked: usize,
}

impl StateCounts {
    /// `unlocked / total * 100`, or 0 for an empty subset.
    pub fn completion_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.unlocked as f64 / self.total as f64 * 100.0
        }
    }
}

/// Counts for the whole catalog and broken down by category and tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressionStats {
    pub overall: StateCounts,
    pub by_category: BTreeMap<Category, StateCounts>,
    pub by_tier: BTreeMap<Tier, StateCounts>,
    pub completion_percent: f64,
    /// Successful unlocks since the engine was created.
    pub unlocks_performed: u64,
    /// Successful undos since the engine was created.
    pub undos_performed: u64,
}

/// Short progress summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub unlocked: usize,
    pub total: usize,
    pub percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_of_empty_subset_is_zero() {
        assert_eq!(StateCounts::default().completion_percent(), 0.0);
    }

    #[test]
    fn completion_percent() {
        let counts = StateCounts {
            total: 8,
            unlocked: 2,
            ..StateCounts::default()
        };
        assert_eq!(counts.completion_percent(), 25.0);
    }
}
