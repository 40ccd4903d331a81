//! Per-status dwell accounting.
//!
//! A [`StatusDwell`] maps every status an issue has visited to the total
//! seconds spent in it. Each transition produces a new map with the elapsed
//! interval charged to the status that was active during it, so the sum over
//! all entries always equals the issue's age.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Status name to cumulative seconds spent in that status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusDwell(BTreeMap<String, i64>);

impl StatusDwell {
    /// A map holding a single zero-duration entry for the initial status.
    #[must_use]
    pub fn seed(status: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(status.to_string(), 0);
        Self(map)
    }

    /// Return a new map with `seconds` charged to `status`.
    ///
    /// The entry is created at zero when `status` has not been seen before.
    /// `self` is left untouched.
    #[must_use]
    pub fn advance(&self, status: &str, seconds: i64) -> Self {
        let mut map = self.0.clone();
        *map.entry(status.to_string()).or_insert(0) += seconds;
        Self(map)
    }

    /// Seconds recorded for `status`, zero when never visited.
    #[must_use]
    pub fn get(&self, status: &str) -> i64 {
        self.0.get(status).copied().unwrap_or(0)
    }

    /// Sum over every status; equals the issue age.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.0.values().sum()
    }

    /// Sum over the statuses in `statuses`.
    #[must_use]
    pub fn sum_of(&self, statuses: &BTreeSet<String>) -> i64 {
        self.0
            .iter()
            .filter(|(status, _)| statuses.contains(*status))
            .map(|(_, seconds)| seconds)
            .sum()
    }

    #[must_use]
    pub fn contains(&self, status: &str) -> bool {
        self.0.contains_key(status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(status, seconds)| (status.as_str(), *seconds))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
