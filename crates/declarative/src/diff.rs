//! Diff computation between desired and live state

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Remove duplicates from a sequence, keeping the first occurrence
pub fn dedup<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Difference between a desired and a live set
///
/// Both sides are ordered: `to_add` follows the desired order and
/// `to_remove` follows the live order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiff<T> {
    /// Entries desired but not live
    pub to_add: Vec<T>,
    /// Entries live but not desired
    pub to_remove: Vec<T>,
}

impl<T> SetDiff<T>
where
    T: Eq + Hash + Clone,
{
    /// Compute `desired - live` and `live - desired`
    pub fn compute(desired: &[T], live: &[T]) -> Self {
        let desired_set: HashSet<&T> = desired.iter().collect();
        let live_set: HashSet<&T> = live.iter().collect();

        Self {
            to_add: dedup(desired.iter().filter(|d| !live_set.contains(d)).cloned()),
            to_remove: dedup(live.iter().filter(|l| !desired_set.contains(l)).cloned()),
        }
    }
}

/// Difference between a desired and a live mapping
///
/// A key present on both sides with a different value is an overwrite and
/// lands in `to_add`, never in `to_remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDiff<K: Ord, V> {
    /// Entries to set (new keys and changed values)
    pub to_add: BTreeMap<K, V>,
    /// Keys live but not desired
    pub to_remove: Vec<K>,
}

impl<K, V> MapDiff<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    /// Compute the overwrite/remove split between two mappings
    pub fn compute(desired: &BTreeMap<K, V>, live: &BTreeMap<K, V>) -> Self {
        let to_add = desired
            .iter()
            .filter(|(key, value)| live.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let to_remove = live
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .cloned()
            .collect();

        Self { to_add, to_remove }
    }
}

/// Change detection for a single value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarDiff<T> {
    /// Live already matches, or nothing is desired
    Unchanged,
    /// Live differs from desired
    Changed { from: Option<T>, to: T },
}

impl<T: PartialEq + Clone> ScalarDiff<T> {
    /// Compare a desired value with the live one
    ///
    /// An absent desired value never produces a change.
    pub fn compute(desired: Option<&T>, live: Option<&T>) -> Self {
        match desired {
            Some(to) if live != Some(to) => Self::Changed {
                from: live.cloned(),
                to: to.clone(),
            },
            _ => Self::Unchanged,
        }
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Number of entries to add or overwrite
    pub additions: usize,
    /// Number of entries to remove
    pub removals: usize,
}

impl DiffSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl<T> From<&SetDiff<T>> for DiffSummary {
    fn from(diff: &SetDiff<T>) -> Self {
        Self {
            additions: diff.to_add.len(),
            removals: diff.to_remove.len(),
        }
    }
}

impl<K: Ord, V> From<&MapDiff<K, V>> for DiffSummary {
    fn from(diff: &MapDiff<K, V>) -> Self {
        Self {
            additions: diff.to_add.len(),
            removals: diff.to_remove.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup(strings(&["b", "a", "b", "c", "a"])), strings(&["b", "a", "c"]));
    }

    #[test]
    fn test_set_diff_domains() {
        let live = strings(&["a.com", "b.com"]);
        let desired = strings(&["b.com", "c.com"]);

        let diff = SetDiff::compute(&desired, &live);
        assert_eq!(diff.to_add, strings(&["c.com"]));
        assert_eq!(diff.to_remove, strings(&["a.com"]));
    }

    #[test]
    fn test_set_diff_identical_is_empty() {
        let both = strings(&["x", "y"]);
        let diff = SetDiff::compute(&both, &both);
        assert!(!DiffSummary::from(&diff).has_changes());
    }

    #[test]
    fn test_set_diff_sides_are_disjoint() {
        let desired = strings(&["a", "b", "b"]);
        let live = strings(&["b", "c", "c"]);
        let diff = SetDiff::compute(&desired, &live);
        assert_eq!(diff.to_add, strings(&["a"]));
        assert_eq!(diff.to_remove, strings(&["c"]));
    }

    #[test]
    fn test_map_diff_equal_values_emit_nothing() {
        let desired = BTreeMap::from([("FOO".to_string(), "1".to_string())]);
        let live = desired.clone();
        assert!(!DiffSummary::from(&MapDiff::compute(&desired, &live)).has_changes());
    }

    #[test]
    fn test_map_diff_changed_value_is_overwrite() {
        let desired = BTreeMap::from([("FOO".to_string(), "2".to_string())]);
        let live = BTreeMap::from([("FOO".to_string(), "1".to_string())]);

        let diff = MapDiff::compute(&desired, &live);
        assert_eq!(diff.to_add.get("FOO").map(String::as_str), Some("2"));
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_map_diff_live_only_key_is_removal() {
        let desired = BTreeMap::from([("A".to_string(), "1".to_string())]);
        let live = BTreeMap::from([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "2".to_string()),
        ]);

        let diff = MapDiff::compute(&desired, &live);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, vec!["B".to_string()]);
    }

    #[test]
    fn test_scalar_diff() {
        let x = "x".to_string();
        let y = "y".to_string();

        assert_eq!(
            ScalarDiff::compute(Some(&x), Some(&y)),
            ScalarDiff::Changed {
                from: Some(y.clone()),
                to: x.clone()
            }
        );
        assert_eq!(ScalarDiff::compute(Some(&x), Some(&x)), ScalarDiff::Unchanged);
        assert_eq!(ScalarDiff::<String>::compute(None, Some(&y)), ScalarDiff::Unchanged);
        assert!(matches!(
            ScalarDiff::compute(Some(&x), None),
            ScalarDiff::Changed { from: None, .. }
        ));
    }

    #[test]
    fn test_diff_summary() {
        let diff = SetDiff::compute(&strings(&["a", "b"]), &strings(&["c"]));
        let summary = DiffSummary::from(&diff);
        assert_eq!(summary.additions, 2);
        assert_eq!(summary.removals, 1);
        assert!(summary.has_changes());
        assert_eq!(summary.total(), 3);
    }
}
