use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

use memchr::memchr_iter;

/// Group-by that keeps keys in first-appearance order.
///
/// Ranking helpers rely on this order to break ties.
#[derive(Debug)]
pub struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> OrderedGroups<K, V>
where
    K: Hash + Eq + Clone,
    V: AddAssign + Copy,
{
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K, V> Default for OrderedGroups<K, V>
where
    K: Hash + Eq + Clone,
    V: AddAssign + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedGroups<K, V>
where
    K: Hash + Eq + Clone,
    V: AddAssign + Copy,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut groups = OrderedGroups::new();
        for (k, v) in iter {
            groups.add(k, v);
        }
        groups
    }
}

/// Counts occurrences of each key, first-appearance order
pub fn value_counts<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Hash + Eq + Clone,
    I: IntoIterator<Item = K>,
{
    keys.into_iter()
        .map(|k| (k, 1usize))
        .collect::<OrderedGroups<_, _>>()
        .into_entries()
}

/// Stable descending sort by value, truncated to `n`.
///
/// Equal values keep their input order.
pub fn top_n<K, V: PartialOrd>(mut entries: Vec<(K, V)>, n: usize) -> Vec<(K, V)> {
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries.truncate(n);
    entries
}

/// Splits a packed investors cell into trimmed, non-empty names
pub fn split_investors(field: &str) -> impl Iterator<Item = &str> {
    let bytes = field.as_bytes();
    let mut start = 0;
    memchr_iter(b',', bytes)
        .chain(std::iter::once(bytes.len()))
        .map(move |end| {
            // ',' is ASCII so `start..end` always lands on char boundaries
            let piece = &field[start..end];
            start = end + 1;
            piece.trim()
        })
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let groups: OrderedGroups<&str, f64> =
            [("b", 1.0), ("a", 2.0), ("b", 3.0)].into_iter().collect();
        assert_eq!(groups.into_entries(), vec![("b", 4.0), ("a", 2.0)]);
    }

    #[test]
    fn test_top_n_stable_ties() {
        let ranked = top_n(vec![("x", 1), ("y", 3), ("z", 1), ("w", 3)], 3);
        assert_eq!(ranked, vec![("y", 3), ("w", 3), ("x", 1)]);
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(["seed", "series a", "seed"]);
        assert_eq!(counts, vec![("seed", 2), ("series a", 1)]);
    }

    #[test]
    fn test_split_investors() {
        let names: Vec<&str> = split_investors("Sequoia Capital, Accel,,  Tiger Global ").collect();
        assert_eq!(names, vec!["Sequoia Capital", "Accel", "Tiger Global"]);
        assert_eq!(split_investors("").count(), 0);
        assert_eq!(split_investors("Solo").collect::<Vec<_>>(), vec!["Solo"]);
    }
}
