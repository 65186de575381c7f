//! Eviction policies for [`BoundedCache`](super::BoundedCache)

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

/// Bookkeeping that decides which entry leaves a full cache.
///
/// The cache calls exactly one hook per event. Keys handed to `on_access`
/// and `on_remove` are always present in the policy.
pub trait EvictionPolicy<K>: Debug + Default + Send {
    /// A new key was admitted
    fn on_insert(&mut self, key: &K);

    /// An existing key was read or overwritten
    fn on_access(&mut self, key: &K);

    /// A key left the cache
    fn on_remove(&mut self, key: &K);

    /// The key that should be evicted next, if any
    fn victim(&self) -> Option<K>;

    /// Keys ordered oldest first, used when exporting
    fn ordered_keys(&self) -> Vec<K>;

    /// Forget all bookkeeping
    fn clear(&mut self);
}

/// Least-recently-used ordering.
///
/// Every get or put stamps the key with a strictly increasing tick, so ties
/// cannot happen.
#[derive(Debug)]
pub struct RecencyPolicy<K> {
    tick: u64,
    stamps: HashMap<K, u64>,
    order: BTreeMap<u64, K>,
}

impl<K> Default for RecencyPolicy<K> {
    fn default() -> Self {
        Self {
            tick: 0,
            stamps: HashMap::new(),
            order: BTreeMap::new(),
        }
    }
}

impl<K> RecencyPolicy<K>
where
    K: Clone + Eq + Hash,
{
    fn touch(&mut self, key: &K) {
        self.tick += 1;

        if let Some(previous) = self.stamps.insert(key.clone(), self.tick) {
            self.order.remove(&previous);
        }

        self.order.insert(self.tick, key.clone());
    }
}

impl<K> EvictionPolicy<K> for RecencyPolicy<K>
where
    K: Clone + Eq + Hash + Debug + Send,
{
    fn on_insert(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_remove(&mut self, key: &K) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    fn victim(&self) -> Option<K> {
        self.order.values().next().cloned()
    }

    fn ordered_keys(&self) -> Vec<K> {
        self.order.values().cloned().collect()
    }

    fn clear(&mut self) {
        self.stamps.clear();
        self.order.clear();
    }
}

/// Least-frequently-used ordering with oldest-insertion tie break.
///
/// Entries are ranked by `(count, insertion sequence)`; the smallest rank is
/// the victim.
#[derive(Debug)]
pub struct FrequencyPolicy<K> {
    next_seq: u64,
    ranks: HashMap<K, (u64, u64)>,
    order: BTreeSet<(u64, u64, K)>,
}

impl<K> Default for FrequencyPolicy<K> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            ranks: HashMap::new(),
            order: BTreeSet::new(),
        }
    }
}

impl<K> FrequencyPolicy<K>
where
    K: Clone + Eq + Hash + Ord,
{
    /// Current access count of a key
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.ranks.get(key).map(|(count, _)| *count)
    }
}

impl<K> EvictionPolicy<K> for FrequencyPolicy<K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send,
{
    fn on_insert(&mut self, key: &K) {
        let rank = (1, self.next_seq);
        self.next_seq += 1;
        self.ranks.insert(key.clone(), rank);
        self.order.insert((rank.0, rank.1, key.clone()));
    }

    fn on_access(&mut self, key: &K) {
        if let Some(rank) = self.ranks.get_mut(key) {
            self.order.remove(&(rank.0, rank.1, key.clone()));
            rank.0 = rank.0.saturating_add(1);
            self.order.insert((rank.0, rank.1, key.clone()));
        }
    }

    fn on_remove(&mut self, key: &K) {
        if let Some((count, seq)) = self.ranks.remove(key) {
            self.order.remove(&(count, seq, key.clone()));
        }
    }

    fn victim(&self) -> Option<K> {
        self.order.iter().next().map(|(_, _, key)| key.clone())
    }

    fn ordered_keys(&self) -> Vec<K> {
        let mut by_insertion: Vec<(&u64, &K)> =
            self.ranks.iter().map(|(key, (_, seq))| (seq, key)).collect();
        by_insertion.sort_by_key(|(seq, _)| **seq);
        by_insertion.into_iter().map(|(_, key)| key.clone()).collect()
    }

    fn clear(&mut self) {
        self.ranks.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_victim_is_least_recent() {
        let mut policy = RecencyPolicy::default();
        policy.on_insert(&"a");
        policy.on_insert(&"b");
        policy.on_insert(&"c");
        policy.on_access(&"a");

        assert_eq!(policy.victim(), Some("b"));
        assert_eq!(policy.ordered_keys(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_recency_remove() {
        let mut policy = RecencyPolicy::default();
        policy.on_insert(&"a");
        policy.on_insert(&"b");
        policy.on_remove(&"a");

        assert_eq!(policy.victim(), Some("b"));
        policy.on_remove(&"b");
        assert_eq!(policy.victim(), None);
    }

    #[test]
    fn test_frequency_victim_is_least_frequent() {
        let mut policy = FrequencyPolicy::default();
        policy.on_insert(&"a");
        policy.on_insert(&"b");
        policy.on_access(&"a");

        assert_eq!(policy.victim(), Some("b"));
        assert_eq!(policy.frequency(&"a"), Some(2));
    }

    #[test]
    fn test_frequency_tie_breaks_on_oldest_insert() {
        let mut policy = FrequencyPolicy::default();
        policy.on_insert(&"late");
        policy.on_insert(&"later");
        policy.on_access(&"late");
        policy.on_access(&"later");

        assert_eq!(policy.victim(), Some("late"));
    }

    #[test]
    fn test_frequency_ordered_keys_follow_insertion() {
        let mut policy = FrequencyPolicy::default();
        policy.on_insert(&"x");
        policy.on_insert(&"y");
        policy.on_insert(&"z");
        policy.on_access(&"x");
        policy.on_access(&"x");

        assert_eq!(policy.ordered_keys(), vec!["x", "y", "z"]);
    }
}
