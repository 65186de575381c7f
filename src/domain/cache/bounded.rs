//! Generic capacity-bounded cache

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::policy::{EvictionPolicy, FrequencyPolicy, RecencyPolicy};
use crate::domain::DomainError;

/// Least-recently-used cache
pub type RecencyCache<K, V> = BoundedCache<K, V, RecencyPolicy<K>>;

/// Least-frequently-used cache
pub type FrequencyCache<K, V> = BoundedCache<K, V, FrequencyPolicy<K>>;

#[derive(Debug)]
struct Inner<K, V, P> {
    entries: HashMap<K, V>,
    policy: P,
}

/// Thread-safe associative container holding at most `capacity` entries
///
/// All operations on one instance are serialized by a single mutex; the lock
/// is never held across an await point. A capacity of zero turns every `put`
/// into a no-op.
#[derive(Debug)]
pub struct BoundedCache<K, V, P> {
    inner: Mutex<Inner<K, V, P>>,
    capacity: usize,
}

impl<K, V, P> BoundedCache<K, V, P>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone,
    P: EvictionPolicy<K>,
{
    /// Creates an empty cache
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                policy: P::default(),
            }),
            capacity,
        }
    }

    /// Creates a cache seeded from an ordered mapping
    pub fn with_entries(capacity: usize, entries: Vec<(K, V)>) -> Result<Self, DomainError> {
        let cache = Self::new(capacity);
        cache.import(entries)?;
        Ok(cache)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<K, V, P>>, DomainError> {
        self.inner
            .lock()
            .map_err(|e| DomainError::cache(format!("Failed to acquire cache lock: {}", e)))
    }

    /// Returns a copy of the value and records the access
    pub fn get(&self, key: &K) -> Result<Option<V>, DomainError> {
        let mut inner = self.lock()?;
        let value = inner.entries.get(key).cloned();

        if value.is_some() {
            inner.policy.on_access(key);
        }

        Ok(value)
    }

    /// Inserts or overwrites a value, evicting one entry if a new key arrives at capacity
    pub fn put(&self, key: K, value: V) -> Result<(), DomainError> {
        let mut inner = self.lock()?;
        Self::put_locked(&mut inner, self.capacity, key, value);
        Ok(())
    }

    /// Atomically transforms the value stored under `key`
    ///
    /// `f` receives the current value (if any) and returns the replacement.
    /// The whole read-modify-write happens under the instance lock and counts
    /// as a single access.
    pub fn update<F>(&self, key: K, f: F) -> Result<V, DomainError>
    where
        F: FnOnce(Option<V>) -> V,
    {
        let mut inner = self.lock()?;
        let current = inner.entries.get(&key).cloned();
        let next = f(current);
        Self::put_locked(&mut inner, self.capacity, key, next.clone());
        Ok(next)
    }

    /// Checks for a key without counting an access
    pub fn contains(&self, key: &K) -> Result<bool, DomainError> {
        Ok(self.lock()?.entries.contains_key(key))
    }

    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of all entries, oldest first according to the policy
    pub fn export(&self) -> Result<Vec<(K, V)>, DomainError> {
        let inner = self.lock()?;

        Ok(inner
            .policy
            .ordered_keys()
            .into_iter()
            .filter_map(|key| inner.entries.get(&key).cloned().map(|value| (key, value)))
            .collect())
    }

    /// Replaces the contents with an ordered mapping
    ///
    /// Eviction metadata is reseeded from the mapping order; frequency counts
    /// restart at the baseline.
    pub fn import(&self, entries: Vec<(K, V)>) -> Result<(), DomainError> {
        let mut inner = self.lock()?;
        inner.entries.clear();
        inner.policy.clear();

        for (key, value) in entries {
            Self::put_locked(&mut inner, self.capacity, key, value);
        }

        Ok(())
    }

    fn put_locked(inner: &mut Inner<K, V, P>, capacity: usize, key: K, value: V) {
        if inner.entries.contains_key(&key) {
            inner.policy.on_access(&key);
            inner.entries.insert(key, value);
            return;
        }

        if capacity == 0 {
            trace!(key = ?key, "Zero-capacity cache, dropping entry");
            return;
        }

        if inner.entries.len() >= capacity {
            if let Some(victim) = inner.policy.victim() {
                trace!(key = ?victim, "Evicting cache entry");
                inner.entries.remove(&victim);
                inner.policy.on_remove(&victim);
            }
        }

        inner.policy.on_insert(&key);
        inner.entries.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn keys<V>(entries: &[(String, V)]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_recency_put_and_get() {
        let cache: RecencyCache<String, i32> = BoundedCache::new(2);
        cache.put("a".to_string(), 1).unwrap();

        assert_eq!(cache.get(&"a".to_string()).unwrap(), Some(1));
        assert_eq!(cache.get(&"missing".to_string()).unwrap(), None);
    }

    #[test]
    fn test_recency_keeps_most_recent_keys() {
        let cache: RecencyCache<String, i32> = BoundedCache::new(2);
        cache.put("h1".to_string(), 1).unwrap();
        cache.put("h2".to_string(), 2).unwrap();
        cache.put("h3".to_string(), 3).unwrap();

        assert_eq!(keys(&cache.export().unwrap()), vec!["h2", "h3"]);
        assert_eq!(cache.len().unwrap(), 2);
    }

    #[test]
    fn test_recency_get_promotes() {
        let cache: RecencyCache<String, i32> = BoundedCache::new(2);
        cache.put("a".to_string(), 1).unwrap();
        cache.put("b".to_string(), 2).unwrap();
        cache.get(&"a".to_string()).unwrap();
        cache.put("c".to_string(), 3).unwrap();

        assert!(cache.contains(&"a".to_string()).unwrap());
        assert!(!cache.contains(&"b".to_string()).unwrap());
    }

    #[test]
    fn test_recency_overwrite_promotes_without_eviction() {
        let cache: RecencyCache<String, i32> = BoundedCache::new(2);
        cache.put("a".to_string(), 1).unwrap();
        cache.put("b".to_string(), 2).unwrap();
        cache.put("a".to_string(), 10).unwrap();

        assert_eq!(cache.len().unwrap(), 2);
        assert_eq!(keys(&cache.export().unwrap()), vec!["b", "a"]);
        assert_eq!(cache.get(&"a".to_string()).unwrap(), Some(10));
    }

    #[test]
    fn test_recency_contents_match_last_n_accessed() {
        let cache: RecencyCache<String, usize> = BoundedCache::new(3);
        let sequence = ["a", "b", "c", "a", "d", "b", "e", "a"];

        for (i, key) in sequence.iter().enumerate() {
            cache.put(key.to_string(), i).unwrap();
        }

        let mut expected: Vec<&str> = Vec::new();
        for key in sequence.iter().rev() {
            if !expected.contains(key) {
                expected.push(key);
            }
            if expected.len() == 3 {
                break;
            }
        }
        expected.reverse();

        assert_eq!(keys(&cache.export().unwrap()), expected);
    }

    #[test]
    fn test_frequency_evicts_least_frequent() {
        let cache: FrequencyCache<String, i32> = BoundedCache::new(2);
        cache.put("a".to_string(), 1).unwrap();
        cache.put("b".to_string(), 2).unwrap();
        cache.get(&"a".to_string()).unwrap();
        cache.put("c".to_string(), 3).unwrap();

        assert!(cache.contains(&"a".to_string()).unwrap());
        assert!(!cache.contains(&"b".to_string()).unwrap());
        assert!(cache.contains(&"c".to_string()).unwrap());
    }

    #[test]
    fn test_frequency_tie_evicts_oldest_insert() {
        let cache: FrequencyCache<String, i32> = BoundedCache::new(3);
        cache.put("a".to_string(), 1).unwrap();
        cache.put("b".to_string(), 2).unwrap();
        cache.put("c".to_string(), 3).unwrap();
        cache.get(&"a".to_string()).unwrap();
        cache.put("d".to_string(), 4).unwrap();

        assert!(!cache.contains(&"b".to_string()).unwrap());
        assert_eq!(keys(&cache.export().unwrap()), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_frequency_put_on_existing_counts_as_access() {
        let cache: FrequencyCache<String, i32> = BoundedCache::new(2);
        cache.put("a".to_string(), 1).unwrap();
        cache.put("b".to_string(), 2).unwrap();
        cache.put("a".to_string(), 11).unwrap();
        cache.put("c".to_string(), 3).unwrap();

        assert_eq!(cache.get(&"a".to_string()).unwrap(), Some(11));
        assert!(!cache.contains(&"b".to_string()).unwrap());
    }

    #[test]
    fn test_zero_capacity_is_pass_through() {
        let recency: RecencyCache<String, i32> = BoundedCache::new(0);
        let frequency: FrequencyCache<String, i32> = BoundedCache::new(0);

        for i in 0..5 {
            recency.put(format!("k{}", i), i).unwrap();
            frequency.put(format!("k{}", i), i).unwrap();
        }

        assert!(recency.is_empty().unwrap());
        assert!(frequency.is_empty().unwrap());
        assert_eq!(recency.get(&"k4".to_string()).unwrap(), None);
        assert!(recency.export().unwrap().is_empty());
    }

    #[test]
    fn test_update_is_atomic_read_modify_write() {
        let cache: FrequencyCache<String, Vec<u32>> = BoundedCache::new(4);

        let value = cache
            .update("k".to_string(), |current| {
                let mut list = current.unwrap_or_default();
                list.push(1);
                list
            })
            .unwrap();
        assert_eq!(value, vec![1]);

        let value = cache
            .update("k".to_string(), |current| {
                let mut list = current.unwrap_or_default();
                list.push(2);
                list
            })
            .unwrap();
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn test_import_reseeds_order_and_respects_capacity() {
        let cache: RecencyCache<String, i32> = BoundedCache::new(2);
        cache
            .import(vec![
                ("x".to_string(), 1),
                ("y".to_string(), 2),
                ("z".to_string(), 3),
            ])
            .unwrap();

        assert_eq!(keys(&cache.export().unwrap()), vec!["y", "z"]);
    }

    #[test]
    fn test_export_import_roundtrip_preserves_content() {
        let source: FrequencyCache<String, String> = BoundedCache::new(10);
        source.put("one".to_string(), "1".to_string()).unwrap();
        source.put("two".to_string(), "2".to_string()).unwrap();
        source.get(&"two".to_string()).unwrap();

        let restored: FrequencyCache<String, String> =
            BoundedCache::with_entries(10, source.export().unwrap()).unwrap();

        assert_eq!(
            restored.get(&"one".to_string()).unwrap(),
            Some("1".to_string())
        );
        assert_eq!(
            restored.get(&"two".to_string()).unwrap(),
            Some("2".to_string())
        );
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_writes() {
        let cache: Arc<FrequencyCache<String, Vec<usize>>> = Arc::new(BoundedCache::new(4));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache
                        .update("shared".to_string(), |current| {
                            let mut list = current.unwrap_or_default();
                            list.push(i);
                            list
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let list = cache.get(&"shared".to_string()).unwrap().unwrap();
        assert_eq!(list.len(), 8);
    }
}
