//! # Bounded LRU Map
//!
//! Stamp-based least-recently-used map shared by the chunk cache and the
//! schematic cache.
//!
//! Every touch pushes `(key, stamp)` onto a queue and records the stamp in
//! the entry. Eviction pops the queue front and only removes an entry whose
//! current stamp still matches, so stale queue records cost nothing but a
//! pop. The queue is compacted when it grows past a multiple of capacity.
//!
//! Not thread-safe. Callers wrap it in a lock.

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

struct Slot<V> {
    value: V,
    stamp: u64,
}

/// Bounded map evicting the least recently used entry.
pub struct LruMap<K, V> {
    entries: HashMap<K, Slot<V>>,
    order: VecDeque<(K, u64)>,
    stamp: u64,
    capacity: usize,
}

impl<K: Clone + Eq + Hash, V> LruMap<K, V> {
    /// Creates a map holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stamp: 0,
            capacity,
        }
    }

    /// Maximum number of entries.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_stamp(&mut self) -> u64 {
        self.stamp = self.stamp.wrapping_add(1).max(1);
        self.stamp
    }

    /// Returns the value and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let owned = self.entries.get_key_value(key)?.0.clone();
        let stamp = self.next_stamp();
        if let Some(slot) = self.entries.get_mut(key) {
            slot.stamp = stamp;
        }
        self.order.push_back((owned, stamp));
        self.compact_if_needed();
        self.peek(key)
    }

    /// Returns the value without touching recency.
    #[must_use]
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Returns true if `key` is present. Does not touch recency.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces a value, evicting the least recently used
    /// entries beyond capacity. Returns the evicted entries.
    pub fn insert(&mut self, key: K, value: V) -> Vec<(K, V)> {
        let stamp = self.next_stamp();
        self.order.push_back((key.clone(), stamp));
        self.entries.insert(key, Slot { value, stamp });

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let Some((k, stamp)) = self.order.pop_front() else {
                break;
            };
            let current = self.entries.get(&k).is_some_and(|slot| slot.stamp == stamp);
            if current {
                if let Some(slot) = self.entries.remove(&k) {
                    evicted.push((k, slot.value));
                }
            }
        }
        self.compact_if_needed();
        evicted
    }

    /// Removes an entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).map(|slot| slot.value)
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Drops stale queue records once the queue outgrows the map.
    fn compact_if_needed(&mut self) {
        if self.order.len() <= self.capacity.saturating_mul(4).max(16) {
            return;
        }
        let entries = &self.entries;
        self.order
            .retain(|(k, stamp)| entries.get(k).is_some_and(|slot| slot.stamp == *stamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut lru = LruMap::new(2);
        lru.insert("a", 1);
        lru.insert("b", 2);
        assert_eq!(lru.get("a"), Some(&1));

        let evicted = lru.insert("c", 3);
        assert_eq!(evicted, vec![("b", 2)]);
        assert!(lru.contains("a"));
        assert!(lru.contains("c"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut lru = LruMap::new(2);
        lru.insert("a", 1);
        lru.insert("b", 2);
        assert!(lru.insert("a", 10).is_empty());
        assert_eq!(lru.peek("a"), Some(&10));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut lru = LruMap::new(8);
        for i in 0..1000u32 {
            lru.insert(i % 37, i);
            if i % 3 == 0 {
                let _ = lru.get(&(i % 5));
            }
            assert!(lru.len() <= 8);
        }
        // Queue stays bounded too.
        assert!(lru.order.len() <= 8 * 4 + 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut lru = LruMap::new(4);
        lru.insert(1, "x");
        lru.insert(2, "y");
        assert_eq!(lru.remove(&1), Some("x"));
        assert_eq!(lru.remove(&1), None);
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.capacity(), 4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut lru = LruMap::new(0);
        lru.insert(1, 1);
        lru.insert(2, 2);
        assert_eq!(lru.len(), 1);
        assert!(lru.contains(&2));
    }
}
