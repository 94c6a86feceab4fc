//! LRU cache with per-entry time-to-live.
//!
//! Backs the engine's query cache. Entries are kept in a [`RecencyList`]
//! (MRU at the front, LRU at the back) and indexed by an `FxHashMap` from key
//! to [`SlotId`], so `get` and `insert` are O(1) amortized.
//!
//! ## Expiry
//!
//! Every entry records `inserted_at`, `last_accessed_at` and `expires_at =
//! inserted_at + ttl`. Expiry is lazy: there is no sweeper thread or timer.
//! An entry is expired once `now >= expires_at`; `get` treats it as a miss and
//! purges it on the spot. [`purge_expired`](TtlLruCache::purge_expired) is an
//! explicit, caller-driven sweep.
//!
//! ## Capacity
//!
//! Inserting a new key at capacity evicts the least recently used entry.
//! Capacity `0` stores nothing. [`set_capacity`](TtlLruCache::set_capacity)
//! trims immediately; [`set_ttl`](TtlLruCache::set_ttl) applies to entries
//! inserted afterwards.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use glyphkit::clock::ManualClock;
//! use glyphkit::policy::ttl_lru::TtlLruCache;
//!
//! let clock = ManualClock::new();
//! let mut cache = TtlLruCache::with_clock(2, Duration::from_secs(10), clock.clone());
//!
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");          // "a" becomes MRU
//! cache.insert("c", 3);     // evicts "b"
//! assert_eq!(cache.get(&"b"), None);
//!
//! clock.advance(Duration::from_secs(10));
//! assert_eq!(cache.get(&"a"), None); // expired at exactly inserted_at + ttl
//! ```

use std::hash::Hash;
use std::mem;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::clock::{Clock, SystemClock};
use crate::ds::{RecencyList, SlotId};
use crate::metrics::metrics_impl::QueryCacheMetrics;
use crate::metrics::snapshot::QueryCacheMetricsSnapshot;
use crate::metrics::traits::{CoreMetricsRecorder, MetricsReset, MetricsSnapshotProvider};
use crate::traits::{CoreCache, ExpiringCache, MutableCache, RecencyCache};

/// Timestamps tracked for one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub inserted_at: Instant,
    pub last_accessed_at: Instant,
    /// `None` when `inserted_at + ttl` is not representable.
    pub expires_at: Option<Instant>,
}

impl EntryMeta {
    fn new(now: Instant, ttl: Duration) -> Self {
        Self {
            inserted_at: now,
            last_accessed_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    /// Returns `true` once `now` has reached `expires_at`.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    meta: EntryMeta,
}

/// Single-threaded LRU + TTL cache.
pub struct TtlLruCache<K, V, C = SystemClock> {
    map: FxHashMap<K, SlotId>,
    order: RecencyList<Entry<K, V>>,
    capacity: usize,
    ttl: Duration,
    clock: C,
    metrics: QueryCacheMetrics,
}

impl<K, V> TtlLruCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache driven by the system clock.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, SystemClock)
    }
}

impl<K, V, C> TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(capacity: usize, ttl: Duration, clock: C) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: RecencyList::with_capacity(capacity),
            capacity,
            ttl,
            clock,
            metrics: QueryCacheMetrics::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the clock driving expiry.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns `true` if `key` is present and not expired.
    ///
    /// Does not update recency and does not purge.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.live_entry(key, now).is_some()
    }

    /// Looks up `key`, refreshing its recency on a hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        let Some(&id) = self.map.get(key) else {
            self.metrics.record_get_miss();
            return None;
        };

        let expired = self
            .order
            .get(id)
            .is_none_or(|entry| entry.meta.is_expired(now));
        if expired {
            self.map.remove(key);
            self.order.remove(id);
            self.metrics.record_expired_entry();
            self.metrics.record_get_miss();
            return None;
        }

        self.metrics.record_get_hit();
        self.order.move_to_front(id);
        let entry = self.order.get_mut(id)?;
        entry.meta.last_accessed_at = now;
        Some(&entry.value)
    }

    /// Returns a live value without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.live_entry(key, now).map(|entry| &entry.value)
    }

    /// Returns the timestamps of a live entry without touching recency.
    pub fn entry_meta(&self, key: &K) -> Option<EntryMeta> {
        let now = self.clock.now();
        self.live_entry(key, now).map(|entry| entry.meta)
    }

    /// Inserts or overwrites `key`.
    ///
    /// Overwriting restarts the entry's TTL and makes it MRU. Returns the
    /// previous value if it had not yet expired.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }
        let now = self.clock.now();

        if let Some(&id) = self.map.get(&key) {
            self.metrics.record_insert_update();
            self.order.move_to_front(id);
            let entry = self.order.get_mut(id)?;
            let was_expired = entry.meta.is_expired(now);
            entry.meta = EntryMeta::new(now, self.ttl);
            let old = mem::replace(&mut entry.value, value);
            return (!was_expired).then_some(old);
        }

        while self.map.len() >= self.capacity {
            if self.evict_lru().is_none() {
                break;
            }
        }

        self.metrics.record_insert_new();
        let id = self.order.push_front(Entry {
            key: key.clone(),
            value,
            meta: EntryMeta::new(now, self.ttl),
        });
        self.map.insert(key, id);
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.map.remove(key)?;
        self.order.remove(id).map(|entry| entry.value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let entry = self.order.pop_back()?;
        self.map.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Marks `key` as most recently used without reading it.
    pub fn touch(&mut self, key: &K) -> bool {
        let Some(&id) = self.map.get(key) else {
            return false;
        };
        let now = self.clock.now();
        self.order.move_to_front(id);
        if let Some(entry) = self.order.get_mut(id) {
            entry.meta.last_accessed_at = now;
        }
        true
    }

    /// Keeps entries for which `keep` returns `true`; returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .order
            .iter()
            .filter(|entry| !keep(&entry.key, &entry.value))
            .map(|entry| entry.key.clone())
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        self.metrics.record_invalidated_entries(doomed.len());
        doomed.len()
    }

    /// Drops every entry, counting them as invalidated.
    pub fn clear(&mut self) {
        self.metrics.record_invalidated_entries(self.map.len());
        self.map.clear();
        self.order.clear();
    }

    /// Drops every entry and releases backing storage.
    pub fn clear_shrink(&mut self) {
        self.clear();
        self.map.shrink_to_fit();
        self.order.clear_shrink();
    }

    /// Removes all expired entries; returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<K> = self
            .order
            .iter()
            .filter(|entry| entry.meta.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
            self.metrics.record_expired_entry();
        }
        expired.len()
    }

    /// Changes capacity, evicting LRU entries until the cache fits.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        let mut evicted = 0;
        while self.map.len() > capacity {
            if self.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Iterates keys from most to least recently used, including expired ones.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|entry| &entry.key)
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }

    pub fn metrics_snapshot(&self) -> QueryCacheMetricsSnapshot {
        QueryCacheMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_new: self.metrics.insert_new,
            insert_updates: self.metrics.insert_updates,
            evicted_entries: self.metrics.evicted_entries,
            expired_entries: self.metrics.expired_entries,
            invalidated_entries: self.metrics.invalidated_entries,
            cache_len: self.map.len(),
            capacity: self.capacity,
        }
    }

    fn evict_lru(&mut self) -> Option<K> {
        let (key, _) = self.pop_lru()?;
        self.metrics.record_evicted_entry();
        Some(key)
    }

    fn live_entry(&self, key: &K, now: Instant) -> Option<&Entry<K, V>> {
        let id = *self.map.get(key)?;
        self.order
            .get(id)
            .filter(|entry| !entry.meta.is_expired(now))
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.order.debug_validate_invariants();
        assert_eq!(self.map.len(), self.order.len());
        assert!(self.capacity == 0 || self.map.len() <= self.capacity);
        for (key, &id) in &self.map {
            let entry = self.order.get(id).expect("mapped slot missing");
            assert!(entry.key == *key, "slot holds a different key");
        }
    }
}

impl<K, V, C> std::fmt::Debug for TtlLruCache<K, V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlLruCache")
            .field("len", &self.map.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V, C> MetricsSnapshotProvider<QueryCacheMetricsSnapshot> for TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn snapshot(&self) -> QueryCacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

impl<K, V, C> CoreCache<K, V> for TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        TtlLruCache::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        TtlLruCache::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        TtlLruCache::contains(self, key)
    }

    fn len(&self) -> usize {
        TtlLruCache::len(self)
    }

    fn capacity(&self) -> usize {
        TtlLruCache::capacity(self)
    }

    fn clear(&mut self) {
        TtlLruCache::clear(self)
    }
}

impl<K, V, C> MutableCache<K, V> for TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        TtlLruCache::remove(self, key)
    }

    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        TtlLruCache::retain(self, keep)
    }
}

impl<K, V, C> RecencyCache<K, V> for TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        TtlLruCache::pop_lru(self)
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        TtlLruCache::peek_lru(self)
    }

    fn touch(&mut self, key: &K) -> bool {
        TtlLruCache::touch(self, key)
    }
}

impl<K, V, C> ExpiringCache<K, V> for TtlLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn ttl(&self) -> Duration {
        TtlLruCache::ttl(self)
    }

    fn set_ttl(&mut self, ttl: Duration) {
        TtlLruCache::set_ttl(self, ttl)
    }

    fn purge_expired(&mut self) -> usize {
        TtlLruCache::purge_expired(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(60);

    fn manual(capacity: usize) -> (TtlLruCache<&'static str, i32, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (TtlLruCache::with_clock(capacity, TTL, clock.clone()), clock)
    }

    #[test]
    fn test_basic_operations() {
        let (mut cache, _) = manual(3);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);

        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"z"), None);
        assert!(cache.contains(&"b"));
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_capacity_two_evicts_oldest() {
        let (mut cache, _) = manual(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        cache.insert("C", 3);

        assert_eq!(cache.get(&"A"), None);
        assert_eq!(cache.get(&"B"), Some(&2));
        assert_eq!(cache.get(&"C"), Some(&3));
        assert_eq!(cache.metrics_snapshot().evicted_entries, 1);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let (mut cache, _) = manual(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        cache.get(&"A");
        cache.insert("C", 3);

        assert!(cache.contains(&"A"));
        assert!(!cache.contains(&"B"));
        assert!(cache.contains(&"C"));
    }

    #[test]
    fn test_peek_does_not_protect() {
        let (mut cache, _) = manual(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        assert_eq!(cache.peek(&"A"), Some(&1));
        cache.insert("C", 3);

        assert!(!cache.contains(&"A"));
    }

    #[test]
    fn test_ttl_boundary() {
        let (mut cache, clock) = manual(4);
        cache.insert("a", 1);

        clock.advance(TTL - Duration::from_nanos(1));
        assert_eq!(cache.get(&"a"), Some(&1));

        clock.advance(Duration::from_nanos(1));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty(), "expired entry is purged on access");

        let snap = cache.metrics_snapshot();
        assert_eq!(snap.expired_entries, 1);
        assert_eq!(snap.get_hits, 1);
        assert_eq!(snap.get_misses, 1);
    }

    #[test]
    fn test_hit_does_not_extend_ttl() {
        let (mut cache, clock) = manual(4);
        cache.insert("a", 1);
        let inserted = cache.entry_meta(&"a").unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get(&"a"), Some(&1));
        let meta = cache.entry_meta(&"a").unwrap();
        assert_eq!(meta.expires_at, inserted.expires_at);
        assert!(meta.last_accessed_at > inserted.last_accessed_at);

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_overwrite_restarts_ttl() {
        let (mut cache, clock) = manual(4);
        cache.insert("a", 1);
        clock.advance(Duration::from_secs(45));
        assert_eq!(cache.insert("a", 2), Some(1));

        clock.advance(Duration::from_secs(45));
        assert_eq!(cache.get(&"a"), Some(&2));
    }

    #[test]
    fn test_overwrite_of_expired_returns_none() {
        let (mut cache, clock) = manual(4);
        cache.insert("a", 1);
        clock.advance(TTL);
        assert_eq!(cache.insert("a", 2), None);
        assert_eq!(cache.get(&"a"), Some(&2));
    }

    #[test]
    fn test_zero_capacity() {
        let (mut cache, _) = manual(0);
        assert_eq!(cache.insert("a", 1), None);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_set_capacity_trims_lru_first() {
        let (mut cache, _) = manual(4);
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.insert(key, i as i32);
        }
        cache.get(&"a");

        assert_eq!(cache.set_capacity(2), 2);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["a", "d"]);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_retain_counts_invalidations() {
        let (mut cache, _) = manual(4);
        cache.insert("keep", 1);
        cache.insert("drop", 2);

        assert_eq!(cache.retain(|key, _| *key == "keep"), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.metrics_snapshot().invalidated_entries, 1);

        cache.clear();
        assert_eq!(cache.metrics_snapshot().invalidated_entries, 2);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_purge_expired() {
        let (mut cache, clock) = manual(4);
        cache.insert("old", 1);
        clock.advance(Duration::from_secs(40));
        cache.insert("new", 2);
        clock.advance(Duration::from_secs(20));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn test_pop_and_peek_lru() {
        let (mut cache, _) = manual(4);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.touch(&"a"));
        assert!(!cache.touch(&"zz"));

        assert_eq!(cache.peek_lru(), Some((&"b", &2)));
        assert_eq!(cache.pop_lru(), Some(("b", 2)));
        assert_eq!(cache.pop_lru(), Some(("a", 1)));
        assert_eq!(cache.pop_lru(), None);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let clock = ManualClock::new();
        let mut cache = TtlLruCache::with_clock(2, Duration::MAX, clock.clone());
        cache.insert(1u8, "x");
        assert_eq!(cache.entry_meta(&1).unwrap().expires_at, None);
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
        assert_eq!(cache.get(&1), Some(&"x"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8),
        Get(u8),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16).prop_map(Op::Insert),
            (0u8..16).prop_map(Op::Get),
            (0u8..16).prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// Property: the cache agrees with a naive recency-ordered model
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_naive_lru_model(
            capacity in 1usize..6,
            ops in prop::collection::vec(op(), 0..200)
        ) {
            let mut cache = TtlLruCache::with_clock(capacity, Duration::from_secs(60), ManualClock::new());
            // front = MRU
            let mut model: VecDeque<u8> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Insert(k) => {
                        cache.insert(k, k);
                        if let Some(pos) = model.iter().position(|&m| m == k) {
                            model.remove(pos);
                        } else if model.len() >= capacity {
                            model.pop_back();
                        }
                        model.push_front(k);
                    },
                    Op::Get(k) => {
                        let hit = cache.get(&k).copied();
                        if let Some(pos) = model.iter().position(|&m| m == k) {
                            prop_assert_eq!(hit, Some(k));
                            model.remove(pos);
                            model.push_front(k);
                        } else {
                            prop_assert_eq!(hit, None);
                        }
                    },
                    Op::Remove(k) => {
                        let removed = cache.remove(&k);
                        let pos = model.iter().position(|&m| m == k);
                        prop_assert_eq!(removed.is_some(), pos.is_some());
                        if let Some(pos) = pos {
                            model.remove(pos);
                        }
                    },
                }
                prop_assert!(cache.len() <= capacity);
                let keys: Vec<u8> = cache.keys().copied().collect();
                let expected: Vec<u8> = model.iter().copied().collect();
                prop_assert_eq!(keys, expected);
            }
            cache.debug_validate_invariants();
        }

        /// Property: an entry hits strictly before its deadline and misses from it on
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_ttl_boundary(ttl_ms in 1u64..10_000, probe_ms in 0u64..20_000) {
            let clock = ManualClock::new();
            let mut cache = TtlLruCache::with_clock(4, Duration::from_millis(ttl_ms), clock.clone());
            cache.insert(1u8, ());

            clock.advance(Duration::from_millis(probe_ms));
            let hit = cache.get(&1).is_some();
            prop_assert_eq!(hit, probe_ms < ttl_ms);
        }
    }
}
