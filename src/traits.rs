//! # Cache Trait Hierarchy
//!
//! Small traits describing what the query cache can do, layered the same way
//! eviction concerns are layered: universal operations first, then removal,
//! then recency and expiry.
//!
//! ```text
//!              ┌─────────────────────────────────────────┐
//!              │            CoreCache<K, V>              │
//!              │  insert / get / contains / len          │
//!              │  capacity / clear                       │
//!              └──────────────────┬──────────────────────┘
//!                                 │
//!                                 ▼
//!              ┌─────────────────────────────────────────┐
//!              │           MutableCache<K, V>            │
//!              │  remove(&K) / retain(pred)              │
//!              └──────────┬───────────────────┬──────────┘
//!                         │                   │
//!                         ▼                   ▼
//!     ┌───────────────────────────┐  ┌───────────────────────────┐
//!     │   RecencyCache<K, V>      │  │   ExpiringCache<K, V>     │
//!     │  pop_lru / peek_lru       │  │  ttl / set_ttl            │
//!     │  touch                    │  │  purge_expired            │
//!     └───────────────────────────┘  └───────────────────────────┘
//! ```
//!
//! [`TtlLruCache`](crate::policy::ttl_lru::TtlLruCache) implements all four.
//! The engine depends on the traits where it only needs a capability, e.g.
//! scoped invalidation is written against [`MutableCache::retain`].
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use glyphkit::policy::ttl_lru::TtlLruCache;
//! use glyphkit::traits::{CoreCache, MutableCache};
//!
//! fn drop_scoped<C: MutableCache<String, u32>>(cache: &mut C, prefix: &str) -> usize {
//!     cache.retain(|key, _| !key.starts_with(prefix))
//! }
//!
//! let mut cache = TtlLruCache::new(8, Duration::from_secs(60));
//! cache.insert("work:rocket".to_string(), 1);
//! cache.insert("home:fire".to_string(), 2);
//!
//! assert_eq!(drop_scoped(&mut cache, "work:"), 1);
//! assert_eq!(cache.len(), 1);
//! ```

use std::time::Duration;

/// Operations every cache supports.
pub trait CoreCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if it existed.
    ///
    /// At capacity, an entry is evicted according to the cache's policy
    /// before the new entry is stored.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Gets a value by key, updating access state.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks for a live key without updating access state.
    fn contains(&self, key: &K) -> bool;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    fn capacity(&self) -> usize;

    /// Removes every entry.
    fn clear(&mut self);
}

/// Adds key-based and predicate-based removal.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    /// Removes `key`, returning its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Keeps only entries for which `keep` returns `true`.
    ///
    /// Returns the number of entries removed.
    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool;
}

/// Recency-ordered eviction.
pub trait RecencyCache<K, V>: MutableCache<K, V> {
    /// Removes and returns the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// Returns the least recently used entry without changing order.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks `key` as most recently used; `false` if absent.
    fn touch(&mut self, key: &K) -> bool;
}

/// Time-based expiry.
pub trait ExpiringCache<K, V>: MutableCache<K, V> {
    /// Returns the TTL applied to new inserts.
    fn ttl(&self) -> Duration;

    /// Changes the TTL applied to subsequent inserts.
    fn set_ttl(&mut self, ttl: Duration);

    /// Removes every expired entry, returning how many were dropped.
    fn purge_expired(&mut self) -> usize;
}
