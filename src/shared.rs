//! Thread-safe handle around [`CacheEngine`].
//!
//! Searches take the write lock because they update recency and counters.
//! Pure reads of the current snapshot take the read lock. Dataset
//! replacement holds the write lock for the whole validate, build, swap and
//! flush sequence, so no reader observes a half-replaced dataset.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::collections::{CollectionMap, CollectionSource, NoCollections};
use crate::engine::{CacheEngine, Results};
use crate::error::{ConfigError, EngineError};
use crate::metrics::snapshot::EngineStats;
use crate::record::{Record, ReplaceReason};
use crate::warmup::{UsageSource, WarmupReport};

/// Cloneable, lock-wrapped engine.
///
/// # Example
///
/// ```
/// use glyphkit::builder::EngineBuilder;
/// use glyphkit::record::{Record, ReplaceReason};
/// use glyphkit::shared::SharedEngine;
///
/// let engine = SharedEngine::new(EngineBuilder::new().build());
/// engine
///     .on_dataset_replaced(vec![Record::new("🔥", "fire", "Nature", ["hot"])], ReplaceReason::Load)
///     .unwrap();
///
/// let handle = engine.clone();
/// std::thread::spawn(move || handle.search("fire", None, false).unwrap())
///     .join()
///     .unwrap();
///
/// assert_eq!(engine.stats().current_size, 1);
/// ```
pub struct SharedEngine<S = NoCollections, C = SystemClock> {
    inner: Arc<RwLock<CacheEngine<S, C>>>,
}

impl<S, C> Clone for SharedEngine<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, C> fmt::Debug for SharedEngine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.inner.read();
        f.debug_struct("SharedEngine")
            .field("generation", &engine.dataset_generation())
            .field("records", &engine.record_count())
            .finish_non_exhaustive()
    }
}

impl<S, C> SharedEngine<S, C>
where
    S: CollectionSource,
    C: Clock,
{
    pub fn new(engine: CacheEngine<S, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn search(
        &self,
        query: &str,
        collection: Option<&str>,
        exact: bool,
    ) -> Result<Results, EngineError> {
        self.inner.write().search(query, collection, exact)
    }

    pub fn list_by_category(
        &self,
        category: &str,
        collection: Option<&str>,
    ) -> Result<Results, EngineError> {
        self.inner.write().list_by_category(category, collection)
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<Arc<Record>> {
        self.inner.read().get_by_symbol(symbol)
    }

    pub fn categories(&self) -> Vec<String> {
        self.inner.read().categories()
    }

    pub fn collections(&self) -> Result<Arc<CollectionMap>, EngineError> {
        self.inner.write().collections()
    }

    pub fn on_dataset_replaced(
        &self,
        records: Vec<Record>,
        reason: ReplaceReason,
    ) -> Result<(), EngineError> {
        self.inner.write().on_dataset_replaced(records, reason)
    }

    pub fn on_collection_mutated(&self, name: &str) -> usize {
        self.inner.write().on_collection_mutated(name)
    }

    /// Runs `update` against the collection store under the write lock.
    pub fn update_collections<F, R>(&self, name: &str, update: F) -> R
    where
        F: FnOnce(&mut S) -> R,
    {
        self.inner.write().update_collections(name, update)
    }

    pub fn invalidate_all(&self) {
        self.inner.write().invalidate_all();
    }

    pub fn configure(
        &self,
        capacity: usize,
        ttl_seconds: u64,
        enabled: bool,
    ) -> Result<(), ConfigError> {
        self.inner.write().configure(capacity, ttl_seconds, enabled)
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.write().purge_expired()
    }

    pub fn warmup<I, Q>(&self, queries: I) -> WarmupReport
    where
        I: IntoIterator<Item = Q>,
        Q: AsRef<str>,
    {
        self.inner.write().warmup(queries)
    }

    pub fn warmup_from<U>(&self, usage: &U) -> WarmupReport
    where
        U: UsageSource + ?Sized,
    {
        self.inner.write().warmup_from(usage)
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.read().stats()
    }

    pub fn clear_stats(&self) {
        self.inner.write().clear_stats();
    }

    pub fn record_count(&self) -> usize {
        self.inner.read().record_count()
    }

    /// Runs `f` with shared access to the engine.
    pub fn with_read<R>(&self, f: impl FnOnce(&CacheEngine<S, C>) -> R) -> R {
        f(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use crate::collections::InMemoryCollections;
    use std::thread;

    fn records(prefix: &str, count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::new(
                    format!("{prefix}{i}"),
                    format!("{prefix} item {i}"),
                    "Objects",
                    ["thing"],
                )
            })
            .collect()
    }

    #[test]
    fn concurrent_searches_share_one_cache() {
        let engine = SharedEngine::new(EngineBuilder::new().build());
        engine.on_dataset_replaced(records("a", 20), ReplaceReason::Load).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        assert_eq!(engine.search("thing", None, false).unwrap().len(), 20);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = engine.stats();
        assert_eq!(stats.hits + stats.misses, 100);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn readers_never_see_a_torn_snapshot() {
        let engine = SharedEngine::new(EngineBuilder::new().build());
        engine.on_dataset_replaced(records("a", 10), ReplaceReason::Load).unwrap();

        let writer = {
            let engine = engine.clone();
            thread::spawn(move || {
                for round in 0..20 {
                    let prefix = if round % 2 == 0 { "b" } else { "a" };
                    engine
                        .on_dataset_replaced(records(prefix, 10), ReplaceReason::Update)
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            let results = engine.search("item", None, false).unwrap();
            assert_eq!(results.len(), 10);
            let first = results[0].symbol.chars().next();
            assert!(results.iter().all(|r| r.symbol.chars().next() == first));
        }
        writer.join().unwrap();
        assert_eq!(engine.stats().dataset_generation, 21);
    }

    #[test]
    fn collection_updates_are_visible_across_handles() {
        let mut store = InMemoryCollections::new();
        store.create("Work", "");
        let engine = SharedEngine::new(EngineBuilder::new().collections(store).build());
        engine.on_dataset_replaced(records("a", 3), ReplaceReason::Load).unwrap();
        assert!(engine.search("thing", Some("Work"), false).unwrap().is_empty());

        let other = engine.clone();
        other.update_collections("Work", |store| store.add_members("Work", ["a1"]));

        let results = engine.search("thing", Some("Work"), false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "a1");
        assert!(engine.with_read(|inner| inner.source().len() == 1));
    }
}
