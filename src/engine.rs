//! Cache coordinator.
//!
//! [`CacheEngine`] owns the current dataset snapshot, its indices, the query
//! result cache and the collection cache, and keeps them consistent as the
//! dataset and collections change.
//!
//! ## Architecture
//!
//! ```text
//!   search / list_by_category
//!            │
//!            ▼
//!   ┌──────────────────┐  hit   ┌────────────────────────────────────┐
//!   │ QueryKey + probe ├───────►│ TtlLruCache<QueryKey, Vec<Record>> │
//!   └────────┬─────────┘        └────────────────────────────────────┘
//!            │ miss                              ▲ insert
//!            ▼                                   │
//!   ┌──────────────────┐  none / glob  ┌─────────┴──────┐
//!   │ IndexSet         ├──────────────►│ full scan      │
//!   │ token candidates │               │ of RecordStore │
//!   └────────┬─────────┘               └─────────┬──────┘
//!            │ candidates                        │
//!            ▼                                   ▼
//!      Matcher::tier (confirm + rank)  ──►  collection filter
//!                                          (CollectionCache)
//! ```
//!
//! ## Invalidation
//!
//! | Event                      | Query cache                         | Collection cache |
//! |----------------------------|-------------------------------------|------------------|
//! | `on_dataset_replaced` ok   | cleared                             | unchanged        |
//! | `on_dataset_replaced` err  | unchanged                           | unchanged        |
//! | `on_collection_mutated`    | cleared, or scoped entries dropped  | marked stale     |
//! | `invalidate_all`           | cleared                             | marked stale     |
//! | `configure(.., false)`     | cleared                             | unchanged        |
//!
//! Expired entries are purged lazily on access. Hosts that want bounded
//! memory between bursts call [`CacheEngine::purge_expired`].
//!
//! ## Example
//!
//! ```rust
//! use glyphkit::builder::EngineBuilder;
//! use glyphkit::record::{Record, ReplaceReason};
//!
//! let mut engine = EngineBuilder::new().build();
//! engine
//!     .on_dataset_replaced(
//!         vec![
//!             Record::new("🚀", "rocket", "Travel & Places", ["launch", "space"]),
//!             Record::new("🔥", "fire", "Travel & Places", ["flame", "hot"]),
//!         ],
//!         ReplaceReason::Load,
//!     )
//!     .unwrap();
//!
//! let hits = engine.search("rocket", None, false).unwrap();
//! assert_eq!(hits[0].symbol, "🚀");
//! assert_eq!(engine.stats().misses, 1);
//!
//! engine.search("rocket", None, false).unwrap();
//! assert_eq!(engine.stats().hits, 1);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::collections::{CollectionCache, CollectionMap, CollectionSource, NoCollections};
use crate::config::{CollectionInvalidation, EngineConfig};
use crate::error::{ConfigError, EngineError};
use crate::index::IndexSet;
use crate::metrics::metrics_impl::EngineMetrics;
use crate::metrics::snapshot::EngineStats;
use crate::metrics::traits::{EngineMetricsRecorder, MetricsReset, MetricsSnapshotProvider};
use crate::policy::ttl_lru::TtlLruCache;
use crate::query::{MatchTier, Matcher, QueryKey, QueryKind};
use crate::record::{Record, RecordStore, ReplaceReason};
use crate::traits::MutableCache;
use crate::warmup::{UsageSource, WarmupReport};

/// Ordered search or listing result.
pub type Results = Vec<Arc<Record>>;

/// Search caching and indexing engine.
///
/// Single-owner and `&mut self` for anything that touches the caches. See
/// [`SharedEngine`](crate::shared::SharedEngine) for a lock-wrapped handle.
pub struct CacheEngine<S = NoCollections, C = SystemClock> {
    store: Arc<RecordStore>,
    indices: Option<IndexSet>,
    cache: TtlLruCache<QueryKey, Results, C>,
    collections: CollectionCache,
    source: S,
    config: EngineConfig,
    metrics: EngineMetrics,
}

impl<S, C> CacheEngine<S, C>
where
    S: CollectionSource,
    C: Clock,
{
    /// Assembles an engine around an empty dataset.
    pub(crate) fn from_parts(config: EngineConfig, source: S, clock: C) -> Self {
        let store = RecordStore::empty();
        let indices = config.use_indices.then(|| IndexSet::build(&store));
        Self {
            store: Arc::new(store),
            indices,
            cache: TtlLruCache::with_clock(config.capacity, config.ttl, clock),
            collections: CollectionCache::new(),
            source,
            config,
            metrics: EngineMetrics::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    /// Searches names and keywords, optionally scoped to one collection.
    ///
    /// Results are ranked by match tier (name equals, name prefix, name
    /// contains, keyword only) and then by dataset order. An empty dataset
    /// yields `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidQuery`] for blank queries.
    /// - [`EngineError::CollectionNotFound`] if `collection` does not exist.
    /// - [`EngineError::CollectionLoadFailed`] if the collection store fails.
    ///
    /// Errors are never cached.
    pub fn search(
        &mut self,
        query: &str,
        collection: Option<&str>,
        exact: bool,
    ) -> Result<Results, EngineError> {
        let key = QueryKey::search(query, collection, exact)?;
        self.cached_or_compute(key)
    }

    /// Lists every record in `category` (exact, case-sensitive), in dataset
    /// order, optionally scoped to one collection.
    pub fn list_by_category(
        &mut self,
        category: &str,
        collection: Option<&str>,
    ) -> Result<Results, EngineError> {
        let key = QueryKey::category(category, collection)?;
        self.cached_or_compute(key)
    }

    /// Computes a search without reading or writing the query cache.
    ///
    /// A cached result for the same arguments is always equal to this.
    pub fn search_uncached(
        &mut self,
        query: &str,
        collection: Option<&str>,
        exact: bool,
    ) -> Result<Results, EngineError> {
        let key = QueryKey::search(query, collection, exact)?;
        self.compute(&key)
    }

    /// Looks up one record by its exact symbol.
    pub fn get_by_symbol(&self, symbol: &str) -> Option<Arc<Record>> {
        let id = match &self.indices {
            Some(indices) => indices.by_symbol(symbol)?,
            None => self
                .store
                .records()
                .iter()
                .position(|record| record.symbol == symbol)?,
        };
        self.store.get(id).cloned()
    }

    /// Distinct categories of the current dataset, sorted.
    pub fn categories(&self) -> Vec<String> {
        match &self.indices {
            Some(indices) => indices.categories().into_iter().map(str::to_string).collect(),
            None => {
                let mut names: Vec<String> = self
                    .store
                    .records()
                    .iter()
                    .map(|record| record.category.clone())
                    .collect();
                names.sort_unstable();
                names.dedup();
                names
            },
        }
    }

    /// Current collections, read through the collection cache.
    pub fn collections(&mut self) -> Result<Arc<CollectionMap>, EngineError> {
        Ok(self.collections.get_collections(&self.source)?)
    }

    // ---------------------------------------------------------------------
    // Change notifications
    // ---------------------------------------------------------------------

    /// Swaps in a new dataset snapshot.
    ///
    /// On success the indices are rebuilt and the query cache is cleared
    /// before this returns. A snapshot with an empty symbol, an empty name
    /// or a duplicate symbol is rejected and the previous dataset, indices
    /// and cached results stay in place.
    pub fn on_dataset_replaced(
        &mut self,
        records: Vec<Record>,
        reason: ReplaceReason,
    ) -> Result<(), EngineError> {
        let generation = self.store.generation() + 1;
        let store = match RecordStore::try_new(records, generation, reason) {
            Ok(store) => store,
            Err(defect) => {
                self.metrics.record_replace_failure();
                warn!(%reason, %defect, "dataset snapshot rejected");
                return Err(EngineError::DatasetReplaceFailed {
                    reason: defect.to_string(),
                });
            },
        };

        let indices = self.config.use_indices.then(|| IndexSet::build(&store));
        #[cfg(debug_assertions)]
        if let Some(indices) = &indices {
            indices.debug_validate_against(&store);
        }

        let records = store.len();
        self.store = Arc::new(store);
        self.indices = indices;
        let flushed = self.cache.len();
        self.cache.clear();

        self.metrics.record_dataset_replaced();
        self.metrics.record_invalidation();
        info!(%reason, generation, records, flushed, "dataset replaced");
        Ok(())
    }

    /// Reacts to a change in collection `name`; returns how many cached
    /// results were dropped.
    ///
    /// Must be called once per create, add, remove, delete or rename. A
    /// rename should be reported for both the old and the new name.
    pub fn on_collection_mutated(&mut self, name: &str) -> usize {
        self.collections.invalidate();
        self.metrics.record_invalidation();

        let policy = self.config.collection_invalidation;
        let dropped = match policy {
            CollectionInvalidation::FullFlush => {
                let len = self.cache.len();
                self.cache.clear();
                len
            },
            CollectionInvalidation::Scoped => {
                MutableCache::retain(&mut self.cache, |key, _| !key.is_scoped_to(name))
            },
        };
        debug!(collection = name, ?policy, dropped, "collection mutated");
        dropped
    }

    /// Runs `update` against the collection store, then invalidates as for
    /// [`on_collection_mutated`](Self::on_collection_mutated).
    ///
    /// The next lookup observes the change.
    pub fn update_collections<F, R>(&mut self, name: &str, update: F) -> R
    where
        F: FnOnce(&mut S) -> R,
    {
        let out = update(&mut self.source);
        self.on_collection_mutated(name);
        out
    }

    /// Drops every cached result and marks collections stale.
    pub fn invalidate_all(&mut self) {
        let flushed = self.cache.len();
        self.cache.clear();
        self.collections.invalidate();
        self.metrics.record_invalidation();
        debug!(flushed, "all caches invalidated");
    }

    // ---------------------------------------------------------------------
    // Configuration and maintenance
    // ---------------------------------------------------------------------

    /// Changes the query cache's capacity, TTL and on/off switch.
    ///
    /// Shrinking evicts LRU entries immediately. A new TTL applies to
    /// results stored from now on. Disabling drops every cached result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero TTL; nothing is changed.
    pub fn configure(
        &mut self,
        capacity: usize,
        ttl_seconds: u64,
        enabled: bool,
    ) -> Result<(), ConfigError> {
        let next = EngineConfig {
            capacity,
            ttl: Duration::from_secs(ttl_seconds),
            enabled,
            ..self.config.clone()
        };
        next.validate()?;

        let evicted = self.cache.set_capacity(next.capacity);
        self.cache.set_ttl(next.ttl);
        if !next.enabled {
            self.cache.clear();
        }
        self.config = next;
        info!(capacity, ttl_seconds, enabled, evicted, "query cache reconfigured");
        Ok(())
    }

    /// Removes expired results; returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        self.cache.purge_expired()
    }

    /// Pre-computes popular unscoped searches.
    ///
    /// At most `warmup_limit` queries are considered. Each runs through the
    /// normal miss path, so it counts as a miss and may evict older entries.
    pub fn warmup<I, Q>(&mut self, queries: I) -> WarmupReport
    where
        I: IntoIterator<Item = Q>,
        Q: AsRef<str>,
    {
        let mut report = WarmupReport::default();
        for query in queries.into_iter().take(self.config.warmup_limit) {
            if !self.config.enabled {
                report.skipped += 1;
                continue;
            }
            let Ok(key) = QueryKey::search(query.as_ref(), None, false) else {
                report.skipped += 1;
                continue;
            };
            if self.cache.contains(&key) {
                report.already_cached += 1;
                continue;
            }
            match self.cached_or_compute(key) {
                Ok(_) => {
                    report.executed += 1;
                    self.metrics.record_warmup_query();
                },
                Err(err) => {
                    debug!(error = %err, "warmup query failed");
                    report.skipped += 1;
                },
            }
        }
        info!(
            executed = report.executed,
            already_cached = report.already_cached,
            skipped = report.skipped,
            "query cache warmed"
        );
        report
    }

    /// Warms the cache from a usage statistics provider.
    pub fn warmup_from<U>(&mut self, usage: &U) -> WarmupReport
    where
        U: UsageSource + ?Sized,
    {
        let queries = usage.popular_queries(self.config.warmup_limit);
        self.warmup(queries)
    }

    /// Resets every counter; gauges are unaffected.
    pub fn clear_stats(&mut self) {
        self.cache.reset_metrics();
        self.metrics.reset_metrics();
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn cached_or_compute(&mut self, key: QueryKey) -> Result<Results, EngineError> {
        if !self.config.enabled {
            self.metrics.record_bypass();
            return self.compute(&key);
        }
        if let Some(hit) = self.cache.get(&key) {
            debug!(kind = ?key.kind, query = %key.text, "query cache hit");
            return Ok(hit.clone());
        }

        debug!(kind = ?key.kind, query = %key.text, "query cache miss");
        let results = self.compute(&key)?;
        self.cache.insert(key, results.clone());
        Ok(results)
    }

    fn compute(&mut self, key: &QueryKey) -> Result<Results, EngineError> {
        let mut results = match key.kind {
            QueryKind::Search => self.match_records(&key.text, key.exact),
            QueryKind::Category => self.category_records(&key.text),
        };

        if let Some(name) = key.collection.as_deref() {
            let collections = self.collections.get_collections(&self.source)?;
            let collection = collections
                .get(name)
                .ok_or_else(|| EngineError::CollectionNotFound {
                    name: name.to_string(),
                })?;
            results.retain(|record| collection.contains(&record.symbol));
        }
        Ok(results)
    }

    fn match_records(&mut self, text: &str, exact: bool) -> Results {
        let matcher = Matcher::new(text, exact);
        let candidates = match &self.indices {
            Some(indices) if matcher.is_indexable() => indices.candidates(text, exact),
            _ => Vec::new(),
        };

        let mut ranked: Vec<(MatchTier, usize)> = if candidates.is_empty() {
            self.metrics.record_full_scan();
            debug!(query = text, "no index candidates, scanning all records");
            self.store
                .folded_texts()
                .iter()
                .enumerate()
                .filter_map(|(id, folded)| matcher.tier(folded).map(|tier| (tier, id)))
                .collect()
        } else {
            self.metrics.record_index_lookup();
            candidates
                .into_iter()
                .filter_map(|id| {
                    let folded = self.store.folded(id)?;
                    matcher.tier(folded).map(|tier| (tier, id))
                })
                .collect()
        };

        ranked.sort_unstable();
        ranked
            .into_iter()
            .filter_map(|(_, id)| self.store.get(id).cloned())
            .collect()
    }

    fn category_records(&mut self, category: &str) -> Results {
        match &self.indices {
            Some(indices) => {
                self.metrics.record_index_lookup();
                indices
                    .by_category(category)
                    .iter()
                    .filter_map(|&id| self.store.get(id).cloned())
                    .collect()
            },
            None => {
                self.metrics.record_full_scan();
                self.store
                    .records()
                    .iter()
                    .filter(|record| record.category == category)
                    .cloned()
                    .collect()
            },
        }
    }
}

impl<S, C> CacheEngine<S, C> {
    /// Snapshot of counters and gauges.
    ///
    /// `current_size` counts stored results, including expired ones that
    /// have not been purged yet.
    pub fn stats(&self) -> EngineStats
    where
        C: Clock,
    {
        let cache = self.cache.snapshot();
        EngineStats {
            hits: cache.get_hits,
            misses: cache.get_misses + self.metrics.bypassed_lookups,
            evictions: cache.evicted_entries,
            expirations: cache.expired_entries,
            invalidations: self.metrics.invalidations,
            index_lookups: self.metrics.index_lookups,
            full_scans: self.metrics.full_scans,
            dataset_replacements: self.metrics.dataset_replacements,
            replace_failures: self.metrics.replace_failures,
            warmup_queries: self.metrics.warmup_queries,
            current_size: cache.cache_len,
            capacity: cache.capacity,
            ttl_seconds: self.config.ttl_seconds(),
            enabled: self.config.enabled,
            dataset_generation: self.store.generation(),
            record_count: self.store.len(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current dataset snapshot.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn record_count(&self) -> usize {
        self.store.len()
    }

    pub fn dataset_generation(&self) -> u64 {
        self.store.generation()
    }

    /// Returns `true` if inverted indices are built for the current dataset.
    pub fn has_indices(&self) -> bool {
        self.indices.is_some()
    }

    /// The collection store, for read-only inspection.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S, C> fmt::Debug for CacheEngine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("generation", &self.store.generation())
            .field("records", &self.store.len())
            .field("indexed", &self.indices.is_some())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
