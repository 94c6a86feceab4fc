use crate::metrics::traits::{CoreMetricsRecorder, EngineMetricsRecorder, MetricsReset};

/// Counters written by [`TtlLruCache`](crate::policy::ttl_lru::TtlLruCache).
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryCacheMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub insert_new: u64,
    pub insert_updates: u64,
    pub evicted_entries: u64,
    pub expired_entries: u64,
    pub invalidated_entries: u64,
}

impl CoreMetricsRecorder for QueryCacheMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }

    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_expired_entry(&mut self) {
        self.expired_entries += 1;
    }

    fn record_invalidated_entries(&mut self, count: usize) {
        self.invalidated_entries += count as u64;
    }
}

impl MetricsReset for QueryCacheMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}

/// Counters written by [`CacheEngine`](crate::engine::CacheEngine).
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineMetrics {
    pub index_lookups: u64,
    pub full_scans: u64,
    pub bypassed_lookups: u64,
    pub dataset_replacements: u64,
    pub replace_failures: u64,
    pub invalidations: u64,
    pub warmup_queries: u64,
}

impl EngineMetricsRecorder for EngineMetrics {
    fn record_index_lookup(&mut self) {
        self.index_lookups += 1;
    }

    fn record_full_scan(&mut self) {
        self.full_scans += 1;
    }

    fn record_bypass(&mut self) {
        self.bypassed_lookups += 1;
    }

    fn record_dataset_replaced(&mut self) {
        self.dataset_replacements += 1;
    }

    fn record_replace_failure(&mut self) {
        self.replace_failures += 1;
    }

    fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    fn record_warmup_query(&mut self) {
        self.warmup_queries += 1;
    }
}

impl MetricsReset for EngineMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}
