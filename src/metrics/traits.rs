//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are split into separate traits so the
//! cache and engine only ever write counters, while tests and monitoring read
//! them through snapshots.
//!
//! ```text
//!   ┌─────────────────────────────┐      ┌─────────────────────────────┐
//!   │     CoreMetricsRecorder     │      │    EngineMetricsRecorder    │
//!   │  get hit/miss, insert,      │      │  index lookup, full scan,   │
//!   │  evict, expire, invalidate  │      │  replace, warmup            │
//!   └──────────────┬──────────────┘      └──────────────┬──────────────┘
//!                  │ written by TtlLruCache             │ written by CacheEngine
//!                  ▼                                    ▼
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (stats(), tests)             │    │ (Prometheus text)            │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters shared by every cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_expired_entry(&mut self);
    fn record_invalidated_entries(&mut self, count: usize);
}

/// Counters for the engine's lookup and coordination paths.
pub trait EngineMetricsRecorder {
    fn record_index_lookup(&mut self);
    fn record_full_scan(&mut self);
    /// A lookup served while the query cache is disabled.
    fn record_bypass(&mut self);
    fn record_dataset_replaced(&mut self);
    fn record_replace_failure(&mut self);
    fn record_invalidation(&mut self);
    fn record_warmup_query(&mut self);
}

/// Snapshot provider for stats and tests.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset counters on explicit request.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Publishes a snapshot to a monitoring sink.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
