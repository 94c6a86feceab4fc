/// Point-in-time view of the query cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryCacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub insert_new: u64,
    pub insert_updates: u64,

    pub evicted_entries: u64,
    pub expired_entries: u64, // purged lazily on access or by purge_expired
    pub invalidated_entries: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
}

/// Statistics and configuration surface exposed by the engine.
///
/// Counters are monotonic for the life of the engine and only go back to
/// zero through [`CacheEngine::clear_stats`](crate::engine::CacheEngine::clear_stats).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,

    pub index_lookups: u64,
    pub full_scans: u64,
    pub dataset_replacements: u64,
    pub replace_failures: u64,
    pub warmup_queries: u64,

    pub current_size: usize,
    pub capacity: usize,
    pub ttl_seconds: u64,
    pub enabled: bool,
    pub dataset_generation: u64,
    pub record_count: usize,
}

impl EngineStats {
    /// Fraction of cache probes that hit, or `0.0` before any probe.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_no_probes() {
        assert_eq!(EngineStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn hit_ratio_divides_hits_by_probes() {
        let stats = EngineStats {
            hits: 3,
            misses: 1,
            ..EngineStats::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
