//! Cache warmup inputs and results.

/// Source of popular queries, most popular first.
pub trait UsageSource {
    /// Returns at most `limit` queries.
    fn popular_queries(&self, limit: usize) -> Vec<String>;
}

impl UsageSource for [String] {
    fn popular_queries(&self, limit: usize) -> Vec<String> {
        self.iter().take(limit).cloned().collect()
    }
}

impl UsageSource for Vec<String> {
    fn popular_queries(&self, limit: usize) -> Vec<String> {
        self.as_slice().popular_queries(limit)
    }
}

/// Outcome of one warmup pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarmupReport {
    /// Queries computed and stored through the normal miss path.
    pub executed: usize,
    /// Queries that already had a live cache entry.
    pub already_cached: usize,
    /// Blank queries, or every query while the cache is disabled.
    pub skipped: usize,
}

impl WarmupReport {
    pub fn total(&self) -> usize {
        self.executed + self.already_cached + self.skipped
    }
}
