//! Engine configuration.
//!
//! | Field                     | Type                     | Default     | Description                                   |
//! |---------------------------|--------------------------|-------------|-----------------------------------------------|
//! | `capacity`                | `usize`                  | 256         | Maximum cached query results                  |
//! | `ttl`                     | `Duration`               | 300 s       | Lifetime of a cached result                   |
//! | `enabled`                 | `bool`                   | true        | Query cache on/off                            |
//! | `use_indices`             | `bool`                   | true        | Build inverted indices on dataset replacement |
//! | `collection_invalidation` | `CollectionInvalidation` | `FullFlush` | Query cache reaction to collection edits      |
//! | `warmup_limit`            | `usize`                  | 25          | Maximum queries replayed by warmup            |
//!
//! Capacity, TTL and `enabled` can be changed on a live engine through
//! [`CacheEngine::configure`](crate::engine::CacheEngine::configure).

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CAPACITY: usize = 256;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_WARMUP_LIMIT: usize = 25;

/// How the query cache reacts when a collection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollectionInvalidation {
    /// Drop every cached query.
    #[default]
    FullFlush,
    /// Drop only queries scoped to the mutated collection.
    Scoped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub capacity: usize,
    pub ttl: Duration,
    pub enabled: bool,
    pub use_indices: bool,
    pub collection_invalidation: CollectionInvalidation,
    pub warmup_limit: usize,
}

impl EngineConfig {
    /// Checks parameter ranges.
    ///
    /// A zero capacity is allowed and simply caches nothing; a zero TTL is
    /// rejected because every entry would be expired on insert.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::new("ttl must be > 0"));
        }
        Ok(())
    }

    /// TTL in whole seconds, as reported by stats.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
            enabled: true,
            use_indices: true,
            collection_invalidation: CollectionInvalidation::FullFlush,
            warmup_limit: DEFAULT_WARMUP_LIMIT,
        }
    }
}
