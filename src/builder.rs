//! Builder for [`CacheEngine`] instances.
//!
//! Collects configuration, a collection source and a clock, then produces an
//! engine with an empty dataset. Hosts feed the first dataset through
//! [`CacheEngine::on_dataset_replaced`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use glyphkit::builder::EngineBuilder;
//! use glyphkit::collections::InMemoryCollections;
//! use glyphkit::config::CollectionInvalidation;
//!
//! let engine = EngineBuilder::new()
//!     .capacity(64)
//!     .ttl(Duration::from_secs(120))
//!     .collection_invalidation(CollectionInvalidation::Scoped)
//!     .collections(InMemoryCollections::new())
//!     .try_build()
//!     .expect("valid configuration");
//!
//! assert_eq!(engine.stats().capacity, 64);
//! assert_eq!(engine.stats().ttl_seconds, 120);
//! ```

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::collections::{CollectionSource, NoCollections};
use crate::config::{CollectionInvalidation, EngineConfig};
use crate::engine::CacheEngine;
use crate::error::ConfigError;

/// Builder for creating engine instances.
#[derive(Debug, Clone)]
pub struct EngineBuilder<S = NoCollections, C = SystemClock> {
    config: EngineConfig,
    source: S,
    clock: C,
}

impl EngineBuilder {
    /// Starts from [`EngineConfig::default`], no collections, system clock.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            source: NoCollections,
            clock: SystemClock,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> EngineBuilder<S, C>
where
    S: CollectionSource,
    C: Clock,
{
    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Disables index construction; every search then scans linearly.
    pub fn use_indices(mut self, use_indices: bool) -> Self {
        self.config.use_indices = use_indices;
        self
    }

    pub fn collection_invalidation(mut self, policy: CollectionInvalidation) -> Self {
        self.config.collection_invalidation = policy;
        self
    }

    pub fn warmup_limit(mut self, limit: usize) -> Self {
        self.config.warmup_limit = limit;
        self
    }

    /// Sets the collection store the engine reads through.
    pub fn collections<S2: CollectionSource>(self, source: S2) -> EngineBuilder<S2, C> {
        EngineBuilder {
            config: self.config,
            source,
            clock: self.clock,
        }
    }

    /// Sets the time source used for TTL expiry.
    pub fn clock<C2: Clock>(self, clock: C2) -> EngineBuilder<S, C2> {
        EngineBuilder {
            config: self.config,
            source: self.source,
            clock,
        }
    }

    /// Validates the configuration and builds the engine.
    pub fn try_build(self) -> Result<CacheEngine<S, C>, ConfigError> {
        self.config.validate()?;
        Ok(CacheEngine::from_parts(self.config, self.source, self.clock))
    }

    /// Builds the engine.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; use [`try_build`](Self::try_build)
    /// for user-supplied settings.
    pub fn build(self) -> CacheEngine<S, C> {
        match self.try_build() {
            Ok(engine) => engine,
            Err(err) => panic!("invalid engine configuration: {}", err),
        }
    }
}
