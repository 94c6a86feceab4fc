pub use crate::builder::EngineBuilder;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::collections::{
    Collection, CollectionMap, CollectionSource, InMemoryCollections, NoCollections,
};
pub use crate::config::{CollectionInvalidation, EngineConfig};
pub use crate::engine::{CacheEngine, Results};
pub use crate::error::{ConfigError, EngineError, SourceError};
pub use crate::metrics::snapshot::EngineStats;
pub use crate::policy::ttl_lru::TtlLruCache;
pub use crate::record::{Record, ReplaceReason};
#[cfg(feature = "concurrency")]
pub use crate::shared::SharedEngine;
pub use crate::traits::{CoreCache, ExpiringCache, MutableCache, RecencyCache};
pub use crate::warmup::{UsageSource, WarmupReport};
