//! glyphkit: query result caching and inverted indexing for symbol datasets.
//!
//! [`engine::CacheEngine`] sits between a dataset provider (records that are
//! replaced wholesale on load, update or language switch), a collection store,
//! and the search surface. It answers name/keyword searches and category
//! listings from inverted indices, memoizes results in an LRU cache with TTL,
//! and invalidates on every dataset or collection change.

pub mod builder;
pub mod clock;
pub mod collections;
pub mod config;
pub mod ds;
pub mod engine;
pub mod error;
pub mod index;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod query;
pub mod record;
#[cfg(feature = "concurrency")]
pub mod shared;
pub mod traits;
pub mod warmup;
