//! Error types for the glyphkit engine.
//!
//! ## Key Components
//!
//! - [`EngineError`]: Returned by search, listing, and dataset replacement
//!   operations on [`CacheEngine`](crate::engine::CacheEngine). None of these
//!   are fatal: a failed replacement keeps serving the previous snapshot and a
//!   failed lookup fails only the current request.
//! - [`ConfigError`]: Returned when engine configuration parameters are
//!   invalid (e.g. a zero TTL).
//! - [`SourceError`]: Returned by external collaborators (collection stores)
//!   when they cannot produce a snapshot.
//!
//! ## Example Usage
//!
//! ```
//! use glyphkit::builder::EngineBuilder;
//! use glyphkit::error::EngineError;
//!
//! let mut engine = EngineBuilder::new().build();
//!
//! // Whitespace-only queries are rejected before any cache or index work
//! assert_eq!(engine.search("   ", None, false), Err(EngineError::InvalidQuery));
//!
//! // An empty dataset is a valid state: searches simply find nothing
//! assert_eq!(engine.search("rocket", None, false), Ok(vec![]));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Error returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A dataset replacement was rejected; the previous snapshot is retained.
    #[error("dataset replacement failed: {reason}")]
    DatasetReplaceFailed { reason: String },

    /// A search or listing named a collection that does not exist.
    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    /// The query text was empty or whitespace-only.
    #[error("query text must not be empty")]
    InvalidQuery,

    /// The collection store could not produce a snapshot.
    #[error("failed to load collections: {source}")]
    CollectionLoadFailed {
        #[source]
        source: SourceError,
    },
}

impl EngineError {
    /// Returns `true` if the error only affected the current request.
    ///
    /// A rejected dataset replacement is reported against the dataset event
    /// rather than a request.
    #[inline]
    pub fn is_request_scoped(&self) -> bool {
        !matches!(self, Self::DatasetReplaceFailed { .. })
    }
}

impl From<SourceError> for EngineError {
    fn from(source: SourceError) -> Self {
        Self::CollectionLoadFailed { source }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when engine configuration parameters are invalid.
///
/// Produced by [`EngineBuilder::try_build`](crate::builder::EngineBuilder::try_build)
/// and [`EngineConfig::validate`](crate::config::EngineConfig::validate).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use glyphkit::builder::EngineBuilder;
///
/// let err = EngineBuilder::new().ttl(Duration::ZERO).try_build().unwrap_err();
/// assert!(err.to_string().contains("ttl"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Error reported by an external data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SourceError(String);

impl SourceError {
    /// Creates a new `SourceError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
