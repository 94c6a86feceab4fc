//! User collections and the read-through collection cache.
//!
//! Collections are owned by an external store, reached through the
//! [`CollectionSource`] trait. [`CollectionCache`] keeps one parsed snapshot
//! of that store and reloads it only after [`invalidate`](CollectionCache::invalidate)
//! marks it stale. The engine invalidates synchronously inside every mutation
//! it routes, so a caller always reads its own writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::error::SourceError;

/// Named group of symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collection {
    pub name: String,
    pub description: String,
    pub members: FxHashSet<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            members: FxHashSet::default(),
            created_at: now,
            modified_at: now,
        }
    }

    #[inline]
    pub fn contains(&self, symbol: &str) -> bool {
        self.members.contains(symbol)
    }
}

/// Snapshot of every collection, keyed by name.
pub type CollectionMap = FxHashMap<String, Collection>;

/// External store that owns collection data.
pub trait CollectionSource {
    /// Loads the current state of every collection.
    fn load(&self) -> Result<CollectionMap, SourceError>;
}

impl<S: CollectionSource + ?Sized> CollectionSource for Box<S> {
    fn load(&self) -> Result<CollectionMap, SourceError> {
        (**self).load()
    }
}

/// Source with no collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollections;

impl CollectionSource for NoCollections {
    fn load(&self) -> Result<CollectionMap, SourceError> {
        Ok(CollectionMap::default())
    }
}

/// In-process collection store.
///
/// Serves as the reference [`CollectionSource`] for hosts that keep
/// collections in memory and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollections {
    collections: CollectionMap,
}

impl InMemoryCollections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection; `false` if the name is taken.
    pub fn create(&mut self, name: &str, description: &str) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }
        self.collections
            .insert(name.to_string(), Collection::new(name, description));
        true
    }

    /// Adds symbols; returns how many were new.
    pub fn add_members<I, S>(&mut self, name: &str, symbols: I) -> Option<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collection = self.collections.get_mut(name)?;
        let before = collection.members.len();
        collection.members.extend(symbols.into_iter().map(Into::into));
        collection.modified_at = Utc::now();
        Some(collection.members.len() - before)
    }

    /// Removes symbols; returns how many were present.
    pub fn remove_members<I, S>(&mut self, name: &str, symbols: I) -> Option<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let collection = self.collections.get_mut(name)?;
        let removed = symbols
            .into_iter()
            .filter(|symbol| collection.members.remove(symbol.as_ref()))
            .count();
        collection.modified_at = Utc::now();
        Some(removed)
    }

    pub fn delete(&mut self, name: &str) -> Option<Collection> {
        self.collections.remove(name)
    }

    /// Renames a collection; `false` if `from` is missing or `to` is taken.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if self.collections.contains_key(to) {
            return false;
        }
        let Some(mut collection) = self.collections.remove(from) else {
            return false;
        };
        collection.name = to.to_string();
        collection.modified_at = Utc::now();
        self.collections.insert(to.to_string(), collection);
        true
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl CollectionSource for InMemoryCollections {
    fn load(&self) -> Result<CollectionMap, SourceError> {
        Ok(self.collections.clone())
    }
}

/// Read-through cache of a [`CollectionSource`].
#[derive(Debug, Default)]
pub struct CollectionCache {
    cached: Option<Arc<CollectionMap>>,
    loads: u64,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached map, loading it from `source` when stale.
    ///
    /// A load failure leaves the cache stale so the next call retries.
    pub fn get_collections<S>(&mut self, source: &S) -> Result<Arc<CollectionMap>, SourceError>
    where
        S: CollectionSource + ?Sized,
    {
        if let Some(cached) = &self.cached {
            return Ok(Arc::clone(cached));
        }

        let loaded = source.load().inspect_err(|err| {
            warn!(error = %err, "collection load failed");
        })?;
        self.loads += 1;
        debug!(collections = loaded.len(), loads = self.loads, "collections loaded");

        let loaded = Arc::new(loaded);
        self.cached = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Marks the cached snapshot stale.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_stale(&self) -> bool {
        self.cached.is_none()
    }

    /// Number of times the source has been loaded.
    pub fn loads(&self) -> u64 {
        self.loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Flaky {
        fail: Cell<bool>,
    }

    impl CollectionSource for Flaky {
        fn load(&self) -> Result<CollectionMap, SourceError> {
            if self.fail.get() {
                Err(SourceError::new("locked"))
            } else {
                Ok(CollectionMap::default())
            }
        }
    }

    #[test]
    fn cache_loads_once_until_invalidated() {
        let mut store = InMemoryCollections::new();
        store.create("Work", "things for work");
        let mut cache = CollectionCache::new();

        let first = cache.get_collections(&store).unwrap();
        let second = cache.get_collections(&store).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.loads(), 1);

        cache.invalidate();
        assert!(cache.is_stale());
        cache.get_collections(&store).unwrap();
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn invalidate_exposes_mutation() {
        let mut store = InMemoryCollections::new();
        store.create("Work", "");
        let mut cache = CollectionCache::new();
        assert!(cache.get_collections(&store).unwrap()["Work"].members.is_empty());

        store.add_members("Work", ["🚀"]);
        cache.invalidate();
        assert!(cache.get_collections(&store).unwrap()["Work"].contains("🚀"));
    }

    #[test]
    fn failed_load_stays_stale() {
        let source = Flaky {
            fail: Cell::new(true),
        };
        let mut cache = CollectionCache::new();
        assert!(cache.get_collections(&source).is_err());
        assert!(cache.is_stale());

        source.fail.set(false);
        assert!(cache.get_collections(&source).is_ok());
        assert!(!cache.is_stale());
    }

    #[test]
    fn store_mutations() {
        let mut store = InMemoryCollections::new();
        assert!(store.create("Work", ""));
        assert!(!store.create("Work", "dup"));
        assert_eq!(store.add_members("Work", ["🚀", "🔥", "🚀"]), Some(2));
        assert_eq!(store.remove_members("Work", ["🔥", "🌋"]), Some(1));
        assert_eq!(store.add_members("Missing", ["🚀"]), None);

        assert!(store.rename("Work", "Office"));
        assert!(!store.rename("Work", "Office"));
        let office = store.delete("Office").unwrap();
        assert_eq!(office.name, "Office");
        assert!(office.contains("🚀"));
        assert!(store.is_empty());
    }
}
