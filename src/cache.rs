//! Persistent rating cache.
//!
//! Entries are keyed by [`CacheKey`] and stored in their serialized string
//! form (`"4.2 - 37"` or `"N/A"`), so any string key/value backend can hold
//! them. Writes are last-writer-wins; there is no eviction.

use crate::key::CacheKey;
use crate::rating::RatingRecord;
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::warn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backing store could not be opened.
    Unavailable(String),
    Write { key: String, reason: String },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Unavailable(reason) => write!(f, "Cache storage unavailable: {}", reason),
            CacheError::Write { key, reason } => {
                write!(f, "Failed to store '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for CacheError {}

/// Durable key/value map from cache key to rating record.
///
/// `get` never fails from the caller's point of view: read errors and
/// unparsable stored values are reported as a miss.
pub trait CacheStore {
    fn get<'a>(&'a self, key: &'a CacheKey) -> LocalBoxFuture<'a, Option<RatingRecord>>;

    fn set<'a>(
        &'a self,
        key: &'a CacheKey,
        record: &'a RatingRecord,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>>;
}

/// Parse a stored value, treating garbage as absent.
pub(crate) fn decode_entry(key: &CacheKey, raw: &str) -> Option<RatingRecord> {
    match raw.parse() {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Ignoring corrupt cache entry {}: {}", key, e);
            None
        }
    }
}

/// In-memory store for a single thread. Used natively and in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw serialized values.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RefCell::new(entries),
        }
    }

    /// The raw stored string for `key`, if any.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get<'a>(&'a self, key: &'a CacheKey) -> LocalBoxFuture<'a, Option<RatingRecord>> {
        let found = self
            .entries
            .borrow()
            .get(key.as_str())
            .and_then(|raw| decode_entry(key, raw));
        future::ready(found).boxed_local()
    }

    fn set<'a>(
        &'a self,
        key: &'a CacheKey,
        record: &'a RatingRecord,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        self.entries
            .borrow_mut()
            .insert(key.as_str().to_string(), record.to_string());
        future::ready(Ok(())).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key;
    use crate::rating::Rating;
    use futures::executor::block_on;

    #[test]
    fn stores_serialized_form() {
        let cache = MemoryCache::new();
        let key = derive_key("Jane Smith");
        block_on(cache.set(&key, &RatingRecord::Resolved(Rating::new(4.2, 37)))).unwrap();
        assert_eq!(cache.raw("J. SMITH").as_deref(), Some("4.2 - 37"));
        assert_eq!(
            block_on(cache.get(&key)),
            Some(RatingRecord::Resolved(Rating::new(4.2, 37)))
        );
    }

    #[test]
    fn last_writer_wins() {
        let cache = MemoryCache::new();
        let key = derive_key("A. Lee");
        block_on(cache.set(&key, &RatingRecord::Unavailable)).unwrap();
        block_on(cache.set(&key, &RatingRecord::Resolved(Rating::new(3.5, 4)))).unwrap();
        assert_eq!(cache.raw("A. LEE").as_deref(), Some("3.5 - 4"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let cache = MemoryCache::with_entries([("J. SMITH", "four stars")]);
        assert_eq!(block_on(cache.get(&derive_key("Jane Smith"))), None);
    }
}
