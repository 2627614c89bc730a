//! Durable rating cache in `localStorage`.

use crate::cache::{decode_entry, CacheError, CacheStore};
use crate::config::STORAGE_PREFIX;
use crate::key::CacheKey;
use crate::rating::RatingRecord;
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::warn;
use web_sys::Storage;

pub struct LocalStorageCache {
    storage: Storage,
}

impl LocalStorageCache {
    pub fn open() -> Result<Self, CacheError> {
        let window =
            web_sys::window().ok_or_else(|| CacheError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| CacheError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| CacheError::Unavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }

    fn storage_key(key: &CacheKey) -> String {
        format!("{}{}", STORAGE_PREFIX, key)
    }
}

impl CacheStore for LocalStorageCache {
    fn get<'a>(&'a self, key: &'a CacheKey) -> LocalBoxFuture<'a, Option<RatingRecord>> {
        let found = match self.storage.get_item(&Self::storage_key(key)) {
            Ok(Some(raw)) => decode_entry(key, &raw),
            Ok(None) => None,
            Err(e) => {
                warn!("Reading {} from localStorage failed: {:?}", key, e);
                None
            }
        };
        future::ready(found).boxed_local()
    }

    fn set<'a>(
        &'a self,
        key: &'a CacheKey,
        record: &'a RatingRecord,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        let result = self
            .storage
            .set_item(&Self::storage_key(key), &record.to_string())
            .map_err(|e| CacheError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            });
        future::ready(result).boxed_local()
    }
}
