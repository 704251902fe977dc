//! Optional stampede protection for cache repopulation.
//!
//! Concurrent misses on the same key share one load: the first caller's
//! loader runs and the rest wait for its result. A failed load is shared with
//! every waiter and nothing is cached.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::debug;

use crate::application::repos::RepoError;

use super::config::ExpirationPolicy;
use super::keys::CacheKey;
use super::store::{
    CacheBackend, CachedCollection, CollectionLoader, METRIC_CACHE_LOAD, MemoryCache, Slot,
};

#[derive(Clone, Default)]
pub struct SingleFlightCache {
    inner: MemoryCache,
}

impl SingleFlightCache {
    pub fn new(inner: MemoryCache) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }
}

#[async_trait]
impl CacheBackend for SingleFlightCache {
    async fn get(&self, key: CacheKey) -> Option<CachedCollection> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: CacheKey, value: CachedCollection, policy: ExpirationPolicy) {
        self.inner.insert(key, value, policy).await;
    }

    async fn remove(&self, key: CacheKey) {
        self.inner.remove(key).await;
    }

    async fn get_or_load(
        &self,
        key: CacheKey,
        policy: ExpirationPolicy,
        loader: CollectionLoader,
    ) -> Result<CachedCollection, RepoError> {
        if let Some(hit) = self.inner.get(key).await {
            return Ok(hit);
        }

        let slot = self
            .inner
            .entries()
            .try_get_with(key, async move {
                counter!(METRIC_CACHE_LOAD, "key" => key.as_str()).increment(1);
                debug!(key = %key, "loading collection for coalesced callers");
                let collection = loader().await?;
                Ok::<_, RepoError>(Slot { collection, policy })
            })
            .await
            .map_err(Arc::unwrap_or_clone)?;
        Ok(slot.collection)
    }
}
