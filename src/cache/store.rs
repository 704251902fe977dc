//! Cache storage.
//!
//! Collections are stored type-erased so one process-wide store can hold every
//! entity type. The typed view lives in [`super::service::CacheService`].

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use metrics::counter;
use moka::Expiry;
use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::debug;

use crate::application::repos::RepoError;

use super::config::ExpirationPolicy;
use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_HIT: &str = "registry_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "registry_cache_miss_total";
pub(crate) const METRIC_CACHE_LOAD: &str = "registry_cache_load_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "registry_cache_evict_total";

/// A cached full collection, erased to `Arc<Vec<T>>`.
pub type CachedCollection = Arc<dyn Any + Send + Sync>;

/// Pending load of a full collection from the backing store.
pub type CollectionLoad = BoxFuture<'static, Result<CachedCollection, RepoError>>;

/// Produces the load for a miss. Never called on a hit.
pub type CollectionLoader = Box<dyn FnOnce() -> CollectionLoad + Send>;

/// Storage behind the cache-aside façade.
///
/// The provided `get_or_load` performs no mutual exclusion: concurrent misses
/// on the same key each run their loader and the last insert wins. Use
/// [`super::SingleFlightCache`] to deduplicate reloads.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Return the live entry for `key`, refreshing its sliding window.
    async fn get(&self, key: CacheKey) -> Option<CachedCollection>;

    async fn insert(&self, key: CacheKey, value: CachedCollection, policy: ExpirationPolicy);

    /// Evict `key`. Absent keys are ignored.
    async fn remove(&self, key: CacheKey);

    async fn get_or_load(
        &self,
        key: CacheKey,
        policy: ExpirationPolicy,
        loader: CollectionLoader,
    ) -> Result<CachedCollection, RepoError> {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        counter!(METRIC_CACHE_LOAD, "key" => key.as_str()).increment(1);
        let value = loader().await?;
        self.insert(key, value.clone(), policy).await;
        debug!(key = %key, "cache populated from backing store");
        Ok(value)
    }
}

/// A stored collection with the expiration it was inserted under.
#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) collection: CachedCollection,
    pub(crate) policy: ExpirationPolicy,
}

/// Per-entry time-to-live plus time-to-idle: an entry lives at most
/// `absolute` after insert and at most `sliding` after its last read.
struct SlotExpiry;

impl SlotExpiry {
    fn remaining(policy: &ExpirationPolicy, age: Duration) -> Duration {
        policy.absolute.saturating_sub(age).min(policy.sliding)
    }
}

impl Expiry<CacheKey, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        slot: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(&slot.policy, Duration::ZERO))
    }

    fn expire_after_read(
        &self,
        _key: &CacheKey,
        slot: &Slot,
        read_at: Instant,
        _duration_until_expiry: Option<Duration>,
        last_modified_at: Instant,
    ) -> Option<Duration> {
        let age = read_at.saturating_duration_since(last_modified_at);
        Some(Self::remaining(&slot.policy, age))
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        slot: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(&slot.policy, Duration::ZERO))
    }
}

fn record_removal(key: Arc<CacheKey>, _slot: Slot, cause: RemovalCause) {
    let reason = match cause {
        RemovalCause::Expired => "expired",
        RemovalCause::Explicit => "invalidated",
        RemovalCause::Replaced => return,
        RemovalCause::Size => "size",
    };
    counter!(METRIC_CACHE_EVICT, "key" => key.as_str(), "reason" => reason).increment(1);
    debug!(key = %key, reason, "cache entry removed");
}

/// Process-wide in-memory collection cache.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<CacheKey, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        let entries = Cache::builder()
            .name("registry-collections")
            .expire_after(SlotExpiry)
            .eviction_listener(record_removal)
            .build();
        Self { entries }
    }

    pub(crate) fn entries(&self) -> &Cache<CacheKey, Slot> {
        &self.entries
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: CacheKey) -> Option<CachedCollection> {
        match self.entries.get(&key).await {
            Some(slot) => {
                counter!(METRIC_CACHE_HIT, "key" => key.as_str()).increment(1);
                debug!(key = %key, "cache hit");
                Some(slot.collection)
            }
            None => {
                counter!(METRIC_CACHE_MISS, "key" => key.as_str()).increment(1);
                debug!(key = %key, "cache miss");
                None
            }
        }
    }

    async fn insert(&self, key: CacheKey, value: CachedCollection, policy: ExpirationPolicy) {
        let slot = Slot {
            collection: value,
            policy,
        };
        self.entries.insert(key, slot).await;
    }

    async fn remove(&self, key: CacheKey) {
        self.entries.invalidate(&key).await;
    }
}
