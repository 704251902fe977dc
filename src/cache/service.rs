//! Typed cache-aside façade shared by every handler.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::repos::RepoError;
use crate::domain::Entity;

use super::config::{CacheConfig, ExpirationPolicy};
use super::keys::CacheKey;
use super::single_flight::SingleFlightCache;
use super::store::{CacheBackend, CachedCollection, CollectionLoader, MemoryCache};

/// Cache-aside over full entity collections.
///
/// The cache never loads on its own initiative except inside
/// [`CacheService::get_or_create`]; writers are expected to call
/// [`CacheService::remove`] after a successful mutation.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    policy: ExpirationPolicy,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>, policy: ExpirationPolicy) -> Self {
        Self { backend, policy }
    }

    /// Build the process cache described by `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        let backend: Arc<dyn CacheBackend> = if config.single_flight {
            Arc::new(SingleFlightCache::new(MemoryCache::new()))
        } else {
            Arc::new(MemoryCache::new())
        };
        Self::new(backend, config.expiration())
    }

    /// Expiration configured for this process.
    pub fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    /// Return the cached collection under `key`, or run `loader` and cache its result.
    ///
    /// `loader` is called only on a miss. A loader error is returned as-is and
    /// nothing is cached.
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: CacheKey,
        loader: F,
        cancel: &CancellationToken,
        policy: ExpirationPolicy,
    ) -> Result<Arc<Vec<T>>, RepoError>
    where
        T: Entity,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, RepoError>> + Send + 'static,
    {
        let token = cancel.clone();
        let load: CollectionLoader = Box::new(move || {
            Box::pin(async move {
                let items = loader(token).await?;
                Ok(Arc::new(items) as CachedCollection)
            })
        });

        let cached = self.backend.get_or_load(key, policy, load).await?;
        match cached.downcast::<Vec<T>>() {
            Ok(items) => Ok(items),
            Err(_) => {
                warn!(
                    key = %key,
                    entity = T::NAME,
                    "cached collection holds a different entity type; dropping entry"
                );
                self.backend.remove(key).await;
                Err(RepoError::Integrity {
                    message: format!("cache key `{key}` is not registered for `{}`", T::NAME),
                })
            }
        }
    }

    /// Scan the cached collection under `key` for `id`.
    ///
    /// Never loads: an absent collection reports `None`.
    pub async fn get_by_id<T: Entity>(&self, key: CacheKey, id: i64) -> Option<T> {
        let cached = self.backend.get(key).await?;
        let items = cached.downcast::<Vec<T>>().ok()?;
        items.iter().find(|item| item.id() == id).cloned()
    }

    /// Evict the collection under `key`. Idempotent.
    pub async fn remove(&self, key: CacheKey) {
        self.backend.remove(key).await;
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
