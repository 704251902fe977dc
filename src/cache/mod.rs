//! Registry cache system
//!
//! Cache-aside storage of full entity collections, one entry per entity type:
//!
//! - **Read path**: [`CacheService::get_or_create`] serves the cached
//!   collection or loads it from the backing store and caches it.
//! - **Point lookups**: [`CacheService::get_by_id`] scans a cached
//!   collection and never triggers a load.
//! - **Write path**: handlers call [`CacheService::remove`] after every
//!   successful mutation; invalidation is all-or-nothing per entity type.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! absolute_expiration_seconds = 3600
//! sliding_expiration_seconds = 600
//! single_flight = false
//! ```

mod config;
pub mod keys;
mod service;
mod single_flight;
mod store;

pub use config::{CacheConfig, ExpirationPolicy};
pub use keys::CacheKey;
pub use service::CacheService;
pub use single_flight::SingleFlightCache;
pub use store::{CacheBackend, CachedCollection, CollectionLoad, CollectionLoader, MemoryCache};
