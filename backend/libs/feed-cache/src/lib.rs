//! Tag-indexed caching layer for feed reads
//!
//! Provides read-through caching with coarse-grained invalidation:
//!
//! ```text
//! Read path (query orchestrator):
//!   1. Compute deterministic key (keys::list_key / keys::item_key)
//!   2. TagCache::get -> hit returns immediately
//!   3. On miss: query the store, TagCache::set with the tier's TTL,
//!      TagCache::track_key under the filter's dimensions
//!
//! Write path (mutation gateway):
//!   1. Persist the mutation
//!   2. Delete the item key, then TagCache::invalidate_tag for each
//!      affected dimension (forum:{id}, forumType:{type}, moduleType:{type})
//!      -> every list key tracked under those tags is dropped
//! ```
//!
//! TTLs are tiered by access pattern: single items are invalidated precisely
//! on mutation and can live longer; list results also rotate as new items
//! arrive, so a shorter TTL bounds staleness even when no explicit mutation
//! event fires. Every entry carries a TTL — it is the backstop for the
//! inherent race between a track landing while its tag is being drained.
//!
//! The registry is process-local. A horizontally scaled deployment needs a
//! shared tag index (e.g. set-based secondary keys in the cache backend);
//! the `KvStore` port keeps that swap contained to this crate.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

mod error;
pub mod keys;
mod memory;
mod redis_store;
mod registry;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use registry::TagRegistry;

/// Default TTL values (seconds)
pub mod ttl {
    /// Single feed item entries (invalidated precisely on mutation)
    pub const ITEM: u64 = 3600; // 1 hour
    /// List result entries (also rotate as new items are created)
    pub const LIST: u64 = 300; // 5 minutes
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Single-item cache TTL in seconds (1 hour)
    pub item_ttl: u64,
    /// List result cache TTL in seconds (5 minutes)
    pub list_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            item_ttl: ttl::ITEM,
            list_ttl: ttl::LIST,
        }
    }
}

/// Key-value cache backend port.
///
/// The backend owns TTL expiry natively; this layer never runs its own
/// expiry sweep.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()>;

    async fn del(&self, key: &str) -> CacheResult<()>;

    async fn del_many(&self, keys: &[String]) -> CacheResult<()>;
}

/// Cache client with tag-based invalidation.
///
/// Values are stored as JSON. Entries are never patched in place: the
/// lifecycle is populate-on-miss, then invalidate (by key or by tag) or
/// expire.
#[derive(Clone)]
pub struct TagCache {
    store: Arc<dyn KvStore>,
    registry: Arc<TagRegistry>,
    config: CacheConfig,
}

impl TagCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    pub fn with_config(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self {
            store,
            registry: Arc::new(TagRegistry::new()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Add jitter to TTL to prevent thundering herd
    fn add_jitter(ttl_secs: u64) -> u64 {
        let jitter_percent = (rand::random::<u32>() % 10) as f64 / 100.0;
        let jitter = (ttl_secs as f64 * jitter_percent).round() as u64;
        ttl_secs + jitter
    }

    /// Get a typed value from the cache.
    ///
    /// A corrupted entry is deleted and reported as a miss rather than
    /// failing the read.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.store.get_raw(key).await? {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    debug!(key = %key, "Cache hit");
                    Ok(Some(value))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache deserialization failed");
                    let _ = self.store.del(key).await;
                    Ok(None)
                }
            },
            None => {
                debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Store a typed value with the given TTL (plus jitter).
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> CacheResult<()> {
        let data = serde_json::to_string(value)?;
        let ttl_with_jitter = Self::add_jitter(ttl_secs);
        self.store.set_raw(key, &data, ttl_with_jitter).await?;

        debug!(key = %key, ttl = ttl_with_jitter, "Cache set");
        Ok(())
    }

    /// Delete a single key.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.store.del(key).await?;
        debug!(key = %key, "Cache delete");
        Ok(())
    }

    /// Register `key` under each of `tags` for later invalidation.
    pub fn track_key(&self, tags: &[String], key: &str) {
        self.registry.track(tags, key);
    }

    /// Drop every cache entry tracked under `tag` and clear the tag.
    ///
    /// Returns the number of keys deleted.
    pub async fn invalidate_tag(&self, tag: &str) -> CacheResult<usize> {
        let keys = self.registry.drain(tag);
        if keys.is_empty() {
            return Ok(0);
        }

        self.store.del_many(&keys).await?;
        debug!(tag = %tag, deleted = keys.len(), "Tag invalidated");
        Ok(keys.len())
    }

    /// Invalidate several tags concurrently (they are independent).
    ///
    /// Backend failures are logged per tag and do not abort the others;
    /// the TTL on each entry bounds staleness for any key a failed delete
    /// left behind. Returns the number of keys deleted across all tags.
    pub async fn invalidate_tags(&self, tags: &[String]) -> usize {
        let results = join_all(tags.iter().map(|tag| self.invalidate_tag(tag))).await;

        let mut deleted = 0;
        for (tag, result) in tags.iter().zip(results) {
            match result {
                Ok(n) => deleted += n,
                Err(e) => warn!(tag = %tag, error = %e, "Tag invalidation failed"),
            }
        }
        deleted
    }

    /// Number of keys currently tracked under `tag` (diagnostics).
    pub fn tracked_count(&self, tag: &str) -> usize {
        self.registry.tracked_count(tag)
    }
}
