//! In-memory cache backend
//!
//! TTL-aware adapter used by the test suites and for embedding without
//! external infrastructure. Expiry is checked lazily on read; there is no
//! background sweep.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::{CacheResult, KvStore};

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live (possibly expired, not yet reaped) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, deadline) = entry.value();
                if Instant::now() < *deadline {
                    return Ok(Some(value.clone()));
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn del_many(&self, keys: &[String]) -> CacheResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set_raw("k", "v", 60).await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        store.set_raw("k", "v", 0).await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap(), None);
        // Lazy expiry reaped the entry on read
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_del_many() {
        let store = MemoryStore::new();
        store.set_raw("k1", "v", 60).await.unwrap();
        store.set_raw("k2", "v", 60).await.unwrap();
        store.set_raw("k3", "v", 60).await.unwrap();

        store
            .del_many(&["k1".to_string(), "k2".to_string()])
            .await
            .unwrap();
        assert_eq!(store.get_raw("k1").await.unwrap(), None);
        assert_eq!(store.get_raw("k2").await.unwrap(), None);
        assert_eq!(store.get_raw("k3").await.unwrap(), Some("v".to_string()));
    }
}
