//! Redis cache backend
//!
//! Adapter over a shared `ConnectionManager`; relies on Redis-native TTL
//! expiry (SETEX) and pipelines multi-key deletes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::sync::Arc;

use crate::{CacheResult, KvStore};

#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
}

impl RedisStore {
    /// Connect to Redis and build the shared connection manager.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    pub fn from_manager(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.as_ref().clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.conn.as_ref().clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.as_ref().clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn del_many(&self, keys: &[String]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.as_ref().clone();
        let mut pipe = Pipeline::new();
        for key in keys {
            pipe.del(key);
        }
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}
