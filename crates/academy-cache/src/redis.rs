//! Redis client storing JSON values under prefixed keys.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::CacheConfig;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: String,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisCache {
    /// Opens a managed connection. Fails when Redis is unreachable.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            prefix: config.key_prefix.clone(),
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        })
    }

    /// `{prefix}:{key}`
    pub fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Returns the cached value, or `None` on a miss or any error.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = self.full_key(key);
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value)) => match serde_json::from_str(&value) {
                Ok(parsed) => {
                    debug!(cache.key = %key, "Cache hit");
                    Some(parsed)
                }
                Err(e) => {
                    error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                    None
                }
            },
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                None
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET error");
                None
            }
        }
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    pub async fn set_with_ttl<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let key = self.full_key(key);
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();

        conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs()).await?;
        debug!(cache.key = %key, cache.ttl_secs = ttl.as_secs(), "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let key = self.full_key(key);
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(&key).await?;
        debug!(cache.key = %key, "Cache invalidated");

        Ok(())
    }

    /// Deletes every key matching `pattern` (relative to the prefix) using SCAN.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let pattern = self.full_key(pattern);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += conn.del::<_, u64>(&keys).await?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern invalidation complete");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: i32,
        email: String,
    }

    async fn connect() -> RedisCache {
        let config = CacheConfig {
            key_prefix: "academy-test".into(),
            ..CacheConfig::default()
        };
        RedisCache::connect(&config).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn set_get_and_invalidate() {
        let cache = connect().await;
        let value = Sample {
            id: 1,
            email: "ada@example.com".into(),
        };

        cache.set("users:detail:1", &value).await.unwrap();
        assert_eq!(cache.get::<Sample>("users:detail:1").await, Some(value));

        cache.invalidate("users:detail:1").await.unwrap();
        assert_eq!(cache.get::<Sample>("users:detail:1").await, None);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn pattern_invalidation() {
        let cache = connect().await;
        cache.set("users:detail:a", &1).await.unwrap();
        cache.set("users:detail:b", &2).await.unwrap();

        let deleted = cache.invalidate_pattern("users:detail:*").await.unwrap();
        assert!(deleted >= 2);
        assert_eq!(cache.get::<i32>("users:detail:a").await, None);
    }
}
