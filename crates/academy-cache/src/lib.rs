//! # Academy Cache
//!
//! Redis read-through cache for user lookups.
//!
//! - [`config`]: `REDIS_URL`, `CACHE_TTL_SECONDS` and `CACHE_PREFIX`
//! - [`redis`]: [`RedisCache`] client with JSON values
//! - [`keys`]: Key builders and invalidation helpers
//!
//! The cache is optional. Handlers take `Option<&RedisCache>` and treat any
//! cache failure as a miss, so the API keeps working when Redis is down.
//!
//! # Example
//!
//! ```ignore
//! use academy_cache::{CacheConfig, RedisCache, keys};
//!
//! let cache = RedisCache::connect(&CacheConfig::from_env()).await?;
//! cache.set(&keys::users::list(), &users).await?;
//! let hit: Option<Vec<UserDetail>> = cache.get(&keys::users::list()).await;
//! ```

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use redis::{CacheError, RedisCache};
