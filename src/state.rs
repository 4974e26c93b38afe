use academy_cache::{CacheConfig, RedisCache};
use academy_config::{
    AppConfig, CorsConfig, EmailConfig, JwtConfig, PaystackConfig, RateLimitConfig,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::modules::chat::rooms::ChatRooms;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub app_config: AppConfig,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub paystack_config: PaystackConfig,
    /// `None` when Redis is unreachable; every cached read falls back to Postgres.
    pub cache: Option<RedisCache>,
    pub chat_rooms: ChatRooms,
}

impl AppState {
    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = academy_db::init_db_pool().await?;
    academy_db::run_migrations(&db).await?;

    let cache_config = CacheConfig::from_env();
    let cache = match RedisCache::connect(&cache_config).await {
        Ok(cache) => {
            info!(redis_url = %cache_config.redis_url, "Connected to Redis cache");
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, running without cache");
            None
        }
    };

    Ok(AppState {
        db,
        app_config: AppConfig::from_env(),
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        paystack_config: PaystackConfig::from_env(),
        cache,
        chat_rooms: ChatRooms::default(),
    })
}

#[cfg(feature = "test-utils")]
impl AppState {
    /// State for integration tests: debug mode, no SMTP, no Redis, no rate limits.
    pub fn for_tests(db: PgPool) -> Self {
        let mut email_config = EmailConfig::from_env();
        email_config.enabled = false;

        Self {
            db,
            app_config: AppConfig {
                email_retry_base_secs: 0,
                ..AppConfig::default()
            },
            jwt_config: JwtConfig::from_env(),
            email_config,
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::disabled(),
            paystack_config: PaystackConfig::from_env(),
            cache: None,
            chat_rooms: ChatRooms::default(),
        }
    }
}
