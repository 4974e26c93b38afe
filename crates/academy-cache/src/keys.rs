//! Cache keys, relative to the configured prefix.

use crate::RedisCache;
use tracing::warn;
use uuid::Uuid;

pub mod users {
    use super::Uuid;

    /// The full user list.
    pub fn list() -> String {
        "users:list".to_string()
    }

    pub fn detail(user_id: Uuid) -> String {
        format!("users:detail:{}", user_id)
    }

    pub fn detail_pattern() -> &'static str {
        "users:detail:*"
    }
}

pub mod invalidate {
    use super::*;

    /// Drops the user list and either one user's detail or, when `user_id`
    /// is `None`, every cached detail.
    pub async fn user(cache: Option<&RedisCache>, user_id: Option<Uuid>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.invalidate(&users::list()).await {
            warn!(error = %e, "Failed to invalidate user list cache");
        }

        match user_id {
            Some(id) => {
                if let Err(e) = cache.invalidate(&users::detail(id)).await {
                    warn!(error = %e, user_id = %id, "Failed to invalidate user detail cache");
                }
            }
            None => {
                if let Err(e) = cache.invalidate_pattern(users::detail_pattern()).await {
                    warn!(error = %e, "Failed to invalidate user detail caches");
                }
            }
        }
    }
}
