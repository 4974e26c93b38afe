//! Per-IP rate limiting for the authentication endpoints.
//!
//! Limits use governor's token bucket: `per_second` tokens are replenished
//! every second up to `burst_size`. Each request takes one token.
//!
//! - `RATE_LIMIT_ENABLED`: default true
//! - `RATE_LIMIT_AUTH_PER_SECOND`: default 10
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: default 5

use std::net::IpAddr;
use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::{env_flag, env_parse};

pub type KeyedLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth_per_second: u32,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", true),
            auth_per_second: env_parse("RATE_LIMIT_AUTH_PER_SECOND", 10),
            auth_burst_size: env_parse("RATE_LIMIT_AUTH_BURST_SIZE", 5),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the keyed limiter for auth routes, or `None` when disabled.
    /// Zero values fall back to 1.
    #[must_use]
    pub fn auth_limiter(&self) -> Option<KeyedLimiter> {
        if !self.enabled {
            return None;
        }
        let per_second = NonZeroU32::new(self.auth_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.auth_burst_size).unwrap_or(NonZeroU32::MIN);
        Some(RateLimiter::keyed(
            Quota::per_second(per_second).allow_burst(burst),
        ))
    }
}
