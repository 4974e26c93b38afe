//! # Academy Config
//!
//! Configuration structures loaded from environment variables.
//!
//! - [`app`]: Runtime mode (DEBUG), public base URL, log format, OTP mode
//! - [`jwt`]: JWT secret and token lifetimes
//! - [`cors`]: Allowed CORS origins
//! - [`email`]: SMTP settings
//! - [`paystack`]: Paystack API credentials
//! - [`rate_limit`]: Per-IP rate limits for the auth endpoints
//!
//! # Example
//!
//! ```ignore
//! use academy_config::{AppConfig, JwtConfig};
//!
//! let app = AppConfig::from_env();
//! let jwt = JwtConfig::from_env();
//! ```

pub mod app;
pub mod cors;
pub mod email;
pub mod jwt;
pub mod paystack;
pub mod rate_limit;

pub use app::{AppConfig, LogFormat};
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use paystack::PaystackConfig;
pub use rate_limit::RateLimitConfig;

/// Django-style truthy env flag: `True`, `true`, `1`, `yes`.
pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

pub(crate) fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
