//! Process-wide settings that do not belong to a single subsystem.

use std::env;

use crate::{env_flag, env_parse};

pub const DEV_OTP_CODE: &str = "123456";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `DEBUG=True` relaxes the HTTPS checks on payment callbacks and webhooks
    pub debug: bool,
    /// Public base URL used to build callback links
    pub base_url: String,
    pub log_format: LogFormat,
    /// Fixed OTP used instead of random codes; defaults to `123456` in debug
    pub otp_fixed_code: Option<String>,
    pub port: u16,
    /// Base delay before an email retry; the n-th retry waits `base * n`
    pub email_retry_base_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let debug = env_flag("DEBUG", false);
        let otp_fixed_code = match env::var("OTP_FIXED_CODE") {
            Ok(code) if !code.trim().is_empty() => Some(code.trim().to_string()),
            Ok(_) => None,
            Err(_) if debug => Some(DEV_OTP_CODE.to_string()),
            Err(_) => None,
        };

        Self {
            debug,
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            log_format: match env::var("LOG_FORMAT").map(|v| v.to_lowercase()) {
                Ok(v) if v == "json" => LogFormat::Json,
                _ => LogFormat::Text,
            },
            otp_fixed_code,
            port: env_parse("PORT", 3000),
            email_retry_base_secs: env_parse("EMAIL_RETRY_BASE_SECS", 60),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: true,
            base_url: "http://localhost:3000".to_string(),
            log_format: LogFormat::Text,
            otp_fixed_code: Some(DEV_OTP_CODE.to_string()),
            port: 3000,
            email_retry_base_secs: 60,
        }
    }
}
