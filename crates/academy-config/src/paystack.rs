use std::env;

pub const PAYSTACK_API_BASE: &str = "https://api.paystack.co";

#[derive(Clone, Debug)]
pub struct PaystackConfig {
    /// `PAYSTACK_SECRET_KEY`; `None` when unset or blank
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl PaystackConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("PAYSTACK_SECRET_KEY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| PAYSTACK_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}
