//! Minimal Paystack REST client.
//!
//! Only transaction initialization is wrapped. Error messages never include
//! the secret key.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::Instrument;

use academy_config::PaystackConfig;

use crate::external_http_span;
use crate::utils::tracing::record_http_status;

#[derive(Debug, thiserror::Error)]
pub enum PaystackError {
    #[error("PAYSTACK_SECRET_KEY is not configured")]
    MissingSecret,
    #[error("Failed to {action}: HTTP {status}{}", api_key_hint(.status))]
    Http { action: &'static str, status: u16 },
    #[error("Failed to {action}: Network error")]
    Network { action: &'static str },
}

fn api_key_hint(status: &u16) -> &'static str {
    if *status == 401 {
        " - Invalid API key (check PAYSTACK_SECRET_KEY)"
    } else {
        ""
    }
}

/// Paystack's `{status, message, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction<'a> {
    /// Kobo
    pub amount: i64,
    pub email: &'a str,
    pub reference: &'a str,
    pub callback_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeData {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Clone, Debug)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl PaystackClient {
    pub fn new(config: &PaystackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    fn secret(&self) -> Result<&str, PaystackError> {
        self.secret_key
            .as_deref()
            .ok_or(PaystackError::MissingSecret)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        action: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PaystackError> {
        let response = request
            .bearer_auth(self.secret()?)
            .send()
            .await
            .map_err(|_| PaystackError::Network { action })?;

        let status = response.status();
        record_http_status(status.as_u16());
        if !status.is_success() {
            return Err(PaystackError::Http {
                action,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|_| PaystackError::Network { action })
    }

    pub async fn initialize_transaction(
        &self,
        body: &InitializeTransaction<'_>,
    ) -> Result<PaystackResponse<InitializeData>, PaystackError> {
        let path = "/transaction/initialize";
        let request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body);

        self.send("initialize payment", request)
            .instrument(external_http_span!("paystack", "POST", path))
            .await
    }
}
