//! Paystack webhook endpoint.
//!
//! Responses are plain text. Every request is authenticated with the
//! `x-paystack-signature` header: HMAC-SHA512 of the raw body keyed with the
//! Paystack secret, hex encoded.

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::{error, info, instrument, warn};

use academy_models::{NotificationType, PaymentStatus, RecipientType};

use crate::metrics::{track_payment, track_webhook};
use crate::modules::notifications::model::NewNotification;
use crate::modules::notifications::tasks;
use crate::modules::payments::model::Payment;
use crate::modules::payments::service::PaymentService;
use crate::security_event;
use crate::state::AppState;
use crate::utils::request::client_ip;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("HTTPS required for webhook endpoint in production. Paystack webhooks require HTTPS.")]
    HttpsRequired,
    #[error("Missing signature header")]
    MissingSignature,
    #[error("Server configuration error")]
    MissingSecret,
    #[error("Empty request body")]
    EmptyBody,
    #[error("Error reading request body")]
    UnreadableBody,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid encoding")]
    InvalidEncoding,
    #[error("Invalid JSON payload")]
    InvalidJson,
    #[error("Missing '{0}' field in payload")]
    MissingField(&'static str),
    #[error("Error processing webhook")]
    Processing,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingSecret | WebhookError::Processing => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// A verified, well-formed webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event: String,
    pub event_id: String,
    pub data: serde_json::Value,
}

/// Constant-time comparison of the hex signature against the body's HMAC.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Paystack sends numeric ids; strings are accepted too.
fn id_field(value: &serde_json::Value) -> Option<String> {
    match value.get("id")? {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let text = std::str::from_utf8(body).map_err(|_| WebhookError::InvalidEncoding)?;
    let payload: serde_json::Value =
        serde_json::from_str(text).map_err(|_| WebhookError::InvalidJson)?;

    let event = payload
        .get("event")
        .and_then(|e| e.as_str())
        .filter(|e| !e.is_empty())
        .ok_or(WebhookError::MissingField("event"))?
        .to_string();
    let data = payload
        .get("data")
        .filter(|d| d.as_object().is_some_and(|fields| !fields.is_empty()))
        .cloned()
        .ok_or(WebhookError::MissingField("data"))?;
    // The envelope id identifies the delivery; the transaction id stands in
    // when Paystack omits it.
    let event_id = id_field(&payload)
        .or_else(|| id_field(&data))
        .ok_or(WebhookError::MissingField("id"))?;

    Ok(WebhookEvent {
        event,
        event_id,
        data,
    })
}

/// Every check that runs before the event is dispatched, in order.
pub fn authenticate(
    headers: &HeaderMap,
    body: &[u8],
    secret: Option<&str>,
    debug: bool,
) -> Result<WebhookEvent, WebhookError> {
    let is_secure = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
    if !debug && !is_secure {
        return Err(WebhookError::HttpsRequired);
    }
    if !is_secure {
        warn!("Webhook received over HTTP in development mode");
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;
    let secret = secret.ok_or(WebhookError::MissingSecret)?;

    if body.is_empty() {
        return Err(WebhookError::EmptyBody);
    }
    if !verify_signature(secret, body, signature) {
        return Err(WebhookError::InvalidSignature);
    }

    parse_event(body)
}

fn payment_notification(payment: &Payment) -> NewNotification {
    NewNotification {
        user_id: payment.user_id,
        recipient_type: RecipientType::Student,
        notification_type: NotificationType::Payment,
        title: "Payment received".to_string(),
        message: format!(
            "Your payment of {} (reference {}) was successful.",
            payment.amount, payment.reference
        ),
        action_url: None,
        related_object_id: Some(payment.id.into_inner()),
        related_object_type: Some("payment".to_string()),
    }
}

async fn handle_charge(
    state: &AppState,
    event: &WebhookEvent,
    status: PaymentStatus,
) -> Result<(), WebhookError> {
    let updated = PaymentService::apply_charge(&state.db, &event.data, &event.event_id, status)
        .await
        .map_err(|e| {
            error!(event_id = %event.event_id, error = %e.message(), "Failed to apply charge event");
            WebhookError::Processing
        })?;

    if let Some(payment) = updated {
        track_payment(payment.status.as_str());
        if payment.status == PaymentStatus::Completed
            && let Err(e) = tasks::notify(state, payment_notification(&payment)).await
        {
            warn!(reference = %payment.reference, error = %e.message(), "Failed to create payment notification");
        }
    }
    Ok(())
}

/// Receive a Paystack event
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    request_body(content = String, description = "Raw Paystack event JSON", content_type = "application/json"),
    params(("x-paystack-signature" = String, Header, description = "Hex HMAC-SHA512 of the body")),
    responses(
        (status = 200, description = "Processed or acknowledged", body = String),
        (status = 400, description = "Malformed request", body = String),
        (status = 401, description = "Invalid signature", body = String),
        (status = 500, description = "Processing failed", body = String)
    ),
    tag = "Payments"
)]
#[instrument(skip_all)]
pub async fn paystack_webhook(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let ip = client_ip(&parts.headers, &parts.extensions)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    info!(client_ip = %ip, "Webhook request received");

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(_) => return WebhookError::UnreadableBody.into_response(),
    };

    let event = match authenticate(
        &parts.headers,
        &body,
        state.paystack_config.secret_key.as_deref(),
        state.app_config.debug,
    ) {
        Ok(event) => event,
        Err(e) => {
            match e {
                WebhookError::InvalidSignature | WebhookError::HttpsRequired => {
                    security_event!("webhook_rejected", client_ip = %ip, reason = %e);
                }
                WebhookError::MissingSecret => {
                    error!("PAYSTACK_SECRET_KEY is not configured");
                }
                _ => warn!(client_ip = %ip, reason = %e, "Webhook rejected"),
            }
            track_webhook("unknown", "rejected");
            return e.into_response();
        }
    };

    info!(event = %event.event, event_id = %event.event_id, client_ip = %ip, "Processing webhook event");

    let result = match event.event.as_str() {
        "charge.success" => handle_charge(&state, &event, PaymentStatus::Completed).await,
        "charge.failed" => handle_charge(&state, &event, PaymentStatus::Failed).await,
        "transfer.success" | "transfer.failed" => {
            info!(event = %event.event, event_id = %event.event_id, data = %event.data, "Transfer event");
            Ok(())
        }
        other => {
            info!(event = other, event_id = %event.event_id, "Unhandled webhook event type");
            track_webhook(other, "ignored");
            return (
                StatusCode::OK,
                format!("Event {} received but not handled", other),
            )
                .into_response();
        }
    };

    match result {
        Ok(()) => {
            track_webhook(&event.event, "processed");
            (StatusCode::OK, "Webhook received and processed").into_response()
        }
        Err(e) => {
            track_webhook(&event.event, "error");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "sk_test_secret";

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn headers(signature: Option<&str>, https: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(signature) = signature {
            headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        }
        if https {
            headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        }
        headers
    }

    #[test]
    fn signature_round_trip() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign(SECRET, body);
        assert_eq!(signature.len(), 128);
        assert!(verify_signature(SECRET, body, &signature));
        assert!(!verify_signature("other", body, &signature));
        assert!(!verify_signature(SECRET, b"tampered", &signature));
        assert!(!verify_signature(SECRET, body, "not-hex"));
    }

    #[test]
    fn checks_run_in_order() {
        let body = br#"{"event":"charge.success","data":{"id":1,"reference":"PAY-x"}}"#;
        let good = sign(SECRET, body);

        assert_eq!(
            authenticate(&headers(Some(&good), false), body, Some(SECRET), false),
            Err(WebhookError::HttpsRequired)
        );
        assert_eq!(
            authenticate(&headers(None, true), body, Some(SECRET), false),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            authenticate(&headers(Some(&good), true), body, None, false),
            Err(WebhookError::MissingSecret)
        );
        assert_eq!(
            authenticate(&headers(Some(&good), true), b"", Some(SECRET), false),
            Err(WebhookError::EmptyBody)
        );
        assert_eq!(
            authenticate(&headers(Some("00"), true), body, Some(SECRET), false),
            Err(WebhookError::InvalidSignature)
        );

        let event = authenticate(&headers(Some(&good), false), body, Some(SECRET), true).unwrap();
        assert_eq!(event.event, "charge.success");
        assert_eq!(event.event_id, "1");
    }

    #[test]
    fn payload_errors() {
        assert_eq!(parse_event(&[0xff, 0xfe]), Err(WebhookError::InvalidEncoding));
        assert_eq!(parse_event(b"{not json"), Err(WebhookError::InvalidJson));
        assert_eq!(
            parse_event(br#"{"data":{"id":1}}"#),
            Err(WebhookError::MissingField("event"))
        );
        assert_eq!(
            parse_event(br#"{"event":"charge.success"}"#),
            Err(WebhookError::MissingField("data"))
        );
        assert_eq!(
            parse_event(br#"{"event":"charge.success","data":{}}"#),
            Err(WebhookError::MissingField("data"))
        );
        assert_eq!(
            parse_event(br#"{"event":"charge.success","data":[1]}"#),
            Err(WebhookError::MissingField("data"))
        );
        assert_eq!(
            parse_event(br#"{"event":"charge.success","data":{"reference":"PAY-x"}}"#),
            Err(WebhookError::MissingField("id"))
        );
    }

    #[test]
    fn envelope_id_wins_over_transaction_id() {
        let event = parse_event(
            br#"{"id":"evt_77","event":"charge.success","data":{"id":9001,"reference":"PAY-x"}}"#,
        )
        .unwrap();
        assert_eq!(event.event_id, "evt_77");

        let event =
            parse_event(br#"{"event":"charge.success","data":{"id":9001,"reference":"PAY-x"}}"#)
                .unwrap();
        assert_eq!(event.event_id, "9001");
    }

    #[test]
    fn error_messages_and_statuses() {
        assert_eq!(
            WebhookError::MissingField("event").to_string(),
            "Missing 'event' field in payload"
        );
        assert_eq!(
            WebhookError::MissingField("id").to_string(),
            "Missing 'id' field in payload"
        );
        assert_eq!(WebhookError::InvalidSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            WebhookError::MissingSecret.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::Processing.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(WebhookError::EmptyBody.status(), StatusCode::BAD_REQUEST);
    }
}
