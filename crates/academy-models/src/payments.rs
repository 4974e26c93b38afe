//! Payments made through Paystack.

use academy_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::enums::PaymentStatus;
use crate::ids::{PaymentId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    #[schema(value_type = String, example = "5000.00")]
    pub amount: Decimal,
    pub email: String,
    /// `PAY-` followed by a url-safe token
    pub reference: String,
    pub status: PaymentStatus,
    #[schema(value_type = Option<Object>)]
    pub paystack_response: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub webhook_event_id: Option<String>,
    pub verified_via_webhook: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InitializePaymentDto {
    #[schema(value_type = String, example = "5000.00")]
    pub amount: Decimal,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentDto {
    #[validate(length(min = 1, message = "Reference is required."))]
    pub reference: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedPaymentsResponse {
    pub data: Vec<Payment>,
    pub meta: PaginationMeta,
}

/// `{status, message, data?}` envelope used by the payment endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentEnvelope<T> {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> PaymentEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusData {
    pub reference: String,
    pub status: PaymentStatus,
    pub verified_via_webhook: bool,
    /// Decimal rendered as a string
    pub amount: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentStatusData {
    fn from(payment: Payment) -> Self {
        Self {
            reference: payment.reference,
            status: payment.status,
            verified_via_webhook: payment.verified_via_webhook,
            amount: payment.amount.to_string(),
            email: payment.email,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    pub status: String,
    pub reference: String,
    pub message: String,
}

/// Amount in kobo, the smallest currency unit Paystack accepts.
pub fn to_kobo(amount: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    (amount * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kobo_conversion_truncates() {
        assert_eq!(to_kobo(Decimal::new(500000, 2)), 500000);
        assert_eq!(to_kobo(Decimal::new(12345, 3)), 1234);
    }

    #[test]
    fn status_data_renders_amount_as_string() {
        let payment = Payment {
            id: PaymentId::new(),
            user_id: UserId::new(),
            amount: Decimal::new(500000, 2),
            email: "ada@example.com".to_string(),
            reference: "PAY-abc".to_string(),
            status: PaymentStatus::Pending,
            paystack_response: None,
            metadata: None,
            webhook_event_id: None,
            verified_via_webhook: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let data = PaymentStatusData::from(payment);
        assert_eq!(data.amount, "5000.00");

        let json = serde_json::to_value(PaymentEnvelope::success("ok", data)).unwrap();
        assert_eq!(json["data"]["status"], "pending");
    }

    #[test]
    fn error_envelope_has_no_data() {
        let json = serde_json::to_value(PaymentEnvelope::<()>::error("Payment not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "Payment not found"})
        );
    }
}
