use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use academy_core::text::url_safe_token;
use academy_core::{AppError, PaginationMeta};
use academy_models::{PaymentId, PaymentStatus, UserId};

use crate::modules::payments::model::{
    InitializePaymentDto, PaginatedPaymentsResponse, Payment, PaymentFilterParams,
};

const PAYMENT_COLUMNS: &str = "id, user_id, amount, email, reference, status, paystack_response, \
     metadata, webhook_event_id, verified_via_webhook, created_at, updated_at";

pub const CALLBACK_PATH: &str = "/api/payments/callback/";

pub fn new_reference() -> String {
    format!("PAY-{}", url_safe_token(10))
}

/// Where Paystack sends the payer afterwards. Outside debug mode the URL is
/// upgraded to https.
pub fn callback_url(base_url: &str, debug: bool) -> String {
    let url = format!("{}{}", base_url.trim_end_matches('/'), CALLBACK_PATH);
    if debug || url.starts_with("https://") {
        return url;
    }

    let forced = match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url,
    };
    warn!(callback_url = %forced, "Callback URL was HTTP, forced to HTTPS");
    forced
}

/// What a charge webhook should do to the stored payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeDecision {
    Apply,
    /// This event was already processed.
    Duplicate,
    /// A webhook already settled the payment.
    AlreadySettled,
}

pub fn charge_decision(payment: &Payment, event_id: &str) -> ChargeDecision {
    if payment.webhook_event_id.as_deref() == Some(event_id) {
        return ChargeDecision::Duplicate;
    }
    if payment.status == PaymentStatus::Pending || !payment.verified_via_webhook {
        return ChargeDecision::Apply;
    }
    ChargeDecision::AlreadySettled
}

pub struct PaymentService;

impl PaymentService {
    #[instrument(skip(db, dto))]
    pub async fn create_pending(
        db: &PgPool,
        user_id: UserId,
        dto: &InitializePaymentDto,
        reference: &str,
    ) -> Result<Payment, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (user_id, amount, email, reference, status, metadata)
             VALUES ($1, $2, $3, $4, 'pending', $5)
             RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(dto.amount)
        .bind(&dto.email)
        .bind(reference)
        .bind(&dto.metadata)
        .fetch_one(db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(db))]
    pub async fn delete_payment(db: &PgPool, id: PaymentId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_payment(db: &PgPool, id: PaymentId) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Payment not found")))
    }

    #[instrument(skip(db))]
    pub async fn find_by_reference(
        db: &PgPool,
        reference: &str,
    ) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE reference = $1",
            PAYMENT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(db)
        .await?;

        Ok(payment)
    }

    /// Newest first. `owner` of `None` lists every payment.
    #[instrument(skip(db))]
    pub async fn get_payments(
        db: &PgPool,
        owner: Option<UserId>,
        filters: PaymentFilterParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE ($1::uuid IS NULL OR user_id = $1)",
        )
        .bind(owner)
        .fetch_one(db)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE ($1::uuid IS NULL OR user_id = $1)
             ORDER BY created_at DESC{}",
            PAYMENT_COLUMNS,
            filters.pagination.sql_suffix()
        ))
        .bind(owner)
        .fetch_all(db)
        .await?;

        Ok(PaginatedPaymentsResponse {
            data: payments,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Records the outcome of a `charge.*` webhook. Returns the payment when
    /// it changed, `None` when the event was ignored.
    #[instrument(skip(db, data))]
    pub async fn apply_charge(
        db: &PgPool,
        data: &serde_json::Value,
        event_id: &str,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, AppError> {
        let Some(reference) = data.get("reference").and_then(|r| r.as_str()) else {
            warn!(event_id, "No reference in payment data");
            return Ok(None);
        };

        let Some(payment) = Self::find_by_reference(db, reference).await? else {
            warn!(event_id, reference, "Payment not found for reference");
            return Ok(None);
        };

        match charge_decision(&payment, event_id) {
            ChargeDecision::Duplicate => {
                info!(event_id, reference, "Webhook event already processed");
                return Ok(None);
            }
            ChargeDecision::AlreadySettled => {
                info!(
                    event_id,
                    reference,
                    status = %payment.status,
                    "Payment already settled, skipping update"
                );
                return Ok(None);
            }
            ChargeDecision::Apply => {}
        }

        // Re-checks the decision in SQL so a concurrent writer that settled
        // the row first turns this update into a no-op.
        let updated = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET
                status = $1,
                paystack_response = $2,
                webhook_event_id = $3,
                verified_via_webhook = TRUE,
                updated_at = NOW()
             WHERE id = $4
               AND (status = 'pending' OR NOT verified_via_webhook)
               AND webhook_event_id IS DISTINCT FROM $3
             RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(status)
        .bind(data)
        .bind(event_id)
        .bind(payment.id)
        .fetch_optional(db)
        .await?;

        let Some(updated) = updated else {
            info!(event_id, reference, "Payment settled concurrently, skipping update");
            return Ok(None);
        };

        match status {
            PaymentStatus::Failed => {
                let reason = data
                    .get("gateway_response")
                    .and_then(|r| r.as_str())
                    .unwrap_or("Unknown reason");
                warn!(event_id, reference, amount = %updated.amount, reason, "Payment failed");
            }
            _ => info!(event_id, reference, amount = %updated.amount, "Payment successful"),
        }

        Ok(Some(updated))
    }
}
