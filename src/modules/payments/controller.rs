use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use academy_core::AppError;
use academy_models::PaymentId;

use crate::audit_event;
use crate::metrics::track_payment;
use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::payments::model::{
    CallbackQuery, CallbackResponse, InitializePaymentDto, InitializedPayment,
    PaginatedPaymentsResponse, Payment, PaymentEnvelope, PaymentFilterParams, PaymentStatusData,
    VerifyPaymentDto, to_kobo,
};
use crate::modules::payments::paystack::{InitializeTransaction, PaystackClient, PaystackError};
use crate::modules::payments::service::{PaymentService, callback_url, new_reference};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List payments
#[utoipa::path(
    get,
    path = "/api/payments",
    params(PaymentFilterParams),
    responses(
        (status = 200, description = "The caller's payments, or all for staff", body = PaginatedPaymentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<PaymentFilterParams>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let payments = PaymentService::get_payments(&state.db, owner, filters).await?;
    Ok(Json(payments))
}

/// Get a payment
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment found", body = Payment),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, AppError> {
    let payment = PaymentService::get_payment(&state.db, id).await?;
    if !auth_user.owns_or_admin(payment.user_id) {
        return Err(AppError::not_found(anyhow!("Payment not found")));
    }
    Ok(Json(payment))
}

/// Start a Paystack checkout
#[utoipa::path(
    post,
    path = "/api/payments/initialize",
    request_body = InitializePaymentDto,
    responses(
        (status = 200, description = "Payment initialized", body = PaymentEnvelope<InitializedPayment>),
        (status = 400, description = "Invalid amount or Paystack refused", body = PaymentEnvelope<InitializedPayment>),
        (status = 500, description = "Paystack is not configured", body = PaymentEnvelope<InitializedPayment>)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn initialize_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<InitializePaymentDto>,
) -> Result<Response, AppError> {
    if dto.amount <= Decimal::ZERO {
        return Err(AppError::invalid("Amount must be greater than 0"));
    }

    let reference = new_reference();
    let payment =
        PaymentService::create_pending(&state.db, auth_user.user_id()?, &dto, &reference).await?;
    let callback = callback_url(&state.app_config.base_url, state.app_config.debug);

    let client = PaystackClient::new(&state.paystack_config);
    let body = InitializeTransaction {
        amount: to_kobo(dto.amount),
        email: &dto.email,
        reference: &reference,
        callback_url: &callback,
        metadata: dto.metadata.as_ref(),
    };

    let failure = match client.initialize_transaction(&body).await {
        Ok(response) if response.status => match response.data {
            Some(data) => {
                track_payment("initialized");
                audit_event!(
                    "initialize",
                    "payment",
                    reference = %reference,
                    amount = %payment.amount,
                    user_email = %auth_user.email()
                );
                let envelope = PaymentEnvelope::success(
                    "Payment initialized",
                    InitializedPayment {
                        authorization_url: data.authorization_url,
                        access_code: data.access_code,
                        reference,
                    },
                );
                return Ok((StatusCode::OK, Json(envelope)).into_response());
            }
            None => (
                StatusCode::BAD_REQUEST,
                "Payment initialization failed".to_string(),
            ),
        },
        Ok(response) => {
            let message = if response.message.is_empty() {
                "Payment initialization failed".to_string()
            } else {
                response.message
            };
            (StatusCode::BAD_REQUEST, message)
        }
        Err(e @ PaystackError::MissingSecret) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()),
    };

    let (status, message) = failure;
    warn!(reference = %payment.reference, error = %message, "Payment initialization failed");
    track_payment("initialize_failed");
    PaymentService::delete_payment(&state.db, payment.id).await?;

    Ok((
        status,
        Json(PaymentEnvelope::<InitializedPayment>::error(message)),
    )
        .into_response())
}

/// Read a payment's stored status
#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentDto,
    responses(
        (status = 200, description = "Payment status retrieved", body = PaymentEnvelope<PaymentStatusData>),
        (status = 404, description = "Payment not found", body = PaymentEnvelope<PaymentStatusData>)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn verify_payment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<VerifyPaymentDto>,
) -> Result<Response, AppError> {
    let response = match PaymentService::find_by_reference(&state.db, &dto.reference).await? {
        Some(payment) => (
            StatusCode::OK,
            Json(PaymentEnvelope::success(
                "Payment status retrieved",
                PaymentStatusData::from(payment),
            )),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(PaymentEnvelope::<PaymentStatusData>::error(
                "Payment not found",
            )),
        )
            .into_response(),
    };
    Ok(response)
}

/// Landing point after the Paystack checkout
#[utoipa::path(
    get,
    path = "/api/payments/callback/",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Reference echoed back", body = CallbackResponse),
        (status = 400, description = "No reference provided", body = PaymentEnvelope<CallbackResponse>)
    ),
    tag = "Payments"
)]
#[instrument(skip(query))]
pub async fn payment_callback(Query(query): Query<CallbackQuery>) -> Response {
    match query.reference.filter(|r| !r.trim().is_empty()) {
        Some(reference) => Json(CallbackResponse {
            status: "success".to_string(),
            reference,
            message: "Please verify payment using the verify endpoint".to_string(),
        })
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(PaymentEnvelope::<CallbackResponse>::error(
                "No reference provided",
            )),
        )
            .into_response(),
    }
}
