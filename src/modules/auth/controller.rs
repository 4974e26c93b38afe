use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use academy_cache::invalidate;
use academy_core::AppError;
use academy_models::{OtpPurpose, UserDetail};

use super::model::{
    AuthResponse, DeleteAccountQuery, EmailExistsResponse, EmailRequest, LoginRequest,
    MessageResponse, RefreshRequest, RegisterRequest, ResetPasswordRequest, TokenPair,
    VerifyOtpRequest,
};
use super::service::AuthService;
use crate::audit_event;
use crate::metrics::track_user_registered;
use crate::middleware::auth::AuthUser;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Emails the OTP from a background task; failures are only logged.
fn spawn_otp_email(state: &AppState, to_email: String, code: String, purpose: OtpPurpose) {
    let email_service = EmailService::new(state.email_config.clone());
    tokio::spawn(async move {
        if let Err(e) = email_service.send_otp(&to_email, &code, purpose).await {
            warn!(error = %e.message(), to = %to_email, "Failed to send OTP email");
        }
    });
}

/// Register a new student or parent
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid role or email already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = AuthService::register(&state.db, dto).await?;

    let otp = AuthService::issue_otp(
        &state.db,
        user.id,
        OtpPurpose::Verification,
        &state.app_config,
    )
    .await?;
    spawn_otp_email(&state, user.email.clone(), otp.code, OtpPurpose::Verification);

    invalidate::user(state.cache(), None).await;
    track_user_registered(user.role.as_str());
    audit_event!("user_registered", "user", user_id = %user.id, role = %user.role);

    let tokens = AuthService::issue_tokens(&user, &state.jwt_config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserDetail::from(user),
            tokens,
        }),
    ))
}

/// Verify the registration OTP
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired OTP", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::verify_email(&state.db, &dto.email, &dto.code).await?;
    invalidate::user(state.cache(), None).await;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// Send a new verification OTP
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "OTP resent", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn resend_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = UserService::get_by_email(&state.db, &dto.email).await?;
    let otp = AuthService::issue_otp(
        &state.db,
        user.id,
        OtpPurpose::Verification,
        &state.app_config,
    )
    .await?;
    spawn_otp_email(&state, user.email, otp.code, OtpPurpose::Verification);

    Ok(Json(MessageResponse::new("OTP resent successfully.")))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, tokens) = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    invalidate::user(state.cache(), Some(user.id.into_inner())).await;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserDetail::from(user),
        tokens,
    }))
}

/// Request a password reset OTP
#[utoipa::path(
    post,
    path = "/api/auth/forget-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset OTP sent", body = MessageResponse),
        (status = 404, description = "User with this email does not exist", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forget_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = UserService::get_by_email(&state.db, &dto.email)
        .await
        .map_err(|_| AppError::not_found(anyhow::anyhow!("User with this email does not exist")))?;

    let otp = AuthService::issue_otp(
        &state.db,
        user.id,
        OtpPurpose::PasswordReset,
        &state.app_config,
    )
    .await?;
    spawn_otp_email(&state, user.email, otp.code, OtpPurpose::PasswordReset);

    Ok(Json(MessageResponse::new(
        "Password reset OTP sent to your email.",
    )))
}

/// Reset the password with a reset OTP
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Passwords do not match or invalid OTP", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_password(&state.db, dto).await?;
    Ok(Json(MessageResponse::new("Password reset successfully.")))
}

/// Check whether an email is registered
#[utoipa::path(
    post,
    path = "/api/auth/check-email-exists",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Lookup result", body = EmailExistsResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn check_email_exists(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<EmailRequest>,
) -> Result<Json<EmailExistsResponse>, AppError> {
    let exists = AuthService::email_exists(&state.db, &dto.email).await?;
    Ok(Json(EmailExistsResponse { exists }))
}

/// Delete the caller's account, or any account for admins
#[utoipa::path(
    delete,
    path = "/api/auth/delete-account",
    params(DeleteAccountQuery),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only admins may delete other accounts", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<DeleteAccountQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let caller_id = auth_user.user_id()?;
    let target_id = query.user_id.map(Into::into).unwrap_or(caller_id);

    if target_id != caller_id && !auth_user.is_admin() {
        return Err(AppError::forbidden(
            "You do not have permission to delete other users.",
        ));
    }

    AuthService::delete_account(&state.db, target_id).await?;
    invalidate::user(state.cache(), Some(target_id.into_inner())).await;
    audit_event!("user_deleted", "user", user_id = %target_id, actor = %caller_id);

    Ok(Json(MessageResponse::new("Account deleted successfully.")))
}

/// Blacklist a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 400, description = "Token is invalid or already blacklisted", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state.db, &dto.refresh, &state.jwt_config).await?;
    Ok(Json(MessageResponse::new("Successfully logged out")))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Token is invalid, expired or blacklisted", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let tokens = AuthService::refresh(&state.db, &dto.refresh, &state.jwt_config).await?;
    Ok(Json(tokens))
}
