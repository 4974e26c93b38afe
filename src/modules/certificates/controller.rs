use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{instrument, warn};

use academy_core::{AppError, PaginationParams};
use academy_models::CertificateId;

use crate::audit_event;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::certificates::model::{
    Certificate, IssueCertificateDto, PaginatedCertificatesResponse,
};
use crate::modules::certificates::service::{CertificateService, certificate_notification};
use crate::modules::notifications::tasks;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List certificates
#[utoipa::path(
    get,
    path = "/api/certificates",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's certificates, or all for admins", body = PaginatedCertificatesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_certificates(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedCertificatesResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let certificates = CertificateService::get_certificates(&state.db, owner, pagination).await?;
    Ok(Json(certificates))
}

/// Get a certificate
#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate found", body = Certificate),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_certificate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CertificateId>,
) -> Result<Json<Certificate>, AppError> {
    let certificate = CertificateService::get_certificate(&state.db, id).await?;
    if !auth_user.owns_or_admin(certificate.user_id) {
        return Err(AppError::not_found(anyhow!("Certificate not found")));
    }
    Ok(Json(certificate))
}

/// Issue a certificate to a student
#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body = IssueCertificateDto,
    responses(
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 400, description = "Already issued for this course", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User or course not found", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn issue_certificate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<IssueCertificateDto>,
) -> Result<(StatusCode, Json<Certificate>), AppError> {
    let certificate = CertificateService::issue_certificate(&state.db, dto).await?;

    audit_event!(
        "issue",
        "certificate",
        certificate_id = %certificate.certificate_id,
        user_id = %certificate.user_id,
        actor_email = %admin.email()
    );

    if let Err(e) = tasks::notify(&state, certificate_notification(&certificate)).await {
        warn!(certificate_id = %certificate.id, error = %e.message(), "Failed to create certificate notification");
    }

    Ok((StatusCode::CREATED, Json(certificate)))
}
