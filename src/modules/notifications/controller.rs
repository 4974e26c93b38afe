use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use academy_core::AppError;
use academy_models::NotificationId;

use crate::audit_event;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::notifications::model::{
    BulkNotificationDto, BulkNotificationResult, Notification, NotificationFilterParams,
    NotificationPreferences, PaginatedNotificationsResponse, PatchPreferencesDto, StatusResponse,
    UnreadCountResponse, UpdatePreferencesDto,
};
use crate::modules::notifications::service::NotificationService;
use crate::modules::notifications::tasks;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "Notifications, newest first", body = PaginatedNotificationsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<NotificationFilterParams>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let notifications =
        NotificationService::list(&state.db, auth_user.user_id()?, filters).await?;
    Ok(Json(notifications))
}

/// Get one of the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification found", body = Notification),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationService::get_own(&state.db, auth_user.user_id()?, id).await?;
    Ok(Json(notification))
}

/// Count unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread_count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 204, description = "Nothing unread"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Response, AppError> {
    let count = NotificationService::unread_count(&state.db, auth_user.user_id()?).await?;
    if count == 0 {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(UnreadCountResponse {
        unread_count: count,
    })
    .into_response())
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/mark_read",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read", body = StatusResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<StatusResponse>, AppError> {
    NotificationService::mark_read(&state.db, auth_user.user_id()?, id).await?;
    Ok(Json(StatusResponse::success()))
}

/// Mark every notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/mark_all_read",
    responses(
        (status = 200, description = "Count of notifications changed", body = StatusResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StatusResponse>, AppError> {
    let updated = NotificationService::mark_all_read(&state.db, auth_user.user_id()?).await?;
    Ok(Json(StatusResponse::updated(updated)))
}

/// Delete one of the caller's notifications
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    NotificationService::delete(&state.db, auth_user.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send one notification to many users
#[utoipa::path(
    post,
    path = "/api/notifications/bulk",
    request_body = BulkNotificationDto,
    responses(
        (status = 200, description = "Per-recipient outcome counts", body = BulkNotificationResult),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn bulk_notify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<BulkNotificationDto>,
) -> Result<Json<BulkNotificationResult>, AppError> {
    let recipients = dto.user_ids.len();
    let kind = dto.notification_type;
    let result = tasks::send_bulk(&state, dto).await;

    audit_event!(
        "bulk_notify",
        "notification",
        actor_email = %admin.email(),
        kind = %kind,
        recipients,
        success = result.success,
        failed = result.failed
    );

    Ok(Json(result))
}

/// Get the caller's notification preferences
#[utoipa::path(
    get,
    path = "/api/notification-preferences",
    responses(
        (status = 200, description = "Preferences, created with defaults on first access", body = NotificationPreferences),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<NotificationPreferences>, AppError> {
    let preferences = NotificationService::get_preferences(&state.db, auth_user.user_id()?).await?;
    Ok(Json(preferences))
}

/// Replace the caller's notification preferences
#[utoipa::path(
    put,
    path = "/api/notification-preferences",
    request_body = UpdatePreferencesDto,
    responses(
        (status = 200, description = "Preferences updated", body = NotificationPreferences),
        (status = 400, description = "A field is missing", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdatePreferencesDto>,
) -> Result<Json<NotificationPreferences>, AppError> {
    let preferences =
        NotificationService::update_preferences(&state.db, auth_user.user_id()?, dto.into())
            .await?;
    Ok(Json(preferences))
}

/// Change some of the caller's notification preferences
#[utoipa::path(
    patch,
    path = "/api/notification-preferences",
    request_body = PatchPreferencesDto,
    responses(
        (status = 200, description = "Preferences updated", body = NotificationPreferences),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn patch_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<PatchPreferencesDto>,
) -> Result<Json<NotificationPreferences>, AppError> {
    let preferences =
        NotificationService::update_preferences(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(preferences))
}
