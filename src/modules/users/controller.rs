use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{debug, instrument, warn};

use academy_cache::{invalidate, keys};
use academy_core::AppError;
use academy_models::UserId;

use crate::audit_event;
use crate::middleware::auth::{AuthUser, RequireParent};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::users::model::{
    ChildrenCoursesResponse, LinkChildRequest, LinkChildResponse, UpdateUserDto, UserDetail,
    UserWithProfile,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List all users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserDetail>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<UserDetail>>, AppError> {
    let key = keys::users::list();

    if let Some(cache) = state.cache()
        && let Some(users) = cache.get::<Vec<UserDetail>>(&key).await
    {
        debug!("User list served from cache");
        return Ok(Json(users));
    }

    let users: Vec<UserDetail> = UserService::get_users(&state.db)
        .await?
        .into_iter()
        .map(UserDetail::from)
        .collect();

    if let Some(cache) = state.cache()
        && let Err(e) = cache.set(&key, &users).await
    {
        warn!(error = %e, "Failed to cache user list");
    }

    Ok(Json(users))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>, AppError> {
    let key = keys::users::detail(id.into_inner());

    if let Some(cache) = state.cache()
        && let Some(user) = cache.get::<UserDetail>(&key).await
    {
        return Ok(Json(user));
    }

    let user = UserDetail::from(UserService::get_user(&state.db, id).await?);

    if let Some(cache) = state.cache()
        && let Err(e) = cache.set(&key, &user).await
    {
        warn!(error = %e, user_id = %id, "Failed to cache user detail");
    }

    Ok(Json(user))
}

/// Update a user and their profile
#[utoipa::path(
    put,
    path = "/api/users/{id}/update",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = UserWithProfile),
        (status = 400, description = "Invalid role or duplicate email", body = ErrorResponse),
        (status = 403, description = "Not the account owner", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UserWithProfile>, AppError> {
    if !auth_user.owns_or_admin(id) {
        return Err(AppError::forbidden(
            "You do not have permission to perform this action.",
        ));
    }

    let (user, profile) = UserService::update_user(&state.db, id, dto).await?;
    invalidate::user(state.cache(), Some(id.into_inner())).await;
    audit_event!("user_updated", "user", user_id = %id);

    Ok(Json(UserWithProfile {
        user: UserDetail::from(user),
        profile,
    }))
}

/// Link a student to the calling parent by linking code
#[utoipa::path(
    post,
    path = "/api/users/link-child",
    request_body = LinkChildRequest,
    responses(
        (status = 200, description = "Child linked", body = LinkChildResponse),
        (status = 400, description = "Invalid or already used linking code", body = ErrorResponse),
        (status = 403, description = "Caller is not a parent", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent, dto))]
pub async fn link_child(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    ValidatedJson(dto): ValidatedJson<LinkChildRequest>,
) -> Result<Json<LinkChildResponse>, AppError> {
    let parent_id = parent.user_id()?;
    let student = UserService::link_child(&state.db, parent_id, &dto.linking_code).await?;
    audit_event!("child_linked", "student", parent_id = %parent_id, student_user_id = %student.user.id);

    Ok(Json(LinkChildResponse {
        message: "Child linked successfully.".to_string(),
        student,
    }))
}

/// Courses of every child linked to the calling parent
#[utoipa::path(
    get,
    path = "/api/users/parent/children-courses",
    responses(
        (status = 200, description = "Children and their enrollments", body = ChildrenCoursesResponse),
        (status = 403, description = "Only parents can access this endpoint.", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn children_courses(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
) -> Result<Json<ChildrenCoursesResponse>, AppError> {
    let parent_id = parent.user_id()?;
    let response = UserService::children_courses(&state.db, parent_id).await?;

    Ok(Json(response))
}
