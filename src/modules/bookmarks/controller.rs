use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::{AppError, PaginationParams};
use academy_models::{BookmarkId, UserId};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::bookmarks::model::{Bookmark, CreateBookmarkDto, PaginatedBookmarksResponse};
use crate::modules::bookmarks::service::BookmarkService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

async fn visible_bookmark(
    state: &AppState,
    auth_user: &AuthUser,
    id: BookmarkId,
) -> Result<Bookmark, AppError> {
    let bookmark = BookmarkService::get_bookmark(&state.db, id).await?;
    if !auth_user.owns_or_admin(bookmark.user_id) {
        return Err(AppError::not_found(anyhow!("Bookmark not found")));
    }
    Ok(bookmark)
}

/// List bookmarks
#[utoipa::path(
    get,
    path = "/api/bookmarks",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's bookmarks, or all for admins", body = PaginatedBookmarksResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Bookmarks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_bookmarks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedBookmarksResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let bookmarks = BookmarkService::get_bookmarks(&state.db, owner, None, pagination).await?;
    Ok(Json(bookmarks))
}

/// List one student's bookmarks
#[utoipa::path(
    get,
    path = "/api/students/{id}/bookmarks",
    params(("id" = String, Path, description = "Student user ID"), PaginationParams),
    responses(
        (status = 200, description = "Bookmarks of the student visible to the caller", body = PaginatedBookmarksResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Bookmarks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student_bookmarks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<UserId>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedBookmarksResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let bookmarks =
        BookmarkService::get_bookmarks(&state.db, owner, Some(student_id), pagination).await?;
    Ok(Json(bookmarks))
}

/// Bookmark a course
#[utoipa::path(
    post,
    path = "/api/bookmarks",
    request_body = CreateBookmarkDto,
    responses(
        (status = 201, description = "Bookmark created", body = Bookmark),
        (status = 400, description = "Already bookmarked", body = ErrorResponse),
        (status = 403, description = "Students only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Bookmarks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_bookmark(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateBookmarkDto>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    if !auth_user.is_student() {
        return Err(AppError::forbidden("Only students can bookmark courses."));
    }
    let bookmark =
        BookmarkService::create_bookmark(&state.db, auth_user.user_id()?, dto.course_id).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

/// Get a bookmark
#[utoipa::path(
    get,
    path = "/api/bookmarks/{id}",
    params(("id" = String, Path, description = "Bookmark ID")),
    responses(
        (status = 200, description = "Bookmark found", body = Bookmark),
        (status = 404, description = "Bookmark not found", body = ErrorResponse)
    ),
    tag = "Bookmarks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_bookmark(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<BookmarkId>,
) -> Result<Json<Bookmark>, AppError> {
    let bookmark = visible_bookmark(&state, &auth_user, id).await?;
    Ok(Json(bookmark))
}

/// Remove a bookmark
#[utoipa::path(
    delete,
    path = "/api/bookmarks/{id}",
    params(("id" = String, Path, description = "Bookmark ID")),
    responses(
        (status = 204, description = "Bookmark removed"),
        (status = 404, description = "Bookmark not found", body = ErrorResponse)
    ),
    tag = "Bookmarks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_bookmark(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<BookmarkId>,
) -> Result<StatusCode, AppError> {
    visible_bookmark(&state, &auth_user, id).await?;
    BookmarkService::delete_bookmark(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
