use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::{AppError, PaginationParams};
use academy_models::{CourseId, ReviewId};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::reviews::model::{
    CreateReviewDto, PaginatedReviewsResponse, Review, UpdateReviewDto,
};
use crate::modules::reviews::service::ReviewService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    params(PaginationParams),
    responses(
        (status = 200, description = "Reviews, newest first", body = PaginatedReviewsResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedReviewsResponse>, AppError> {
    let reviews = ReviewService::get_reviews(&state.db, None, pagination).await?;
    Ok(Json(reviews))
}

/// List the reviews of one course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/reviews",
    params(("id" = String, Path, description = "Course ID"), PaginationParams),
    responses(
        (status = 200, description = "Reviews of the course", body = PaginatedReviewsResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn get_course_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedReviewsResponse>, AppError> {
    let reviews = ReviewService::get_reviews(&state.db, Some(course_id), pagination).await?;
    Ok(Json(reviews))
}

/// Get a review
#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = Review),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>, AppError> {
    let review = ReviewService::get_review(&state.db, id).await?;
    Ok(Json(review))
}

/// Review a course
#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid rating or already reviewed", body = ErrorResponse),
        (status = 403, description = "Not an enrolled student", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let course_id = dto
        .course_id
        .ok_or_else(|| AppError::invalid("course_id is required"))?;
    let review = ReviewService::create_review(&state.db, &auth_user, course_id, &dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Review the course named by the path
#[utoipa::path(
    post,
    path = "/api/courses/{id}/reviews",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid rating or already reviewed", body = ErrorResponse),
        (status = 403, description = "Not an enrolled student", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_course_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = ReviewService::create_review(&state.db, &auth_user, course_id, &dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit one of the caller's reviews
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not the caller's review", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ReviewId>,
    ValidatedJson(dto): ValidatedJson<UpdateReviewDto>,
) -> Result<Json<Review>, AppError> {
    let review = ReviewService::update_review(&state.db, &auth_user, id, dto).await?;
    Ok(Json(review))
}

/// Delete a review
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::forbidden("Only admins can delete reviews."));
    }
    ReviewService::delete_review(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
