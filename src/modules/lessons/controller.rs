use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::{AppError, PaginationParams};
use academy_models::{CourseId, LessonId};

use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::lessons::model::{
    CreateLessonDto, Lesson, LessonFilterParams, PaginatedLessonsResponse, UpdateLessonDto,
};
use crate::modules::lessons::service::LessonService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List lessons
#[utoipa::path(
    get,
    path = "/api/lessons",
    params(LessonFilterParams),
    responses(
        (status = 200, description = "Lessons in course order", body = PaginatedLessonsResponse)
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lessons(
    State(state): State<AppState>,
    Query(filters): Query<LessonFilterParams>,
) -> Result<Json<PaginatedLessonsResponse>, AppError> {
    let lessons = LessonService::get_lessons(&state.db, filters).await?;
    Ok(Json(lessons))
}

/// List the lessons of one course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/lessons",
    params(("id" = String, Path, description = "Course ID"), PaginationParams),
    responses(
        (status = 200, description = "Lessons in course order", body = PaginatedLessonsResponse)
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_course_lessons(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedLessonsResponse>, AppError> {
    let filters = LessonFilterParams {
        course_id: Some(course_id.into_inner()),
        pagination,
    };
    let lessons = LessonService::get_lessons(&state.db, filters).await?;
    Ok(Json(lessons))
}

/// Get a lesson
#[utoipa::path(
    get,
    path = "/api/lessons/{id}",
    params(("id" = String, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson found", body = Lesson),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<LessonId>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::get_lesson(&state.db, id).await?;
    Ok(Json(lesson))
}

/// Create a lesson
#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Missing or unknown course", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Lessons",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_lesson(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = LessonService::create_lesson(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Create a lesson in a course
#[utoipa::path(
    post,
    path = "/api/courses/{id}/lessons",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Unknown course", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Lessons",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_course_lesson(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(course_id): Path<CourseId>,
    ValidatedJson(mut dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    dto.course_id = Some(course_id);
    let lesson = LessonService::create_lesson(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Update a lesson
#[utoipa::path(
    put,
    path = "/api/lessons/{id}",
    params(("id" = String, Path, description = "Lesson ID")),
    request_body = UpdateLessonDto,
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    tag = "Lessons",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn update_lesson(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<LessonId>,
    ValidatedJson(dto): ValidatedJson<UpdateLessonDto>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::update_lesson(&state.db, id, admin.user_id()?, dto).await?;
    Ok(Json(lesson))
}

/// Delete a lesson
#[utoipa::path(
    delete,
    path = "/api/lessons/{id}",
    params(("id" = String, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    tag = "Lessons",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<LessonId>,
) -> Result<StatusCode, AppError> {
    LessonService::delete_lesson(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
