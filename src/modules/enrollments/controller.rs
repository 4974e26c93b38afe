use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{instrument, warn};

use academy_core::AppError;
use academy_models::{CourseId, EnrollmentId, UserId};

use crate::audit_event;
use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::enrollments::model::{
    CreateEnrollmentDto, DropEnrollmentResponse, EnrollmentDetail, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
use crate::modules::enrollments::service::{
    EnrollmentScope, EnrollmentService, enrollment_notification,
};
use crate::modules::notifications::tasks;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Admins see everything; everyone else is limited to their own rows.
fn owner_scope(auth_user: &AuthUser) -> Result<Option<UserId>, AppError> {
    (!auth_user.is_admin())
        .then(|| auth_user.user_id())
        .transpose()
}

/// Loads an enrollment the caller may see. Other users' enrollments look missing.
async fn visible_enrollment(
    state: &AppState,
    auth_user: &AuthUser,
    id: EnrollmentId,
) -> Result<EnrollmentDetail, AppError> {
    let enrollment = EnrollmentService::get_enrollment(&state.db, id).await?;
    if !auth_user.owns_or_admin(enrollment.user_id) {
        return Err(AppError::not_found(anyhow!("Enrollment not found")));
    }
    Ok(enrollment)
}

async fn enroll(
    state: &AppState,
    auth_user: &AuthUser,
    course_id: CourseId,
    notes: &str,
) -> Result<EnrollmentDetail, AppError> {
    let enrollment =
        EnrollmentService::create_enrollment(&state.db, auth_user, course_id, notes).await?;

    audit_event!(
        "enroll",
        "enrollment",
        enrollment_id = %enrollment.id,
        course_id = %enrollment.course_id,
        user_email = %enrollment.student_email
    );

    if let Err(e) = tasks::notify(state, enrollment_notification(&enrollment)).await {
        warn!(enrollment_id = %enrollment.id, error = %e.message(), "Failed to create enrollment notification");
    }

    Ok(enrollment)
}

/// List enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments",
    params(EnrollmentFilterParams),
    responses(
        (status = 200, description = "The caller's enrollments, or all for admins", body = PaginatedEnrollmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let scope = EnrollmentScope {
        owner: owner_scope(&auth_user)?,
        ..Default::default()
    };
    let enrollments = EnrollmentService::get_enrollments(&state.db, scope, filters).await?;
    Ok(Json(enrollments))
}

/// List enrollments in one course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/enrollments",
    params(("id" = String, Path, description = "Course ID"), EnrollmentFilterParams),
    responses(
        (status = 200, description = "Enrollments in the course visible to the caller", body = PaginatedEnrollmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_course_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
    Query(filters): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let scope = EnrollmentScope {
        owner: owner_scope(&auth_user)?,
        course: Some(course_id),
        ..Default::default()
    };
    let enrollments = EnrollmentService::get_enrollments(&state.db, scope, filters).await?;
    Ok(Json(enrollments))
}

/// List one student's enrollments
#[utoipa::path(
    get,
    path = "/api/students/{id}/enrollments",
    params(("id" = String, Path, description = "Student user ID"), EnrollmentFilterParams),
    responses(
        (status = 200, description = "Enrollments of the student visible to the caller", body = PaginatedEnrollmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<UserId>,
    Query(filters): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let scope = EnrollmentScope {
        owner: owner_scope(&auth_user)?,
        student: Some(student_id),
        ..Default::default()
    };
    let enrollments = EnrollmentService::get_enrollments(&state.db, scope, filters).await?;
    Ok(Json(enrollments))
}

/// List the calling student's enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments/my_enrollments",
    params(EnrollmentFilterParams),
    responses(
        (status = 200, description = "The caller's enrollments", body = PaginatedEnrollmentsResponse),
        (status = 403, description = "Students only", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn my_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    if !auth_user.is_student() {
        return Err(AppError::forbidden(
            "Only students can access this endpoint.",
        ));
    }

    let scope = EnrollmentScope {
        owner: Some(auth_user.user_id()?),
        ..Default::default()
    };
    let enrollments = EnrollmentService::get_enrollments(&state.db, scope, filters).await?;
    Ok(Json(enrollments))
}

/// Enroll in a course
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentDetail),
        (status = 400, description = "Course unavailable or already enrolled", body = ErrorResponse),
        (status = 403, description = "Students only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<EnrollmentDetail>), AppError> {
    let course_id = dto
        .course_id
        .ok_or_else(|| AppError::invalid("course_id is required"))?;
    let enrollment = enroll(&state, &auth_user, course_id, &dto.enrollment_notes).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Enroll in the course named by the path
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enrollments",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentDetail),
        (status = 400, description = "Course unavailable or already enrolled", body = ErrorResponse),
        (status = 403, description = "Students only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_course_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<EnrollmentDetail>), AppError> {
    let enrollment = enroll(&state, &auth_user, course_id, &dto.enrollment_notes).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Get an enrollment
#[utoipa::path(
    get,
    path = "/api/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment found", body = EnrollmentDetail),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EnrollmentId>,
) -> Result<Json<EnrollmentDetail>, AppError> {
    let enrollment = visible_enrollment(&state, &auth_user, id).await?;
    Ok(Json(enrollment))
}

/// Update an enrollment's progress, status or notes
#[utoipa::path(
    put,
    path = "/api/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment ID")),
    request_body = UpdateEnrollmentDto,
    responses(
        (status = 200, description = "Enrollment updated", body = EnrollmentDetail),
        (status = 400, description = "Progress out of range", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EnrollmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateEnrollmentDto>,
) -> Result<Json<EnrollmentDetail>, AppError> {
    visible_enrollment(&state, &auth_user, id).await?;
    let enrollment = EnrollmentService::update_enrollment(&state.db, id, dto).await?;
    Ok(Json(enrollment))
}

/// Drop an enrollment
#[utoipa::path(
    post,
    path = "/api/enrollments/{id}/drop",
    params(("id" = String, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Course dropped", body = DropEnrollmentResponse),
        (status = 400, description = "Already dropped or completed", body = ErrorResponse),
        (status = 403, description = "Not the caller's enrollment", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn drop_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EnrollmentId>,
) -> Result<Json<DropEnrollmentResponse>, AppError> {
    let response = EnrollmentService::drop_enrollment(&state.db, &auth_user, id).await?;

    audit_event!(
        "drop",
        "enrollment",
        enrollment_id = %id,
        actor_email = %auth_user.email()
    );

    Ok(Json(response))
}

/// Delete an enrollment
#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment deleted"),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EnrollmentId>,
) -> Result<StatusCode, AppError> {
    visible_enrollment(&state, &auth_user, id).await?;
    EnrollmentService::delete_enrollment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
