use anyhow::anyhow;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::{
    CourseId, EnrollmentId, EnrollmentStatus, NotificationType, RecipientType, UserId,
};

use crate::metrics::track_enrollment_created;
use crate::middleware::auth::AuthUser;
use crate::modules::courses::service::CourseService;
use crate::modules::enrollments::model::{
    DropEnrollmentResponse, EnrollmentDetail, EnrollmentFilterParams, EnrollmentRow,
    PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
use crate::modules::notifications::model::NewNotification;

/// Enrollments joined with the course summary and the student's name.
const ENROLLMENT_SELECT: &str = r#"SELECT
        e.id, e.user_id, e.course_id, e.enrolled_at, e.completed_at, e.last_accessed,
        e.progress_percentage, e.status, e.total_watch_time_minutes, e.quiz_average_score,
        e.enrollment_notes,
        c.title AS course_title, c.slug AS course_slug, c.price AS course_price,
        c.level AS course_level, c.cover_image AS course_cover_image,
        u.email AS student_email,
        COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.email) AS student_name
    FROM enrollments e
    JOIN courses c ON c.id = e.course_id
    JOIN users u ON u.id = e.user_id"#;

/// Narrows an enrollment list. Every `Some` field must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentScope {
    /// Set for non-admin callers so they only see their own rows.
    pub owner: Option<UserId>,
    pub student: Option<UserId>,
    pub course: Option<CourseId>,
}

/// Only active and suspended enrollments can be dropped.
pub fn check_droppable(status: EnrollmentStatus) -> Result<(), AppError> {
    match status {
        EnrollmentStatus::Dropped | EnrollmentStatus::Completed => Err(AppError::invalid(
            format!("Cannot drop a {} enrollment.", status),
        )),
        _ => Ok(()),
    }
}

pub fn check_progress(progress: Decimal) -> Result<(), AppError> {
    if progress < Decimal::ZERO || progress > Decimal::ONE_HUNDRED {
        return Err(AppError::invalid(
            "Progress percentage must be between 0 and 100.",
        ));
    }
    Ok(())
}

/// Who may drop an enrollment: its student, or an admin.
pub fn check_drop_permission(caller: &AuthUser, owner: UserId) -> Result<(), AppError> {
    if caller.is_admin() {
        return Ok(());
    }
    if !caller.is_student() {
        return Err(AppError::forbidden("Permission denied."));
    }
    if !caller.owns_or_admin(owner) {
        return Err(AppError::forbidden("You can only drop your own enrollments."));
    }
    Ok(())
}

/// The notification sent to a student right after they enroll.
pub fn enrollment_notification(enrollment: &EnrollmentDetail) -> NewNotification {
    let text = format!(
        "You are enrolled in {} at {}",
        enrollment.course_details.title,
        enrollment.enrolled_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    NewNotification {
        user_id: enrollment.user_id,
        recipient_type: RecipientType::Student,
        notification_type: NotificationType::Enrollment,
        title: text.clone(),
        message: text,
        action_url: Some(format!("/courses/{}", enrollment.course_id)),
        related_object_id: Some(enrollment.id.into_inner()),
        related_object_type: Some("enrollment".to_string()),
    }
}

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls the calling student in a published course.
    #[instrument(skip(db, caller, notes))]
    pub async fn create_enrollment(
        db: &PgPool,
        caller: &AuthUser,
        course_id: CourseId,
        notes: &str,
    ) -> Result<EnrollmentDetail, AppError> {
        if !caller.is_student() {
            return Err(AppError::forbidden("Only students can enroll in courses."));
        }
        let user_id = caller.user_id()?;

        let course = CourseService::get_course(db, course_id).await?;
        if !course.is_published {
            return Err(AppError::invalid(
                "This course is not available for enrollment.",
            ));
        }

        let id: EnrollmentId = sqlx::query_scalar(
            "INSERT INTO enrollments (user_id, course_id, enrollment_notes)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(user_id)
        .bind(course.id)
        .bind(notes)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::invalid("You are already enrolled in this course.");
            }
            AppError::database(e)
        })?;

        CourseService::refresh_enrollment_count(db, course.id).await?;
        track_enrollment_created();

        Self::get_enrollment(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_enrollment(
        db: &PgPool,
        id: EnrollmentId,
    ) -> Result<EnrollmentDetail, AppError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!("{} WHERE e.id = $1", ENROLLMENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(EnrollmentDetail::from)
            .ok_or_else(|| AppError::not_found(anyhow!("Enrollment not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_enrollments(
        db: &PgPool,
        scope: EnrollmentScope,
        filters: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        let where_clause = " WHERE ($1::uuid IS NULL OR e.user_id = $1) \
                             AND ($2::uuid IS NULL OR e.user_id = $2) \
                             AND ($3::uuid IS NULL OR e.course_id = $3) \
                             AND ($4::text IS NULL OR e.status = $4)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM enrollments e{}",
            where_clause
        ))
        .bind(scope.owner)
        .bind(scope.student)
        .bind(scope.course)
        .bind(filters.status)
        .fetch_one(db)
        .await?;

        let rows = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "{}{} ORDER BY e.enrolled_at DESC{}",
            ENROLLMENT_SELECT,
            where_clause,
            filters.pagination.sql_suffix()
        ))
        .bind(scope.owner)
        .bind(scope.student)
        .bind(scope.course)
        .bind(filters.status)
        .fetch_all(db)
        .await?;

        Ok(PaginatedEnrollmentsResponse {
            data: rows.into_iter().map(EnrollmentDetail::from).collect(),
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Every enrollment of one student, newest first.
    #[instrument(skip(db))]
    pub async fn list_for_user(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "{} WHERE e.user_id = $1 ORDER BY e.enrolled_at DESC",
            ENROLLMENT_SELECT
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(EnrollmentDetail::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn has_active_enrollment(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM enrollments
                WHERE user_id = $1 AND course_id = $2 AND status = 'active'
             )",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(db)
        .await?;

        Ok(exists)
    }

    /// Partial update. Moving to `completed` stamps `completed_at` once.
    #[instrument(skip(db, dto))]
    pub async fn update_enrollment(
        db: &PgPool,
        id: EnrollmentId,
        dto: UpdateEnrollmentDto,
    ) -> Result<EnrollmentDetail, AppError> {
        if let Some(progress) = dto.progress_percentage {
            check_progress(progress)?;
        }

        let course_id: CourseId = sqlx::query_scalar(
            "UPDATE enrollments SET
                progress_percentage = COALESCE($1, progress_percentage),
                status = COALESCE($2, status),
                enrollment_notes = COALESCE($3, enrollment_notes),
                total_watch_time_minutes = COALESCE($4, total_watch_time_minutes),
                completed_at = CASE
                    WHEN $2 = 'completed' THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END,
                last_accessed = NOW()
             WHERE id = $5
             RETURNING course_id",
        )
        .bind(dto.progress_percentage)
        .bind(dto.status)
        .bind(&dto.enrollment_notes)
        .bind(dto.total_watch_time_minutes)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment not found")))?;

        CourseService::refresh_enrollment_count(db, course_id).await?;
        Self::get_enrollment(db, id).await
    }

    #[instrument(skip(db, caller))]
    pub async fn drop_enrollment(
        db: &PgPool,
        caller: &AuthUser,
        id: EnrollmentId,
    ) -> Result<DropEnrollmentResponse, AppError> {
        let enrollment = Self::get_enrollment(db, id).await?;
        check_drop_permission(caller, enrollment.user_id)?;
        check_droppable(enrollment.status)?;

        sqlx::query("UPDATE enrollments SET status = 'dropped' WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        CourseService::refresh_enrollment_count(db, enrollment.course_id).await?;

        Ok(DropEnrollmentResponse {
            message: "Course dropped successfully.".to_string(),
            enrollment: Self::get_enrollment(db, id).await?,
        })
    }

    #[instrument(skip(db))]
    pub async fn delete_enrollment(db: &PgPool, id: EnrollmentId) -> Result<(), AppError> {
        let course_id: CourseId =
            sqlx::query_scalar("DELETE FROM enrollments WHERE id = $1 RETURNING course_id")
                .bind(id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("Enrollment not found")))?;

        CourseService::refresh_enrollment_count(db, course_id).await?;
        Ok(())
    }
}
