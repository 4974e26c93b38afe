use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta, PaginationParams};
use academy_models::{CourseId, ReviewId};

use crate::middleware::auth::AuthUser;
use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::reviews::model::{
    CreateReviewDto, PaginatedReviewsResponse, Review, UpdateReviewDto,
};

const REVIEW_SELECT: &str = r#"SELECT
        r.id, r.user_id, r.course_id, r.rating, r.comment,
        COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.email) AS student_name,
        r.created_at, r.updated_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id"#;

pub struct ReviewService;

impl ReviewService {
    /// Students may review a course they are actively enrolled in, once.
    #[instrument(skip(db, caller, dto))]
    pub async fn create_review(
        db: &PgPool,
        caller: &AuthUser,
        course_id: CourseId,
        dto: &CreateReviewDto,
    ) -> Result<Review, AppError> {
        if !caller.is_student() {
            return Err(AppError::forbidden("Only students can leave reviews."));
        }
        let user_id = caller.user_id()?;

        if !EnrollmentService::has_active_enrollment(db, user_id, course_id).await? {
            return Err(AppError::forbidden(
                "You must be enrolled in this course to leave a review.",
            ));
        }

        let id: ReviewId = sqlx::query_scalar(
            "INSERT INTO reviews (user_id, course_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(dto.rating)
        .bind(&dto.comment)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::invalid("You have already reviewed this course.");
            }
            AppError::database(e)
        })?;

        Self::get_review(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_review(db: &PgPool, id: ReviewId) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(&format!("{} WHERE r.id = $1", REVIEW_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Review not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_reviews(
        db: &PgPool,
        course_id: Option<CourseId>,
        pagination: PaginationParams,
    ) -> Result<PaginatedReviewsResponse, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE ($1::uuid IS NULL OR course_id = $1)",
        )
        .bind(course_id)
        .fetch_one(db)
        .await?;

        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{} WHERE ($1::uuid IS NULL OR r.course_id = $1) ORDER BY r.created_at DESC{}",
            REVIEW_SELECT,
            pagination.sql_suffix()
        ))
        .bind(course_id)
        .fetch_all(db)
        .await?;

        Ok(PaginatedReviewsResponse {
            data: reviews,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    #[instrument(skip(db, caller, dto))]
    pub async fn update_review(
        db: &PgPool,
        caller: &AuthUser,
        id: ReviewId,
        dto: UpdateReviewDto,
    ) -> Result<Review, AppError> {
        let review = Self::get_review(db, id).await?;
        if caller.user_id()? != review.user_id {
            return Err(AppError::forbidden("You can only edit your own reviews."));
        }

        sqlx::query(
            "UPDATE reviews SET
                rating = COALESCE($1, rating),
                comment = COALESCE($2, comment),
                updated_at = NOW()
             WHERE id = $3",
        )
        .bind(dto.rating)
        .bind(&dto.comment)
        .bind(id)
        .execute(db)
        .await?;

        Self::get_review(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_review(db: &PgPool, id: ReviewId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow!("Review not found")));
        }
        Ok(())
    }
}
