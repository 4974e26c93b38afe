//! Enrollments, certificates, bookmarks and reviews.

use academy_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::enums::{CourseLevel, EnrollmentStatus};
use crate::ids::{BookmarkId, CertificateId, CourseId, EnrollmentId, ReviewId, UserId};

// ============================================================================
// Enrollments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseDetails {
    pub id: CourseId,
    pub title: String,
    pub slug: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub level: CourseLevel,
    pub cover_image: String,
}

/// Flat join row: enrollments + courses + users.
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentRow {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
    pub progress_percentage: Decimal,
    pub status: EnrollmentStatus,
    pub total_watch_time_minutes: i32,
    pub quiz_average_score: Decimal,
    pub enrollment_notes: String,
    pub course_title: String,
    pub course_slug: String,
    pub course_price: Decimal,
    pub course_level: CourseLevel,
    pub course_cover_image: String,
    pub student_email: String,
    pub student_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentDetail {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub course_details: CourseDetails,
    pub student_email: String,
    pub student_name: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
    #[schema(value_type = String, example = "42.50")]
    pub progress_percentage: Decimal,
    pub status: EnrollmentStatus,
    pub total_watch_time_minutes: i32,
    #[schema(value_type = String)]
    pub quiz_average_score: Decimal,
    pub enrollment_notes: String,
    pub is_completed: bool,
}

impl From<EnrollmentRow> for EnrollmentDetail {
    fn from(row: EnrollmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            course_details: CourseDetails {
                id: row.course_id,
                title: row.course_title,
                slug: row.course_slug,
                price: row.course_price,
                level: row.course_level,
                cover_image: row.course_cover_image,
            },
            student_email: row.student_email,
            student_name: row.student_name,
            enrolled_at: row.enrolled_at,
            completed_at: row.completed_at,
            last_accessed: row.last_accessed,
            progress_percentage: row.progress_percentage,
            is_completed: row.status == EnrollmentStatus::Completed,
            status: row.status,
            total_watch_time_minutes: row.total_watch_time_minutes,
            quiz_average_score: row.quiz_average_score,
            enrollment_notes: row.enrollment_notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEnrollmentDto {
    /// Taken from the path on `/courses/{course_id}/enrollments`
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub enrollment_notes: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEnrollmentDto {
    #[schema(value_type = Option<String>, example = "50.00")]
    pub progress_percentage: Option<Decimal>,
    pub status: Option<EnrollmentStatus>,
    pub enrollment_notes: Option<String>,
    #[validate(range(min = 0))]
    pub total_watch_time_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnrollmentFilterParams {
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub status: Option<EnrollmentStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<EnrollmentDetail>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DropEnrollmentResponse {
    pub message: String,
    pub enrollment: EnrollmentDetail,
}

// ============================================================================
// Certificates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Certificate {
    pub id: CertificateId,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Public identifier, e.g. `CERT-7QK2M9XA1B`
    pub certificate_id: String,
    pub issued_at: DateTime<Utc>,
    pub certificate_url: String,
    pub course_title: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct IssueCertificateDto {
    pub user_id: UserId,
    pub course_id: CourseId,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub certificate_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCertificatesResponse {
    pub data: Vec<Certificate>,
    pub meta: PaginationMeta,
}

// ============================================================================
// Bookmarks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub course_title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookmarkDto {
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedBookmarksResponse {
    pub data: Vec<Bookmark>,
    pub meta: PaginationMeta,
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub rating: i16,
    pub comment: String,
    pub student_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    /// Taken from the path on `/courses/{course_id}/reviews`
    pub course_id: Option<CourseId>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedReviewsResponse {
    pub data: Vec<Review>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: EnrollmentStatus) -> EnrollmentRow {
        EnrollmentRow {
            id: EnrollmentId::new(),
            user_id: UserId::new(),
            course_id: CourseId::new(),
            enrolled_at: Utc::now(),
            completed_at: None,
            last_accessed: Utc::now(),
            progress_percentage: Decimal::ZERO,
            status,
            total_watch_time_minutes: 0,
            quiz_average_score: Decimal::ZERO,
            enrollment_notes: String::new(),
            course_title: "Intro to Rust".to_string(),
            course_slug: "intro-to-rust".to_string(),
            course_price: Decimal::new(1500000, 2),
            course_level: CourseLevel::Beginner,
            course_cover_image: String::new(),
            student_email: "ada@example.com".to_string(),
            student_name: "Ada Obi".to_string(),
        }
    }

    #[test]
    fn detail_nests_course_and_flags_completion() {
        let detail = EnrollmentDetail::from(row(EnrollmentStatus::Completed));
        assert!(detail.is_completed);
        assert_eq!(detail.course_details.id, detail.course_id);
        assert_eq!(detail.course_details.slug, "intro-to-rust");

        let detail = EnrollmentDetail::from(row(EnrollmentStatus::Active));
        assert!(!detail.is_completed);
    }

    #[test]
    fn review_rating_bounds() {
        let dto: CreateReviewDto = serde_json::from_str(r#"{"rating":6}"#).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.to_string().contains("Rating must be between 1 and 5."));

        let dto: CreateReviewDto = serde_json::from_str(r#"{"rating":5}"#).unwrap();
        assert!(dto.validate().is_ok());
    }
}
