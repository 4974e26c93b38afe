//! Categories, courses and lessons.

use academy_core::serde::{
    deserialize_optional_bool, deserialize_optional_string, deserialize_optional_uuid,
};
use academy_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::enums::{CourseLevel, CourseStatus};
use crate::ids::{CategoryId, CourseId, LessonId, UserId};
use crate::users::UserSummary;

// ============================================================================
// Categories
// ============================================================================

/// A category with the number of courses filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub courses_count: i64,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryDto {
    #[validate(length(max = 100))]
    #[schema(example = "Web Development")]
    pub name: String,
    /// Generated from the name when omitted
    #[validate(length(max = 120))]
    pub slug: Option<String>,
}

/// Sort keys accepted by `GET /categories?ordering=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum CategoryOrdering {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "-name")]
    NameDesc,
    #[serde(rename = "courses_count")]
    CoursesCount,
    #[serde(rename = "-courses_count")]
    CoursesCountDesc,
    #[serde(rename = "created_at")]
    CreatedAt,
    #[serde(rename = "-created_at")]
    CreatedAtDesc,
}

impl CategoryOrdering {
    pub const fn sql(&self) -> &'static str {
        match self {
            CategoryOrdering::Name => "name ASC",
            CategoryOrdering::NameDesc => "name DESC",
            CategoryOrdering::CoursesCount => "courses_count ASC, name ASC",
            CategoryOrdering::CoursesCountDesc => "courses_count DESC, name ASC",
            CategoryOrdering::CreatedAt => "created_at ASC",
            CategoryOrdering::CreatedAtDesc => "created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryFilterParams {
    /// Matches name or slug, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub ordering: Option<CategoryOrdering>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCategoriesResponse {
    pub data: Vec<Category>,
    pub meta: PaginationMeta,
}

// ============================================================================
// Courses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub slug: String,
    #[schema(value_type = String, example = "15000.00")]
    pub price: Decimal,
    pub is_published: bool,
    pub status: CourseStatus,
    pub level: CourseLevel,
    pub cover_image: String,
    pub cover_video: String,
    pub enrollment_count: i32,
    /// Total length in minutes
    pub duration: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category_id: CategoryId,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The row returned by course lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseListItem {
    pub id: CourseId,
    pub title: String,
    pub slug: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub is_published: bool,
    pub status: CourseStatus,
    pub level: CourseLevel,
    pub cover_image: String,
    pub enrollment_count: i32,
    pub duration: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category_id: CategoryId,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub category_name: String,
    pub created_by_user: Option<UserSummary>,
    pub updated_by_user: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(max = 200))]
    #[schema(example = "Intro to Rust")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 220))]
    pub slug: Option<String>,
    #[schema(value_type = String, example = "15000.00")]
    pub price: Decimal,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub cover_image: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub cover_video: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub duration: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 220))]
    pub slug: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub is_published: Option<bool>,
    pub status: Option<CourseStatus>,
    pub level: Option<CourseLevel>,
    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
    #[validate(length(max = 500))]
    pub cover_video: Option<String>,
    #[validate(range(min = 0))]
    pub duration: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    /// Category id
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub category: Option<Uuid>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub level: Option<CourseLevel>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub status: Option<CourseStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_published: Option<bool>,
    /// Matches title or description
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<CourseListItem>,
    pub meta: PaginationMeta,
}

// ============================================================================
// Lessons
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub duration: i32,
    /// Position within the course
    #[serde(rename = "order")]
    #[sqlx(rename = "position")]
    pub position: i32,
    pub is_published: bool,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLessonDto {
    /// Taken from the path on nested routes
    pub course_id: Option<CourseId>,
    #[validate(length(min = 1, max = 200, message = "Lesson title cannot be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub video_url: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub duration: i32,
    #[serde(default, rename = "order")]
    #[validate(range(min = 0))]
    pub position: i32,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLessonDto {
    #[validate(length(min = 1, max = 200, message = "Lesson title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration: Option<i32>,
    #[serde(rename = "order")]
    #[validate(range(min = 0))]
    pub position: Option<i32>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LessonFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedLessonsResponse {
    pub data: Vec<Lesson>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ordering_parses_from_query() {
        let params: CategoryFilterParams =
            serde_json::from_str(r#"{"ordering":"-courses_count","search":""}"#).unwrap();
        assert_eq!(params.ordering, Some(CategoryOrdering::CoursesCountDesc));
        assert_eq!(params.search, None);
        assert_eq!(
            CategoryOrdering::default().sql(),
            CategoryOrdering::Name.sql()
        );
    }

    #[test]
    fn unknown_ordering_is_rejected() {
        let result: Result<CategoryFilterParams, _> =
            serde_json::from_str(r#"{"ordering":"price"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_course_defaults() {
        let dto: CreateCourseDto = serde_json::from_str(&format!(
            r#"{{"title":"Rust","price":"100.00","start_date":"2025-01-01","end_date":"2025-03-01","category_id":"{}"}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(dto.status, CourseStatus::Inactive);
        assert_eq!(dto.level, CourseLevel::Beginner);
        assert!(!dto.is_published);
        assert_eq!(dto.price, Decimal::new(10000, 2));
    }

    #[test]
    fn lesson_position_is_called_order_on_the_wire() {
        let dto: CreateLessonDto =
            serde_json::from_str(r#"{"title":"Ownership","order":3}"#).unwrap();
        assert_eq!(dto.position, 3);
        assert!(dto.course_id.is_none());
    }
}
