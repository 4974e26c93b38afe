//! Users, their profiles and the student/parent sub-profiles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::enrollments::EnrollmentDetail;
use crate::enums::{Gender, Relationship, UserRole};
use crate::ids::{ParentId, ProfileId, StudentId, UserId};

/// A row of `users`. Never serialized: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.email)
    }

    pub fn is_admin(&self) -> bool {
        self.is_staff || self.role == UserRole::Admin
    }
}

/// `"First Last"`, falling back to the email when both names are blank.
pub fn full_name(first_name: &str, last_name: &str, email: &str) -> String {
    let name = format!("{} {}", first_name.trim(), last_name.trim());
    let name = name.trim();
    if name.is_empty() {
        email.to_string()
    } else {
        name.to_string()
    }
}

/// Public view of a user. `username` is always the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDetail {
    pub id: UserId,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    pub is_verified: bool,
}

impl From<User> for UserDetail {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.email.clone(),
            email: user.email,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            date_joined: user.date_joined,
            is_verified: user.is_verified,
        }
    }
}

/// Who created or last touched a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub bio: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub date_joined: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub student_id: Option<String>,
    pub current_class: Option<String>,
    pub current_school: Option<String>,
    pub linking_code: String,
    pub parent_id: Option<ParentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Parent {
    pub id: ParentId,
    pub user_id: UserId,
    pub parent_id: Option<String>,
    pub occupation: Option<String>,
    pub relationship_to_student: Option<Relationship>,
}

/// Nested profile fields accepted by the user update endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProfileDto {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: Option<String>,
    #[validate(nested)]
    pub profile: Option<ProfileDto>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: UserDetail,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LinkChildRequest {
    #[validate(length(min = 1, message = "Linking code is required."))]
    #[schema(example = "7QK2M9XA")]
    pub linking_code: String,
}

/// A student together with the user it belongs to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub user: UserDetail,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LinkChildResponse {
    pub message: String,
    pub student: StudentDetail,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChildCourses {
    pub child: UserDetail,
    pub student_id: Option<String>,
    pub current_class: Option<String>,
    pub current_school: Option<String>,
    pub enrollments: Vec<EnrollmentDetail>,
    pub total_enrollments: usize,
    pub active_enrollments: usize,
    pub completed_enrollments: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChildrenCoursesResponse {
    pub parent_name: String,
    pub parent_email: String,
    pub total_children: usize,
    pub children: Vec<ChildCourses>,
    pub total_enrollments: usize,
    pub total_active_enrollments: usize,
    pub total_completed_enrollments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId::new(),
            email: "ada@example.com".to_string(),
            password: "hash".to_string(),
            phone_number: "08012345678".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            role: UserRole::Student,
            is_verified: false,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn detail_uses_email_as_username() {
        let detail = UserDetail::from(sample_user());
        assert_eq!(detail.username, "ada@example.com");

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "student");
    }

    #[test]
    fn full_name_falls_back_to_email() {
        assert_eq!(sample_user().full_name(), "Ada Obi");
        assert_eq!(full_name("  ", "", "x@y.z"), "x@y.z");
        assert_eq!(full_name("Ada", "", "x@y.z"), "Ada");
    }

    #[test]
    fn staff_counts_as_admin() {
        let mut user = sample_user();
        assert!(!user.is_admin());
        user.is_staff = true;
        assert!(user.is_admin());
    }
}
