//! Request and response bodies for the `/auth` endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::enums::{OtpPurpose, Relationship};
use crate::ids::{OtpId, UserId};
use crate::users::UserDetail;

pub use academy_auth::{Claims, RefreshTokenClaims};

/// Registration body. `role` stays a string so unsupported values get a
/// readable error instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "Phone number is required."))]
    pub phone_number: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    #[schema(example = "student")]
    pub role: Option<String>,

    pub student_id: Option<String>,
    pub current_class: Option<String>,
    pub current_school: Option<String>,

    pub parent_id: Option<String>,
    pub occupation: Option<String>,
    pub relationship_to_student: Option<Relationship>,
    /// Parents may pass a student's linking code to link on signup
    pub linking_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserDetail,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits."))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Body for endpoints that only need an email: forget-password,
/// check-email-exists and resend-otp.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits."))]
    pub code: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required."))]
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteAccountQuery {
    /// Admins only: the user to delete instead of the caller
    #[serde(default, deserialize_with = "academy_core::serde::deserialize_optional_uuid")]
    pub user_id: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Otp {
    pub id: OtpId,
    pub user_id: UserId,
    pub code: String,
    pub purpose: OtpPurpose,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpPurpose {
    /// Minutes until an OTP of this purpose expires.
    pub const fn ttl_minutes(&self) -> i64 {
        match self {
            OtpPurpose::Verification => 10,
            OtpPurpose::PasswordReset => 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn otp_lifetimes() {
        assert_eq!(OtpPurpose::Verification.ttl_minutes(), 10);
        assert_eq!(OtpPurpose::PasswordReset.ttl_minutes(), 15);
    }

    #[test]
    fn register_rejects_short_password() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.com","phone_number":"080","password":"short"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
