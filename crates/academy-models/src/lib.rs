//! # Academy Models
//!
//! Database rows, request DTOs and response bodies for the IT360 Academy API.
//!
//! - [`ids`]: Typed UUID ids for every table
//! - [`enums`]: Choice fields stored as TEXT
//! - [`users`]: Users, profiles, students and parents
//! - [`auth`]: Registration, OTP, login and token bodies
//! - [`courses`]: Categories, courses and lessons
//! - [`quizzes`]: Quizzes and attempts
//! - [`enrollments`]: Enrollments, certificates, bookmarks and reviews
//! - [`notifications`]: Notifications and email preferences
//! - [`payments`]: Paystack payments
//! - [`chat`]: Direct messages

pub mod auth;
pub mod chat;
pub mod courses;
pub mod enrollments;
pub mod enums;
pub mod ids;
pub mod notifications;
pub mod payments;
pub mod quizzes;
pub mod users;

pub use auth::{AuthResponse, MessageResponse, TokenPair};
pub use enums::{
    CourseLevel, CourseStatus, EnrollmentStatus, Gender, NotificationType, OtpPurpose,
    PaymentStatus, RecipientType, Relationship, UserRole,
};
pub use ids::*;
pub use users::{User, UserDetail};
