pub mod auth;
pub mod bookmarks;
pub mod categories;
pub mod certificates;
pub mod chat;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod notifications;
pub mod payments;
pub mod quiz_attempts;
pub mod quizzes;
pub mod reviews;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;
