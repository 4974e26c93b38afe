//! Middleware and extractors for cross-cutting request concerns.
//!
//! - [`auth`]: Bearer token extractor and role guards
//! - [`role`]: Router-wide authentication layer
//! - [`rate_limit`]: Per-IP limiter for the authentication routes
//!
//! Role guards are extractors, so a router can mix public reads and
//! admin-only writes on the same path:
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireAdmin};
//!
//! async fn list_courses(State(state): State<AppState>) -> impl IntoResponse { /* public */ }
//!
//! async fn create_course(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
//!     let user_id = admin.user_id()?;
//!     // ...
//! }
//! ```

pub mod auth;
pub mod rate_limit;
pub mod role;
