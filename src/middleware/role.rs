//! Layer-style guards for routers whose every route needs a caller.
//!
//! Handlers still take an [`AuthUser`] to read the claims. The layer only
//! makes sure unauthenticated requests never reach path or body extraction,
//! so a bad token yields 401 even when the body is malformed.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use academy_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// ```rust,ignore
/// Router::new()
///     .nest("/notifications", init_notifications_router())
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_authenticated));
/// ```
pub async fn require_authenticated(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    AuthUser::from_request_parts(&mut parts, &state).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}
