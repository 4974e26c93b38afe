use axum::{extract::FromRequestParts, http::request::Parts};

use academy_auth::{Claims, verify_token};
use academy_core::AppError;
use academy_models::{UserId, UserRole};

use crate::state::AppState;
use crate::utils::request::bearer_token;

/// Extractor that validates the access token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> Option<UserRole> {
        self.0.role.parse().ok()
    }

    /// `role = admin` or a staff account.
    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    pub fn is_student(&self) -> bool {
        self.role() == Some(UserRole::Student)
    }

    pub fn is_parent(&self) -> bool {
        self.role() == Some(UserRole::Parent)
    }

    /// Whether the caller may touch a record owned by `owner`.
    pub fn owns_or_admin(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id().is_ok_and(|id| id == owner)
    }
}

impl AuthUser {
    /// Verifies `token` and reloads the caller from the database.
    ///
    /// Role, staff flag and email come from the `users` row, so a deactivated,
    /// deleted or demoted account loses access before its token expires.
    pub async fn from_token(state: &AppState, token: &str) -> Result<Self, AppError> {
        let mut claims = verify_token(token, &state.jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

        let row = sqlx::query_as::<_, (String, UserRole, bool, bool)>(
            "SELECT email, role, is_staff, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(AppError::database)?;

        let Some((email, role, is_staff, is_active)) = row else {
            return Err(AppError::unauthorized("User not found"));
        };
        if !is_active {
            return Err(AppError::unauthorized("User is inactive"));
        }

        claims.email = email;
        claims.role = role.as_str().to_string();
        claims.is_staff = is_staff;
        Ok(AuthUser(claims))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by an earlier extraction on the same request
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        if parts.headers.get(axum::http::header::AUTHORIZATION).is_none() {
            return Err(AppError::unauthorized(
                "Authentication credentials were not provided.",
            ));
        }

        let token = bearer_token(&parts.headers).ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format")
        })?;

        let auth_user = AuthUser::from_token(state, token).await?;
        parts.extensions.insert(auth_user.clone());

        Ok(auth_user)
    }
}

/// Defines an extractor that authenticates and then checks one predicate on
/// [`AuthUser`], rejecting with 403 and `$message` when it fails.
macro_rules! require_role {
    ($name:ident, $check:ident, $message:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.$check() {
                    return Err(AppError::forbidden($message));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(
    RequireAdmin,
    is_admin,
    "You do not have permission to perform this action."
);
require_role!(
    RequireParent,
    is_parent,
    "Only parents can access this endpoint."
);
