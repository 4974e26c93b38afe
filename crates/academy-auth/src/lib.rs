//! # Academy Auth
//!
//! JWT claims and token helpers.
//!
//! - [`claims`]: Access and refresh token claim structures
//! - [`jwt`]: Token creation and verification
//!
//! Access and refresh tokens carry disjoint claim sets, so a refresh token
//! never decodes as [`Claims`] and an access token never decodes as
//! [`RefreshTokenClaims`].
//!
//! # Example
//!
//! ```ignore
//! use academy_auth::{create_access_token, verify_token};
//! use academy_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "ada@example.com", "student", false, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
