//! JWT claim structures.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims embedded in access tokens.
///
/// `role`, `email` and `is_staff` are a snapshot from issue time; the request
/// extractor refreshes them from the `users` row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    /// `student`, `parent` or `admin`
    pub role: String,
    pub is_staff: bool,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.role == "admin"
    }
}

/// Claims embedded in refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Token ID, recorded in the blacklist on logout
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_through_json() {
        let json = r#"{"sub":"u-1","email":"ada@example.com","role":"parent","is_staff":false,"exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role, "parent");
        assert!(!claims.is_admin());

        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""email":"ada@example.com""#));
    }

    #[test]
    fn staff_or_admin_role_is_admin() {
        let mut claims = Claims {
            sub: "u-2".to_string(),
            email: "staff@example.com".to_string(),
            role: "student".to_string(),
            is_staff: true,
            exp: 0,
            iat: 0,
        };
        assert!(claims.is_admin());

        claims.is_staff = false;
        claims.role = "admin".to_string();
        assert!(claims.is_admin());
    }

    #[test]
    fn refresh_claims_need_jti() {
        let json = r#"{"sub":"u-1","email":"a@b.c","exp":1,"iat":0}"#;
        assert!(serde_json::from_str::<RefreshTokenClaims>(json).is_err());
    }
}
