use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

/// bcrypt cost, overridable with `BCRYPT_COST` (tests run with a low cost).
fn cost() -> u32 {
    std::env::var("BCRYPT_COST")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|c| (4..=31).contains(c))
        .unwrap_or(DEFAULT_COST)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, cost())
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// [`hash_password`] on the blocking pool, for request handlers.
pub async fn hash_password_async(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal_error(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool, for request handlers.
pub async fn verify_password_async(password: &str, hash: &str) -> Result<bool, AppError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("Password check task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("secret123").unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify_password("secret123", &hashed).unwrap());
        assert!(!verify_password("wrong-pass", &hashed).unwrap());
    }

    #[tokio::test]
    async fn async_variants_match() {
        let hashed = hash_password_async("secret123").await.unwrap();
        assert!(verify_password_async("secret123", &hashed).await.unwrap());
        assert!(!verify_password_async("nope-nope", &hashed).await.unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("secret123", "not-a-bcrypt-hash").is_err());
    }
}
