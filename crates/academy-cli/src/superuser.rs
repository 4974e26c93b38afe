//! Superuser creation.

use academy_core::hash_password;
use academy_models::{UserId, UserRole};
use sqlx::PgPool;

use crate::CliResult;

#[derive(Debug, Clone)]
pub struct NewSuperuser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

/// Inserts a verified admin with staff and superuser flags, an empty profile
/// and default notification preferences.
pub async fn create_superuser(db: &PgPool, input: &NewSuperuser) -> CliResult<UserId> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err("A valid email address is required".into());
    }
    if input.password.len() < 8 {
        return Err("Password must be at least 8 characters long".into());
    }

    let hashed = hash_password(&input.password).map_err(|e| e.message())?;

    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (email, password, phone_number, first_name, last_name, role,
                            is_verified, is_active, is_staff, is_superuser)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, TRUE, TRUE, TRUE)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&email)
    .bind(&hashed)
    .bind(input.phone_number.trim())
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(UserRole::Admin)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        tx.rollback().await?;
        return Err("User with this email already exists".into());
    };

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO notification_preferences (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}

/// Deletes every user that is not a superuser. Returns the number removed.
pub async fn clear_users(db: &PgPool) -> CliResult<u64> {
    let result = sqlx::query("DELETE FROM users WHERE is_superuser = FALSE")
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str) -> NewSuperuser {
        NewSuperuser {
            email: email.to_string(),
            password: "supersecret".to_string(),
            first_name: "Root".to_string(),
            last_name: "Admin".to_string(),
            phone_number: "08000000000".to_string(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn creates_verified_admin(pool: PgPool) {
        let id = create_superuser(&pool, &input("Root@Example.com"))
            .await
            .unwrap();

        let (email, role, is_staff, is_superuser, is_verified): (String, String, bool, bool, bool) =
            sqlx::query_as(
                "SELECT email, role, is_staff, is_superuser, is_verified FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(email, "root@example.com");
        assert_eq!(role, "admin");
        assert!(is_staff && is_superuser && is_verified);

        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(profiles, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn rejects_duplicates_and_short_passwords(pool: PgPool) {
        create_superuser(&pool, &input("root@example.com"))
            .await
            .unwrap();
        let err = create_superuser(&pool, &input("root@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User with this email already exists");

        let mut short = input("other@example.com");
        short.password = "short".to_string();
        assert!(create_superuser(&pool, &short).await.is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn clear_users_keeps_superusers(pool: PgPool) {
        create_superuser(&pool, &input("root@example.com"))
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (email, password) VALUES ('s@example.com', 'x')")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(clear_users(&pool).await.unwrap(), 1);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
