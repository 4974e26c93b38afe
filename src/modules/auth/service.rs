use academy_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use academy_config::{AppConfig, JwtConfig};
use academy_core::text::{random_code, random_digits};
use academy_core::{AppError, hash_password_async, verify_password_async};
use chrono::{Duration, TimeZone, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use crate::metrics::{track_jwt_issued, track_login_failure, track_login_success};
use crate::modules::auth::model::{
    LoginRequest, Otp, RegisterRequest, ResetPasswordRequest, TokenPair,
};
use crate::modules::users::service::{USER_COLUMNS, UserService};
use crate::security_event;
use academy_models::{OtpId, OtpPurpose, User, UserId, UserRole};

pub const ADMIN_ROLE_MESSAGE: &str =
    "Regular users cannot have 'admin' role. Only superusers can be admins.";
pub const INVALID_ROLE_MESSAGE: &str = "Role must be either 'student' or 'parent'.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Resolves the requested signup role. Absent means student.
pub fn parse_signup_role(role: Option<&str>) -> Result<UserRole, AppError> {
    match role.map(|r| r.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("student") => Ok(UserRole::Student),
        Some("parent") => Ok(UserRole::Parent),
        Some("admin") => Err(AppError::invalid(ADMIN_ROLE_MESSAGE)),
        Some(_) => Err(AppError::invalid(INVALID_ROLE_MESSAGE)),
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const LINKING_CODE_ATTEMPTS: usize = 5;

struct NewStudent {
    student_id: Option<String>,
    current_class: Option<String>,
    current_school: Option<String>,
}

fn map_register_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("users_email_key") => "User with this email already exists.",
            Some("students_student_id_key") => "Student with this student id already exists.",
            Some("parents_parent_id_key") => "Parent with this parent id already exists.",
            _ => "A user with these details already exists.",
        };
        return AppError::invalid(message);
    }
    AppError::database(e)
}

pub struct AuthService;

impl AuthService {
    /// Creates the user with an empty profile, the role profile and default
    /// notification preferences in one transaction.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register(db: &PgPool, dto: RegisterRequest) -> Result<User, AppError> {
        let role = parse_signup_role(dto.role.as_deref())?;
        let email = normalize_email(&dto.email);
        let password_hash = hash_password_async(&dto.password).await?;

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, phone_number, first_name, last_name, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.phone_number.trim())
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_register_error)?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        match role {
            UserRole::Student => {
                let student = NewStudent {
                    student_id: non_blank(dto.student_id),
                    current_class: non_blank(dto.current_class),
                    current_school: non_blank(dto.current_school),
                };
                Self::insert_student(&mut tx, user.id, &student, || random_code(8)).await?;
            }
            UserRole::Parent => {
                let parent_id: uuid::Uuid = sqlx::query_scalar(
                    "INSERT INTO parents (user_id, parent_id, occupation, relationship_to_student)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id",
                )
                .bind(user.id)
                .bind(non_blank(dto.parent_id))
                .bind(non_blank(dto.occupation))
                .bind(dto.relationship_to_student)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_register_error)?;

                if let Some(code) = non_blank(dto.linking_code) {
                    Self::link_on_signup(&mut tx, parent_id, &code).await?;
                }
            }
            UserRole::Admin => {}
        }

        sqlx::query("INSERT INTO notification_preferences (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Inserts the student row, drawing another linking code on a collision.
    /// Returns the code that was stored.
    async fn insert_student(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        student: &NewStudent,
        mut next_code: impl FnMut() -> String,
    ) -> Result<String, AppError> {
        for _ in 0..LINKING_CODE_ATTEMPTS {
            let code = next_code();
            let stored: Option<String> = sqlx::query_scalar(
                "INSERT INTO students (user_id, student_id, current_class, current_school, linking_code)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (linking_code) DO NOTHING
                 RETURNING linking_code",
            )
            .bind(user_id)
            .bind(&student.student_id)
            .bind(&student.current_class)
            .bind(&student.current_school)
            .bind(&code)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_register_error)?;

            if let Some(code) = stored {
                return Ok(code);
            }
            tracing::warn!(user_id = %user_id, "Linking code collision, drawing another");
        }

        Err(AppError::internal_error(
            "Could not allocate a unique linking code",
        ))
    }

    /// Links the student owning `code` unless it already has a parent.
    /// Unknown codes are ignored so signup still succeeds.
    async fn link_on_signup(
        tx: &mut Transaction<'_, Postgres>,
        parent_id: uuid::Uuid,
        code: &str,
    ) -> Result<(), AppError> {
        let linked = sqlx::query(
            "UPDATE students SET parent_id = $1
             WHERE linking_code = $2 AND parent_id IS NULL",
        )
        .bind(parent_id)
        .bind(code.trim().to_uppercase())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if linked == 0 {
            tracing::info!(linking_code = %code, "Linking code on signup matched no free student");
        }
        Ok(())
    }

    /// Issues a fresh OTP, voiding earlier unused ones of the same purpose.
    #[instrument(skip(db, app_config))]
    pub async fn issue_otp(
        db: &PgPool,
        user_id: UserId,
        purpose: OtpPurpose,
        app_config: &AppConfig,
    ) -> Result<Otp, AppError> {
        let code = app_config
            .otp_fixed_code
            .clone()
            .unwrap_or_else(|| random_digits(6));
        let expires_at = Utc::now() + Duration::minutes(purpose.ttl_minutes());

        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE otps SET is_used = TRUE
             WHERE user_id = $1 AND purpose = $2 AND is_used = FALSE",
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

        let otp = sqlx::query_as::<_, Otp>(
            "INSERT INTO otps (user_id, code, purpose, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, code, purpose, is_used, created_at, expires_at",
        )
        .bind(user_id)
        .bind(&code)
        .bind(purpose)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(otp)
    }

    /// Marks a matching valid OTP used, or fails with "Invalid or expired OTP".
    #[instrument(skip(db, code))]
    pub async fn consume_otp(
        db: &PgPool,
        user_id: UserId,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        // One statement, so two requests racing on the same code cannot both
        // consume it.
        let consumed: Option<OtpId> = sqlx::query_scalar(
            "UPDATE otps SET is_used = TRUE
             WHERE id = (
                 SELECT id FROM otps
                 WHERE user_id = $1 AND purpose = $2 AND code = $3
                   AND is_used = FALSE AND expires_at > NOW()
                 ORDER BY created_at DESC
                 LIMIT 1
             )
             AND is_used = FALSE
             RETURNING id",
        )
        .bind(user_id)
        .bind(purpose)
        .bind(code.trim())
        .fetch_optional(db)
        .await?;

        consumed
            .map(|_| ())
            .ok_or_else(|| AppError::invalid("Invalid or expired OTP"))
    }

    #[instrument(skip(db, code))]
    pub async fn verify_email(db: &PgPool, email: &str, code: &str) -> Result<(), AppError> {
        let user = UserService::get_by_email(db, email).await?;
        Self::consume_otp(db, user.id, code, OtpPurpose::Verification).await?;

        sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
            .bind(user.id)
            .execute(db)
            .await?;

        Ok(())
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<(User, TokenPair), AppError> {
        let email = normalize_email(&dto.email);

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(mut user) = user else {
            track_login_failure("unknown_email");
            security_event!("login_failed", email = %email, reason = "unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !user.is_active || !verify_password_async(&dto.password, &user.password).await? {
            track_login_failure("bad_credentials");
            security_event!("login_failed", email = %email, reason = "bad_credentials");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(now)
            .bind(user.id)
            .execute(db)
            .await?;
        sqlx::query("UPDATE profiles SET last_login = $1 WHERE user_id = $2")
            .bind(now)
            .bind(user.id)
            .execute(db)
            .await?;
        user.last_login = Some(now);

        track_login_success(user.role.as_str());
        let tokens = Self::issue_tokens(&user, jwt_config)?;
        Ok((user, tokens))
    }

    pub fn issue_tokens(user: &User, jwt_config: &JwtConfig) -> Result<TokenPair, AppError> {
        let access = create_access_token(
            user.id.into_inner(),
            &user.email,
            user.role.as_str(),
            user.is_staff,
            jwt_config,
        )?;
        let refresh = create_refresh_token(user.id.into_inner(), &user.email, jwt_config)?;
        track_jwt_issued();
        Ok(TokenPair { refresh, access })
    }

    #[instrument(skip(db, dto))]
    pub async fn reset_password(db: &PgPool, dto: ResetPasswordRequest) -> Result<(), AppError> {
        if dto.new_password != dto.confirm_password {
            return Err(AppError::invalid("Passwords do not match"));
        }

        let user = UserService::get_by_email(db, &dto.email).await?;
        Self::consume_otp(db, user.id, &dto.code, OtpPurpose::PasswordReset).await?;

        let password_hash = hash_password_async(&dto.new_password).await?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user.id)
            .execute(db)
            .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn email_exists(db: &PgPool, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(db)
            .await?;
        Ok(exists)
    }

    #[instrument(skip(db))]
    pub async fn delete_account(db: &PgPool, user_id: UserId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }
        Ok(())
    }

    /// Records `jti` in the blacklist. Returns false when it was already there.
    async fn blacklist(
        db: &PgPool,
        jti: &str,
        user_id: UserId,
        exp: usize,
    ) -> Result<bool, AppError> {
        let expires_at = Utc
            .timestamp_opt(exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let inserted = sqlx::query(
            "INSERT INTO token_blacklist (jti, user_id, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    #[instrument(skip(db, refresh, jwt_config))]
    pub async fn logout(db: &PgPool, refresh: &str, jwt_config: &JwtConfig) -> Result<(), AppError> {
        let claims = verify_refresh_token(refresh, jwt_config)
            .map_err(|_| AppError::invalid("Token is invalid or expired"))?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::invalid("Token is invalid or expired"))?;

        if !Self::blacklist(db, &claims.jti, user_id, claims.exp).await? {
            return Err(AppError::invalid("Token is blacklisted"));
        }
        Ok(())
    }

    /// Rotates a refresh token: the old `jti` is blacklisted and a new pair issued.
    #[instrument(skip(db, refresh, jwt_config))]
    pub async fn refresh(
        db: &PgPool,
        refresh: &str,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let claims = verify_refresh_token(refresh, jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Token is invalid or expired"))?;

        if !Self::blacklist(db, &claims.jti, user_id, claims.exp).await? {
            return Err(AppError::unauthorized("Token is blacklisted"));
        }

        let user = UserService::get_user(db, user_id)
            .await
            .map_err(|_| AppError::unauthorized("User not found"))?;
        if !user.is_active {
            return Err(AppError::unauthorized("User is inactive"));
        }

        Self::issue_tokens(&user, jwt_config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_roles() {
        assert_eq!(parse_signup_role(None).unwrap(), UserRole::Student);
        assert_eq!(parse_signup_role(Some("Parent")).unwrap(), UserRole::Parent);
        assert_eq!(
            parse_signup_role(Some("admin")).unwrap_err().message(),
            ADMIN_ROLE_MESSAGE
        );
        assert_eq!(
            parse_signup_role(Some("tutor")).unwrap_err().message(),
            INVALID_ROLE_MESSAGE
        );
    }

    async fn bare_user(pool: &PgPool, email: &str) -> UserId {
        sqlx::query_scalar("INSERT INTO users (email, password) VALUES ($1, 'x') RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn linking_code_collision_draws_again(pool: PgPool) {
        let student = NewStudent {
            student_id: None,
            current_class: None,
            current_school: None,
        };

        let first = bare_user(&pool, "first@test.com").await;
        let mut tx = pool.begin().await.unwrap();
        AuthService::insert_student(&mut tx, first, &student, || "TAKEN001".to_string())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let second = bare_user(&pool, "second@test.com").await;
        let mut codes = vec!["TAKEN001", "FRESH002"].into_iter();
        let mut tx = pool.begin().await.unwrap();
        let stored = AuthService::insert_student(&mut tx, second, &student, || {
            codes.next().unwrap().to_string()
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(stored, "FRESH002");

        let third = bare_user(&pool, "third@test.com").await;
        let mut tx = pool.begin().await.unwrap();
        let err = AuthService::insert_student(&mut tx, third, &student, || "TAKEN001".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" STU01 ".to_string())), Some("STU01".to_string()));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
