use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::{NotificationId, UserId};

use crate::modules::notifications::model::{
    NewNotification, Notification, NotificationFilterParams, NotificationPreferences,
    PaginatedNotificationsResponse, PatchPreferencesDto,
};

const NOTIFICATION_COLUMNS: &str = "id, user_id, recipient_type, notification_type, title, \
     message, action_url, related_object_id, related_object_type, is_read, read_at, \
     email_sent, email_sent_at, created_at";

const PREFERENCE_COLUMNS: &str = "id, user_id, email_enrollment, email_payment, \
     email_course_updates, email_reminders, email_marketing, push_enabled, created_at, updated_at";

/// Read notifications older than this many days are removed by the cleanup task.
pub const RETENTION_DAYS: i32 = 90;

pub struct NotificationService;

impl NotificationService {
    #[instrument(skip(db, new), fields(user_id = %new.user_id, kind = %new.notification_type))]
    pub async fn create(db: &PgPool, new: NewNotification) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (
                user_id, recipient_type, notification_type, title, message, action_url,
                related_object_id, related_object_type
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            NOTIFICATION_COLUMNS
        ))
        .bind(new.user_id)
        .bind(new.recipient_type)
        .bind(new.notification_type)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.action_url)
        .bind(new.related_object_id)
        .bind(&new.related_object_type)
        .fetch_one(db)
        .await?;

        Ok(notification)
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, id: NotificationId) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Notification not found")))
    }

    /// A notification owned by `user_id`; anyone else's is reported missing.
    #[instrument(skip(db))]
    pub async fn get_own(
        db: &PgPool,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = $1 AND user_id = $2",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Notification not found")))
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        user_id: UserId,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;

        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC{}",
            NOTIFICATION_COLUMNS,
            filters.pagination.sql_suffix()
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(PaginatedNotificationsResponse {
            data: notifications,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &PgPool, user_id: UserId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(db))]
    pub async fn mark_read(
        db: &PgPool,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), AppError> {
        let notification = Self::get_own(db, user_id, id).await?;
        if notification.is_read {
            return Ok(());
        }

        sqlx::query("UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Returns how many notifications changed.
    #[instrument(skip(db))]
    pub async fn mark_all_read(db: &PgPool, user_id: UserId) -> Result<u64, AppError> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW()
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

        Ok(updated)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, user_id: UserId, id: NotificationId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow!("Notification not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn mark_email_sent(db: &PgPool, id: NotificationId) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE notifications SET email_sent = TRUE, email_sent_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;

        Ok(())
    }

    /// Deletes read notifications older than [`RETENTION_DAYS`].
    #[instrument(skip(db))]
    pub async fn cleanup_old(db: &PgPool) -> Result<u64, AppError> {
        let deleted = sqlx::query(
            "DELETE FROM notifications
             WHERE is_read = TRUE AND created_at < NOW() - make_interval(days => $1)",
        )
        .bind(RETENTION_DAYS)
        .execute(db)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    /// The user's preferences, created with defaults on first access.
    #[instrument(skip(db))]
    pub async fn get_preferences(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<NotificationPreferences, AppError> {
        sqlx::query(
            "INSERT INTO notification_preferences (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        let preferences = sqlx::query_as::<_, NotificationPreferences>(&format!(
            "SELECT {} FROM notification_preferences WHERE user_id = $1",
            PREFERENCE_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(preferences)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_preferences(
        db: &PgPool,
        user_id: UserId,
        dto: PatchPreferencesDto,
    ) -> Result<NotificationPreferences, AppError> {
        Self::get_preferences(db, user_id).await?;

        let preferences = sqlx::query_as::<_, NotificationPreferences>(&format!(
            "UPDATE notification_preferences SET
                email_enrollment = COALESCE($1, email_enrollment),
                email_payment = COALESCE($2, email_payment),
                email_course_updates = COALESCE($3, email_course_updates),
                email_reminders = COALESCE($4, email_reminders),
                email_marketing = COALESCE($5, email_marketing),
                push_enabled = COALESCE($6, push_enabled),
                updated_at = NOW()
             WHERE user_id = $7
             RETURNING {}",
            PREFERENCE_COLUMNS
        ))
        .bind(dto.email_enrollment)
        .bind(dto.email_payment)
        .bind(dto.email_course_updates)
        .bind(dto.email_reminders)
        .bind(dto.email_marketing)
        .bind(dto.push_enabled)
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(preferences)
    }
}
