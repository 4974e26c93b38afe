//! Background work for notifications: email delivery with retries, bulk
//! sends and the periodic cleanup of old read notifications.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, instrument, warn};

use academy_core::AppError;
use academy_models::{NotificationId, RecipientType};

use crate::metrics::track_email_sent;
use crate::modules::notifications::model::{
    BulkNotificationDto, BulkNotificationResult, NewNotification, Notification,
};
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::email::EmailService;

pub const MAX_RETRIES: u32 = 3;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Already sent, or the user turned this kind of email off.
    Skipped,
}

/// `base * (retries + 1)` seconds before retry number `retries + 1`.
pub fn retry_delay(base_secs: u64, retries: u32) -> Duration {
    Duration::from_secs(base_secs * (u64::from(retries) + 1))
}

/// One delivery attempt for a notification's email.
#[instrument(skip(db, email))]
pub async fn deliver_once(
    db: &PgPool,
    email: &EmailService,
    id: NotificationId,
) -> Result<Delivery, AppError> {
    let notification = NotificationService::get_by_id(db, id).await?;
    if notification.email_sent {
        return Ok(Delivery::Skipped);
    }

    let preferences = NotificationService::get_preferences(db, notification.user_id).await?;
    if !preferences.allows_email(notification.notification_type) {
        NotificationService::mark_email_sent(db, id).await?;
        track_email_sent("skipped");
        info!(notification_id = %id, "Email disabled by user preference");
        return Ok(Delivery::Skipped);
    }

    let user = UserService::get_user(db, notification.user_id).await?;
    email
        .send_notification(
            &user.email,
            &user.full_name(),
            &notification.title,
            &notification.message,
            notification.action_url.as_deref(),
        )
        .await?;

    NotificationService::mark_email_sent(db, id).await?;
    Ok(Delivery::Sent)
}

/// Runs `attempt` until it succeeds or [`MAX_RETRIES`] retries have failed,
/// backing off linearly between tries.
async fn with_retries<T, F, Fut>(
    id: NotificationId,
    retry_base_secs: u64,
    mut attempt: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if retries < MAX_RETRIES => {
                let delay = retry_delay(retry_base_secs, retries);
                warn!(
                    notification_id = %id,
                    error = %e.message(),
                    retry = retries + 1,
                    delay_secs = delay.as_secs(),
                    "Notification email failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            Err(e) => {
                error!(notification_id = %id, error = %e.message(), "Notification email failed permanently");
                return Err(e);
            }
        }
    }
}

/// Delivers with up to [`MAX_RETRIES`] retries.
#[instrument(skip(db, email))]
pub async fn deliver_with_retry(
    db: &PgPool,
    email: &EmailService,
    id: NotificationId,
    retry_base_secs: u64,
) -> Result<Delivery, AppError> {
    with_retries(id, retry_base_secs, || deliver_once(db, email, id)).await
}

pub fn spawn_email(state: &AppState, id: NotificationId) -> JoinHandle<()> {
    let db = state.db.clone();
    let email = EmailService::new(state.email_config.clone());
    let retry_base_secs = state.app_config.email_retry_base_secs;

    tokio::spawn(async move {
        let _ = deliver_with_retry(&db, &email, id, retry_base_secs).await;
    })
}

/// Stores a notification and queues its email.
pub async fn notify(state: &AppState, new: NewNotification) -> Result<Notification, AppError> {
    let notification = NotificationService::create(&state.db, new).await?;
    spawn_email(state, notification.id);
    Ok(notification)
}

/// Creates one notification per user, then delivers every email
/// concurrently with retries and tallies the outcomes.
#[instrument(skip(state, dto), fields(recipients = dto.user_ids.len()))]
pub async fn send_bulk(state: &AppState, dto: BulkNotificationDto) -> BulkNotificationResult {
    let mut result = BulkNotificationResult::default();
    let mut deliveries = JoinSet::new();

    for user_id in dto.user_ids {
        let user = match UserService::get_user(&state.db, user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id = %user_id, error = %e.message(), "Bulk notification recipient not found");
                result.failed += 1;
                continue;
            }
        };

        let new = NewNotification {
            user_id,
            recipient_type: RecipientType::from(user.role),
            notification_type: dto.notification_type,
            title: dto.title.clone(),
            message: dto.message.clone(),
            action_url: dto.action_url.clone(),
            related_object_id: None,
            related_object_type: None,
        };

        let notification = match NotificationService::create(&state.db, new).await {
            Ok(notification) => notification,
            Err(e) => {
                warn!(user_id = %user_id, error = %e.message(), "Bulk notification failed");
                result.failed += 1;
                continue;
            }
        };

        let db = state.db.clone();
        let email = EmailService::new(state.email_config.clone());
        let retry_base_secs = state.app_config.email_retry_base_secs;
        deliveries.spawn(async move {
            deliver_with_retry(&db, &email, notification.id, retry_base_secs).await
        });
    }

    while let Some(joined) = deliveries.join_next().await {
        match joined {
            Ok(Ok(Delivery::Sent)) => result.success += 1,
            Ok(Ok(Delivery::Skipped)) => result.skipped += 1,
            Ok(Err(_)) => result.failed += 1,
            Err(e) => {
                error!(error = %e, "Bulk delivery task aborted");
                result.failed += 1;
            }
        }
    }

    info!(
        success = result.success,
        failed = result.failed,
        skipped = result.skipped,
        "Bulk notification finished"
    );
    result
}

/// Runs the cleanup once a day for the life of the process.
pub fn spawn_cleanup(db: PgPool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match NotificationService::cleanup_old(&db).await {
                Ok(deleted) => info!(deleted, "Old read notifications cleaned up"),
                Err(e) => error!(error = %e.message(), "Notification cleanup failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use academy_config::EmailConfig;
    use academy_models::{NotificationType, UserId, UserRole};
    use uuid::Uuid;

    #[tokio::test]
    async fn retries_stop_after_max_retries() {
        let calls = AtomicU32::new(0);
        let id = NotificationId::from(Uuid::new_v4());

        let result: Result<(), AppError> = with_retries(id, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::internal_error("smtp down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn retries_return_first_success() {
        let calls = AtomicU32::new(0);
        let id = NotificationId::from(Uuid::new_v4());

        let result = with_retries(id, 0, || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(AppError::internal_error("smtp down"))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    async fn student_with_notification(db: &PgPool, kind: NotificationType) -> Notification {
        let user_id: UserId = sqlx::query_scalar(
            "INSERT INTO users (email, first_name, last_name, password, role, is_active)
             VALUES ('ada@example.com', 'Ada', 'Lovelace', 'x', 'student', TRUE)
             RETURNING id",
        )
        .fetch_one(db)
        .await
        .unwrap();

        NotificationService::create(
            db,
            NewNotification {
                user_id,
                recipient_type: RecipientType::from(UserRole::Student),
                notification_type: kind,
                title: "Enrolled".into(),
                message: "Welcome aboard".into(),
                action_url: None,
                related_object_id: None,
                related_object_type: None,
            },
        )
        .await
        .unwrap()
    }

    fn disabled_email() -> EmailService {
        let mut config = EmailConfig::from_env();
        config.enabled = false;
        EmailService::new(config)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delivery_respects_disabled_preference(pool: PgPool) {
        let notification = student_with_notification(&pool, NotificationType::Enrollment).await;
        sqlx::query(
            "INSERT INTO notification_preferences (user_id, email_enrollment) VALUES ($1, FALSE)",
        )
        .bind(notification.user_id)
        .execute(&pool)
        .await
        .unwrap();

        let delivery = deliver_once(&pool, &disabled_email(), notification.id)
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Skipped);

        let stored = NotificationService::get_by_id(&pool, notification.id)
            .await
            .unwrap();
        assert!(stored.email_sent);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delivery_sends_once(pool: PgPool) {
        let notification = student_with_notification(&pool, NotificationType::Enrollment).await;
        let email = disabled_email();

        assert_eq!(
            deliver_once(&pool, &email, notification.id).await.unwrap(),
            Delivery::Sent
        );
        assert_eq!(
            deliver_once(&pool, &email, notification.id).await.unwrap(),
            Delivery::Skipped
        );
    }

    #[test]
    fn retry_delay_grows_linearly() {
        assert_eq!(retry_delay(60, 0), Duration::from_secs(60));
        assert_eq!(retry_delay(60, 1), Duration::from_secs(120));
        assert_eq!(retry_delay(60, 2), Duration::from_secs(180));
        assert_eq!(retry_delay(0, 2), Duration::ZERO);
    }
}
