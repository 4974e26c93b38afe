//! In-app notifications and per-user email preferences.

use academy_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::enums::{NotificationType, RecipientType};
use crate::ids::{NotificationId, NotificationPreferenceId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub recipient_type: RecipientType,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub related_object_id: Option<Uuid>,
    pub related_object_type: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub recipient_type: RecipientType,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub related_object_id: Option<Uuid>,
    pub related_object_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedNotificationsResponse {
    pub data: Vec<Notification>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            updated: None,
        }
    }

    pub fn updated(count: u64) -> Self {
        Self {
            status: "success".to_string(),
            updated: Some(count),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkNotificationDto {
    #[validate(length(min = 1, message = "At least one user id is required."))]
    pub user_ids: Vec<UserId>,
    pub notification_type: NotificationType,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkNotificationResult {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationPreferences {
    pub id: NotificationPreferenceId,
    pub user_id: UserId,
    pub email_enrollment: bool,
    pub email_payment: bool,
    pub email_course_updates: bool,
    pub email_reminders: bool,
    pub email_marketing: bool,
    pub push_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// Whether an email should go out for `kind`. Types without a matching
    /// preference are always sent.
    pub fn allows_email(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::Enrollment => self.email_enrollment,
            NotificationType::Payment => self.email_payment,
            NotificationType::CourseUpdate => self.email_course_updates,
            NotificationType::Reminder => self.email_reminders,
            _ => true,
        }
    }
}

/// Full replacement for `PUT /notification-preferences`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdatePreferencesDto {
    pub email_enrollment: bool,
    pub email_payment: bool,
    pub email_course_updates: bool,
    pub email_reminders: bool,
    pub email_marketing: bool,
    pub push_enabled: bool,
}

/// Partial update for `PATCH /notification-preferences`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PatchPreferencesDto {
    pub email_enrollment: Option<bool>,
    pub email_payment: Option<bool>,
    pub email_course_updates: Option<bool>,
    pub email_reminders: Option<bool>,
    pub email_marketing: Option<bool>,
    pub push_enabled: Option<bool>,
}

impl From<UpdatePreferencesDto> for PatchPreferencesDto {
    fn from(dto: UpdatePreferencesDto) -> Self {
        Self {
            email_enrollment: Some(dto.email_enrollment),
            email_payment: Some(dto.email_payment),
            email_course_updates: Some(dto.email_course_updates),
            email_reminders: Some(dto.email_reminders),
            email_marketing: Some(dto.email_marketing),
            push_enabled: Some(dto.push_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> NotificationPreferences {
        NotificationPreferences {
            id: NotificationPreferenceId::new(),
            user_id: UserId::new(),
            email_enrollment: false,
            email_payment: true,
            email_course_updates: false,
            email_reminders: true,
            email_marketing: false,
            push_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn preference_mapping() {
        let prefs = prefs();
        assert!(!prefs.allows_email(NotificationType::Enrollment));
        assert!(prefs.allows_email(NotificationType::Payment));
        assert!(!prefs.allows_email(NotificationType::CourseUpdate));
        assert!(prefs.allows_email(NotificationType::Reminder));
        assert!(prefs.allows_email(NotificationType::Certificate));
        assert!(prefs.allows_email(NotificationType::System));
    }

    #[test]
    fn status_response_shapes() {
        let json = serde_json::to_value(StatusResponse::success()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success"}));

        let json = serde_json::to_value(StatusResponse::updated(3)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success", "updated": 3}));
    }

    #[test]
    fn put_body_requires_every_field() {
        let result: Result<UpdatePreferencesDto, _> =
            serde_json::from_str(r#"{"email_enrollment":false}"#);
        assert!(result.is_err());
    }
}
