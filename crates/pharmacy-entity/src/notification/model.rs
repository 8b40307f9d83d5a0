//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::kind::NotificationType;
use super::payload::AlertPayload;
use super::priority::NotificationPriority;
use super::subject::{AlertSubject, SubjectKind};

/// One alert addressed to one user.
///
/// Immutable once created except for `read_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    /// The recipient.
    pub user_id: Uuid,
    #[sqlx(rename = "notification_type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Json<AlertPayload>,
    pub priority: NotificationPriority,
    /// Deep link to the subject's detail page.
    pub action_url: Option<String>,
    pub subject_type: SubjectKind,
    pub subject_id: Option<Uuid>,
    pub alert_key: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }

    /// Unread and not past its expiry.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_unread() && self.expires_at.is_none_or(|expires| expires > now)
    }

    pub fn subject(&self) -> AlertSubject {
        self.data.0.subject()
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewNotification {
    #[validate(custom(function = "validate_recipient"))]
    pub user_id: Uuid,
    pub kind: NotificationType,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    pub data: AlertPayload,
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn subject(&self) -> AlertSubject {
        self.data.subject()
    }

    pub fn alert_key(&self) -> &'static str {
        self.data.alert_key()
    }

    /// Materialize the stored record.
    pub fn into_notification(self, id: Uuid, created_at: DateTime<Utc>) -> Notification {
        let subject = self.subject();
        let alert_key = self.alert_key().to_string();
        Notification {
            id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            data: Json(self.data),
            priority: self.priority,
            action_url: self.action_url,
            subject_type: subject.kind(),
            subject_id: subject.id(),
            alert_key,
            expires_at: self.expires_at,
            read_at: None,
            created_at,
        }
    }
}

fn validate_recipient(user_id: &Uuid) -> Result<(), ValidationError> {
    if user_id.is_nil() {
        return Err(ValidationError::new("nil_recipient"));
    }
    Ok(())
}

/// Existence check for an earlier alert of the same kind about the same subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateQuery {
    pub kind: NotificationType,
    pub subject: AlertSubject,
    /// `None` matches any alert key for the subject.
    pub alert_key: Option<&'static str>,
    /// `None` means permanent: any matching record counts, whatever its age.
    pub since: Option<DateTime<Utc>>,
}

impl DuplicateQuery {
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.kind == self.kind
            && notification.subject_type == self.subject.kind()
            && notification.subject_id == self.subject.id()
            && self
                .alert_key
                .is_none_or(|key| notification.alert_key == key)
            && self
                .since
                .is_none_or(|since| notification.created_at >= since)
    }
}

/// Number of notifications for one (type, priority) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationCount {
    #[sqlx(rename = "notification_type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: NotificationPriority,
    pub count: i64,
}
