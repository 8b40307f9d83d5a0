//! Notification inbox operations and manually raised alerts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_core::types::{PageRequest, PageResponse};
use pharmacy_database::store::NotificationStore;
use pharmacy_entity::notification::{
    AlertPayload, NewNotification, Notification, NotificationPriority, NotificationType,
};

use crate::alerting::{Alert, AlertEmitter, Audience, Dedup, Delivery, Emission};

/// Default size of the "recent notifications" panel.
pub const RECENT_LIMIT: i64 = 10;

/// A one-off notification for a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    emitter: Arc<AlertEmitter>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, emitter: Arc<AlertEmitter>) -> Self {
        Self { store, emitter }
    }

    /// Unread notifications that have not expired.
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        self.store.count_active(user_id, Utc::now()).await
    }

    /// Newest unread, unexpired notifications.
    pub async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Notification>> {
        self.store.list_active(user_id, Utc::now(), limit).await
    }

    pub async fn list(&self, user_id: Uuid, page: PageRequest) -> AppResult<PageResponse<Notification>> {
        self.store.list_for_user(user_id, &page).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self.store.mark_read(id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Notification {id} not found")))
        }
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.store.mark_all_read(user_id).await
    }

    /// Broadcast a system message, to everyone when no recipients are given.
    /// Returns the number of notifications written.
    pub async fn send_system_alert(
        &self,
        title: &str,
        message: &str,
        priority: NotificationPriority,
        recipients: Option<Vec<Uuid>>,
    ) -> AppResult<usize> {
        self.send_system_alert_until(title, message, priority, recipients, None)
            .await
    }

    /// Like [`send_system_alert`](Self::send_system_alert), with an expiry.
    pub async fn send_system_alert_until(
        &self,
        title: &str,
        message: &str,
        priority: NotificationPriority,
        recipients: Option<Vec<Uuid>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<usize> {
        let audience = recipients.map_or(Audience::AllUsers, Audience::Users);
        let mut delivery = Delivery::new(audience, priority, title, message);
        delivery.expires_at = expires_at;
        let alert = Alert::new(
            AlertPayload::SystemMessage {
                created_by_system: true,
            },
            Dedup::None,
        )
        .deliver(delivery);

        let created = match self.emitter.emit(alert).await? {
            Emission::Created(n) => n,
            Emission::Suppressed | Emission::Skipped => 0,
        };
        info!(title, created, "System alert sent");
        Ok(created)
    }

    pub async fn create_custom(&self, input: CustomNotification) -> AppResult<Notification> {
        self.store
            .create(NewNotification {
                user_id: input.user_id,
                kind: input.kind,
                title: input.title,
                message: input.message,
                data: AlertPayload::Custom {
                    details: input.details,
                },
                priority: input.priority,
                action_url: input.action_url,
                expires_at: input.expires_at,
            })
            .await
    }
}
