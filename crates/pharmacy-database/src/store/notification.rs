//! Notification persistence contract.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pharmacy_core::result::AppResult;
use pharmacy_core::types::{PageRequest, PageResponse};
use pharmacy_entity::notification::{
    AlertSubject, DuplicateQuery, NewNotification, Notification, NotificationCount,
    NotificationType,
};

/// Persisted alerts addressed to users.
///
/// Duplicates are allowed at this level; callers check [`exists`](Self::exists)
/// before inserting.
#[async_trait]
pub trait NotificationStore: Send + Sync + Debug + 'static {
    /// Insert an unread notification stamped with the current time.
    async fn create(&self, input: NewNotification) -> AppResult<Notification>;

    /// Whether a notification matching the query already exists.
    async fn exists(&self, query: &DuplicateQuery) -> AppResult<bool>;

    /// Mark every unread notification of `kind` about `subject` as read.
    async fn mark_subject_read(&self, kind: NotificationType, subject: AlertSubject)
    -> AppResult<u64>;

    /// Mark one of the user's notifications as read.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Unread, unexpired notifications of the user.
    async fn count_active(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<i64>;

    /// Newest unread, unexpired notifications of the user.
    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    /// All notifications of the user, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Delete notifications read before `cutoff`. Unread ones are kept.
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Counts grouped by type and priority for notifications created since `since`.
    async fn count_since(&self, since: DateTime<Utc>) -> AppResult<Vec<NotificationCount>>;
}
