//! PostgreSQL notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::{AppError, ErrorKind};
use pharmacy_core::result::AppResult;
use pharmacy_core::types::{PageRequest, PageResponse};
use pharmacy_entity::notification::{
    AlertSubject, DuplicateQuery, NewNotification, Notification, NotificationCount,
    NotificationType,
};

use crate::store::NotificationStore;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, input: NewNotification) -> AppResult<Notification> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid notification: {e}")))?;

        let subject = input.subject();
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, notification_type, title, message, data, priority, \
             action_url, subject_type, subject_id, alert_key, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.message)
        .bind(Json(&input.data))
        .bind(input.priority)
        .bind(&input.action_url)
        .bind(subject.kind())
        .bind(subject.id())
        .bind(input.alert_key())
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn exists(&self, query: &DuplicateQuery) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM notifications \
             WHERE notification_type = $1 AND subject_type = $2 \
             AND subject_id IS NOT DISTINCT FROM $3 \
             AND ($4::text IS NULL OR alert_key = $4) \
             AND ($5::timestamptz IS NULL OR created_at >= $5))",
        )
        .bind(query.kind)
        .bind(query.subject.kind())
        .bind(query.subject.id())
        .bind(query.alert_key)
        .bind(query.since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up duplicate notification", e)
        })
    }

    async fn mark_subject_read(
        &self,
        kind: NotificationType,
        subject: AlertSubject,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() \
             WHERE notification_type = $1 AND subject_type = $2 \
             AND subject_id IS NOT DISTINCT FROM $3 AND read_at IS NULL",
        )
        .bind(kind)
        .bind(subject.kind())
        .bind(subject.id())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear subject alerts", e))?;
        Ok(result.rows_affected())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND read_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn count_active(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL \
             AND (expires_at IS NULL OR expires_at > $2)",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }

    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND read_at IS NULL \
             AND (expires_at IS NULL OR expires_at > $2) \
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list unread", e))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
                })?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE read_at IS NOT NULL AND read_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete old notifications", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> AppResult<Vec<NotificationCount>> {
        sqlx::query_as::<_, NotificationCount>(
            "SELECT notification_type, priority, COUNT(*) AS count FROM notifications \
             WHERE created_at >= $1 GROUP BY notification_type, priority \
             ORDER BY notification_type, priority",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to summarize notifications", e))
    }
}
