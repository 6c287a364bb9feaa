//! Notifications repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{enums::NotificationType, notification::Notification},
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a notification for a user
    pub async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        title: &str,
        message: &str,
        email_sent: bool,
    ) -> AppResult<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, title, message, email_sent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(email_sent)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> AppResult<Vec<Notification>> {
        let query = if unread_only {
            "SELECT * FROM notifications WHERE user_id = $1 AND is_read = FALSE ORDER BY created_at DESC"
        } else {
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"
        };
        let notifications = sqlx::query_as::<_, Notification>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(notifications)
    }

    /// Mark a notification read. The check constraint ties `is_read` to
    /// `read_at`, so both are set together.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $3
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }
}
