use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::utils::errors::AppError;

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        technician_id: Option<Uuid>,
        title: &str,
        message: &str,
        issue_id: Option<Uuid>,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, technician_id, title, message, issue_id, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(technician_id)
        .bind(title)
        .bind(message)
        .bind(issue_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Notificaciones propias más las globales (sin destinatario)
    pub async fn list_for(&self, technician_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE (technician_id = $1 OR technician_id IS NULL)
              AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT 200
            "#,
        )
        .bind(technician_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: Uuid, technician_id: Uuid) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND (technician_id = $2 OR technician_id IS NULL)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(technician_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read(&self, technician_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE (technician_id = $1 OR technician_id IS NULL) AND NOT is_read",
        )
        .bind(technician_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
