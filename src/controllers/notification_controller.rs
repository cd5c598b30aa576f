use sqlx::PgPool;
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::notification::Notification;
use crate::repositories::notification_repository::NotificationRepository;
use crate::utils::errors::AppError;

pub struct NotificationController {
    repository: NotificationRepository,
}

impl NotificationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }

    pub async fn list(&self, user: AuthenticatedUser, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        self.repository.list_for(user.technician_id, unread_only).await
    }

    pub async fn mark_read(&self, user: AuthenticatedUser, id: Uuid) -> Result<Notification, AppError> {
        self.repository
            .mark_read(id, user.technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notificación no encontrada".to_string()))
    }

    pub async fn mark_all_read(&self, user: AuthenticatedUser) -> Result<u64, AppError> {
        let updated = self.repository.mark_all_read(user.technician_id).await?;
        log::debug!("📭 {} notificaciones marcadas como leídas", updated);
        Ok(updated)
    }
}
