//! Modelo de Notification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notificación in-app. `technician_id = None` va dirigida a admins/managers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub technician_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub issue_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
