//! Modelo de Issue
//!
//! Ticket de un problema de vehículo/dispositivo con prioridad, estado
//! y asignación a un técnico. Mapea exactamente a la tabla issues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::location::Coordinates;

/// Prioridad del issue - mapea al ENUM issue_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "issue_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl IssuePriority {
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::Low,
        IssuePriority::Medium,
        IssuePriority::High,
        IssuePriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// Estado del issue - mapea al ENUM issue_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "issue_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 5] = [
        IssueStatus::Pending,
        IssueStatus::Assigned,
        IssueStatus::InProgress,
        IssueStatus::Completed,
        IssueStatus::Cancelled,
    ];

    /// Estados que cuentan como "issue abierto" para un vehículo
    pub const OPEN: [IssueStatus; 3] = [
        IssueStatus::Pending,
        IssueStatus::Assigned,
        IssueStatus::InProgress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::Assigned => "assigned",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Completed => "completed",
            IssueStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IssueStatus::Completed | IssueStatus::Cancelled)
    }

    /// pending → assigned → in_progress → completed; cualquier estado abierto → cancelled
    pub fn can_transition_to(&self, next: IssueStatus) -> bool {
        use IssueStatus::*;
        match (self, next) {
            (current, next) if *current == next => false,
            (Pending, Assigned) | (Assigned, Pending) => true,
            (Assigned, InProgress) => true,
            (InProgress, Completed) => true,
            (current, Cancelled) => current.is_open(),
            _ => false,
        }
    }
}

/// Issue principal - mapea exactamente a la tabla issues
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub client: String,
    pub vehicle_no: String,
    pub device_imei: Option<String>,
    pub problem: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub photo_url: Option<String>,
    pub signature_url: Option<String>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}
