use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::issue::{IssuePriority, IssueStatus};
use crate::utils::validation::validate_not_empty;

// Request para crear un issue
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIssueRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_empty")]
    pub client: String,

    #[validate(length(min = 1, max = 30))]
    pub vehicle_no: String,

    #[validate(length(max = 30))]
    pub device_imei: Option<String>,

    #[validate(length(min = 1, max = 4000), custom = "validate_not_empty")]
    pub problem: String,

    pub priority: Option<IssuePriority>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(length(max = 500))]
    pub location_text: Option<String>,

    pub assigned_to: Option<Uuid>,

    #[validate(url)]
    pub photo_url: Option<String>,

    /// Crear aunque ya exista un issue abierto para el vehículo
    #[serde(default)]
    pub force: bool,
}

// Request para actualizar campos de un issue
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateIssueRequest {
    #[validate(length(min = 1, max = 200))]
    pub client: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub vehicle_no: Option<String>,

    #[validate(length(max = 30))]
    pub device_imei: Option<String>,

    #[validate(length(min = 1, max = 4000))]
    pub problem: Option<String>,

    pub priority: Option<IssuePriority>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(length(max = 500))]
    pub location_text: Option<String>,

    #[validate(length(max = 4000))]
    pub resolution_notes: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,

    #[validate(url)]
    pub signature_url: Option<String>,

    /// Cambiar la matrícula aunque el nuevo vehículo tenga un issue abierto
    #[serde(default)]
    pub force: bool,
}

// Request para asignar (o desasignar con null) un técnico
#[derive(Debug, Deserialize)]
pub struct AssignIssueRequest {
    pub technician_id: Option<Uuid>,
}

// Request para cambiar el estado
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: IssueStatus,

    #[validate(length(max = 4000))]
    pub resolution_notes: Option<String>,
}

/// Filtros para listado de issues
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IssueFilters {
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assigned_to: Option<Uuid>,
    pub vehicle_no: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl IssueFilters {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Conteos para los gráficos del dashboard
#[derive(Debug, Default, Serialize)]
pub struct IssueStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_limit_clamped() {
        let filters = IssueFilters {
            limit: Some(5000),
            offset: Some(-3),
            ..Default::default()
        };
        assert_eq!(filters.limit(), IssueFilters::MAX_LIMIT);
        assert_eq!(filters.offset(), 0);
        assert_eq!(IssueFilters::default().limit(), IssueFilters::DEFAULT_LIMIT);
    }

    #[test]
    fn test_create_request_validation() {
        let request: CreateIssueRequest = serde_json::from_value(serde_json::json!({
            "client": "Baba Travels",
            "vehicle_no": "MH231FC9072",
            "problem": "GPS not reporting",
            "priority": "urgent",
            "latitude": 18.5204,
            "longitude": 73.8567
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(!request.force);
        assert_eq!(request.priority, Some(IssuePriority::Urgent));

        let invalid = CreateIssueRequest {
            problem: "   ".to_string(),
            latitude: Some(120.0),
            ..request
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("problem"));
        assert!(errors.field_errors().contains_key("latitude"));
    }
}
