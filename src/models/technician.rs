//! Modelo de Technician
//!
//! Técnicos, managers y administradores comparten la tabla `technicians`;
//! la autorización se reduce al rol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Rol del técnico - mapea al ENUM technician_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "technician_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TechnicianRole {
    Admin,
    Manager,
    Technician,
}

impl TechnicianRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicianRole::Admin => "admin",
            TechnicianRole::Manager => "manager",
            TechnicianRole::Technician => "technician",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Some(TechnicianRole::Admin),
            "manager" => Some(TechnicianRole::Manager),
            "technician" => Some(TechnicianRole::Technician),
            _ => None,
        }
    }

    /// Admin y manager pueden gestionar issues de cualquier técnico
    pub fn is_staff(&self) -> bool {
        matches!(self, TechnicianRole::Admin | TechnicianRole::Manager)
    }
}

/// Technician principal - mapea exactamente a la tabla technicians
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Technician {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: TechnicianRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [TechnicianRole::Admin, TechnicianRole::Manager, TechnicianRole::Technician] {
            assert_eq!(TechnicianRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(TechnicianRole::parse(" Admin "), Some(TechnicianRole::Admin));
        assert_eq!(TechnicianRole::parse("driver"), None);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let technician = Technician {
            id: Uuid::new_v4(),
            full_name: "Ravi Patil".to_string(),
            email: "ravi@example.com".to_string(),
            phone: None,
            password_hash: "$2b$12$secret".to_string(),
            role: TechnicianRole::Technician,
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&technician).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "technician");
    }
}
