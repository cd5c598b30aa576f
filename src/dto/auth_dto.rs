use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::technician::{Technician, TechnicianRole};
use crate::utils::validation::validate_phone;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub technician: Technician,
}

// Request para crear un técnico (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 100))]
    pub password: String,

    #[serde(default = "default_role")]
    pub role: TechnicianRole,
}

fn default_role() -> TechnicianRole {
    TechnicianRole::Technician
}

// Request para actualizar un técnico (admin)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTechnicianRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 100))]
    pub password: Option<String>,

    pub role: Option<TechnicianRole>,

    pub is_active: Option<bool>,
}

// Usuario autenticado resumido para /me
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub role: TechnicianRole,
    pub technician: Technician,
}
