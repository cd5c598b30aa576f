//! Modelo de Attendance
//!
//! Una fila por técnico y día con horas de entrada/salida y GPS opcional.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub work_date: NaiveDate,
    pub check_in_at: DateTime<Utc>,
    pub check_out_at: Option<DateTime<Utc>>,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub check_out_latitude: Option<f64>,
    pub check_out_longitude: Option<f64>,
}

impl Attendance {
    /// En turno: registró entrada y todavía no salida
    pub fn is_on_duty(&self) -> bool {
        self.check_out_at.is_none()
    }
}

/// Técnico en turno con su última ubicación conocida (si existe)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnDutyTechnician {
    pub technician_id: Uuid,
    pub full_name: String,
    pub check_in_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl OnDutyTechnician {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}
