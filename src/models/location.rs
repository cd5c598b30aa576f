//! Coordenadas y ubicación en vivo de los técnicos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coordenada GPS (grados decimales)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Construir desde columnas opcionales; solo si ambas existen
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self { latitude, longitude }),
            _ => None,
        }
    }

    /// Formato `lon,lat` que usan los servicios de rutas
    pub fn to_lon_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

/// Última ubicación reportada por un técnico - tabla live_locations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LiveLocation {
    pub technician_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both() {
        assert_eq!(
            Coordinates::from_parts(Some(18.52), Some(73.85)),
            Some(Coordinates::new(18.52, 73.85))
        );
        assert_eq!(Coordinates::from_parts(Some(18.52), None), None);
        assert_eq!(Coordinates::from_parts(None, None), None);
    }

    #[test]
    fn test_to_lon_lat() {
        assert_eq!(Coordinates::new(18.5, 73.25).to_lon_lat(), "73.25,18.5");
    }
}
