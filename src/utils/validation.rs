//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar un par opcional de coordenadas: ambas o ninguna
pub fn validate_coordinate_pair(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<(f64, f64)>, ValidationError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            validate_coordinates(lat, lng)?;
            Ok(Some((lat, lng)))
        }
        (None, None) => Ok(None),
        _ => {
            let mut error = ValidationError::new("coordinate_pair");
            error.add_param("message".into(), &"latitude and longitude must be given together".to_string());
            Err(error)
        }
    }
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

fn vehicle_no_regex() -> Option<&'static Regex> {
    static VEHICLE_NO: OnceLock<Option<Regex>> = OnceLock::new();
    VEHICLE_NO
        .get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9 \-]{2,19}$").ok())
        .as_ref()
}

/// Normalizar número de vehículo: sin espacios externos y en mayúsculas
pub fn normalize_vehicle_no(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Validar formato de número de vehículo (ya normalizado)
pub fn validate_vehicle_no(value: &str) -> Result<(), ValidationError> {
    if !vehicle_no_regex().is_some_and(|re| re.is_match(value)) {
        let mut error = ValidationError::new("vehicle_no");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"3-20 letters, digits, spaces or hyphens".to_string());
        return Err(error);
    }
    Ok(())
}
