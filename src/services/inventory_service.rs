//! Reglas de stock del inventario

use crate::utils::errors::AppError;

/// Stock resultante de un ajuste; nunca negativo ni fuera de rango
pub fn stock_after_adjustment(current: i32, delta: i32) -> Result<i32, AppError> {
    if delta == 0 {
        return Err(AppError::BadRequest("El ajuste debe ser distinto de cero".to_string()));
    }

    let next = current
        .checked_add(delta)
        .ok_or_else(|| AppError::BadRequest(format!("Ajuste fuera de rango: {} + {}", current, delta)))?;

    if next < 0 {
        return Err(AppError::Conflict(format!(
            "Stock insuficiente: disponible {}, ajuste {}",
            current, delta
        )));
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_adds_and_removes_stock() {
        assert_eq!(stock_after_adjustment(5, 3).unwrap(), 8);
        assert_eq!(stock_after_adjustment(5, -5).unwrap(), 0);
    }

    #[test]
    fn test_adjustment_never_goes_below_zero() {
        assert!(matches!(stock_after_adjustment(5, -6), Err(AppError::Conflict(_))));
        assert!(matches!(stock_after_adjustment(0, -1), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_zero_and_overflowing_adjustments_are_bad_requests() {
        assert!(matches!(stock_after_adjustment(5, 0), Err(AppError::BadRequest(_))));
        assert!(matches!(stock_after_adjustment(i32::MAX, 1), Err(AppError::BadRequest(_))));
    }
}
