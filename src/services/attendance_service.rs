//! Reglas de asistencia: una entrada y una salida por técnico y día

use uuid::Uuid;

use crate::models::attendance::Attendance;
use crate::utils::errors::AppError;

/// La entrada solo se registra si el técnico no tiene fila para hoy
pub fn ensure_can_check_in(today: Option<&Attendance>) -> Result<(), AppError> {
    match today {
        Some(_) => Err(AppError::Conflict("Ya registraste la entrada de hoy".to_string())),
        None => Ok(()),
    }
}

/// Fila abierta de hoy sobre la que registrar la salida
pub fn shift_to_close(today: Option<&Attendance>) -> Result<Uuid, AppError> {
    let attendance =
        today.ok_or_else(|| AppError::Conflict("No hay entrada registrada hoy".to_string()))?;

    if !attendance.is_on_duty() {
        return Err(AppError::Conflict("Ya registraste la salida de hoy".to_string()));
    }

    Ok(attendance.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn attendance(checked_out: bool) -> Attendance {
        let now = Utc::now();
        Attendance {
            id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            work_date: now.date_naive(),
            check_in_at: now,
            check_out_at: checked_out.then_some(now),
            check_in_latitude: Some(18.5204),
            check_in_longitude: Some(73.8567),
            check_out_latitude: None,
            check_out_longitude: None,
        }
    }

    #[test]
    fn test_first_check_in_of_the_day() {
        assert!(ensure_can_check_in(None).is_ok());
    }

    #[test]
    fn test_second_check_in_same_day_conflicts() {
        let open = attendance(false);
        let closed = attendance(true);
        assert!(matches!(ensure_can_check_in(Some(&open)), Err(AppError::Conflict(_))));
        assert!(matches!(ensure_can_check_in(Some(&closed)), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_check_out_closes_open_shift() {
        let open = attendance(false);
        assert_eq!(shift_to_close(Some(&open)).unwrap(), open.id);
    }

    #[test]
    fn test_check_out_without_check_in_conflicts() {
        assert!(matches!(shift_to_close(None), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_second_check_out_same_day_conflicts() {
        let closed = attendance(true);
        let result = shift_to_close(Some(&closed));
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("salida")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
