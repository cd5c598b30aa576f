use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use validator::{Validate, ValidationErrors};

use crate::dto::common_dto::ApiResponse;
use crate::dto::field_ops_dto::{AttendanceEventRequest, AttendanceQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::attendance::Attendance;
use crate::models::location::Coordinates;
use crate::repositories::attendance_repository::AttendanceRepository;
use crate::services::attendance_service::{ensure_can_check_in, shift_to_close};
use crate::utils::errors::AppError;
use crate::utils::validation::{validate_coordinate_pair, validate_date};

pub struct AttendanceController {
    repository: AttendanceRepository,
}

fn event_position(request: &AttendanceEventRequest) -> Result<Option<Coordinates>, AppError> {
    request.validate()?;
    let pair = validate_coordinate_pair(request.latitude, request.longitude).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("latitude", e);
        AppError::Validation(errors)
    })?;
    Ok(pair.map(|(lat, lng)| Coordinates::new(lat, lng)))
}

impl AttendanceController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AttendanceRepository::new(pool),
        }
    }

    pub async fn check_in(
        &self,
        user: AuthenticatedUser,
        request: AttendanceEventRequest,
    ) -> Result<ApiResponse<Attendance>, AppError> {
        let position = event_position(&request)?;
        let now = Utc::now();
        let work_date = now.date_naive();

        let today = self.repository.find_for_day(user.technician_id, work_date).await?;
        ensure_can_check_in(today.as_ref())?;

        let attendance = self
            .repository
            .check_in(user.technician_id, work_date, now, position)
            .await
            .map_err(|e| match e {
                AppError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    AppError::Conflict("Ya registraste la entrada de hoy".to_string())
                }
                other => other,
            })?;

        log::info!("🟢 Check-in de {} ({})", user.technician_id, work_date);
        Ok(ApiResponse::success_with_message(attendance, "Entrada registrada"))
    }

    pub async fn check_out(
        &self,
        user: AuthenticatedUser,
        request: AttendanceEventRequest,
    ) -> Result<ApiResponse<Attendance>, AppError> {
        let position = event_position(&request)?;
        let now = Utc::now();

        let today = self
            .repository
            .find_for_day(user.technician_id, now.date_naive())
            .await?;
        let attendance_id = shift_to_close(today.as_ref())?;

        let attendance = self.repository.check_out(attendance_id, now, position).await?;

        log::info!("🔴 Check-out de {}", user.technician_id);
        Ok(ApiResponse::success_with_message(attendance, "Salida registrada"))
    }

    pub async fn today(&self, user: AuthenticatedUser) -> Result<Option<Attendance>, AppError> {
        self.repository
            .find_for_day(user.technician_id, Utc::now().date_naive())
            .await
    }

    pub async fn list(&self, query: AttendanceQuery) -> Result<Vec<Attendance>, AppError> {
        let date: NaiveDate = match query.date.as_deref() {
            Some(raw) => validate_date(raw).map_err(|e| {
                let mut errors = ValidationErrors::new();
                errors.add("date", e);
                AppError::Validation(errors)
            })?,
            None => Utc::now().date_naive(),
        };
        self.repository.list_for_date(date).await
    }
}
