use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::attendance::{Attendance, OnDutyTechnician};
use crate::models::location::Coordinates;
use crate::utils::errors::AppError;

pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_day(&self, technician_id: Uuid, work_date: NaiveDate) -> Result<Option<Attendance>, AppError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE technician_id = $1 AND work_date = $2",
        )
        .bind(technician_id)
        .bind(work_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attendance)
    }

    pub async fn check_in(
        &self,
        technician_id: Uuid,
        work_date: NaiveDate,
        at: DateTime<Utc>,
        position: Option<Coordinates>,
    ) -> Result<Attendance, AppError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (id, technician_id, work_date, check_in_at, check_in_latitude, check_in_longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(technician_id)
        .bind(work_date)
        .bind(at)
        .bind(position.map(|p| p.latitude))
        .bind(position.map(|p| p.longitude))
        .fetch_one(&self.pool)
        .await?;
        Ok(attendance)
    }

    pub async fn check_out(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        position: Option<Coordinates>,
    ) -> Result<Attendance, AppError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendance
            SET check_out_at = $2, check_out_latitude = $3, check_out_longitude = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(position.map(|p| p.latitude))
        .bind(position.map(|p| p.longitude))
        .fetch_one(&self.pool)
        .await?;
        Ok(attendance)
    }

    pub async fn list_for_date(&self, work_date: NaiveDate) -> Result<Vec<Attendance>, AppError> {
        let records = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE work_date = $1 ORDER BY check_in_at ASC",
        )
        .bind(work_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Técnicos con check-in y sin check-out en la fecha, con su última
    /// ubicación conocida (o la del check-in), ordenados por hora de entrada
    pub async fn on_duty_with_locations(&self, work_date: NaiveDate) -> Result<Vec<OnDutyTechnician>, AppError> {
        let technicians = sqlx::query_as::<_, OnDutyTechnician>(
            r#"
            SELECT
                a.technician_id,
                t.full_name,
                a.check_in_at,
                COALESCE(l.latitude, a.check_in_latitude) AS latitude,
                COALESCE(l.longitude, a.check_in_longitude) AS longitude
            FROM attendance a
            JOIN technicians t ON t.id = a.technician_id
            LEFT JOIN live_locations l ON l.technician_id = a.technician_id
            WHERE a.work_date = $1 AND a.check_out_at IS NULL AND t.is_active
            ORDER BY a.check_in_at ASC, a.technician_id ASC
            "#,
        )
        .bind(work_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(technicians)
    }
}
