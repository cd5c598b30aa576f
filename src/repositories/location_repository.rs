use sqlx::PgPool;
use uuid::Uuid;

use crate::models::location::LiveLocation;
use crate::utils::errors::AppError;

pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Una fila por técnico: la última posición reemplaza a la anterior
    pub async fn upsert(
        &self,
        technician_id: Uuid,
        latitude: f64,
        longitude: f64,
        accuracy_m: Option<f64>,
    ) -> Result<LiveLocation, AppError> {
        let location = sqlx::query_as::<_, LiveLocation>(
            r#"
            INSERT INTO live_locations (technician_id, latitude, longitude, accuracy_m, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (technician_id) DO UPDATE
            SET latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                accuracy_m = EXCLUDED.accuracy_m,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(technician_id)
        .bind(latitude)
        .bind(longitude)
        .bind(accuracy_m)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    pub async fn list(&self) -> Result<Vec<LiveLocation>, AppError> {
        let locations = sqlx::query_as::<_, LiveLocation>(
            "SELECT * FROM live_locations ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    pub async fn find(&self, technician_id: Uuid) -> Result<Option<LiveLocation>, AppError> {
        let location = sqlx::query_as::<_, LiveLocation>(
            "SELECT * FROM live_locations WHERE technician_id = $1",
        )
        .bind(technician_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(location)
    }
}
