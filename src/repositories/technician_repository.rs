use sqlx::PgPool;
use uuid::Uuid;

use crate::models::technician::{Technician, TechnicianRole};
use crate::utils::errors::AppError;

pub struct TechnicianRepository {
    pool: PgPool,
}

impl TechnicianRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        role: TechnicianRole,
    ) -> Result<Technician, AppError> {
        let technician = sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (id, full_name, email, phone, password_hash, role, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(technician)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>, AppError> {
        let technician = sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(technician)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Technician>, AppError> {
        let technician = sqlx::query_as::<_, Technician>(
            "SELECT * FROM technicians WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(technician)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Technician>, AppError> {
        let technicians = sqlx::query_as::<_, Technician>(
            r#"
            SELECT * FROM technicians
            WHERE is_active OR $1
            ORDER BY full_name ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(technicians)
    }

    pub async fn update(&self, technician: &Technician) -> Result<Technician, AppError> {
        let updated = sqlx::query_as::<_, Technician>(
            r#"
            UPDATE technicians
            SET full_name = $2, phone = $3, password_hash = $4, role = $5, is_active = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(technician.id)
        .bind(&technician.full_name)
        .bind(&technician.phone)
        .bind(&technician.password_hash)
        .bind(technician.role)
        .bind(technician.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Eliminar al técnico devolviendo a `pending` sus issues asignados.
    /// No borra si tiene un issue en progreso.
    pub async fn delete_releasing_issues(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE issues SET status = 'pending', assigned_to = NULL, updated_at = NOW()
            WHERE assigned_to = $1 AND status = 'assigned'
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM technicians
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM issues WHERE assigned_to = $1 AND status = 'in_progress')
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// IDs de administradores y managers activos, destinatarios de avisos
    pub async fn staff_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM technicians WHERE is_active AND role IN ('admin', 'manager')",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
