use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::issue_dto::{IssueFilters, IssueStats};
use crate::models::issue::{Issue, IssuePriority, IssueStatus};
use crate::services::issue_lifecycle::StatusChange;
use crate::utils::errors::AppError;

/// Datos para insertar un issue ya validado y normalizado
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub client: String,
    pub vehicle_no: String,
    pub device_imei: Option<String>,
    pub problem: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct IssueRepository {
    pool: PgPool,
}

const INSERT_ISSUE: &str = r#"
    INSERT INTO issues (
        id, client, vehicle_no, device_imei, problem, priority, status,
        latitude, longitude, location_text, assigned_to, photo_url, created_at,
        started_at, completed_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, COALESCE($13, NOW()), $14, $15, NOW())
    RETURNING *
"#;

impl IssueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn insert_query(issue: &NewIssue) -> sqlx::query::QueryAs<'_, Postgres, Issue, sqlx::postgres::PgArguments> {
        sqlx::query_as::<_, Issue>(INSERT_ISSUE)
            .bind(Uuid::new_v4())
            .bind(&issue.client)
            .bind(&issue.vehicle_no)
            .bind(&issue.device_imei)
            .bind(&issue.problem)
            .bind(issue.priority)
            .bind(issue.status)
            .bind(issue.latitude)
            .bind(issue.longitude)
            .bind(&issue.location_text)
            .bind(issue.assigned_to)
            .bind(&issue.photo_url)
            .bind(issue.created_at)
            .bind(issue.started_at)
            .bind(issue.completed_at)
    }

    pub async fn create(&self, issue: &NewIssue) -> Result<Issue, AppError> {
        let created = Self::insert_query(issue).fetch_one(&self.pool).await?;
        Ok(created)
    }

    /// Insertar varios issues en una sola transacción
    pub async fn create_many(&self, issues: &[NewIssue]) -> Result<Vec<Issue>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(issues.len());
        for issue in issues {
            created.push(Self::insert_query(issue).fetch_one(&mut *tx).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, AppError> {
        let issue = sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(issue)
    }

    /// Issues abiertos (pending/assigned/in_progress) de un vehículo
    pub async fn find_open_by_vehicle(&self, vehicle_no: &str) -> Result<Vec<Issue>, AppError> {
        let issues = sqlx::query_as::<_, Issue>(
            r#"
            SELECT * FROM issues
            WHERE vehicle_no = $1 AND status IN ('pending', 'assigned', 'in_progress')
            ORDER BY created_at DESC
            "#,
        )
        .bind(vehicle_no)
        .fetch_all(&self.pool)
        .await?;
        Ok(issues)
    }

    /// De los vehículos indicados, los que ya tienen algún issue abierto
    pub async fn vehicles_with_open_issues(&self, vehicle_nos: &[String]) -> Result<HashSet<String>, AppError> {
        if vehicle_nos.is_empty() {
            return Ok(HashSet::new());
        }

        let vehicles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT vehicle_no FROM issues
            WHERE vehicle_no = ANY($1) AND status IN ('pending', 'assigned', 'in_progress')
            "#,
        )
        .bind(vehicle_nos)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles.into_iter().collect())
    }

    /// Issues abiertos asignados a un técnico
    pub async fn list_open_for_technician(&self, technician_id: Uuid) -> Result<Vec<Issue>, AppError> {
        let issues = sqlx::query_as::<_, Issue>(
            r#"
            SELECT * FROM issues
            WHERE assigned_to = $1 AND status IN ('pending', 'assigned', 'in_progress')
            "#,
        )
        .bind(technician_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(issues)
    }

    /// Listado con filtros; `only_assigned_to` restringe a los issues de un técnico
    pub async fn list(&self, filters: &IssueFilters, only_assigned_to: Option<Uuid>) -> Result<Vec<Issue>, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM issues WHERE TRUE");

        if let Some(status) = filters.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filters.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(assigned_to) = only_assigned_to.or(filters.assigned_to) {
            query.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(vehicle_no) = filters.vehicle_no.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            query
                .push(" AND vehicle_no ILIKE ")
                .push_bind(format!("%{}%", vehicle_no));
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.limit())
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let issues = query.build_query_as::<Issue>().fetch_all(&self.pool).await?;
        Ok(issues)
    }

    /// Issues abiertos con coordenadas, para el overlay de rutas
    pub async fn list_open_with_coordinates(&self) -> Result<Vec<Issue>, AppError> {
        let issues = sqlx::query_as::<_, Issue>(
            r#"
            SELECT * FROM issues
            WHERE status IN ('pending', 'assigned', 'in_progress') AND latitude IS NOT NULL AND longitude IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(issues)
    }

    /// Reescribir los campos editables de un issue
    pub async fn update_fields(&self, issue: &Issue) -> Result<Issue, AppError> {
        let updated = sqlx::query_as::<_, Issue>(
            r#"
            UPDATE issues
            SET client = $2, vehicle_no = $3, device_imei = $4, problem = $5, priority = $6,
                latitude = $7, longitude = $8, location_text = $9, resolution_notes = $10,
                photo_url = $11, signature_url = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(issue.id)
        .bind(&issue.client)
        .bind(&issue.vehicle_no)
        .bind(&issue.device_imei)
        .bind(&issue.problem)
        .bind(issue.priority)
        .bind(issue.latitude)
        .bind(issue.longitude)
        .bind(&issue.location_text)
        .bind(&issue.resolution_notes)
        .bind(&issue.photo_url)
        .bind(&issue.signature_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn set_assignment(
        &self,
        id: Uuid,
        assigned_to: Option<Uuid>,
        status: IssueStatus,
    ) -> Result<Issue, AppError> {
        let updated = sqlx::query_as::<_, Issue>(
            r#"
            UPDATE issues
            SET assigned_to = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(assigned_to)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn apply_status_change(
        &self,
        id: Uuid,
        change: &StatusChange,
        resolution_notes: Option<&str>,
    ) -> Result<Issue, AppError> {
        let updated = sqlx::query_as::<_, Issue>(
            r#"
            UPDATE issues
            SET status = $2, assigned_to = $3, started_at = $4, completed_at = $5,
                resolution_notes = COALESCE($6, resolution_notes), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.status)
        .bind(change.assigned_to)
        .bind(change.started_at)
        .bind(change.completed_at)
        .bind(resolution_notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn set_signature_url(&self, id: Uuid, url: &str) -> Result<Issue, AppError> {
        let updated = sqlx::query_as::<_, Issue>(
            "UPDATE issues SET signature_url = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&self) -> Result<IssueStats, AppError> {
        let by_status: Vec<(IssueStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM issues GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let by_priority: Vec<(IssuePriority, i64)> =
            sqlx::query_as("SELECT priority, COUNT(*) FROM issues GROUP BY priority")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = IssueStats::default();
        for status in IssueStatus::ALL {
            stats.by_status.insert(status.as_str().to_string(), 0);
        }
        for priority in IssuePriority::ALL {
            stats.by_priority.insert(priority.as_str().to_string(), 0);
        }
        for (status, count) in by_status {
            stats.total += count;
            stats.by_status.insert(status.as_str().to_string(), count);
        }
        for (priority, count) in by_priority {
            stats.by_priority.insert(priority.as_str().to_string(), count);
        }
        Ok(stats)
    }
}
