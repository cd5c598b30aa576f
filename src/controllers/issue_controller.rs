use chrono::Utc;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::common_dto::ApiResponse;
use crate::dto::issue_dto::{
    AssignIssueRequest, ChangeStatusRequest, CreateIssueRequest, IssueFilters, IssueStats, UpdateIssueRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::issue::{Issue, IssuePriority, IssueStatus};
use crate::repositories::issue_repository::{IssueRepository, NewIssue};
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::technician_repository::TechnicianRepository;
use crate::services::change_feed::{ChangeAction, ChangeFeed, ChangeTable};
use crate::services::csv_service::{export_issues, parse_issue_csv, CsvImportSummary, ImportedIssue};
use crate::services::dispatch_service::DispatchService;
use crate::services::issue_lifecycle::{check_open_duplicate, plan_status_change};
use crate::services::messaging_service::{new_issue_alert, MessagingService};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::{normalize_vehicle_no, validate_coordinate_pair, validate_vehicle_no};

/// Límite de filas exportadas en un CSV
const EXPORT_LIMIT: i64 = 10_000;

pub struct IssueController {
    issues: IssueRepository,
    technicians: TechnicianRepository,
    notifications: NotificationRepository,
    dispatch: DispatchService,
    change_feed: ChangeFeed,
    messaging: Option<MessagingService>,
}

fn field_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

fn checked_vehicle_no(raw: &str) -> Result<String, AppError> {
    let vehicle_no = normalize_vehicle_no(raw);
    validate_vehicle_no(&vehicle_no).map_err(|e| field_error("vehicle_no", e))?;
    Ok(vehicle_no)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<ImportedIssue> for NewIssue {
    fn from(row: ImportedIssue) -> Self {
        Self {
            client: row.client,
            vehicle_no: row.vehicle_no,
            device_imei: row.device_imei,
            problem: row.problem,
            priority: row.priority,
            status: row.status,
            latitude: row.latitude,
            longitude: row.longitude,
            location_text: row.location_text,
            assigned_to: None,
            photo_url: None,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

impl IssueController {
    pub fn new(state: &AppState) -> Self {
        Self {
            issues: IssueRepository::new(state.pool.clone()),
            technicians: TechnicianRepository::new(state.pool.clone()),
            notifications: NotificationRepository::new(state.pool.clone()),
            dispatch: DispatchService::new(state.pool.clone(), state.change_feed.clone()),
            change_feed: state.change_feed.clone(),
            messaging: state.messaging(),
        }
    }

    pub async fn create(&self, request: CreateIssueRequest) -> Result<ApiResponse<Issue>, AppError> {
        request.validate()?;

        let coordinates = validate_coordinate_pair(request.latitude, request.longitude)
            .map_err(|e| field_error("latitude", e))?;
        let vehicle_no = checked_vehicle_no(&request.vehicle_no)?;

        self.ensure_no_open_duplicate(&vehicle_no, None, request.force).await?;

        if let Some(technician_id) = request.assigned_to {
            let technician = self
                .technicians
                .find_by_id(technician_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Técnico no encontrado".to_string()))?;
            if !technician.is_active {
                return Err(AppError::Conflict("El técnico está desactivado".to_string()));
            }
        }

        let new_issue = NewIssue {
            client: request.client.trim().to_string(),
            vehicle_no,
            device_imei: non_blank(request.device_imei),
            problem: request.problem.trim().to_string(),
            priority: request.priority.unwrap_or(IssuePriority::Medium),
            status: if request.assigned_to.is_some() {
                IssueStatus::Assigned
            } else {
                IssueStatus::Pending
            },
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            location_text: non_blank(request.location_text),
            assigned_to: request.assigned_to,
            photo_url: non_blank(request.photo_url),
            created_at: None,
            started_at: None,
            completed_at: None,
        };

        let issue = self.issues.create(&new_issue).await?;
        log::info!("🆕 Issue {} creado para {} ({})", issue.id, issue.vehicle_no, issue.client);

        if let Some(technician_id) = issue.assigned_to {
            self.notifications
                .create(
                    Some(technician_id),
                    "Nuevo issue asignado",
                    &format!("{} · {}: {}", issue.client, issue.vehicle_no, issue.problem),
                    Some(issue.id),
                )
                .await?;
        }

        self.change_feed.publish(ChangeTable::Issues, ChangeAction::Insert, issue.id);

        if let Some(messaging) = &self.messaging {
            if let Err(e) = messaging.send_message(&new_issue_alert(&issue)).await {
                log::warn!("⚠️ No se pudo enviar la alerta del issue {}: {}", issue.id, e);
            }
        }

        Ok(ApiResponse::success_with_message(issue, "Issue creado exitosamente"))
    }

    /// Los técnicos solo ven sus propios issues
    pub async fn list(&self, user: AuthenticatedUser, filters: IssueFilters) -> Result<Vec<Issue>, AppError> {
        let restrict = (!user.is_staff()).then_some(user.technician_id);
        self.issues.list(&filters, restrict).await
    }

    pub async fn get(&self, user: AuthenticatedUser, id: Uuid) -> Result<Issue, AppError> {
        let issue = self.find(id).await?;
        if !user.is_staff() && issue.assigned_to != Some(user.technician_id) {
            return Err(AppError::Forbidden("No tienes permiso para ver este issue".to_string()));
        }
        Ok(issue)
    }

    pub async fn update(&self, id: Uuid, request: UpdateIssueRequest) -> Result<ApiResponse<Issue>, AppError> {
        request.validate()?;

        let mut issue = self.find(id).await?;

        if let Some(client) = request.client {
            issue.client = client.trim().to_string();
        }
        if let Some(vehicle_no) = request.vehicle_no {
            let vehicle_no = checked_vehicle_no(&vehicle_no)?;
            if vehicle_no != issue.vehicle_no && issue.status.is_open() {
                self.ensure_no_open_duplicate(&vehicle_no, Some(issue.id), request.force)
                    .await?;
            }
            issue.vehicle_no = vehicle_no;
        }
        if request.device_imei.is_some() {
            issue.device_imei = non_blank(request.device_imei);
        }
        if let Some(problem) = request.problem {
            issue.problem = problem.trim().to_string();
        }
        if let Some(priority) = request.priority {
            issue.priority = priority;
        }
        if request.latitude.is_some() || request.longitude.is_some() {
            let coordinates = validate_coordinate_pair(request.latitude, request.longitude)
                .map_err(|e| field_error("latitude", e))?;
            issue.latitude = coordinates.map(|(lat, _)| lat);
            issue.longitude = coordinates.map(|(_, lng)| lng);
        }
        if request.location_text.is_some() {
            issue.location_text = non_blank(request.location_text);
        }
        if request.resolution_notes.is_some() {
            issue.resolution_notes = non_blank(request.resolution_notes);
        }
        if request.photo_url.is_some() {
            issue.photo_url = non_blank(request.photo_url);
        }
        if request.signature_url.is_some() {
            issue.signature_url = non_blank(request.signature_url);
        }

        let updated = self.issues.update_fields(&issue).await?;
        self.change_feed.publish(ChangeTable::Issues, ChangeAction::Update, updated.id);

        Ok(ApiResponse::success_with_message(updated, "Issue actualizado exitosamente"))
    }

    pub async fn assign(&self, id: Uuid, request: AssignIssueRequest) -> Result<ApiResponse<Issue>, AppError> {
        let issue = self.dispatch.assign(id, request.technician_id).await?;
        let message = match request.technician_id {
            Some(_) => "Técnico asignado",
            None => "Asignación eliminada",
        };
        Ok(ApiResponse::success_with_message(issue, message))
    }

    /// El asignado o un admin/manager pueden mover el estado
    pub async fn change_status(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<ApiResponse<Issue>, AppError> {
        request.validate()?;

        let issue = self.find(id).await?;
        if !user.is_staff() && issue.assigned_to != Some(user.technician_id) {
            return Err(AppError::Forbidden(
                "Solo el técnico asignado puede cambiar el estado".to_string(),
            ));
        }

        let change = plan_status_change(&issue, request.status, Utc::now())?;
        let notes = request.resolution_notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let updated = self.issues.apply_status_change(id, &change, notes).await?;

        log::info!(
            "🔄 Issue {}: {} → {}",
            id,
            issue.status.as_str(),
            updated.status.as_str()
        );

        if updated.status == IssueStatus::Completed {
            self.notifications
                .create(
                    None,
                    "Issue completado",
                    &format!("{} · {} resuelto", updated.client, updated.vehicle_no),
                    Some(updated.id),
                )
                .await?;
        }

        self.change_feed.publish(ChangeTable::Issues, ChangeAction::Update, updated.id);
        Ok(ApiResponse::success(updated))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.issues.delete(id).await? {
            return Err(AppError::NotFound("Issue no encontrado".to_string()));
        }
        log::info!("🗑️ Issue {} eliminado", id);
        self.change_feed.publish(ChangeTable::Issues, ChangeAction::Delete, id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<IssueStats, AppError> {
        self.issues.stats().await
    }

    /// CSV con los issues filtrados, paginando hasta `EXPORT_LIMIT` filas
    pub async fn export_csv(&self, filters: IssueFilters) -> Result<String, AppError> {
        let mut page = IssueFilters {
            limit: Some(IssueFilters::MAX_LIMIT),
            offset: Some(0),
            ..filters
        };

        let mut issues = Vec::new();
        loop {
            let batch = self.issues.list(&page, None).await?;
            let fetched = batch.len() as i64;
            issues.extend(batch);
            if fetched < IssueFilters::MAX_LIMIT || issues.len() as i64 >= EXPORT_LIMIT {
                break;
            }
            page.offset = Some(page.offset() + fetched);
        }
        issues.truncate(EXPORT_LIMIT as usize);

        log::info!("📤 Exportando {} issues a CSV", issues.len());
        Ok(export_issues(&issues))
    }

    /// Las filas abiertas de un vehículo con issue abierto se reportan como omitidas
    pub async fn import_csv(&self, text: &str) -> Result<CsvImportSummary, AppError> {
        let mut parsed = parse_issue_csv(text)?;
        let already_open = self
            .issues
            .vehicles_with_open_issues(&parsed.open_vehicle_numbers())
            .await?;
        parsed.reject_open_duplicates(&already_open);

        let rows: Vec<NewIssue> = parsed.rows.into_iter().map(|(_, row)| NewIssue::from(row)).collect();
        let created = self.issues.create_many(&rows).await?;

        for issue in &created {
            self.change_feed.publish(ChangeTable::Issues, ChangeAction::Insert, issue.id);
        }

        log::info!(
            "📥 Importación CSV: {} issues creados, {} filas omitidas",
            created.len(),
            parsed.errors.len()
        );

        Ok(CsvImportSummary {
            imported: created.len(),
            skipped: parsed.errors,
        })
    }

    /// Un vehículo con un issue abierto bloquea el alta o el cambio salvo `force`
    async fn ensure_no_open_duplicate(&self, vehicle_no: &str, exclude: Option<Uuid>, force: bool) -> Result<(), AppError> {
        let open = self.issues.find_open_by_vehicle(vehicle_no).await?;
        if let Some(existing) = check_open_duplicate(vehicle_no, &open, exclude, force)? {
            log::warn!(
                "⚠️ Issue duplicado forzado para vehículo {} (abierto: {})",
                vehicle_no,
                existing.id
            );
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Issue, AppError> {
        self.issues
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Issue no encontrado".to_string()))
    }
}
