use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::issue_controller::IssueController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::issue_dto::{
    AssignIssueRequest, ChangeStatusRequest, CreateIssueRequest, IssueFilters, IssueStats, UpdateIssueRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::issue::Issue;
use crate::routes::invoice_routes::list_issue_invoices;
use crate::services::csv_service::CsvImportSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_issue_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_issues).post(create_issue))
        .route("/stats", get(issue_stats))
        .route("/export", get(export_issues))
        .route("/import", post(import_issues))
        .route("/:id", get(get_issue).put(update_issue).delete(delete_issue))
        .route("/:id/assign", post(assign_issue))
        .route("/:id/status", post(change_status))
        .route("/:id/invoices", get(list_issue_invoices))
}

async fn create_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateIssueRequest>,
) -> Result<Json<ApiResponse<Issue>>, AppError> {
    user.require_staff()?;
    let response = IssueController::new(&state).create(request).await?;
    Ok(Json(response))
}

async fn list_issues(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<IssueFilters>,
) -> Result<Json<Vec<Issue>>, AppError> {
    let issues = IssueController::new(&state).list(user, filters).await?;
    Ok(Json(issues))
}

async fn get_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, AppError> {
    let issue = IssueController::new(&state).get(user, id).await?;
    Ok(Json(issue))
}

async fn update_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIssueRequest>,
) -> Result<Json<ApiResponse<Issue>>, AppError> {
    user.require_staff()?;
    let response = IssueController::new(&state).update(id, request).await?;
    Ok(Json(response))
}

async fn delete_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_admin()?;
    IssueController::new(&state).delete(id).await?;
    Ok(Json(ApiResponse::message("Issue eliminado exitosamente")))
}

async fn assign_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignIssueRequest>,
) -> Result<Json<ApiResponse<Issue>>, AppError> {
    user.require_staff()?;
    let response = IssueController::new(&state).assign(id, request).await?;
    Ok(Json(response))
}

async fn change_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<Issue>>, AppError> {
    let response = IssueController::new(&state).change_status(user, id, request).await?;
    Ok(Json(response))
}

async fn issue_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<IssueStats>, AppError> {
    user.require_staff()?;
    let stats = IssueController::new(&state).stats().await?;
    Ok(Json(stats))
}

async fn export_issues(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<IssueFilters>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let csv = IssueController::new(&state).export_csv(filters).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"issues.csv\""),
        ],
        csv,
    ))
}

/// Body: el CSV en texto plano
async fn import_issues(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: String,
) -> Result<Json<ApiResponse<CsvImportSummary>>, AppError> {
    user.require_staff()?;
    let summary = IssueController::new(&state).import_csv(&body).await?;
    let message = format!("{} issues importados", summary.imported);
    Ok(Json(ApiResponse::success_with_message(summary, message)))
}
