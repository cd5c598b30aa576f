use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::invoice_controller::InvoiceController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::field_ops_dto::CreateInvoiceRequest;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::invoice::{Invoice, InvoiceWithLines};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_invoice_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice))
}

async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<ApiResponse<InvoiceWithLines>>, AppError> {
    user.require_staff()?;
    let response = InvoiceController::new(&state).create(user, request).await?;
    Ok(Json(response))
}

async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    user.require_staff()?;
    let invoices = InvoiceController::new(&state).list().await?;
    Ok(Json(invoices))
}

async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceWithLines>, AppError> {
    user.require_staff()?;
    let invoice = InvoiceController::new(&state).get(id).await?;
    Ok(Json(invoice))
}

/// GET /api/issues/:id/invoices
pub async fn list_issue_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(issue_id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceWithLines>>, AppError> {
    user.require_staff()?;
    let invoices = InvoiceController::new(&state).list_for_issue(issue_id).await?;
    Ok(Json(invoices))
}
