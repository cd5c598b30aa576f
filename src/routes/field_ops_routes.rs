//! Rutas de operación de campo: asistencia, ubicación en vivo,
//! inventario y notificaciones

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::attendance_controller::AttendanceController;
use crate::controllers::inventory_controller::InventoryController;
use crate::controllers::location_controller::LocationController;
use crate::controllers::notification_controller::NotificationController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::field_ops_dto::{
    AdjustStockRequest, AttendanceEventRequest, AttendanceQuery, CreateInventoryItemRequest, ReportLocationRequest,
    UpdateInventoryItemRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::attendance::Attendance;
use crate::models::inventory::InventoryItem;
use crate::models::location::LiveLocation;
use crate::models::notification::Notification;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance))
        .route("/check-in", post(check_in))
        .route("/check-out", post(check_out))
        .route("/today", get(today))
}

pub fn create_location_router() -> Router<AppState> {
    Router::new().route("/", get(list_locations).post(report_location))
}

pub fn create_inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_stock))
}

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

// ---------- Asistencia ----------

async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    request: Option<Json<AttendanceEventRequest>>,
) -> Result<Json<ApiResponse<Attendance>>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let response = AttendanceController::new(state.pool.clone()).check_in(user, request).await?;
    Ok(Json(response))
}

async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    request: Option<Json<AttendanceEventRequest>>,
) -> Result<Json<ApiResponse<Attendance>>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let response = AttendanceController::new(state.pool.clone()).check_out(user, request).await?;
    Ok(Json(response))
}

async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Option<Attendance>>, AppError> {
    let attendance = AttendanceController::new(state.pool.clone()).today(user).await?;
    Ok(Json(attendance))
}

async fn list_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    user.require_staff()?;
    let records = AttendanceController::new(state.pool.clone()).list(query).await?;
    Ok(Json(records))
}

// ---------- Ubicación en vivo ----------

async fn report_location(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ReportLocationRequest>,
) -> Result<Json<LiveLocation>, AppError> {
    let location = LocationController::new(&state).report(user, request).await?;
    Ok(Json(location))
}

async fn list_locations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<LiveLocation>>, AppError> {
    user.require_staff()?;
    let locations = LocationController::new(&state).list().await?;
    Ok(Json(locations))
}

// ---------- Inventario ----------

async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateInventoryItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    user.require_staff()?;
    let response = InventoryController::new(state.pool.clone()).create(request).await?;
    Ok(Json(response))
}

async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    user.require_staff()?;
    let items = InventoryController::new(state.pool.clone()).list().await?;
    Ok(Json(items))
}

async fn low_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    user.require_staff()?;
    let items = InventoryController::new(state.pool.clone()).low_stock().await?;
    Ok(Json(items))
}

async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, AppError> {
    user.require_staff()?;
    let item = InventoryController::new(state.pool.clone()).get(id).await?;
    Ok(Json(item))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInventoryItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    user.require_staff()?;
    let response = InventoryController::new(state.pool.clone()).update(id, request).await?;
    Ok(Json(response))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    user.require_staff()?;
    let response = InventoryController::new(state.pool.clone()).adjust(id, request).await?;
    Ok(Json(response))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_staff()?;
    InventoryController::new(state.pool.clone()).delete(id).await?;
    Ok(Json(ApiResponse::message("Artículo eliminado exitosamente")))
}

// ---------- Notificaciones ----------

#[derive(Debug, Deserialize)]
struct NotificationQuery {
    #[serde(default)]
    unread: bool,
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = NotificationController::new(state.pool.clone())
        .list(user, query.unread)
        .await?;
    Ok(Json(notifications))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationController::new(state.pool.clone()).mark_read(user, id).await?;
    Ok(Json(notification))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    let updated = NotificationController::new(state.pool.clone()).mark_all_read(user).await?;
    Ok(Json(ApiResponse::success(updated)))
}
