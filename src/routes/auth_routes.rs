use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{
    CreateTechnicianRequest, LoginRequest, LoginResponse, MeResponse, UpdateTechnicianRequest,
};
use crate::dto::common_dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::technician::Technician;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas de autenticación que requieren token
pub fn create_auth_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub fn create_technician_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_technicians).post(create_technician))
        .route("/:id", put(update_technician).delete(delete_technician))
}

#[derive(Debug, Deserialize)]
struct TechnicianListQuery {
    #[serde(default)]
    include_inactive: bool,
}

fn controller(state: &AppState) -> AuthController {
    AuthController::new(state.pool.clone(), state.jwt_config(), state.change_feed.clone())
}

/// POST /api/auth/login (pública)
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let response = controller(&state).login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MeResponse>, AppError> {
    let response = controller(&state).me(user).await?;
    Ok(Json(response))
}

async fn list_technicians(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TechnicianListQuery>,
) -> Result<Json<Vec<Technician>>, AppError> {
    user.require_admin()?;
    let technicians = controller(&state).list_technicians(query.include_inactive).await?;
    Ok(Json(technicians))
}

async fn create_technician(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateTechnicianRequest>,
) -> Result<Json<ApiResponse<Technician>>, AppError> {
    user.require_admin()?;
    let response = controller(&state).create_technician(request).await?;
    Ok(Json(response))
}

async fn update_technician(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTechnicianRequest>,
) -> Result<Json<ApiResponse<Technician>>, AppError> {
    user.require_admin()?;
    let response = controller(&state).update_technician(id, request).await?;
    Ok(Json(response))
}

async fn delete_technician(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_admin()?;
    controller(&state).delete_technician(user, id).await?;
    Ok(Json(ApiResponse::message("Técnico eliminado exitosamente")))
}
