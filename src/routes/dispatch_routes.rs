use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::dispatch_controller::DispatchController;
use crate::dto::dispatch_dto::{AutoAssignResponse, RankRequest, RouteOverlayResponse, SuggestionResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new()
        .route("/issues/:id/suggestion", get(suggestion))
        .route("/issues/:id/auto-assign", post(auto_assign))
        .route("/rank", post(rank))
        .route("/routes", get(routes))
}

async fn suggestion(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuggestionResponse>, AppError> {
    user.require_staff()?;
    let response = DispatchController::new(&state).suggestion(id).await?;
    Ok(Json(response))
}

async fn auto_assign(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<AutoAssignResponse>, AppError> {
    user.require_staff()?;
    let response = DispatchController::new(&state).auto_assign(id).await?;
    Ok(Json(response))
}

async fn rank(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RankRequest>,
) -> Result<Json<SuggestionResponse>, AppError> {
    user.require_staff()?;
    let response = DispatchController::new(&state).rank(request).await?;
    Ok(Json(response))
}

async fn routes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<RouteOverlayResponse>, AppError> {
    user.require_staff()?;
    let response = DispatchController::new(&state).routes().await?;
    Ok(Json(response))
}
