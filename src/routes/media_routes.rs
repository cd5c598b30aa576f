use axum::{
    extract::{Multipart, State},
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::media_controller::MediaController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::dispatch_dto::{SendAlertRequest, SignatureUploadRequest, UploadResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::messaging_service::MessagingResponse;
use crate::services::storage_service::ImagePayload;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_upload_router() -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image))
        .route("/signature", post(upload_signature))
}

pub fn create_alert_router() -> Router<AppState> {
    Router::new().route("/", post(send_alert))
}

/// Multipart con un campo `file`
async fn upload_image(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart inválido: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("photo-{}", Uuid::new_v4()));
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Error leyendo archivo: {}", e)))?;

        image = Some(ImagePayload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let image = image.ok_or_else(|| AppError::BadRequest("Falta el campo 'file'".to_string()))?;
    let response = MediaController::new(&state).upload_image(image).await?;
    Ok(Json(response))
}

async fn upload_signature(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Json(request): Json<SignatureUploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let response = MediaController::new(&state).upload_signature(request).await?;
    Ok(Json(response))
}

async fn send_alert(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<SendAlertRequest>,
) -> Result<Json<ApiResponse<MessagingResponse>>, AppError> {
    user.require_staff()?;
    let response = MediaController::new(&state).send_alert(request).await?;
    Ok(Json(response))
}
