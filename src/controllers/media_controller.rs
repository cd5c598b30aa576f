use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::dispatch_dto::{SendAlertRequest, SignatureUploadRequest, UploadResponse};
use crate::repositories::issue_repository::IssueRepository;
use crate::services::change_feed::{ChangeAction, ChangeFeed, ChangeTable};
use crate::services::messaging_service::{MessagingResponse, MessagingService};
use crate::services::storage_service::{decode_data_url, ImagePayload, StorageService};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Subidas al almacenamiento externo y alertas al canal de mensajería
pub struct MediaController {
    storage: Option<StorageService>,
    messaging: Option<MessagingService>,
    issues: IssueRepository,
    change_feed: ChangeFeed,
    max_upload_bytes: usize,
}

impl MediaController {
    pub fn new(state: &AppState) -> Self {
        Self {
            storage: state.storage(),
            messaging: state.messaging(),
            issues: IssueRepository::new(state.pool.clone()),
            change_feed: state.change_feed.clone(),
            max_upload_bytes: state.config.max_upload_bytes,
        }
    }

    fn storage(&self) -> Result<&StorageService, AppError> {
        self.storage
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Almacenamiento no configurado (STORAGE_UPLOAD_URL)".to_string()))
    }

    fn messaging(&self) -> Result<&MessagingService, AppError> {
        self.messaging
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Mensajería no configurada (MESSAGING_URL)".to_string()))
    }

    pub async fn upload_image(&self, image: ImagePayload) -> Result<UploadResponse, AppError> {
        let storage = self.storage()?;
        image.validate(self.max_upload_bytes)?;

        let url = storage
            .upload_image(image)
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;
        Ok(UploadResponse { url })
    }

    /// Subir la firma capturada y, si se indica, adjuntarla al issue
    pub async fn upload_signature(&self, request: SignatureUploadRequest) -> Result<UploadResponse, AppError> {
        let storage = self.storage()?;

        let stem = format!(
            "signature-{}",
            request.issue_id.unwrap_or_else(Uuid::new_v4)
        );
        let image = decode_data_url(&request.data_url, &stem)?;
        image.validate(self.max_upload_bytes)?;

        if let Some(issue_id) = request.issue_id {
            if self.issues.find_by_id(issue_id).await?.is_none() {
                return Err(AppError::NotFound("Issue no encontrado".to_string()));
            }
        }

        let url = storage
            .upload_image(image)
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;

        if let Some(issue_id) = request.issue_id {
            self.issues.set_signature_url(issue_id, &url).await?;
            self.change_feed.publish(ChangeTable::Issues, ChangeAction::Update, issue_id);
            log::info!("✍️ Firma adjuntada al issue {}", issue_id);
        }

        Ok(UploadResponse { url })
    }

    /// Alerta manual: texto o foto con pie
    pub async fn send_alert(&self, request: SendAlertRequest) -> Result<ApiResponse<MessagingResponse>, AppError> {
        request.validate()?;
        let messaging = self.messaging()?;

        let result = match (request.photo_url.as_deref(), request.message.as_deref()) {
            (Some(photo_url), message) => {
                let caption = request.caption.as_deref().or(message).unwrap_or_default();
                messaging.send_photo(photo_url, caption).await
            }
            (None, Some(message)) => messaging.send_message(message).await,
            (None, None) => {
                return Err(AppError::BadRequest(
                    "Se requiere 'message' o 'photo_url'".to_string(),
                ))
            }
        };

        let response = result.map_err(|e| {
            log::warn!("⚠️ Fallo enviando alerta: {}", e);
            AppError::ExternalApi(e.to_string())
        })?;

        Ok(ApiResponse::success_with_message(response, "Alerta enviada"))
    }
}
