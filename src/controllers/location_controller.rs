use validator::Validate;

use crate::dto::field_ops_dto::ReportLocationRequest;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::location::LiveLocation;
use crate::repositories::location_repository::LocationRepository;
use crate::services::change_feed::{ChangeAction, ChangeFeed, ChangeTable};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct LocationController {
    repository: LocationRepository,
    change_feed: ChangeFeed,
}

impl LocationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: LocationRepository::new(state.pool.clone()),
            change_feed: state.change_feed.clone(),
        }
    }

    pub async fn report(&self, user: AuthenticatedUser, request: ReportLocationRequest) -> Result<LiveLocation, AppError> {
        request.validate()?;

        let location = self
            .repository
            .upsert(user.technician_id, request.latitude, request.longitude, request.accuracy_m)
            .await?;

        log::debug!(
            "📍 Ubicación de {}: ({}, {})",
            user.technician_id,
            location.latitude,
            location.longitude
        );
        self.change_feed
            .publish(ChangeTable::LiveLocations, ChangeAction::Upsert, user.technician_id);
        Ok(location)
    }

    pub async fn list(&self) -> Result<Vec<LiveLocation>, AppError> {
        self.repository.list().await
    }
}
