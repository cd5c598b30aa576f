use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::dto::dispatch_dto::{AutoAssignResponse, RankRequest, RouteOverlayResponse, SuggestionResponse};
use crate::models::location::Coordinates;
use crate::repositories::attendance_repository::AttendanceRepository;
use crate::repositories::issue_repository::IssueRepository;
use crate::services::dispatch_service::{rank_candidates, Candidate, DispatchService};
use crate::services::route_overlay::{build_overlays, plan_route_requests};
use crate::services::routing_service::RoutingProvider;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct DispatchController {
    service: DispatchService,
    issues: IssueRepository,
    attendance: AttendanceRepository,
    routing: Arc<dyn RoutingProvider>,
    config: EnvironmentConfig,
}

/// Día de trabajo vigente para la asistencia
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl DispatchController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: DispatchService::new(state.pool.clone(), state.change_feed.clone()),
            issues: IssueRepository::new(state.pool.clone()),
            attendance: AttendanceRepository::new(state.pool.clone()),
            routing: state.routing.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn suggestion(&self, issue_id: Uuid) -> Result<SuggestionResponse, AppError> {
        self.service.suggest_for_issue(issue_id, today()).await
    }

    pub async fn auto_assign(&self, issue_id: Uuid) -> Result<AutoAssignResponse, AppError> {
        match self.service.auto_assign(issue_id, today()).await? {
            Some((issue, technician)) => Ok(AutoAssignResponse::Assigned { issue, technician }),
            None => {
                log::info!("🤷 Sin técnicos en turno con ubicación para el issue {}", issue_id);
                Ok(AutoAssignResponse::NoCandidates)
            }
        }
    }

    /// Ranking ad-hoc sobre una coordenada; sin candidatos en el body se
    /// usan los técnicos en turno
    pub async fn rank(&self, request: RankRequest) -> Result<SuggestionResponse, AppError> {
        request.validate()?;

        let target = Coordinates::new(request.latitude, request.longitude);
        let candidates: Vec<Candidate> = if request.candidates.is_empty() {
            self.service.on_duty_candidates(today()).await?
        } else {
            request
                .candidates
                .into_iter()
                .map(|c| Candidate {
                    technician_id: c.technician_id,
                    full_name: c.full_name,
                    location: Coordinates::from_parts(c.latitude, c.longitude),
                })
                .collect()
        };

        Ok(SuggestionResponse::from_ranking(rank_candidates(target, candidates)))
    }

    /// Rutas de cada técnico en turno hacia sus issues
    pub async fn routes(&self) -> Result<RouteOverlayResponse, AppError> {
        let technicians = self.attendance.on_duty_with_locations(today()).await?;
        let open_issues = self.issues.list_open_with_coordinates().await?;

        let requests = plan_route_requests(&technicians, &open_issues, self.config.route_fallback_nearest);
        log::info!(
            "🗺️ Calculando {} rutas para {} técnicos en turno",
            requests.len(),
            technicians.len()
        );

        let overlays = build_overlays(self.routing.as_ref(), requests).await;
        let response = RouteOverlayResponse::from(overlays);

        log::info!(
            "✅ Overlay listo: {} por carretera, {} en línea recta",
            response.road_routes,
            response.fallbacks
        );
        Ok(response)
    }
}
