use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::issue::Issue;
use crate::services::dispatch_service::RankedTechnician;
use crate::services::route_overlay::RouteOverlay;

// Ranking ad-hoc: coordenada del issue + candidatos con ubicación opcional
#[derive(Debug, Deserialize, Validate)]
pub struct RankRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    pub candidates: Vec<CandidateInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateInput {
    pub technician_id: Uuid,
    #[serde(default)]
    pub full_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Resultado del ranking: sin candidatos no es un error
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SuggestionResponse {
    NoCandidates,
    Ranked {
        suggestion: RankedTechnician,
        ranking: Vec<RankedTechnician>,
    },
}

impl SuggestionResponse {
    pub fn from_ranking(ranking: Vec<RankedTechnician>) -> Self {
        match ranking.first().cloned() {
            Some(suggestion) => SuggestionResponse::Ranked { suggestion, ranking },
            None => SuggestionResponse::NoCandidates,
        }
    }
}

/// Resultado de la auto-asignación
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutoAssignResponse {
    NoCandidates,
    Assigned {
        issue: Issue,
        technician: RankedTechnician,
    },
}

#[derive(Debug, Serialize)]
pub struct RouteOverlayResponse {
    pub routes: Vec<RouteOverlay>,
    pub road_routes: usize,
    pub fallbacks: usize,
}

impl From<Vec<RouteOverlay>> for RouteOverlayResponse {
    fn from(routes: Vec<RouteOverlay>) -> Self {
        let road_routes = routes.iter().filter(|r| r.path.is_road()).count();
        let fallbacks = routes.len() - road_routes;
        Self {
            routes,
            road_routes,
            fallbacks,
        }
    }
}

// Alertas al canal de mensajería
#[derive(Debug, Deserialize, Validate)]
pub struct SendAlertRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,

    #[validate(length(max = 1000))]
    pub caption: Option<String>,
}

// Firma capturada en el navegador como data URL
#[derive(Debug, Deserialize)]
pub struct SignatureUploadRequest {
    pub data_url: String,
    pub issue_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}
