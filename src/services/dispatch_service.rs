//! Ranking del técnico más cercano
//!
//! Ordena a los técnicos en turno por distancia haversine a la coordenada
//! de un issue. Un técnico sin ubicación registrada queda fuera del ranking;
//! los empates conservan el orden de check-in (ordenamiento estable).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::dispatch_dto::SuggestionResponse;
use crate::models::attendance::OnDutyTechnician;
use crate::models::issue::Issue;
use crate::models::location::Coordinates;
use crate::repositories::attendance_repository::AttendanceRepository;
use crate::repositories::issue_repository::IssueRepository;
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::technician_repository::TechnicianRepository;
use crate::services::change_feed::{ChangeAction, ChangeFeed, ChangeTable};
use crate::services::geo::haversine_km;
use crate::services::issue_lifecycle::status_after_assignment;
use crate::utils::errors::AppError;

/// Candidato a despacho: ubicación explícitamente opcional
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub technician_id: Uuid,
    pub full_name: String,
    pub location: Option<Coordinates>,
}

impl From<OnDutyTechnician> for Candidate {
    fn from(on_duty: OnDutyTechnician) -> Self {
        Self {
            location: on_duty.coordinates(),
            technician_id: on_duty.technician_id,
            full_name: on_duty.full_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTechnician {
    pub technician_id: Uuid,
    pub full_name: String,
    pub location: Coordinates,
    pub distance_km: f64,
}

/// Ranking ascendente por distancia. Vacío si no hay candidatos con ubicación.
pub fn rank_candidates<I>(issue: Coordinates, candidates: I) -> Vec<RankedTechnician>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut ranked: Vec<RankedTechnician> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let location = candidate.location?;
            Some(RankedTechnician {
                distance_km: haversine_km(issue, location),
                technician_id: candidate.technician_id,
                full_name: candidate.full_name,
                location,
            })
        })
        .collect();

    // sort_by es estable: empates mantienen el orden de entrada
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    log::debug!("📏 {} técnicos rankeados para ({}, {})", ranked.len(), issue.latitude, issue.longitude);
    ranked
}

/// El candidato más cercano, si existe
pub fn nearest<I>(issue: Coordinates, candidates: I) -> Option<RankedTechnician>
where
    I: IntoIterator<Item = Candidate>,
{
    rank_candidates(issue, candidates).into_iter().next()
}

/// Despacho sobre la base de datos: candidatos en turno, sugerencia y asignación
pub struct DispatchService {
    issues: IssueRepository,
    attendance: AttendanceRepository,
    technicians: TechnicianRepository,
    notifications: NotificationRepository,
    change_feed: ChangeFeed,
}

impl DispatchService {
    pub fn new(pool: PgPool, change_feed: ChangeFeed) -> Self {
        Self {
            issues: IssueRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            technicians: TechnicianRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
            change_feed,
        }
    }

    /// Técnicos en turno en la fecha, en orden de check-in
    pub async fn on_duty_candidates(&self, date: NaiveDate) -> Result<Vec<Candidate>, AppError> {
        let on_duty = self.attendance.on_duty_with_locations(date).await?;
        Ok(on_duty.into_iter().map(Candidate::from).collect())
    }

    pub async fn suggest_for_issue(&self, issue_id: Uuid, date: NaiveDate) -> Result<SuggestionResponse, AppError> {
        let issue = self.find_issue(issue_id).await?;
        let target = issue.coordinates().ok_or_else(|| {
            AppError::BadRequest("El issue no tiene coordenadas para calcular distancias".to_string())
        })?;

        let candidates = self.on_duty_candidates(date).await?;
        let ranking = rank_candidates(target, candidates);

        log::info!("🧭 Sugerencia para issue {}: {} candidatos", issue_id, ranking.len());
        Ok(SuggestionResponse::from_ranking(ranking))
    }

    /// Asignar la sugerencia; `None` si no hay nadie en turno con ubicación
    pub async fn auto_assign(&self, issue_id: Uuid, date: NaiveDate) -> Result<Option<(Issue, RankedTechnician)>, AppError> {
        let suggestion = match self.suggest_for_issue(issue_id, date).await? {
            SuggestionResponse::Ranked { suggestion, .. } => suggestion,
            SuggestionResponse::NoCandidates => return Ok(None),
        };

        let issue = self.assign(issue_id, Some(suggestion.technician_id)).await?;
        log::info!(
            "✅ Issue {} auto-asignado a {} ({:.1} km)",
            issue_id,
            suggestion.full_name,
            suggestion.distance_km
        );
        Ok(Some((issue, suggestion)))
    }

    /// (Des)asignar un técnico, avanzando el estado y notificando al asignado
    pub async fn assign(&self, issue_id: Uuid, technician_id: Option<Uuid>) -> Result<Issue, AppError> {
        let issue = self.find_issue(issue_id).await?;

        if let Some(technician_id) = technician_id {
            let technician = self
                .technicians
                .find_by_id(technician_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Técnico no encontrado".to_string()))?;
            if !technician.is_active {
                return Err(AppError::Conflict("El técnico está desactivado".to_string()));
            }
        }

        let status = status_after_assignment(issue.status, technician_id)?;
        let updated = self.issues.set_assignment(issue_id, technician_id, status).await?;

        if let Some(technician_id) = technician_id {
            if issue.assigned_to != Some(technician_id) {
                self.notifications
                    .create(
                        Some(technician_id),
                        "Nuevo issue asignado",
                        &format!("{} · {}: {}", updated.client, updated.vehicle_no, updated.problem),
                        Some(updated.id),
                    )
                    .await?;
            }
        }

        self.change_feed.publish(ChangeTable::Issues, ChangeAction::Update, updated.id);
        Ok(updated)
    }

    async fn find_issue(&self, issue_id: Uuid) -> Result<Issue, AppError> {
        self.issues
            .find_by_id(issue_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Issue no encontrado".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNE_ISSUE: Coordinates = Coordinates { latitude: 18.5204, longitude: 73.8567 };

    fn candidate(name: &str, location: Option<(f64, f64)>) -> Candidate {
        Candidate {
            technician_id: Uuid::new_v4(),
            full_name: name.to_string(),
            location: location.map(|(lat, lon)| Coordinates::new(lat, lon)),
        }
    }

    #[test]
    fn test_pune_technician_ranks_before_mumbai() {
        let mumbai = candidate("Mumbai", Some((19.0760, 72.8777)));
        let pune = candidate("Pune", Some((18.5210, 73.8570)));

        let ranked = rank_candidates(PUNE_ISSUE, vec![mumbai, pune]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].full_name, "Pune");
        assert!(ranked[0].distance_km < 1.0);
        assert_eq!(ranked[1].full_name, "Mumbai");
        assert!(ranked[1].distance_km > 100.0);
    }

    #[test]
    fn test_ranking_is_non_decreasing() {
        let candidates = vec![
            candidate("a", Some((19.9975, 73.7898))),
            candidate("b", Some((18.5310, 73.8446))),
            candidate("c", Some((17.6805, 74.0183))),
            candidate("d", Some((18.5204, 73.8567))),
            candidate("e", Some((21.1458, 79.0882))),
        ];
        let ranked = rank_candidates(PUNE_ISSUE, candidates);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert_eq!(ranked[0].full_name, "d");
        assert_eq!(ranked[0].distance_km, 0.0);
    }

    #[test]
    fn test_technician_without_location_is_excluded() {
        let missing = candidate("no-gps", None);
        let missing_id = missing.technician_id;
        let ranked = rank_candidates(
            PUNE_ISSUE,
            vec![missing, candidate("far", Some((28.6139, 77.2090)))],
        );
        assert_eq!(ranked.len(), 1);
        assert!(ranked.iter().all(|r| r.technician_id != missing_id));
    }

    #[test]
    fn test_ties_keep_check_in_order() {
        let first = candidate("first", Some((18.6, 73.9)));
        let second = candidate("second", Some((18.6, 73.9)));
        let third = candidate("third", Some((18.6, 73.9)));
        let ranked = rank_candidates(PUNE_ISSUE, vec![first, second, third]);
        let names: Vec<_> = ranked.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_empty_list_has_no_suggestion() {
        assert!(rank_candidates(PUNE_ISSUE, Vec::new()).is_empty());
        assert!(nearest(PUNE_ISSUE, vec![candidate("no-gps", None)]).is_none());
    }

    #[test]
    fn test_from_on_duty_technician() {
        let on_duty = OnDutyTechnician {
            technician_id: Uuid::new_v4(),
            full_name: "Asha".to_string(),
            check_in_at: chrono::Utc::now(),
            latitude: Some(18.5),
            longitude: None,
        };
        let candidate = Candidate::from(on_duty);
        assert_eq!(candidate.location, None);
    }
}
