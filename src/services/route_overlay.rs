//! Overlay de rutas técnico → issue para el mapa del dashboard
//!
//! Para cada técnico en turno con ubicación se piden rutas hacia sus issues
//! asignados abiertos, o hacia los issues sin asignar más cercanos si no tiene
//! ninguno. Las peticiones se hacen una a una; si una falla, ese par cae a
//! una línea recta sin etiqueta y el resto continúa.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::OnDutyTechnician;
use crate::models::issue::{Issue, IssueStatus};
use crate::models::location::Coordinates;
use crate::services::geo::haversine_km;
use crate::services::routing_service::{RoadRoute, RoutingProvider};

/// Par técnico/issue a resolver
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub technician_id: Uuid,
    pub technician_name: String,
    pub from: Coordinates,
    pub issue_id: Uuid,
    pub to: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutePath {
    Road {
        coordinates: Vec<[f64; 2]>,
        distance_m: f64,
        duration_s: f64,
        label: String,
    },
    /// Línea recta discontinua, sin distancia
    Straight { from: Coordinates, to: Coordinates },
}

impl RoutePath {
    pub fn is_road(&self) -> bool {
        matches!(self, RoutePath::Road { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOverlay {
    pub technician_id: Uuid,
    pub technician_name: String,
    pub issue_id: Uuid,
    pub path: RoutePath,
}

/// Etiqueta "12.3 km · 25 min"
pub fn format_route_label(distance_m: f64, duration_s: f64) -> String {
    let km = distance_m / 1000.0;
    let minutes = (duration_s / 60.0).round().max(1.0) as i64;
    format!("{:.1} km · {} min", km, minutes)
}

impl RoutePath {
    fn from_lookup(route: Option<RoadRoute>, from: Coordinates, to: Coordinates) -> Self {
        match route {
            Some(route) => RoutePath::Road {
                label: format_route_label(route.distance_m, route.duration_s),
                coordinates: route.coordinates,
                distance_m: route.distance_m,
                duration_s: route.duration_s,
            },
            None => RoutePath::Straight { from, to },
        }
    }
}

/// Decidir qué pares técnico → issue se consultan
pub fn plan_route_requests(
    technicians: &[OnDutyTechnician],
    open_issues: &[Issue],
    fallback_nearest: usize,
) -> Vec<RouteRequest> {
    let mut requests = Vec::new();

    for technician in technicians {
        let Some(from) = technician.coordinates() else {
            continue;
        };

        let assigned: Vec<(&Issue, Coordinates)> = open_issues
            .iter()
            .filter(|issue| issue.status.is_open() && issue.assigned_to == Some(technician.technician_id))
            .filter_map(|issue| issue.coordinates().map(|to| (issue, to)))
            .collect();

        let targets = if !assigned.is_empty() {
            assigned
        } else {
            let mut unassigned: Vec<(&Issue, Coordinates, f64)> = open_issues
                .iter()
                .filter(|issue| issue.status == IssueStatus::Pending && issue.assigned_to.is_none())
                .filter_map(|issue| issue.coordinates().map(|to| (issue, to, haversine_km(from, to))))
                .collect();
            unassigned.sort_by(|a, b| a.2.total_cmp(&b.2));
            unassigned
                .into_iter()
                .take(fallback_nearest)
                .map(|(issue, to, _)| (issue, to))
                .collect()
        };

        for (issue, to) in targets {
            requests.push(RouteRequest {
                technician_id: technician.technician_id,
                technician_name: technician.full_name.clone(),
                from,
                issue_id: issue.id,
                to,
            });
        }
    }

    requests
}

/// Resolver los pares secuencialmente contra el proveedor de rutas
pub async fn build_overlays(
    provider: &dyn RoutingProvider,
    requests: Vec<RouteRequest>,
) -> Vec<RouteOverlay> {
    let mut overlays = Vec::with_capacity(requests.len());

    for request in requests {
        let route = provider.driving_route(request.from, request.to).await;
        if route.is_none() {
            log::info!(
                "📐 Ruta {} → {} sin respuesta, usando línea recta",
                request.technician_id,
                request.issue_id
            );
        }

        overlays.push(RouteOverlay {
            technician_id: request.technician_id,
            technician_name: request.technician_name,
            issue_id: request.issue_id,
            path: RoutePath::from_lookup(route, request.from, request.to),
        });
    }

    log::info!(
        "🗺️ Overlay generado: {} rutas ({} por carretera)",
        overlays.len(),
        overlays.iter().filter(|o| o.path.is_road()).count()
    );
    overlays
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::IssuePriority;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Proveedor falso: registra las llamadas y falla en los destinos indicados
    struct FakeProvider {
        calls: Mutex<Vec<(Coordinates, Coordinates)>>,
        failing_destinations: Vec<Coordinates>,
    }

    impl FakeProvider {
        fn failing(failing_destinations: Vec<Coordinates>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing_destinations,
            }
        }
    }

    #[async_trait]
    impl RoutingProvider for FakeProvider {
        async fn driving_route(&self, from: Coordinates, to: Coordinates) -> Option<RoadRoute> {
            self.calls.lock().unwrap().push((from, to));
            if self.failing_destinations.contains(&to) {
                return None;
            }
            Some(RoadRoute {
                coordinates: vec![[from.longitude, from.latitude], [to.longitude, to.latitude]],
                distance_m: 12_345.0,
                duration_s: 1_500.0,
            })
        }
    }

    fn technician(name: &str, location: Option<(f64, f64)>) -> OnDutyTechnician {
        OnDutyTechnician {
            technician_id: Uuid::new_v4(),
            full_name: name.to_string(),
            check_in_at: Utc::now(),
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
        }
    }

    fn issue(status: IssueStatus, assigned_to: Option<Uuid>, location: Option<(f64, f64)>) -> Issue {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            client: "Baba Travels".to_string(),
            vehicle_no: "MH231FC9072".to_string(),
            device_imei: None,
            problem: "No GPS signal".to_string(),
            priority: IssuePriority::Medium,
            status,
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
            location_text: None,
            assigned_to,
            photo_url: None,
            signature_url: None,
            resolution_notes: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    fn request(to: (f64, f64)) -> RouteRequest {
        RouteRequest {
            technician_id: Uuid::new_v4(),
            technician_name: "Ravi".to_string(),
            from: Coordinates::new(18.52, 73.85),
            issue_id: Uuid::new_v4(),
            to: Coordinates::new(to.0, to.1),
        }
    }

    #[test]
    fn test_format_route_label() {
        assert_eq!(format_route_label(12_345.0, 1_500.0), "12.3 km · 25 min");
        assert_eq!(format_route_label(400.0, 10.0), "0.4 km · 1 min");
    }

    #[tokio::test]
    async fn test_failed_pair_falls_back_without_aborting_others() {
        let failing = Coordinates::new(19.07, 72.87);
        let provider = FakeProvider::failing(vec![failing]);
        let requests = vec![request((18.60, 73.90)), request((19.07, 72.87)), request((18.40, 73.80))];

        let overlays = build_overlays(&provider, requests.clone()).await;

        assert_eq!(overlays.len(), 3);
        assert!(overlays[0].path.is_road());
        assert_eq!(
            overlays[1].path,
            RoutePath::Straight {
                from: requests[1].from,
                to: failing
            }
        );
        assert!(overlays[2].path.is_road());
        match &overlays[0].path {
            RoutePath::Road { label, .. } => assert_eq!(label, "12.3 km · 25 min"),
            other => panic!("expected road route, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_each_pair_requested_once_in_order() {
        let provider = FakeProvider::failing(Vec::new());
        let requests = vec![request((18.60, 73.90)), request((18.70, 73.95))];

        build_overlays(&provider, requests.clone()).await;

        let calls = provider.calls.lock().unwrap();
        let expected: Vec<_> = requests.iter().map(|r| (r.from, r.to)).collect();
        assert_eq!(*calls, expected);
    }

    #[test]
    fn test_plan_prefers_assigned_issues() {
        let tech = technician("Ravi", Some((18.52, 73.85)));
        let assigned = issue(IssueStatus::InProgress, Some(tech.technician_id), Some((18.60, 73.90)));
        let unassigned = issue(IssueStatus::Pending, None, Some((18.521, 73.851)));
        let completed = issue(IssueStatus::Completed, Some(tech.technician_id), Some((18.53, 73.86)));

        let requests = plan_route_requests(&[tech], &[assigned.clone(), unassigned, completed], 3);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].issue_id, assigned.id);
    }

    #[test]
    fn test_plan_uses_nearest_unassigned_when_none_assigned() {
        let tech = technician("Asha", Some((18.52, 73.85)));
        let far = issue(IssueStatus::Pending, None, Some((19.07, 72.87)));
        let near = issue(IssueStatus::Pending, None, Some((18.53, 73.86)));
        let mid = issue(IssueStatus::Pending, None, Some((18.70, 73.95)));
        let no_coords = issue(IssueStatus::Pending, None, None);

        let requests = plan_route_requests(&[tech], &[far, near.clone(), mid.clone(), no_coords], 2);

        let ids: Vec<_> = requests.iter().map(|r| r.issue_id).collect();
        assert_eq!(ids, vec![near.id, mid.id]);
    }

    #[test]
    fn test_plan_skips_technicians_without_location() {
        let tech = technician("No GPS", None);
        let pending = issue(IssueStatus::Pending, None, Some((18.53, 73.86)));
        assert!(plan_route_requests(&[tech], &[pending], 3).is_empty());
    }
}
