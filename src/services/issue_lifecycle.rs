//! Reglas del ciclo de vida de un issue
//!
//! pending → assigned → in_progress → completed, cancelled desde cualquier
//! estado abierto. Asignar un técnico a un issue pendiente lo avanza a
//! `assigned`; quitar la asignación lo devuelve a `pending`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::issue::{Issue, IssueStatus};
use crate::utils::errors::AppError;

/// Resultado de aplicar un cambio de estado
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: IssueStatus,
    pub assigned_to: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Estado resultante de (des)asignar un técnico
pub fn status_after_assignment(current: IssueStatus, assignee: Option<Uuid>) -> Result<IssueStatus, AppError> {
    if current.is_terminal() {
        return Err(AppError::Conflict(format!(
            "No se puede reasignar un issue en estado {}",
            current.as_str()
        )));
    }

    match (current, assignee) {
        (IssueStatus::Pending, Some(_)) => Ok(IssueStatus::Assigned),
        (IssueStatus::Assigned, None) => Ok(IssueStatus::Pending),
        (IssueStatus::InProgress, None) => Err(AppError::Conflict(
            "No se puede quitar el técnico de un issue en progreso".to_string(),
        )),
        (status, _) => Ok(status),
    }
}

/// Validar y planificar un cambio de estado explícito
pub fn plan_status_change(issue: &Issue, target: IssueStatus, now: DateTime<Utc>) -> Result<StatusChange, AppError> {
    if !issue.status.can_transition_to(target) {
        return Err(AppError::Conflict(format!(
            "Transición inválida: {} → {}",
            issue.status.as_str(),
            target.as_str()
        )));
    }

    let mut change = StatusChange {
        status: target,
        assigned_to: issue.assigned_to,
        started_at: issue.started_at,
        completed_at: issue.completed_at,
    };

    match target {
        IssueStatus::Assigned if issue.assigned_to.is_none() => {
            return Err(AppError::BadRequest(
                "Asigna un técnico antes de marcar el issue como asignado".to_string(),
            ));
        }
        IssueStatus::Pending => change.assigned_to = None,
        IssueStatus::InProgress => change.started_at = Some(now),
        IssueStatus::Completed => {
            change.started_at = issue.started_at.or(Some(now));
            change.completed_at = Some(now);
        }
        _ => {}
    }

    Ok(change)
}

/// Regla de un issue abierto por vehículo. Devuelve el issue abierto que se
/// pasa por alto con `force`; `exclude` es el propio issue al editarlo.
pub fn check_open_duplicate<'a>(
    vehicle_no: &str,
    open_issues: &'a [Issue],
    exclude: Option<Uuid>,
    force: bool,
) -> Result<Option<&'a Issue>, AppError> {
    let Some(existing) = open_issues
        .iter()
        .find(|issue| issue.status.is_open() && Some(issue.id) != exclude)
    else {
        return Ok(None);
    };

    if force {
        return Ok(Some(existing));
    }

    Err(AppError::Conflict(format!(
        "El vehículo {} ya tiene un issue abierto ({}, {}); reenviar con force=true para guardarlo igualmente",
        vehicle_no,
        existing.id,
        existing.status.as_str()
    )))
}

/// Estado y sellos de tiempo de un issue importado, que nunca trae técnico
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedLifecycle {
    pub status: IssueStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Sin técnico, `assigned` e `in_progress` vuelven a `pending`; un
/// `completed` queda sellado con inicio en su alta y cierre en `now`
pub fn imported_lifecycle(
    status: IssueStatus,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ImportedLifecycle {
    match status {
        IssueStatus::Assigned | IssueStatus::InProgress => ImportedLifecycle {
            status: IssueStatus::Pending,
            started_at: None,
            completed_at: None,
        },
        IssueStatus::Completed => {
            let started_at = created_at.unwrap_or(now).min(now);
            ImportedLifecycle {
                status,
                started_at: Some(started_at),
                completed_at: Some(now),
            }
        }
        _ => ImportedLifecycle {
            status,
            started_at: None,
            completed_at: None,
        },
    }
}

/// Issues que vuelven a `pending` al eliminar a su técnico. Un issue en
/// progreso bloquea la eliminación.
pub fn issues_released_by_removal(assigned: &[Issue]) -> Result<Vec<Uuid>, AppError> {
    if let Some(busy) = assigned.iter().find(|i| i.status == IssueStatus::InProgress) {
        return Err(AppError::Conflict(format!(
            "El técnico tiene el issue {} en progreso; ciérralo o reasígnalo antes de eliminarlo",
            busy.id
        )));
    }

    Ok(assigned
        .iter()
        .filter(|i| i.status == IssueStatus::Assigned)
        .map(|i| i.id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::IssuePriority;

    fn issue(status: IssueStatus, assigned_to: Option<Uuid>) -> Issue {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            client: "Baba Travels".to_string(),
            vehicle_no: "MH231FC9072".to_string(),
            device_imei: None,
            problem: "Tracker offline".to_string(),
            priority: IssuePriority::Low,
            status,
            latitude: None,
            longitude: None,
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

    #[test]
    fn test_assignment_auto_advances_pending() {
        let tech = Some(Uuid::new_v4());
        assert_eq!(status_after_assignment(IssueStatus::Pending, tech).unwrap(), IssueStatus::Assigned);
        assert_eq!(status_after_assignment(IssueStatus::Assigned, tech).unwrap(), IssueStatus::Assigned);
        assert_eq!(status_after_assignment(IssueStatus::InProgress, tech).unwrap(), IssueStatus::InProgress);
    }

    #[test]
    fn test_unassignment_returns_to_pending() {
        assert_eq!(status_after_assignment(IssueStatus::Assigned, None).unwrap(), IssueStatus::Pending);
        assert_eq!(status_after_assignment(IssueStatus::Pending, None).unwrap(), IssueStatus::Pending);
        assert!(status_after_assignment(IssueStatus::InProgress, None).is_err());
    }

    #[test]
    fn test_terminal_issues_cannot_be_reassigned() {
        assert!(status_after_assignment(IssueStatus::Completed, Some(Uuid::new_v4())).is_err());
        assert!(status_after_assignment(IssueStatus::Cancelled, None).is_err());
    }

    #[test]
    fn test_start_and_complete_stamp_timestamps() {
        let tech = Some(Uuid::new_v4());
        let now = Utc::now();

        let started = plan_status_change(&issue(IssueStatus::Assigned, tech), IssueStatus::InProgress, now).unwrap();
        assert_eq!(started.status, IssueStatus::InProgress);
        assert_eq!(started.started_at, Some(now));
        assert_eq!(started.completed_at, None);

        let mut in_progress = issue(IssueStatus::InProgress, tech);
        in_progress.started_at = Some(now - chrono::Duration::hours(2));
        let completed = plan_status_change(&in_progress, IssueStatus::Completed, now).unwrap();
        assert_eq!(completed.started_at, in_progress.started_at);
        assert_eq!(completed.completed_at, Some(now));
        assert_eq!(completed.assigned_to, tech);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let now = Utc::now();
        assert!(plan_status_change(&issue(IssueStatus::Pending, None), IssueStatus::Completed, now).is_err());
        assert!(plan_status_change(&issue(IssueStatus::Completed, None), IssueStatus::Cancelled, now).is_err());
        assert!(plan_status_change(&issue(IssueStatus::Pending, None), IssueStatus::Assigned, now).is_err());
    }

    #[test]
    fn test_back_to_pending_clears_assignee() {
        let change = plan_status_change(
            &issue(IssueStatus::Assigned, Some(Uuid::new_v4())),
            IssueStatus::Pending,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(change.assigned_to, None);
    }

    #[test]
    fn test_cancel_keeps_assignee() {
        let tech = Some(Uuid::new_v4());
        let change = plan_status_change(&issue(IssueStatus::InProgress, tech), IssueStatus::Cancelled, Utc::now()).unwrap();
        assert_eq!(change.status, IssueStatus::Cancelled);
        assert_eq!(change.assigned_to, tech);
    }

    fn open_issue(vehicle: &str, status: IssueStatus) -> Issue {
        let mut issue = issue(status, None);
        issue.vehicle_no = vehicle.to_string();
        issue
    }

    #[test]
    fn test_open_issue_blocks_same_vehicle() {
        let existing = vec![open_issue("MH231FC9072", IssueStatus::Assigned)];
        let result = check_open_duplicate("MH231FC9072", &existing, None, false);
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("MH231FC9072")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_force_overrides_open_duplicate() {
        let existing = vec![open_issue("MH231FC9072", IssueStatus::Pending)];
        let forced = check_open_duplicate("MH231FC9072", &existing, None, true).unwrap();
        assert_eq!(forced.map(|i| i.id), Some(existing[0].id));
    }

    #[test]
    fn test_closed_issues_and_self_do_not_block() {
        let closed = vec![
            open_issue("MH231FC9072", IssueStatus::Completed),
            open_issue("MH231FC9072", IssueStatus::Cancelled),
        ];
        assert!(check_open_duplicate("MH231FC9072", &closed, None, false).unwrap().is_none());

        let own = vec![open_issue("MH231FC9072", IssueStatus::InProgress)];
        assert!(check_open_duplicate("MH231FC9072", &own, Some(own[0].id), false)
            .unwrap()
            .is_none());
        assert!(check_open_duplicate("MH231FC9072", &own, Some(Uuid::new_v4()), false).is_err());
    }

    #[test]
    fn test_imported_rows_without_technician_fall_back_to_pending() {
        let now = Utc::now();
        for status in [IssueStatus::Assigned, IssueStatus::InProgress] {
            let lifecycle = imported_lifecycle(status, None, now);
            assert_eq!(lifecycle.status, IssueStatus::Pending);
            assert_eq!(lifecycle.started_at, None);
            assert_eq!(lifecycle.completed_at, None);
        }
        assert_eq!(imported_lifecycle(IssueStatus::Cancelled, None, now).status, IssueStatus::Cancelled);
        assert_eq!(imported_lifecycle(IssueStatus::Pending, None, now).completed_at, None);
    }

    #[test]
    fn test_imported_completed_rows_are_stamped() {
        let now = Utc::now();
        let created = now - chrono::Duration::days(3);
        let lifecycle = imported_lifecycle(IssueStatus::Completed, Some(created), now);
        assert_eq!(lifecycle.status, IssueStatus::Completed);
        assert_eq!(lifecycle.started_at, Some(created));
        assert_eq!(lifecycle.completed_at, Some(now));

        let undated = imported_lifecycle(IssueStatus::Completed, None, now);
        assert_eq!(undated.started_at, Some(now));
    }

    #[test]
    fn test_removal_releases_assigned_issues() {
        let tech = Some(Uuid::new_v4());
        let assigned = issue(IssueStatus::Assigned, tech);
        let done = issue(IssueStatus::Completed, tech);
        let released = issues_released_by_removal(&[assigned.clone(), done]).unwrap();
        assert_eq!(released, vec![assigned.id]);
    }

    #[test]
    fn test_removal_blocked_by_issue_in_progress() {
        let tech = Some(Uuid::new_v4());
        let busy = issue(IssueStatus::InProgress, tech);
        assert!(matches!(
            issues_released_by_removal(&[busy]),
            Err(AppError::Conflict(_))
        ));
    }
}
