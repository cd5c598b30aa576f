//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de roles de los técnicos autenticados.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    models::technician::TechnicianRole,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Técnico autenticado que se inyecta en las requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthenticatedUser {
    pub technician_id: Uuid,
    pub role: TechnicianRole,
}

impl AuthenticatedUser {
    /// Exigir uno de los roles indicados
    pub fn require_any(&self, roles: &[TechnicianRole]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "El rol '{}' no tiene permiso para esta operación",
                self.role.as_str()
            )))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_any(&[TechnicianRole::Admin, TechnicianRole::Manager])
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_any(&[TechnicianRole::Admin])
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;

    // Decodificar y validar JWT
    let claims = verify_token(token, &state.jwt_config())?;

    let technician_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("ID de técnico inválido".to_string()))?;
    let role = TechnicianRole::parse(&claims.role)
        .ok_or_else(|| AppError::Unauthorized("Rol inválido en el token".to_string()))?;

    // Inyectar usuario autenticado en las extensions
    request
        .extensions_mut()
        .insert(AuthenticatedUser { technician_id, role });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        let technician = AuthenticatedUser {
            technician_id: Uuid::new_v4(),
            role: TechnicianRole::Technician,
        };
        assert!(technician.require_staff().is_err());
        assert!(technician.require_any(&[TechnicianRole::Technician]).is_ok());

        let manager = AuthenticatedUser {
            technician_id: Uuid::new_v4(),
            role: TechnicianRole::Manager,
        };
        assert!(manager.require_staff().is_ok());
        assert!(manager.require_admin().is_err());
        assert!(manager.is_staff());
    }
}
