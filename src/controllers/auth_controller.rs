use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    CreateTechnicianRequest, LoginRequest, LoginResponse, MeResponse, UpdateTechnicianRequest,
};
use crate::dto::common_dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::technician::Technician;
use crate::repositories::issue_repository::IssueRepository;
use crate::repositories::technician_repository::TechnicianRepository;
use crate::services::change_feed::{ChangeAction, ChangeFeed, ChangeTable};
use crate::services::issue_lifecycle::issues_released_by_removal;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::jwt::{generate_token, JwtConfig};

pub struct AuthController {
    repository: TechnicianRepository,
    issues: IssueRepository,
    change_feed: ChangeFeed,
    jwt: JwtConfig,
}

fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::Hash(format!("Error hasheando contraseña: {}", e)))
}

impl AuthController {
    pub fn new(pool: PgPool, jwt: JwtConfig, change_feed: ChangeFeed) -> Self {
        Self {
            repository: TechnicianRepository::new(pool.clone()),
            issues: IssueRepository::new(pool),
            change_feed,
            jwt,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Credenciales inválidas".to_string());

        let technician = self
            .repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !technician.is_active {
            log::warn!("🔒 Login rechazado para técnico inactivo {}", technician.id);
            return Err(invalid());
        }

        let matches = verify(&request.password, &technician.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verificando contraseña: {}", e)))?;
        if !matches {
            return Err(invalid());
        }

        let token = generate_token(technician.id, technician.role, &self.jwt)?;
        log::info!("🔑 Login correcto: {} ({})", technician.email, technician.role.as_str());

        Ok(LoginResponse {
            token,
            expires_in: self.jwt.expiration,
            technician,
        })
    }

    pub async fn me(&self, user: AuthenticatedUser) -> Result<MeResponse, AppError> {
        let technician = self
            .repository
            .find_by_id(user.technician_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("El técnico del token ya no existe".to_string()))?;

        Ok(MeResponse {
            id: technician.id,
            role: technician.role,
            technician,
        })
    }

    pub async fn create_technician(
        &self,
        request: CreateTechnicianRequest,
    ) -> Result<ApiResponse<Technician>, AppError> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("Technician", "email", &email));
        }

        let password_hash = hash_password(&request.password)?;
        let technician = self
            .repository
            .create(
                request.full_name.trim(),
                &email,
                request.phone.as_deref(),
                &password_hash,
                request.role,
            )
            .await?;

        log::info!("👷 Técnico creado: {} ({})", technician.full_name, technician.id);
        Ok(ApiResponse::success_with_message(technician, "Técnico creado exitosamente"))
    }

    pub async fn list_technicians(&self, include_inactive: bool) -> Result<Vec<Technician>, AppError> {
        self.repository.list(include_inactive).await
    }

    pub async fn update_technician(
        &self,
        id: Uuid,
        request: UpdateTechnicianRequest,
    ) -> Result<ApiResponse<Technician>, AppError> {
        request.validate()?;

        let mut technician = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Técnico no encontrado".to_string()))?;

        if let Some(full_name) = request.full_name {
            technician.full_name = full_name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            technician.phone = Some(phone);
        }
        if let Some(password) = request.password {
            technician.password_hash = hash_password(&password)?;
        }
        if let Some(role) = request.role {
            technician.role = role;
        }
        if let Some(is_active) = request.is_active {
            technician.is_active = is_active;
        }

        let updated = self.repository.update(&technician).await?;
        Ok(ApiResponse::success_with_message(updated, "Técnico actualizado exitosamente"))
    }

    /// Borrado definitivo; la desactivación va por `update_technician`
    pub async fn delete_technician(&self, user: AuthenticatedUser, id: Uuid) -> Result<(), AppError> {
        if user.technician_id == id {
            return Err(AppError::Conflict("No puedes eliminar tu propia cuenta".to_string()));
        }

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("Técnico no encontrado".to_string()));
        }

        let assigned = self.issues.list_open_for_technician(id).await?;
        let released = issues_released_by_removal(&assigned)?;

        if !self.repository.delete_releasing_issues(id).await? {
            return Err(AppError::Conflict(
                "El técnico tiene un issue en progreso; ciérralo o reasígnalo antes de eliminarlo".to_string(),
            ));
        }

        for issue_id in &released {
            self.change_feed.publish(ChangeTable::Issues, ChangeAction::Update, *issue_id);
        }

        log::info!("🗑️ Técnico {} eliminado ({} issues vuelven a pending)", id, released.len());
        Ok(())
    }
}
