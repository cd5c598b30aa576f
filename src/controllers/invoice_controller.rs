use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::field_ops_dto::CreateInvoiceRequest;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::invoice::{Invoice, InvoiceWithLines};
use crate::models::issue::IssueStatus;
use crate::repositories::invoice_repository::InvoiceRepository;
use crate::repositories::issue_repository::IssueRepository;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_non_negative;

pub struct InvoiceController {
    invoices: InvoiceRepository,
    issues: IssueRepository,
    tax_rate: Decimal,
}

impl InvoiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            invoices: InvoiceRepository::new(state.pool.clone()),
            issues: IssueRepository::new(state.pool.clone()),
            tax_rate: state.config.invoice_tax_rate,
        }
    }

    /// Facturar un issue completado, descontando el stock usado
    pub async fn create(
        &self,
        user: AuthenticatedUser,
        request: CreateInvoiceRequest,
    ) -> Result<ApiResponse<InvoiceWithLines>, AppError> {
        request.validate()?;

        validate_non_negative(request.service_charge)
            .map_err(|_| AppError::BadRequest("El cargo de servicio no puede ser negativo".to_string()))?;

        let issue = self
            .issues
            .find_by_id(request.issue_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Issue no encontrado".to_string()))?;

        if issue.status != IssueStatus::Completed {
            return Err(AppError::Conflict(format!(
                "Solo se facturan issues completados (estado actual: {})",
                issue.status.as_str()
            )));
        }

        let invoice = self
            .invoices
            .create(
                issue.id,
                request.service_charge,
                &request.lines,
                self.tax_rate,
                user.technician_id,
            )
            .await?;

        log::info!(
            "🧾 Factura {} para issue {}: total {}",
            invoice.invoice.id,
            issue.id,
            invoice.invoice.total
        );
        Ok(ApiResponse::success_with_message(invoice, "Factura creada exitosamente"))
    }

    pub async fn get(&self, id: Uuid) -> Result<InvoiceWithLines, AppError> {
        self.invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Factura no encontrada".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, AppError> {
        self.invoices.list().await
    }

    pub async fn list_for_issue(&self, issue_id: Uuid) -> Result<Vec<InvoiceWithLines>, AppError> {
        self.invoices.list_for_issue(issue_id).await
    }
}
