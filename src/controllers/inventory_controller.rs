use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::field_ops_dto::{AdjustStockRequest, CreateInventoryItemRequest, UpdateInventoryItemRequest};
use crate::models::inventory::InventoryItem;
use crate::repositories::inventory_repository::InventoryRepository;
use crate::services::inventory_service::stock_after_adjustment;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::validation::validate_non_negative;

pub struct InventoryController {
    repository: InventoryRepository,
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    validate_non_negative(price)
        .map_err(|_| AppError::BadRequest("El precio unitario no puede ser negativo".to_string()))
}

impl InventoryController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: InventoryRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateInventoryItemRequest) -> Result<ApiResponse<InventoryItem>, AppError> {
        request.validate()?;
        check_price(request.unit_price)?;

        let sku = request.sku.trim().to_uppercase();
        let item = self
            .repository
            .create(
                request.name.trim(),
                &sku,
                request.stock,
                request.reorder_level,
                request.unit_price,
            )
            .await
            .map_err(|e| match e {
                AppError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    conflict_error("Inventory item", "sku", &sku)
                }
                other => other,
            })?;

        log::info!("📦 Artículo {} ({}) creado con stock {}", item.name, item.sku, item.stock);
        Ok(ApiResponse::success_with_message(item, "Artículo creado exitosamente"))
    }

    pub async fn list(&self) -> Result<Vec<InventoryItem>, AppError> {
        self.repository.list().await
    }

    pub async fn low_stock(&self) -> Result<Vec<InventoryItem>, AppError> {
        self.repository.list_low_stock().await
    }

    pub async fn get(&self, id: Uuid) -> Result<InventoryItem, AppError> {
        self.find(id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> Result<ApiResponse<InventoryItem>, AppError> {
        request.validate()?;

        let mut item = self.find(id).await?;
        if let Some(name) = request.name {
            item.name = name.trim().to_string();
        }
        if let Some(reorder_level) = request.reorder_level {
            item.reorder_level = reorder_level;
        }
        if let Some(unit_price) = request.unit_price {
            check_price(unit_price)?;
            item.unit_price = unit_price;
        }

        let updated = self.repository.update(&item).await?;
        Ok(ApiResponse::success_with_message(updated, "Artículo actualizado exitosamente"))
    }

    /// Sumar o restar stock; nunca por debajo de cero
    pub async fn adjust(&self, id: Uuid, request: AdjustStockRequest) -> Result<ApiResponse<InventoryItem>, AppError> {
        request.validate()?;

        let item = self.find(id).await?;
        stock_after_adjustment(item.stock, request.delta)?;

        // El UPDATE vuelve a comprobar el stock por si otra operación lo cambió
        match self.repository.adjust_stock(id, request.delta).await? {
            Some(item) => {
                if item.needs_reorder() {
                    log::warn!("⚠️ {} ({}) bajo nivel de reposición: {}", item.name, item.sku, item.stock);
                }
                Ok(ApiResponse::success(item))
            }
            None => {
                let item = self.find(id).await?;
                stock_after_adjustment(item.stock, request.delta)?;
                Err(AppError::Conflict(format!(
                    "El stock de {} cambió durante el ajuste; reintenta",
                    item.sku
                )))
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Artículo no encontrado".to_string()));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<InventoryItem, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Artículo no encontrado".to_string()))
    }
}
