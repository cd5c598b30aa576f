use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::inventory::InventoryItem;
use crate::utils::errors::AppError;

pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        sku: &str,
        stock: i32,
        reorder_level: i32,
        unit_price: Decimal,
    ) -> Result<InventoryItem, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (id, name, sku, stock, reorder_level, unit_price, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(sku)
        .bind(stock)
        .bind(reorder_level)
        .bind(unit_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn list(&self) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Artículos con stock en o por debajo del nivel de reposición
    pub async fn list_low_stock(&self) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE stock <= reorder_level ORDER BY stock ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn update(&self, item: &InventoryItem) -> Result<InventoryItem, AppError> {
        let updated = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET name = $2, reorder_level = $3, unit_price = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.reorder_level)
        .bind(item.unit_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Ajuste atómico de stock; `None` si el resultado sería negativo
    pub async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
