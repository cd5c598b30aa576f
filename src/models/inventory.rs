//! Modelo de InventoryItem

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub reorder_level: i32,
    pub unit_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Stock en o por debajo del umbral de reposición
    pub fn needs_reorder(&self) -> bool {
        self.stock <= self.reorder_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_reorder() {
        let mut item = InventoryItem {
            id: Uuid::new_v4(),
            name: "GPS tracker".to_string(),
            sku: "GPS-001".to_string(),
            stock: 5,
            reorder_level: 5,
            unit_price: Decimal::new(249900, 2),
            updated_at: Utc::now(),
        };
        assert!(item.needs_reorder());
        item.stock = 6;
        assert!(!item.needs_reorder());
    }
}
