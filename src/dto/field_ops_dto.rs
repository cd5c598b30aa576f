//! DTOs de operaciones de campo: asistencia, ubicación, inventario y facturas

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// Check-in / check-out con GPS opcional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AttendanceEventRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<String>,
}

// Reporte periódico de ubicación en vivo
#[derive(Debug, Deserialize, Validate)]
pub struct ReportLocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = 0.0))]
    pub accuracy_m: Option<f64>,
}

// Inventario
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 64))]
    pub sku: String,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub reorder_level: i32,

    pub unit_price: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInventoryItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,

    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    #[validate(range(min = -100000, max = 100000))]
    pub delta: i32,
}

// Facturas
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoiceLineRequest {
    pub item_id: Uuid,

    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub issue_id: Uuid,

    pub service_charge: Decimal,

    #[validate]
    #[serde(default)]
    pub lines: Vec<InvoiceLineRequest>,
}
