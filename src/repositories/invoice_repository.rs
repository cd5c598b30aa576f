use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::field_ops_dto::InvoiceLineRequest;
use crate::models::inventory::InventoryItem;
use crate::models::invoice::{Invoice, InvoiceLine, InvoiceWithLines};
use crate::services::invoice_service::{compute_invoice, quantities_by_item, PricedLine};
use crate::utils::errors::AppError;

pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear la factura, sus líneas y descontar stock en una transacción.
    /// Si algún artículo no tiene stock suficiente no se escribe nada.
    pub async fn create(
        &self,
        issue_id: Uuid,
        service_charge: Decimal,
        lines: &[InvoiceLineRequest],
        tax_rate: Decimal,
        created_by: Uuid,
    ) -> Result<InvoiceWithLines, AppError> {
        let mut tx = self.pool.begin().await?;

        // Una fila bloqueada por artículo, siempre en orden de id
        let requested = quantities_by_item(lines.iter().map(|line| (line.item_id, line.quantity)));

        let mut items: HashMap<Uuid, InventoryItem> = HashMap::new();
        for (item_id, quantity) in &requested {
            let item = sqlx::query_as::<_, InventoryItem>(
                "SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE",
            )
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Artículo {} no encontrado", item_id)))?;

            if item.stock < *quantity {
                return Err(AppError::Conflict(format!(
                    "Stock insuficiente para {} ({}): disponible {}, solicitado {}",
                    item.name, item.sku, item.stock, quantity
                )));
            }

            sqlx::query("UPDATE inventory_items SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
                .bind(item_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;

            items.insert(*item_id, item);
        }

        let priced: Vec<PricedLine> = lines
            .iter()
            .filter_map(|line| {
                items.get(&line.item_id).map(|item| PricedLine {
                    item_id: item.id,
                    description: item.name.clone(),
                    quantity: line.quantity,
                    unit_price: item.unit_price,
                })
            })
            .collect();

        let breakdown = compute_invoice(service_charge, &priced, tax_rate);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (id, issue_id, service_charge, parts_total, tax_rate, tax_amount, total, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(issue_id)
        .bind(breakdown.service_charge)
        .bind(breakdown.parts_total)
        .bind(breakdown.tax_rate)
        .bind(breakdown.tax_amount)
        .bind(breakdown.total)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut invoice_lines = Vec::with_capacity(priced.len());
        for line in &priced {
            let saved = sqlx::query_as::<_, InvoiceLine>(
                r#"
                INSERT INTO invoice_lines (id, invoice_id, item_id, description, quantity, unit_price, amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice.id)
            .bind(line.item_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.amount())
            .fetch_one(&mut *tx)
            .await?;
            invoice_lines.push(saved);
        }

        tx.commit().await?;

        Ok(InvoiceWithLines {
            invoice,
            lines: invoice_lines,
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvoiceWithLines>, AppError> {
        let Some(invoice) = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let lines = self.lines_for(invoice.id).await?;
        Ok(Some(InvoiceWithLines { invoice, lines }))
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY created_at DESC LIMIT 500")
            .fetch_all(&self.pool)
            .await?;
        Ok(invoices)
    }

    pub async fn list_for_issue(&self, issue_id: Uuid) -> Result<Vec<InvoiceWithLines>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE issue_id = $1 ORDER BY created_at DESC",
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            let lines = self.lines_for(invoice.id).await?;
            result.push(InvoiceWithLines { invoice, lines });
        }
        Ok(result)
    }

    async fn lines_for(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLine>, AppError> {
        let lines = sqlx::query_as::<_, InvoiceLine>(
            "SELECT * FROM invoice_lines WHERE invoice_id = $1 ORDER BY description ASC",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
