//! Cálculo del desglose de una factura (servicio + piezas + impuesto)

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

/// Línea de piezas ya resuelta contra el inventario
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub item_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn amount(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceBreakdown {
    pub service_charge: Decimal,
    pub parts_total: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Redondeo monetario a 2 decimales, mitad hacia arriba
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// parts = Σ cantidad × precio; impuesto = (servicio + parts) × tasa / 100
pub fn compute_invoice(service_charge: Decimal, lines: &[PricedLine], tax_rate: Decimal) -> InvoiceBreakdown {
    let service_charge = round_money(service_charge);
    let parts_total: Decimal = lines.iter().map(PricedLine::amount).sum();
    let tax_amount = round_money((service_charge + parts_total) * tax_rate / Decimal::ONE_HUNDRED);

    InvoiceBreakdown {
        service_charge,
        parts_total,
        tax_rate,
        tax_amount,
        total: service_charge + parts_total + tax_amount,
    }
}

/// Cantidad total pedida por artículo, ordenada por id para que las filas
/// de inventario se bloqueen siempre en el mismo orden
pub fn quantities_by_item<I>(lines: I) -> BTreeMap<Uuid, i32>
where
    I: IntoIterator<Item = (Uuid, i32)>,
{
    let mut requested = BTreeMap::new();
    for (item_id, quantity) in lines {
        let total = requested.entry(item_id).or_insert(0i32);
        *total = total.saturating_add(quantity);
    }
    requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn line(quantity: i32, unit_price: &str) -> PricedLine {
        PricedLine {
            item_id: Uuid::new_v4(),
            description: "Relay".to_string(),
            quantity,
            unit_price: dec(unit_price),
        }
    }

    #[test]
    fn test_service_only() {
        let breakdown = compute_invoice(dec("500"), &[], dec("18"));
        assert_eq!(breakdown.parts_total, Decimal::ZERO);
        assert_eq!(breakdown.tax_amount, dec("90.00"));
        assert_eq!(breakdown.total, dec("590.00"));
    }

    #[test]
    fn test_service_and_parts() {
        let lines = vec![line(2, "249.50"), line(1, "1200")];
        let breakdown = compute_invoice(dec("350"), &lines, dec("18"));
        assert_eq!(breakdown.parts_total, dec("1699.00"));
        // (350 + 1699) * 0.18 = 368.82
        assert_eq!(breakdown.tax_amount, dec("368.82"));
        assert_eq!(breakdown.total, dec("2417.82"));
    }

    #[test]
    fn test_tax_rounding() {
        let breakdown = compute_invoice(dec("10.05"), &[], dec("5"));
        // 0.5025 -> 0.50
        assert_eq!(breakdown.tax_amount, dec("0.50"));
        let breakdown = compute_invoice(dec("0.10"), &[], dec("5"));
        // 0.005 -> 0.01
        assert_eq!(breakdown.tax_amount, dec("0.01"));
    }

    #[test]
    fn test_zero_tax_rate() {
        let breakdown = compute_invoice(dec("100"), &[line(3, "10")], Decimal::ZERO);
        assert_eq!(breakdown.tax_amount, Decimal::ZERO);
        assert_eq!(breakdown.total, dec("130"));
    }

    #[test]
    fn test_quantities_grouped_and_ordered_by_item() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);

        let requested = quantities_by_item([(c, 1), (a, 2), (c, 4), (b, 1)]);
        let order: Vec<(Uuid, i32)> = requested.into_iter().collect();
        assert_eq!(order, vec![(a, 2), (b, 1), (c, 5)]);

        let reversed = quantities_by_item([(b, 1), (c, 5), (a, 2)]);
        assert_eq!(reversed.keys().copied().collect::<Vec<_>>(), vec![a, b, c]);
    }
}
