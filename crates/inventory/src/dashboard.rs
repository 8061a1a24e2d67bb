//! Dashboard aggregation over movement history.

use std::collections::HashMap;

use serde::Serialize;

use stockroom_core::ProductId;

use crate::movement::{MovementFilter, MovementKind, StockMovement};
use crate::product::Product;
use crate::requisition::Requisition;

/// How many products the "most moved" ranking shows.
pub const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductMovementTotal {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub filter: MovementFilter,
    pub inbound_total: i64,
    pub outbound_total: i64,
    pub top_products: Vec<ProductMovementTotal>,
    pub critical_products: Vec<Product>,
    pub pending_requisitions: usize,
}

/// Build the dashboard from the full catalog, movement history and requisitions.
///
/// The filter applies to movements only; critical products and the pending
/// count always reflect current state.
pub fn summarize(
    products: &[Product],
    movements: &[StockMovement],
    requisitions: &[Requisition],
    filter: MovementFilter,
) -> DashboardSummary {
    let mut inbound_total: i64 = 0;
    let mut outbound_total: i64 = 0;
    let mut per_product: HashMap<ProductId, i64> = HashMap::new();

    // Totals saturate at i64::MAX; the history itself may exceed it.
    for m in movements.iter().filter(|m| filter.matches(m)) {
        match m.kind {
            MovementKind::Inbound => inbound_total = inbound_total.saturating_add(m.quantity),
            MovementKind::Outbound => outbound_total = outbound_total.saturating_add(m.quantity),
        }
        let total = per_product.entry(m.product_id).or_default();
        *total = total.saturating_add(m.quantity);
    }

    let names: HashMap<ProductId, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut top_products: Vec<ProductMovementTotal> = per_product
        .into_iter()
        .map(|(product_id, quantity)| ProductMovementTotal {
            product_id,
            name: names.get(&product_id).copied().unwrap_or_default().to_string(),
            quantity,
        })
        .collect();
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);

    let mut critical_products: Vec<Product> =
        products.iter().filter(|p| p.is_critical()).cloned().collect();
    critical_products.sort_by_key(|p| p.name.to_lowercase());

    DashboardSummary {
        filter,
        inbound_total,
        outbound_total,
        top_products,
        critical_products,
        pending_requisitions: requisitions.iter().filter(|r| r.is_pending()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::NewProduct;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use stockroom_core::MovementId;

    fn product(name: &str, stock: i64, min: i64) -> Product {
        NewProduct {
            name: name.to_string(),
            stock_on_hand: stock,
            minimum_stock: min,
            unit_price: Decimal::ZERO,
        }
        .into_product(ProductId::new(), Utc::now())
        .unwrap()
    }

    fn moved(p: &Product, kind: MovementKind, quantity: i64, day: u32) -> StockMovement {
        StockMovement {
            id: MovementId::new(),
            product_id: p.id,
            kind,
            quantity,
            occurred_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            requisition_id: None,
        }
    }

    #[test]
    fn totals_and_ranking() {
        let gloves = product("Gloves", 10, 2);
        let masks = product("Masks", 1, 5);
        let movements = vec![
            moved(&gloves, MovementKind::Inbound, 20, 1),
            moved(&gloves, MovementKind::Outbound, 4, 2),
            moved(&masks, MovementKind::Inbound, 30, 3),
        ];

        let s = summarize(&[gloves.clone(), masks.clone()], &movements, &[], MovementFilter::default());
        assert_eq!(s.inbound_total, 50);
        assert_eq!(s.outbound_total, 4);
        assert_eq!(s.top_products[0].name, "Masks");
        assert_eq!(s.top_products[0].quantity, 30);
        assert_eq!(s.top_products[1].quantity, 24);
        assert_eq!(s.critical_products, vec![masks]);
        assert_eq!(s.pending_requisitions, 0);
    }

    #[test]
    fn filter_narrows_movements_only() {
        let gloves = product("Gloves", 0, 0);
        let movements = vec![
            moved(&gloves, MovementKind::Inbound, 20, 1),
            moved(&gloves, MovementKind::Outbound, 4, 9),
        ];
        let filter = MovementFilter {
            from: NaiveDate::from_ymd_opt(2024, 5, 5),
            to: None,
            kind: None,
        };

        let s = summarize(&[gloves.clone()], &movements, &[], filter);
        assert_eq!(s.inbound_total, 0);
        assert_eq!(s.outbound_total, 4);
        // Critical state is independent of the date filter.
        assert_eq!(s.critical_products.len(), 1);
    }

    #[test]
    fn huge_histories_saturate_instead_of_overflowing() {
        let drums = product("Drums", 1, 0);
        let movements = vec![
            moved(&drums, MovementKind::Inbound, i64::MAX, 1),
            moved(&drums, MovementKind::Outbound, i64::MAX, 2),
            moved(&drums, MovementKind::Inbound, 1, 3),
        ];

        let s = summarize(&[drums], &movements, &[], MovementFilter::default());
        assert_eq!(s.inbound_total, i64::MAX);
        assert_eq!(s.outbound_total, i64::MAX);
        assert_eq!(s.top_products[0].quantity, i64::MAX);
        assert_eq!(s.top_products[0].name, "Drums");
    }

    #[test]
    fn ranking_is_capped() {
        let products: Vec<Product> = (0..15).map(|i| product(&format!("P{i:02}"), 5, 0)).collect();
        let movements: Vec<StockMovement> = products
            .iter()
            .enumerate()
            .map(|(i, p)| moved(p, MovementKind::Inbound, i as i64 + 1, 1))
            .collect();

        let s = summarize(&products, &movements, &[], MovementFilter::default());
        assert_eq!(s.top_products.len(), TOP_PRODUCTS);
        assert_eq!(s.top_products[0].name, "P14");
    }
}
