//! Stock ledger transitions.
//!
//! Every function here is pure: it takes the current records and returns the
//! records to persist. A store must write all of them in one atomic unit (the
//! product row, the new movement, and for approvals the requisition) or none.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{DomainError, DomainResult, MovementId, ProductId};

use crate::movement::{MovementKind, StockMovement};
use crate::product::Product;
use crate::requisition::{Requester, Requisition, RequisitionStatus};

/// Result of applying a movement: the adjusted product and the movement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementOutcome {
    pub product: Product,
    pub movement: StockMovement,
}

/// Result of approving a requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Approval {
    pub requisition: Requisition,
    pub product: Product,
    pub movement: StockMovement,
}

/// Apply an inbound/outbound movement of `quantity` units to `product`.
///
/// Fails with `Validation` for `quantity <= 0` and with `InsufficientStock`
/// when an outbound movement exceeds `stock_on_hand`.
pub fn apply_movement(
    product: &Product,
    kind: MovementKind,
    quantity: i64,
    occurred_at: DateTime<Utc>,
) -> DomainResult<MovementOutcome> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be greater than zero"));
    }
    if kind == MovementKind::Outbound && quantity > product.stock_on_hand {
        return Err(DomainError::insufficient_stock(quantity, product.stock_on_hand));
    }

    let stock_on_hand = product
        .stock_on_hand
        .checked_add(kind.signed(quantity))
        .ok_or_else(|| DomainError::validation("quantity overflows stock counter"))?;

    Ok(MovementOutcome {
        product: Product {
            stock_on_hand,
            ..product.clone()
        },
        movement: StockMovement {
            id: MovementId::new(),
            product_id: product.id,
            kind,
            quantity,
            occurred_at,
            requisition_id: None,
        },
    })
}

/// Approve a pending requisition against the product's current stock.
///
/// Checks, in order: the requisition is Pending (`AlreadyProcessed`), it
/// targets this product, and stock covers the quantity (`InsufficientStock`).
pub fn approve(
    requisition: &Requisition,
    product: &Product,
    reviewer: &Requester,
    at: DateTime<Utc>,
) -> DomainResult<Approval> {
    requisition.ensure_pending()?;
    ensure_same_product(requisition.product_id, product.id)?;

    let MovementOutcome { product, mut movement } =
        apply_movement(product, MovementKind::Outbound, requisition.quantity, at)?;
    movement.requisition_id = Some(requisition.id);

    Ok(Approval {
        requisition: resolve(requisition, RequisitionStatus::Approved, reviewer, at),
        product,
        movement,
    })
}

/// Deny a pending requisition. No stock effect.
pub fn deny(requisition: &Requisition, reviewer: &Requester, at: DateTime<Utc>) -> DomainResult<Requisition> {
    requisition.ensure_pending()?;
    Ok(resolve(requisition, RequisitionStatus::Denied, reviewer, at))
}

fn resolve(
    requisition: &Requisition,
    status: RequisitionStatus,
    reviewer: &Requester,
    at: DateTime<Utc>,
) -> Requisition {
    Requisition {
        status,
        resolved_at: Some(at),
        resolved_by: Some(reviewer.clone()),
        ..requisition.clone()
    }
}

fn ensure_same_product(expected: ProductId, found: ProductId) -> DomainResult<()> {
    if expected != found {
        return Err(DomainError::conflict(format!(
            "requisition targets product {expected}, got {found}"
        )));
    }
    Ok(())
}
