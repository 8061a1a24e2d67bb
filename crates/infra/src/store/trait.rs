use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::{DomainError, ProductId, RequisitionId};
use stockroom_inventory::{
    Approval, MovementFilter, MovementKind, MovementOutcome, NewProduct, NewRequisition, Product,
    ProductUpdate, Requester, Requisition, StockMovement,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Deterministic business failure (validation, stock, lifecycle).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage backend failure (connection, lock poisoning, corrupt rows).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Catalog & ledger storage.
///
/// ## Atomicity
///
/// Every stock-changing operation (`apply_movement`, `approve_requisition`)
/// reads the product, runs the pure transition from
/// `stockroom_inventory::ledger`, and persists the product, the movement and
/// (for approvals) the requisition as one unit. Implementations must serialize
/// concurrent transitions on the same product or requisition so no update is
/// lost.
///
/// ## Ordering
///
/// - `list_products`: by name (case-insensitive)
/// - `list_movements` / `list_requisitions`: most recent first
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Update descriptive fields. Stock cannot be edited through here.
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, StoreError>;

    /// Record a movement and adjust stock atomically.
    async fn apply_movement(
        &self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
    ) -> Result<MovementOutcome, StoreError>;

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError>;

    /// Open a Pending requisition with a fresh unique code. The product must exist.
    async fn create_requisition(&self, input: NewRequisition) -> Result<Requisition, StoreError>;

    async fn get_requisition(&self, id: RequisitionId) -> Result<Requisition, StoreError>;

    async fn list_requisitions(&self) -> Result<Vec<Requisition>, StoreError>;

    /// Approve: decrement stock, append the outbound movement, mark Approved.
    async fn approve_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Approval, StoreError>;

    /// Deny: mark Denied, no stock effect.
    async fn deny_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Requisition, StoreError>;
}
