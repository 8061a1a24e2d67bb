//! Inventory domain module.
//!
//! This crate contains business rules for the stockroom, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Stores persist what
//! the functions in [`ledger`] return; they never adjust stock on their own.

pub mod dashboard;
pub mod import;
pub mod ledger;
pub mod movement;
pub mod product;
pub mod requisition;

pub use dashboard::{DashboardSummary, ProductMovementTotal, summarize};
pub use import::{ImportReport, ImportRowError, ProductRow, parse_row};
pub use ledger::{Approval, MovementOutcome, apply_movement, approve, deny};
pub use movement::{MovementFilter, MovementKind, StockMovement};
pub use product::{MAX_UNIT_PRICE, NewProduct, Product, ProductUpdate};
pub use requisition::{
    NewRequisition, Requester, Requisition, RequisitionCode, RequisitionKind, RequisitionStatus,
};
