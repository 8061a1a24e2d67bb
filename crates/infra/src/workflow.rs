//! Command execution pipeline (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Authorize (the command names its permission; one check for all commands)
//!   ↓
//! 2. Dispatch to the LedgerStore (which runs the pure ledger transition atomically)
//!   ↓
//! 3. Outcome, or WorkflowError for the boundary to present
//! ```
//!
//! No command carries its own role check. The only rule beyond the permission
//! table is that a requisition can be read by its requester even without the
//! review permission.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use stockroom_auth::{AuthzError, CommandAuthorization, Permission, Principal, authorize, authorize_command};
use stockroom_core::{DomainError, ProductId, RequisitionId, UserId};
use stockroom_inventory::{
    Approval, DashboardSummary, ImportReport, ImportRowError, MovementFilter, MovementKind,
    MovementOutcome, NewProduct, NewRequisition, Product, ProductUpdate, Requester, Requisition,
    RequisitionKind, StockMovement, parse_row, summarize,
};

use crate::spreadsheet::{self, Sheet, SpreadsheetError};
use crate::store::{LedgerStore, StoreError};

static CATALOG_READ: [Permission; 1] = [Permission::CATALOG_READ];
static CATALOG_WRITE: [Permission; 1] = [Permission::CATALOG_WRITE];
static MOVEMENTS_WRITE: [Permission; 1] = [Permission::MOVEMENTS_WRITE];
static REQUISITIONS_CREATE: [Permission; 1] = [Permission::REQUISITIONS_CREATE];
static REQUISITIONS_REVIEW: [Permission; 1] = [Permission::REQUISITIONS_REVIEW];
static EXPORTS_READ: [Permission; 1] = [Permission::EXPORTS_READ];

/// Everything a principal can ask the stockroom to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateProduct(NewProduct),
    UpdateProduct { id: ProductId, update: ProductUpdate },
    GetProduct(ProductId),
    ListProducts,
    /// Raw CSV text of an import sheet.
    ImportProducts(String),
    RecordMovement {
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
    },
    ListMovements(MovementFilter),
    RequestRequisition {
        kind: RequisitionKind,
        product_id: ProductId,
        quantity: i64,
        note: Option<String>,
    },
    GetRequisition(RequisitionId),
    ListRequisitions,
    ApproveRequisition(RequisitionId),
    DenyRequisition(RequisitionId),
    Dashboard(MovementFilter),
    ExportProducts,
    ExportRequisitions,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateProduct(_) => "create_product",
            Command::UpdateProduct { .. } => "update_product",
            Command::GetProduct(_) => "get_product",
            Command::ListProducts => "list_products",
            Command::ImportProducts(_) => "import_products",
            Command::RecordMovement { .. } => "record_movement",
            Command::ListMovements(_) => "list_movements",
            Command::RequestRequisition { .. } => "request_requisition",
            Command::GetRequisition(_) => "get_requisition",
            Command::ListRequisitions => "list_requisitions",
            Command::ApproveRequisition(_) => "approve_requisition",
            Command::DenyRequisition(_) => "deny_requisition",
            Command::Dashboard(_) => "dashboard",
            Command::ExportProducts => "export_products",
            Command::ExportRequisitions => "export_requisitions",
        }
    }
}

impl CommandAuthorization for Command {
    fn required_permissions(&self) -> &[Permission] {
        match self {
            Command::CreateProduct(_) | Command::UpdateProduct { .. } | Command::ImportProducts(_) => {
                &CATALOG_WRITE
            }
            Command::GetProduct(_)
            | Command::ListProducts
            | Command::ListMovements(_)
            | Command::Dashboard(_) => &CATALOG_READ,
            Command::RecordMovement { .. } => &MOVEMENTS_WRITE,
            // Reviewers or the requester; see `Workflow::get_requisition`.
            Command::RequestRequisition { .. } | Command::GetRequisition(_) => &REQUISITIONS_CREATE,
            Command::ListRequisitions | Command::ApproveRequisition(_) | Command::DenyRequisition(_) => {
                &REQUISITIONS_REVIEW
            }
            Command::ExportProducts | Command::ExportRequisitions => &EXPORTS_READ,
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Product(Product),
    Products(Vec<Product>),
    Movement(MovementOutcome),
    Movements(Vec<StockMovement>),
    Requisition(Requisition),
    Requisitions(Vec<Requisition>),
    Approval(Approval),
    Import(ImportReport),
    Dashboard(DashboardSummary),
    Sheet(Sheet),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    #[error("store failure: {0}")]
    Store(String),
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => WorkflowError::Domain(e),
            StoreError::Backend(msg) => WorkflowError::Store(msg),
        }
    }
}

/// The actor recorded on requisitions, derived from the verified principal.
pub fn requester_of(principal: &Principal) -> Requester {
    Requester {
        user_id: UserId::from_uuid(*principal.principal_id.as_uuid()),
        username: principal.username.clone(),
    }
}

pub struct Workflow<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Workflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: LedgerStore + ?Sized> Workflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Authorize, then run `command` against the store.
    #[instrument(skip_all, fields(command = command.name(), user = %principal.username))]
    pub async fn execute(&self, principal: &Principal, command: Command) -> Result<Outcome, WorkflowError> {
        if let Err(e) = authorize_command(principal, &command) {
            warn!(error = %e, "command rejected");
            return Err(e.into());
        }

        let result = self.dispatch(principal, command).await;
        if let Err(e) = &result {
            warn!(error = %e, "command failed");
        }
        result
    }

    async fn dispatch(&self, principal: &Principal, command: Command) -> Result<Outcome, WorkflowError> {
        let outcome = match command {
            Command::CreateProduct(input) => {
                let product = self.store.create_product(input).await?;
                info!(product_id = %product.id, stock = product.stock_on_hand, "product created");
                Outcome::Product(product)
            }
            Command::UpdateProduct { id, update } => {
                if update.is_empty() {
                    return Err(DomainError::validation("nothing to update").into());
                }
                Outcome::Product(self.store.update_product(id, update).await?)
            }
            Command::GetProduct(id) => Outcome::Product(self.store.get_product(id).await?),
            Command::ListProducts => Outcome::Products(self.store.list_products().await?),
            Command::ImportProducts(csv) => Outcome::Import(self.import_products(&csv).await?),
            Command::RecordMovement {
                product_id,
                kind,
                quantity,
            } => {
                let outcome = self.store.apply_movement(product_id, kind, quantity).await?;
                info!(
                    product_id = %product_id,
                    kind = %kind,
                    quantity,
                    stock = outcome.product.stock_on_hand,
                    "movement recorded"
                );
                Outcome::Movement(outcome)
            }
            Command::ListMovements(filter) => Outcome::Movements(self.store.list_movements(filter).await?),
            Command::RequestRequisition {
                kind,
                product_id,
                quantity,
                note,
            } => {
                let requisition = self
                    .store
                    .create_requisition(NewRequisition {
                        kind,
                        product_id,
                        requester: requester_of(principal),
                        quantity,
                        note,
                    })
                    .await?;
                info!(code = %requisition.code, kind = kind.as_str(), quantity, "requisition opened");
                Outcome::Requisition(requisition)
            }
            Command::GetRequisition(id) => Outcome::Requisition(self.get_requisition(principal, id).await?),
            Command::ListRequisitions => Outcome::Requisitions(self.store.list_requisitions().await?),
            Command::ApproveRequisition(id) => {
                let approval = self.store.approve_requisition(id, requester_of(principal)).await?;
                info!(
                    code = %approval.requisition.code,
                    stock = approval.product.stock_on_hand,
                    "requisition approved"
                );
                Outcome::Approval(approval)
            }
            Command::DenyRequisition(id) => {
                let denied = self.store.deny_requisition(id, requester_of(principal)).await?;
                info!(code = %denied.code, "requisition denied");
                Outcome::Requisition(denied)
            }
            Command::Dashboard(filter) => {
                let products = self.store.list_products().await?;
                let movements = self.store.list_movements(filter).await?;
                let requisitions = self.store.list_requisitions().await?;
                Outcome::Dashboard(summarize(&products, &movements, &requisitions, filter))
            }
            Command::ExportProducts => {
                let products = self.store.list_products().await?;
                Outcome::Sheet(spreadsheet::products_sheet(&products))
            }
            Command::ExportRequisitions => {
                let requisitions = self.store.list_requisitions().await?;
                let products = self.store.list_products().await?;
                Outcome::Sheet(spreadsheet::requisitions_sheet(&requisitions, &products))
            }
        };
        Ok(outcome)
    }

    /// Reviewers see any requisition; everyone else only their own. A caller
    /// without review rights gets `Forbidden` for ids they do not own, whether
    /// or not the id exists.
    async fn get_requisition(&self, principal: &Principal, id: RequisitionId) -> Result<Requisition, WorkflowError> {
        let review = authorize(principal, &Permission::REQUISITIONS_REVIEW);
        let Err(denied) = review else {
            return Ok(self.store.get_requisition(id).await?);
        };

        match self.store.get_requisition(id).await {
            Ok(r) if r.requester.user_id.as_uuid() == principal.principal_id.as_uuid() => Ok(r),
            Ok(_) | Err(StoreError::Domain(DomainError::NotFound(_))) => Err(denied.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Create one product per valid row. Row problems are collected in the
    /// report; only a storage backend failure stops the batch.
    async fn import_products(&self, csv: &str) -> Result<ImportReport, WorkflowError> {
        let rows = spreadsheet::read_product_rows(csv)?;
        let mut report = ImportReport::default();

        for row in &rows {
            match parse_row(row) {
                Ok(None) => report.skipped += 1,
                Err(failure) => report.failures.push(failure),
                Ok(Some(input)) => match self.store.create_product(input).await {
                    Ok(_) => report.created += 1,
                    Err(StoreError::Domain(e)) => {
                        report.failures.push(ImportRowError::new(row.line, e.to_string()))
                    }
                    Err(StoreError::Backend(msg)) => return Err(WorkflowError::Store(msg)),
                },
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            failed = report.failures.len(),
            "import finished"
        );
        Ok(report)
    }
}
