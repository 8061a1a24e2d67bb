//! Postgres-backed catalog & ledger.
//!
//! ## Transactions
//!
//! Stock-changing operations run in one transaction and take row locks with
//! `SELECT … FOR UPDATE` before reading the values they transform:
//!
//! - `apply_movement`: locks the product row
//! - `approve_requisition`: locks the requisition row, then the product row
//!
//! Locks are always taken in that order (requisition before product), so two
//! transitions cannot deadlock each other. Returning early drops the
//! transaction, which rolls it back.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | StoreError |
//! |-----------------|------------|
//! | `23505` unique violation | `Domain(Conflict)` |
//! | `23503` foreign key violation | `Domain(NotFound)` (only where a product is referenced) |
//! | `23514` check violation | `Domain(Validation)` |
//! | anything else | `Backend` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::{DomainError, MovementId, ProductId, RequisitionId, UserId};
use stockroom_inventory::{
    Approval, MovementFilter, MovementKind, MovementOutcome, NewProduct, NewRequisition, Product,
    ProductUpdate, Requester, Requisition, RequisitionCode, StockMovement, ledger,
};

use super::r#trait::{LedgerStore, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, stock_on_hand, minimum_stock, unit_price, created_at";
const MOVEMENT_COLUMNS: &str = "id, product_id, kind, quantity, occurred_at, requisition_id";
const REQUISITION_COLUMNS: &str = "id, code, kind, product_id, requester_id, requester_username, \
     quantity, status, note, requested_at, resolved_at, resolved_by_id, resolved_by_username";

/// How many fresh codes to try before giving up on a requisition insert.
const CODE_ATTEMPTS: usize = 4;

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, input), err)]
    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError> {
        let product = input.into_product(ProductId::new(), Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, stock_on_hand, minimum_stock, unit_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.stock_on_hand)
        .bind(product.minimum_stock)
        .bind(product.unit_price)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let row: Option<ProductRecord> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get_product", e))?;

        row.map(Product::from)
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRecord> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY lower(name), id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, update), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, StoreError> {
        let mut tx = self.begin().await?;
        let current = lock_product(&mut tx, id).await?;
        let next = update.apply_to(&current)?;

        sqlx::query("UPDATE products SET name = $2, minimum_stock = $3, unit_price = $4 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&next.name)
            .bind(next.minimum_stock)
            .bind(next.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(next)
    }

    #[instrument(skip(self), fields(product_id = %product_id, kind = %kind), err)]
    async fn apply_movement(
        &self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
    ) -> Result<MovementOutcome, StoreError> {
        let mut tx = self.begin().await?;
        let product = lock_product(&mut tx, product_id).await?;

        let outcome = ledger::apply_movement(&product, kind, quantity, Utc::now())?;

        write_stock(&mut tx, &outcome.product).await?;
        insert_movement(&mut tx, &outcome.movement).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(outcome)
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let rows: Vec<MovementRecord> = sqlx::query_as(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE ($1::date IS NULL OR (occurred_at AT TIME ZONE 'UTC')::date >= $1)
              AND ($2::date IS NULL OR (occurred_at AT TIME ZONE 'UTC')::date <= $2)
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY occurred_at DESC, id DESC
            "#
        ))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.kind.map(MovementKind::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id, quantity = input.quantity), err)]
    async fn create_requisition(&self, input: NewRequisition) -> Result<Requisition, StoreError> {
        let id = RequisitionId::new();
        let requested_at = Utc::now();

        for _ in 0..CODE_ATTEMPTS {
            let requisition =
                input
                    .clone()
                    .into_requisition(id, RequisitionCode::generate(), requested_at)?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO requisitions (
                    id, code, kind, product_id, requester_id, requester_username,
                    quantity, status, note, requested_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(requisition.id.as_uuid())
            .bind(requisition.code.as_str())
            .bind(requisition.kind.as_str())
            .bind(requisition.product_id.as_uuid())
            .bind(requisition.requester.user_id.as_uuid())
            .bind(&requisition.requester.username)
            .bind(requisition.quantity)
            .bind(requisition.status.as_str())
            .bind(requisition.note.as_deref())
            .bind(requisition.requested_at)
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => return Ok(requisition),
                Err(e) => match pg_code(&e).as_deref() {
                    // Code collision: draw another one.
                    Some("23505") => continue,
                    Some("23503") => return Err(DomainError::not_found("product").into()),
                    _ => return Err(map_sqlx_error("insert_requisition", e)),
                },
            }
        }

        Err(DomainError::conflict("could not allocate a unique requisition code").into())
    }

    #[instrument(skip(self), fields(requisition_id = %id), err)]
    async fn get_requisition(&self, id: RequisitionId) -> Result<Requisition, StoreError> {
        let row: Option<RequisitionRecord> = sqlx::query_as(&format!(
            "SELECT {REQUISITION_COLUMNS} FROM requisitions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_requisition", e))?;

        match row {
            Some(row) => Requisition::try_from(row),
            None => Err(DomainError::not_found("requisition").into()),
        }
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>, StoreError> {
        let rows: Vec<RequisitionRecord> = sqlx::query_as(&format!(
            "SELECT {REQUISITION_COLUMNS} FROM requisitions ORDER BY requested_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_requisitions", e))?;

        rows.into_iter().map(Requisition::try_from).collect()
    }

    #[instrument(skip(self, reviewer), fields(requisition_id = %id, reviewer = %reviewer.username), err)]
    async fn approve_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Approval, StoreError> {
        let mut tx = self.begin().await?;
        let requisition = lock_requisition(&mut tx, id).await?;
        let product = lock_product(&mut tx, requisition.product_id).await?;

        let approval = ledger::approve(&requisition, &product, &reviewer, Utc::now())?;

        write_stock(&mut tx, &approval.product).await?;
        insert_movement(&mut tx, &approval.movement).await?;
        write_resolution(&mut tx, &approval.requisition).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(approval)
    }

    #[instrument(skip(self, reviewer), fields(requisition_id = %id, reviewer = %reviewer.username), err)]
    async fn deny_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Requisition, StoreError> {
        let mut tx = self.begin().await?;
        let requisition = lock_requisition(&mut tx, id).await?;

        let denied = ledger::deny(&requisition, &reviewer, Utc::now())?;
        write_resolution(&mut tx, &denied).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(denied)
    }
}

async fn lock_product(tx: &mut Transaction<'_, Postgres>, id: ProductId) -> Result<Product, StoreError> {
    let row: Option<ProductRecord> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_product", e))?;

    row.map(Product::from)
        .ok_or_else(|| DomainError::not_found("product").into())
}

async fn lock_requisition(
    tx: &mut Transaction<'_, Postgres>,
    id: RequisitionId,
) -> Result<Requisition, StoreError> {
    let row: Option<RequisitionRecord> = sqlx::query_as(&format!(
        "SELECT {REQUISITION_COLUMNS} FROM requisitions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_requisition", e))?;

    match row {
        Some(row) => Requisition::try_from(row),
        None => Err(DomainError::not_found("requisition").into()),
    }
}

async fn write_stock(tx: &mut Transaction<'_, Postgres>, product: &Product) -> Result<(), StoreError> {
    sqlx::query("UPDATE products SET stock_on_hand = $2 WHERE id = $1")
        .bind(product.id.as_uuid())
        .bind(product.stock_on_hand)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("write_stock", e))?;
    Ok(())
}

async fn insert_movement(tx: &mut Transaction<'_, Postgres>, movement: &StockMovement) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, kind, quantity, occurred_at, requisition_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(movement.id.as_uuid())
    .bind(movement.product_id.as_uuid())
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(movement.occurred_at)
    .bind(movement.requisition_id.map(Uuid::from))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_movement", e))?;
    Ok(())
}

async fn write_resolution(tx: &mut Transaction<'_, Postgres>, requisition: &Requisition) -> Result<(), StoreError> {
    let reviewer = requisition.resolved_by.as_ref();
    sqlx::query(
        r#"
        UPDATE requisitions
        SET status = $2, resolved_at = $3, resolved_by_id = $4, resolved_by_username = $5
        WHERE id = $1
        "#,
    )
    .bind(requisition.id.as_uuid())
    .bind(requisition.status.as_str())
    .bind(requisition.resolved_at)
    .bind(reviewer.map(|r| *r.user_id.as_uuid()))
    .bind(reviewer.map(|r| r.username.as_str()))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("write_resolution", e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ProductRecord {
    id: Uuid,
    name: String,
    stock_on_hand: i64,
    minimum_stock: i64,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<ProductRecord> for Product {
    fn from(row: ProductRecord) -> Self {
        Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            stock_on_hand: row.stock_on_hand,
            minimum_stock: row.minimum_stock,
            unit_price: row.unit_price,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRecord {
    id: Uuid,
    product_id: Uuid,
    kind: String,
    quantity: i64,
    occurred_at: DateTime<Utc>,
    requisition_id: Option<Uuid>,
}

impl TryFrom<MovementRecord> for StockMovement {
    type Error = StoreError;

    fn try_from(row: MovementRecord) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: MovementId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            kind: row.kind.parse().map_err(corrupt_row)?,
            quantity: row.quantity,
            occurred_at: row.occurred_at,
            requisition_id: row.requisition_id.map(RequisitionId::from_uuid),
        })
    }
}

#[derive(Debug, FromRow)]
struct RequisitionRecord {
    id: Uuid,
    code: String,
    kind: String,
    product_id: Uuid,
    requester_id: Uuid,
    requester_username: String,
    quantity: i64,
    status: String,
    note: Option<String>,
    requested_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by_id: Option<Uuid>,
    resolved_by_username: Option<String>,
}

impl TryFrom<RequisitionRecord> for Requisition {
    type Error = StoreError;

    fn try_from(row: RequisitionRecord) -> Result<Self, Self::Error> {
        let resolved_by = match (row.resolved_by_id, row.resolved_by_username) {
            (Some(id), Some(username)) => Some(Requester {
                user_id: UserId::from_uuid(id),
                username,
            }),
            _ => None,
        };

        Ok(Requisition {
            id: RequisitionId::from_uuid(row.id),
            code: RequisitionCode::parse(&row.code).map_err(corrupt_row)?,
            kind: row.kind.parse().map_err(corrupt_row)?,
            product_id: ProductId::from_uuid(row.product_id),
            requester: Requester {
                user_id: UserId::from_uuid(row.requester_id),
                username: row.requester_username,
            },
            quantity: row.quantity,
            status: row.status.parse().map_err(corrupt_row)?,
            note: row.note,
            requested_at: row.requested_at,
            resolved_at: row.resolved_at,
            resolved_by,
        })
    }
}

fn corrupt_row(err: DomainError) -> StoreError {
    StoreError::backend(format!("corrupt row: {err}"))
}

fn pg_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => DomainError::conflict(msg).into(),
                Some("23514") | Some("22003") => DomainError::validation(msg).into(),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(format!("connection pool closed in {operation}")),
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use stockroom_inventory::{RequisitionKind, RequisitionStatus};

    use super::*;

    fn requisition_row() -> RequisitionRecord {
        RequisitionRecord {
            id: Uuid::now_v7(),
            code: "0A1B2C3D4E5F".to_string(),
            kind: "service_order".to_string(),
            product_id: Uuid::now_v7(),
            requester_id: Uuid::now_v7(),
            requester_username: "worker".to_string(),
            quantity: 3,
            status: "denied".to_string(),
            note: None,
            requested_at: Utc::now(),
            resolved_at: Some(Utc::now()),
            resolved_by_id: Some(Uuid::now_v7()),
            resolved_by_username: Some("boss".to_string()),
        }
    }

    #[test]
    fn requisition_row_maps_to_domain() {
        let r = Requisition::try_from(requisition_row()).unwrap();
        assert_eq!(r.kind, RequisitionKind::ServiceOrder);
        assert_eq!(r.status, RequisitionStatus::Denied);
        assert_eq!(r.code.as_str(), "0A1B2C3D4E5F");
        assert_eq!(r.resolved_by.unwrap().username, "boss");
    }

    #[test]
    fn corrupt_rows_are_backend_errors() {
        let mut row = requisition_row();
        row.status = "lost".to_string();
        assert!(matches!(Requisition::try_from(row), Err(StoreError::Backend(_))));

        let movement = MovementRecord {
            id: Uuid::now_v7(),
            product_id: Uuid::now_v7(),
            kind: "sideways".to_string(),
            quantity: 1,
            occurred_at: Utc::now(),
            requisition_id: None,
        };
        assert!(matches!(StockMovement::try_from(movement), Err(StoreError::Backend(_))));
    }

    #[derive(Debug)]
    struct PgError(&'static str);

    impl std::fmt::Display for PgError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "pg error {}", self.0)
        }
    }

    impl std::error::Error for PgError {}

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            "numeric field overflow"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgError(code)))
    }

    #[test]
    fn sqlstate_codes_map_to_domain_errors() {
        assert!(matches!(
            map_sqlx_error("create_product", db_error("22003")),
            StoreError::Domain(DomainError::Validation(_))
        ));
        assert!(matches!(
            map_sqlx_error("create_product", db_error("23514")),
            StoreError::Domain(DomainError::Validation(_))
        ));
        assert!(matches!(
            map_sqlx_error("create_requisition", db_error("23505")),
            StoreError::Domain(DomainError::Conflict(_))
        ));
        assert!(matches!(
            map_sqlx_error("create_product", db_error("40P01")),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn pool_errors_are_backend_errors() {
        assert_eq!(
            map_sqlx_error("get_product", sqlx::Error::PoolClosed),
            StoreError::backend("connection pool closed in get_product")
        );
        assert!(matches!(
            map_sqlx_error("get_product", sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }
}
