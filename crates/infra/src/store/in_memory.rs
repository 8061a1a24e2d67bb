use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::{DomainError, Entity, ProductId, RequisitionId};
use stockroom_inventory::{
    Approval, MovementFilter, MovementKind, MovementOutcome, NewProduct, NewRequisition, Product,
    ProductUpdate, Requester, Requisition, RequisitionCode, StockMovement, ledger,
};

use super::r#trait::{LedgerStore, StoreError};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    movements: Vec<StockMovement>,
    requisitions: HashMap<RequisitionId, Requisition>,
    codes: HashSet<RequisitionCode>,
}

impl State {
    fn product(&self, id: ProductId) -> Result<&Product, StoreError> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    fn requisition(&self, id: RequisitionId) -> Result<&Requisition, StoreError> {
        self.requisitions
            .get(&id)
            .ok_or_else(|| DomainError::not_found("requisition").into())
    }

    fn put_product(&mut self, product: &Product) {
        self.products.insert(*product.id(), product.clone());
    }

    fn put_requisition(&mut self, requisition: &Requisition) {
        self.requisitions.insert(*requisition.id(), requisition.clone());
    }

    fn fresh_code(&self) -> Result<RequisitionCode, StoreError> {
        for _ in 0..8 {
            let code = RequisitionCode::generate();
            if !self.codes.contains(&code) {
                return Ok(code);
            }
        }
        Err(DomainError::conflict("could not allocate a unique requisition code").into())
    }
}

/// In-memory catalog & ledger.
///
/// Intended for tests/dev. Every operation holds the single write lock for its
/// whole read-transition-write sequence, which makes transitions atomic and
/// serializes concurrent approvals.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError> {
        let product = input.into_product(ProductId::new(), Utc::now())?;
        self.write()?.put_product(&product);
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.read()?.product(id).cloned()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.read()?.products.values().cloned().collect();
        products.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(products)
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, StoreError> {
        let mut state = self.write()?;
        let next = update.apply_to(state.product(id)?)?;
        state.put_product(&next);
        Ok(next)
    }

    async fn apply_movement(
        &self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
    ) -> Result<MovementOutcome, StoreError> {
        let mut state = self.write()?;
        let outcome = ledger::apply_movement(state.product(product_id)?, kind, quantity, Utc::now())?;

        state.put_product(&outcome.product);
        state.movements.push(outcome.movement.clone());
        Ok(outcome)
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let mut movements: Vec<StockMovement> = self
            .read()?
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        movements.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then_with(|| b.id.cmp(&a.id)));
        Ok(movements)
    }

    async fn create_requisition(&self, input: NewRequisition) -> Result<Requisition, StoreError> {
        let mut state = self.write()?;
        state.product(input.product_id)?;

        let code = state.fresh_code()?;
        let requisition = input.into_requisition(RequisitionId::new(), code.clone(), Utc::now())?;

        state.codes.insert(code);
        state.put_requisition(&requisition);
        Ok(requisition)
    }

    async fn get_requisition(&self, id: RequisitionId) -> Result<Requisition, StoreError> {
        self.read()?.requisition(id).cloned()
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>, StoreError> {
        let mut requisitions: Vec<Requisition> = self.read()?.requisitions.values().cloned().collect();
        requisitions.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then_with(|| b.id.cmp(&a.id)));
        Ok(requisitions)
    }

    async fn approve_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Approval, StoreError> {
        let mut state = self.write()?;
        let requisition = state.requisition(id)?;
        let product = state.product(requisition.product_id)?;

        let approval = ledger::approve(requisition, product, &reviewer, Utc::now())?;

        state.put_product(&approval.product);
        state.movements.push(approval.movement.clone());
        state.put_requisition(&approval.requisition);
        Ok(approval)
    }

    async fn deny_requisition(&self, id: RequisitionId, reviewer: Requester) -> Result<Requisition, StoreError> {
        let mut state = self.write()?;
        let denied = ledger::deny(state.requisition(id)?, &reviewer, Utc::now())?;
        state.put_requisition(&denied);
        Ok(denied)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use stockroom_core::UserId;
    use stockroom_inventory::{RequisitionKind, RequisitionStatus};

    use super::*;

    fn person(name: &str) -> Requester {
        Requester {
            user_id: UserId::new(),
            username: name.to_string(),
        }
    }

    async fn seeded(stock: i64, min: i64) -> (InMemoryLedgerStore, Product) {
        let store = InMemoryLedgerStore::new();
        let product = store
            .create_product(NewProduct {
                name: "Gloves".to_string(),
                stock_on_hand: stock,
                minimum_stock: min,
                unit_price: Decimal::new(990, 2),
            })
            .await
            .unwrap();
        (store, product)
    }

    async fn request(store: &InMemoryLedgerStore, product: &Product, quantity: i64) -> Requisition {
        store
            .create_requisition(NewRequisition {
                kind: RequisitionKind::Withdrawal,
                product_id: product.id,
                requester: person("worker"),
                quantity,
                note: Some("for line 3".to_string()),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn withdrawal_walkthrough() {
        let (store, product) = seeded(10, 2).await;
        let req = request(&store, &product, 4).await;
        assert_eq!(req.status, RequisitionStatus::Pending);

        let approval = store.approve_requisition(req.id, person("boss")).await.unwrap();
        assert_eq!(approval.product.stock_on_hand, 6);
        assert_eq!(store.get_product(product.id).await.unwrap().stock_on_hand, 6);

        let movements = store.list_movements(MovementFilter::default()).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Outbound);
        assert_eq!(movements[0].quantity, 4);
        assert_eq!(movements[0].requisition_id, Some(req.id));

        let err = store.approve_requisition(req.id, person("boss")).await.unwrap_err();
        assert_eq!(err, StoreError::Domain(DomainError::already_processed(RequisitionStatus::Approved)));
        assert_eq!(store.get_product(product.id).await.unwrap().stock_on_hand, 6);
        assert_eq!(store.list_movements(MovementFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updates_replace_records_under_their_id() {
        let (store, product) = seeded(5, 1).await;
        let update = ProductUpdate {
            name: Some("Nitrile gloves".to_string()),
            ..ProductUpdate::default()
        };
        store.update_product(product.id, update).await.unwrap();
        store.apply_movement(product.id, MovementKind::Inbound, 2).await.unwrap();

        let req = request(&store, &product, 1).await;
        store.deny_requisition(req.id, person("boss")).await.unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Nitrile gloves");
        assert_eq!(products[0].stock_on_hand, 7);

        let requisitions = store.list_requisitions().await.unwrap();
        assert_eq!(requisitions.len(), 1);
        assert_eq!(requisitions[0].status, RequisitionStatus::Denied);
    }

    #[tokio::test]
    async fn failed_outbound_leaves_no_trace() {
        let (store, product) = seeded(3, 0).await;
        let err = store
            .apply_movement(product.id, MovementKind::Outbound, 4)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Domain(DomainError::insufficient_stock(4, 3)));
        assert_eq!(store.get_product(product.id).await.unwrap().stock_on_hand, 3);
        assert!(store.list_movements(MovementFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deny_never_touches_stock() {
        let (store, product) = seeded(5, 0).await;
        let req = request(&store, &product, 5).await;

        let denied = store.deny_requisition(req.id, person("boss")).await.unwrap();
        assert_eq!(denied.status, RequisitionStatus::Denied);
        assert_eq!(store.get_product(product.id).await.unwrap().stock_on_hand, 5);

        let err = store.deny_requisition(req.id, person("boss")).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::AlreadyProcessed { .. })));
        let err = store.approve_requisition(req.id, person("boss")).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::AlreadyProcessed { .. })));
    }

    #[tokio::test]
    async fn requisition_for_unknown_product_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .create_requisition(NewRequisition {
                kind: RequisitionKind::ServiceOrder,
                product_id: ProductId::new(),
                requester: person("worker"),
                quantity: 1,
                note: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Domain(DomainError::not_found("product")));
    }

    #[tokio::test]
    async fn listings_are_ordered() {
        let store = InMemoryLedgerStore::new();
        for name in ["boots", "Apron", "cap"] {
            store
                .create_product(NewProduct {
                    name: name.to_string(),
                    stock_on_hand: 1,
                    minimum_stock: 0,
                    unit_price: Decimal::ZERO,
                })
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Apron", "boots", "cap"]);

        let product = store.list_products().await.unwrap().remove(0);
        let first = request(&store, &product, 1).await;
        let second = request(&store, &product, 1).await;
        let listed = store.list_requisitions().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_ne!(first.code, second.code);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_approvals_never_oversell() {
        let (store, product) = seeded(10, 0).await;
        let store = Arc::new(store);

        let mut ids = Vec::new();
        for _ in 0..8 {
            ids.push(request(&store, &product, 3).await.id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move { store.approve_requisition(id, person("boss")).await })
            })
            .collect();

        let mut approved = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                approved += 1;
            }
        }

        // 10 units / 3 per request → exactly three approvals fit.
        assert_eq!(approved, 3);
        assert_eq!(store.get_product(product.id).await.unwrap().stock_on_hand, 1);
    }
}
