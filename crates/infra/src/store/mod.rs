//! Catalog & ledger storage boundary.
//!
//! One trait, two backends: an in-memory store for dev/tests and a Postgres
//! store for persistent deployments. Both run the pure transitions from
//! `stockroom_inventory::ledger` and only persist their results.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

use std::sync::Arc;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::{LedgerStore, StoreError};

use crate::config::StorageConfig;

/// Build the store selected by configuration.
pub async fn connect_store(config: &StorageConfig) -> Result<Arc<dyn LedgerStore>, StoreError> {
    match config {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory ledger store");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!(max_connections, "connecting to postgres ledger store");
            let store = PostgresLedgerStore::connect(url, *max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}
