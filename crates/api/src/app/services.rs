use std::sync::Arc;

use stockroom_infra::{AppConfig, InMemoryLedgerStore, LedgerStore, StoreError, Workflow, connect_store};

/// Shared request-handling state.
#[derive(Clone)]
pub struct AppServices {
    pub workflow: Workflow<dyn LedgerStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            workflow: Workflow::new(store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()))
    }

    /// Store selected by `USE_PERSISTENT_STORES`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(Self::new(connect_store(&config.storage).await?))
    }
}
