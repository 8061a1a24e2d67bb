//! Infrastructure layer: storage, configuration, spreadsheet codec, and the
//! workflow that ties authorization to the store.

pub mod config;
pub mod spreadsheet;
pub mod store;
pub mod workflow;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use spreadsheet::{Sheet, SpreadsheetError};
pub use store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, StoreError, connect_store};
pub use workflow::{Command, Outcome, Workflow, WorkflowError, requester_of};
