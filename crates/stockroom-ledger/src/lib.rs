//! # stockroom-ledger: Inventory Ledger Service
//!
//! One async method per back-office use case, over an injected
//! [`RecordStore`].
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ledger Service                                 │
//! │                                                                         │
//! │  Request layer (forms, JSON, CLI)                                      │
//! │         │  typed inputs: SaleRequest, NewPurchaseOrder, ...            │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Ledger  (Clone + Send + Sync, no in-process locks)              │  │
//! │  │                                                                  │  │
//! │  │  sales       record_sale, list_sales, invoice                    │  │
//! │  │  purchasing  purchase orders, Received credits stock once        │  │
//! │  │  returns     returns, Approved credits stock once                │  │
//! │  │  discounts   registry + lookup                                   │  │
//! │  │  catalog     products, customers, suppliers                      │  │
//! │  │  expenses    expense book                                        │  │
//! │  │  reports     dashboard, inventory views                          │  │
//! │  └───────────────────────────┬──────────────────────────────────────┘  │
//! │                              │  codec: typed ⇄ JSON records            │
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Arc<dyn RecordStore>   SqliteStore | MemoryStore                │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Consistency
//! `stock` is only ever changed by relative increments evaluated inside
//! the store, guarded by a condition in the same call:
//!
//! - sale: `stock >= q` → `stock -= q`
//! - receive / approve: `status != Received` → `status = Received`, then
//!   `stock += q`
//!
//! The one absolute write is [`Ledger::set_stock`], an operator correction.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod discounts;
pub mod error;
pub mod expenses;
pub mod purchasing;
pub mod reports;
pub mod returns;
pub mod sales;
pub mod status;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stockroom_core::CoreError;
use stockroom_db::{Filter, MemoryStore, OrderBy, RecordStore, SqliteStore, Table};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, LedgerConfig};
pub use error::{ErrorCode, ErrorResponse, LedgerError, LedgerResult};
pub use expenses::ExpenseSummary;
pub use purchasing::PurchaseOrderView;
pub use returns::ReturnView;
pub use sales::SalesFilter;
pub use status::StatusChange;

/// The inventory ledger.
///
/// Cheap to clone; clones share the store and configuration.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    config: Arc<LedgerConfig>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, config: LedgerConfig) -> Self {
        Ledger {
            store,
            config: Arc::new(config),
        }
    }

    /// A ledger over a fresh [`MemoryStore`].
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// Opens the SQLite store named by `config` and runs migrations.
    pub async fn open(config: LedgerConfig) -> LedgerResult<Self> {
        info!(
            store = %config.store_name,
            path = %config.database_path.display(),
            "Opening ledger"
        );
        let store = SqliteStore::new(config.db_config()).await?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // =========================================================================
    // Store Helpers
    // =========================================================================

    /// Reads one record by id; `None` if it does not exist.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        id: &str,
    ) -> LedgerResult<Option<T>> {
        debug!(table = %table, id = %id, "Fetching record");
        let mut records = self.store.select(table, &Filter::by_id(id), None).await?;

        match records.pop() {
            Some(record) => Ok(Some(codec::from_record(table, record)?)),
            None => Ok(None),
        }
    }

    /// Reads one record by id; `NotFound` naming `entity` if absent.
    pub(crate) async fn fetch_required<T: DeserializeOwned>(
        &self,
        table: Table,
        entity: &'static str,
        id: &str,
    ) -> LedgerResult<T> {
        self.fetch(table, id)
            .await?
            .ok_or_else(|| CoreError::not_found(entity, id).into())
    }

    pub(crate) async fn fetch_all<T: DeserializeOwned>(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> LedgerResult<Vec<T>> {
        debug!(table = %table, conditions = filter.conditions().len(), "Selecting records");
        self.store
            .select(table, filter, order)
            .await?
            .into_iter()
            .map(|record| codec::from_record(table, record))
            .collect()
    }

    /// Inserts a typed record and returns the id the store assigned.
    pub(crate) async fn insert<T: Serialize>(&self, table: Table, value: &T) -> LedgerResult<String> {
        let record = codec::to_record(table, value)?;
        let id = self.store.insert(table, record).await?;
        debug!(table = %table, id = %id, "Inserted record");
        Ok(id)
    }

    /// Deletes one record by id; `NotFound` naming `entity` if nothing was deleted.
    pub(crate) async fn remove(&self, table: Table, entity: &'static str, id: &str) -> LedgerResult<()> {
        let rows = self.store.delete(table, &Filter::by_id(id)).await?;
        if rows == 0 {
            return Err(CoreError::not_found(entity, id).into());
        }

        info!(table = %table, id = %id, "Deleted record");
        Ok(())
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom_ledger=trace` - Trace the ledger only
/// - Default: `info,stockroom=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
