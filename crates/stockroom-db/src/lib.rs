//! # stockroom-db: Record Store for Stockroom
//!
//! The table-oriented store the ledger is injected with, plus its SQLite
//! and in-memory implementations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Ledger::record_sale(product, 2)                                       │
//! │       │                                                                 │
//! │       ▼  Arc<dyn RecordStore>                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    store      │    │  SqliteStore  │    │  Migrations  │  │   │
//! │  │   │               │    │  (pool.rs,    │    │  (embedded)  │  │   │
//! │  │   │ RecordStore   │◄───│   sqlite.rs)  │    │ 001_init.sql │  │   │
//! │  │   │ Filter, Patch │    ├───────────────┤    └──────────────┘  │   │
//! │  │   │ OrderBy       │◄───│  MemoryStore  │                      │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite Database (WAL)                           │   │
//! │  │   products · sales · purchase_orders · returns · ...           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - `RecordStore` trait, `Filter`, `Patch`, `OrderBy`, `Table`
//! - [`pool`] - SQLite pool creation and configuration
//! - [`sqlite`] - `RecordStore` for `SqliteStore`
//! - [`memory`] - `MemoryStore`
//! - [`migrations`] - Embedded migrations
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stockroom_db::{DbConfig, Filter, Patch, RecordStore, SqliteStore, Table};
//!
//! # async fn demo() -> stockroom_db::StoreResult<()> {
//! let store = SqliteStore::new(DbConfig::new("stockroom.db")).await?;
//!
//! // Take 2 units only if 2 are there
//! let taken = store
//!     .update(
//!         Table::Products,
//!         &Filter::by_id("some-id").gte("stock", 2),
//!         &Patch::new().increment("stock", -2),
//!     )
//!     .await?;
//! assert!(taken <= 1);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pool::{DbConfig, SqliteStore};
pub use store::{Change, Condition, Filter, OrderBy, Patch, Record, RecordStore, Table, ID_FIELD};
