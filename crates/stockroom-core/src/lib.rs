//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Domain types and the rules that keep stock, sales, purchase orders and
//! returns consistent, written as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Request layer (web pages, forms)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed inputs                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stockroom-ledger                             │   │
//! │  │    record_sale, update_order_status, update_return_status ...  │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────┐   ┌───────▼───────────────────┐   │
//! │  │  ★ stockroom-core (THIS CRATE) ★ │   │      stockroom-db         │   │
//! │  │                                  │   │   RecordStore trait       │   │
//! │  │  types   money   validation      │   │   SQLite / in-memory      │   │
//! │  │  report  invoice discount        │   └───────────────────────────┘   │
//! │  │                                  │                                   │
//! │  │  NO I/O • NO STORE • NO CLOCK    │                                   │
//! │  └──────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Sale, PurchaseOrder, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input normalisation and business rule checks
//! - [`report`] - Stock value, low stock, revenue and expense totals
//! - [`invoice`] - Invoice figures for a recorded sale
//! - [`discount`] - Discount applicability and amounts
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::types::TaxRate;
//!
//! let total = Money::from_cents(4000).multiply_quantity(2).unwrap();
//! assert_eq!(total.to_string(), "80.00");
//!
//! let tax = total.calculate_tax(TaxRate::from_bps(500));
//! assert_eq!(tax.cents(), 400);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod invoice;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{Invoice, InvoiceLine};
pub use money::Money;
pub use report::{Dashboard, ExpenseTotals, InventoryListing, InventoryView};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Products at or below this many units count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Invoice tax rate when none is configured (5%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 500;

/// Category given to expenses entered without one.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "General";

/// Products shown in the dashboard quick-glance table.
pub const DASHBOARD_PRODUCT_LIMIT: usize = 8;

pub const INVOICE_PREFIX: &str = "INV-";

/// Invoice line name for a sale whose product has since been deleted.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

/// Shown in listings for references to deleted records.
pub const MISSING_REFERENCE: &str = "-";

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_TEXT_LENGTH: usize = 1000;
pub const MAX_CODE_LENGTH: usize = 32;
