//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors                                                   │
//! │  └── StoreError       - Record store failures                          │
//! │                                                                         │
//! │  stockroom-ledger errors                                               │
//! │  └── LedgerError      - What the request layer sees                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                        StoreError ──┴─► LedgerError → request layer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the ledger.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    ///
    /// ## When This Occurs
    /// - Selling a product id that was never created or was deleted
    /// - Updating the status of a purchase order or return that is gone
    /// - Creating a return against an unknown sale
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// record_sale(tomatoes, qty: 5)
    ///      │
    ///      ▼
    /// conditional decrement (stock >= 5?) ── no rows affected
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Tomatoes", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Tomatoes in stock"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A status change that would break the stock invariants.
    ///
    /// Received purchase orders and approved returns are terminal: leaving
    /// them would allow the same goods to be credited twice.
    #[error("{entity} {id} is {from}, cannot move to {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// A discount code cannot be applied to this order.
    #[error("Discount {code} cannot be applied: {reason}")]
    DiscountRejected { code: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any store call is made, so a rejected input never
/// leaves a partial write behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric price, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate discount code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
