//! # Ledger Error Type
//!
//! The one error type every ledger operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Ledger operation                                                      │
//! │  Result<T, LedgerError>                                                │
//! │         │                                                               │
//! │         ├── ValidationError ──► CoreError::Validation ─┐               │
//! │         ├── CoreError (NotFound, InsufficientStock) ───┼─► Domain       │
//! │         ├── StoreError (wrapped as-is) ─────────────────┼─► StoreFailure │
//! │         └── stored record won't decode ────────────────┴─► Malformed    │
//! │                                                                         │
//! │  Request layer:                                                        │
//! │    let body = ErrorResponse::from(&err);                               │
//! │    // { "code": "INSUFFICIENT_STOCK",                                  │
//! │    //   "message": "Insufficient stock for Tomatoes: ..." }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The record store failed. Never retried by the ledger.
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// A stored record does not decode into its typed form.
    #[error("Malformed {table} record: {reason}")]
    MalformedRecord { table: &'static str, reason: String },
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Domain(CoreError::Validation(err))
    }
}

impl LedgerError {
    /// Machine-readable category for the request layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Domain(CoreError::NotFound { .. }) => ErrorCode::NotFound,
            LedgerError::Domain(CoreError::InsufficientStock { .. }) => {
                ErrorCode::InsufficientStock
            }
            LedgerError::Domain(CoreError::Validation(_)) => ErrorCode::ValidationError,
            LedgerError::Domain(
                CoreError::InvalidStatusTransition { .. } | CoreError::DiscountRejected { .. },
            ) => ErrorCode::BusinessLogic,
            LedgerError::StoreFailure(StoreError::UniqueViolation { .. }) => {
                ErrorCode::ValidationError
            }
            LedgerError::StoreFailure(_) | LedgerError::MalformedRecord { .. } => {
                ErrorCode::StoreFailure
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::Domain(CoreError::NotFound { .. }))
    }
}

/// Error codes for the request layer.
///
/// ## Usage in a Handler
/// ```rust,ignore
/// match ledger.record_sale(&product_id, qty).await {
///     Ok(sale) => redirect_to_invoice(sale.id),
///     Err(e) => match e.code() {
///         ErrorCode::InsufficientStock => flash_warning(e.to_string()),
///         ErrorCode::NotFound => not_found(),
///         _ => flash_error(e.to_string()),
///     },
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found (404)
    NotFound,

    /// Not enough units to sell
    InsufficientStock,

    /// Input validation failed (400)
    ValidationError,

    /// Business rule refused the operation (422)
    BusinessLogic,

    /// Store or stored data failure (500)
    StoreFailure,
}

/// Serializable error body: a `code` and a human-readable `message`.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: 3fa8..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&LedgerError> for ErrorResponse {
    fn from(err: &LedgerError) -> Self {
        let message = match err {
            // Store details go to the log, not to the user
            LedgerError::StoreFailure(StoreError::UniqueViolation { field, value }) => {
                format!("{} '{}' already exists", field, value)
            }
            LedgerError::StoreFailure(inner) => {
                tracing::error!(error = %inner, "Store operation failed");
                "Store operation failed".to_string()
            }
            LedgerError::MalformedRecord { table, reason } => {
                tracing::error!(table, reason = %reason, "Malformed record");
                "Stored data could not be read".to_string()
            }
            LedgerError::Domain(inner) => inner.to_string(),
        };

        ErrorResponse {
            code: err.code(),
            message,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
