//! # Store Error Types
//!
//! Error types for record store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      MemoryStore checks                    │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  StoreError (this module) ← categorised, same for every store          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerError::StoreFailure ← wrapped, never reinterpreted              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Request layer shows STORE_FAILURE                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Record store errors.
///
/// Missing records are not errors at this layer: `select` returns an empty
/// list and `update`/`delete` report zero rows affected.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in a migration file
    /// - Migration checksum mismatch (an applied file was edited)
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a discount whose code already exists
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A filter, patch or order names a field that cannot be used.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// An increment would take a counter past the i64 range.
    #[error("Integer overflow on {0}")]
    Overflow(String),

    /// A stored body or a value could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → StoreError::PoolExhausted
/// sqlx::Error::PoolClosed     → StoreError::ConnectionFailed
/// sqlx::Error::ColumnDecode   → StoreError::Serialization
/// Other                       → StoreError::Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: index 'idx_discounts_code'"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if let Some(field) = msg.strip_prefix("integer overflow: ") {
                    // Raised by the products_stock_integer trigger
                    StoreError::Overflow(field.to_string())
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Serialization(err.to_string())
            }

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
