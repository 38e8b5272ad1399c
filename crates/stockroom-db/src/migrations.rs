//! # Database Migrations
//!
//! Embedded SQL migrations for the SQLite record store.
//!
//! ## Schema Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One table per record kind, same two columns everywhere:               │
//! │                                                                         │
//! │    id    TEXT PRIMARY KEY        ← generated by the store (UUID v4)    │
//! │    body  TEXT CHECK(json_valid)  ← the record, minus its id            │
//! │                                                                         │
//! │  Indexes are expressions over the body:                                │
//! │    discounts(json_extract(body,'$.code'))     UNIQUE                   │
//! │    sales(json_extract(body,'$.created_at'))                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. Use `IF NOT EXISTS` where possible
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
