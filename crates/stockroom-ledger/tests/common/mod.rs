//! Shared helpers for the ledger integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stockroom_core::{Category, Money, NewProduct, Product};
use stockroom_db::{
    Change, DbConfig, Filter, MemoryStore, OrderBy, Patch, Record, RecordStore, SqliteStore,
    StoreError, StoreResult, Table,
};
use stockroom_ledger::{Ledger, LedgerConfig};

/// One ledger per store implementation, labelled for assertion messages.
pub async fn ledgers() -> Vec<(&'static str, Ledger)> {
    let sqlite = SqliteStore::new(DbConfig::in_memory())
        .await
        .expect("in-memory sqlite store");

    vec![
        ("memory", Ledger::in_memory(LedgerConfig::default())),
        (
            "sqlite",
            Ledger::new(Arc::new(sqlite), LedgerConfig::default()),
        ),
    ]
}

pub async fn add_product(ledger: &Ledger, name: &str, price_cents: i64, stock: i64) -> Product {
    ledger
        .add_product(NewProduct {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            category: Category::Vegetables,
            stock,
        })
        .await
        .expect("add product")
}

pub async fn stock_of(ledger: &Ledger, product_id: &str) -> i64 {
    ledger.get_product(product_id).await.expect("product").stock
}

// =============================================================================
// Fault Injection
// =============================================================================

/// A [`MemoryStore`] that fails chosen calls on demand.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    /// Fail every insert into `sales`.
    pub fail_sale_insert: AtomicBool,
    /// Fail every product update that adds stock.
    pub fail_stock_credit: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(FaultyStore::default())
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn adds_stock(patch: &Patch) -> bool {
        patch
            .changes()
            .iter()
            .any(|c| matches!(c, Change::Increment(field, delta) if field == "stock" && *delta > 0))
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn insert(&self, table: Table, record: Record) -> StoreResult<String> {
        if table == Table::Sales && self.fail_sale_insert.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed("disk I/O error".to_string()));
        }
        self.inner.insert(table, record).await
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<Record>> {
        self.inner.select(table, filter, order).await
    }

    async fn update(&self, table: Table, filter: &Filter, patch: &Patch) -> StoreResult<u64> {
        if table == Table::Products
            && Self::adds_stock(patch)
            && self.fail_stock_credit.load(Ordering::SeqCst)
        {
            return Err(StoreError::PoolExhausted);
        }
        self.inner.update(table, filter, patch).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64> {
        self.inner.delete(table, filter).await
    }
}
