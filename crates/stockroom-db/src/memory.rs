//! # In-Memory Store
//!
//! A `RecordStore` backed by a mutex-guarded map of tables.
//!
//! Every call takes the lock once, so each insert, select, update and
//! delete is atomic exactly like a single SQLite statement. Used by tests
//! and by anything that wants a throwaway ledger.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{
    field_value, Filter, OrderBy, Patch, Record, RecordStore, Table, ID_FIELD,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<Table, Vec<Record>>>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }

    /// Number of records in `table`.
    pub fn len(&self, table: Table) -> StoreResult<usize> {
        Ok(self.lock()?.get(&table).map_or(0, Vec::len))
    }

    pub fn is_empty(&self, table: Table) -> StoreResult<bool> {
        Ok(self.len(table)? == 0)
    }
}

/// Rejects `candidate` if it repeats a unique field of another row.
fn check_unique(
    table: Table,
    rows: &[Record],
    candidate: &Record,
    skip: Option<usize>,
) -> StoreResult<()> {
    for field in table.unique_fields() {
        let value = field_value(candidate, field);
        if value.is_null() {
            continue;
        }
        let clash = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, row)| field_value(row, field) == value);
        if clash {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(StoreError::duplicate(*field, shown));
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, table: Table, mut record: Record) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        record.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut tables = self.lock()?;
        let rows = tables.entry(table).or_default();
        check_unique(table, rows, &record, None)?;
        rows.push(record);

        debug!(table = %table, id = %id, "Inserted record");
        Ok(id)
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<Record>> {
        filter.validate()?;
        let mut rows: Vec<Record> = {
            let tables = self.lock()?;
            tables
                .get(&table)
                .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
                .unwrap_or_default()
        };

        if let Some(order) = order {
            crate::store::validate_field(&order.field)?;
            rows.sort_by(|a, b| order.compare(a, b));
        }

        debug!(table = %table, count = rows.len(), "Selected records");
        Ok(rows)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: &Patch) -> StoreResult<u64> {
        filter.validate()?;
        patch.validate()?;

        let mut tables = self.lock()?;
        let rows = tables.entry(table).or_default();

        // Stage every change first so a failing row leaves the table untouched.
        let mut staged = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if filter.matches(row) {
                let mut next = row.clone();
                patch.apply(&mut next)?;
                check_unique(table, rows, &next, Some(index))?;
                staged.push((index, next));
            }
        }

        let affected = staged.len() as u64;
        for (index, next) in staged {
            rows[index] = next;
        }

        debug!(table = %table, affected, "Updated records");
        Ok(affected)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64> {
        filter.validate()?;

        let mut tables = self.lock()?;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        let affected = (before - rows.len()) as u64;

        debug!(table = %table, affected, "Deleted records");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_id() {
        let store = MemoryStore::new();
        let id = store
            .insert(Table::Products, record(json!({ "id": "ignored", "name": "Milk" })))
            .await
            .unwrap();

        assert_ne!(id, "ignored");
        let rows = store
            .select(Table::Products, &Filter::by_id(&id), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Milk"));
        assert!(store
            .select(Table::Products, &Filter::by_id("ignored"), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_conditional_update() {
        let store = MemoryStore::new();
        let id = store
            .insert(Table::Products, record(json!({ "stock": 5 })))
            .await
            .unwrap();

        let take = |n: i64| {
            (
                Filter::by_id(&id).gte("stock", n),
                Patch::new().increment("stock", -n),
            )
        };

        let (filter, patch) = take(6);
        assert_eq!(store.update(Table::Products, &filter, &patch).await.unwrap(), 0);

        let (filter, patch) = take(5);
        assert_eq!(store.update(Table::Products, &filter, &patch).await.unwrap(), 1);

        let rows = store.select(Table::Products, &Filter::all(), None).await.unwrap();
        assert_eq!(rows[0]["stock"], json!(0));
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_oversell() {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .insert(Table::Products, record(json!({ "stock": 5 })))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        Table::Products,
                        &Filter::by_id(id).gte("stock", 1),
                        &Patch::new().increment("stock", -1),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            succeeded += handle.await.unwrap();
        }
        assert_eq!(succeeded, 5);
    }

    #[tokio::test]
    async fn test_unique_code() {
        let store = MemoryStore::new();
        store
            .insert(Table::Discounts, record(json!({ "code": "SAVE10" })))
            .await
            .unwrap();

        let err = store
            .insert(Table::Discounts, record(json!({ "code": "SAVE10" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(store.len(Table::Discounts).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_select_ordered_and_delete() {
        let store = MemoryStore::new();
        for name in ["Rice", "Apples", "Milk"] {
            store
                .insert(Table::Products, record(json!({ "name": name })))
                .await
                .unwrap();
        }

        let rows = store
            .select(Table::Products, &Filter::all(), Some(&OrderBy::asc("name")))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("Apples"), json!("Milk"), json!("Rice")]);

        let deleted = store
            .delete(Table::Products, &Filter::all().eq("name", "Milk"))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.len(Table::Products).unwrap(), 2);
        assert!(store.is_empty(Table::Sales).unwrap());
    }

    #[tokio::test]
    async fn test_increment_overflow_leaves_row_untouched() {
        let store = MemoryStore::new();
        let id = store
            .insert(Table::Products, record(json!({ "stock": i64::MAX - 10 })))
            .await
            .unwrap();

        let err = store
            .update(
                Table::Products,
                &Filter::by_id(&id),
                &Patch::new().increment("stock", 20),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Overflow(_)));

        let rows = store.select(Table::Products, &Filter::all(), None).await.unwrap();
        assert_eq!(rows[0]["stock"], json!(i64::MAX - 10));
    }

    #[tokio::test]
    async fn test_update_missing_returns_zero() {
        let store = MemoryStore::new();
        let affected = store
            .update(
                Table::PurchaseOrders,
                &Filter::by_id("nope"),
                &Patch::new().set("status", "Received"),
            )
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }
}
