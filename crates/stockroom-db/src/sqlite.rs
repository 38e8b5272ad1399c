//! # SQLite Record Store
//!
//! `RecordStore` over the JSON-document tables created by the migrations.
//!
//! ## Query Translation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Filter::by_id(p).gte("stock", 2)                                      │
//! │    → WHERE id IS ? AND json_extract(body, '$.stock') >= ?              │
//! │                                                                         │
//! │  Patch::new().set("status", "Received").increment("stock", -2)         │
//! │    → SET body = json_set(body,                                         │
//! │          '$.status', json(?),                                          │
//! │          '$.stock',  COALESCE(json_extract(body, '$.stock'), 0) + ?)   │
//! │                                                                         │
//! │  OrderBy::desc("created_at")                                           │
//! │    → ORDER BY json_extract(body, '$.created_at') DESC, rowid           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation is one SQL statement, so a conditional update is
//! atomic: SQLite checks the WHERE clause and writes under one lock.
//! Field names are validated before they are spliced into a JSON path;
//! values are always bound.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::pool::SqliteStore;
use crate::store::{
    validate_field, Change, Condition, Filter, OrderBy, Patch, Record, RecordStore, Table,
    ID_FIELD,
};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A value bound to a `?` placeholder.
enum Bind<'a> {
    Value(&'a Value),
    Json(String),
    Int(i64),
}

// =============================================================================
// SQL Building
// =============================================================================

fn field_expr(field: &str) -> String {
    if field == ID_FIELD {
        ID_FIELD.to_string()
    } else {
        format!("json_extract(body, '$.{}')", field)
    }
}

/// Builds ` WHERE ...` (or nothing) and collects its binds.
fn where_clause<'a>(filter: &'a Filter, binds: &mut Vec<Bind<'a>>) -> StoreResult<String> {
    filter.validate()?;
    if filter.conditions().is_empty() {
        return Ok(String::new());
    }

    let parts: Vec<String> = filter
        .conditions()
        .iter()
        .map(|condition| {
            let op = match condition {
                Condition::Eq(..) => "IS",
                Condition::Ne(..) => "IS NOT",
                Condition::Gte(..) => ">=",
                Condition::Lte(..) => "<=",
            };
            binds.push(Bind::Value(condition.value()));
            format!("{} {} ?", field_expr(condition.field()), op)
        })
        .collect();

    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn order_clause(order: Option<&OrderBy>) -> StoreResult<String> {
    match order {
        None => Ok(" ORDER BY rowid".to_string()),
        Some(order) => {
            validate_field(&order.field)?;
            let direction = if order.descending { "DESC" } else { "ASC" };
            Ok(format!(
                " ORDER BY {} {}, rowid",
                field_expr(&order.field),
                direction
            ))
        }
    }
}

fn set_clause<'a>(patch: &'a Patch, binds: &mut Vec<Bind<'a>>) -> StoreResult<String> {
    patch.validate()?;

    let mut pairs = Vec::with_capacity(patch.changes().len());
    for change in patch.changes() {
        match change {
            Change::Set(field, value) => {
                binds.push(Bind::Json(serde_json::to_string(value)?));
                pairs.push(format!("'$.{}', json(?)", field));
            }
            Change::Increment(field, delta) => {
                binds.push(Bind::Int(*delta));
                pairs.push(format!(
                    "'$.{}', COALESCE(json_extract(body, '$.{}'), 0) + ?",
                    field, field
                ));
            }
        }
    }

    Ok(format!("body = json_set(body, {})", pairs.join(", ")))
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, binds: Vec<Bind<'q>>) -> SqliteQuery<'q> {
    for bind in binds {
        query = match bind {
            Bind::Int(i) => query.bind(i),
            Bind::Json(text) => query.bind(text),
            Bind::Value(Value::Null) => query.bind(None::<String>),
            Bind::Value(Value::Bool(b)) => query.bind(i64::from(*b)),
            Bind::Value(Value::Number(n)) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            Bind::Value(Value::String(s)) => query.bind(s.as_str()),
            Bind::Value(other) => query.bind(other.to_string()),
        };
    }
    query
}

// =============================================================================
// RecordStore
// =============================================================================

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, table: Table, mut record: Record) -> StoreResult<String> {
        record.remove(ID_FIELD);
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(&record)?;

        let sql = format!("INSERT INTO {} (id, body) VALUES (?, ?)", table.name());
        debug!(table = %table, id = %id, "Inserting record");

        sqlx::query(&sql)
            .bind(id.as_str())
            .bind(body)
            .execute(self.pool())
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::UniqueViolation { field, .. } => {
                    let value = table
                        .unique_fields()
                        .iter()
                        .find_map(|f| record.get(*f))
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    StoreError::duplicate(field, value)
                }
                other => other,
            })?;

        Ok(id)
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<Record>> {
        let mut binds = Vec::new();
        let sql = format!(
            "SELECT id, body FROM {}{}{}",
            table.name(),
            where_clause(filter, &mut binds)?,
            order_clause(order)?
        );
        debug!(table = %table, sql = %sql, "Selecting records");

        let rows = bind_all(sqlx::query(&sql), binds)
            .fetch_all(self.pool())
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let body: String = row.try_get("body")?;
            let mut record: Record = serde_json::from_str(&body)?;
            record.insert(ID_FIELD.to_string(), Value::String(id));
            records.push(record);
        }

        Ok(records)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: &Patch) -> StoreResult<u64> {
        let mut binds = Vec::new();
        let set = set_clause(patch, &mut binds)?;
        let sql = format!(
            "UPDATE {} SET {}{}",
            table.name(),
            set,
            where_clause(filter, &mut binds)?
        );
        debug!(table = %table, sql = %sql, "Updating records");

        let result = bind_all(sqlx::query(&sql), binds)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64> {
        let mut binds = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            table.name(),
            where_clause(filter, &mut binds)?
        );
        debug!(table = %table, sql = %sql, "Deleting records");

        let result = bind_all(sqlx::query(&sql), binds)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    async fn store() -> SqliteStore {
        SqliteStore::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_where_clause() {
        let filter = Filter::by_id("p1").gte("stock", 2);
        let mut binds = Vec::new();
        let sql = where_clause(&filter, &mut binds).unwrap();
        assert_eq!(sql, " WHERE id IS ? AND json_extract(body, '$.stock') >= ?");
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_set_clause() {
        let patch = Patch::new().set("status", "Received").increment("stock", 20);
        let mut binds = Vec::new();
        let sql = set_clause(&patch, &mut binds).unwrap();
        assert_eq!(
            sql,
            "body = json_set(body, '$.status', json(?), \
             '$.stock', COALESCE(json_extract(body, '$.stock'), 0) + ?)"
        );
    }

    #[test]
    fn test_rejects_injection_in_field_names() {
        let mut binds = Vec::new();
        let filter = Filter::all().eq("x') OR 1=1 --", 1);
        assert!(matches!(
            where_clause(&filter, &mut binds),
            Err(StoreError::InvalidField(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_and_select_round_trip() {
        let store = store().await;
        let id = store
            .insert(
                Table::Products,
                record(json!({ "name": "Milk", "price": 5500, "stock": 4, "fresh": true })),
            )
            .await
            .unwrap();

        let rows = store
            .select(Table::Products, &Filter::by_id(&id), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(id));
        assert_eq!(rows[0]["price"], json!(5500));
        assert_eq!(rows[0]["fresh"], json!(true));

        let fresh = store
            .select(Table::Products, &Filter::all().eq("fresh", true), None)
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let store = store().await;
        let id = store
            .insert(Table::Products, record(json!({ "stock": 5 })))
            .await
            .unwrap();

        let too_many = store
            .update(
                Table::Products,
                &Filter::by_id(&id).gte("stock", 6),
                &Patch::new().increment("stock", -6),
            )
            .await
            .unwrap();
        assert_eq!(too_many, 0);

        let exact = store
            .update(
                Table::Products,
                &Filter::by_id(&id).gte("stock", 5),
                &Patch::new().increment("stock", -5),
            )
            .await
            .unwrap();
        assert_eq!(exact, 1);

        let rows = store.select(Table::Products, &Filter::all(), None).await.unwrap();
        assert_eq!(rows[0]["stock"], json!(0));
    }

    #[tokio::test]
    async fn test_stock_overflow_is_refused() {
        let store = store().await;
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
        assert!(matches!(err, StoreError::Overflow(ref field) if field == "stock"));

        let rows = store.select(Table::Products, &Filter::all(), None).await.unwrap();
        assert_eq!(rows[0]["stock"], json!(i64::MAX - 10));
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let store = store().await;
        let id = store
            .insert(
                Table::PurchaseOrders,
                record(json!({ "status": "Pending", "quantity": 20 })),
            )
            .await
            .unwrap();

        let cas = || {
            (
                Filter::by_id(id.clone()).ne("status", "Received"),
                Patch::new().set("status", "Received"),
            )
        };

        let (filter, patch) = cas();
        assert_eq!(
            store.update(Table::PurchaseOrders, &filter, &patch).await.unwrap(),
            1
        );
        let (filter, patch) = cas();
        assert_eq!(
            store.update(Table::PurchaseOrders, &filter, &patch).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_field_filters() {
        let store = store().await;
        store
            .insert(Table::Sales, record(json!({ "quantity": 1 })))
            .await
            .unwrap();

        let with_null = store
            .select(
                Table::Sales,
                &Filter::all().eq("discount_code", Value::Null),
                None,
            )
            .await
            .unwrap();
        assert_eq!(with_null.len(), 1);

        let ne = store
            .select(Table::Sales, &Filter::all().ne("status", "Received"), None)
            .await
            .unwrap();
        assert_eq!(ne.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_discount_code() {
        let store = store().await;
        store
            .insert(Table::Discounts, record(json!({ "code": "SAVE10" })))
            .await
            .unwrap();

        let err = store
            .insert(Table::Discounts, record(json!({ "code": "SAVE10" })))
            .await
            .unwrap_err();
        match err {
            StoreError::UniqueViolation { value, .. } => assert_eq!(value, "SAVE10"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_and_delete() {
        let store = store().await;
        for (name, at) in [
            ("b", "2024-02-01T10:00:00.000000Z"),
            ("c", "2024-02-01T12:00:00.000000Z"),
            ("a", "2024-02-01T11:00:00.000000Z"),
        ] {
            store
                .insert(Table::Sales, record(json!({ "name": name, "created_at": at })))
                .await
                .unwrap();
        }

        let rows = store
            .select(Table::Sales, &Filter::all(), Some(&OrderBy::desc("created_at")))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);

        let deleted = store
            .delete(
                Table::Sales,
                &Filter::all().lte("created_at", "2024-02-01T11:00:00.000000Z"),
            )
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_patching_id_is_rejected() {
        let store = store().await;
        let err = store
            .update(
                Table::Products,
                &Filter::all(),
                &Patch::new().set("id", "other"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(_)));
    }
}
