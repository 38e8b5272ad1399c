//! Typed records ⇄ store records.
//!
//! The store speaks `serde_json` objects; the ledger speaks the typed
//! records from `stockroom-core`. Every conversion goes through here so a
//! record that no longer decodes is reported as `MalformedRecord` with the
//! table it came from.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stockroom_db::{Record, Table, ID_FIELD};

use crate::error::{LedgerError, LedgerResult};

/// Current time at the precision timestamps are stored with, so a value
/// returned from an insert equals the same record read back.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Encodes a typed record. The `id` field is dropped; the store assigns it.
pub fn to_record<T: Serialize>(table: Table, value: &T) -> LedgerResult<Record> {
    match to_value(table, value)? {
        Value::Object(mut map) => {
            map.remove(ID_FIELD);
            Ok(map)
        }
        other => Err(LedgerError::MalformedRecord {
            table: table.name(),
            reason: format!("expected an object, got {other}"),
        }),
    }
}

/// Decodes a stored record into its typed form.
pub fn from_record<T: DeserializeOwned>(table: Table, record: Record) -> LedgerResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| LedgerError::MalformedRecord {
        table: table.name(),
        reason: e.to_string(),
    })
}

/// Encodes a single field value for a filter or patch.
pub fn to_value<T: Serialize>(table: Table, value: &T) -> LedgerResult<Value> {
    serde_json::to_value(value).map_err(|e| LedgerError::MalformedRecord {
        table: table.name(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_core::{Category, Money, Product, PurchaseOrderStatus};

    #[test]
    fn test_round_trip_drops_id_on_encode() {
        let product = Product {
            id: "ignored".to_string(),
            name: "Milk".to_string(),
            price: Money::from_cents(4000),
            category: Category::Dairy,
            stock: 5,
            created_at: now(),
        };

        let mut record = to_record(Table::Products, &product).unwrap();
        assert!(!record.contains_key("id"));
        assert_eq!(record["price"], json!(4000));
        assert_eq!(record["category"], json!("Dairy"));

        record.insert("id".to_string(), json!("p-1"));
        let decoded: Product = from_record(Table::Products, record).unwrap();
        assert_eq!(decoded.id, "p-1");
        assert_eq!(decoded.created_at, product.created_at);
    }

    #[test]
    fn test_malformed_record_names_table() {
        let record = match json!({ "id": "p-1", "name": "Milk" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let err = from_record::<Product>(Table::Products, record).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedRecord {
                table: "products",
                ..
            }
        ));
    }

    #[test]
    fn test_status_encodes_as_its_name() {
        let value = to_value(Table::PurchaseOrders, &PurchaseOrderStatus::Received).unwrap();
        assert_eq!(value, json!("Received"));
    }
}
