//! # Record Store
//!
//! The table-oriented store boundary: four operations over JSON records.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RecordStore                                      │
//! │                                                                         │
//! │  insert(table, record)          → id        (store generates the id)  │
//! │  select(table, filter, order)   → records   (each carries "id")       │
//! │  update(table, filter, patch)   → rows affected                        │
//! │  delete(table, filter)          → rows affected                        │
//! │                                                                         │
//! │  Each call is atomic on its own. There are no multi-call transactions; │
//! │  callers that need check-and-write use ONE conditional update:         │
//! │                                                                         │
//! │    update(products,                                                    │
//! │           Filter::by_id(p).gte("stock", 5),                            │
//! │           Patch::new().increment("stock", -5))                         │
//! │                                                                         │
//! │    rows = 1 → decremented       rows = 0 → nothing changed             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Comparison Semantics
//! A field missing from a record compares as `null`. `eq`/`ne` are
//! null-safe (`null eq null` holds). `gte`/`lte` only hold between two
//! numbers, two strings or two booleans; anything involving `null` is false.

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// A stored record: a JSON object.
pub type Record = Map<String, Value>;

/// The identity field every selected record carries.
pub const ID_FIELD: &str = "id";

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Products,
    Sales,
    PurchaseOrders,
    Returns,
    Customers,
    Suppliers,
    Discounts,
    Expenses,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Products,
        Table::Sales,
        Table::PurchaseOrders,
        Table::Returns,
        Table::Customers,
        Table::Suppliers,
        Table::Discounts,
        Table::Expenses,
    ];

    /// Table name in the store.
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Sales => "sales",
            Table::PurchaseOrders => "purchase_orders",
            Table::Returns => "returns",
            Table::Customers => "customers",
            Table::Suppliers => "suppliers",
            Table::Discounts => "discounts",
            Table::Expenses => "expenses",
        }
    }

    /// Fields whose values must be unique across the table.
    pub const fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Table::Discounts => &["code"],
            _ => &[],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Field Names
// =============================================================================

/// Field names end up inside SQL JSON paths, so only plain identifiers
/// are accepted.
pub fn validate_field(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field.len() <= 64
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

/// Reads a field, treating a missing field as `null`.
pub fn field_value<'a>(record: &'a Record, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&Value::Null)
}

/// Orders two JSON scalars of the same kind. Mixed kinds and `null`
/// (except `null` against `null`) are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// =============================================================================
// Filter
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
    Gte(String, Value),
    Lte(String, Value),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq(f, _) | Condition::Ne(f, _) | Condition::Gte(f, _) | Condition::Lte(f, _) => f,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Condition::Eq(_, v) | Condition::Ne(_, v) | Condition::Gte(_, v) | Condition::Lte(_, v) => v,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = field_value(record, self.field());
        let ordering = compare_values(actual, self.value());

        match self {
            Condition::Eq(..) => ordering == Some(Ordering::Equal),
            Condition::Ne(..) => ordering != Some(Ordering::Equal),
            Condition::Gte(..) => {
                !actual.is_null() && matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            }
            Condition::Lte(..) => {
                !actual.is_null() && matches!(ordering, Some(Ordering::Less | Ordering::Equal))
            }
        }
    }
}

/// A conjunction of conditions. The empty filter selects every record.
///
/// ```rust
/// use stockroom_db::Filter;
///
/// let low = Filter::all().lte("stock", 10);
/// let received = Filter::by_id("po-1").eq("status", "Received");
/// assert_eq!(received.conditions().len(), 2);
/// # let _ = low;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Filter::all().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Ne(field.into(), value.into()));
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte(field.into(), value.into()));
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte(field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    pub fn validate(&self) -> StoreResult<()> {
        self.conditions
            .iter()
            .try_for_each(|c| validate_field(c.field()))
    }
}

// =============================================================================
// Ordering
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            descending: true,
        }
    }

    /// Compares two records by this ordering; `null` sorts first ascending.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let (a, b) = (field_value(a, &self.field), field_value(b, &self.field));
        let ordering = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_values(a, b).unwrap_or(Ordering::Equal),
        };

        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

// =============================================================================
// Patch
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Overwrite the field.
    Set(String, Value),
    /// Add `delta` to an integer field; a missing field counts as 0. A
    /// result outside the i64 range fails with `StoreError::Overflow`.
    Increment(String, i64),
}

impl Change {
    pub fn field(&self) -> &str {
        match self {
            Change::Set(f, _) | Change::Increment(f, _) => f,
        }
    }
}

/// Changes applied to every record a filter selects.
///
/// `increment` is evaluated by the store against the stored value, which is
/// what makes conditional stock updates safe under concurrency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    changes: Vec<Change>,
}

impl Patch {
    pub fn new() -> Self {
        Patch::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.push(Change::Set(field.into(), value.into()));
        self
    }

    pub fn increment(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.changes.push(Change::Increment(field.into(), delta));
        self
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The identity field is immutable.
    pub fn validate(&self) -> StoreResult<()> {
        if self.changes.is_empty() {
            return Err(StoreError::InvalidField("empty patch".to_string()));
        }
        self.changes.iter().try_for_each(|c| {
            validate_field(c.field())?;
            if c.field() == ID_FIELD {
                return Err(StoreError::InvalidField(format!(
                    "{} cannot be patched",
                    ID_FIELD
                )));
            }
            Ok(())
        })
    }

    /// Applies the changes to an in-memory record.
    pub fn apply(&self, record: &mut Record) -> StoreResult<()> {
        for change in &self.changes {
            match change {
                Change::Set(field, value) => {
                    record.insert(field.clone(), value.clone());
                }
                Change::Increment(field, delta) => {
                    let current = match field_value(record, field) {
                        Value::Null => 0,
                        Value::Number(n) => n.as_i64().ok_or_else(|| {
                            StoreError::InvalidField(format!("{field} is not an integer"))
                        })?,
                        _ => {
                            return Err(StoreError::InvalidField(format!(
                                "{field} is not an integer"
                            )))
                        }
                    };
                    let next = current
                        .checked_add(*delta)
                        .ok_or_else(|| StoreError::Overflow(field.clone()))?;
                    record.insert(field.clone(), Value::from(next));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// RecordStore Trait
// =============================================================================

/// The store the ledger is injected with.
///
/// Implementations must make each call atomic with respect to concurrent
/// calls on the same table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a record and returns the generated id. An `id` in `record`
    /// is ignored.
    async fn insert(&self, table: Table, record: Record) -> StoreResult<String>;

    /// Returns matching records, each including its `id`.
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<Record>>;

    /// Applies `patch` to every matching record; returns rows affected.
    async fn update(&self, table: Table, filter: &Filter, patch: &Patch) -> StoreResult<u64>;

    /// Deletes every matching record; returns rows affected.
    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64>;
}
