//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│      Sale       │◄──│   SaleReturn    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price (Money)  │   │  quantity       │   │  quantity       │       │
//! │  │  category       │   │  total_price    │   │  refund_amount  │       │
//! │  │  stock          │   │  (frozen)       │   │  status         │       │
//! │  └────────▲────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │                                                             │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PurchaseOrder   │──►│    Supplier     │   │    Customer     │       │
//! │  │  quantity       │   └─────────────────┘   └─────────────────┘       │
//! │  │  status         │                                                    │
//! │  └─────────────────┘   ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │    Discount     │   │    Expense      │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every persisted type has a matching `New*` input type. The store
//! assigns `id`; the ledger stamps `created_at`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{line_total, ValidationResult};

// =============================================================================
// Timestamps
// =============================================================================

/// Serde format for stored timestamps: RFC 3339, UTC, always microsecond
/// precision (`2024-02-01T10:00:00.000000Z`).
///
/// Fixed width makes lexical order equal chronological order, which the
/// record store relies on for `created_at` ordering and range filters.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    Fruits,
    Vegetables,
    Dairy,
    Snacks,
    Grains,
    Beverages,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Fruits,
        Category::Vegetables,
        Category::Dairy,
        Category::Snacks,
        Category::Grains,
        Category::Beverages,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Fruits => "Fruits",
            Category::Vegetables => "Vegetables",
            Category::Dairy => "Dairy",
            Category::Snacks => "Snacks",
            Category::Grains => "Grains",
            Category::Beverages => "Beverages",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit price.
    pub price: Money,
    pub category: Category,
    /// Units on hand. Never negative after a committed mutation.
    pub stock: i64,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    /// Value of the units on hand at the current price.
    #[inline]
    pub fn stock_value(&self) -> ValidationResult<Money> {
        line_total("stock", self.price, self.stock)
    }
}

/// Input for adding a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category: Category,
    pub stock: i64,
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
        };
        f.write_str(label)
    }
}

/// A recorded sale of one product.
///
/// `total_price` is frozen at creation (unit price × quantity at that
/// moment); later price changes never touch it. The remaining optional
/// fields only feed invoice rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub total_price: Money,
    #[serde(default)]
    pub discount: Money,
    pub discount_code: Option<String>,
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Full sale request: the plain `record_sale(product, qty)` contract plus
/// the optional checkout details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
    pub discount_code: Option<String>,
    pub amount_paid: Option<Money>,
    pub payment_method: PaymentMethod,
}

impl SaleRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleRequest {
            product_id: product_id.into(),
            quantity,
            ..Default::default()
        }
    }
}

// =============================================================================
// Status Types
// =============================================================================

/// A workflow status with one stock-crediting state.
///
/// Moving a record *into* `CREDITING` adds its quantity to the product's
/// stock exactly once. `CREDITING` is terminal.
pub trait CreditStatus:
    Copy + PartialEq + fmt::Display + Serialize + Send + Sync + 'static
{
    /// The status whose first arrival credits stock.
    const CREDITING: Self;

    /// Record kind, for errors and logs.
    const ENTITY: &'static str;

    #[inline]
    fn is_crediting(&self) -> bool {
        *self == Self::CREDITING
    }
}

/// Purchase order lifecycle: Pending → Received, or → Cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PurchaseOrderStatus {
    #[default]
    Pending,
    Received,
    Cancelled,
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PurchaseOrderStatus::Pending => "Pending",
            PurchaseOrderStatus::Received => "Received",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PurchaseOrderStatus::Pending),
            "received" => Ok(PurchaseOrderStatus::Received),
            "cancelled" | "canceled" => Ok(PurchaseOrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "Pending".to_string(),
                    "Received".to_string(),
                    "Cancelled".to_string(),
                ],
            }),
        }
    }
}

impl CreditStatus for PurchaseOrderStatus {
    const CREDITING: Self = PurchaseOrderStatus::Received;
    const ENTITY: &'static str = "PurchaseOrder";
}

/// Return lifecycle: Pending → Approved or Rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ReturnStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReturnStatus::Pending => "Pending",
            ReturnStatus::Approved => "Approved",
            ReturnStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

impl FromStr for ReturnStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ReturnStatus::Pending),
            "approved" => Ok(ReturnStatus::Approved),
            "rejected" => Ok(ReturnStatus::Rejected),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "Pending".to_string(),
                    "Approved".to_string(),
                    "Rejected".to_string(),
                ],
            }),
        }
    }
}

impl CreditStatus for ReturnStatus {
    const CREDITING: Self = ReturnStatus::Approved;
    const ENTITY: &'static str = "Return";
}

// =============================================================================
// Purchase Order
// =============================================================================

/// Goods ordered from a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub product_id: String,
    pub supplier_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    pub status: PurchaseOrderStatus,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn total_cost(&self) -> ValidationResult<Money> {
        line_total("quantity", self.unit_cost, self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub product_id: String,
    pub supplier_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    /// Defaults to today.
    pub order_date: Option<NaiveDate>,
}

// =============================================================================
// Return
// =============================================================================

/// Goods brought back against a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    pub sale_id: String,
    /// Copied from the sale at creation.
    pub product_id: String,
    pub quantity: i64,
    pub refund_amount: Money,
    pub reason: Option<String>,
    pub status: ReturnStatus,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReturn {
    pub sale_id: String,
    pub quantity: i64,
    pub refund_amount: Money,
    pub reason: Option<String>,
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// What the supplier delivers ("Dairy", "Rice & pulses", ...).
    pub product_type: Option<String>,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub product_type: Option<String>,
}

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountType {
    /// `discount_value` is in basis points (1000 = 10% off).
    Percentage,
    /// `discount_value` is an amount in cents.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub id: String,
    /// Trimmed and upper-cased; unique.
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_value: Money,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<NaiveDate>,
    pub is_active: bool,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscount {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_value: Money,
    pub expires_at: Option<NaiveDate>,
}

// =============================================================================
// Expense
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: Money,
    pub category: String,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    #[ts(as = "String")]
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: Money,
    /// Defaults to "General".
    pub category: Option<String>,
    pub note: Option<String>,
    /// Defaults to today.
    pub expense_date: Option<NaiveDate>,
}
