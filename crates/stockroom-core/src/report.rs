//! # Aggregation
//!
//! Pure summaries over lists of records already loaded from the store.
//!
//! ## Dashboard Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ledger (I/O)                       report (THIS MODULE, pure)          │
//! │                                                                         │
//! │  select(products) ──► Vec<Product> ──► total_stock_value               │
//! │                                    ──► low_stock(threshold)            │
//! │  select(sales)    ──► Vec<Sale>    ──► today_revenue(today)            │
//! │  select(expenses) ──► Vec<Expense> ──► expense_totals(today)           │
//! │                                                                         │
//! │  Every function is total: an empty list yields zero / empty.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `today` is always passed in. Sales are bucketed by the UTC calendar date
//! of `created_at`; expenses by their `expense_date`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Expense, Product, Sale};
use crate::DASHBOARD_PRODUCT_LIMIT;

// =============================================================================
// Stock
// =============================================================================

/// Σ price × stock across `products`; `OutOfRange` if the sum does not
/// fit in i64 cents.
///
/// ```rust
/// use stockroom_core::report::total_stock_value;
/// assert_eq!(total_stock_value(&[]).unwrap().cents(), 0);
/// ```
pub fn total_stock_value(products: &[Product]) -> CoreResult<Money> {
    products.iter().try_fold(Money::zero(), |total, product| {
        total
            .checked_add(product.stock_value()?)
            .ok_or_else(|| {
                CoreError::from(ValidationError::OutOfRange {
                    field: "total_stock_value".to_string(),
                    min: 0,
                    max: i64::MAX,
                })
            })
    })
}

/// Products at or below `threshold` units, in input order.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.stock <= threshold)
        .cloned()
        .collect()
}

pub fn low_stock_count(products: &[Product], threshold: i64) -> usize {
    products.iter().filter(|p| p.stock <= threshold).count()
}

// =============================================================================
// Revenue
// =============================================================================

/// Σ total_price of sales created on `today` (UTC date).
pub fn today_revenue(sales: &[Sale], today: NaiveDate) -> Money {
    sales
        .iter()
        .filter(|s| s.created_at.date_naive() == today)
        .map(|s| s.total_price)
        .sum()
}

// =============================================================================
// Expenses
// =============================================================================

/// Expense totals as shown on the expense book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseTotals {
    pub total: Money,
    /// Expenses dated in the same year and month as `today`.
    pub this_month: Money,
    pub by_category: BTreeMap<String, Money>,
}

pub fn expense_totals(expenses: &[Expense], today: NaiveDate) -> ExpenseTotals {
    let mut totals = ExpenseTotals::default();

    for expense in expenses {
        totals.total += expense.amount;

        if expense.expense_date.year() == today.year()
            && expense.expense_date.month() == today.month()
        {
            totals.this_month += expense.amount;
        }

        *totals
            .by_category
            .entry(expense.category.clone())
            .or_default() += expense.amount;
    }

    totals
}

// =============================================================================
// Views
// =============================================================================

/// Home screen figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub total_products: usize,
    pub total_stock_value: Money,
    pub low_stock_count: usize,
    pub low_stock_items: Vec<Product>,
    pub today_sales: Money,
    /// The first few products, for the quick-glance table.
    pub products: Vec<Product>,
}

impl Dashboard {
    pub fn build(
        products: &[Product],
        sales: &[Sale],
        today: NaiveDate,
        threshold: i64,
    ) -> CoreResult<Self> {
        let low_stock_items = low_stock(products, threshold);

        Ok(Dashboard {
            total_products: products.len(),
            total_stock_value: total_stock_value(products)?,
            low_stock_count: low_stock_items.len(),
            low_stock_items,
            today_sales: today_revenue(sales, today),
            products: products
                .iter()
                .take(DASHBOARD_PRODUCT_LIMIT)
                .cloned()
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InventoryView {
    /// Every product by name.
    #[default]
    All,
    /// Products at or below the threshold, fewest units first.
    LowStock,
    /// Every product by name, with the stock value total.
    StockValue,
}

/// An inventory listing; `total_value` is only filled for the stock value view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryListing {
    pub view: InventoryView,
    pub products: Vec<Product>,
    pub total_value: Option<Money>,
}

impl InventoryListing {
    /// Builds the listing from products already ordered for `view`.
    pub fn build(view: InventoryView, products: Vec<Product>) -> CoreResult<Self> {
        let total_value = match view {
            InventoryView::StockValue => Some(total_stock_value(&products)?),
            InventoryView::All | InventoryView::LowStock => None,
        };

        Ok(InventoryListing {
            view,
            products,
            total_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, PaymentMethod};
    use chrono::{TimeZone, Utc};

    fn product(price: i64, stock: i64) -> Product {
        Product {
            id: format!("p-{price}-{stock}"),
            name: "Item".to_string(),
            price: Money::from_cents(price),
            category: Category::Snacks,
            stock,
            created_at: Utc::now(),
        }
    }

    fn sale_at(total: i64, y: i32, m: u32, d: u32, h: u32) -> Sale {
        Sale {
            id: "s".to_string(),
            product_id: "p".to_string(),
            quantity: 1,
            total_price: Money::from_cents(total),
            discount: Money::zero(),
            discount_code: None,
            amount_paid: None,
            payment_method: PaymentMethod::Cash,
            created_at: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
        }
    }

    fn expense(amount: i64, date: NaiveDate, category: &str) -> Expense {
        Expense {
            id: "e".to_string(),
            title: "Rent".to_string(),
            amount: Money::from_cents(amount),
            category: category.to_string(),
            note: None,
            expense_date: date,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_stock_value() {
        let products = [product(1000, 5), product(250, 4)];
        assert_eq!(total_stock_value(&products).unwrap(), Money::from_cents(6000));
        assert_eq!(total_stock_value(&[]).unwrap(), Money::zero());
    }

    #[test]
    fn test_total_stock_value_overflow() {
        let products = [product(4000, i64::MAX / 6000), product(4000, i64::MAX / 6000)];
        assert!(total_stock_value(&products[..1]).is_ok());
        assert!(matches!(
            total_stock_value(&products),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let products = [product(100, 10), product(100, 11), product(100, 0)];
        let low = low_stock(&products, 10);
        assert_eq!(low.len(), 2);
        assert!(low.iter().all(|p| p.stock <= 10));
        assert_eq!(low_stock_count(&products, 10), 2);
        assert_eq!(low_stock_count(&[], 10), 0);
    }

    #[test]
    fn test_today_revenue_uses_utc_date() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let sales = [
            sale_at(8000, 2024, 2, 1, 0),
            sale_at(1500, 2024, 2, 1, 23),
            sale_at(9999, 2024, 1, 31, 23),
        ];
        assert_eq!(today_revenue(&sales, today), Money::from_cents(9500));
        assert_eq!(today_revenue(&[], today), Money::zero());
    }

    #[test]
    fn test_expense_totals() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let expenses = [
            expense(10000, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), "Rent"),
            expense(5000, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "General"),
        ];
        let totals = expense_totals(&expenses, today);
        assert_eq!(totals.total, Money::from_cents(15000));
        assert_eq!(totals.this_month, Money::from_cents(5000));
        assert_eq!(totals.by_category["Rent"], Money::from_cents(10000));
        assert_eq!(totals.by_category["General"], Money::from_cents(5000));
    }

    #[test]
    fn test_expense_month_requires_same_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let expenses = [expense(
            700,
            NaiveDate::from_ymd_opt(2023, 2, 10).unwrap(),
            "General",
        )];
        let totals = expense_totals(&expenses, today);
        assert_eq!(totals.this_month, Money::zero());
        assert_eq!(totals.total.cents(), 700);
    }

    #[test]
    fn test_dashboard_build() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let products: Vec<Product> = (0..10).map(|i| product(100, i * 3)).collect();
        let sales = [sale_at(8000, 2024, 2, 1, 9)];

        let dashboard = Dashboard::build(&products, &sales, today, 10).unwrap();
        assert_eq!(dashboard.total_products, 10);
        assert_eq!(dashboard.products.len(), 8);
        assert_eq!(dashboard.low_stock_count, 4);
        assert_eq!(dashboard.today_sales.cents(), 8000);
    }

    #[test]
    fn test_inventory_listing_total_only_for_value_view() {
        let products = vec![product(1000, 5), product(250, 4)];
        let listing = InventoryListing::build(InventoryView::StockValue, products.clone()).unwrap();
        assert_eq!(listing.total_value, Some(Money::from_cents(6000)));

        let listing = InventoryListing::build(InventoryView::All, products).unwrap();
        assert_eq!(listing.total_value, None);
    }
}
