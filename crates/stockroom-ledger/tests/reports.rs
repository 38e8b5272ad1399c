//! Aggregates over data written through the ledger.

mod common;

use chrono::NaiveDate;
use common::{add_product, ledgers};
use stockroom_core::report::{expense_totals, low_stock, total_stock_value};
use stockroom_core::{InventoryView, Money, NewDiscount, NewExpense, DiscountType};
use stockroom_ledger::ErrorCode;

#[tokio::test]
async fn stock_value_and_low_stock_threshold() {
    for (backend, ledger) in ledgers().await {
        add_product(&ledger, "Paneer", 1000, 5).await;
        add_product(&ledger, "Biscuits", 250, 4).await;

        let products = ledger.list_products().await.unwrap();
        assert_eq!(
            total_stock_value(&products).unwrap(),
            Money::from_cents(6000),
            "{backend}"
        );

        add_product(&ledger, "Eggs", 600, 10).await;
        add_product(&ledger, "Bread", 400, 11).await;
        let products = ledger.list_products().await.unwrap();
        let low: Vec<String> = low_stock(&products, 10).into_iter().map(|p| p.name).collect();
        assert!(low.contains(&"Eggs".to_string()), "{backend}");
        assert!(!low.contains(&"Bread".to_string()), "{backend}");

        let listing = ledger.inventory(InventoryView::LowStock).await.unwrap();
        let names: Vec<&str> = listing.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Biscuits", "Paneer", "Eggs"], "{backend}");

        let dashboard = ledger.dashboard().await.unwrap();
        assert_eq!(dashboard.low_stock_count, 3, "{backend}");
        assert_eq!(dashboard.total_products, 4, "{backend}");
    }
}

#[tokio::test]
async fn expense_totals_by_month() {
    for (backend, ledger) in ledgers().await {
        ledger
            .add_expense(NewExpense {
                title: "Rent".to_string(),
                amount: Money::from_cents(10000),
                category: Some("Rent".to_string()),
                note: None,
                expense_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            })
            .await
            .unwrap();
        ledger
            .add_expense(NewExpense {
                title: "Electricity".to_string(),
                amount: Money::from_cents(5000),
                category: None,
                note: Some("  ".to_string()),
                expense_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            })
            .await
            .unwrap();

        let expenses = ledger.list_expenses().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        let totals = expense_totals(&expenses, today);

        assert_eq!(totals.this_month, Money::from_cents(5000), "{backend}");
        assert_eq!(totals.total, Money::from_cents(15000), "{backend}");
        assert_eq!(totals.by_category["Rent"], Money::from_cents(10000), "{backend}");
        assert_eq!(totals.by_category["General"], Money::from_cents(5000), "{backend}");
        assert_eq!(expenses[0].note, None, "{backend}");
    }
}

#[tokio::test]
async fn duplicate_discount_codes_rejected_on_every_store() {
    for (backend, ledger) in ledgers().await {
        let input = NewDiscount {
            code: "fest20".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 2000,
            min_order_value: Money::zero(),
            expires_at: None,
        };

        ledger.create_discount(input.clone()).await.unwrap();
        let err = ledger
            .create_discount(NewDiscount {
                code: " FEST20 ".to_string(),
                ..input
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError, "{backend}");
        assert_eq!(ledger.list_discounts().await.unwrap().len(), 1, "{backend}");
    }
}
