//! # Seed Data Generator
//!
//! Populates a ledger database with a small shop's worth of sample data.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom.db (or whatever stockroom.toml / STOCKROOM_DB_PATH say)
//! cargo run -p stockroom-ledger --bin stockroom-seed
//!
//! # Specify a config file or database path
//! cargo run -p stockroom-ledger --bin stockroom-seed -- --config ./stockroom.toml
//! cargo run -p stockroom-ledger --bin stockroom-seed -- --db ./data/dev.db
//! ```
//!
//! ## Generated Data
//! - One product per catalog category, a few near the low-stock line
//! - Two suppliers and a customer
//! - A purchase order per supplier; the first is received
//! - A discount code, some sales (one with the discount) and a return
//! - Two months of expenses

use std::env;
use std::path::PathBuf;

use chrono::{Datelike, Duration};
use stockroom_core::{
    Category, DiscountType, Money, NewCustomer, NewDiscount, NewExpense, NewProduct,
    NewPurchaseOrder, NewReturn, NewSupplier, PaymentMethod, PurchaseOrderStatus, ReturnStatus,
    SaleRequest,
};
use stockroom_ledger::{codec, init_tracing, Ledger, LedgerConfig};
use tracing::{info, warn};

/// (name, price in cents, category, stock)
const PRODUCTS: &[(&str, i64, Category, i64)] = &[
    ("Alphonso Mango", 15000, Category::Fruits, 24),
    ("Tomatoes", 4000, Category::Vegetables, 8),
    ("Toned Milk", 2800, Category::Dairy, 40),
    ("Masala Chips", 2000, Category::Snacks, 6),
    ("Basmati Rice 5kg", 62000, Category::Grains, 12),
    ("Orange Juice 1L", 9000, Category::Beverages, 10),
];

/// (title, amount in cents, category)
const EXPENSES: &[(&str, i64, &str)] = &[
    ("Shop rent", 1500000, "Rent"),
    ("Electricity bill", 320000, "Utilities"),
    ("Delivery van fuel", 85000, "Transport"),
    ("Cleaning supplies", 12000, "General"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: stockroom-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: ./stockroom.toml if present)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(config_path.as_deref())?;
    if let Some(path) = db_path {
        config.database_path = path;
    }

    let ledger = Ledger::open(config).await?;

    if !ledger.list_products().await?.is_empty() {
        warn!("Database already has products, skipping seed. Delete the file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let today = codec::now().date_naive();

    // Catalog
    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, price, category, stock) in PRODUCTS {
        let product = ledger
            .add_product(NewProduct {
                name: name.to_string(),
                price: Money::from_cents(*price),
                category: *category,
                stock: *stock,
            })
            .await?;
        products.push(product);
    }

    let farm = ledger
        .add_supplier(NewSupplier {
            name: "Green Valley Farms".to_string(),
            phone: Some("+91 98200 11223".to_string()),
            product_type: Some("Vegetables".to_string()),
            ..Default::default()
        })
        .await?;
    let mill = ledger
        .add_supplier(NewSupplier {
            name: "Sunrise Rice Mill".to_string(),
            email: Some("orders@sunrisemill.example".to_string()),
            product_type: Some("Grains".to_string()),
            ..Default::default()
        })
        .await?;

    ledger
        .add_customer(NewCustomer {
            name: "Priya Sharma".to_string(),
            phone: Some("+91 99300 44556".to_string()),
            ..Default::default()
        })
        .await?;

    // Purchasing: tomatoes arrive, rice is still on order
    let tomatoes = &products[1];
    let rice = &products[4];
    let received = ledger
        .create_purchase_order(NewPurchaseOrder {
            product_id: tomatoes.id.clone(),
            supplier_id: farm.id.clone(),
            quantity: 30,
            unit_cost: Money::from_cents(2500),
            order_date: Some(today - Duration::days(2)),
        })
        .await?;
    ledger
        .update_order_status(&received.id, PurchaseOrderStatus::Received)
        .await?;
    ledger
        .create_purchase_order(NewPurchaseOrder {
            product_id: rice.id.clone(),
            supplier_id: mill.id.clone(),
            quantity: 20,
            unit_cost: Money::from_cents(51000),
            order_date: None,
        })
        .await?;

    // Sales
    ledger
        .create_discount(NewDiscount {
            code: "WELCOME10".to_string(),
            description: Some("10% off for new customers".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            min_order_value: Money::from_cents(20000),
            expires_at: Some(today + Duration::days(30)),
        })
        .await?;

    let mango_sale = ledger
        .record_sale_with(SaleRequest {
            discount_code: Some("WELCOME10".to_string()),
            amount_paid: Some(Money::from_cents(50000)),
            payment_method: PaymentMethod::Cash,
            ..SaleRequest::new(products[0].id.as_str(), 3)
        })
        .await?;
    ledger.record_sale(&products[2].id, 4).await?;
    ledger
        .record_sale_with(SaleRequest {
            payment_method: PaymentMethod::Upi,
            ..SaleRequest::new(products[3].id.as_str(), 2)
        })
        .await?;

    let mango_return = ledger
        .create_return(NewReturn {
            sale_id: mango_sale.id.clone(),
            quantity: 1,
            refund_amount: Money::from_cents(15000),
            reason: Some("Overripe".to_string()),
        })
        .await?;
    ledger
        .update_return_status(&mango_return.id, ReturnStatus::Approved)
        .await?;

    // Expenses: this month and the one before
    let last_month = today.with_day(1).unwrap_or(today) - Duration::days(1);
    for (index, (title, amount, category)) in EXPENSES.iter().enumerate() {
        let expense_date = if index % 2 == 0 { today } else { last_month };
        ledger
            .add_expense(NewExpense {
                title: title.to_string(),
                amount: Money::from_cents(*amount),
                category: Some(category.to_string()),
                note: None,
                expense_date: Some(expense_date),
            })
            .await?;
    }

    let invoice = ledger.invoice(&mango_sale.id).await?;
    info!(
        invoice = %invoice.invoice_number,
        grand_total = %invoice.grand_total,
        change = %invoice.change,
        "Sample invoice"
    );

    let dashboard = ledger.dashboard().await?;
    info!(
        products = dashboard.total_products,
        stock_value = %dashboard.total_stock_value,
        low_stock = dashboard.low_stock_count,
        today_sales = %dashboard.today_sales,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    let expenses = ledger.expense_summary().await?;
    info!(
        total = %expenses.totals.total,
        this_month = %expenses.totals.this_month,
        "Expense book"
    );

    Ok(())
}
