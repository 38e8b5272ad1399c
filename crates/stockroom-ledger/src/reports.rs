//! Dashboard and inventory listings.
//!
//! Loads what the pure aggregations in `stockroom_core::report` need and
//! hands it over; no arithmetic happens here.

use chrono::NaiveDate;
use stockroom_core::{Dashboard, InventoryListing, InventoryView, Product, Sale};
use stockroom_db::{Filter, OrderBy, Table};
use tracing::debug;

use crate::codec;
use crate::error::LedgerResult;
use crate::sales::SalesFilter;
use crate::Ledger;

impl Ledger {
    /// Home screen figures for today (UTC).
    pub async fn dashboard(&self) -> LedgerResult<Dashboard> {
        self.dashboard_on(codec::now().date_naive()).await
    }

    /// Home screen figures with `today` pinned.
    pub async fn dashboard_on(&self, today: NaiveDate) -> LedgerResult<Dashboard> {
        debug!(%today, "Building dashboard");

        let products: Vec<Product> = self.fetch_all(Table::Products, &Filter::all(), None).await?;
        let sales: Vec<Sale> = self.list_sales(SalesFilter::On(today)).await?;

        Ok(Dashboard::build(
            &products,
            &sales,
            today,
            self.config.low_stock_threshold,
        )?)
    }

    pub async fn inventory(&self, view: InventoryView) -> LedgerResult<InventoryListing> {
        let products: Vec<Product> = match view {
            InventoryView::All | InventoryView::StockValue => self.list_products().await?,
            InventoryView::LowStock => {
                self.fetch_all(
                    Table::Products,
                    &Filter::all().lte("stock", self.config.low_stock_threshold),
                    Some(&OrderBy::asc("stock")),
                )
                .await?
            }
        };

        Ok(InventoryListing::build(view, products)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerConfig;
    use stockroom_core::{Category, Money, NewProduct};

    async fn stocked() -> Ledger {
        let ledger = Ledger::in_memory(LedgerConfig::default());
        for (name, price, stock) in [("Milk", 1000, 5), ("Chips", 250, 4), ("Rice", 100, 11)] {
            ledger
                .add_product(NewProduct {
                    name: name.to_string(),
                    price: Money::from_cents(price),
                    category: Category::Snacks,
                    stock,
                })
                .await
                .unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_dashboard() {
        let ledger = stocked().await;
        let dashboard = ledger.dashboard().await.unwrap();

        assert_eq!(dashboard.total_products, 3);
        // 10.00×5 + 2.50×4 + 1.00×11
        assert_eq!(dashboard.total_stock_value, Money::from_cents(7100));
        assert_eq!(dashboard.low_stock_count, 2);
        assert_eq!(dashboard.today_sales, Money::zero());
    }

    #[tokio::test]
    async fn test_dashboard_counts_todays_sales() {
        let ledger = stocked().await;
        let milk = ledger.list_products().await.unwrap().remove(1);
        assert_eq!(milk.name, "Milk");
        ledger.record_sale(&milk.id, 2).await.unwrap();

        let dashboard = ledger.dashboard().await.unwrap();
        assert_eq!(dashboard.today_sales, Money::from_cents(2000));

        let yesterday = codec::now().date_naive().pred_opt().unwrap();
        let dashboard = ledger.dashboard_on(yesterday).await.unwrap();
        assert_eq!(dashboard.today_sales, Money::zero());
    }

    #[tokio::test]
    async fn test_inventory_views() {
        let ledger = stocked().await;

        let all = ledger.inventory(InventoryView::All).await.unwrap();
        let names: Vec<&str> = all.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Chips", "Milk", "Rice"]);
        assert_eq!(all.total_value, None);

        let low = ledger.inventory(InventoryView::LowStock).await.unwrap();
        let names: Vec<&str> = low.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Chips", "Milk"]);

        let value = ledger.inventory(InventoryView::StockValue).await.unwrap();
        assert_eq!(value.total_value, Some(Money::from_cents(7100)));
    }
}
