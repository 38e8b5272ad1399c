//! # Sale Recorder
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale_with(request)                                              │
//! │       │                                                                 │
//! │       ├── quantity <= 0 ─────────────────────────► ValidationError      │
//! │       ├── read product ── missing ───────────────► NotFound             │
//! │       ├── price × q overflows ── q > stock ──────► InsufficientStock    │
//! │       │                      └── otherwise ──────► ValidationError      │
//! │       ├── resolve discount ── refused ───────────► DiscountRejected     │
//! │       │   (nothing written yet)                                         │
//! │       ▼                                                                 │
//! │  update(products, stock -= q  where id = ? and stock >= q)             │
//! │       │                                                                 │
//! │       ├── 0 rows ── re-read ── present ──────────► InsufficientStock    │
//! │       │                    └── gone ─────────────► NotFound             │
//! │       ▼                                                                 │
//! │  insert(sales, { total_price = price × q, ... })                       │
//! │       │                                                                 │
//! │       ├── ok ────────────────────────────────────► Sale                 │
//! │       └── failed ── stock += q (compensation) ───► StoreFailure         │
//! │                  └── compensation failed: logged at error level,       │
//! │                      product stays decremented without a sale          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `total_price` comes from the product as read at the start of the call
//! and is never recomputed.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use stockroom_core::types::timestamp;
use stockroom_core::validation::{
    line_total, validate_non_negative, validate_quantity, validate_required,
};
use stockroom_core::{
    CoreError, Invoice, Money, Product, Sale, SaleRequest, MAX_NAME_LENGTH,
};
use stockroom_db::{Filter, OrderBy, Patch, Table};
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::error::LedgerResult;
use crate::Ledger;

/// Which sales [`Ledger::list_sales`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesFilter {
    #[default]
    All,
    /// Sales created on the current UTC date.
    Today,
    /// Sales created on the given UTC date.
    On(NaiveDate),
}

/// `created_at` bounds covering one UTC calendar day, inclusive.
fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::microseconds(1);
    (timestamp::format(&start), timestamp::format(&end))
}

impl Ledger {
    /// Sells `quantity` units of a product.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // Milk at 40.00, 5 in stock
    /// let sale = ledger.record_sale(&milk.id, 2).await?;
    /// assert_eq!(sale.total_price, Money::from_cents(8000));
    /// // Milk now has 3 in stock
    /// ```
    pub async fn record_sale(&self, product_id: &str, quantity: i64) -> LedgerResult<Sale> {
        self.record_sale_with(SaleRequest::new(product_id, quantity))
            .await
    }

    /// Sells with the checkout details: discount code, amount paid and
    /// payment method.
    pub async fn record_sale_with(&self, request: SaleRequest) -> LedgerResult<Sale> {
        let quantity = request.quantity;
        validate_quantity(quantity)?;
        let product_id = validate_required("product_id", &request.product_id, MAX_NAME_LENGTH)?;
        if let Some(paid) = request.amount_paid {
            validate_non_negative("amount_paid", paid)?;
        }

        debug!(product_id = %product_id, quantity, "Recording sale");

        let product: Product = self
            .fetch_required(Table::Products, "Product", &product_id)
            .await?;
        let total_price = match line_total("quantity", product.price, quantity) {
            Ok(total) => total,
            // Nothing written yet; refuse against the snapshot.
            Err(_) if quantity > product.stock => {
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                    requested: quantity,
                }
                .into())
            }
            Err(err) => return Err(err.into()),
        };

        let created_at = codec::now();
        let (discount, discount_code) = match request.discount_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let found = self.find_discount_by_code(code).await?.ok_or_else(|| {
                    CoreError::DiscountRejected {
                        code: code.to_ascii_uppercase(),
                        reason: "unknown discount code".to_string(),
                    }
                })?;
                let amount = found.amount_for(total_price, created_at.date_naive())?;
                (amount, Some(found.code))
            }
            _ => (Money::zero(), None),
        };

        let decremented = self
            .store
            .update(
                Table::Products,
                &Filter::by_id(product_id.as_str()).gte("stock", quantity),
                &Patch::new().increment("stock", -quantity),
            )
            .await?;

        if decremented == 0 {
            return Err(match self.fetch::<Product>(Table::Products, &product_id).await? {
                Some(current) => {
                    debug!(
                        product_id = %product_id,
                        available = current.stock,
                        requested = quantity,
                        "Sale refused, not enough stock"
                    );
                    CoreError::InsufficientStock {
                        product: current.name,
                        available: current.stock,
                        requested: quantity,
                    }
                    .into()
                }
                None => CoreError::not_found("Product", product_id.as_str()).into(),
            });
        }

        let sale = Sale {
            id: String::new(),
            product_id,
            quantity,
            total_price,
            discount,
            discount_code,
            amount_paid: request.amount_paid,
            payment_method: request.payment_method,
            created_at,
        };

        match self.insert(Table::Sales, &sale).await {
            Ok(id) => {
                info!(
                    sale_id = %id,
                    product_id = %sale.product_id,
                    quantity,
                    total = %sale.total_price,
                    discount = %sale.discount,
                    "Sale recorded"
                );
                Ok(Sale { id, ..sale })
            }
            Err(err) => {
                self.compensate_sale(&sale.product_id, quantity).await;
                Err(err)
            }
        }
    }

    /// Puts back stock taken for a sale whose record could not be written.
    async fn compensate_sale(&self, product_id: &str, quantity: i64) {
        let restored = self
            .store
            .update(
                Table::Products,
                &Filter::by_id(product_id),
                &Patch::new().increment("stock", quantity),
            )
            .await;

        match restored {
            Ok(0) => warn!(
                product_id = %product_id,
                quantity,
                "Sale insert failed and the product is gone, nothing to restore"
            ),
            Ok(_) => warn!(
                product_id = %product_id,
                quantity,
                "Sale insert failed, stock restored"
            ),
            Err(err) => error!(
                product_id = %product_id,
                quantity,
                error = %err,
                "Sale insert failed and stock could not be restored; product is decremented without a sale"
            ),
        }
    }

    pub async fn get_sale(&self, id: &str) -> LedgerResult<Sale> {
        self.fetch_required(Table::Sales, "Sale", id).await
    }

    /// Sales, newest first.
    pub async fn list_sales(&self, filter: SalesFilter) -> LedgerResult<Vec<Sale>> {
        let selection = match filter {
            SalesFilter::All => Filter::all(),
            SalesFilter::Today => {
                let (start, end) = day_bounds(codec::now().date_naive());
                Filter::all().gte("created_at", start).lte("created_at", end)
            }
            SalesFilter::On(date) => {
                let (start, end) = day_bounds(date);
                Filter::all().gte("created_at", start).lte("created_at", end)
            }
        };

        self.fetch_all(Table::Sales, &selection, Some(&OrderBy::desc("created_at")))
            .await
    }

    /// The printable invoice for a sale.
    pub async fn invoice(&self, sale_id: &str) -> LedgerResult<Invoice> {
        let sale = self.get_sale(sale_id).await?;
        let product: Option<Product> = self.fetch(Table::Products, &sale.product_id).await?;

        Ok(Invoice::build(&sale, product.as_ref(), self.config.tax_rate()))
    }
}
