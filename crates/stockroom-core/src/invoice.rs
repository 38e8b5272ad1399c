//! # Invoice
//!
//! Turns a recorded sale into the figures printed on a customer invoice.
//!
//! ## Invoice Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal     = sale.total_price                       364.00          │
//! │  tax          = subtotal × tax rate (half-up)         + 18.20          │
//! │  discount     = sale.discount                         - 20.00          │
//! │  ─────────────────────────────────────────────────────────────         │
//! │  grand total  = subtotal + tax - discount               362.20          │
//! │  amount paid  = sale.amount_paid, or grand total        400.00          │
//! │  change       = max(paid - grand, 0)                     37.80          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, Product, Sale, TaxRate};
use crate::{INVOICE_PREFIX, UNKNOWN_PRODUCT_NAME};

/// Number of sale-id characters used in the invoice number.
const INVOICE_ID_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    /// Unit price at the time of sale.
    pub rate: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub invoice_number: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub grand_total: Money,
    pub amount_paid: Money,
    pub change: Money,
}

/// `INV-` followed by the first eight characters of the sale id, upper-cased.
pub fn invoice_number(sale_id: &str) -> String {
    let head: String = sale_id.chars().take(INVOICE_ID_CHARS).collect();
    format!("{}{}", INVOICE_PREFIX, head.to_uppercase())
}

impl Invoice {
    /// Builds the invoice for `sale`. `product` is `None` once the product
    /// has been deleted; the line then reads "Unknown".
    pub fn build(sale: &Sale, product: Option<&Product>, tax_rate: TaxRate) -> Self {
        let subtotal = sale.total_price;
        let tax = subtotal.calculate_tax(tax_rate);
        let grand_total = subtotal + tax - sale.discount;
        let amount_paid = sale.amount_paid.unwrap_or(grand_total);
        let change = (amount_paid - grand_total).non_negative();

        let rate = if sale.quantity > 0 {
            Money::from_cents(sale.total_price.cents() / sale.quantity)
        } else {
            Money::zero()
        };

        let line = InvoiceLine {
            name: product
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            quantity: sale.quantity,
            unit: "pcs".to_string(),
            rate,
            total: sale.total_price,
        };

        Invoice {
            invoice_number: invoice_number(&sale.id),
            issued_at: sale.created_at,
            payment_method: sale.payment_method,
            lines: vec![line],
            subtotal,
            tax,
            discount: sale.discount,
            grand_total,
            amount_paid,
            change,
        }
    }
}
