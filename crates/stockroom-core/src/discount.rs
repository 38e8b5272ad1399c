//! # Discount Evaluation
//!
//! Decides whether a discount applies to an order and how much it takes off.
//!
//! ## Applicability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  amount_for(subtotal, today)                                            │
//! │       │                                                                 │
//! │       ├── !is_active ───────────────► DiscountRejected "inactive"      │
//! │       ├── expires_at < today ───────► DiscountRejected "expired"       │
//! │       ├── subtotal < min_order ─────► DiscountRejected "minimum ..."   │
//! │       │                                                                 │
//! │       ├── Percentage: subtotal × bps / 10000 (half-up)                 │
//! │       └── Fixed:      value                                            │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │        capped at subtotal (a sale never goes below zero)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A discount is usable on its expiry date and rejected from the next day.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, DiscountType};

impl Discount {
    /// True once `today` is past the expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at.is_some_and(|expiry| expiry < today)
    }

    /// Checks that this discount may be applied to `subtotal` on `today`.
    pub fn check_applicable(&self, subtotal: Money, today: NaiveDate) -> CoreResult<()> {
        let reject = |reason: String| CoreError::DiscountRejected {
            code: self.code.clone(),
            reason,
        };

        if !self.is_active {
            return Err(reject("discount is inactive".to_string()));
        }
        if self.is_expired(today) {
            return Err(reject("discount has expired".to_string()));
        }
        if subtotal < self.min_order_value {
            return Err(reject(format!(
                "order total {} is below the minimum {}",
                subtotal, self.min_order_value
            )));
        }

        Ok(())
    }

    /// The amount this discount takes off `subtotal`.
    ///
    /// ```rust
    /// use chrono::{NaiveDate, Utc};
    /// use stockroom_core::{Discount, DiscountType, Money};
    ///
    /// let ten_percent = Discount {
    ///     id: "d1".into(),
    ///     code: "SAVE10".into(),
    ///     description: None,
    ///     discount_type: DiscountType::Percentage,
    ///     discount_value: 1000,
    ///     min_order_value: Money::zero(),
    ///     expires_at: None,
    ///     is_active: true,
    ///     created_at: Utc::now(),
    /// };
    /// let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    /// let off = ten_percent.amount_for(Money::from_cents(8000), today).unwrap();
    /// assert_eq!(off, Money::from_cents(800));
    /// ```
    pub fn amount_for(&self, subtotal: Money, today: NaiveDate) -> CoreResult<Money> {
        self.check_applicable(subtotal, today)?;

        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let bps = u32::try_from(self.discount_value.clamp(0, 10000)).unwrap_or(0);
                subtotal.percentage(bps)
            }
            DiscountType::Fixed => Money::from_cents(self.discount_value),
        };

        Ok(raw.min(subtotal).non_negative())
    }
}
