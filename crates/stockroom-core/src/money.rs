//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Σ price × stock over a catalog in floating point:                      │
//! │    2.5 × 4 + 0.1 × 3 = 10.300000000000001  → needs round(.., 2)        │
//! │                                                                         │
//! │  In integer cents:                                                      │
//! │    250 × 4 + 10 × 3 = 1030 cents = 10.30   → exact, nothing to round   │
//! │                                                                         │
//! │  Rounding happens only where a division occurs (tax, percent off),     │
//! │  and it is always half-up on the cent.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::parse("40", "price").unwrap();
//! let total = price.multiply_quantity(2).unwrap();
//! assert_eq!(total, Money::from_cents(8000));
//! assert_eq!(total.to_string(), "80.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// A monetary value in the smallest currency unit (cents, paise).
///
/// Serialized as a bare integer so records in the store carry exact values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(2, 50).cents(), 250);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount typed by a user ("12", "12.5", "12.50").
    ///
    /// This is the boundary where "non-numeric price" becomes a
    /// `ValidationError` instead of reaching the ledger. More than two
    /// fractional digits is rejected rather than silently rounded.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::parse("12.5", "price").unwrap().cents(), 1250);
    /// assert!(Money::parse("twelve", "price").is_err());
    /// assert!(Money::parse("1.005", "price").is_err());
    /// ```
    pub fn parse(input: &str, field: &str) -> Result<Money, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("must be a number"));
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !minor.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a number"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most 2 decimal places"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount is too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => minor.parse().map_err(|_| invalid("must be a number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax, rounding half-up to the cent.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    /// use stockroom_core::types::TaxRate;
    ///
    /// // 5% of 364.00 = 18.20
    /// let tax = Money::from_cents(36400).calculate_tax(TaxRate::from_bps(500));
    /// assert_eq!(tax.cents(), 1820);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    pub fn percentage(&self, bps: u32) -> Money {
        let scaled = self.0 as i128 * bps as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Multiplies a unit price by a quantity; `None` if the product does
    /// not fit in i64 cents.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Clamps negative amounts to zero (change due, refunds owed).
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::zero())
    }
}

/// Renders as a plain decimal ("80.00"); the currency symbol is a
/// presentation concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("40", "price").unwrap().cents(), 4000);
        assert_eq!(Money::parse(" 2.5 ", "price").unwrap().cents(), 250);
        assert_eq!(Money::parse("0.05", "price").unwrap().cents(), 5);
        assert_eq!(Money::parse(".5", "price").unwrap().cents(), 50);
        assert_eq!(Money::parse("-3.10", "price").unwrap().cents(), -310);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("", "price"),
            Err(ValidationError::Required { .. })
        ));
        for bad in ["abc", "1.2.3", "1,50", "1.005", ".", "-", "1e3"] {
            assert!(
                matches!(
                    Money::parse(bad, "price"),
                    Err(ValidationError::InvalidFormat { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(8000).to_string(), "80.00");
        assert_eq!(Money::from_cents(1821).to_string(), "18.21");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 5% of 0.10 = 0.005 → 0.01
        assert_eq!(Money::from_cents(10).percentage(500).cents(), 1);
        // 5% of 0.09 = 0.0045 → 0.00
        assert_eq!(Money::from_cents(9).percentage(500).cents(), 0);
        assert_eq!(Money::from_cents(-10).percentage(500).cents(), -1);
    }

    #[test]
    fn test_sum_and_clamp() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .iter()
            .sum();
        assert_eq!(total.cents(), 350);

        assert_eq!(Money::from_cents(-40).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(40).non_negative().cents(), 40);
    }

    #[test]
    fn test_multiply_quantity_overflow() {
        let price = Money::from_cents(4000);
        assert_eq!(price.multiply_quantity(2), Some(Money::from_cents(8000)));
        assert_eq!(price.multiply_quantity(i64::MAX / 2), None);
        assert_eq!(Money::zero().multiply_quantity(i64::MAX), Some(Money::zero()));

        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(4000)).unwrap();
        assert_eq!(json, "4000");
        let back: Money = serde_json::from_str("250").unwrap();
        assert_eq!(back.cents(), 250);
    }
}
