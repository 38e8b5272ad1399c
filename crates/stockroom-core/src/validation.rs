//! # Validation Module
//!
//! Input validation for every record the ledger writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (forms, JSON)                                  │
//! │  ├── Text → typed values (Money::parse, Category::from_str)            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger operation                                             │
//! │  └── THIS MODULE: normalise + business rule validation                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record store                                                 │
//! │  ├── json_valid body CHECK                                             │
//! │  └── UNIQUE index on discount code                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `validate_new_*` functions return a normalised copy of their input
//! (trimmed names, blank optionals dropped, upper-cased codes) so the
//! ledger only ever persists clean values.
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_quantity, normalize_discount_code};
//!
//! validate_quantity(5).unwrap();
//! assert_eq!(normalize_discount_code(" save10 ").unwrap(), "SAVE10");
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    DiscountType, NewCustomer, NewDiscount, NewExpense, NewProduct, NewPurchaseOrder, NewReturn,
    NewSupplier, Sale,
};
use crate::{DEFAULT_EXPENSE_CATEGORY, MAX_CODE_LENGTH, MAX_NAME_LENGTH, MAX_TEXT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Trims `value` and rejects it when empty or longer than `max` characters.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional text field; blank becomes `None`.
pub fn normalize_optional(
    field: &str,
    value: Option<String>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Normalises a discount code: trimmed, upper-cased, letters, digits,
/// hyphens and underscores only.
///
/// ```rust
/// use stockroom_core::validation::normalize_discount_code;
///
/// assert_eq!(normalize_discount_code("festive-5").unwrap(), "FESTIVE-5");
/// assert!(normalize_discount_code("   ").is_err());
/// assert!(normalize_discount_code("TEN OFF").is_err());
/// ```
pub fn normalize_discount_code(code: &str) -> ValidationResult<String> {
    let code = validate_required("code", code, MAX_CODE_LENGTH)?;

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being sold, ordered or returned.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sales entry: "Sell 5 Tomatoes"                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → conditional stock decrement                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an absolute stock level (zero allowed).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a non-negative amount (prices, refunds, minimum order values).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a strictly positive amount.
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// `unit × quantity`, or `OutOfRange` on `field` naming the largest count
/// whose total still fits.
pub fn line_total(field: &str, unit: Money, quantity: i64) -> ValidationResult<Money> {
    unit.multiply_quantity(quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX / unit.cents().saturating_abs().max(1),
        })
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a discount value against its type.
///
/// Percentage values are basis points in (0, 10000]; fixed values are
/// positive cents.
pub fn validate_discount_value(kind: DiscountType, value: i64) -> ValidationResult<()> {
    match kind {
        DiscountType::Percentage if value <= 0 || value > 10000 => {
            Err(ValidationError::OutOfRange {
                field: "discount_value".to_string(),
                min: 1,
                max: 10000,
            })
        }
        DiscountType::Fixed if value <= 0 => Err(ValidationError::MustBePositive {
            field: "discount_value".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_new_product(input: NewProduct) -> ValidationResult<NewProduct> {
    let name = validate_required("name", &input.name, MAX_NAME_LENGTH)?;
    validate_non_negative("price", input.price)?;
    validate_stock(input.stock)?;

    Ok(NewProduct { name, ..input })
}

pub fn validate_new_customer(input: NewCustomer) -> ValidationResult<NewCustomer> {
    Ok(NewCustomer {
        name: validate_required("name", &input.name, MAX_NAME_LENGTH)?,
        phone: normalize_optional("phone", input.phone, MAX_NAME_LENGTH)?,
        email: normalize_optional("email", input.email, MAX_NAME_LENGTH)?,
        address: normalize_optional("address", input.address, MAX_TEXT_LENGTH)?,
    })
}

pub fn validate_new_supplier(input: NewSupplier) -> ValidationResult<NewSupplier> {
    Ok(NewSupplier {
        name: validate_required("name", &input.name, MAX_NAME_LENGTH)?,
        phone: normalize_optional("phone", input.phone, MAX_NAME_LENGTH)?,
        email: normalize_optional("email", input.email, MAX_NAME_LENGTH)?,
        address: normalize_optional("address", input.address, MAX_TEXT_LENGTH)?,
        product_type: normalize_optional("product_type", input.product_type, MAX_NAME_LENGTH)?,
    })
}

pub fn validate_new_purchase_order(input: NewPurchaseOrder) -> ValidationResult<NewPurchaseOrder> {
    let product_id = validate_required("product_id", &input.product_id, MAX_NAME_LENGTH)?;
    let supplier_id = validate_required("supplier_id", &input.supplier_id, MAX_NAME_LENGTH)?;
    validate_quantity(input.quantity)?;
    validate_non_negative("unit_cost", input.unit_cost)?;
    line_total("quantity", input.unit_cost, input.quantity)?;

    Ok(NewPurchaseOrder {
        product_id,
        supplier_id,
        ..input
    })
}

pub fn validate_new_discount(input: NewDiscount) -> ValidationResult<NewDiscount> {
    let code = normalize_discount_code(&input.code)?;
    validate_discount_value(input.discount_type, input.discount_value)?;
    validate_non_negative("min_order_value", input.min_order_value)?;

    Ok(NewDiscount {
        code,
        description: normalize_optional("description", input.description, MAX_TEXT_LENGTH)?,
        ..input
    })
}

/// Normalises an expense; a blank category becomes "General".
pub fn validate_new_expense(input: NewExpense) -> ValidationResult<NewExpense> {
    let title = validate_required("title", &input.title, MAX_NAME_LENGTH)?;
    validate_positive("amount", input.amount)?;
    let category = normalize_optional("category", input.category, MAX_NAME_LENGTH)?
        .unwrap_or_else(|| DEFAULT_EXPENSE_CATEGORY.to_string());

    Ok(NewExpense {
        title,
        category: Some(category),
        note: normalize_optional("note", input.note, MAX_TEXT_LENGTH)?,
        ..input
    })
}

/// Validates a return against the sale it refers to.
///
/// ## Rules
/// - quantity in `1..=sale.quantity - already.quantity`
/// - refund in `0..=sale.total_price - already.refunded`
///
/// `already` sums the earlier returns of the same sale that were not
/// rejected.
pub fn validate_return_against_sale(
    input: NewReturn,
    sale: &Sale,
    already: ReturnedSoFar,
) -> ValidationResult<NewReturn> {
    validate_quantity(input.quantity)?;
    let returnable = sale.quantity.saturating_sub(already.quantity).max(0);
    if input.quantity > returnable {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: returnable,
        });
    }

    validate_non_negative("refund_amount", input.refund_amount)?;
    let refundable = sale
        .total_price
        .cents()
        .saturating_sub(already.refunded.cents())
        .max(0);
    if input.refund_amount.cents() > refundable {
        return Err(ValidationError::OutOfRange {
            field: "refund_amount".to_string(),
            min: 0,
            max: refundable,
        });
    }

    Ok(NewReturn {
        reason: normalize_optional("reason", input.reason, MAX_TEXT_LENGTH)?,
        ..input
    })
}

/// Units and refunds already claimed against one sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReturnedSoFar {
    pub quantity: i64,
    pub refunded: Money,
}

impl ReturnedSoFar {
    /// Adds one earlier return, saturating at the i64 bounds.
    pub fn add(self, quantity: i64, refund: Money) -> Self {
        ReturnedSoFar {
            quantity: self.quantity.saturating_add(quantity),
            refunded: Money::from_cents(self.refunded.cents().saturating_add(refund.cents())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, PaymentMethod};
    use chrono::Utc;

    fn sale(quantity: i64, total: i64) -> Sale {
        Sale {
            id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity,
            total_price: Money::from_cents(total),
            discount: Money::zero(),
            discount_code: None,
            amount_paid: None,
            payment_method: PaymentMethod::Cash,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_required_trims() {
        assert_eq!(validate_required("name", "  Rice ", 10).unwrap(), "Rice");
        assert!(matches!(
            validate_required("name", "   ", 10),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_required("name", "Basmati Rice", 5),
            Err(ValidationError::TooLong { max: 5, .. })
        ));
    }

    #[test]
    fn test_normalize_optional_drops_blank() {
        assert_eq!(normalize_optional("phone", Some("  ".into()), 20).unwrap(), None);
        assert_eq!(normalize_optional("phone", None, 20).unwrap(), None);
        assert_eq!(
            normalize_optional("phone", Some(" 98765 ".into()), 20).unwrap(),
            Some("98765".to_string())
        );
    }

    #[test]
    fn test_validate_new_product() {
        let ok = validate_new_product(NewProduct {
            name: " Milk ".to_string(),
            price: Money::from_cents(5500),
            category: Category::Dairy,
            stock: 0,
        })
        .unwrap();
        assert_eq!(ok.name, "Milk");

        let negative_stock = validate_new_product(NewProduct {
            name: "Milk".to_string(),
            price: Money::from_cents(5500),
            category: Category::Dairy,
            stock: -1,
        });
        assert!(negative_stock.is_err());

        let negative_price = validate_new_product(NewProduct {
            name: "Milk".to_string(),
            price: Money::from_cents(-1),
            category: Category::Dairy,
            stock: 3,
        });
        assert!(negative_price.is_err());
    }

    #[test]
    fn test_validate_discount_value() {
        assert!(validate_discount_value(DiscountType::Percentage, 1000).is_ok());
        assert!(validate_discount_value(DiscountType::Percentage, 10000).is_ok());
        assert!(validate_discount_value(DiscountType::Percentage, 0).is_err());
        assert!(validate_discount_value(DiscountType::Percentage, 10001).is_err());
        assert!(validate_discount_value(DiscountType::Fixed, 5000).is_ok());
        assert!(validate_discount_value(DiscountType::Fixed, 0).is_err());
    }

    #[test]
    fn test_validate_new_expense_defaults_category() {
        let expense = validate_new_expense(NewExpense {
            title: "Electricity".to_string(),
            amount: Money::from_cents(120000),
            category: Some(" ".to_string()),
            note: None,
            expense_date: None,
        })
        .unwrap();
        assert_eq!(expense.category.as_deref(), Some("General"));

        let zero = validate_new_expense(NewExpense {
            title: "Nothing".to_string(),
            amount: Money::zero(),
            category: None,
            note: None,
            expense_date: None,
        });
        assert!(matches!(zero, Err(ValidationError::MustBePositive { .. })));
    }

    #[test]
    fn test_validate_return_against_sale() {
        let sale = sale(3, 12000);
        let input = |quantity, refund| NewReturn {
            sale_id: "s1".to_string(),
            quantity,
            refund_amount: Money::from_cents(refund),
            reason: Some("  damaged ".to_string()),
        };

        let none = ReturnedSoFar::default();
        let ok = validate_return_against_sale(input(3, 12000), &sale, none).unwrap();
        assert_eq!(ok.reason.as_deref(), Some("damaged"));

        assert!(validate_return_against_sale(input(4, 100), &sale, none).is_err());
        assert!(validate_return_against_sale(input(0, 100), &sale, none).is_err());
        assert!(validate_return_against_sale(input(1, 12001), &sale, none).is_err());
    }

    #[test]
    fn test_earlier_returns_reduce_returnable_quantity() {
        let sale = sale(3, 12000);
        let input = |quantity| NewReturn {
            sale_id: "s1".to_string(),
            quantity,
            refund_amount: Money::from_cents(4000),
            reason: None,
        };

        let two = ReturnedSoFar::default().add(2, Money::from_cents(8000));
        assert!(validate_return_against_sale(input(1), &sale, two).is_ok());
        assert!(matches!(
            validate_return_against_sale(input(2), &sale, two),
            Err(ValidationError::OutOfRange { max: 1, .. })
        ));
        let three = two.add(1, Money::from_cents(4000));
        assert!(validate_return_against_sale(input(1), &sale, three).is_err());
    }

    #[test]
    fn test_earlier_refunds_reduce_refundable_amount() {
        let sale = sale(2, 8000);
        let full_refund = |quantity| NewReturn {
            sale_id: "s1".to_string(),
            quantity,
            refund_amount: Money::from_cents(8000),
            reason: None,
        };

        let first = ReturnedSoFar::default();
        assert!(validate_return_against_sale(full_refund(1), &sale, first).is_ok());

        let after_first = first.add(1, Money::from_cents(8000));
        assert!(matches!(
            validate_return_against_sale(full_refund(1), &sale, after_first),
            Err(ValidationError::OutOfRange { ref field, max: 0, .. }) if field == "refund_amount"
        ));

        let partly = first.add(1, Money::from_cents(3000));
        assert!(matches!(
            validate_return_against_sale(full_refund(1), &sale, partly),
            Err(ValidationError::OutOfRange { max: 5000, .. })
        ));
    }

    #[test]
    fn test_line_total_overflow_is_out_of_range() {
        assert_eq!(
            line_total("quantity", Money::from_cents(4000), 3).unwrap(),
            Money::from_cents(12000)
        );
        assert!(matches!(
            line_total("quantity", Money::from_cents(4000), i64::MAX / 2),
            Err(ValidationError::OutOfRange { min: 0, max, .. }) if max == i64::MAX / 4000
        ));
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(500).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}
