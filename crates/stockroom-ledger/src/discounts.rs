//! # Discount Registry
//!
//! Codes are stored trimmed and upper-cased, and are unique: the ledger
//! checks before inserting and the store enforces it for two concurrent
//! creates of the same code.

use stockroom_core::validation::{normalize_discount_code, validate_new_discount};
use stockroom_core::{CoreError, Discount, NewDiscount, ValidationError};
use stockroom_db::{Filter, OrderBy, Patch, StoreError, Table};
use tracing::{debug, info};

use crate::codec;
use crate::error::{LedgerError, LedgerResult};
use crate::Ledger;

fn duplicate_code(code: &str) -> LedgerError {
    ValidationError::Duplicate {
        field: "code".to_string(),
        value: code.to_string(),
    }
    .into()
}

impl Ledger {
    pub async fn create_discount(&self, input: NewDiscount) -> LedgerResult<Discount> {
        let input = validate_new_discount(input)?;

        if self.find_discount_by_code(&input.code).await?.is_some() {
            return Err(duplicate_code(&input.code));
        }

        let mut discount = Discount {
            id: String::new(),
            code: input.code,
            description: input.description,
            discount_type: input.discount_type,
            discount_value: input.discount_value,
            min_order_value: input.min_order_value,
            expires_at: input.expires_at,
            is_active: true,
            created_at: codec::now(),
        };

        discount.id = match self.insert(Table::Discounts, &discount).await {
            Ok(id) => id,
            // Lost a race with a concurrent create of the same code
            Err(LedgerError::StoreFailure(StoreError::UniqueViolation { .. })) => {
                return Err(duplicate_code(&discount.code))
            }
            Err(err) => return Err(err),
        };

        info!(
            discount_id = %discount.id,
            code = %discount.code,
            kind = ?discount.discount_type,
            value = discount.discount_value,
            "Discount created"
        );
        Ok(discount)
    }

    /// Activates or deactivates a discount.
    pub async fn toggle_discount(&self, id: &str, is_active: bool) -> LedgerResult<Discount> {
        let rows = self
            .store
            .update(
                Table::Discounts,
                &Filter::by_id(id),
                &Patch::new().set("is_active", is_active),
            )
            .await?;
        if rows == 0 {
            return Err(CoreError::not_found("Discount", id).into());
        }

        info!(discount_id = %id, is_active, "Discount toggled");
        self.fetch_required(Table::Discounts, "Discount", id).await
    }

    pub async fn delete_discount(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Discounts, "Discount", id).await
    }

    /// Discounts, newest first.
    pub async fn list_discounts(&self) -> LedgerResult<Vec<Discount>> {
        self.fetch_all(
            Table::Discounts,
            &Filter::all(),
            Some(&OrderBy::desc("created_at")),
        )
        .await
    }

    /// The discount for `code` if it is active and not yet expired today.
    pub async fn find_active_discount(&self, code: &str) -> LedgerResult<Option<Discount>> {
        let today = codec::now().date_naive();
        Ok(self
            .find_discount_by_code(code)
            .await?
            .filter(|d| d.is_active && !d.is_expired(today)))
    }

    /// Looks a code up regardless of its state.
    pub(crate) async fn find_discount_by_code(&self, code: &str) -> LedgerResult<Option<Discount>> {
        let code = normalize_discount_code(code)?;
        debug!(code = %code, "Looking up discount");

        let mut found: Vec<Discount> = self
            .fetch_all(Table::Discounts, &Filter::all().eq("code", code), None)
            .await?;
        Ok(found.pop())
    }
}
