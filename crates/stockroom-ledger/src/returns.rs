//! # Return Approver
//!
//! Returns are raised against a sale and start `Pending`. Approving one
//! puts its quantity back on the shelf exactly once; rejecting one leaves
//! stock alone.

use serde::Serialize;
use stockroom_core::validation::{
    validate_required, validate_return_against_sale, ReturnedSoFar,
};
use stockroom_core::{
    NewReturn, Product, ReturnStatus, Sale, SaleReturn, MAX_NAME_LENGTH,
};
use stockroom_db::{Filter, OrderBy, Table};
use tracing::info;

use crate::codec;
use crate::error::LedgerResult;
use crate::purchasing::{name_or_missing, names_by_id};
use crate::status::StatusChange;
use crate::Ledger;

/// A return with the product name, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnView {
    #[serde(flatten)]
    pub sale_return: SaleReturn,
    /// `"-"` when the product was deleted.
    pub product_name: String,
}

impl Ledger {
    /// Raises a return against a sale.
    ///
    /// The quantity may not exceed what is left of the sale after earlier
    /// returns that were not rejected; the refund may not exceed what is
    /// left of the sale total after their refunds.
    pub async fn create_return(&self, input: NewReturn) -> LedgerResult<SaleReturn> {
        let sale_id = validate_required("sale_id", &input.sale_id, MAX_NAME_LENGTH)?;
        let sale: Sale = self.fetch_required(Table::Sales, "Sale", &sale_id).await?;

        let earlier: Vec<SaleReturn> = self
            .fetch_all(Table::Returns, &Filter::all().eq("sale_id", sale_id.as_str()), None)
            .await?;
        let already = earlier
            .iter()
            .filter(|r| r.status != ReturnStatus::Rejected)
            .fold(ReturnedSoFar::default(), |acc, r| {
                acc.add(r.quantity, r.refund_amount)
            });

        let input = validate_return_against_sale(input, &sale, already)?;

        let mut sale_return = SaleReturn {
            id: String::new(),
            sale_id: sale.id,
            product_id: sale.product_id,
            quantity: input.quantity,
            refund_amount: input.refund_amount,
            reason: input.reason,
            status: ReturnStatus::Pending,
            created_at: codec::now(),
        };
        sale_return.id = self.insert(Table::Returns, &sale_return).await?;

        info!(
            return_id = %sale_return.id,
            sale_id = %sale_return.sale_id,
            quantity = sale_return.quantity,
            refund = %sale_return.refund_amount,
            "Return created"
        );
        Ok(sale_return)
    }

    pub async fn get_return(&self, id: &str) -> LedgerResult<SaleReturn> {
        self.fetch_required(Table::Returns, "Return", id).await
    }

    /// Returns, newest first, with product names.
    pub async fn list_returns(&self) -> LedgerResult<Vec<ReturnView>> {
        let returns: Vec<SaleReturn> = self
            .fetch_all(
                Table::Returns,
                &Filter::all(),
                Some(&OrderBy::desc("created_at")),
            )
            .await?;
        let products: Vec<Product> = self.fetch_all(Table::Products, &Filter::all(), None).await?;
        let names = names_by_id(products.into_iter().map(|p| (p.id, p.name)));

        Ok(returns
            .into_iter()
            .map(|sale_return| ReturnView {
                product_name: name_or_missing(&names, &sale_return.product_id),
                sale_return,
            })
            .collect())
    }

    /// Moves a return to `status`; `Approved` credits stock once and is
    /// terminal.
    pub async fn update_return_status(
        &self,
        id: &str,
        status: ReturnStatus,
    ) -> LedgerResult<StatusChange> {
        self.change_status::<SaleReturn>(id, status).await
    }

    pub async fn delete_return(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Returns, "Return", id).await
    }
}
