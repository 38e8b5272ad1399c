//! # Stock-Crediting Status Changes
//!
//! Purchase orders (`Received`) and returns (`Approved`) share one state
//! machine: the first arrival in the crediting status adds the record's
//! quantity to the product's stock, and that status is terminal.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  change_status(id, new)                                                 │
//! │       │                                                                 │
//! │       ├── record missing ─────────────────────────► NotFound            │
//! │       ├── current == CREDITING, new == CREDITING ──► AlreadyApplied     │
//! │       ├── current == CREDITING, new != CREDITING ──► InvalidTransition  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update(status = new  where id = ? and status != CREDITING)            │
//! │       │                                                                 │
//! │       ├── 0 rows: someone else got there first ──► re-read, as above   │
//! │       ├── new != CREDITING ───────────────────────► Updated             │
//! │       ▼                                                                 │
//! │  update(products, stock += qty where id = product_id)                  │
//! │       │                                                                 │
//! │       ├── 1 row ──────────────────────────────────► StockCredited       │
//! │       ├── 0 rows (product deleted) ───────────────► ProductMissing      │
//! │       └── store error ──► status reverted, error returned              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The compare-and-set on `status` is what makes the credit happen once
//! even when two requests race to receive the same order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use stockroom_core::{CoreError, CreditStatus, PurchaseOrder, SaleReturn};
use stockroom_db::{Filter, Patch, StoreError, Table};
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::error::{LedgerError, LedgerResult};
use crate::Ledger;

/// What a status change did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatusChange {
    /// Status written; stock untouched.
    Updated,
    /// Status moved into the crediting state and stock was credited.
    StockCredited { product_id: String, quantity: i64 },
    /// Already in the crediting state; nothing written.
    AlreadyApplied,
    /// Status moved into the crediting state but the product no longer
    /// exists, so there was no stock to credit.
    ProductMissing { product_id: String },
}

/// A record whose status can credit stock.
pub(crate) trait Creditable: DeserializeOwned {
    type Status: CreditStatus;

    const TABLE: Table;

    fn status(&self) -> Self::Status;
    fn product_id(&self) -> &str;
    fn quantity(&self) -> i64;
}

impl Creditable for PurchaseOrder {
    type Status = stockroom_core::PurchaseOrderStatus;

    const TABLE: Table = Table::PurchaseOrders;

    fn status(&self) -> Self::Status {
        self.status
    }

    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

impl Creditable for SaleReturn {
    type Status = stockroom_core::ReturnStatus;

    const TABLE: Table = Table::Returns;

    fn status(&self) -> Self::Status {
        self.status
    }

    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

fn transition_error<S: CreditStatus>(id: &str, from: S, to: S) -> LedgerError {
    CoreError::InvalidStatusTransition {
        entity: S::ENTITY,
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
    .into()
}

/// Outcome when the record is already in the crediting status.
fn settled<S: CreditStatus>(id: &str, new_status: S) -> LedgerResult<StatusChange> {
    if new_status.is_crediting() {
        debug!(entity = S::ENTITY, id = %id, status = %new_status, "Status already applied");
        Ok(StatusChange::AlreadyApplied)
    } else {
        Err(transition_error(id, S::CREDITING, new_status))
    }
}

impl Ledger {
    pub(crate) async fn change_status<R: Creditable>(
        &self,
        id: &str,
        new_status: R::Status,
    ) -> LedgerResult<StatusChange> {
        let table = R::TABLE;
        let entity = <R::Status as CreditStatus>::ENTITY;
        debug!(entity, id = %id, status = %new_status, "Changing status");

        let record: R = self.fetch_required(table, entity, id).await?;
        let previous = record.status();
        if previous.is_crediting() {
            return settled(id, new_status);
        }

        let crediting = codec::to_value(table, &<R::Status as CreditStatus>::CREDITING)?;
        let guard = Filter::by_id(id).ne("status", crediting.clone());
        let patch = Patch::new().set("status", codec::to_value(table, &new_status)?);

        let rows = self.store.update(table, &guard, &patch).await?;
        if rows == 0 {
            // Lost a race: either deleted or moved into the crediting status.
            return match self.fetch::<R>(table, id).await? {
                None => Err(CoreError::not_found(entity, id).into()),
                Some(current) if current.status().is_crediting() => settled(id, new_status),
                Some(current) => Err(StoreError::Internal(format!(
                    "{entity} {id} in status {} did not accept the update",
                    current.status()
                ))
                .into()),
            };
        }

        if !new_status.is_crediting() {
            info!(entity, id = %id, from = %previous, to = %new_status, "Status updated");
            return Ok(StatusChange::Updated);
        }

        let product_id = record.product_id().to_string();
        let quantity = record.quantity();
        let restore = Patch::new().set("status", codec::to_value(table, &previous)?);
        let credit = self
            .store
            .update(
                Table::Products,
                &Filter::by_id(product_id.as_str()),
                &Patch::new().increment("stock", quantity),
            )
            .await;

        match credit {
            Ok(0) => {
                warn!(
                    entity,
                    id = %id,
                    product_id = %product_id,
                    quantity,
                    "Product no longer exists, no stock credited"
                );
                Ok(StatusChange::ProductMissing { product_id })
            }
            Ok(_) => {
                info!(
                    entity,
                    id = %id,
                    product_id = %product_id,
                    quantity,
                    "Stock credited"
                );
                Ok(StatusChange::StockCredited {
                    product_id,
                    quantity,
                })
            }
            Err(err) => {
                let revert = Filter::by_id(id).eq("status", crediting);
                if let Err(revert_err) = self.store.update(table, &revert, &restore).await {
                    error!(
                        entity,
                        id = %id,
                        product_id = %product_id,
                        quantity,
                        error = %revert_err,
                        "Stock credit failed and status could not be reverted; record is marked credited without stock"
                    );
                } else {
                    warn!(entity, id = %id, error = %err, "Stock credit failed, status reverted");
                }
                Err(err.into())
            }
        }
    }
}
