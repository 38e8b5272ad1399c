//! # Purchase-Order Receiver
//!
//! Orders start `Pending`. Marking one `Received` credits its quantity to
//! the product exactly once; see [`crate::status`].

use std::collections::HashMap;

use serde::Serialize;
use stockroom_core::validation::validate_new_purchase_order;
use stockroom_core::{
    NewPurchaseOrder, Product, PurchaseOrder, PurchaseOrderStatus, Supplier, MISSING_REFERENCE,
};
use stockroom_db::{Filter, OrderBy, Table};
use tracing::info;

use crate::codec;
use crate::error::LedgerResult;
use crate::status::StatusChange;
use crate::Ledger;

/// A purchase order with the names it refers to, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderView {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    /// `"-"` when the product was deleted.
    pub product_name: String,
    /// `"-"` when the supplier was deleted.
    pub supplier_name: String,
}

/// `id → name` for every record of a table.
pub(crate) fn names_by_id<I>(records: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    records.into_iter().collect()
}

pub(crate) fn name_or_missing(names: &HashMap<String, String>, id: &str) -> String {
    names
        .get(id)
        .cloned()
        .unwrap_or_else(|| MISSING_REFERENCE.to_string())
}

impl Ledger {
    pub async fn create_purchase_order(&self, input: NewPurchaseOrder) -> LedgerResult<PurchaseOrder> {
        let input = validate_new_purchase_order(input)?;

        let product: Product = self
            .fetch_required(Table::Products, "Product", &input.product_id)
            .await?;
        let supplier: Supplier = self
            .fetch_required(Table::Suppliers, "Supplier", &input.supplier_id)
            .await?;

        let created_at = codec::now();
        let mut order = PurchaseOrder {
            id: String::new(),
            product_id: product.id,
            supplier_id: supplier.id,
            quantity: input.quantity,
            unit_cost: input.unit_cost,
            status: PurchaseOrderStatus::Pending,
            order_date: input.order_date.unwrap_or_else(|| created_at.date_naive()),
            created_at,
        };
        let total = order.total_cost()?;
        order.id = self.insert(Table::PurchaseOrders, &order).await?;

        info!(
            order_id = %order.id,
            product = %product.name,
            supplier = %supplier.name,
            quantity = order.quantity,
            total = %total,
            "Purchase order created"
        );
        Ok(order)
    }

    pub async fn get_purchase_order(&self, id: &str) -> LedgerResult<PurchaseOrder> {
        self.fetch_required(Table::PurchaseOrders, "PurchaseOrder", id)
            .await
    }

    /// Purchase orders, newest first, with product and supplier names.
    pub async fn list_purchase_orders(&self) -> LedgerResult<Vec<PurchaseOrderView>> {
        let orders: Vec<PurchaseOrder> = self
            .fetch_all(
                Table::PurchaseOrders,
                &Filter::all(),
                Some(&OrderBy::desc("created_at")),
            )
            .await?;

        let products: Vec<Product> = self.fetch_all(Table::Products, &Filter::all(), None).await?;
        let suppliers: Vec<Supplier> = self
            .fetch_all(Table::Suppliers, &Filter::all(), None)
            .await?;

        let product_names = names_by_id(products.into_iter().map(|p| (p.id, p.name)));
        let supplier_names = names_by_id(suppliers.into_iter().map(|s| (s.id, s.name)));

        Ok(orders
            .into_iter()
            .map(|order| PurchaseOrderView {
                product_name: name_or_missing(&product_names, &order.product_id),
                supplier_name: name_or_missing(&supplier_names, &order.supplier_id),
                order,
            })
            .collect())
    }

    /// Moves an order to `status`.
    ///
    /// ## Outcomes
    /// - `Received` the first time: stock credited (or `ProductMissing`)
    /// - `Received` again: `AlreadyApplied`, stock untouched
    /// - anything else after `Received`: `InvalidStatusTransition`
    pub async fn update_order_status(
        &self,
        id: &str,
        status: PurchaseOrderStatus,
    ) -> LedgerResult<StatusChange> {
        self.change_status::<PurchaseOrder>(id, status).await
    }

    pub async fn delete_purchase_order(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::PurchaseOrders, "PurchaseOrder", id).await
    }
}
