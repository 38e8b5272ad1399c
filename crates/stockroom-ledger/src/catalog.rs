//! Products, customers and suppliers.

use stockroom_core::validation::{
    validate_new_customer, validate_new_product, validate_new_supplier, validate_stock,
};
use stockroom_core::{
    CoreError, Customer, NewCustomer, NewProduct, NewSupplier, Product, Supplier,
};
use stockroom_db::{Filter, OrderBy, Patch, Table};
use tracing::info;

use crate::codec;
use crate::error::LedgerResult;
use crate::Ledger;

impl Ledger {
    // =========================================================================
    // Products
    // =========================================================================

    pub async fn add_product(&self, input: NewProduct) -> LedgerResult<Product> {
        let input = validate_new_product(input)?;

        let mut product = Product {
            id: String::new(),
            name: input.name,
            price: input.price,
            category: input.category,
            stock: input.stock,
            created_at: codec::now(),
        };
        product.id = self.insert(Table::Products, &product).await?;

        info!(
            product_id = %product.id,
            name = %product.name,
            price = %product.price,
            stock = product.stock,
            "Product added"
        );
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> LedgerResult<Product> {
        self.fetch_required(Table::Products, "Product", id).await
    }

    /// Every product, by name.
    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        self.fetch_all(Table::Products, &Filter::all(), Some(&OrderBy::asc("name")))
            .await
    }

    /// Overwrites a product's stock count after a physical count.
    ///
    /// This is the only absolute write to `stock`; sales, receipts and
    /// returns always go through relative increments.
    pub async fn set_stock(&self, id: &str, stock: i64) -> LedgerResult<Product> {
        validate_stock(stock)?;

        let rows = self
            .store
            .update(
                Table::Products,
                &Filter::by_id(id),
                &Patch::new().set("stock", stock),
            )
            .await?;
        if rows == 0 {
            return Err(CoreError::not_found("Product", id).into());
        }

        info!(product_id = %id, stock, "Stock corrected");
        self.get_product(id).await
    }

    /// Deletes a product. Sales, orders and returns that name it keep their
    /// id and show it as missing.
    pub async fn delete_product(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Products, "Product", id).await
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn add_customer(&self, input: NewCustomer) -> LedgerResult<Customer> {
        let input = validate_new_customer(input)?;

        let mut customer = Customer {
            id: String::new(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            address: input.address,
            created_at: codec::now(),
        };
        customer.id = self.insert(Table::Customers, &customer).await?;

        info!(customer_id = %customer.id, name = %customer.name, "Customer added");
        Ok(customer)
    }

    /// Customers, newest first.
    pub async fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        self.fetch_all(
            Table::Customers,
            &Filter::all(),
            Some(&OrderBy::desc("created_at")),
        )
        .await
    }

    pub async fn delete_customer(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Customers, "Customer", id).await
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn add_supplier(&self, input: NewSupplier) -> LedgerResult<Supplier> {
        let input = validate_new_supplier(input)?;

        let mut supplier = Supplier {
            id: String::new(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            address: input.address,
            product_type: input.product_type,
            created_at: codec::now(),
        };
        supplier.id = self.insert(Table::Suppliers, &supplier).await?;

        info!(supplier_id = %supplier.id, name = %supplier.name, "Supplier added");
        Ok(supplier)
    }

    /// Suppliers, newest first.
    pub async fn list_suppliers(&self) -> LedgerResult<Vec<Supplier>> {
        self.fetch_all(
            Table::Suppliers,
            &Filter::all(),
            Some(&OrderBy::desc("created_at")),
        )
        .await
    }

    pub async fn delete_supplier(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Suppliers, "Supplier", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, LedgerConfig};
    use stockroom_core::{Category, Money};

    fn ledger() -> Ledger {
        Ledger::in_memory(LedgerConfig::default())
    }

    fn new_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Money::from_cents(250),
            category: Category::Snacks,
            stock,
        }
    }

    #[tokio::test]
    async fn test_add_and_get_product() {
        let ledger = ledger();
        let added = ledger.add_product(new_product("  Chips ", 4)).await.unwrap();
        assert_eq!(added.name, "Chips");

        let fetched = ledger.get_product(&added.id).await.unwrap();
        assert_eq!(fetched, added);
    }

    #[tokio::test]
    async fn test_add_product_validation() {
        let ledger = ledger();
        let err = ledger.add_product(new_product("Chips", -1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = ledger.add_product(new_product("   ", 1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(ledger.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_products_by_name() {
        let ledger = ledger();
        ledger.add_product(new_product("Rice", 1)).await.unwrap();
        ledger.add_product(new_product("Bread", 1)).await.unwrap();

        let names: Vec<String> = ledger
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bread", "Rice"]);
    }

    #[tokio::test]
    async fn test_set_stock() {
        let ledger = ledger();
        let product = ledger.add_product(new_product("Rice", 1)).await.unwrap();

        let corrected = ledger.set_stock(&product.id, 40).await.unwrap();
        assert_eq!(corrected.stock, 40);

        let err = ledger.set_stock(&product.id, -3).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = ledger.set_stock("missing", 3).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_parties() {
        let ledger = ledger();
        let customer = ledger
            .add_customer(NewCustomer {
                name: " Asha ".to_string(),
                phone: Some("   ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.phone, None);

        let supplier = ledger
            .add_supplier(NewSupplier {
                name: "Fresh Farms".to_string(),
                product_type: Some("Vegetables".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(ledger.list_customers().await.unwrap().len(), 1);
        assert_eq!(ledger.list_suppliers().await.unwrap()[0], supplier);

        ledger.delete_supplier(&supplier.id).await.unwrap();
        assert!(ledger.list_suppliers().await.unwrap().is_empty());
        assert!(ledger.delete_customer("missing").await.unwrap_err().is_not_found());
    }
}
