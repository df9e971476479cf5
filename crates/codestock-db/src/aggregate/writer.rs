//! # Aggregate Writer
//!
//! Persists a product or an order together with its children.
//!
//! ## Write Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  write_product(request)                                                 │
//! │                                                                         │
//! │  0. [Verify only] every category id exists?  no → DanglingReference    │
//! │  1. products        insert (id generated) / upsert (id supplied)       │
//! │  2. prices          upsert (product, currency) for each price          │
//! │  3. product_categories                                                  │
//! │       id supplied → delete all links of the product first              │
//! │       insert one link per distinct category id                         │
//! │                                                                         │
//! │  write_order(request)                                                   │
//! │                                                                         │
//! │  0. [Verify only] every product id exists?   no → DanglingReference    │
//! │  1. orders          insert / upsert                                    │
//! │  2. product_orders  upsert (product, order) with the given quantity    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The parent always goes first: children need its id. Duplicate keys in
//! a single request collapse to the last occurrence, exactly as the
//! store's insert-or-replace would.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::config::ReferencePolicy;
use crate::error::{CatalogError, CatalogResult, WriteStage};
use crate::repository::product::NewProduct;
use crate::repository::{
    CategoryRepository, OrderRepository, PriceRepository, ProductCategoryRepository,
    ProductOrderRepository, ProductRepository,
};
use codestock_core::keys::last_write_wins;
use codestock_core::{
    Order, OrderRequest, Price, Product, ProductCategory, ProductOrder, ProductRequest,
};

/// Writes aggregates on one connection (normally an open transaction).
#[derive(Debug)]
pub struct AggregateWriter<'c> {
    conn: &'c mut SqliteConnection,
    policy: ReferencePolicy,
}

impl<'c> AggregateWriter<'c> {
    pub fn new(conn: &'c mut SqliteConnection, policy: ReferencePolicy) -> Self {
        AggregateWriter { conn, policy }
    }

    // =========================================================================
    // Product
    // =========================================================================

    /// Writes a product, its prices and its category links.
    ///
    /// ## Returns
    /// The stored product row (with its generated id for new products).
    pub async fn write_product(&mut self, request: &ProductRequest) -> CatalogResult<Product> {
        let label = request
            .id
            .map_or_else(|| "new".to_string(), |id| id.to_string());

        if self.policy == ReferencePolicy::Verify {
            for &category_id in &request.category_ids {
                let exists = CategoryRepository::new(&mut *self.conn)
                    .exists(category_id)
                    .await
                    .map_err(CatalogError::write("Product", &label, WriteStage::ReferenceCheck))?;
                if !exists {
                    return Err(CatalogError::DanglingReference {
                        entity: "Category",
                        id: category_id.to_string(),
                    });
                }
            }
        }

        // 1. Parent
        let mut products = ProductRepository::new(&mut *self.conn);
        let product = match request.id {
            Some(id) => {
                products
                    .upsert(&Product {
                        id,
                        code: request.code.clone(),
                        name: request.name.clone(),
                        characteristics: request.characteristics.clone(),
                        company_id: request.company_id,
                    })
                    .await
            }
            None => {
                products
                    .insert(NewProduct {
                        code: &request.code,
                        name: &request.name,
                        characteristics: request.characteristics.as_deref(),
                        company_id: request.company_id,
                    })
                    .await
            }
        }
        .map_err(CatalogError::write("Product", &label, WriteStage::ParentUpsert))?;

        let product_id = product.id;
        debug!(product_id = %product_id, "Product row written");

        // 2. Prices
        let prices = last_write_wins(request.prices.iter().map(|spec| Price {
            product_id,
            currency_id: spec.currency_id,
            amount: spec.amount,
        }));
        for price in &prices {
            PriceRepository::new(&mut *self.conn)
                .upsert(price)
                .await
                .map_err(CatalogError::write("Product", product_id, WriteStage::PriceUpsert))?;
        }

        // 3. Category links
        if request.id.is_some() {
            ProductCategoryRepository::new(&mut *self.conn)
                .delete_by_product(product_id)
                .await
                .map_err(CatalogError::write("Product", product_id, WriteStage::CategoryUnlink))?;
        }
        let links = last_write_wins(request.category_ids.iter().map(|&category_id| {
            ProductCategory {
                category_id,
                product_id,
            }
        }));
        for link in &links {
            ProductCategoryRepository::new(&mut *self.conn)
                .insert(*link)
                .await
                .map_err(CatalogError::write("Product", product_id, WriteStage::CategoryLink))?;
        }

        info!(
            product_id = %product_id,
            prices = prices.len(),
            categories = links.len(),
            "Product aggregate written"
        );

        Ok(product)
    }

    // =========================================================================
    // Order
    // =========================================================================

    /// Writes an order header and its line items.
    ///
    /// Quantities are stored as given. Line items already stored for this
    /// order under other products are left in place.
    pub async fn write_order(&mut self, request: &OrderRequest) -> CatalogResult<Order> {
        let label = request
            .id
            .map_or_else(|| "new".to_string(), |id| id.to_string());

        if self.policy == ReferencePolicy::Verify {
            for item in &request.line_items {
                let exists = ProductRepository::new(&mut *self.conn)
                    .exists(item.product_id)
                    .await
                    .map_err(CatalogError::write("Order", &label, WriteStage::ReferenceCheck))?;
                if !exists {
                    return Err(CatalogError::DanglingReference {
                        entity: "Product",
                        id: item.product_id.to_string(),
                    });
                }
            }
        }

        // 1. Parent
        let mut orders = OrderRepository::new(&mut *self.conn);
        let order = match request.id {
            Some(id) => {
                orders
                    .upsert(&Order {
                        id,
                        client_id: request.client_id,
                        date: request.date,
                    })
                    .await
            }
            None => orders.insert(request.client_id, request.date).await,
        }
        .map_err(CatalogError::write("Order", &label, WriteStage::ParentUpsert))?;

        let order_id = order.id;
        debug!(order_id = %order_id, "Order row written");

        // 2. Line items
        let items = last_write_wins(request.line_items.iter().map(|spec| ProductOrder {
            product_id: spec.product_id,
            order_id,
            quantity: spec.quantity,
        }));
        for item in &items {
            ProductOrderRepository::new(&mut *self.conn)
                .upsert(*item)
                .await
                .map_err(CatalogError::write("Order", order_id, WriteStage::LineItemUpsert))?;
        }

        info!(
            order_id = %order_id,
            client_id = %order.client_id,
            line_items = items.len(),
            "Order aggregate written"
        );

        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;
    use chrono::{TimeZone, Utc};
    use codestock_core::{CategoryId, ClientId, CompanyId, CurrencyId, Money, OrderId, ProductId};

    fn widget_request() -> ProductRequest {
        ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .price(CurrencyId::new(1), Money::from_cents(100))
            .price(CurrencyId::new(1), Money::from_cents(999))
            .category(CategoryId::new(5))
            .category(CategoryId::new(5))
    }

    #[tokio::test]
    async fn test_new_product_gets_generated_id_and_collapsed_children() {
        let (_db, mut conn) = connection().await;

        let product = AggregateWriter::new(&mut conn, ReferencePolicy::Trust)
            .write_product(&widget_request())
            .await
            .unwrap();

        let prices = PriceRepository::new(&mut conn)
            .list_by_product(product.id)
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].amount, Money::from_cents(999));

        let links = ProductCategoryRepository::new(&mut conn)
            .list_by_product(product.id)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_category_set_but_keeps_other_prices() {
        let (_db, mut conn) = connection().await;
        let id = ProductId::new(10);

        let first = ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .with_id(id)
            .price(CurrencyId::new(1), Money::from_cents(999))
            .price(CurrencyId::new(2), Money::from_cents(4_000_000))
            .category(CategoryId::new(5))
            .category(CategoryId::new(6));
        let second = ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .with_id(id)
            .price(CurrencyId::new(1), Money::from_cents(1099))
            .category(CategoryId::new(7));

        let mut writer = AggregateWriter::new(&mut conn, ReferencePolicy::Trust);
        writer.write_product(&first).await.unwrap();
        writer.write_product(&second).await.unwrap();

        let links = ProductCategoryRepository::new(&mut conn)
            .list_by_product(id)
            .await
            .unwrap();
        assert_eq!(
            links.iter().map(|l| l.category_id).collect::<Vec<_>>(),
            vec![CategoryId::new(7)]
        );

        // Prices are upserted per currency, never deleted by an update
        let prices = PriceRepository::new(&mut conn).list_by_product(id).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].amount, Money::from_cents(1099));
    }

    #[tokio::test]
    async fn test_verify_policy_rejects_unknown_category_before_writing() {
        let (_db, mut conn) = connection().await;

        let err = AggregateWriter::new(&mut conn, ReferencePolicy::Verify)
            .write_product(&widget_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DanglingReference { entity: "Category", .. }
        ));
        assert!(ProductRepository::new(&mut conn).list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_line_items_stored_as_given() {
        let (_db, mut conn) = connection().await;

        let request = OrderRequest::new(
            ClientId::new(7),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .with_id(OrderId::new(100))
        .line_item(ProductId::new(10), 2)
        .line_item(ProductId::new(404), 0);

        let order = AggregateWriter::new(&mut conn, ReferencePolicy::Trust)
            .write_order(&request)
            .await
            .unwrap();
        assert_eq!(order.id, OrderId::new(100));

        let items = ProductOrderRepository::new(&mut conn)
            .list_by_order(order.id)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].quantity, 0);
    }

    #[tokio::test]
    async fn test_verify_policy_rejects_unknown_product_on_order() {
        let (_db, mut conn) = connection().await;

        let request = OrderRequest::new(ClientId::new(7), Utc::now()).line_item(ProductId::new(10), 1);
        let err = AggregateWriter::new(&mut conn, ReferencePolicy::Verify)
            .write_order(&request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DanglingReference { entity: "Product", .. }
        ));
    }
}
