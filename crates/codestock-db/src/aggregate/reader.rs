//! # Aggregate Reader
//!
//! Builds [`ProductView`] and [`OrderView`] by joining a parent row with
//! its independently stored children.
//!
//! ## Missing Rows
//! ```text
//! parent missing                      → CatalogError::NotFound
//! link → category missing             → link omitted (warn!)
//! line item → product missing         → line item omitted (warn!)
//! any store failure                   → CatalogError::AggregationFailure
//! ```
//!
//! Reads never write and never create rows.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{AggregationStage, CatalogError, CatalogResult};
use crate::repository::{
    CategoryRepository, OrderRepository, PriceRepository, ProductCategoryRepository,
    ProductOrderRepository, ProductRepository,
};
use codestock_core::{ClientId, LineItemView, OrderId, OrderView, ProductId, ProductView};

/// Assembles denormalized views on one connection.
#[derive(Debug)]
pub struct AggregateReader<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> AggregateReader<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        AggregateReader { conn }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Builds the view of one product.
    ///
    /// ## Errors
    /// - `NotFound` if the product row doesn't exist
    /// - `AggregationFailure` at parent-fetch, price-fetch or category-fetch
    pub async fn build_product_view(&mut self, product_id: ProductId) -> CatalogResult<ProductView> {
        self.load_product_view(product_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Product", product_id))
    }

    /// Builds views for a list of ids. Ids without a product are skipped.
    pub async fn build_product_view_list(
        &mut self,
        product_ids: &[ProductId],
    ) -> CatalogResult<Vec<ProductView>> {
        let mut views = Vec::with_capacity(product_ids.len());
        for &id in product_ids {
            match self.load_product_view(id).await? {
                Some(view) => views.push(view),
                None => debug!(product_id = %id, "Product vanished; skipped from list"),
            }
        }
        Ok(views)
    }

    async fn load_product_view(&mut self, product_id: ProductId) -> CatalogResult<Option<ProductView>> {
        debug!(product_id = %product_id, "Building product view");

        let product = ProductRepository::new(&mut *self.conn)
            .get_by_id(product_id)
            .await
            .map_err(CatalogError::aggregation(
                "Product",
                product_id,
                AggregationStage::ParentFetch,
            ))?;
        let Some(product) = product else {
            return Ok(None);
        };

        let prices = PriceRepository::new(&mut *self.conn)
            .list_by_product(product_id)
            .await
            .map_err(CatalogError::aggregation(
                "Product",
                product_id,
                AggregationStage::PriceFetch,
            ))?;

        let links = ProductCategoryRepository::new(&mut *self.conn)
            .list_by_product(product_id)
            .await
            .map_err(CatalogError::aggregation(
                "Product",
                product_id,
                AggregationStage::CategoryFetch,
            ))?;

        let mut categories = Vec::with_capacity(links.len());
        for link in links {
            let category = CategoryRepository::new(&mut *self.conn)
                .get_by_id(link.category_id)
                .await
                .map_err(CatalogError::aggregation(
                    "Product",
                    product_id,
                    AggregationStage::CategoryFetch,
                ))?;

            match category {
                Some(category) => categories.push(category),
                None => warn!(
                    product_id = %product_id,
                    category_id = %link.category_id,
                    "Category link points at a missing category; omitted"
                ),
            }
        }

        Ok(Some(ProductView::assemble(product, prices, categories)))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Builds the view of one order with every resolvable line item.
    ///
    /// ## Errors
    /// - `NotFound` if the order row doesn't exist
    /// - `AggregationFailure` at parent-fetch, line-item-fetch or
    ///   product-resolve
    pub async fn build_order_view(&mut self, order_id: OrderId) -> CatalogResult<OrderView> {
        self.load_order_view(order_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Order", order_id))
    }

    /// Builds the views of every order placed by a client, oldest first.
    pub async fn build_orders_by_client(&mut self, client_id: ClientId) -> CatalogResult<Vec<OrderView>> {
        let order_ids = OrderRepository::new(&mut *self.conn)
            .list_ids_by_client(client_id)
            .await
            .map_err(CatalogError::aggregation(
                "Client",
                client_id,
                AggregationStage::ParentFetch,
            ))?;

        let mut views = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            if let Some(view) = self.load_order_view(id).await? {
                views.push(view);
            }
        }
        Ok(views)
    }

    async fn load_order_view(&mut self, order_id: OrderId) -> CatalogResult<Option<OrderView>> {
        debug!(order_id = %order_id, "Building order view");

        let order = OrderRepository::new(&mut *self.conn)
            .get_by_id(order_id)
            .await
            .map_err(CatalogError::aggregation(
                "Order",
                order_id,
                AggregationStage::ParentFetch,
            ))?;
        let Some(order) = order else {
            return Ok(None);
        };

        let items = ProductOrderRepository::new(&mut *self.conn)
            .list_by_order(order_id)
            .await
            .map_err(CatalogError::aggregation(
                "Order",
                order_id,
                AggregationStage::LineItemFetch,
            ))?;

        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .load_product_view(item.product_id)
                .await
                .map_err(|err| match err {
                    CatalogError::AggregationFailure { source, .. } => {
                        CatalogError::AggregationFailure {
                            entity: "Order",
                            id: order_id.to_string(),
                            stage: AggregationStage::ProductResolve,
                            source,
                        }
                    }
                    other => other,
                })?;

            match product {
                Some(product) => line_items.push(LineItemView {
                    quantity: item.quantity,
                    product,
                }),
                None => warn!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    "Line item references a missing product; omitted"
                ),
            }
        }

        Ok(Some(OrderView::assemble(order, line_items)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::repository::test_support::connection;
    use codestock_core::{
        Category, CategoryId, CompanyId, CurrencyId, Money, Order, Price, ProductCategory,
        ProductOrder,
    };
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let (_db, mut conn) = connection().await;
        let mut reader = AggregateReader::new(&mut conn);

        let err = reader.build_product_view(ProductId::new(404)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn test_dangling_category_link_is_omitted() {
        let (_db, mut conn) = connection().await;

        let product = ProductRepository::new(&mut conn)
            .insert(NewProduct {
                code: "W-1",
                name: "Widget",
                characteristics: None,
                company_id: CompanyId::new(1),
            })
            .await
            .unwrap();
        CategoryRepository::new(&mut conn)
            .upsert(&Category {
                id: CategoryId::new(5),
                name: "Tools".to_string(),
            })
            .await
            .unwrap();
        for category in [5, 999] {
            ProductCategoryRepository::new(&mut conn)
                .insert(ProductCategory {
                    category_id: CategoryId::new(category),
                    product_id: product.id,
                })
                .await
                .unwrap();
        }

        let view = AggregateReader::new(&mut conn)
            .build_product_view(product.id)
            .await
            .unwrap();
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.categories[0].id, CategoryId::new(5));
    }

    #[tokio::test]
    async fn test_order_view_skips_missing_products_and_lists_skip_missing_ids() {
        let (_db, mut conn) = connection().await;

        let product = ProductRepository::new(&mut conn)
            .insert(NewProduct {
                code: "W-1",
                name: "Widget",
                characteristics: None,
                company_id: CompanyId::new(1),
            })
            .await
            .unwrap();
        PriceRepository::new(&mut conn)
            .upsert(&Price {
                product_id: product.id,
                currency_id: CurrencyId::new(1),
                amount: Money::from_cents(999),
            })
            .await
            .unwrap();
        let order = OrderRepository::new(&mut conn)
            .upsert(&Order {
                id: OrderId::new(100),
                client_id: ClientId::new(7),
                date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        for (product_id, quantity) in [(product.id, 2), (ProductId::new(404), 1)] {
            ProductOrderRepository::new(&mut conn)
                .upsert(ProductOrder {
                    product_id,
                    order_id: order.id,
                    quantity,
                })
                .await
                .unwrap();
        }

        let mut reader = AggregateReader::new(&mut conn);
        let view = reader.build_order_view(order.id).await.unwrap();
        assert_eq!(view.line_items.len(), 1);
        assert_eq!(view.total_in(CurrencyId::new(1)), Some(Money::from_cents(1998)));

        let list = reader
            .build_product_view_list(&[product.id, ProductId::new(404)])
            .await
            .unwrap();
        assert_eq!(list.len(), 1);

        let by_client = reader.build_orders_by_client(ClientId::new(7)).await.unwrap();
        assert_eq!(by_client, vec![view]);
        assert!(reader
            .build_orders_by_client(ClientId::new(8))
            .await
            .unwrap()
            .is_empty());
    }
}
