//! # ProductOrder Repository
//!
//! Order line items keyed by `(product_id, order_id)`. A second write for
//! the same key replaces the quantity.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::keys::ProductOrderKey;
use codestock_core::{OrderId, ProductId, ProductOrder};

/// Repository for order line items.
#[derive(Debug)]
pub struct ProductOrderRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductOrderRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductOrderRepository { conn }
    }

    pub async fn get(&mut self, key: ProductOrderKey) -> DbResult<Option<ProductOrder>> {
        let item = sqlx::query_as::<_, ProductOrder>(
            r#"
            SELECT product_id, order_id, quantity
            FROM product_orders
            WHERE product_id = ?1 AND order_id = ?2
            "#,
        )
        .bind(key.product_id)
        .bind(key.order_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(item)
    }

    /// Lists an order's line items, ordered by product.
    pub async fn list_by_order(&mut self, order_id: OrderId) -> DbResult<Vec<ProductOrder>> {
        let items = sqlx::query_as::<_, ProductOrder>(
            r#"
            SELECT product_id, order_id, quantity
            FROM product_orders
            WHERE order_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(items)
    }

    /// Lists every line item that references a product.
    pub async fn list_by_product(&mut self, product_id: ProductId) -> DbResult<Vec<ProductOrder>> {
        let items = sqlx::query_as::<_, ProductOrder>(
            r#"
            SELECT product_id, order_id, quantity
            FROM product_orders
            WHERE product_id = ?1
            ORDER BY order_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(items)
    }

    /// Inserts a line item or replaces the quantity of an existing one.
    pub async fn upsert(&mut self, item: ProductOrder) -> DbResult<ProductOrder> {
        debug!(
            order_id = %item.order_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            "Upserting line item"
        );

        sqlx::query(
            r#"
            INSERT INTO product_orders (product_id, order_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id, order_id) DO UPDATE SET
                quantity = excluded.quantity
            "#,
        )
        .bind(item.product_id)
        .bind(item.order_id)
        .bind(item.quantity)
        .execute(&mut *self.conn)
        .await?;

        Ok(item)
    }

    pub async fn delete(&mut self, key: ProductOrderKey) -> DbResult<u64> {
        debug!(%key, "Deleting line item");

        let result =
            sqlx::query("DELETE FROM product_orders WHERE product_id = ?1 AND order_id = ?2")
                .bind(key.product_id)
                .bind(key.order_id)
                .execute(&mut *self.conn)
                .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every line item of an order.
    pub async fn delete_by_order(&mut self, order_id: OrderId) -> DbResult<u64> {
        debug!(order_id = %order_id, "Deleting order line items");

        let result = sqlx::query("DELETE FROM product_orders WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every line item that references a product.
    pub async fn delete_by_product(&mut self, product_id: ProductId) -> DbResult<u64> {
        debug!(product_id = %product_id, "Deleting line items for product");

        let result = sqlx::query("DELETE FROM product_orders WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;

    fn item(product: i64, order: i64, quantity: i64) -> ProductOrder {
        ProductOrder {
            product_id: ProductId::new(product),
            order_id: OrderId::new(order),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_quantity() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductOrderRepository::new(&mut conn);

        repo.upsert(item(10, 100, 2)).await.unwrap();
        repo.upsert(item(10, 100, 5)).await.unwrap();

        let key = ProductOrderKey::new(ProductId::new(10), OrderId::new(100));
        assert_eq!(repo.get(key).await.unwrap(), Some(item(10, 100, 5)));
        assert_eq!(repo.list_by_order(OrderId::new(100)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quantity_stored_as_given() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductOrderRepository::new(&mut conn);

        repo.upsert(item(10, 100, 0)).await.unwrap();
        repo.upsert(item(11, 100, -3)).await.unwrap();

        let items = repo.list_by_order(OrderId::new(100)).await.unwrap();
        assert_eq!(items, vec![item(10, 100, 0), item(11, 100, -3)]);
    }

    #[tokio::test]
    async fn test_deletes_by_either_member() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductOrderRepository::new(&mut conn);

        repo.upsert(item(10, 100, 1)).await.unwrap();
        repo.upsert(item(10, 101, 1)).await.unwrap();
        repo.upsert(item(11, 101, 1)).await.unwrap();

        assert_eq!(repo.list_by_product(ProductId::new(10)).await.unwrap().len(), 2);
        assert_eq!(repo.delete_by_order(OrderId::new(101)).await.unwrap(), 2);
        assert_eq!(repo.delete_by_product(ProductId::new(10)).await.unwrap(), 1);

        let key = ProductOrderKey::new(ProductId::new(10), OrderId::new(100));
        assert_eq!(repo.delete(key).await.unwrap(), 0);
    }
}
