//! # Order Repository
//!
//! Order headers only. Line items live in `product_orders`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::{ClientId, Order, OrderId};

/// Repository for order database operations.
#[derive(Debug)]
pub struct OrderRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrderRepository<'c> {
    /// Creates a new OrderRepository on the given connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OrderRepository { conn }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&mut self, id: OrderId) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, client_id, date
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(order)
    }

    /// Lists every order, oldest first.
    pub async fn list_all(&mut self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, client_id, date
            FROM orders
            ORDER BY date, id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(orders)
    }

    /// Lists a client's order ids, oldest first.
    pub async fn list_ids_by_client(&mut self, client_id: ClientId) -> DbResult<Vec<OrderId>> {
        let ids = sqlx::query_scalar::<_, OrderId>(
            "SELECT id FROM orders WHERE client_id = ?1 ORDER BY date, id",
        )
        .bind(client_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(ids)
    }

    /// Inserts an order and returns it with its generated id.
    pub async fn insert(&mut self, client_id: ClientId, date: DateTime<Utc>) -> DbResult<Order> {
        debug!(client_id = %client_id, "Inserting order");

        let result = sqlx::query("INSERT INTO orders (client_id, date) VALUES (?1, ?2)")
            .bind(client_id)
            .bind(date)
            .execute(&mut *self.conn)
            .await?;

        let id = OrderId::new(result.last_insert_rowid());
        debug!(order_id = %id, "Order inserted");

        Ok(Order {
            id,
            client_id,
            date,
        })
    }

    /// Inserts or overwrites an order under its own id.
    pub async fn upsert(&mut self, order: &Order) -> DbResult<Order> {
        debug!(order_id = %order.id, client_id = %order.client_id, "Upserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, client_id, date)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                client_id = excluded.client_id,
                date = excluded.date
            "#,
        )
        .bind(order.id)
        .bind(order.client_id)
        .bind(order.date)
        .execute(&mut *self.conn)
        .await?;

        Ok(order.clone())
    }

    /// Deletes an order header. Line items are NOT touched.
    pub async fn delete_by_id(&mut self, id: OrderId) -> DbResult<u64> {
        debug!(order_id = %id, "Deleting order row");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_insert_and_round_trip_date() {
        let (_db, mut conn) = connection().await;
        let mut repo = OrderRepository::new(&mut conn);

        let date = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let order = repo.insert(ClientId::new(7), date).await.unwrap();

        let stored = repo.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.date, date);
        assert_eq!(stored.client_id, ClientId::new(7));
    }

    #[tokio::test]
    async fn test_orders_by_client_oldest_first() {
        let (_db, mut conn) = connection().await;
        let mut repo = OrderRepository::new(&mut conn);

        let later = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = repo.insert(ClientId::new(7), later).await.unwrap();
        let a = repo.insert(ClientId::new(7), earlier).await.unwrap();
        repo.insert(ClientId::new(8), earlier).await.unwrap();

        assert_eq!(
            repo.list_ids_by_client(ClientId::new(7)).await.unwrap(),
            vec![a.id, b.id]
        );
    }

    #[tokio::test]
    async fn test_upsert_explicit_id() {
        let (_db, mut conn) = connection().await;
        let mut repo = OrderRepository::new(&mut conn);

        let order = Order {
            id: OrderId::new(100),
            client_id: ClientId::new(7),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        repo.upsert(&order).await.unwrap();
        repo.upsert(&order).await.unwrap();

        assert_eq!(repo.list_all().await.unwrap(), vec![order]);
        assert_eq!(repo.delete_by_id(OrderId::new(100)).await.unwrap(), 1);
        assert_eq!(repo.delete_by_id(OrderId::new(100)).await.unwrap(), 0);
    }
}
