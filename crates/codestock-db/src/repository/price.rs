//! # Price Repository
//!
//! One row per `(product_id, currency_id)`; see
//! [`codestock_core::keys::PriceKey`]. Amounts are stored as integer minor
//! units in `amount_cents` and surface as [`codestock_core::Money`].

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::keys::PriceKey;
use codestock_core::{CurrencyId, Price, ProductId};

/// Repository for price database operations.
#[derive(Debug)]
pub struct PriceRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PriceRepository<'c> {
    /// Creates a new PriceRepository on the given connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        PriceRepository { conn }
    }

    /// Gets one price by its full key.
    pub async fn get(&mut self, key: PriceKey) -> DbResult<Option<Price>> {
        let price = sqlx::query_as::<_, Price>(
            r#"
            SELECT product_id, currency_id, amount_cents AS amount
            FROM prices
            WHERE product_id = ?1 AND currency_id = ?2
            "#,
        )
        .bind(key.product_id)
        .bind(key.currency_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(price)
    }

    /// Lists a product's prices, ordered by currency.
    pub async fn list_by_product(&mut self, product_id: ProductId) -> DbResult<Vec<Price>> {
        let prices = sqlx::query_as::<_, Price>(
            r#"
            SELECT product_id, currency_id, amount_cents AS amount
            FROM prices
            WHERE product_id = ?1
            ORDER BY currency_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(prices)
    }

    /// Lists every price in a currency, ordered by product.
    pub async fn list_by_currency(&mut self, currency_id: CurrencyId) -> DbResult<Vec<Price>> {
        let prices = sqlx::query_as::<_, Price>(
            r#"
            SELECT product_id, currency_id, amount_cents AS amount
            FROM prices
            WHERE currency_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(currency_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(prices)
    }

    /// Inserts a price, or replaces the amount of the existing row with the
    /// same key.
    pub async fn upsert(&mut self, price: &Price) -> DbResult<Price> {
        debug!(
            product_id = %price.product_id,
            currency_id = %price.currency_id,
            amount = %price.amount,
            "Upserting price"
        );

        sqlx::query(
            r#"
            INSERT INTO prices (product_id, currency_id, amount_cents)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id, currency_id) DO UPDATE SET
                amount_cents = excluded.amount_cents
            "#,
        )
        .bind(price.product_id)
        .bind(price.currency_id)
        .bind(price.amount)
        .execute(&mut *self.conn)
        .await?;

        Ok(price.clone())
    }

    /// Deletes one price by its full key.
    pub async fn delete(&mut self, key: PriceKey) -> DbResult<u64> {
        debug!(%key, "Deleting price");

        let result = sqlx::query("DELETE FROM prices WHERE product_id = ?1 AND currency_id = ?2")
            .bind(key.product_id)
            .bind(key.currency_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every price of a product.
    pub async fn delete_by_product(&mut self, product_id: ProductId) -> DbResult<u64> {
        debug!(product_id = %product_id, "Deleting product prices");

        let result = sqlx::query("DELETE FROM prices WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every price in a currency.
    pub async fn delete_by_currency(&mut self, currency_id: CurrencyId) -> DbResult<u64> {
        debug!(currency_id = %currency_id, "Deleting currency prices");

        let result = sqlx::query("DELETE FROM prices WHERE currency_id = ?1")
            .bind(currency_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;
    use codestock_core::Money;

    fn price(product: i64, currency: i64, cents: i64) -> Price {
        Price {
            product_id: ProductId::new(product),
            currency_id: CurrencyId::new(currency),
            amount: Money::from_cents(cents),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_full_key() {
        let (_db, mut conn) = connection().await;
        let mut repo = PriceRepository::new(&mut conn);

        repo.upsert(&price(10, 1, 100)).await.unwrap();
        repo.upsert(&price(10, 1, 999)).await.unwrap();
        repo.upsert(&price(10, 2, 4_000_000)).await.unwrap();

        let prices = repo.list_by_product(ProductId::new(10)).await.unwrap();
        assert_eq!(prices, vec![price(10, 1, 999), price(10, 2, 4_000_000)]);
    }

    #[tokio::test]
    async fn test_lookup_by_either_member() {
        let (_db, mut conn) = connection().await;
        let mut repo = PriceRepository::new(&mut conn);

        repo.upsert(&price(10, 1, 100)).await.unwrap();
        repo.upsert(&price(11, 1, 200)).await.unwrap();
        repo.upsert(&price(11, 2, 300)).await.unwrap();

        assert_eq!(repo.list_by_currency(CurrencyId::new(1)).await.unwrap().len(), 2);
        assert_eq!(repo.delete_by_product(ProductId::new(11)).await.unwrap(), 2);

        let key = PriceKey::new(ProductId::new(10), CurrencyId::new(1));
        assert_eq!(repo.get(key).await.unwrap(), Some(price(10, 1, 100)));
        assert_eq!(repo.delete(key).await.unwrap(), 1);
        assert_eq!(repo.delete(key).await.unwrap(), 0);
        assert_eq!(repo.delete_by_currency(CurrencyId::new(1)).await.unwrap(), 0);
    }
}
