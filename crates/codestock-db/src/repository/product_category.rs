//! # ProductCategory Repository
//!
//! Junction rows keyed by `(category_id, product_id)`. Inserting a link
//! that already exists is a no-op.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::keys::ProductCategoryKey;
use codestock_core::{CategoryId, ProductCategory, ProductId};

/// Repository for product/category links.
#[derive(Debug)]
pub struct ProductCategoryRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductCategoryRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductCategoryRepository { conn }
    }

    /// Lists a product's links, ordered by category.
    pub async fn list_by_product(&mut self, product_id: ProductId) -> DbResult<Vec<ProductCategory>> {
        let links = sqlx::query_as::<_, ProductCategory>(
            r#"
            SELECT category_id, product_id
            FROM product_categories
            WHERE product_id = ?1
            ORDER BY category_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(links)
    }

    /// Lists a category's links, ordered by product.
    pub async fn list_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> DbResult<Vec<ProductCategory>> {
        let links = sqlx::query_as::<_, ProductCategory>(
            r#"
            SELECT category_id, product_id
            FROM product_categories
            WHERE category_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(category_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(links)
    }

    /// Inserts a link unless the same key is already present.
    pub async fn insert(&mut self, link: ProductCategory) -> DbResult<ProductCategory> {
        debug!(
            category_id = %link.category_id,
            product_id = %link.product_id,
            "Linking product to category"
        );

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO product_categories (category_id, product_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(link.category_id)
        .bind(link.product_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(link)
    }

    pub async fn delete(&mut self, key: ProductCategoryKey) -> DbResult<u64> {
        debug!(%key, "Deleting product category link");

        let result = sqlx::query(
            "DELETE FROM product_categories WHERE category_id = ?1 AND product_id = ?2",
        )
        .bind(key.category_id)
        .bind(key.product_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every link of a product.
    pub async fn delete_by_product(&mut self, product_id: ProductId) -> DbResult<u64> {
        debug!(product_id = %product_id, "Unlinking product from all categories");

        let result = sqlx::query("DELETE FROM product_categories WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every link to a category.
    pub async fn delete_by_category(&mut self, category_id: CategoryId) -> DbResult<u64> {
        debug!(category_id = %category_id, "Unlinking category from all products");

        let result = sqlx::query("DELETE FROM product_categories WHERE category_id = ?1")
            .bind(category_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;

    fn link(category: i64, product: i64) -> ProductCategory {
        ProductCategory {
            category_id: CategoryId::new(category),
            product_id: ProductId::new(product),
        }
    }

    #[tokio::test]
    async fn test_duplicate_link_collapses() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductCategoryRepository::new(&mut conn);

        repo.insert(link(5, 10)).await.unwrap();
        repo.insert(link(5, 10)).await.unwrap();
        repo.insert(link(6, 10)).await.unwrap();

        assert_eq!(
            repo.list_by_product(ProductId::new(10)).await.unwrap(),
            vec![link(5, 10), link(6, 10)]
        );
    }

    #[tokio::test]
    async fn test_partial_key_deletes() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductCategoryRepository::new(&mut conn);

        repo.insert(link(5, 10)).await.unwrap();
        repo.insert(link(5, 11)).await.unwrap();
        repo.insert(link(6, 11)).await.unwrap();

        assert_eq!(repo.delete_by_category(CategoryId::new(5)).await.unwrap(), 2);
        assert_eq!(
            repo.list_by_category(CategoryId::new(6)).await.unwrap(),
            vec![link(6, 11)]
        );

        let key = ProductCategoryKey::new(CategoryId::new(6), ProductId::new(11));
        assert_eq!(repo.delete(key).await.unwrap(), 1);
        assert_eq!(repo.delete_by_product(ProductId::new(11)).await.unwrap(), 0);
    }
}
