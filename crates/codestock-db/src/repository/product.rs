//! # Product Repository
//!
//! Database operations for the `products` table.
//!
//! ## Id Assignment
//! ```text
//! insert(new)          → id generated by SQLite (AUTOINCREMENT)
//! upsert(product)      → caller's id kept; existing row overwritten
//! ```
//!
//! Prices and category links are separate tables; see
//! [`crate::aggregate`] for the operations that keep them in step.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::{CompanyId, Product, ProductId};

/// Field values of a product that doesn't have an id yet.
#[derive(Debug, Clone, Copy)]
pub struct NewProduct<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub characteristics: Option<&'a str>,
    pub company_id: CompanyId,
}

/// Repository for product database operations.
#[derive(Debug)]
pub struct ProductRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductRepository<'c> {
    /// Creates a new ProductRepository on the given connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductRepository { conn }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&mut self, id: ProductId) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, characteristics, company_id
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    /// Whether a product row with this id exists.
    pub async fn exists(&mut self, id: ProductId) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// Lists every product, ordered by id.
    pub async fn list_all(&mut self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, characteristics, company_id
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// Lists the ids of every product, ordered.
    pub async fn list_ids(&mut self) -> DbResult<Vec<ProductId>> {
        let ids = sqlx::query_scalar::<_, ProductId>("SELECT id FROM products ORDER BY id")
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids)
    }

    /// Lists the products owned by a company, ordered by id.
    pub async fn list_by_company(&mut self, company_id: CompanyId) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, characteristics, company_id
            FROM products
            WHERE company_id = ?1
            ORDER BY id
            "#,
        )
        .bind(company_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// Lists the ids of the products owned by a company, ordered.
    pub async fn list_ids_by_company(&mut self, company_id: CompanyId) -> DbResult<Vec<ProductId>> {
        let ids = sqlx::query_scalar::<_, ProductId>(
            "SELECT id FROM products WHERE company_id = ?1 ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(ids)
    }

    /// Inserts a product and returns it with its generated id.
    pub async fn insert(&mut self, new: NewProduct<'_>) -> DbResult<Product> {
        debug!(code = %new.code, company_id = %new.company_id, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (code, name, characteristics, company_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(new.code)
        .bind(new.name)
        .bind(new.characteristics)
        .bind(new.company_id)
        .execute(&mut *self.conn)
        .await?;

        let id = ProductId::new(result.last_insert_rowid());
        debug!(product_id = %id, "Product inserted");

        Ok(Product {
            id,
            code: new.code.to_string(),
            name: new.name.to_string(),
            characteristics: new.characteristics.map(str::to_string),
            company_id: new.company_id,
        })
    }

    /// Inserts or overwrites a product under its own id.
    pub async fn upsert(&mut self, product: &Product) -> DbResult<Product> {
        debug!(product_id = %product.id, code = %product.code, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, code, name, characteristics, company_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                name = excluded.name,
                characteristics = excluded.characteristics,
                company_id = excluded.company_id
            "#,
        )
        .bind(product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.characteristics)
        .bind(product.company_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(product.clone())
    }

    /// Deletes one product row. Prices and links are NOT touched.
    pub async fn delete_by_id(&mut self, id: ProductId) -> DbResult<u64> {
        debug!(product_id = %id, "Deleting product row");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every product row of a company. Prices and links are NOT
    /// touched.
    pub async fn delete_by_company(&mut self, company_id: CompanyId) -> DbResult<u64> {
        debug!(company_id = %company_id, "Deleting company products");

        let result = sqlx::query("DELETE FROM products WHERE company_id = ?1")
            .bind(company_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::connection;

    fn new_widget(company: i64) -> NewProduct<'static> {
        NewProduct {
            code: "W-1",
            name: "Widget",
            characteristics: Some("blue"),
            company_id: CompanyId::new(company),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_ids() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductRepository::new(&mut conn);

        let a = repo.insert(new_widget(1)).await.unwrap();
        let b = repo.insert(new_widget(1)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(repo.get_by_id(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_upsert_with_explicit_id() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductRepository::new(&mut conn);

        let mut product = Product {
            id: ProductId::new(10),
            code: "W-1".to_string(),
            name: "Widget".to_string(),
            characteristics: None,
            company_id: CompanyId::new(1),
        };
        repo.upsert(&product).await.unwrap();
        product.name = "Widget v2".to_string();
        repo.upsert(&product).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all, vec![product]);
    }

    #[tokio::test]
    async fn test_company_scoped_operations() {
        let (_db, mut conn) = connection().await;
        let mut repo = ProductRepository::new(&mut conn);

        let a = repo.insert(new_widget(1)).await.unwrap();
        let b = repo.insert(new_widget(1)).await.unwrap();
        let other = repo.insert(new_widget(2)).await.unwrap();

        assert_eq!(
            repo.list_ids_by_company(CompanyId::new(1)).await.unwrap(),
            vec![a.id, b.id]
        );
        assert_eq!(repo.delete_by_company(CompanyId::new(1)).await.unwrap(), 2);
        assert_eq!(repo.list_ids().await.unwrap(), vec![other.id]);
        assert!(repo.exists(other.id).await.unwrap());
        assert!(!repo.exists(a.id).await.unwrap());
    }
}
