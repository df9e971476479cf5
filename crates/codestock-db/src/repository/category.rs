//! # Category Repository

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::{Category, CategoryId};

/// Repository for category database operations.
#[derive(Debug)]
pub struct CategoryRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CategoryRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CategoryRepository { conn }
    }

    pub async fn get_by_id(&mut self, id: CategoryId) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *self.conn)
                .await?;

        Ok(category)
    }

    pub async fn exists(&mut self, id: CategoryId) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// Lists every category, ordered by id.
    pub async fn list_all(&mut self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&mut *self.conn)
                .await?;

        Ok(categories)
    }

    /// Inserts a category and returns it with its generated id.
    pub async fn insert(&mut self, name: &str) -> DbResult<Category> {
        debug!(name = %name, "Inserting category");

        let result = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name)
            .execute(&mut *self.conn)
            .await?;

        Ok(Category {
            id: CategoryId::new(result.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    /// Inserts or renames a category under its own id.
    pub async fn upsert(&mut self, category: &Category) -> DbResult<Category> {
        debug!(category_id = %category.id, "Upserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .execute(&mut *self.conn)
        .await?;

        Ok(category.clone())
    }

    /// Deletes a category row. Links pointing at it are left dangling and
    /// are skipped by readers.
    pub async fn delete_by_id(&mut self, id: CategoryId) -> DbResult<u64> {
        debug!(category_id = %id, "Deleting category row");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
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

    #[tokio::test]
    async fn test_insert_and_list() {
        let (_db, mut conn) = connection().await;
        let mut repo = CategoryRepository::new(&mut conn);

        let tools = repo.insert("Tools").await.unwrap();
        let toys = repo.insert("Toys").await.unwrap();

        assert_eq!(repo.list_all().await.unwrap(), vec![tools.clone(), toys]);
        assert!(repo.exists(tools.id).await.unwrap());

        repo.delete_by_id(tools.id).await.unwrap();
        assert!(repo.get_by_id(tools.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_caller_id() {
        let (_db, mut conn) = connection().await;
        let mut repo = CategoryRepository::new(&mut conn);

        let five = Category {
            id: CategoryId::new(5),
            name: "Tools".to_string(),
        };
        repo.upsert(&five).await.unwrap();
        assert_eq!(repo.get_by_id(CategoryId::new(5)).await.unwrap(), Some(five));
    }
}
