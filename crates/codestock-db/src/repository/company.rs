//! # Company Repository
//!
//! Companies carry a caller-supplied id (their registry number space), so
//! `save` is always an upsert by id.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use codestock_core::{Company, CompanyId};

/// Repository for company database operations.
#[derive(Debug)]
pub struct CompanyRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CompanyRepository<'c> {
    /// Creates a new CompanyRepository on the given connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CompanyRepository { conn }
    }

    /// Gets a company by ID.
    pub async fn get_by_id(&mut self, id: CompanyId) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, nit, name, address, phone
            FROM companies
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(company)
    }

    /// Lists every company, ordered by id.
    pub async fn list_all(&mut self) -> DbResult<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, nit, name, address, phone
            FROM companies
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(companies)
    }

    /// Inserts or replaces a company by id.
    pub async fn save(&mut self, company: &Company) -> DbResult<Company> {
        debug!(company_id = %company.id, nit = %company.nit, "Saving company");

        sqlx::query(
            r#"
            INSERT INTO companies (id, nit, name, address, phone)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                nit = excluded.nit,
                name = excluded.name,
                address = excluded.address,
                phone = excluded.phone
            "#,
        )
        .bind(company.id)
        .bind(&company.nit)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .execute(&mut *self.conn)
        .await?;

        Ok(company.clone())
    }

    /// Deletes a company row. Children are NOT touched; use the cascade.
    pub async fn delete_by_id(&mut self, id: CompanyId) -> DbResult<u64> {
        debug!(company_id = %id, "Deleting company row");

        let result = sqlx::query("DELETE FROM companies WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}
