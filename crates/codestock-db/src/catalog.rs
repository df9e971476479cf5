//! # Catalog Service
//!
//! The entry point for products, companies, categories and orders.
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation                      Connection use                          │
//! │  ─────────────────────────────  ────────────────────────────────────── │
//! │  get_*_view(s)                  BEGIN → AggregateReader → COMMIT        │
//! │  create_or_update_product       validate → BEGIN → AggregateWriter      │
//! │  create_order                              → AggregateReader → COMMIT   │
//! │  delete_*                       BEGIN → CascadeDeleter → COMMIT         │
//! │  company / category CRUD        one pooled connection, one statement    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed step returns before `COMMIT`; dropping the transaction rolls
//! back every earlier step of the same operation. The view returned by a
//! write is read inside the write's own transaction, so an operation never
//! holds more than one connection.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::aggregate::{AggregateReader, AggregateWriter, CascadeDeleter, DeleteSummary};
use crate::config::CatalogConfig;
use crate::error::{AggregationStage, CatalogError, CatalogResult, DbError};
use crate::repository::{CategoryRepository, CompanyRepository, ProductRepository};
use codestock_core::validation::{validate_category_name, validate_company, validate_product_request};
use codestock_core::{
    Category, ClientId, Company, CompanyId, NewCategory, OrderId, OrderRequest, OrderView,
    PersonId, ProductId, ProductRequest, ProductView,
};

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn begin(pool: &SqlitePool) -> CatalogResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin().await.map_err(DbError::from)?)
}

pub(crate) async fn commit(tx: Transaction<'static, Sqlite>) -> CatalogResult<()> {
    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

/// Aggregate reads, writes and cascades over a shared pool.
///
/// Cheap to clone; every call checks a connection out of the pool.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(pool: SqlitePool, config: CatalogConfig) -> Self {
        Catalog { pool, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Returns one product with its prices and categories.
    ///
    /// ## Errors
    /// - `NotFound` if the product doesn't exist
    /// - `AggregationFailure` if a store call fails
    pub async fn get_product_view(&self, id: ProductId) -> CatalogResult<ProductView> {
        let mut tx = begin(&self.pool).await?;
        let view = AggregateReader::new(&mut tx).build_product_view(id).await?;
        commit(tx).await?;
        Ok(view)
    }

    /// Returns every product of a company. Unknown companies yield an empty
    /// list.
    pub async fn get_product_views_by_company(
        &self,
        company_id: CompanyId,
    ) -> CatalogResult<Vec<ProductView>> {
        let mut tx = begin(&self.pool).await?;
        let ids = ProductRepository::new(&mut tx)
            .list_ids_by_company(company_id)
            .await
            .map_err(CatalogError::aggregation(
                "Company",
                company_id,
                AggregationStage::ParentFetch,
            ))?;
        let views = AggregateReader::new(&mut tx)
            .build_product_view_list(&ids)
            .await?;
        commit(tx).await?;

        debug!(company_id = %company_id, count = views.len(), "Listed company products");
        Ok(views)
    }

    /// Returns every product in the catalog, ordered by id.
    pub async fn get_all_product_views(&self) -> CatalogResult<Vec<ProductView>> {
        let mut tx = begin(&self.pool).await?;
        let ids = ProductRepository::new(&mut tx)
            .list_ids()
            .await
            .map_err(CatalogError::aggregation(
                "Catalog",
                "all",
                AggregationStage::ParentFetch,
            ))?;
        let views = AggregateReader::new(&mut tx)
            .build_product_view_list(&ids)
            .await?;
        commit(tx).await?;
        Ok(views)
    }

    /// Returns one order with its resolvable line items and totals.
    pub async fn get_order_view(&self, id: OrderId) -> CatalogResult<OrderView> {
        let mut tx = begin(&self.pool).await?;
        let view = AggregateReader::new(&mut tx).build_order_view(id).await?;
        commit(tx).await?;
        Ok(view)
    }

    /// Returns every order of a client, oldest first.
    pub async fn get_orders_by_client(&self, client_id: ClientId) -> CatalogResult<Vec<OrderView>> {
        let mut tx = begin(&self.pool).await?;
        let views = AggregateReader::new(&mut tx)
            .build_orders_by_client(client_id)
            .await?;
        commit(tx).await?;
        Ok(views)
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Creates a product (no id) or replaces one (id supplied).
    ///
    /// On update the category set is replaced wholesale and prices are
    /// upserted per currency.
    ///
    /// ## Errors
    /// - `Validation` before anything is written
    /// - `DanglingReference` under `ReferencePolicy::Verify`
    /// - `WriteFailure` with the failing stage; nothing was written
    pub async fn create_or_update_product(
        &self,
        request: ProductRequest,
    ) -> CatalogResult<ProductView> {
        validate_product_request(&request)?;

        let mut tx = begin(&self.pool).await?;
        let product = AggregateWriter::new(&mut tx, self.config.reference_policy)
            .write_product(&request)
            .await?;
        let view = AggregateReader::new(&mut tx)
            .build_product_view(product.id)
            .await?;
        commit(tx).await?;

        info!(product_id = %view.id, code = %view.code, "Product saved");
        Ok(view)
    }

    /// Creates an order, or upserts the header and line items of an
    /// existing one when an id is supplied.
    pub async fn create_order(&self, request: OrderRequest) -> CatalogResult<OrderView> {
        let mut tx = begin(&self.pool).await?;
        let order = AggregateWriter::new(&mut tx, self.config.reference_policy)
            .write_order(&request)
            .await?;
        let view = AggregateReader::new(&mut tx).build_order_view(order.id).await?;
        commit(tx).await?;

        info!(order_id = %view.id, line_items = view.line_items.len(), "Order saved");
        Ok(view)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes a product, its prices and its category links. Succeeds when
    /// the product is already gone.
    pub async fn delete_product(&self, id: ProductId) -> CatalogResult<DeleteSummary> {
        let mut tx = begin(&self.pool).await?;
        let summary = CascadeDeleter::new(&mut tx).delete_product(id).await?;
        commit(tx).await?;
        Ok(summary)
    }

    /// Deletes a company together with all of its products.
    pub async fn delete_company(&self, id: CompanyId) -> CatalogResult<DeleteSummary> {
        let mut tx = begin(&self.pool).await?;
        let summary = CascadeDeleter::new(&mut tx).delete_company(id).await?;
        commit(tx).await?;
        Ok(summary)
    }

    /// Deletes an order and its line items.
    pub async fn delete_order(&self, id: OrderId) -> CatalogResult<DeleteSummary> {
        let mut tx = begin(&self.pool).await?;
        let summary = CascadeDeleter::new(&mut tx).delete_order(id).await?;
        commit(tx).await?;
        Ok(summary)
    }

    /// Deletes a person's account and identity records.
    ///
    /// ## Errors
    /// `NotFound` when the person has no user account.
    pub async fn delete_user(&self, person_id: PersonId) -> CatalogResult<DeleteSummary> {
        let mut tx = begin(&self.pool).await?;
        let summary = CascadeDeleter::new(&mut tx).delete_user(person_id).await?;
        commit(tx).await?;
        Ok(summary)
    }

    // =========================================================================
    // Companies & Categories
    // =========================================================================

    /// Inserts or replaces a company.
    pub async fn save_company(&self, company: Company) -> CatalogResult<Company> {
        validate_company(&company)?;

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let saved = CompanyRepository::new(&mut conn).save(&company).await?;

        info!(company_id = %saved.id, name = %saved.name, "Company saved");
        Ok(saved)
    }

    pub async fn get_company(&self, id: CompanyId) -> CatalogResult<Company> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        CompanyRepository::new(&mut conn)
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Company", id))
    }

    pub async fn list_companies(&self) -> CatalogResult<Vec<Company>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(CompanyRepository::new(&mut conn).list_all().await?)
    }

    /// Creates a category with a generated id.
    pub async fn create_category(&self, category: NewCategory) -> CatalogResult<Category> {
        validate_category_name(&category.name)?;

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let created = CategoryRepository::new(&mut conn)
            .insert(category.name.trim())
            .await?;

        info!(category_id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(CategoryRepository::new(&mut conn).list_all().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferencePolicy;
    use crate::error::ErrorCode;
    use crate::{Database, DbConfig};
    use codestock_core::{CategoryId, CurrencyId, Money};

    async fn catalog() -> (Database, Catalog) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        (db, catalog)
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected_before_write() {
        let (_db, catalog) = catalog().await;

        let err = catalog
            .create_or_update_product(ProductRequest::new("", "Widget", CompanyId::new(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(catalog.get_all_product_views().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_policy_leaves_nothing_behind() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog =
            db.catalog_with(CatalogConfig::default().reference_policy(ReferencePolicy::Verify));

        let request = ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .price(CurrencyId::new(1), Money::from_cents(999))
            .category(CategoryId::new(5));
        let err = catalog
            .create_or_update_product(request.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DanglingReference { .. }));
        assert!(catalog.get_all_product_views().await.unwrap().is_empty());

        catalog
            .save_category_for_test(CategoryId::new(5), "Tools")
            .await;
        let view = catalog.create_or_update_product(request).await.unwrap();
        assert_eq!(view.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_company_and_category_crud() {
        let (_db, catalog) = catalog().await;

        let acme = catalog
            .save_company(Company {
                id: CompanyId::new(1),
                nit: "900123456-7".to_string(),
                name: "Acme".to_string(),
                address: Some("Calle 1".to_string()),
                phone: None,
            })
            .await
            .unwrap();
        assert_eq!(catalog.get_company(acme.id).await.unwrap(), acme);
        assert_eq!(catalog.list_companies().await.unwrap().len(), 1);

        let missing = catalog.get_company(CompanyId::new(2)).await.unwrap_err();
        assert_eq!(missing.code(), ErrorCode::NotFound);

        let tools = catalog
            .create_category(NewCategory {
                name: "  Tools ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tools.name, "Tools");
        assert_eq!(catalog.list_categories().await.unwrap(), vec![tools]);

        let blank = catalog
            .create_category(NewCategory {
                name: " ".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(blank.code(), ErrorCode::ValidationError);
    }

    impl Catalog {
        async fn save_category_for_test(&self, id: CategoryId, name: &str) {
            let mut conn = self.pool.acquire().await.unwrap();
            CategoryRepository::new(&mut conn)
                .upsert(&Category {
                    id,
                    name: name.to_string(),
                })
                .await
                .unwrap();
        }
    }
}
