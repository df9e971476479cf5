//! # Cascade Deleter
//!
//! The schema has no foreign keys, so nothing cascades in storage. Every
//! delete that owns children walks them here, children first and the
//! parent last.
//!
//! Each step deletes by key and tolerates zero affected rows, so a delete
//! of something already gone succeeds and a retried delete is harmless.
//! `delete_user` is the one exception: it looks the user up first and
//! reports `NotFound` when there's no account for the person.

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{CascadeStep, CatalogError, CatalogResult};
use crate::repository::{
    ClientRepository, CompanyRepository, OrderRepository, PasswordRepository, PersonRepository,
    PriceRepository, ProductCategoryRepository, ProductOrderRepository, ProductRepository,
    RoleUserRepository, UserRepository,
};
use codestock_core::{CompanyId, OrderId, PersonId, ProductId};

/// Row counts removed by one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Parent rows removed (0 when the parent was already gone).
    pub parents: u64,
    /// Child and grandchild rows removed.
    pub children: u64,
}

impl DeleteSummary {
    /// Total rows removed.
    pub fn total(&self) -> u64 {
        self.parents + self.children
    }
}

/// Runs cascades on one connection (normally an open transaction).
#[derive(Debug)]
pub struct CascadeDeleter<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CascadeDeleter<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CascadeDeleter { conn }
    }

    // =========================================================================
    // Product / Company
    // =========================================================================

    /// links → prices → product
    pub async fn delete_product(&mut self, product_id: ProductId) -> CatalogResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();

        summary.children += self
            .delete_product_children("Product", product_id, product_id)
            .await?;

        summary.parents = ProductRepository::new(&mut *self.conn)
            .delete_by_id(product_id)
            .await
            .map_err(CatalogError::cascade(
                "Product",
                product_id,
                CascadeStep::DeleteParent,
            ))?;

        info!(
            product_id = %product_id,
            parents = summary.parents,
            children = summary.children,
            "Product deleted"
        );
        Ok(summary)
    }

    /// (links → prices) per product → products → company
    pub async fn delete_company(&mut self, company_id: CompanyId) -> CatalogResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();

        let product_ids = ProductRepository::new(&mut *self.conn)
            .list_ids_by_company(company_id)
            .await
            .map_err(CatalogError::cascade(
                "Company",
                company_id,
                CascadeStep::ListCompanyProducts,
            ))?;
        debug!(company_id = %company_id, products = product_ids.len(), "Cascading company");

        for &product_id in &product_ids {
            summary.children += self
                .delete_product_children("Company", company_id, product_id)
                .await?;
        }

        summary.children += ProductRepository::new(&mut *self.conn)
            .delete_by_company(company_id)
            .await
            .map_err(CatalogError::cascade(
                "Company",
                company_id,
                CascadeStep::DeleteProducts,
            ))?;

        summary.parents = CompanyRepository::new(&mut *self.conn)
            .delete_by_id(company_id)
            .await
            .map_err(CatalogError::cascade(
                "Company",
                company_id,
                CascadeStep::DeleteParent,
            ))?;

        info!(
            company_id = %company_id,
            products = product_ids.len(),
            children = summary.children,
            "Company deleted"
        );
        Ok(summary)
    }

    // =========================================================================
    // Order
    // =========================================================================

    /// line items → order
    pub async fn delete_order(&mut self, order_id: OrderId) -> CatalogResult<DeleteSummary> {
        let children = ProductOrderRepository::new(&mut *self.conn)
            .delete_by_order(order_id)
            .await
            .map_err(CatalogError::cascade(
                "Order",
                order_id,
                CascadeStep::DeleteLineItems,
            ))?;

        let parents = OrderRepository::new(&mut *self.conn)
            .delete_by_id(order_id)
            .await
            .map_err(CatalogError::cascade(
                "Order",
                order_id,
                CascadeStep::DeleteParent,
            ))?;

        info!(order_id = %order_id, parents, children, "Order deleted");
        Ok(DeleteSummary { parents, children })
    }

    // =========================================================================
    // User
    // =========================================================================

    /// password → client → role assignments → user → person
    ///
    /// ## Errors
    /// `NotFound` when the person has no user account. Nothing is deleted
    /// in that case.
    pub async fn delete_user(&mut self, person_id: PersonId) -> CatalogResult<DeleteSummary> {
        let user = UserRepository::new(&mut *self.conn)
            .get_by_person(person_id)
            .await
            .map_err(CatalogError::cascade("User", person_id, CascadeStep::FindUser))?
            .ok_or_else(|| CatalogError::not_found("User", person_id))?;

        let mut summary = DeleteSummary::default();

        summary.children += PasswordRepository::new(&mut *self.conn)
            .delete_by_user(user.id)
            .await
            .map_err(CatalogError::cascade("User", person_id, CascadeStep::DeletePassword))?;

        summary.children += ClientRepository::new(&mut *self.conn)
            .delete_by_person(person_id)
            .await
            .map_err(CatalogError::cascade("User", person_id, CascadeStep::DeleteClient))?;

        summary.children += RoleUserRepository::new(&mut *self.conn)
            .delete_by_user(user.id)
            .await
            .map_err(CatalogError::cascade(
                "User",
                person_id,
                CascadeStep::DeleteRoleAssignments,
            ))?;

        summary.children += UserRepository::new(&mut *self.conn)
            .delete_by_id(user.id)
            .await
            .map_err(CatalogError::cascade("User", person_id, CascadeStep::DeleteUser))?;

        summary.parents = PersonRepository::new(&mut *self.conn)
            .delete_by_id(person_id)
            .await
            .map_err(CatalogError::cascade("User", person_id, CascadeStep::DeletePerson))?;

        info!(
            person_id = %person_id,
            user_id = %user.id,
            children = summary.children,
            "User deleted"
        );
        Ok(summary)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Category links and prices of one product. Line items stay: orders
    /// keep their history and readers drop the missing product.
    ///
    /// `entity`/`id` name the cascade root for error reporting.
    async fn delete_product_children(
        &mut self,
        entity: &'static str,
        id: impl ToString + Copy,
        product_id: ProductId,
    ) -> CatalogResult<u64> {
        let links = ProductCategoryRepository::new(&mut *self.conn)
            .delete_by_product(product_id)
            .await
            .map_err(CatalogError::cascade(
                entity,
                id,
                CascadeStep::UnlinkCategories,
            ))?;

        let prices = PriceRepository::new(&mut *self.conn)
            .delete_by_product(product_id)
            .await
            .map_err(CatalogError::cascade(
                entity,
                id,
                CascadeStep::DeletePrices,
            ))?;

        debug!(product_id = %product_id, links, prices, "Product children deleted");
        Ok(links + prices)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
