//! # Repository Module
//!
//! Key-based CRUD, one repository per table.
//!
//! ## Repositories Borrow a Connection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connection-Scoped Repositories                       │
//! │                                                                         │
//! │  let mut tx = pool.begin().await?;                                     │
//! │       │                                                                 │
//! │       │  ProductRepository::new(&mut tx).upsert(..)                    │
//! │       │  PriceRepository::new(&mut tx).upsert(..)                      │
//! │       │  ProductCategoryRepository::new(&mut tx).insert(..)            │
//! │       ▼                                                                 │
//! │  tx.commit().await?;   ← all or nothing                                │
//! │                                                                         │
//! │  A repository holds `&mut SqliteConnection`, so the same code runs     │
//! │  inside a transaction or on a plain pooled connection.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! - `get_by_id` / `get` → `Option<T>` (absence is not an error here)
//! - `list_all`, `list_by_<fk>` → `Vec<T>`
//! - `insert` / `upsert` / `save` → the stored record (with its id)
//! - `delete_by_id`, `delete_by_<fk>` → rows affected; deleting nothing
//!   is a no-op, not an error
//!
//! Composite-key tables (prices, product_categories, product_orders) are
//! upserted by their full key and found / deleted by either key member.
//!
//! ## Available Repositories
//!
//! - [`CompanyRepository`], [`ProductRepository`], [`PriceRepository`]
//! - [`CategoryRepository`], [`ProductCategoryRepository`]
//! - [`OrderRepository`], [`ProductOrderRepository`]
//! - identity: [`PersonRepository`], [`UserRepository`],
//!   [`PasswordRepository`], [`ClientRepository`], [`RoleRepository`],
//!   [`RoleUserRepository`]

pub mod category;
pub mod company;
pub mod identity;
pub mod order;
pub mod price;
pub mod product;
pub mod product_category;
pub mod product_order;

pub use category::CategoryRepository;
pub use company::CompanyRepository;
pub use identity::{
    ClientRepository, PasswordRepository, PersonRepository, RoleRepository, RoleUserRepository,
    UserRepository,
};
pub use order::OrderRepository;
pub use price::PriceRepository;
pub use product::ProductRepository;
pub use product_category::ProductCategoryRepository;
pub use product_order::ProductOrderRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::pool::PoolConnection;
    use sqlx::Sqlite;

    use crate::{Database, DbConfig};

    /// Fresh migrated in-memory database and its single connection.
    pub async fn connection() -> (Database, PoolConnection<Sqlite>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let conn = db.pool().acquire().await.unwrap();
        (db, conn)
    }
}
