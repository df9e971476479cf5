//! # codestock-db: Storage and Aggregate Orchestration for CodeStock
//!
//! This crate owns the SQLite store and every operation that spans more
//! than one table. The schema declares no foreign keys; referential
//! integrity is kept here, by the order in which rows are written and
//! deleted.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CodeStock Data Flow                                │
//! │                                                                         │
//! │  Transport layer (REST handlers, seed binary)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  codestock-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Catalog    │   │    aggregate     │   │ Repositories │   │   │
//! │  │   │   Accounts   │──►│ Reader / Writer  │──►│ one per table│   │   │
//! │  │   │ (tx bounds)  │   │ CascadeDeleter   │   │              │   │   │
//! │  │   └──────┬───────┘   └──────────────────┘   └──────┬───────┘   │   │
//! │  │          │                                         │           │   │
//! │  │   ┌──────┴───────┐                          ┌──────┴───────┐   │   │
//! │  │   │   Database   │                          │  Migrations  │   │   │
//! │  │   │  (pool.rs)   │                          │  (embedded)  │   │   │
//! │  │   └──────────────┘                          └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (file in WAL mode, or in-memory for tests)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `CatalogError`
//! - [`config`] - Catalog behaviour switches
//! - [`repository`] - One repository per table
//! - [`aggregate`] - Multi-table reads, writes and cascades
//! - [`catalog`] - Product / order / company / category service
//! - [`accounts`] - Registration, credentials, persons
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codestock_db::{Database, DbConfig};
//! use codestock_core::{CompanyId, CurrencyId, Money, ProductRequest};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let view = db
//!     .catalog()
//!     .create_or_update_product(
//!         ProductRequest::new("W-1", "Widget", CompanyId::new(1))
//!             .price(CurrencyId::new(1), Money::from_cents(999)),
//!     )
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accounts;
pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use accounts::{Account, Accounts};
pub use aggregate::DeleteSummary;
pub use catalog::Catalog;
pub use config::{CatalogConfig, ConfigError, ReferencePolicy};
pub use error::{CatalogError, CatalogResult, DbError, DbResult, ErrorCode};
pub use pool::{Database, DbConfig};
