//! # codestock-core: Domain Types for the CodeStock Catalog
//!
//! This crate holds everything about the catalog that can be expressed
//! without touching storage: entities, composite keys, denormalized views,
//! money arithmetic and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CodeStock Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                REST transport (outside this workspace)          │   │
//! │  │    /product, /productsCompany, /order, /company, /user ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    codestock-db                                 │   │
//! │  │   Catalog ──► AggregateReader / AggregateWriter / Cascade       │   │
//! │  │   Accounts ──► repositories ──► SQLite                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses types from                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ codestock-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────┐  │   │
//! │  │   │  types   │ │   keys   │ │  views   │ │ requests │ │money│  │   │
//! │  │   │ Product  │ │ PriceKey │ │ProductVw │ │ProductReq│ │     │  │   │
//! │  │   │ Order    │ │ LinkKeys │ │ OrderVw  │ │ OrderReq │ │     │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └─────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Company, Product, Price, Order, ...)
//! - [`keys`] - Composite key identity for Price, ProductCategory, ProductOrder
//! - [`views`] - Denormalized read models (ProductView, OrderView)
//! - [`requests`] - Write requests accepted by the catalog
//! - [`money`] - Fixed-point amounts in minor units
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use codestock_core::keys::PriceKey;
//! use codestock_core::{CurrencyId, Money, ProductId};
//!
//! let price = Money::parse_decimal("9.99").unwrap();
//! assert_eq!(price.cents(), 999);
//!
//! // Composite keys compare by the full tuple
//! let a = PriceKey::new(ProductId::new(10), CurrencyId::new(1));
//! let b = PriceKey::new(ProductId::new(10), CurrencyId::new(2));
//! assert_ne!(a, b);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod keys;
pub mod money;
pub mod requests;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use requests::*;
pub use types::*;
pub use views::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Role assigned to every self-registered user.
///
/// The seeded `roles` table holds `1 = admin` and `2 = client`.
pub const DEFAULT_CLIENT_ROLE_ID: RoleId = RoleId::new(2);

/// Minimum accepted password length for account registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;
