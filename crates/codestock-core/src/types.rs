//! # Domain Types
//!
//! Stored entities of the CodeStock catalog, one struct per table.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Entities                                │
//! │                                                                         │
//! │  ┌───────────┐ 1   * ┌───────────┐ 1   * ┌──────────────────────┐       │
//! │  │  Company  │──────►│  Product  │──────►│ Price                │       │
//! │  └───────────┘       └─────┬─────┘       │ (product, currency)  │       │
//! │                            │ 1           └──────────────────────┘       │
//! │                            │                                            │
//! │                            │ *  ┌─────────────────────┐ *   1 ┌──────┐  │
//! │                            ├───►│ ProductCategory     │──────►│ Cat. │  │
//! │                            │    │ (category, product) │       └──────┘  │
//! │                            │    └─────────────────────┘                 │
//! │                            │ *  ┌─────────────────────┐ *   1 ┌──────┐  │
//! │                            └───►│ ProductOrder        │──────►│Order │  │
//! │                                 │ (product, order)    │       └──────┘  │
//! │                                 └─────────────────────┘                 │
//! │                                                                         │
//! │  Identity records: Person ◄── User ──► Password, RoleUser ──► Role     │
//! │                    Person ◄── Client ◄── Order.client_id               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No Storage-Enforced Cascades
//! Nothing in this module (or in the SQLite schema) ties a child row to its
//! parent. The aggregate layer in `codestock-db` is the only place that
//! keeps children and parents consistent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

/// Declares an integer row-id newtype.
///
/// Every id is a plain SQLite `INTEGER` underneath; the newtype keeps a
/// `ProductId` from being passed where an `OrderId` is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[ts(export)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            #[inline]
            pub const fn new(id: i64) -> Self {
                $name(id)
            }

            /// Returns the raw row id.
            #[inline]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// Company identifier. Supplied by the caller (the tax registry id space).
    CompanyId
);
entity_id!(
    /// Product identifier. Generated by the store unless supplied.
    ProductId
);
entity_id!(
    /// Currency identifier. There is no currency table; ids are opaque.
    CurrencyId
);
entity_id!(
    /// Category identifier.
    CategoryId
);
entity_id!(
    /// Order identifier. Generated by the store unless supplied.
    OrderId
);
entity_id!(
    /// Client identifier (the purchasing side of an order).
    ClientId
);
entity_id!(
    /// Person identifier.
    PersonId
);
entity_id!(
    /// User account identifier.
    UserId
);
entity_id!(
    /// Password record identifier.
    PasswordId
);
entity_id!(
    /// Role identifier.
    RoleId
);
entity_id!(
    /// Role assignment identifier.
    RoleUserId
);

// =============================================================================
// Catalog
// =============================================================================

/// A company that owns products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Company {
    pub id: CompanyId,
    /// Tax identification number (NIT).
    pub nit: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// A product registered by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: ProductId,
    /// Business code printed on inventory sheets.
    pub code: String,
    pub name: String,
    /// Free-form characteristics text.
    pub characteristics: Option<String>,
    pub company_id: CompanyId,
}

/// A product's price in one currency.
///
/// Identity is the `(product_id, currency_id)` tuple, see
/// [`crate::keys::PriceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Price {
    pub product_id: ProductId,
    pub currency_id: CurrencyId,
    pub amount: Money,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Junction row linking a product to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductCategory {
    pub category_id: CategoryId,
    pub product_id: ProductId,
}

// =============================================================================
// Orders
// =============================================================================

/// A customer order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

/// Junction row: one product on one order, with a quantity.
///
/// The quantity is expected to be at least 1 but is stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductOrder {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub quantity: i64,
}

// =============================================================================
// Identity Records
// =============================================================================

/// Personal data shared by users and clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub last_name: String,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

/// A login account. Exactly one per person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub person_id: PersonId,
}

/// Stored credential for a user (PHC-formatted hash, salt included).
///
/// Never serialized: the hash must not leave the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Password {
    pub id: PasswordId,
    pub user_id: UserId,
    pub hash: String,
}

/// A person who can place orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: ClientId,
    pub person_id: PersonId,
}

/// An authorization role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub identifier: String,
}

/// Assignment of a role to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoleUser {
    pub id: RoleUserId,
    pub user_id: UserId,
    pub role_id: RoleId,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_types_with_raw_access() {
        let product = ProductId::new(10);
        assert_eq!(product.get(), 10);
        assert_eq!(product.to_string(), "10");
        assert_eq!(ProductId::from(10), product);
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&CategoryId::new(5)).unwrap();
        assert_eq!(json, "5");

        let parsed: OrderId = serde_json::from_str("100").unwrap();
        assert_eq!(parsed, OrderId::new(100));
    }

    #[test]
    fn test_price_serializes_amount_in_minor_units() {
        let price = Price {
            product_id: ProductId::new(10),
            currency_id: CurrencyId::new(1),
            amount: Money::from_cents(999),
        };
        let json = serde_json::to_value(&price).unwrap();
        assert_eq!(json["amount"], 999);
        assert_eq!(json["currency_id"], 1);
    }
}
