//! # Composite Key Policy
//!
//! Price, ProductCategory and ProductOrder have no surrogate id. Each is
//! identified by a pair of foreign ids, and this module is the single place
//! that decides how those pairs are formed and compared.
//!
//! ## Identity Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Entity            Key tuple                Partial lookups (filter)   │
//! │  ───────────────   ──────────────────────   ─────────────────────────  │
//! │  Price             (product, currency)      by product                 │
//! │  ProductCategory   (category, product)      by product, by category    │
//! │  ProductOrder      (product, order)         by order, by product       │
//! │                                                                         │
//! │  • Equality and hashing use the FULL tuple                             │
//! │  • A write with an existing key replaces the row (insert-or-replace)   │
//! │  • A partial match is never treated as identity                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{
    CategoryId, CurrencyId, OrderId, Price, ProductCategory, ProductId, ProductOrder,
};

// =============================================================================
// Key Types
// =============================================================================

/// Identity of a [`Price`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    pub product_id: ProductId,
    pub currency_id: CurrencyId,
}

impl PriceKey {
    pub const fn new(product_id: ProductId, currency_id: CurrencyId) -> Self {
        PriceKey {
            product_id,
            currency_id,
        }
    }

    /// Partial match on the product member.
    pub fn belongs_to(&self, product_id: ProductId) -> bool {
        self.product_id == product_id
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "price(product={}, currency={})", self.product_id, self.currency_id)
    }
}

/// Identity of a [`ProductCategory`] link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductCategoryKey {
    pub category_id: CategoryId,
    pub product_id: ProductId,
}

impl ProductCategoryKey {
    pub const fn new(category_id: CategoryId, product_id: ProductId) -> Self {
        ProductCategoryKey {
            category_id,
            product_id,
        }
    }

    /// Partial match on the product member.
    pub fn belongs_to(&self, product_id: ProductId) -> bool {
        self.product_id == product_id
    }
}

impl fmt::Display for ProductCategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "product_category(category={}, product={})",
            self.category_id, self.product_id
        )
    }
}

/// Identity of a [`ProductOrder`] line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductOrderKey {
    pub product_id: ProductId,
    pub order_id: OrderId,
}

impl ProductOrderKey {
    pub const fn new(product_id: ProductId, order_id: OrderId) -> Self {
        ProductOrderKey {
            product_id,
            order_id,
        }
    }

    /// Partial match on the order member.
    pub fn belongs_to(&self, order_id: OrderId) -> bool {
        self.order_id == order_id
    }
}

impl fmt::Display for ProductOrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "product_order(product={}, order={})",
            self.product_id, self.order_id
        )
    }
}

// =============================================================================
// CompositeKey Trait
// =============================================================================

/// A record whose identity is a composite key.
pub trait CompositeKey {
    type Key: Copy + Ord + fmt::Display;

    /// Returns the full identity tuple of this record.
    fn key(&self) -> Self::Key;
}

impl CompositeKey for Price {
    type Key = PriceKey;

    fn key(&self) -> PriceKey {
        PriceKey::new(self.product_id, self.currency_id)
    }
}

impl CompositeKey for ProductCategory {
    type Key = ProductCategoryKey;

    fn key(&self) -> ProductCategoryKey {
        ProductCategoryKey::new(self.category_id, self.product_id)
    }
}

impl CompositeKey for ProductOrder {
    type Key = ProductOrderKey;

    fn key(&self) -> ProductOrderKey {
        ProductOrderKey::new(self.product_id, self.order_id)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Collapses records that share a key, keeping the LAST one supplied.
///
/// This mirrors what the store does with insert-or-replace writes, so a
/// request that names the same key twice ends up with exactly the row the
/// store would have kept. The result is ordered by key.
///
/// ## Example
/// ```rust
/// use codestock_core::keys::last_write_wins;
/// use codestock_core::{CurrencyId, Money, Price, ProductId};
///
/// let p = ProductId::new(10);
/// let usd = CurrencyId::new(1);
/// let rows = vec![
///     Price { product_id: p, currency_id: usd, amount: Money::from_cents(100) },
///     Price { product_id: p, currency_id: usd, amount: Money::from_cents(999) },
/// ];
/// let kept = last_write_wins(rows);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].amount.cents(), 999);
/// ```
pub fn last_write_wins<T: CompositeKey>(records: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut by_key: BTreeMap<T::Key, T> = BTreeMap::new();
    for record in records {
        by_key.insert(record.key(), record);
    }
    by_key.into_values().collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use std::collections::HashSet;

    fn price(product: i64, currency: i64, cents: i64) -> Price {
        Price {
            product_id: ProductId::new(product),
            currency_id: CurrencyId::new(currency),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_full_tuple_equality() {
        let a = PriceKey::new(ProductId::new(10), CurrencyId::new(1));
        let same = PriceKey::new(ProductId::new(10), CurrencyId::new(1));
        let other_currency = PriceKey::new(ProductId::new(10), CurrencyId::new(2));
        let other_product = PriceKey::new(ProductId::new(11), CurrencyId::new(1));

        assert_eq!(a, same);
        assert_ne!(a, other_currency);
        assert_ne!(a, other_product);

        let set: HashSet<_> = [a, same, other_currency].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_partial_match_is_not_identity() {
        let a = ProductCategoryKey::new(CategoryId::new(5), ProductId::new(10));
        let b = ProductCategoryKey::new(CategoryId::new(6), ProductId::new(10));

        assert!(a.belongs_to(ProductId::new(10)));
        assert!(b.belongs_to(ProductId::new(10)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_keys() {
        let link = ProductOrder {
            product_id: ProductId::new(10),
            order_id: OrderId::new(100),
            quantity: 2,
        };
        assert_eq!(
            link.key(),
            ProductOrderKey::new(ProductId::new(10), OrderId::new(100))
        );
        assert!(link.key().belongs_to(OrderId::new(100)));
    }

    #[test]
    fn test_last_write_wins_keeps_latest_per_key() {
        let kept = last_write_wins(vec![
            price(10, 2, 4_000_000),
            price(10, 1, 100),
            price(10, 1, 999),
        ]);

        assert_eq!(kept.len(), 2);
        // Ordered by key: currency 1 first
        assert_eq!(kept[0].currency_id, CurrencyId::new(1));
        assert_eq!(kept[0].amount.cents(), 999);
        assert_eq!(kept[1].amount.cents(), 4_000_000);
    }

    #[test]
    fn test_key_display() {
        let key = PriceKey::new(ProductId::new(10), CurrencyId::new(1));
        assert_eq!(key.to_string(), "price(product=10, currency=1)");
    }
}
