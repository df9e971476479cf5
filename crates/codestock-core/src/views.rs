//! # Denormalized Views
//!
//! Read models assembled by the aggregate reader. Nothing here is stored;
//! every view is rebuilt from the entity tables on each read.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderView                                                              │
//! │  ├── id, client_id, date                                                │
//! │  ├── line_items[]                                                       │
//! │  │   ├── quantity                                                       │
//! │  │   └── product: ProductView                                           │
//! │  │       ├── id, code, name, characteristics, company_id                │
//! │  │       ├── prices[]      (currency_id, amount)                        │
//! │  │       └── categories[]  (id, name)                                   │
//! │  └── totals[]          (currency_id, Σ quantity × amount)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    Category, ClientId, CompanyId, CurrencyId, Order, OrderId, Price, Product, ProductId,
};

// =============================================================================
// Product View
// =============================================================================

/// One price of a product, without the redundant product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceEntry {
    pub currency_id: CurrencyId,
    pub amount: Money,
}

/// A product together with its prices and categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductView {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub characteristics: Option<String>,
    pub company_id: CompanyId,
    /// Sorted by currency id.
    pub prices: Vec<PriceEntry>,
    pub categories: Vec<Category>,
}

impl ProductView {
    /// Assembles a view from already-fetched parts.
    ///
    /// Prices belonging to another product are ignored; the rest are
    /// sorted by currency id.
    pub fn assemble(product: Product, prices: Vec<Price>, categories: Vec<Category>) -> Self {
        let mut entries: Vec<PriceEntry> = prices
            .into_iter()
            .filter(|p| p.product_id == product.id)
            .map(|p| PriceEntry {
                currency_id: p.currency_id,
                amount: p.amount,
            })
            .collect();
        entries.sort_by_key(|e| e.currency_id);

        ProductView {
            id: product.id,
            code: product.code,
            name: product.name,
            characteristics: product.characteristics,
            company_id: product.company_id,
            prices: entries,
            categories,
        }
    }

    /// Price in the given currency, if the product has one.
    pub fn price_in(&self, currency_id: CurrencyId) -> Option<Money> {
        self.prices
            .iter()
            .find(|p| p.currency_id == currency_id)
            .map(|p| p.amount)
    }
}

// =============================================================================
// Order View
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemView {
    pub quantity: i64,
    pub product: ProductView,
}

/// Order total in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyTotal {
    pub currency_id: CurrencyId,
    pub amount: Money,
}

/// An order with its resolved line items and per-currency totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderView {
    pub id: OrderId,
    pub client_id: ClientId,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub line_items: Vec<LineItemView>,
    /// Sorted by currency id. A currency appears only if at least one
    /// line item's product is priced in it and its sum fits in an `i64`.
    pub totals: Vec<CurrencyTotal>,
}

impl OrderView {
    /// Builds the view and computes totals.
    ///
    /// A currency whose total overflows `i64` minor units has no entry in
    /// `totals` at all; a partial sum is never reported.
    pub fn assemble(order: Order, line_items: Vec<LineItemView>) -> Self {
        let totals = compute_totals(&line_items);
        OrderView {
            id: order.id,
            client_id: order.client_id,
            date: order.date,
            line_items,
            totals,
        }
    }

    /// Total in the given currency, if any line item is priced in it.
    pub fn total_in(&self, currency_id: CurrencyId) -> Option<Money> {
        self.totals
            .iter()
            .find(|t| t.currency_id == currency_id)
            .map(|t| t.amount)
    }
}

fn compute_totals(line_items: &[LineItemView]) -> Vec<CurrencyTotal> {
    // None marks a currency whose sum overflowed
    let mut by_currency: BTreeMap<CurrencyId, Option<Money>> = BTreeMap::new();

    for item in line_items {
        for price in &item.product.prices {
            let entry = by_currency
                .entry(price.currency_id)
                .or_insert(Some(Money::zero()));
            *entry = entry.and_then(|sum| {
                price
                    .amount
                    .checked_mul_quantity(item.quantity)
                    .and_then(|line_total| sum.checked_add(line_total))
            });
        }
    }

    by_currency
        .into_iter()
        .filter_map(|(currency_id, amount)| {
            amount.map(|amount| CurrencyTotal {
                currency_id,
                amount,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryId;
    use chrono::TimeZone;

    fn widget() -> Product {
        Product {
            id: ProductId::new(10),
            code: "W-1".to_string(),
            name: "Widget".to_string(),
            characteristics: None,
            company_id: CompanyId::new(1),
        }
    }

    fn price(product: i64, currency: i64, cents: i64) -> Price {
        Price {
            product_id: ProductId::new(product),
            currency_id: CurrencyId::new(currency),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_product_view_sorts_prices_by_currency() {
        let view = ProductView::assemble(
            widget(),
            vec![price(10, 2, 4_000_000), price(10, 1, 999)],
            vec![Category {
                id: CategoryId::new(5),
                name: "Tools".to_string(),
            }],
        );

        assert_eq!(view.prices[0].currency_id, CurrencyId::new(1));
        assert_eq!(view.prices[1].currency_id, CurrencyId::new(2));
        assert_eq!(view.price_in(CurrencyId::new(2)), Some(Money::from_cents(4_000_000)));
        assert_eq!(view.categories.len(), 1);
    }

    #[test]
    fn test_product_view_drops_foreign_prices() {
        let view = ProductView::assemble(widget(), vec![price(11, 1, 5)], vec![]);
        assert!(view.prices.is_empty());
    }

    #[test]
    fn test_order_totals_per_currency() {
        let product = ProductView::assemble(
            widget(),
            vec![price(10, 1, 999), price(10, 2, 4_000_000)],
            vec![],
        );
        let mut gadget = widget();
        gadget.id = ProductId::new(11);
        let usd_only = ProductView::assemble(gadget, vec![price(11, 1, 150)], vec![]);

        let order = Order {
            id: OrderId::new(100),
            client_id: ClientId::new(7),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let view = OrderView::assemble(
            order,
            vec![
                LineItemView {
                    quantity: 2,
                    product,
                },
                LineItemView {
                    quantity: 3,
                    product: usd_only,
                },
            ],
        );

        // 2 × 9.99 + 3 × 1.50
        assert_eq!(view.total_in(CurrencyId::new(1)), Some(Money::from_cents(2448)));
        assert_eq!(view.total_in(CurrencyId::new(2)), Some(Money::from_cents(8_000_000)));
        assert_eq!(view.totals.len(), 2);
    }

    #[test]
    fn test_overflowing_currency_has_no_total() {
        let huge = ProductView::assemble(
            widget(),
            vec![price(10, 1, i64::MAX / 2), price(10, 2, 500)],
            vec![],
        );
        let mut gadget = widget();
        gadget.id = ProductId::new(11);
        let small = ProductView::assemble(gadget, vec![price(11, 1, 100)], vec![]);

        let order = Order {
            id: OrderId::new(100),
            client_id: ClientId::new(7),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let view = OrderView::assemble(
            order,
            vec![
                LineItemView {
                    quantity: 3,
                    product: huge,
                },
                LineItemView {
                    quantity: 1,
                    product: small,
                },
            ],
        );

        assert_eq!(view.line_items.len(), 2);
        assert_eq!(view.total_in(CurrencyId::new(1)), None);
        // Other currencies are unaffected
        assert_eq!(view.total_in(CurrencyId::new(2)), Some(Money::from_cents(1500)));
        assert_eq!(view.totals.len(), 1);
    }

    #[test]
    fn test_running_sum_overflow_drops_the_currency() {
        let mut a = widget();
        a.id = ProductId::new(1);
        let mut b = widget();
        b.id = ProductId::new(2);
        let line = |product: Product, cents: i64| {
            let usd = price(product.id.get(), 1, cents);
            LineItemView {
                quantity: 1,
                product: ProductView::assemble(product, vec![usd], vec![]),
            }
        };

        let order = Order {
            id: OrderId::new(100),
            client_id: ClientId::new(7),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let view = OrderView::assemble(order, vec![line(a, i64::MAX), line(b, 1)]);
        assert!(view.totals.is_empty());
    }

    #[test]
    fn test_order_without_line_items_has_no_totals() {
        let order = Order {
            id: OrderId::new(100),
            client_id: ClientId::new(7),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let view = OrderView::assemble(order, vec![]);
        assert!(view.line_items.is_empty());
        assert!(view.totals.is_empty());
    }
}
