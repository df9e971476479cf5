//! # Write Requests
//!
//! Shapes accepted by the catalog's write operations. A request carries the
//! parent's fields plus the declared children; the child foreign keys that
//! point at the parent are filled in by the writer once the parent id is
//! known.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    CategoryId, ClientId, CompanyId, CurrencyId, OrderId, Person, PersonId, ProductId,
};

// =============================================================================
// Product
// =============================================================================

/// Create-or-update request for a product aggregate.
///
/// `id: None` creates a new product with a generated id. `id: Some(_)`
/// upserts that product and REPLACES its category set wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRequest {
    pub id: Option<ProductId>,
    pub code: String,
    pub name: String,
    pub characteristics: Option<String>,
    pub company_id: CompanyId,
    #[serde(default)]
    pub prices: Vec<PriceSpec>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl ProductRequest {
    /// Starts a request for a new product with no prices or categories.
    pub fn new(code: impl Into<String>, name: impl Into<String>, company_id: CompanyId) -> Self {
        ProductRequest {
            id: None,
            code: code.into(),
            name: name.into(),
            characteristics: None,
            company_id,
            prices: Vec::new(),
            category_ids: Vec::new(),
        }
    }

    /// Targets an existing (or caller-chosen) product id.
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn characteristics(mut self, text: impl Into<String>) -> Self {
        self.characteristics = Some(text.into());
        self
    }

    pub fn price(mut self, currency_id: CurrencyId, amount: Money) -> Self {
        self.prices.push(PriceSpec {
            currency_id,
            amount,
        });
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_ids.push(category_id);
        self
    }
}

/// One price in a product request; the product id comes from the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceSpec {
    pub currency_id: CurrencyId,
    pub amount: Money,
}

// =============================================================================
// Order
// =============================================================================

/// Create request for an order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    /// Caller-chosen id; `None` lets the store generate one.
    pub id: Option<OrderId>,
    pub client_id: ClientId,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub line_items: Vec<LineItemSpec>,
}

impl OrderRequest {
    pub fn new(client_id: ClientId, date: DateTime<Utc>) -> Self {
        OrderRequest {
            id: None,
            client_id,
            date,
            line_items: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn line_item(mut self, product_id: ProductId, quantity: i64) -> Self {
        self.line_items.push(LineItemSpec {
            product_id,
            quantity,
        });
        self
    }
}

/// One line item in an order request. Neither field is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemSpec {
    pub product_id: ProductId,
    pub quantity: i64,
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
}

// =============================================================================
// Accounts
// =============================================================================

/// Self-registration of a user account.
///
/// Creates a Person, a User, a Password, a client RoleUser and a Client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub name: String,
    pub last_name: String,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub email: String,
    pub password: String,
}

/// Password change for an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Partial update of a person. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonUpdate {
    pub id: PersonId,
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

impl PersonUpdate {
    /// An update that changes nothing yet.
    pub fn new(id: PersonId) -> Self {
        PersonUpdate {
            id,
            name: None,
            last_name: None,
            date_of_birth: None,
            phone: None,
            gender: None,
        }
    }

    /// Applies the supplied fields on top of the stored person.
    pub fn apply_to(&self, person: &Person) -> Person {
        Person {
            id: person.id,
            name: self.name.clone().unwrap_or_else(|| person.name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| person.last_name.clone()),
            date_of_birth: self.date_of_birth.or(person.date_of_birth),
            phone: self.phone.clone().or_else(|| person.phone.clone()),
            gender: self.gender.clone().or_else(|| person.gender.clone()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_request_builder() {
        let req = ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .with_id(ProductId::new(10))
            .price(CurrencyId::new(1), Money::from_cents(999))
            .category(CategoryId::new(5));

        assert_eq!(req.id, Some(ProductId::new(10)));
        assert_eq!(req.prices.len(), 1);
        assert_eq!(req.category_ids, vec![CategoryId::new(5)]);
    }

    #[test]
    fn test_product_request_children_default_to_empty() {
        let req: ProductRequest = serde_json::from_str(
            r#"{"id": null, "code": "W-1", "name": "Widget", "characteristics": null, "company_id": 1}"#,
        )
        .unwrap();
        assert!(req.prices.is_empty());
        assert!(req.category_ids.is_empty());
    }

    #[test]
    fn test_person_update_only_touches_supplied_fields() {
        let stored = Person {
            id: PersonId::new(3),
            name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            date_of_birth: None,
            phone: Some("300".to_string()),
            gender: None,
        };
        let update = PersonUpdate {
            phone: Some("301".to_string()),
            ..PersonUpdate::new(PersonId::new(3))
        };

        let merged = update.apply_to(&stored);
        assert_eq!(merged.name, "Ana");
        assert_eq!(merged.last_name, "Rojas");
        assert_eq!(merged.phone.as_deref(), Some("301"));
    }
}
