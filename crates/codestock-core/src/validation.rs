//! # Validation Module
//!
//! Field-level input checks for CodeStock write requests.
//!
//! ## What Is (and Isn't) Checked
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Scope                                   │
//! │                                                                         │
//! │  Checked here (before any store call)                                  │
//! │  ├── Product code / name length                                        │
//! │  ├── Company name and NIT present                                      │
//! │  ├── Category name present                                             │
//! │  └── Email shape, password length, password confirmation               │
//! │                                                                         │
//! │  NOT checked here                                                       │
//! │  ├── Line item quantities (stored as given)                            │
//! │  └── Referenced ids (category, product, client)                        │
//! │      → see ReferencePolicy in codestock-db                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use codestock_core::validation::{validate_product_code, validate_email};
//!
//! validate_product_code("W-1").unwrap();
//! assert!(validate_email("not-an-email").is_err());
//! ```

use crate::error::ValidationError;
use crate::requests::{ProductRequest, RegisterUserRequest};
use crate::types::Company;
use crate::MIN_PASSWORD_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LENGTH: usize = 50;
const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// Helpers
// =============================================================================

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
///
/// ## Example
/// ```rust
/// use codestock_core::validation::validate_product_code;
///
/// assert!(validate_product_code("W-1").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code(&"A".repeat(51)).is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    required("code", code)?;
    at_most("code", code, MAX_CODE_LENGTH)
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    at_most("name", name, MAX_NAME_LENGTH)
}

/// Validates the scalar fields of a product request.
///
/// Prices and category ids are deliberately left alone.
pub fn validate_product_request(request: &ProductRequest) -> ValidationResult<()> {
    validate_product_code(&request.code)?;
    validate_product_name(&request.name)
}

/// Validates a company record before it is saved.
pub fn validate_company(company: &Company) -> ValidationResult<()> {
    required("nit", &company.nit)?;
    required("company name", &company.name)?;
    at_most("company name", &company.name, MAX_NAME_LENGTH)
}

pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    required("category name", name)?;
    at_most("category name", name, MAX_NAME_LENGTH)
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part
/// - Domain contains a `.` that is neither first nor last
/// - No whitespace
///
/// This is a shape check, not deliverability.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required("email", email)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain.tld"));
    }
    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Validates a new password.
///
/// ## Rules
/// - At least [`MIN_PASSWORD_LENGTH`] characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Validates a new password together with its confirmation.
pub fn validate_password_change(new_password: &str, confirm: &str) -> ValidationResult<()> {
    validate_password(new_password)?;
    if new_password != confirm {
        return Err(ValidationError::Mismatch {
            field: "confirm_password".to_string(),
            other: "new_password".to_string(),
        });
    }
    Ok(())
}

/// Validates a self-registration request.
pub fn validate_registration(request: &RegisterUserRequest) -> ValidationResult<()> {
    required("name", &request.name)?;
    required("last_name", &request.last_name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompanyId;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("W-1").is_ok());
        assert!(validate_product_code(&"A".repeat(50)).is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Widget").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_product_request_ignores_children() {
        let req = ProductRequest::new("W-1", "Widget", CompanyId::new(1))
            .price(crate::CurrencyId::new(1), crate::Money::from_cents(-5))
            .category(crate::CategoryId::new(999));
        assert!(validate_product_request(&req).is_ok());

        let req = ProductRequest::new("", "Widget", CompanyId::new(1));
        assert!(validate_product_request(&req).is_err());
    }

    #[test]
    fn test_validate_company() {
        let mut company = Company {
            id: CompanyId::new(1),
            nit: "900123".to_string(),
            name: "Acme".to_string(),
            address: None,
            phone: None,
        };
        assert!(validate_company(&company).is_ok());

        company.nit = " ".to_string();
        assert_eq!(
            validate_company(&company),
            Err(ValidationError::Required {
                field: "nit".to_string()
            })
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email(" ana@example.co ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("an a@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("s3cretpass").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
    }

    #[test]
    fn test_validate_password_change() {
        assert!(validate_password_change("newpassword", "newpassword").is_ok());
        assert!(matches!(
            validate_password_change("newpassword", "newpasswort"),
            Err(ValidationError::Mismatch { .. })
        ));
    }
}
