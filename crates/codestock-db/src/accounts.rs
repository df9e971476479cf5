//! # Accounts Service
//!
//! User registration, credential checks and person maintenance.
//!
//! ## Registration Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_user(request)                                                 │
//! │       │                                                                 │
//! │       ├── validate (names, email shape, password length)               │
//! │       ├── hash password (argon2id, blocking pool)                      │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    persons     ← name, last name, ...                                  │
//! │    users       ← email (UNIQUE)         duplicate → UniqueViolation    │
//! │    passwords   ← PHC hash                                              │
//! │    role_users  ← DEFAULT_CLIENT_ROLE_ID                                │
//! │    clients     ← person id                                             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Emails are trimmed and lowercased before they are stored or looked up.
//! Hashing runs on tokio's blocking pool so it never stalls the runtime.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::aggregate::{CascadeDeleter, DeleteSummary};
use crate::catalog::{begin, commit};
use crate::error::{CatalogError, CatalogResult, DbError, WriteStage};
use crate::repository::identity::NewPerson;
use crate::repository::{
    ClientRepository, PasswordRepository, PersonRepository, RoleUserRepository, UserRepository,
};
use codestock_core::validation::{validate_password_change, validate_registration};
use codestock_core::{
    ChangePasswordRequest, Client, Person, PersonId, PersonUpdate, RegisterUserRequest, User,
    DEFAULT_CLIENT_ROLE_ID,
};

/// The records created by one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub person: Person,
    pub user: User,
    pub client: Client,
}

/// Account operations over a shared pool.
#[derive(Debug, Clone)]
pub struct Accounts {
    pool: SqlitePool,
}

impl Accounts {
    pub fn new(pool: SqlitePool) -> Self {
        Accounts { pool }
    }

    // =========================================================================
    // Registration & Credentials
    // =========================================================================

    /// Registers a person as a client with a login.
    ///
    /// ## Errors
    /// - `Validation` for a malformed request
    /// - `WriteFailure` wrapping `DbError::UniqueViolation` when the email
    ///   is taken (`code()` is `Conflict`)
    pub async fn register_user(&self, request: RegisterUserRequest) -> CatalogResult<Account> {
        validate_registration(&request)?;

        let email = normalize_email(&request.email);
        let hash = hash_password(request.password.clone()).await?;

        let mut tx = begin(&self.pool).await?;
        let person = PersonRepository::new(&mut tx)
            .insert(NewPerson {
                name: request.name.trim(),
                last_name: request.last_name.trim(),
                date_of_birth: request.date_of_birth,
                phone: request.phone.as_deref(),
                gender: request.gender.as_deref(),
            })
            .await
            .map_err(CatalogError::write("User", &email, WriteStage::AccountRecord))?;

        let user = UserRepository::new(&mut tx)
            .insert(&email, person.id)
            .await
            .map_err(CatalogError::write("User", &email, WriteStage::AccountRecord))?;

        PasswordRepository::new(&mut tx)
            .insert(user.id, &hash)
            .await
            .map_err(CatalogError::write("User", &email, WriteStage::AccountRecord))?;

        RoleUserRepository::new(&mut tx)
            .insert(user.id, DEFAULT_CLIENT_ROLE_ID)
            .await
            .map_err(CatalogError::write("User", &email, WriteStage::AccountRecord))?;

        let client = ClientRepository::new(&mut tx)
            .insert(person.id)
            .await
            .map_err(CatalogError::write("User", &email, WriteStage::AccountRecord))?;

        commit(tx).await?;

        info!(person_id = %person.id, user_id = %user.id, "User registered");
        Ok(Account {
            person,
            user,
            client,
        })
    }

    /// Checks an email / password pair and returns the account's person.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown email
    /// - `InvalidCredentials` for a wrong password
    pub async fn verify_credentials(&self, email: &str, password: &str) -> CatalogResult<Person> {
        let email = normalize_email(email);
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

        let user = UserRepository::new(&mut conn)
            .get_by_email(&email)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", &email))?;

        let stored = PasswordRepository::new(&mut conn)
            .get_by_user(user.id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Password", user.id))?;

        if !verify_password(password.to_string(), stored.hash).await? {
            warn!(user_id = %user.id, "Rejected login: wrong password");
            return Err(CatalogError::InvalidCredentials);
        }

        let person = PersonRepository::new(&mut conn)
            .get_by_id(user.person_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Person", user.person_id))?;

        debug!(user_id = %user.id, "Credentials verified");
        Ok(person)
    }

    /// Replaces a user's password after checking the old one.
    pub async fn change_password(&self, request: ChangePasswordRequest) -> CatalogResult<()> {
        validate_password_change(&request.new_password, &request.confirm_password)?;

        let person = self
            .verify_credentials(&request.email, &request.old_password)
            .await?;
        let hash = hash_password(request.new_password.clone()).await?;

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let user = UserRepository::new(&mut conn)
            .get_by_person(person.id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", person.id))?;
        PasswordRepository::new(&mut conn)
            .update_hash(user.id, &hash)
            .await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    // =========================================================================
    // Persons
    // =========================================================================

    pub async fn get_person(&self, id: PersonId) -> CatalogResult<Person> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        PersonRepository::new(&mut conn)
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Person", id))
    }

    pub async fn list_persons(&self) -> CatalogResult<Vec<Person>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(PersonRepository::new(&mut conn).list_all().await?)
    }

    /// Changes only the fields the update carries.
    pub async fn update_person(&self, update: PersonUpdate) -> CatalogResult<Person> {
        let mut tx = begin(&self.pool).await?;

        let current = PersonRepository::new(&mut tx)
            .get_by_id(update.id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Person", update.id))?;
        let person = PersonRepository::new(&mut tx)
            .update(&update.apply_to(&current))
            .await?;

        commit(tx).await?;

        debug!(person_id = %person.id, "Person updated");
        Ok(person)
    }

    /// Removes the account and every identity record of a person.
    pub async fn delete_user(&self, person_id: PersonId) -> CatalogResult<DeleteSummary> {
        let mut tx = begin(&self.pool).await?;
        let summary = CascadeDeleter::new(&mut tx).delete_user(person_id).await?;
        commit(tx).await?;
        Ok(summary)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String) -> CatalogResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CatalogError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| CatalogError::PasswordHash(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> CatalogResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| CatalogError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| CatalogError::PasswordHash(e.to_string()))?
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::{Database, DbConfig};

    fn registration(email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: "Ana".to_string(),
            last_name: "Gómez".to_string(),
            date_of_birth: None,
            phone: Some("3001234567".to_string()),
            gender: None,
            email: email.to_string(),
            password: "correct horse".to_string(),
        }
    }

    async fn accounts() -> (Database, Accounts) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let accounts = db.accounts();
        (db, accounts)
    }

    #[tokio::test]
    async fn test_register_creates_every_record() {
        let (db, accounts) = accounts().await;

        let account = accounts
            .register_user(registration(" Ana@Example.com "))
            .await
            .unwrap();
        assert_eq!(account.user.email, "ana@example.com");
        assert_eq!(account.client.person_id, account.person.id);

        let mut conn = db.pool().acquire().await.unwrap();
        let roles = RoleUserRepository::new(&mut conn)
            .list_by_user(account.user.id)
            .await
            .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role_id, DEFAULT_CLIENT_ROLE_ID);
        let stored = PasswordRepository::new(&mut conn)
            .get_by_user(account.user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_and_rolls_back() {
        let (_db, accounts) = accounts().await;

        accounts.register_user(registration("ana@example.com")).await.unwrap();
        let err = accounts
            .register_user(registration("ANA@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(matches!(
            err.store_error(),
            Some(DbError::UniqueViolation { .. })
        ));
        // The second person row was rolled back with the failed user insert
        assert_eq!(accounts.list_persons().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_and_change_password() {
        let (_db, accounts) = accounts().await;
        let account = accounts.register_user(registration("ana@example.com")).await.unwrap();

        let person = accounts
            .verify_credentials("ana@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(person.id, account.person.id);

        let wrong = accounts
            .verify_credentials("ana@example.com", "battery staple")
            .await
            .unwrap_err();
        assert!(matches!(wrong, CatalogError::InvalidCredentials));

        let unknown = accounts
            .verify_credentials("bob@example.com", "correct horse")
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), ErrorCode::NotFound);

        accounts
            .change_password(ChangePasswordRequest {
                email: "ana@example.com".to_string(),
                old_password: "correct horse".to_string(),
                new_password: "battery staple".to_string(),
                confirm_password: "battery staple".to_string(),
            })
            .await
            .unwrap();
        assert!(accounts
            .verify_credentials("ana@example.com", "battery staple")
            .await
            .is_ok());

        let mismatch = accounts
            .change_password(ChangePasswordRequest {
                email: "ana@example.com".to_string(),
                old_password: "battery staple".to_string(),
                new_password: "new password 1".to_string(),
                confirm_password: "new password 2".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(mismatch.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_partial_person_update_and_delete() {
        let (_db, accounts) = accounts().await;
        let account = accounts.register_user(registration("ana@example.com")).await.unwrap();

        let updated = accounts
            .update_person(PersonUpdate {
                phone: Some("3109876543".to_string()),
                ..PersonUpdate::new(account.person.id)
            })
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("3109876543"));
        assert_eq!(updated.name, "Ana");
        assert_eq!(accounts.get_person(account.person.id).await.unwrap(), updated);

        let summary = accounts.delete_user(account.person.id).await.unwrap();
        assert_eq!(summary.parents, 1);
        assert_eq!(
            accounts.get_person(account.person.id).await.unwrap_err().code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            accounts
                .verify_credentials("ana@example.com", "correct horse")
                .await
                .unwrap_err()
                .code(),
            ErrorCode::NotFound
        );
    }
}
