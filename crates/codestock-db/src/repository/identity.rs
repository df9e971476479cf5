//! # Identity Repositories
//!
//! Persons, users, passwords, clients, roles and role assignments.
//!
//! ```text
//! Person ◄── User ──► Password (1:1)
//!   ▲          └────► RoleUser ──► Role
//!   └── Client
//! ```
//!
//! These tables are opaque to the catalog aggregates; `Accounts` and the
//! user cascade are their only writers.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use codestock_core::{
    Client, ClientId, Password, PasswordId, Person, PersonId, Role, RoleId, RoleUser, RoleUserId,
    User, UserId,
};

// =============================================================================
// Person
// =============================================================================

/// Field values of a person that doesn't have an id yet.
#[derive(Debug, Clone, Copy)]
pub struct NewPerson<'a> {
    pub name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<&'a str>,
    pub gender: Option<&'a str>,
}

#[derive(Debug)]
pub struct PersonRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PersonRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        PersonRepository { conn }
    }

    pub async fn get_by_id(&mut self, id: PersonId) -> DbResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, name, last_name, date_of_birth, phone, gender
            FROM persons
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(person)
    }

    pub async fn list_all(&mut self) -> DbResult<Vec<Person>> {
        let persons = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, name, last_name, date_of_birth, phone, gender
            FROM persons
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(persons)
    }

    pub async fn insert(&mut self, new: NewPerson<'_>) -> DbResult<Person> {
        debug!(name = %new.name, "Inserting person");

        let result = sqlx::query(
            r#"
            INSERT INTO persons (name, last_name, date_of_birth, phone, gender)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.name)
        .bind(new.last_name)
        .bind(new.date_of_birth)
        .bind(new.phone)
        .bind(new.gender)
        .execute(&mut *self.conn)
        .await?;

        Ok(Person {
            id: PersonId::new(result.last_insert_rowid()),
            name: new.name.to_string(),
            last_name: new.last_name.to_string(),
            date_of_birth: new.date_of_birth,
            phone: new.phone.map(str::to_string),
            gender: new.gender.map(str::to_string),
        })
    }

    /// Overwrites every column of an existing person.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no row has this id.
    pub async fn update(&mut self, person: &Person) -> DbResult<Person> {
        debug!(person_id = %person.id, "Updating person");

        let result = sqlx::query(
            r#"
            UPDATE persons SET
                name = ?2,
                last_name = ?3,
                date_of_birth = ?4,
                phone = ?5,
                gender = ?6
            WHERE id = ?1
            "#,
        )
        .bind(person.id)
        .bind(&person.name)
        .bind(&person.last_name)
        .bind(person.date_of_birth)
        .bind(&person.phone)
        .bind(&person.gender)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Person", person.id));
        }

        Ok(person.clone())
    }

    pub async fn delete_by_id(&mut self, id: PersonId) -> DbResult<u64> {
        debug!(person_id = %id, "Deleting person row");

        let result = sqlx::query("DELETE FROM persons WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug)]
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        UserRepository { conn }
    }

    /// Looks a user up by email (exact match, as stored).
    pub async fn get_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, person_id FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(user)
    }

    pub async fn get_by_person(&mut self, person_id: PersonId) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, person_id FROM users WHERE person_id = ?1",
        )
        .bind(person_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(user)
    }

    /// Inserts a user.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the email is already registered.
    pub async fn insert(&mut self, email: &str, person_id: PersonId) -> DbResult<User> {
        debug!(person_id = %person_id, "Inserting user");

        let result = sqlx::query("INSERT INTO users (email, person_id) VALUES (?1, ?2)")
            .bind(email)
            .bind(person_id)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, email),
                other => other,
            })?;

        Ok(User {
            id: UserId::new(result.last_insert_rowid()),
            email: email.to_string(),
            person_id,
        })
    }

    pub async fn delete_by_id(&mut self, id: UserId) -> DbResult<u64> {
        debug!(user_id = %id, "Deleting user row");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Password
// =============================================================================

#[derive(Debug)]
pub struct PasswordRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PasswordRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        PasswordRepository { conn }
    }

    pub async fn get_by_user(&mut self, user_id: UserId) -> DbResult<Option<Password>> {
        let password = sqlx::query_as::<_, Password>(
            "SELECT id, user_id, hash FROM passwords WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(password)
    }

    /// Stores a hash for a user. `hash` must already be a PHC string.
    pub async fn insert(&mut self, user_id: UserId, hash: &str) -> DbResult<Password> {
        debug!(user_id = %user_id, "Storing password hash");

        let result = sqlx::query("INSERT INTO passwords (user_id, hash) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(hash)
            .execute(&mut *self.conn)
            .await?;

        Ok(Password {
            id: PasswordId::new(result.last_insert_rowid()),
            user_id,
            hash: hash.to_string(),
        })
    }

    /// Replaces a user's stored hash.
    pub async fn update_hash(&mut self, user_id: UserId, hash: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Replacing password hash");

        let result = sqlx::query("UPDATE passwords SET hash = ?2 WHERE user_id = ?1")
            .bind(user_id)
            .bind(hash)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Password", user_id));
        }

        Ok(())
    }

    pub async fn delete_by_user(&mut self, user_id: UserId) -> DbResult<u64> {
        debug!(user_id = %user_id, "Deleting password");

        let result = sqlx::query("DELETE FROM passwords WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug)]
pub struct ClientRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ClientRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ClientRepository { conn }
    }

    pub async fn get_by_person(&mut self, person_id: PersonId) -> DbResult<Option<Client>> {
        let client =
            sqlx::query_as::<_, Client>("SELECT id, person_id FROM clients WHERE person_id = ?1")
                .bind(person_id)
                .fetch_optional(&mut *self.conn)
                .await?;

        Ok(client)
    }

    pub async fn insert(&mut self, person_id: PersonId) -> DbResult<Client> {
        debug!(person_id = %person_id, "Inserting client");

        let result = sqlx::query("INSERT INTO clients (person_id) VALUES (?1)")
            .bind(person_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(Client {
            id: ClientId::new(result.last_insert_rowid()),
            person_id,
        })
    }

    pub async fn delete_by_person(&mut self, person_id: PersonId) -> DbResult<u64> {
        debug!(person_id = %person_id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE person_id = ?1")
            .bind(person_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Read-only access to the seeded `roles` table.
#[derive(Debug)]
pub struct RoleRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RoleRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        RoleRepository { conn }
    }

    pub async fn get_by_id(&mut self, id: RoleId) -> DbResult<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, identifier FROM roles WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *self.conn)
                .await?;

        Ok(role)
    }

    pub async fn list_all(&mut self) -> DbResult<Vec<Role>> {
        let roles =
            sqlx::query_as::<_, Role>("SELECT id, name, identifier FROM roles ORDER BY id")
                .fetch_all(&mut *self.conn)
                .await?;

        Ok(roles)
    }
}

#[derive(Debug)]
pub struct RoleUserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RoleUserRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        RoleUserRepository { conn }
    }

    pub async fn list_by_user(&mut self, user_id: UserId) -> DbResult<Vec<RoleUser>> {
        let assignments = sqlx::query_as::<_, RoleUser>(
            "SELECT id, user_id, role_id FROM role_users WHERE user_id = ?1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(assignments)
    }

    pub async fn insert(&mut self, user_id: UserId, role_id: RoleId) -> DbResult<RoleUser> {
        debug!(user_id = %user_id, role_id = %role_id, "Assigning role");

        let result = sqlx::query("INSERT INTO role_users (user_id, role_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(RoleUser {
            id: RoleUserId::new(result.last_insert_rowid()),
            user_id,
            role_id,
        })
    }

    pub async fn delete_by_user(&mut self, user_id: UserId) -> DbResult<u64> {
        debug!(user_id = %user_id, "Deleting role assignments");

        let result = sqlx::query("DELETE FROM role_users WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
