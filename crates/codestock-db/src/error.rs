//! # Database and Catalog Error Types
//!
//! Two layers of errors live here:
//!
//! - [`DbError`] - a single store call failed
//! - [`CatalogError`] - an aggregate operation failed, with the entity, id
//!   and the step that was running when it did
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← categorized (not found, unique, busy, ...)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogError ← which aggregate, which id, which stage / step          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ErrorCode ← transport maps to 404 / 400 / 401 / 409 / 500             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use codestock_core::ValidationError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - An update targets an id that doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering an email that already has an account
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// The shipped schema declares no foreign keys, so only a database
    /// created outside the embedded migrations can produce this.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another connection holds the write lock.
    ///
    /// ## When This Occurs
    /// - Two aggregate writes race and the busy timeout elapses
    /// - A read transaction tries to upgrade to a write lock
    ///
    /// The transaction was rolled back; retrying the operation is safe.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether retrying the same operation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type / lock
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraints and locks only through the message:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "database is locked" / "database table is locked"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Stages and Steps
// =============================================================================

/// Where an aggregate read was when the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationStage {
    ParentFetch,
    PriceFetch,
    CategoryFetch,
    LineItemFetch,
    ProductResolve,
}

impl fmt::Display for AggregationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregationStage::ParentFetch => "parent-fetch",
            AggregationStage::PriceFetch => "price-fetch",
            AggregationStage::CategoryFetch => "category-fetch",
            AggregationStage::LineItemFetch => "line-item-fetch",
            AggregationStage::ProductResolve => "product-resolve",
        };
        f.write_str(s)
    }
}

/// Where an aggregate write was when the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteStage {
    /// Existence checks under `ReferencePolicy::Verify`.
    ReferenceCheck,
    ParentUpsert,
    PriceUpsert,
    CategoryUnlink,
    CategoryLink,
    LineItemUpsert,
    /// Account records (person, user, password, role, client).
    AccountRecord,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriteStage::ReferenceCheck => "reference-check",
            WriteStage::ParentUpsert => "parent-upsert",
            WriteStage::PriceUpsert => "price-upsert",
            WriteStage::CategoryUnlink => "category-unlink",
            WriteStage::CategoryLink => "category-link",
            WriteStage::LineItemUpsert => "line-item-upsert",
            WriteStage::AccountRecord => "account-record",
        };
        f.write_str(s)
    }
}

/// Which cascade step failed.
///
/// Steps run children first; a failure at any step means the parent row
/// was not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeStep {
    ListCompanyProducts,
    UnlinkCategories,
    DeletePrices,
    DeleteProducts,
    DeleteLineItems,
    FindUser,
    DeletePassword,
    DeleteClient,
    DeleteRoleAssignments,
    DeleteUser,
    DeletePerson,
    /// The parent row itself, always last.
    DeleteParent,
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CascadeStep::ListCompanyProducts => "list-company-products",
            CascadeStep::UnlinkCategories => "unlink-categories",
            CascadeStep::DeletePrices => "delete-prices",
            CascadeStep::DeleteProducts => "delete-products",
            CascadeStep::DeleteLineItems => "delete-line-items",
            CascadeStep::FindUser => "find-user",
            CascadeStep::DeletePassword => "delete-password",
            CascadeStep::DeleteClient => "delete-client",
            CascadeStep::DeleteRoleAssignments => "delete-role-assignments",
            CascadeStep::DeleteUser => "delete-user",
            CascadeStep::DeletePerson => "delete-person",
            CascadeStep::DeleteParent => "delete-parent",
        };
        f.write_str(s)
    }
}

// =============================================================================
// CatalogError
// =============================================================================

/// Errors returned by [`crate::Catalog`] and [`crate::Accounts`].
///
/// Every variant that wraps a [`DbError`] also names the aggregate and the
/// stage, so a log line is enough to tell which table failed.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested parent entity doesn't exist.
    ///
    /// ## When This Occurs
    /// - `get_product_view` / `get_order_view` for an unknown id
    /// - `delete_user` for a person without a user account
    /// - Credentials checked against an unknown email
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A store call failed while assembling a view.
    #[error("Failed to assemble {entity} {id} at {stage}: {source}")]
    AggregationFailure {
        entity: &'static str,
        id: String,
        stage: AggregationStage,
        #[source]
        source: DbError,
    },

    /// A store call failed while persisting an aggregate.
    ///
    /// The enclosing transaction was rolled back: none of the aggregate's
    /// rows were written.
    #[error("Failed to write {entity} {id} at {stage}: {source}")]
    WriteFailure {
        entity: &'static str,
        id: String,
        stage: WriteStage,
        #[source]
        source: DbError,
    },

    /// A cascade step failed.
    ///
    /// Children are always deleted before their parent, and the enclosing
    /// transaction rolled back every earlier step. Retrying the whole
    /// delete is safe.
    #[error("Cascade delete of {entity} {id} failed at {step}: {source}")]
    PartialCascadeFailure {
        entity: &'static str,
        id: String,
        step: CascadeStep,
        #[source]
        source: DbError,
    },

    /// A write referenced an entity that doesn't exist.
    ///
    /// ## When This Occurs
    /// Only under `ReferencePolicy::Verify`; the default policy writes the
    /// link anyway and readers omit it later.
    #[error("Referenced {entity} does not exist: {id}")]
    DanglingReference { entity: &'static str, id: String },

    /// Email known, password wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Hashing or parsing a stored password hash failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Field-level input check failed before any store call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store failure outside a specific stage (begin / commit / single-table
    /// operations).
    #[error(transparent)]
    Store(#[from] DbError),
}

impl CatalogError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CatalogError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn aggregation(
        entity: &'static str,
        id: impl ToString,
        stage: AggregationStage,
    ) -> impl FnOnce(DbError) -> Self {
        let id = id.to_string();
        move |source| CatalogError::AggregationFailure {
            entity,
            id,
            stage,
            source,
        }
    }

    pub(crate) fn write(
        entity: &'static str,
        id: impl ToString,
        stage: WriteStage,
    ) -> impl FnOnce(DbError) -> Self {
        let id = id.to_string();
        move |source| CatalogError::WriteFailure {
            entity,
            id,
            stage,
            source,
        }
    }

    pub(crate) fn cascade(
        entity: &'static str,
        id: impl ToString,
        step: CascadeStep,
    ) -> impl FnOnce(DbError) -> Self {
        let id = id.to_string();
        move |source| CatalogError::PartialCascadeFailure {
            entity,
            id,
            step,
            source,
        }
    }

    /// Machine-readable classification for the transport layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::NotFound { .. } => ErrorCode::NotFound,
            CatalogError::Validation(_) | CatalogError::DanglingReference { .. } => {
                ErrorCode::ValidationError
            }
            CatalogError::InvalidCredentials => ErrorCode::Unauthorized,
            CatalogError::PasswordHash(_) => ErrorCode::Internal,
            CatalogError::Store(DbError::UniqueViolation { .. })
            | CatalogError::WriteFailure {
                source: DbError::UniqueViolation { .. },
                ..
            } => ErrorCode::Conflict,
            CatalogError::Store(DbError::NotFound { .. }) => ErrorCode::NotFound,
            CatalogError::AggregationFailure { .. }
            | CatalogError::WriteFailure { .. }
            | CatalogError::PartialCascadeFailure { .. }
            | CatalogError::Store(_) => ErrorCode::DatabaseError,
        }
    }

    /// The underlying store error, if there is one.
    pub fn store_error(&self) -> Option<&DbError> {
        match self {
            CatalogError::AggregationFailure { source, .. }
            | CatalogError::WriteFailure { source, .. }
            | CatalogError::PartialCascadeFailure { source, .. }
            | CatalogError::Store(source) => Some(source),
            _ => None,
        }
    }
}

/// Error codes for transport responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Bad credentials (401)
    Unauthorized,

    /// Duplicate unique value (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Anything else server-side (500)
    Internal,
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Unit Tests
// =============================================================================
