//! Storage error type and its mapping onto the domain taxonomy.

use pymeauth_core::error::CoreError;
use pymeauth_core::types::DbId;

/// PostgreSQL SQLSTATE for unique violations.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Name of the case-insensitive unique index on `identity.users.email`.
pub const UQ_USERS_EMAIL: &str = "uq_users_email";
/// Name of the `identity.users.business_id` foreign key.
pub const FK_USERS_BUSINESS: &str = "fk_users_business";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate value violates unique constraint: {constraint}")]
    Conflict { constraint: String },

    #[error("Reference violates foreign key: {constraint}")]
    Reference { constraint: String },

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True when this is a violation of the named unique constraint.
    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, StoreError::Conflict { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return StoreError::Conflict { constraint },
                Some(FOREIGN_KEY_VIOLATION) => return StoreError::Reference { constraint },
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => CoreError::Conflict(err.to_string()),
            StoreError::Reference { .. } => CoreError::Reference(err.to_string()),
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Database(_) | StoreError::Unavailable(_) => {
                CoreError::StorageFault(err.to_string())
            }
        }
    }
}
