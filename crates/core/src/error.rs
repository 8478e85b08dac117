use crate::types::DbId;

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unique key other than the user email was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email is already registered")]
    DuplicateEmail,

    /// A foreign reference does not resolve.
    #[error("Dangling reference: {0}")]
    Reference(String),

    /// Intentionally undifferentiated: unknown email, wrong password and
    /// inactive accounts all produce this variant.
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The underlying store is unavailable or its constraint engine failed.
    #[error("Storage fault: {0}")]
    StorageFault(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
