//! User entity model and DTOs.

use pymeauth_core::roles::Role;
use pymeauth_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full row from `identity.users`.
///
/// Contains the password hash -- not `Serialize` on purpose. Handlers build
/// their own response types from the fields they expose.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    /// Normalized (trimmed, lower-cased) address.
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub business_id: DbId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A user joined with its business's `is_active` flag.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    #[sqlx(flatten)]
    pub user: User,
    pub business_active: bool,
}

impl UserAccount {
    /// Both the user and its business must be active to authenticate.
    pub fn can_authenticate(&self) -> bool {
        self.user.is_active && self.business_active
    }
}

/// DTO for creating a user. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub business_id: DbId,
}
