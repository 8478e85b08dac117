//! Repository for the `identity.users` table.

use pymeauth_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::user::{CreateUser, User, UserAccount};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, role, business_id, is_active, \
                       last_login_at, created_at, updated_at";

/// `COLUMNS` qualified for the users/businesses join.
const ACCOUNT_COLUMNS: &str = "u.id, u.email, u.password_hash, u.role, u.business_id, u.is_active, \
                               u.last_login_at, u.created_at, u.updated_at, \
                               b.is_active AS business_active";

const ACCOUNT_FROM: &str =
    "identity.users u JOIN identity.businesses b ON b.id = u.business_id";

/// Insert, lookup, and deactivation for users. There is no delete.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Fails with a unique violation on `uq_users_email` when the address is
    /// already taken (case-insensitively), and with a foreign key violation on
    /// `fk_users_business` when the business does not exist.
    pub async fn create<'e, E>(executor: E, input: &CreateUser) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO identity.users (email, password_hash, role, business_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .bind(input.business_id)
            .fetch_one(executor)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM identity.users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by email (case-insensitive, served by `uq_users_email`).
    ///
    /// Inactive users are returned too; callers decide how to treat them.
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM identity.users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by email along with its business's active flag.
    pub async fn find_account_by_email<'e, E>(
        executor: E,
        email: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {ACCOUNT_FROM} WHERE lower(u.email) = lower($1)"
        );
        sqlx::query_as::<_, UserAccount>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_account_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<UserAccount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM {ACCOUNT_FROM} WHERE u.id = $1");
        sqlx::query_as::<_, UserAccount>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Clear `is_active`. Returns `true` only if the flag actually changed.
    pub async fn deactivate<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE identity.users SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set `last_login_at` to now.
    pub async fn record_successful_login<'e, E>(executor: E, id: DbId) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE identity.users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
