//! Repository for the `identity.businesses` table.

use pymeauth_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::business::{Business, CreateBusiness};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, phone, is_active, created_at, updated_at";

/// Insert, lookup, and deactivation for businesses. There is no delete.
pub struct BusinessRepo;

impl BusinessRepo {
    /// Insert a new business, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateBusiness) -> Result<Business, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO identity.businesses (name, phone)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Business>(&query)
            .bind(&input.name)
            .bind(&input.phone)
            .fetch_one(executor)
            .await
    }

    /// Find a business by internal ID, active or not.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Business>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM identity.businesses WHERE id = $1");
        sqlx::query_as::<_, Business>(&query)
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
            "UPDATE identity.businesses SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
