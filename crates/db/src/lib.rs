//! Storage layer: row models, sqlx repositories, and the unit-of-work seam.
//!
//! - [`models`] -- `FromRow` entities and their create/query DTOs.
//! - [`repositories`] -- zero-sized structs holding the SQL, one per table.
//! - [`store`] -- the [`Store`] / [`UnitOfWork`] traits and their PostgreSQL
//!   and in-memory backends.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use store::memory::MemoryStore;
pub use store::postgres::PgStore;
pub use store::{Store, StoreQueries, UnitOfWork};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the migrations under `db/migrations` at the workspace root.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
