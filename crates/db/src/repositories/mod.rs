//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async SQL methods. Reads
//! and single-statement writes accept any [`sqlx::PgExecutor`] so they run
//! equally against the pool or inside a transaction (`&mut *tx`).

pub mod audit_repo;
pub mod business_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use business_repo::BusinessRepo;
pub use user_repo::UserRepo;
