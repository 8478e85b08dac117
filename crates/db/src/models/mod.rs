//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - Query/filter types where the table is searchable

pub mod audit;
pub mod business;
pub mod user;
