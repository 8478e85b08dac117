//! Domain layer shared by the storage and API crates.
//!
//! Has no internal dependencies so any future CLI or worker can reuse the
//! error taxonomy, role set, and audit ledger rules.

pub mod audit;
pub mod email;
pub mod error;
pub mod registration;
pub mod roles;
pub mod types;
