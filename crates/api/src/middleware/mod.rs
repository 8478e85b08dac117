//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN` role.
//! - [`client_info`] -- Caller IP and user agent for audit entries.

pub mod auth;
pub mod client_info;
pub mod rbac;
