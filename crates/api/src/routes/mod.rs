pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
///
/// /admin/users/{id}/deactivate                     deactivate user (admin only)
/// /admin/businesses/{id}/deactivate                deactivate business (admin only)
/// /admin/audit-logs                                query ledger (admin only)
/// /admin/audit-logs/integrity                      verify hash chain (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
