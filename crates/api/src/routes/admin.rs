//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin, audit};
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the `ADMIN` role.
///
/// ```text
/// POST /users/{id}/deactivate      -> deactivate_user
/// POST /businesses/{id}/deactivate -> deactivate_business
/// GET  /audit-logs                 -> query_audit_logs
/// GET  /audit-logs/integrity       -> check_integrity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/deactivate", post(admin::deactivate_user))
        .route(
            "/businesses/{id}/deactivate",
            post(admin::deactivate_business),
        )
        .route("/audit-logs", get(audit::query_audit_logs))
        .route("/audit-logs/integrity", get(audit::check_integrity))
}
