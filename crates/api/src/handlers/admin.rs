//! Admin-only account management handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use pymeauth_core::types::DbId;

use crate::auth::service::ClientInfo;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// POST /api/v1/admin/users/{id}/deactivate
///
/// Deactivate a user. Idempotent; returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.auth.deactivate_user(id, admin.user_id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/businesses/{id}/deactivate
///
/// Deactivate a business and thereby block its users from logging in.
/// Idempotent; returns 204 No Content.
pub async fn deactivate_business(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state
        .auth
        .deactivate_business(id, admin.user_id, &client)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
