//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pymeauth_core::error::CoreError;
use pymeauth_core::roles::ROLE_ADMIN;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `ADMIN` role. Rejects with 403 Forbidden otherwise.
///
/// The token alone is not trusted: the admin's user and business must
/// still be active, or the request is rejected with 401 Unauthorized.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<StatusCode> {
///     Ok(StatusCode::NO_CONTENT)
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }

        let active = state
            .store
            .find_account(user.user_id)
            .await?
            .is_some_and(|a| a.can_authenticate());
        if !active {
            tracing::warn!(user_id = user.user_id, "Admin token presented for an inactive account");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Account is inactive".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
