//! Handlers for the `/auth` resource (register, login).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pymeauth_core::registration::{LoginInput, RegisterInput};
use serde::Serialize;

use crate::auth::jwt::generate_access_token;
use crate::auth::service::{AuthIdentity, ClientInfo};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: AuthIdentity,
}

/// POST /api/v1/auth/register
///
/// Create a business and its first user. Returns 201 with the new identity.
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    input: Result<Json<RegisterInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthIdentity>>)> {
    let Json(input) = input?;
    let identity = state.auth.register(input, &client).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: identity })))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns an access token.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    input: Result<Json<LoginInput>, JsonRejection>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let Json(input) = input?;
    let identity = state.auth.login(input, &client).await?;

    let access_token = generate_access_token(
        identity.user_id,
        identity.role.as_str(),
        identity.business_id,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(DataResponse {
        data: LoginResponse {
            access_token,
            expires_in: state.config.jwt.expires_in(),
            user: identity,
        },
    }))
}
