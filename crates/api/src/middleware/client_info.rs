//! Extracts [`ClientInfo`] from request headers.
//!
//! The IP is the first hop of `X-Forwarded-For`, falling back to
//! `X-Real-IP`. Both headers are client-controlled unless a trusted proxy
//! overwrites them.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::service::ClientInfo;

/// Longest user agent kept on an audit entry.
const MAX_USER_AGENT_LEN: usize = 512;

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(client_info_from_headers(&parts.headers))
    }
}

pub fn client_info_from_headers(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string);

    let user_agent = header(USER_AGENT.as_str())
        .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

    ClientInfo {
        ip_address,
        user_agent,
    }
}
