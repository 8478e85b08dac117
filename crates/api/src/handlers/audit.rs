//! Handlers for the audit ledger. All endpoints require the admin role.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use pymeauth_core::audit::{verify_chain, ChainVerification};
use pymeauth_db::models::audit::{AuditLog, AuditLogPage, AuditQuery};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/audit-logs
///
/// Filter by `user_id`, `business_id`, `action`, `from`, `to` (RFC 3339);
/// paginate with `limit` (default 50, max 500) and `offset`.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    params: Result<Query<AuditQuery>, QueryRejection>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    let Query(params) = params?;
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(AppError::BadRequest("`from` must not be after `to`".into()));
        }
    }

    let page = state.store.list_audit(&params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/admin/audit-logs/integrity
///
/// Recompute the hash chain over the whole ledger.
pub async fn check_integrity(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<ChainVerification>>> {
    let chain = state.store.audit_chain().await?;
    let result = verify_chain(chain.iter().map(AuditLog::chain_link));

    if !result.chain_valid {
        tracing::error!(first_break = ?result.first_break, "Audit chain integrity check failed");
    }
    Ok(Json(DataResponse { data: result }))
}
