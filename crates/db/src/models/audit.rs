//! Audit ledger models and DTOs.
//!
//! Entries are immutable once written: there is no update DTO and no
//! `updated_at` column.

use pymeauth_core::audit::{canonical_entry, AuditAction, ChainLink};
use pymeauth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single row from `audit.audit_logs`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub business_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: Timestamp,
    pub integrity_hash: Option<String>,
}

impl AuditLog {
    /// The text this entry's integrity hash was computed over.
    pub fn canonical(&self) -> String {
        canonical_entry(
            self.action.as_str(),
            self.user_id,
            self.business_id,
            self.ip_address.as_deref(),
            self.user_agent.as_deref(),
            self.timestamp,
        )
    }

    pub fn chain_link(&self) -> ChainLink {
        ChainLink {
            id: self.id,
            canonical: self.canonical(),
            integrity_hash: self.integrity_hash.clone(),
        }
    }
}

/// DTO for appending an entry. Timestamp and hash are assigned by the store.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub business_id: Option<DbId>,
    pub action: AuditAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Filter parameters for querying the ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<DbId>,
    pub business_id: Option<DbId>,
    pub action: Option<AuditAction>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Default page size for ledger queries.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Upper bound on page size for ledger queries.
pub const MAX_PAGE_SIZE: i64 = 500;

impl AuditQuery {
    /// Effective `(limit, offset)` after defaults and clamping.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }

    /// Whether an entry passes every active filter.
    pub fn matches(&self, entry: &AuditLog) -> bool {
        self.user_id.map_or(true, |id| entry.user_id == Some(id))
            && self.business_id.map_or(true, |id| entry.business_id == Some(id))
            && self.action.map_or(true, |a| entry.action == a)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp <= to)
    }
}

/// Paginated response for ledger queries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}
