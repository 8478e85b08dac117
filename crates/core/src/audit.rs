//! Audit ledger rules: action tags and the integrity hash chain.
//!
//! This module lives in `core` so the PostgreSQL and in-memory stores chain
//! entries identically and the API can verify either of them.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action tags
// ---------------------------------------------------------------------------

/// Closed set of audited actions. Must match the CHECK constraint in
/// `20260301000003_create_audit_logs.sql`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RegisterSuccess,
    /// Only written when failed registrations are configured to be audited.
    RegisterFailure,
    LoginSuccess,
    LoginFailure,
    UserDeactivated,
    BusinessDeactivated,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        AuditAction::RegisterSuccess,
        AuditAction::RegisterFailure,
        AuditAction::LoginSuccess,
        AuditAction::LoginFailure,
        AuditAction::UserDeactivated,
        AuditAction::BusinessDeactivated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::RegisterSuccess => "REGISTER_SUCCESS",
            AuditAction::RegisterFailure => "REGISTER_FAILURE",
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFailure => "LOGIN_FAILURE",
            AuditAction::UserDeactivated => "USER_DEACTIVATED",
            AuditAction::BusinessDeactivated => "BUSINESS_DEACTIVATED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown audit action: {s}")))
    }
}

impl TryFrom<String> for AuditAction {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Current time truncated to microseconds.
///
/// PostgreSQL stores `timestamptz` with microsecond precision; hashing a
/// nanosecond value would make every stored entry fail verification.
pub fn ledger_timestamp() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Integrity hash chain
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "PYMEAUTH_AUDIT_CHAIN_SEED_V1";

/// Canonical text of an entry's content, the input to its integrity hash.
///
/// Absent optional fields render as `-`. The id is excluded because it is
/// assigned by the store after the hash is computed.
pub fn canonical_entry(
    action: &str,
    user_id: Option<DbId>,
    business_id: Option<DbId>,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    timestamp: Timestamp,
) -> String {
    fn opt<T: fmt::Display>(v: Option<T>) -> String {
        v.map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    format!(
        "{action}|{}|{}|{}|{}|{}",
        opt(user_id),
        opt(business_id),
        opt(ip_address),
        opt(user_agent),
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
    )
}

/// SHA-256 of `prev_hash|entry_data`, hex encoded.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry, which chains from [`CHAIN_SEED`].
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let digest = Sha256::digest(format!("{prev}|{entry_data}").as_bytes());
    format!("{digest:x}")
}

/// One stored entry as seen by [`verify_chain`].
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub id: DbId,
    pub canonical: String,
    pub integrity_hash: Option<String>,
}

/// Result of walking the hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    /// Number of entries checked before stopping.
    pub verified_entries: i64,
    pub chain_valid: bool,
    /// Id of the first entry whose hash does not match, if any.
    pub first_break: Option<DbId>,
}

/// Recompute every hash in id order and report the first mismatch.
pub fn verify_chain<I>(links: I) -> ChainVerification
where
    I: IntoIterator<Item = ChainLink>,
{
    let mut prev: Option<String> = None;
    let mut verified = 0i64;

    for link in links {
        verified += 1;
        let expected = compute_integrity_hash(prev.as_deref(), &link.canonical);
        if link.integrity_hash.as_deref() != Some(expected.as_str()) {
            return ChainVerification {
                verified_entries: verified,
                chain_valid: false,
                first_break: Some(link.id),
            };
        }
        prev = Some(expected);
    }

    ChainVerification {
        verified_entries: verified,
        chain_valid: true,
        first_break: None,
    }
}
