//! Repository for the append-only `audit.audit_logs` table.

use pymeauth_core::audit::{canonical_entry, compute_integrity_hash, ledger_timestamp};
use pymeauth_core::types::Timestamp;
use sqlx::{PgConnection, PgExecutor};

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, user_id, business_id, action, ip_address, \
    user_agent, timestamp, integrity_hash";

/// Column list for INSERT (excludes the generated `id`).
const INSERT_COLUMNS: &str = "\
    user_id, business_id, action, ip_address, user_agent, \
    timestamp, integrity_hash";

/// Advisory lock key serializing appends so the hash chain follows id order.
const CHAIN_LOCK_KEY: i64 = 0x5059_4d45_4155_4454;

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Append and query operations for the ledger. There is no update or delete.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry, chaining its integrity hash from the latest entry.
    ///
    /// Must run on a transaction's connection: the advisory lock taken here
    /// is released at commit or rollback, so a concurrent append waits until
    /// this entry is visible before reading the previous hash.
    pub async fn append(
        conn: &mut PgConnection,
        input: &CreateAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAIN_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        let prev_hash = Self::find_last_hash(&mut *conn).await?;
        let timestamp = ledger_timestamp();
        let canonical = canonical_entry(
            input.action.as_str(),
            input.user_id,
            input.business_id,
            input.ip_address.as_deref(),
            input.user_agent.as_deref(),
            timestamp,
        );
        let integrity_hash = compute_integrity_hash(prev_hash.as_deref(), &canonical);

        let query = format!(
            "INSERT INTO audit.audit_logs ({INSERT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.user_id)
            .bind(input.business_id)
            .bind(input.action.as_str())
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(timestamp)
            .bind(&integrity_hash)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find the integrity hash of the most recent entry.
    pub async fn find_last_hash<'e, E>(executor: E) -> Result<Option<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT integrity_hash FROM audit.audit_logs ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(executor)
        .await
        .map(|opt| opt.flatten())
    }

    /// Query entries with filtering and pagination, newest first.
    pub async fn query<'e, E>(executor: E, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (limit, offset) = params.page();
        let (where_clause, bind_values, bind_idx) = build_audit_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM audit.audit_logs {where_clause} \
             ORDER BY id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_audit_values(sqlx::query_as::<_, AuditLog>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(executor).await
    }

    /// Count entries matching the filter (for pagination metadata).
    pub async fn count<'e, E>(executor: E, params: &AuditQuery) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (where_clause, bind_values, _) = build_audit_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM audit.audit_logs {where_clause}");

        let q = bind_audit_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(executor).await
    }

    /// Every entry in id order, for hash chain verification.
    pub async fn fetch_chain<'e, E>(executor: E) -> Result<Vec<AuditLog>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM audit.audit_logs ORDER BY id ASC");
        sqlx::query_as::<_, AuditLog>(&query).fetch_all(executor).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built audit log queries.
enum BindValue {
    BigInt(i64),
    Text(&'static str),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from `AuditQuery` filter parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
fn build_audit_filter(params: &AuditQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    let mut push = |column: &str, op: &str, value: BindValue| {
        conditions.push(format!("{column} {op} ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(value);
    };

    if let Some(user_id) = params.user_id {
        push("user_id", "=", BindValue::BigInt(user_id));
    }
    if let Some(business_id) = params.business_id {
        push("business_id", "=", BindValue::BigInt(business_id));
    }
    if let Some(action) = params.action {
        push("action", "=", BindValue::Text(action.as_str()));
    }
    if let Some(from) = params.from {
        push("timestamp", ">=", BindValue::Timestamp(from));
    }
    if let Some(to) = params.to {
        push("timestamp", "<=", BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_audit_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(*v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_audit_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(*v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
