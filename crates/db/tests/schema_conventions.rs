//! Schema conventions checked against the migrated database.
//!
//! Ignored by a plain `cargo test`; run with a disposable server:
//! `DATABASE_URL=postgres://... cargo test -p pymeauth-db -- --ignored`.

use sqlx::PgPool;

/// All `id` columns must be bigint.
#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_all_pks_are_bigint(pool: PgPool) {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT table_schema, table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema IN ('identity', 'audit')
         ORDER BY table_schema, table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(rows.len(), 3);
    for (schema, table, data_type) in &rows {
        assert_eq!(
            data_type, "bigint",
            "Table {schema}.{table}.id should be bigint, got {data_type}"
        );
    }
}

/// Identity tables carry created_at/updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_identity_tables_have_timestamps(pool: PgPool) {
    for table in ["businesses", "users"] {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'identity'
                   AND table_name = $1
                   AND column_name = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(data_type, "timestamp with time zone");
        }
    }
}

/// The ledger holds identifiers only: no foreign keys may point out of it.
#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_audit_logs_have_no_foreign_keys(pool: PgPool) {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM information_schema.table_constraints
         WHERE table_schema = 'audit'
           AND table_name = 'audit_logs'
           AND constraint_type = 'FOREIGN KEY'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 0);
}

/// The users -> businesses reference must restrict deletes, never cascade.
#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_user_business_fk_restricts_delete(pool: PgPool) {
    let (rule,): (String,) = sqlx::query_as(
        "SELECT delete_rule
         FROM information_schema.referential_constraints
         WHERE constraint_schema = 'identity'
           AND constraint_name = 'fk_users_business'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(rule, "RESTRICT");
}
