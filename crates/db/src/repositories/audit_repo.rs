//! Repository for the append-only `audit_logs` table.

use crowd_core::audit::NewAuditEntry;
use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditLogFilter};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, app_id, app_short_name, user_id, user_name, caller, action, \
    attribute, old_value, new_value, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    app_id, app_short_name, user_id, user_name, caller, action, \
    attribute, old_value, new_value";

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Insert and query operations for audit logs. There is no update or delete.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry. The database assigns `id` and `created_at`.
    pub async fn save(pool: &PgPool, entry: &NewAuditEntry) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs ({INSERT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.app_id)
            .bind(&entry.app_short_name)
            .bind(entry.user_id)
            .bind(&entry.user_name)
            .bind(entry.caller.as_str())
            .bind(entry.action.as_str())
            .bind(&entry.attribute)
            .bind(&entry.old_value)
            .bind(&entry.new_value)
            .fetch_one(pool)
            .await?;
        tracing::debug!(
            audit_id = saved.id,
            app_id = saved.app_id,
            attribute = %saved.attribute,
            "Audit entry saved",
        );
        Ok(saved)
    }

    /// Entries matching every set field of `filter`, in creation order,
    /// skipping the first `offset` matches.
    pub async fn filter_by(
        pool: &PgPool,
        filter: &AuditLogFilter,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_audit_filter(filter);

        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {where_clause} \
             ORDER BY id ASC, created_at ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_audit_values(sqlx::query_as::<_, AuditLog>(&query), &bind_values);
        q.bind(filter.limit)
            .bind(filter.offset.unwrap_or(0).max(0))
            .fetch_all(pool)
            .await
    }

    /// Count entries matching `filter`, ignoring `offset` and `limit`.
    pub async fn count(pool: &PgPool, filter: &AuditLogFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_audit_filter(filter);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM audit_logs {where_clause}");

        let q = bind_audit_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built audit log queries.
enum BindValue {
    BigInt(i64),
    Text(String),
}

/// Build a WHERE clause and bind values from `AuditLogFilter`.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
fn build_audit_filter(filter: &AuditLogFilter) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    let mut push = |column: &str, value: BindValue| {
        conditions.push(format!("{column} = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(value);
    };

    if let Some(app_id) = filter.app_id {
        push("app_id", BindValue::BigInt(app_id));
    }
    if let Some(ref short_name) = filter.app_short_name {
        push("app_short_name", BindValue::Text(short_name.clone()));
    }
    if let Some(user_id) = filter.user_id {
        push("user_id", BindValue::BigInt(user_id));
    }
    if let Some(ref user_name) = filter.user_name {
        push("user_name", BindValue::Text(user_name.clone()));
    }
    if let Some(caller) = filter.caller {
        push("caller", BindValue::Text(caller.as_str().to_string()));
    }
    if let Some(action) = filter.action {
        push("action", BindValue::Text(action.as_str().to_string()));
    }
    if let Some(ref attribute) = filter.attribute {
        push("attribute", BindValue::Text(attribute.clone()));
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
            BindValue::Text(v) => q = q.bind(v.as_str()),
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
            BindValue::Text(v) => q = q.bind(v.as_str()),
        }
    }
    q
}
