//! Audit log entity model and query parameters.
//!
//! Audit logs have no `updated_at` field (immutable records).

use crowd_core::audit::{AuditAction, AuditCaller};
use crowd_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub app_id: DbId,
    pub app_short_name: String,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub caller: String,
    pub action: String,
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: Timestamp,
}

/// Equality filters for [`crate::repositories::AuditLogRepo::filter_by`].
///
/// Unset fields do not constrain the result. `offset` skips that many
/// matching entries in creation order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    pub app_id: Option<DbId>,
    pub app_short_name: Option<String>,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub caller: Option<AuditCaller>,
    pub action: Option<AuditAction>,
    pub attribute: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated response for audit log queries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}
