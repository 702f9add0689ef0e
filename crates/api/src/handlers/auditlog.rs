//! Handler for the per-project audit trail viewer.

use axum::extract::{Path, Query, State};
use axum::Json;
use crowd_core::access::{self, AccessDecision};
use crowd_core::error::CoreError;
use crowd_db::models::audit::{AuditLogFilter, AuditLogPage};
use crowd_db::repositories::AuditLogRepo;
use serde::Deserialize;

use super::find_project_by_short_name;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default page size.
const DEFAULT_LIMIT: i64 = 50;
/// Maximum page size.
const MAX_LIMIT: i64 = 500;

/// Query parameters for the audit log page.
#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /app/{short_name}/auditlog
///
/// Anonymous visitors are redirected to sign in. Admins, the project owner
/// and pro users see the trail; everyone else gets 403.
pub async fn show(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(short_name): Path<String>,
    Query(params): Query<AuditLogParams>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;

    let actor = user.as_ref().map(|u| u.actor());
    match access::decide(actor.as_ref(), project.owner_id) {
        AccessDecision::Allowed => {}
        AccessDecision::Unauthenticated => return Err(AppError::SignInRequired),
        AccessDecision::Forbidden => {
            return Err(AppError::Core(CoreError::Forbidden(
                "You are not allowed to view this audit log".into(),
            )));
        }
    }

    let filter = AuditLogFilter {
        app_id: Some(project.id),
        offset: Some(params.offset.unwrap_or(0).max(0)),
        limit: Some(clamp_limit(params.limit)),
        ..Default::default()
    };

    let items = AuditLogRepo::filter_by(&state.pool, &filter).await?;
    let total = AuditLogRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
